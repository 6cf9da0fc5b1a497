//! Repair, dependency analysis and graph rendering on temporary projects.

mod common;

use common::{read, setup_project};
use pathwright::export::ExportFormat;
use pathwright::graph::CycleSeverity;
use pathwright::ops::{
    analyze_dependencies, check_deletable, repair_imports, visualize_dependencies, Direction,
    RepairOptions, VisualizeOptions,
};
use pathwright::repair::RepairOutcome;
use pretty_assertions::assert_eq;

// ===== Repair =====

#[test]
fn test_repair_picks_candidate_exporting_all_names() {
    let (_dir, workspace) = setup_project(&[
        ("src/app.ts", "import { add, multiply } from './wrong/path/math';\n"),
        ("src/lib/math.ts", "export const add = 1;\n"),
        ("src/core/math.ts", "export const add = 1;\nexport const multiply = 2;\n"),
    ]);
    let app = workspace.root().join("src/app.ts");

    let result = repair_imports(&workspace, &app, RepairOptions::default());

    assert!(result.success, "{:?}", result.error);
    let report = result.report.unwrap();
    assert_eq!(report.repaired, 1);
    assert_eq!(report.entries[0].outcome.status(), "repaired");
    match &report.entries[0].outcome {
        RepairOutcome::Repaired { new_specifier, .. } => assert_eq!(new_specifier, "./core/math"),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(
        read(&workspace, "src/app.ts"),
        "import { add, multiply } from './core/math';\n"
    );
}

#[test]
fn test_repair_is_idempotent() {
    let (_dir, workspace) = setup_project(&[
        (
            "src/pages/home.ts",
            "import { Button } from '../button';\nimport { api } from '../api';\n",
        ),
        ("src/components/button.tsx", "export const Button = 1;\n"),
        ("src/api.ts", "export const api = 1;\n"),
    ]);
    let home = workspace.root().join("src/pages/home.ts");

    let first = repair_imports(&workspace, &home, RepairOptions::default());
    assert!(first.success, "{:?}", first.error);
    assert_eq!(first.report.unwrap().repaired, 1);
    let after_first = read(&workspace, "src/pages/home.ts");
    assert_eq!(
        after_first,
        "import { Button } from '../components/button';\nimport { api } from '../api';\n"
    );

    let second = repair_imports(&workspace, &home, RepairOptions::default());
    let report = second.report.unwrap();
    assert_eq!(report.checked, 2);
    assert_eq!(report.repaired, 0);
    assert!(report.entries.is_empty());
    assert_eq!(read(&workspace, "src/pages/home.ts"), after_first);
}

#[test]
fn test_repair_reports_missing_module() {
    let (_dir, workspace) = setup_project(&[("src/app.ts", "import { nope } from './nowhere';\n")]);
    let app = workspace.root().join("src/app.ts");

    let result = repair_imports(&workspace, &app, RepairOptions::default());

    let report = result.report.unwrap();
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].outcome.status(), "not_found");
    assert_eq!(read(&workspace, "src/app.ts"), "import { nope } from './nowhere';\n");
}

// ===== Dependency Analysis =====

#[test]
fn test_unreferenced_file_is_deletable() {
    let (_dir, workspace) = setup_project(&[
        ("src/app.ts", "import { used } from './used';\n"),
        ("src/used.ts", "export const used = 1;\n"),
        ("src/orphan.ts", "export const orphan = 1;\n"),
    ]);

    let orphan = check_deletable(&workspace, &workspace.root().join("src/orphan.ts"), true);
    let report = orphan.report.unwrap();
    assert!(report.is_deletable);
    assert!(report.references.is_empty());

    let used = check_deletable(&workspace, &workspace.root().join("src/used.ts"), true);
    let report = used.report.unwrap();
    assert!(!report.is_deletable);
    assert_eq!(report.references[0].file, "src/app.ts");
}

#[test]
fn test_directory_index_shadowed_by_sibling_file() {
    let (_dir, workspace) = setup_project(&[
        ("src/utils.ts", "export const helper = 1;\n"),
        ("src/utils/index.ts", "export const helper = 2;\n"),
        ("src/app.ts", "import { helper } from './utils';\n"),
    ]);

    let index = check_deletable(&workspace, &workspace.root().join("src/utils/index.ts"), true);
    let report = index.report.unwrap();
    assert!(report.is_deletable);
    assert!(report.references.is_empty());

    let sibling = check_deletable(&workspace, &workspace.root().join("src/utils.ts"), true);
    assert!(!sibling.report.unwrap().is_deletable);
}

#[test]
fn test_same_stem_with_other_extension_is_deletable() {
    let (_dir, workspace) = setup_project(&[
        ("src/math.ts", "export const add = 1;\n"),
        ("src/math.js", "export const add = 1;\n"),
        ("src/app.ts", "import { add } from './math';\n"),
    ]);

    let js = check_deletable(&workspace, &workspace.root().join("src/math.js"), true);
    assert!(js.report.unwrap().is_deletable);
}

#[test]
fn test_type_only_references_can_be_ignored() {
    let (_dir, workspace) = setup_project(&[
        ("src/app.ts", "import type { User } from './model';\n"),
        ("src/model.ts", "export interface User { id: string }\n"),
    ]);
    let model = workspace.root().join("src/model.ts");

    let strict = check_deletable(&workspace, &model, true);
    assert!(!strict.report.unwrap().is_deletable);

    let lenient = check_deletable(&workspace, &model, false);
    assert!(lenient.report.unwrap().is_deletable);
}

#[test]
fn test_analyze_imports_direction() {
    let (_dir, workspace) = setup_project(&[
        ("src/app.ts", "import { a } from './a';\nimport fs from 'node:fs';\n"),
        ("src/a.ts", "export const a = 1;\n"),
    ]);

    let result = analyze_dependencies(
        &workspace,
        &workspace.root().join("src/app.ts"),
        Direction::Imports,
        true,
    );
    let report = result.report.unwrap();

    assert_eq!(report.imports.unwrap()[0].path, "src/a.ts");
    assert_eq!(report.external.unwrap(), vec!["node:fs".to_string()]);
    assert!(report.importers.is_none());
}

// ===== Graph Rendering =====

#[test]
fn test_three_node_cycle_is_a_warning() {
    let (_dir, workspace) = setup_project(&[
        ("a.ts", "import { b } from './b';\nexport const a = 1;\n"),
        ("b.ts", "import { c } from './c';\nexport const b = 1;\n"),
        ("c.ts", "import { a } from './a';\nexport const c = 1;\n"),
    ]);

    let result = visualize_dependencies(
        &workspace,
        None,
        VisualizeOptions {
            format: ExportFormat::Mermaid,
            ..VisualizeOptions::default()
        },
    );

    let report = result.report.unwrap();
    assert_eq!(report.circular_dependencies.len(), 1);
    assert_eq!(report.circular_dependencies[0].severity, CycleSeverity::Warning);
    assert!(report.output.starts_with("graph"));
}

#[test]
fn test_four_node_cycle_is_an_error() {
    let (_dir, workspace) = setup_project(&[
        ("a.ts", "import './b';\n"),
        ("b.ts", "import './c';\n"),
        ("c.ts", "import './d';\n"),
        ("d.ts", "import './a';\n"),
    ]);

    let result = visualize_dependencies(&workspace, None, VisualizeOptions::default());

    let report = result.report.unwrap();
    assert_eq!(report.circular_dependencies.len(), 1);
    assert_eq!(report.circular_dependencies[0].severity, CycleSeverity::Error);
    assert_eq!(
        report.circular_dependencies[0].path,
        vec!["./a.ts", "./b.ts", "./c.ts", "./d.ts", "./a.ts"]
    );
    assert!(report.output.contains("digraph"));
}
