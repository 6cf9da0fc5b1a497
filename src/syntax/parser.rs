//! Import and export extraction using tree-sitter for JavaScript/TypeScript.
//!
//! This module parses source files into [`SourceFile`] handles carrying
//! every import statement, re-export, dynamic `import()` call and top-level
//! declaration, together with the byte spans needed to edit them in place.

use std::fs;
use std::ops::Range;
use std::path::Path;

use thiserror::Error;
use tree_sitter::{Node, Parser, Tree, TreeCursor};

use super::source_file::SourceFile;
use super::types::{
    Declaration, DeclarationKind, ExportKind, ExportRecord, ImportKind, ImportRecord,
    NamedBinding, Position, SourceLanguage,
};

/// Errors that can occur while parsing source files.
#[derive(Error, Debug)]
pub enum SyntaxError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse file: {path}")]
    ParseError { path: String },

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Tree-sitter language initialization failed")]
    LanguageInit,
}

/// Result type for parsing operations.
pub type SyntaxResult<T> = Result<T, SyntaxError>;

/// Everything extracted from one parse.
#[derive(Debug, Default)]
pub(crate) struct Extracted {
    pub imports: Vec<ImportRecord>,
    pub exports: Vec<ExportRecord>,
    pub declarations: Vec<Declaration>,
}

/// Parser for JavaScript/TypeScript source files.
pub struct SourceParser {
    js_parser: Parser,
    ts_parser: Parser,
    tsx_parser: Parser,
}

impl SourceParser {
    /// Create a new SourceParser.
    pub fn new() -> SyntaxResult<Self> {
        let mut js_parser = Parser::new();
        js_parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .map_err(|_| SyntaxError::LanguageInit)?;

        let mut ts_parser = Parser::new();
        ts_parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .map_err(|_| SyntaxError::LanguageInit)?;

        let mut tsx_parser = Parser::new();
        tsx_parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TSX.into())
            .map_err(|_| SyntaxError::LanguageInit)?;

        Ok(Self {
            js_parser,
            ts_parser,
            tsx_parser,
        })
    }

    /// Read and parse a file from disk.
    pub fn parse_file(&mut self, path: &Path) -> SyntaxResult<SourceFile> {
        let language = SourceLanguage::from_path(path).ok_or_else(|| {
            SyntaxError::UnsupportedFileType(
                path.extension()
                    .map(|e| e.to_string_lossy().to_string())
                    .unwrap_or_default(),
            )
        })?;

        let content = fs::read_to_string(path)?;
        self.parse_source(path, content, language)
    }

    /// Parse source text that belongs to `path`.
    pub fn parse_source(
        &mut self,
        path: &Path,
        text: String,
        language: SourceLanguage,
    ) -> SyntaxResult<SourceFile> {
        let parser = match language {
            SourceLanguage::JavaScript | SourceLanguage::Jsx => &mut self.js_parser,
            SourceLanguage::TypeScript => &mut self.ts_parser,
            SourceLanguage::Tsx => &mut self.tsx_parser,
        };

        let tree = parser
            .parse(&text, None)
            .ok_or_else(|| SyntaxError::ParseError {
                path: path.display().to_string(),
            })?;

        let extracted = extract(&tree, &text);
        Ok(SourceFile::new(
            path.to_path_buf(),
            text,
            language,
            tree,
            extracted,
        ))
    }
}

fn extract(tree: &Tree, source: &str) -> Extracted {
    let mut out = Extracted::default();
    let mut cursor = tree.root_node().walk();
    visit_node(&mut cursor, source, &mut out);
    out
}

/// Recursively visit nodes in document order.
fn visit_node(cursor: &mut TreeCursor, source: &str, out: &mut Extracted) {
    let node = cursor.node();
    let top_level = node.parent().is_some_and(|p| p.kind() == "program");

    match node.kind() {
        "import_statement" if top_level => {
            if let Some(import) = parse_import_statement(&node, source) {
                out.imports.push(import);
            }
        }
        "export_statement" if top_level => {
            parse_export_statement(&node, source, out);
        }
        "call_expression" => {
            if let Some(import) = parse_dynamic_import(&node, source) {
                out.imports.push(import);
            }
        }
        _ if top_level => {
            collect_declarations(&node, source, false, &mut out.declarations);
        }
        _ => {}
    }

    if cursor.goto_first_child() {
        loop {
            visit_node(cursor, source, out);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
}

fn position(node: &Node) -> Position {
    let point = node.start_position();
    Position {
        line: point.row + 1,
        column: point.column + 1,
    }
}

/// Extract the text content of a node.
fn node_text<'a>(node: &Node, source: &'a str) -> Option<&'a str> {
    source.get(node.start_byte()..node.end_byte())
}

/// Value and inner byte span (without quotes) of a string literal node.
fn string_literal(node: &Node, source: &str) -> Option<(String, Range<usize>)> {
    let start = node.start_byte() + 1;
    let end = node.end_byte().checked_sub(1)?;
    if end < start {
        return None;
    }
    let value = source.get(start..end)?;
    Some((value.to_string(), start..end))
}

/// Identifier text, or the unquoted value for string export names.
fn binding_name(node: &Node, source: &str) -> Option<String> {
    if node.kind() == "string" {
        return string_literal(node, source).map(|(value, _)| value);
    }
    node_text(node, source).map(str::to_string)
}

fn has_type_modifier(node: &Node) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && matches!(c.kind(), "type" | "typeof"));
    found
}

/// Parse an ES6 import statement (and TS `import x = require('...')`).
fn parse_import_statement(node: &Node, source: &str) -> Option<ImportRecord> {
    let mut specifier = None;
    let mut default_binding = None;
    let mut namespace_binding = None;
    let mut named_bindings = Vec::new();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "string" => specifier = string_literal(&child, source),
            "import_clause" => parse_import_clause(
                &child,
                source,
                &mut default_binding,
                &mut namespace_binding,
                &mut named_bindings,
            ),
            "import_require_clause" => {
                let mut inner = child.walk();
                for part in child.children(&mut inner) {
                    match part.kind() {
                        "identifier" => {
                            namespace_binding = node_text(&part, source).map(str::to_string)
                        }
                        "string" => specifier = string_literal(&part, source),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    let (specifier, span) = specifier?;

    let kind = if namespace_binding.is_some() {
        ImportKind::Namespace
    } else if default_binding.is_some() {
        ImportKind::Default
    } else if !named_bindings.is_empty() {
        ImportKind::Named
    } else {
        ImportKind::SideEffect
    };

    let all_specifiers_typed = default_binding.is_none()
        && namespace_binding.is_none()
        && !named_bindings.is_empty()
        && named_bindings.iter().all(|b: &NamedBinding| b.is_type_only);

    Some(ImportRecord {
        specifier,
        kind,
        default_binding,
        namespace_binding,
        named_bindings,
        is_type_only: has_type_modifier(node) || all_specifiers_typed,
        location: position(node),
        span,
    })
}

/// Parse the import clause (everything between 'import' and 'from').
fn parse_import_clause(
    node: &Node,
    source: &str,
    default_binding: &mut Option<String>,
    namespace_binding: &mut Option<String>,
    named_bindings: &mut Vec<NamedBinding>,
) {
    let mut cursor = node.walk();

    for child in node.children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                *default_binding = node_text(&child, source).map(str::to_string);
            }
            "namespace_import" => {
                let mut inner = child.walk();
                let name = child
                    .children(&mut inner)
                    .find(|c| c.kind() == "identifier")
                    .and_then(|c| node_text(&c, source))
                    .map(str::to_string);
                *namespace_binding = name;
            }
            "named_imports" => {
                let mut inner = child.walk();
                for spec in child.children(&mut inner) {
                    if spec.kind() == "import_specifier" {
                        if let Some(binding) = parse_binding(&spec, source) {
                            named_bindings.push(binding);
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// Parse `name`, `name as alias` or `type name` inside braces.
fn parse_binding(node: &Node, source: &str) -> Option<NamedBinding> {
    let name_node = node.child_by_field_name("name")?;
    let name = binding_name(&name_node, source)?;
    let alias = node
        .child_by_field_name("alias")
        .and_then(|a| binding_name(&a, source));

    Some(NamedBinding {
        name,
        alias,
        is_type_only: has_type_modifier(node),
        name_span: name_node.start_byte()..name_node.end_byte(),
    })
}

/// Parse an export statement into an export record or declarations.
fn parse_export_statement(node: &Node, source: &str, out: &mut Extracted) {
    let mut has_star = false;
    let mut has_default = false;
    let mut has_assignment = false;
    let mut specifier = None;
    let mut clause = None;
    let mut namespace_export = None;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "*" => has_star = true,
            "default" => has_default = true,
            "=" => has_assignment = true,
            "string" => specifier = string_literal(&child, source),
            "export_clause" => clause = Some(child),
            "namespace_export" => namespace_export = Some(child),
            _ => {}
        }
    }

    let location = position(node);

    if has_default || has_assignment {
        out.declarations.push(Declaration {
            name: "default".to_string(),
            kind: DeclarationKind::Default,
            exported: true,
            location,
        });
        // `export default class Widget {}` also declares `Widget` locally.
        // Importers bind the default, so the name itself is not exported.
        if let Some(declaration) = node.child_by_field_name("declaration") {
            collect_declarations(&declaration, source, false, &mut out.declarations);
        }
        return;
    }

    if let Some(declaration) = node.child_by_field_name("declaration") {
        collect_declarations(&declaration, source, true, &mut out.declarations);
        return;
    }

    let is_type_only = has_type_modifier(node);

    if let Some(ns) = namespace_export {
        let mut inner = ns.walk();
        let name = ns
            .named_children(&mut inner)
            .next()
            .and_then(|n| binding_name(&n, source));
        let (spec, span) = match specifier {
            Some(s) => (Some(s.0), Some(s.1)),
            None => (None, None),
        };
        out.exports.push(ExportRecord {
            kind: ExportKind::Reexport,
            names: name.into_iter().collect(),
            bindings: Vec::new(),
            specifier: spec,
            is_type_only,
            location,
            span,
        });
        return;
    }

    if has_star {
        if let Some((spec, span)) = specifier {
            out.exports.push(ExportRecord {
                kind: ExportKind::Wildcard,
                names: Vec::new(),
                bindings: Vec::new(),
                specifier: Some(spec),
                is_type_only,
                location,
                span: Some(span),
            });
        }
        return;
    }

    if let Some(clause) = clause {
        let mut bindings = Vec::new();
        let mut inner = clause.walk();
        for spec in clause.children(&mut inner) {
            if spec.kind() == "export_specifier" {
                if let Some(binding) = parse_binding(&spec, source) {
                    bindings.push(binding);
                }
            }
        }
        let names = bindings.iter().map(|b| b.local_name().to_string()).collect();
        let all_typed = !bindings.is_empty() && bindings.iter().all(|b| b.is_type_only);

        let (kind, spec, span) = match specifier {
            Some((spec, span)) => (ExportKind::Reexport, Some(spec), Some(span)),
            None => (ExportKind::Named, None, None),
        };

        out.exports.push(ExportRecord {
            kind,
            names,
            bindings,
            specifier: spec,
            is_type_only: is_type_only || all_typed,
            location,
            span,
        });
    }
}

/// Record the names introduced by a declaration node.
fn collect_declarations(node: &Node, source: &str, exported: bool, out: &mut Vec<Declaration>) {
    let kind = match node.kind() {
        "function_declaration" | "generator_function_declaration" | "function_signature" => {
            DeclarationKind::Function
        }
        "class_declaration" | "abstract_class_declaration" => DeclarationKind::Class,
        "interface_declaration" => DeclarationKind::Interface,
        "type_alias_declaration" => DeclarationKind::Type,
        "enum_declaration" => DeclarationKind::Enum,
        "module" | "internal_module" => DeclarationKind::Namespace,
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            for declarator in node.named_children(&mut cursor) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                let Some(name_node) = declarator.child_by_field_name("name") else {
                    continue;
                };
                // Destructuring patterns declare several names; only plain bindings are tracked.
                if name_node.kind() != "identifier" {
                    continue;
                }
                if let Some(name) = node_text(&name_node, source) {
                    out.push(Declaration {
                        name: name.to_string(),
                        kind: DeclarationKind::Variable,
                        exported,
                        location: position(&declarator),
                    });
                }
            }
            return;
        }
        "ambient_declaration" | "expression_statement" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                collect_declarations(&child, source, exported, out);
            }
            return;
        }
        _ => return,
    };

    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    // `declare module 'pkg'` names a string, not a binding.
    if name_node.kind() == "string" {
        return;
    }
    if let Some(name) = node_text(&name_node, source) {
        out.push(Declaration {
            name: name.to_string(),
            kind,
            exported,
            location: position(node),
        });
    }
}

/// Parse a dynamic `import('...')` call with a string literal argument.
fn parse_dynamic_import(node: &Node, source: &str) -> Option<ImportRecord> {
    let function = node.child_by_field_name("function")?;
    if node_text(&function, source)? != "import" {
        return None;
    }

    let arguments = node.child_by_field_name("arguments")?;
    let mut cursor = arguments.walk();
    let first = arguments.named_children(&mut cursor).next()?;
    if first.kind() != "string" {
        return None;
    }
    let (specifier, span) = string_literal(&first, source)?;

    Some(ImportRecord {
        specifier,
        kind: ImportKind::Dynamic,
        default_binding: None,
        namespace_binding: None,
        named_bindings: Vec::new(),
        is_type_only: false,
        location: position(node),
        span,
    })
}
