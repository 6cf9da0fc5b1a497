//! Mutable handle over one parsed source file.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

use tree_sitter::{Tree, TreeCursor};

use super::parser::Extracted;
use super::types::{
    Declaration, DeclarationKind, ExportKind, ExportRecord, ImportRecord, Position,
    SourceLanguage, TextEdit,
};

/// An identifier occurrence found while preparing a symbol rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierOccurrence {
    pub span: Range<usize>,
    /// `{ name }` in an object literal; renaming must keep the key.
    pub shorthand_property: bool,
}

/// A parsed source file plus the edits queued against it.
///
/// Records always describe the text as it was read. Edits are kept aside
/// and only materialize in [`SourceFile::rendered_text`] and
/// [`SourceFile::save`], so spans stay valid for the whole operation.
pub struct SourceFile {
    path: PathBuf,
    text: String,
    language: SourceLanguage,
    tree: Tree,
    imports: Vec<ImportRecord>,
    exports: Vec<ExportRecord>,
    declarations: Vec<Declaration>,
    edits: Vec<TextEdit>,
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("path", &self.path)
            .field("imports", &self.imports.len())
            .field("exports", &self.exports.len())
            .field("edits", &self.edits.len())
            .finish()
    }
}

impl SourceFile {
    pub(crate) fn new(
        path: PathBuf,
        text: String,
        language: SourceLanguage,
        tree: Tree,
        extracted: Extracted,
    ) -> Self {
        Self {
            path,
            text,
            language,
            tree,
            imports: extracted.imports,
            exports: extracted.exports,
            declarations: extracted.declarations,
            edits: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn language(&self) -> SourceLanguage {
        self.language
    }

    /// Static imports and dynamic `import()` calls in document order.
    pub fn imports(&self) -> &[ImportRecord] {
        &self.imports
    }

    pub fn exports(&self) -> &[ExportRecord] {
        &self.exports
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Names this module exports, excluding `default`.
    pub fn exported_names(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self
            .declarations
            .iter()
            .filter(|d| d.exported && d.kind != DeclarationKind::Default)
            .map(|d| d.name.clone())
            .collect();

        for export in &self.exports {
            if export.kind != ExportKind::Wildcard {
                names.extend(export.names.iter().cloned());
            }
        }

        names.remove("default");
        names
    }

    pub fn has_default_export(&self) -> bool {
        self.declarations
            .iter()
            .any(|d| d.kind == DeclarationKind::Default)
            || self
                .exports
                .iter()
                .any(|e| e.names.iter().any(|n| n == "default"))
    }

    /// 1-indexed line/column of a byte offset.
    pub fn position_of(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let before = &self.text.as_bytes()[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        Position {
            line,
            column: offset - line_start + 1,
        }
    }

    /// Queue a replacement of `span`.
    ///
    /// A second edit of the same span replaces the first. Returns false when
    /// the span overlaps a different queued edit or falls outside the text.
    pub fn replace(&mut self, span: Range<usize>, replacement: impl Into<String>) -> bool {
        if span.start > span.end || span.end > self.text.len() {
            return false;
        }
        let replacement = replacement.into();

        if let Some(existing) = self.edits.iter_mut().find(|e| e.span == span) {
            existing.replacement = replacement;
            return true;
        }
        if self
            .edits
            .iter()
            .any(|e| e.span.start < span.end && span.start < e.span.end)
        {
            return false;
        }

        self.edits.push(TextEdit { span, replacement });
        true
    }

    /// Queue a new specifier text for the record at `span`.
    pub fn set_specifier(&mut self, span: Range<usize>, specifier: &str) -> bool {
        if self.text.get(span.clone()) == Some(specifier) {
            return true;
        }
        self.replace(span, specifier)
    }

    pub fn edits(&self) -> &[TextEdit] {
        &self.edits
    }

    pub fn is_dirty(&self) -> bool {
        !self.edits.is_empty()
    }

    /// The text with every queued edit applied.
    pub fn rendered_text(&self) -> String {
        let mut edits: Vec<&TextEdit> = self.edits.iter().collect();
        edits.sort_by_key(|e| e.span.start);

        let mut out = String::with_capacity(self.text.len());
        let mut cursor = 0;
        for edit in edits {
            out.push_str(&self.text[cursor..edit.span.start]);
            out.push_str(&edit.replacement);
            cursor = edit.span.end;
        }
        out.push_str(&self.text[cursor..]);
        out
    }

    /// Write the rendered text back to this file's path.
    pub fn save(&self) -> io::Result<()> {
        self.save_to(&self.path)
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.rendered_text())
    }

    /// Every identifier spelled `name`, including type positions.
    ///
    /// Member names (`obj.name`) and object keys are property identifiers
    /// and are not reported; shorthand properties are reported and flagged.
    pub fn identifier_occurrences(&self, name: &str) -> Vec<IdentifierOccurrence> {
        let mut found = Vec::new();
        let mut cursor = self.tree.root_node().walk();
        collect_identifiers(&mut cursor, &self.text, name, &mut found);
        found
    }
}

fn collect_identifiers(
    cursor: &mut TreeCursor,
    source: &str,
    name: &str,
    found: &mut Vec<IdentifierOccurrence>,
) {
    let node = cursor.node();
    let kind = node.kind();

    if matches!(
        kind,
        "identifier" | "type_identifier" | "shorthand_property_identifier"
    ) && source.get(node.start_byte()..node.end_byte()) == Some(name)
    {
        found.push(IdentifierOccurrence {
            span: node.start_byte()..node.end_byte(),
            shorthand_property: kind == "shorthand_property_identifier",
        });
    }

    if cursor.goto_first_child() {
        loop {
            collect_identifiers(cursor, source, name, found);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
}

#[cfg(test)]
mod tests {
    use super::super::parser::SourceParser;
    use super::*;

    fn parse(source: &str) -> SourceFile {
        SourceParser::new()
            .unwrap()
            .parse_source(
                Path::new("/p/a.ts"),
                source.to_string(),
                SourceLanguage::TypeScript,
            )
            .unwrap()
    }

    #[test]
    fn test_set_specifier_renders_edit() {
        let mut file = parse("import { a } from './old';\nimport b from './b';\n");
        let span = file.imports()[0].span.clone();

        assert!(file.set_specifier(span, "./new"));
        assert!(file.is_dirty());
        assert_eq!(
            file.rendered_text(),
            "import { a } from './new';\nimport b from './b';\n"
        );
    }

    #[test]
    fn test_unchanged_specifier_is_not_an_edit() {
        let mut file = parse("import { a } from './same';");
        let span = file.imports()[0].span.clone();

        assert!(file.set_specifier(span, "./same"));
        assert!(!file.is_dirty());
    }

    #[test]
    fn test_overlapping_edits_rejected() {
        let mut file = parse("const value = 1;");
        assert!(file.replace(6..11, "other"));
        assert!(!file.replace(8..12, "x"));
        assert!(file.replace(6..11, "again"));
        assert_eq!(file.edits().len(), 1);
        assert_eq!(file.rendered_text(), "const again = 1;");
    }

    #[test]
    fn test_multiple_edits_apply_in_order() {
        let mut file = parse("import a from './a';\nimport b from './b';");
        let first = file.imports()[0].span.clone();
        let second = file.imports()[1].span.clone();

        file.set_specifier(second, "../lib/b");
        file.set_specifier(first, "./x/a");
        assert_eq!(
            file.rendered_text(),
            "import a from './x/a';\nimport b from '../lib/b';"
        );
    }

    #[test]
    fn test_position_of() {
        let file = parse("const a = 1;\nconst b = 2;");
        assert_eq!(file.position_of(0), Position { line: 1, column: 1 });
        assert_eq!(file.position_of(19), Position { line: 2, column: 7 });
    }

    #[test]
    fn test_identifier_occurrences() {
        let file = parse(
            "export function total(x: Total) { return total; }\ntype Total = number;\nconst o = { total };\nobj.total;",
        );

        let values = file.identifier_occurrences("total");
        assert_eq!(values.len(), 3);
        assert!(values[2].shorthand_property);

        let types = file.identifier_occurrences("Total");
        assert_eq!(types.len(), 2);
    }
}
