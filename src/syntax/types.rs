//! Records extracted from parsed source files.
//!
//! These types describe the import and export statements of a single
//! module, each carrying the byte span of its specifier so that rewrites
//! can be applied in place without reformatting the file.

use std::fmt;
use std::ops::Range;
use std::path::Path;

use serde::Serialize;

/// Language type for file analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    JavaScript,
    Jsx,
    TypeScript,
    Tsx,
}

impl SourceLanguage {
    /// Determine language from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" => Some(SourceLanguage::JavaScript),
            "jsx" => Some(SourceLanguage::Jsx),
            "ts" | "mts" | "cts" => Some(SourceLanguage::TypeScript),
            "tsx" => Some(SourceLanguage::Tsx),
            _ => None,
        }
    }

    /// Determine language from a path. Declaration files (`.d.ts`) are TypeScript.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// A 1-indexed line/column position in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The shape of an import statement.
///
/// A statement mixing a default binding with named bindings
/// (`import React, { useState } from 'react'`) is classified as `Default`;
/// its named bindings are still listed on the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportKind {
    /// `import foo from 'module'`
    Default,
    /// `import { foo, bar as baz } from 'module'`
    Named,
    /// `import * as foo from 'module'`
    Namespace,
    /// `import 'module'`
    SideEffect,
    /// `import('module')`
    Dynamic,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportKind::Default => write!(f, "default"),
            ImportKind::Named => write!(f, "named"),
            ImportKind::Namespace => write!(f, "namespace"),
            ImportKind::SideEffect => write!(f, "side-effect"),
            ImportKind::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// A single `name` or `name as alias` binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedBinding {
    /// The name as exported by the source module.
    pub name: String,
    /// The local (or re-exported) name when renamed with `as`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// `import { type Foo }` / `export { type Foo }`
    #[serde(skip)]
    pub is_type_only: bool,
    /// Byte span of the `name` identifier.
    #[serde(skip)]
    pub name_span: Range<usize>,
}

impl NamedBinding {
    /// The name visible after the binding (alias if present).
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// An import statement or dynamic `import()` call.
#[derive(Debug, Clone)]
pub struct ImportRecord {
    /// The specifier exactly as written, without quotes.
    pub specifier: String,
    pub kind: ImportKind,
    pub default_binding: Option<String>,
    pub namespace_binding: Option<String>,
    pub named_bindings: Vec<NamedBinding>,
    pub is_type_only: bool,
    /// Position of the statement (or call expression).
    pub location: Position,
    /// Byte span of the specifier text between the quotes.
    pub span: Range<usize>,
}

impl ImportRecord {
    /// Names this import pulls from the target module.
    ///
    /// `default` stands for the default export and `*` for a namespace import.
    pub fn imported_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if self.default_binding.is_some() {
            names.push("default".to_string());
        }
        if self.namespace_binding.is_some() {
            names.push("*".to_string());
        }
        names.extend(self.named_bindings.iter().map(|b| b.name.clone()));
        names
    }

    /// Returns true if the specifier is a relative or absolute path.
    pub fn is_relative(&self) -> bool {
        self.specifier.starts_with('.') || self.specifier.starts_with('/')
    }
}

/// The shape of an export statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// `export { a, b as c }` without a source.
    Named,
    /// `export { a } from './x'` or `export * as ns from './x'`
    Reexport,
    /// `export * from './x'`
    Wildcard,
}

/// An `export` statement that is not a declaration.
#[derive(Debug, Clone)]
pub struct ExportRecord {
    pub kind: ExportKind,
    /// Exported names in declaration order (aliases where present).
    pub names: Vec<String>,
    pub bindings: Vec<NamedBinding>,
    /// Source module for re-exports.
    pub specifier: Option<String>,
    pub is_type_only: bool,
    pub location: Position,
    /// Byte span of the specifier text for re-exports.
    pub span: Option<Range<usize>>,
}

impl ExportRecord {
    /// Names forwarded from the source module; `*` for wildcards.
    pub fn forwarded_names(&self) -> Vec<String> {
        match self.kind {
            ExportKind::Wildcard => vec!["*".to_string()],
            ExportKind::Reexport | ExportKind::Named => {
                if self.bindings.is_empty() {
                    self.names.clone()
                } else {
                    self.bindings.iter().map(|b| b.name.clone()).collect()
                }
            }
        }
    }
}

/// Kind of a top-level declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Function,
    Class,
    Type,
    Interface,
    Variable,
    Enum,
    Namespace,
    /// `export default ...`
    Default,
}

impl std::str::FromStr for DeclarationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "function" => Ok(DeclarationKind::Function),
            "class" => Ok(DeclarationKind::Class),
            "type" => Ok(DeclarationKind::Type),
            "interface" => Ok(DeclarationKind::Interface),
            "variable" | "const" | "let" | "var" => Ok(DeclarationKind::Variable),
            "enum" => Ok(DeclarationKind::Enum),
            "namespace" | "module" => Ok(DeclarationKind::Namespace),
            "default" => Ok(DeclarationKind::Default),
            _ => Err(format!(
                "Unknown symbol kind: '{}'. Valid kinds: function, class, type, interface, variable, enum, namespace",
                s
            )),
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeclarationKind::Function => "function",
            DeclarationKind::Class => "class",
            DeclarationKind::Type => "type",
            DeclarationKind::Interface => "interface",
            DeclarationKind::Variable => "variable",
            DeclarationKind::Enum => "enum",
            DeclarationKind::Namespace => "namespace",
            DeclarationKind::Default => "default",
        };
        write!(f, "{}", name)
    }
}

/// A top-level declaration, exported or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Declared name; `default` for anonymous default exports.
    pub name: String,
    pub kind: DeclarationKind,
    pub exported: bool,
    pub location: Position,
}

/// A pending replacement of a byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub span: Range<usize>,
    pub replacement: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_path() {
        assert_eq!(
            SourceLanguage::from_path(Path::new("a/b.ts")),
            Some(SourceLanguage::TypeScript)
        );
        assert_eq!(
            SourceLanguage::from_path(Path::new("types.d.ts")),
            Some(SourceLanguage::TypeScript)
        );
        assert_eq!(
            SourceLanguage::from_path(Path::new("App.tsx")),
            Some(SourceLanguage::Tsx)
        );
        assert_eq!(
            SourceLanguage::from_path(Path::new("index.mjs")),
            Some(SourceLanguage::JavaScript)
        );
        assert_eq!(SourceLanguage::from_path(Path::new("style.css")), None);
    }

    #[test]
    fn test_declaration_kind_from_str() {
        assert_eq!(
            "Function".parse::<DeclarationKind>().unwrap(),
            DeclarationKind::Function
        );
        assert_eq!(
            "const".parse::<DeclarationKind>().unwrap(),
            DeclarationKind::Variable
        );
        assert!("macro".parse::<DeclarationKind>().is_err());
    }

    #[test]
    fn test_imported_names() {
        let record = ImportRecord {
            specifier: "./math".to_string(),
            kind: ImportKind::Default,
            default_binding: Some("math".to_string()),
            namespace_binding: None,
            named_bindings: vec![NamedBinding {
                name: "add".to_string(),
                alias: Some("plus".to_string()),
                is_type_only: false,
                name_span: 0..0,
            }],
            is_type_only: false,
            location: Position { line: 1, column: 1 },
            span: 0..0,
        };
        assert_eq!(record.imported_names(), vec!["default", "add"]);
        assert!(record.is_relative());
        assert_eq!(record.named_bindings[0].local_name(), "plus");
    }
}
