//! Source parsing for pathwright.
//!
//! This module turns JavaScript/TypeScript files into [`SourceFile`]
//! handles using tree-sitter. A handle exposes the records the refactoring
//! engine needs and accepts in-place text edits.
//!
//! # Features
//!
//! - ES6 imports (default, named, namespace, side-effect, `import type`)
//! - Re-exports (`export { a } from`, `export * from`, `export * as ns from`)
//! - Dynamic `import('...')` calls with literal specifiers
//! - Top-level declarations with their kind and export status
//! - Byte spans for every specifier, plus line/column positions
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use pathwright::syntax::SourceParser;
//!
//! let mut parser = SourceParser::new()?;
//! let mut file = parser.parse_file(Path::new("src/index.ts"))?;
//!
//! let span = file.imports()[0].span.clone();
//! file.set_specifier(span, "./lib/utils");
//! file.save()?;
//! ```

mod parser;
mod source_file;
pub mod types;

pub use parser::{SourceParser, SyntaxError, SyntaxResult};
pub use source_file::{IdentifierOccurrence, SourceFile};
pub use types::{
    Declaration, DeclarationKind, ExportKind, ExportRecord, ImportKind, ImportRecord,
    NamedBinding, Position, SourceLanguage, TextEdit,
};
