//! Specifier resolution and rewriting.
//!
//! [`Resolver`] maps a specifier to a file on disk; [`PathRewriter`]
//! computes the specifier that reaches a file after it moves. Both work on
//! absolute paths and share the lexical helpers in [`paths`].

pub mod paths;
mod rewrite;
mod specifier;

pub use paths::{
    ends_with_index, has_source_extension, is_index_file, is_relative_specifier, normalize_path,
    path_without_extension, specifier_for, strip_source_extension, SpecifierStyle,
    SOURCE_EXTENSIONS,
};
pub use rewrite::{relocate, PathRewriter, RewriteRequest};
pub use specifier::{Resolution, ResolveMethod, ResolvedPath, Resolver};
