//! Pathwright - import-aware refactoring for TypeScript and JavaScript projects
//!
//! This crate moves and renames files, folders and exported symbols while
//! keeping every import that points at them valid. It also repairs broken
//! import paths, reports whether a file can be deleted and renders the
//! project's import graph with circular import detection.

pub mod config;
pub mod error;
pub mod export;
pub mod graph;
pub mod ops;
pub mod project;
pub mod references;
pub mod repair;
pub mod resolve;
pub mod syntax;
