//! Broken import repair.
//!
//! When a relative specifier no longer resolves, the engine searches the
//! project for files named like the missing target and ranks them by:
//! - whether they export what the import needs
//! - directory distance from the importing file (climbing costs double)
//! - similarity of the file name to the missing one
//!
//! The winner's relative specifier replaces the broken one.

mod candidate;
mod engine;

pub use candidate::{
    candidate_globs, directory_distance, module_name, name_similarity, probe_name, Candidate,
    ImportRequirement,
};
pub use engine::{RepairEngine, RepairOutcome, RepairRequest};
