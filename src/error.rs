//! Failure kinds raised by the catalog and the switching engine.
//!
//! These travel inside `anyhow::Error`; callers that need to branch on the
//! kind use `err.downcast_ref::<DslmError>()`.

use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::PackageKind;

#[derive(Debug, Error, PartialEq)]
pub enum DslmError {
    /// The repository root is missing or lacks a required collection.
    #[error(
        "The base dir \"{}\" is invalid: {reason}. Please see the dslm README for more information on the dslm base directory.",
        .path.display()
    )]
    InvalidRepository { path: PathBuf, reason: String },

    /// The destination is not a recognized installation and force was not requested.
    #[error("{reason}: {}", .path.display())]
    InvalidDestination { path: PathBuf, reason: String },

    /// A path that would be written exists and is not a symlink the engine may replace.
    #[error("{} already exists and is not a symlink", .path.display())]
    DestinationConflict { path: PathBuf },

    /// The requested version, or any version at all, is not in the catalog.
    #[error("No {kind} found{}", detail_suffix(.detail))]
    NoCandidate { kind: PackageKind, detail: String },

    /// A profile link is already in place and relinking was not allowed.
    #[error("Profile {name} is already linked at {}", .path.display())]
    AlreadyLinked { name: String, path: PathBuf },

    /// The user backed out of a version selection.
    #[error("Cancelled")]
    Cancelled,
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(" {}", detail)
    }
}

/// Extract the failure kind from an error chain, if it carries one.
pub fn kind_of(err: &anyhow::Error) -> Option<&DslmError> {
    err.downcast_ref::<DslmError>()
}
