//! Filesystem side of a reconciliation pass
//!
//! Walks a tree in path order and computes per-file checksums.

pub mod hasher;
pub mod path;
pub mod walker;
