//! treedb: Directory Tree Database
//!
//! Records a directory tree as a flat text database of paths, checksums and
//! sizes, classifies the live tree (or any copy of it) against that database,
//! and reconciles copies with their master.

pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod reconcile;
pub mod repository;
pub mod status;
pub mod treat;
pub mod tree;
pub mod types;
pub mod verify;
pub mod workspace;
