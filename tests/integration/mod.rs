//! Integration tests for the treedb reconciliation system

mod commands;
mod config_integration;
mod scenarios;
mod test_utils;
mod update_cycle;

pub use test_utils::*;
