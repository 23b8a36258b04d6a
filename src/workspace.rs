//! Workspace domain: command orchestration for the directory treedb runs in.

mod commands;
mod facade;
mod types;

pub use facade::*;
