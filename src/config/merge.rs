//! Merge rules for layered configuration.

pub(crate) mod merge_policy;
