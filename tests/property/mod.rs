//! Property-based tests for ordering and codec guarantees

mod codec;
mod ordering;
