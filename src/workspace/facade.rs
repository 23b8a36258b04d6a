//! Re-exports for consumers that depend on `crate::workspace` only.

pub use super::commands::{WorkspaceCommandService, WorkspaceContext, TREAT_ORDER};
pub use super::types::{
    CleanResult, InfoResult, InitResult, StatusResult, StatusShowResult, TreatResult,
    UpdateResult, VerifyResult,
};
