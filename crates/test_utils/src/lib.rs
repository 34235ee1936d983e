//! Test support
//!
//! Builders for domain aggregates and recording doubles for the outbound
//! ports, shared by the API integration tests.

pub mod builders;
pub mod doubles;

pub use builders::CaseBuilder;
pub use doubles::{
    RecordingCorrespondence, RecordingInvoices, RecordingLedger, ScriptedSubmitter,
    StaticDirectory,
};
