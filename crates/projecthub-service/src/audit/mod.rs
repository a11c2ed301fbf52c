//! Audit ledger service.

mod ledger;

pub use ledger::{AuditLedger, RecordOutcome};
