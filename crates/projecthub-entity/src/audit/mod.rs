//! Audit ledger entities.

mod model;

pub use model::{Acknowledgement, AuditAction, AuditRecord, NewAuditAction, Subject};
