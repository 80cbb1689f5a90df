//! Audit sinks for committed ledger records.

use crate::domain::LedgerRecord;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Receives records only after the mutation that produced them committed.
pub trait AuditSink: Send + Sync + fmt::Debug {
    fn publish(&self, records: &[LedgerRecord]);
}

/// Emits one structured `tracing` event per record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn publish(&self, records: &[LedgerRecord]) {
        for record in records {
            tracing::info!(
                target: "audit",
                kind = %record.kind,
                position = %record.position,
                collateral_before = %record.collateral_before,
                collateral_after = %record.collateral_after,
                debt_before = %record.debt_before,
                debt_after = %record.debt_after,
                time_ms = record.time_ms.as_ms(),
                "ledger record"
            );
        }
    }
}

/// Keeps every published record in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<LedgerRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LedgerRecord> {
        self.stored().clone()
    }

    pub fn len(&self) -> usize {
        self.stored().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Poisoning leaves the stored records valid.
    fn stored(&self) -> MutexGuard<'_, Vec<LedgerRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AuditSink for MemoryAuditSink {
    fn publish(&self, records: &[LedgerRecord]) {
        self.stored().extend_from_slice(records);
    }
}
