use crate::storage::{Storage, StorageError};
use chrono::Utc;

/// Returns the current UTC calendar day, the unit of quota accounting
pub fn today_utc() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Daily cost ledger
///
/// Holds the configured budget and safety buffer; the actual spend is always
/// derived from the audit log, never tracked in memory.
#[derive(Debug, Clone)]
pub struct CostLedger {
    daily_budget: u32,
    safety_buffer: u32,
}

impl CostLedger {
    pub fn new(daily_budget: u32, safety_buffer: u32) -> Self {
        Self {
            daily_budget,
            safety_buffer,
        }
    }

    /// The portion of the budget that may actually be spent
    pub fn spendable(&self) -> u32 {
        self.daily_budget.saturating_sub(self.safety_buffer)
    }

    /// Units remaining for today, derived from the audit log
    pub fn remaining(&self, storage: &dyn Storage) -> Result<u32, StorageError> {
        let spent = storage.sum_cost_for_day(&today_utc())?;
        Ok(self.spendable().saturating_sub(spent))
    }

    /// Whether spending `cost` units now would overrun the budget
    pub fn would_exceed(&self, storage: &dyn Storage, cost: u32) -> Result<bool, StorageError> {
        Ok(cost > self.remaining(storage)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{AuditEntry, SqliteStorage};

    fn audit(cost: u32, cache_hit: bool) -> AuditEntry {
        AuditEntry {
            operation: "search".to_string(),
            signature: "sig".to_string(),
            cost,
            cache_hit,
            http_status: Some(200),
            error: None,
        }
    }

    #[test]
    fn test_spendable_holds_back_buffer() {
        let ledger = CostLedger::new(10_000, 500);
        assert_eq!(ledger.spendable(), 9_500);
    }

    #[test]
    fn test_buffer_larger_than_budget_spends_nothing() {
        let ledger = CostLedger::new(100, 500);
        assert_eq!(ledger.spendable(), 0);
    }

    #[test]
    fn test_remaining_is_derived_from_audit_log() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let ledger = CostLedger::new(1_000, 0);

        assert_eq!(ledger.remaining(&storage).unwrap(), 1_000);

        storage.append_audit(&audit(100, false)).unwrap();
        storage.append_audit(&audit(1, false)).unwrap();
        assert_eq!(ledger.remaining(&storage).unwrap(), 899);
    }

    #[test]
    fn test_cache_hits_never_spend() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let ledger = CostLedger::new(1_000, 0);

        storage.append_audit(&audit(0, true)).unwrap();
        storage.append_audit(&audit(0, true)).unwrap();
        assert_eq!(ledger.remaining(&storage).unwrap(), 1_000);
    }

    #[test]
    fn test_would_exceed_boundary() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let ledger = CostLedger::new(150, 0);

        storage.append_audit(&audit(100, false)).unwrap();

        assert!(!ledger.would_exceed(&storage, 50).unwrap());
        assert!(ledger.would_exceed(&storage, 51).unwrap());
    }

    #[test]
    fn test_overspend_saturates_to_zero() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let ledger = CostLedger::new(100, 50);

        storage.append_audit(&audit(100, false)).unwrap();
        assert_eq!(ledger.remaining(&storage).unwrap(), 0);
    }
}
