//! Per-debtor risk aggregate and its merge rule.

use serde::{Deserialize, Serialize};

use crate::cuit::Cuit;

/// Accumulated totals for one debtor across every record seen so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtorAggregate {
    pub cuit: Cuit,
    /// Worst delinquency classification observed. Monotonically
    /// non-decreasing under merges.
    pub max_severity: u8,
    /// Sum of all observed loan amounts, in integer-scaled minor units.
    pub total_loan_amount: u64,
}

impl DebtorAggregate {
    /// Merge one (severity, amount) observation into an existing
    /// aggregate, or start a fresh one.
    ///
    /// The merge is associative and commutative per cuit (max and sum),
    /// so reordered or redelivered observations converge to the same
    /// aggregate. The amount sum saturates at `u64::MAX` so an
    /// oversized wire amount cannot wrap the running total.
    pub fn merge(
        existing: Option<&DebtorAggregate>,
        cuit: &Cuit,
        severity: u8,
        amount: u64,
    ) -> DebtorAggregate {
        let (max_severity, total_loan_amount) = match existing {
            Some(aggregate) => (
                aggregate.max_severity.max(severity),
                aggregate.total_loan_amount.saturating_add(amount),
            ),
            None => (severity, amount),
        };

        DebtorAggregate {
            cuit: cuit.clone(),
            max_severity,
            total_loan_amount,
        }
    }
}
