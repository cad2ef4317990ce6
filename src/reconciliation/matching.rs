//! Matching between statement lines and ledger transactions

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashSet;

use crate::types::{amounts_equal, StatementTransaction, TransactionMatch};

/// Dated, amounted view of an unreconciled ledger transaction as seen
/// from the statement's account
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerCandidate {
    pub transaction_id: String,
    pub date: NaiveDate,
    pub description: String,
    /// Net amount the transaction posts against the statement's account
    pub amount: BigDecimal,
}

/// Contract for proposing statement/ledger pairings
///
/// Given the unreconciled statement lines and the unreconciled ledger
/// candidates for the statement's account and period, return candidate
/// pairs with confidence scores in [0, 1]: exact amount and date rank
/// highest, then matching amount with a nearby date, then description
/// similarity. A ledger candidate appears at most once per result set,
/// and statement lines are addressed by id, never by value, so
/// duplicates among them stay distinguishable. The matcher proposes;
/// it reconciles nothing.
pub trait TransactionMatcher: Send + Sync {
    fn find_matches(
        &self,
        statement_transactions: &[StatementTransaction],
        candidates: &[LedgerCandidate],
    ) -> Vec<TransactionMatch>;
}

/// Rule-based matcher implementing the contract's preference tiers
pub struct RuleBasedMatcher {
    /// Days of date drift still treated as a near match
    pub date_window: i64,
}

impl Default for RuleBasedMatcher {
    fn default() -> Self {
        Self { date_window: 3 }
    }
}

impl RuleBasedMatcher {
    /// Score one candidate against one statement line
    ///
    /// Amounts must agree within tolerance for any pairing at all; the
    /// date and description only grade how confident the pairing is.
    fn score(&self, line: &StatementTransaction, candidate: &LedgerCandidate) -> Option<f64> {
        if !amounts_equal(&line.amount, &candidate.amount) {
            return None;
        }

        let drift = (line.date - candidate.date).num_days().abs();
        if drift == 0 {
            return Some(1.0);
        }
        if drift <= self.date_window {
            return Some(0.9 - 0.05 * drift as f64);
        }

        // Amount agrees but the date is off; fall back on how similar
        // the descriptions read. Stays below the near-date tier.
        Some(0.3 + 0.4 * word_similarity(&line.description, &candidate.description))
    }
}

impl TransactionMatcher for RuleBasedMatcher {
    fn find_matches(
        &self,
        statement_transactions: &[StatementTransaction],
        candidates: &[LedgerCandidate],
    ) -> Vec<TransactionMatch> {
        let mut taken: HashSet<&str> = HashSet::new();
        let mut matches = Vec::new();

        for line in statement_transactions.iter().filter(|l| !l.reconciled) {
            let mut best: Option<(f64, &LedgerCandidate)> = None;
            for candidate in candidates
                .iter()
                .filter(|c| !taken.contains(c.transaction_id.as_str()))
            {
                let Some(score) = self.score(line, candidate) else {
                    continue;
                };
                if best.as_ref().is_none_or(|(s, _)| score > *s) {
                    best = Some((score, candidate));
                }
            }

            if let Some((confidence, candidate)) = best {
                taken.insert(candidate.transaction_id.as_str());
                matches.push(TransactionMatch {
                    statement_transaction_id: line.id.clone(),
                    transaction_id: candidate.transaction_id.clone(),
                    confidence,
                });
            }
        }

        matches
    }
}

/// Word-set overlap of two descriptions, in [0, 1]
fn word_similarity(a: &str, b: &str) -> f64 {
    let words = |s: &str| -> HashSet<String> {
        s.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect()
    };
    let a = words(a);
    let b = words(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(&b).count() as f64;
    let union = a.union(&b).count() as f64;
    shared / union
}
