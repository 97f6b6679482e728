//! Group settlement.
//!
//! Turns a roster of members and a ledger of expenses into the transfers that
//! bring every member back to zero. Each ledger entry was paid in full by one
//! member and is split equally across the **whole** roster.
//!
//! Balances are signed: positive means the member is owed money (creditor),
//! negative means the member owes money (debtor). Debtors are matched against
//! creditors greedily, the largest debt against the largest credit first.
//!
//! The computation is pure: no I/O and no state survives a call. Malformed
//! entries never abort it; they are skipped and reported as [`Diagnostic`]s.
//!
//! ```rust
//! use engine::settlement::{LedgerEntry, settle};
//!
//! let members = ["Alice", "Bob"];
//! let ledger = [LedgerEntry::new("Alice", 100.0)];
//!
//! let plan = settle(&members, &ledger);
//! assert_eq!(plan.transfers.len(), 1);
//! assert_eq!(plan.transfers[0].to_string(), "Bob will pay €50.00 to Alice");
//! ```
use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance below which a balance or a transfer is treated as zero (one cent).
pub const EPSILON: f64 = 0.01;

/// One expense: `payer` fronted `amount` for the whole group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub payer: String,
    pub amount: f64,
}

impl LedgerEntry {
    pub fn new(payer: impl Into<String>, amount: f64) -> Self {
        Self {
            payer: payer.into(),
            amount,
        }
    }
}

/// Net position of a member after replaying the ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub member: String,
    pub amount: f64,
}

/// Settlement instruction: `from` pays `amount` to `to`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

impl Transfer {
    /// Amount rounded to cents, for presentation only.
    #[must_use]
    pub fn amount_rounded(&self) -> f64 {
        round_cents(self.amount)
    }
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} will pay €{:.2} to {}", self.from, self.amount, self.to)
    }
}

/// Non-fatal problem found while reading the input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The roster is empty, nothing can be split.
    EmptyMembers,
    /// Ledger entry `index` names a payer outside the roster; it was skipped.
    UnknownPayer { index: usize, payer: String },
    /// Ledger entry `index` has a negative or non-finite amount; it was skipped.
    InvalidAmount { index: usize, amount: f64 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::EmptyMembers => f.write_str("No members available"),
            Diagnostic::UnknownPayer { index, payer } => {
                write!(f, "Invalid payer - {payer} (entry {index})")
            }
            Diagnostic::InvalidAmount { index, amount } => {
                write!(f, "Invalid amount - {amount} (entry {index})")
            }
        }
    }
}

/// Outcome of [`settle`]: the ordered transfers plus anything that was skipped.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub transfers: Vec<Transfer>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Settlement {
    /// `true` when nobody has to pay anybody.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Human-readable instructions, one per transfer.
    #[must_use]
    pub fn instructions(&self) -> Vec<String> {
        self.transfers.iter().map(ToString::to_string).collect()
    }
}

/// Structural errors that make a settlement meaningless.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettlementError {
    #[error("payers and amounts differ in length ({payers} != {amounts})")]
    MismatchedArrays { payers: usize, amounts: usize },
}

/// Rounds a currency amount to two decimals.
#[must_use]
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Replays the ledger and returns one balance per roster entry, in roster
/// order.
///
/// Every valid entry charges `amount / n` to each member and credits `amount`
/// to its payer. When a name appears twice in the roster the first occurrence
/// receives the credit.
pub fn compute_balances<S: AsRef<str>>(
    members: &[S],
    ledger: &[LedgerEntry],
) -> (Vec<Balance>, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    if members.is_empty() {
        diagnostics.push(Diagnostic::EmptyMembers);
        return (Vec::new(), diagnostics);
    }

    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(members.len());
    for (position, member) in members.iter().enumerate() {
        positions.entry(member.as_ref()).or_insert(position);
    }

    let count = members.len() as f64;
    let mut amounts = vec![0.0_f64; members.len()];

    for (index, entry) in ledger.iter().enumerate() {
        let Some(&payer) = positions.get(entry.payer.as_str()) else {
            diagnostics.push(Diagnostic::UnknownPayer {
                index,
                payer: entry.payer.clone(),
            });
            continue;
        };
        if !entry.amount.is_finite() || entry.amount < 0.0 {
            diagnostics.push(Diagnostic::InvalidAmount {
                index,
                amount: entry.amount,
            });
            continue;
        }

        let share = entry.amount / count;
        for amount in &mut amounts {
            *amount -= share;
        }
        amounts[payer] += entry.amount;
    }

    let balances = members
        .iter()
        .zip(amounts)
        .map(|(member, amount)| Balance {
            member: member.as_ref().to_string(),
            amount,
        })
        .collect();

    (balances, diagnostics)
}

/// Computes the transfers that settle the group.
///
/// Returns an empty plan when the roster is empty (with
/// [`Diagnostic::EmptyMembers`]), when the ledger is empty, or when every
/// balance is already within [`EPSILON`] of zero. Identical input always
/// yields the identical sequence of transfers.
pub fn settle<S: AsRef<str>>(members: &[S], ledger: &[LedgerEntry]) -> Settlement {
    let (balances, diagnostics) = compute_balances(members, ledger);
    Settlement {
        transfers: match_transfers(balances),
        diagnostics,
    }
}

/// Same as [`settle`] for a ledger given as two parallel arrays.
///
/// # Errors
///
/// [`SettlementError::MismatchedArrays`] when `payers` and `amounts` differ in
/// length; entries are never zipped partially.
pub fn settle_parallel<S: AsRef<str>, P: AsRef<str>>(
    members: &[S],
    payers: &[P],
    amounts: &[f64],
) -> Result<Settlement, SettlementError> {
    if payers.len() != amounts.len() {
        return Err(SettlementError::MismatchedArrays {
            payers: payers.len(),
            amounts: amounts.len(),
        });
    }

    let ledger: Vec<LedgerEntry> = payers
        .iter()
        .zip(amounts)
        .map(|(payer, amount)| LedgerEntry::new(payer.as_ref(), *amount))
        .collect();

    Ok(settle(members, &ledger))
}

fn match_transfers(balances: Vec<Balance>) -> Vec<Transfer> {
    let (mut debtors, mut creditors): (Vec<Balance>, Vec<Balance>) = balances
        .into_iter()
        .filter(|balance| balance.amount.abs() > EPSILON)
        .partition(|balance| balance.amount < 0.0);

    // Stable sorts: equal balances keep roster order.
    debtors.sort_by(|a, b| a.amount.total_cmp(&b.amount));
    creditors.sort_by(|a, b| b.amount.total_cmp(&a.amount));

    let mut transfers = Vec::new();
    let (mut d, mut c) = (0, 0);

    while d < debtors.len() && c < creditors.len() {
        let debtor = &mut debtors[d];
        let creditor = &mut creditors[c];

        let amount = debtor.amount.abs().min(creditor.amount);
        // A name listed twice can owe itself; that offset is applied silently.
        if amount > EPSILON && debtor.member != creditor.member {
            transfers.push(Transfer {
                from: debtor.member.clone(),
                to: creditor.member.clone(),
                amount,
            });
        }

        debtor.amount += amount;
        creditor.amount -= amount;

        if debtor.amount.abs() < EPSILON {
            d += 1;
        }
        if creditor.amount.abs() < EPSILON {
            c += 1;
        }
    }

    transfers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn single_payer_two_members() {
        let plan = settle(&["Alice", "Bob"], &[LedgerEntry::new("Alice", 100.0)]);

        assert!(plan.diagnostics.is_empty());
        assert_eq!(
            plan.transfers,
            vec![Transfer {
                from: "Bob".to_string(),
                to: "Alice".to_string(),
                amount: 50.0,
            }]
        );
    }

    #[test]
    fn one_debtor_pays_two_creditors() {
        let members = ["Alice", "Bob", "Carol"];
        let ledger = [LedgerEntry::new("Alice", 90.0), LedgerEntry::new("Bob", 60.0)];

        let (balances, _) = compute_balances(&members, &ledger);
        let amounts: Vec<f64> = balances.iter().map(|b| b.amount).collect();
        assert!(approx(amounts[0], 40.0));
        assert!(approx(amounts[1], 10.0));
        assert!(approx(amounts[2], -50.0));

        let plan = settle(&members, &ledger);
        assert_eq!(
            plan.instructions(),
            vec![
                "Carol will pay €40.00 to Alice".to_string(),
                "Carol will pay €10.00 to Bob".to_string(),
            ]
        );
    }

    #[test]
    fn empty_ledger_is_settled() {
        let plan = settle(&["Alice", "Bob"], &[]);
        assert!(plan.is_settled());
        assert!(plan.diagnostics.is_empty());
    }

    #[test]
    fn empty_members_short_circuits() {
        let members: [&str; 0] = [];
        let plan = settle(&members, &[LedgerEntry::new("Alice", 10.0)]);

        assert!(plan.is_settled());
        assert_eq!(plan.diagnostics, vec![Diagnostic::EmptyMembers]);
    }

    #[test]
    fn unknown_payer_is_skipped() {
        let ledger = [
            LedgerEntry::new("Dave", 20.0),
            LedgerEntry::new("Alice", 100.0),
        ];
        let plan = settle(&["Alice", "Bob"], &ledger);

        assert_eq!(
            plan.diagnostics,
            vec![Diagnostic::UnknownPayer {
                index: 0,
                payer: "Dave".to_string(),
            }]
        );
        assert_eq!(plan.instructions(), vec!["Bob will pay €50.00 to Alice"]);
    }

    #[test]
    fn negative_and_nan_amounts_are_skipped() {
        let ledger = [
            LedgerEntry::new("Alice", -5.0),
            LedgerEntry::new("Bob", f64::NAN),
        ];
        let plan = settle(&["Alice", "Bob"], &ledger);

        assert!(plan.is_settled());
        assert_eq!(plan.diagnostics.len(), 2);
        assert!(matches!(
            plan.diagnostics[0],
            Diagnostic::InvalidAmount { index: 0, .. }
        ));
        assert!(matches!(
            plan.diagnostics[1],
            Diagnostic::InvalidAmount { index: 1, .. }
        ));
    }

    #[test]
    fn balances_under_a_cent_are_settled() {
        // Alice +0.009, Bob -0.009
        let plan = settle(&["Alice", "Bob"], &[LedgerEntry::new("Alice", 0.018)]);
        assert!(plan.is_settled());
    }

    #[test]
    fn zero_amount_entries_do_nothing() {
        let plan = settle(&["Alice", "Bob"], &[LedgerEntry::new("Bob", 0.0)]);
        assert!(plan.is_settled());
        assert!(plan.diagnostics.is_empty());
    }

    #[test]
    fn single_member_never_pays_itself() {
        let plan = settle(&["Alice"], &[LedgerEntry::new("Alice", 42.0)]);
        assert!(plan.is_settled());
    }

    #[test]
    fn duplicate_names_do_not_produce_self_transfers() {
        let plan = settle(&["Alice", "Alice"], &[LedgerEntry::new("Alice", 10.0)]);
        assert!(plan.transfers.iter().all(|t| t.from != t.to));
    }

    #[test]
    fn largest_debt_is_matched_first() {
        let members = ["Ann", "Bea", "Cid", "Dan"];
        let ledger = [LedgerEntry::new("Bea", 8.0), LedgerEntry::new("Dan", 100.0)];
        let plan = settle(&members, &ledger);

        // Ann -27, Bea -19, Cid -27, Dan +73: ties keep roster order.
        assert_eq!(
            plan.instructions(),
            vec![
                "Ann will pay €27.00 to Dan",
                "Cid will pay €27.00 to Dan",
                "Bea will pay €19.00 to Dan",
            ]
        );
    }

    #[test]
    fn display_rounds_to_cents() {
        let plan = settle(&["A", "B", "C"], &[LedgerEntry::new("A", 10.0)]);

        assert_eq!(
            plan.instructions(),
            vec!["B will pay €3.33 to A", "C will pay €3.33 to A"]
        );
        assert!(approx(plan.transfers[0].amount_rounded(), 3.33));
    }

    #[test]
    fn parallel_arrays_must_match() {
        let err = settle_parallel(&["Alice", "Bob"], &["Alice"], &[10.0, 20.0]).unwrap_err();
        assert_eq!(
            err,
            SettlementError::MismatchedArrays {
                payers: 1,
                amounts: 2,
            }
        );
    }

    #[test]
    fn parallel_arrays_settle_like_records() {
        let members = ["Alice", "Bob", "Carol"];
        let from_arrays =
            settle_parallel(&members, &["Alice", "Bob"], &[90.0, 60.0]).unwrap();
        let from_records = settle(
            &members,
            &[LedgerEntry::new("Alice", 90.0), LedgerEntry::new("Bob", 60.0)],
        );
        assert_eq!(from_arrays, from_records);
    }

    #[test]
    fn diagnostics_serialize_with_kind_tag() {
        let json = serde_json::to_value(Diagnostic::UnknownPayer {
            index: 3,
            payer: "Dave".to_string(),
        })
        .unwrap();
        assert_eq!(json["kind"], "unknown_payer");
        assert_eq!(json["index"], 3);
        assert_eq!(json["payer"], "Dave");
    }
}
