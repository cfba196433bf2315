//! Balance aggregation over ledger entries.
//!
//! Every view in the application (shop balances, analytics, lending, customer
//! lookups) reduces a list of rows into per-counterparty balances. They all go
//! through [`aggregate`] / [`aggregate_named`]; the call sites only decide how
//! rows are fetched, which key identifies the counterparty and how it is
//! displayed.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, UserId};

/// Whether an entry moves the owner's balance with a counterparty up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    Decrease,
}

/// Maps a concrete transaction kind onto a [`Direction`].
pub trait DirectionTag {
    fn direction(&self) -> Direction;
}

/// One money movement as seen from its owner's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry<K> {
    pub id: Uuid,
    pub owner_id: UserId,
    pub counterparty: K,
    /// Always positive
    pub amount_cents: Cents,
    pub direction: Direction,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
}

/// Derived balance between the owner and one counterparty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterpartyBalance<K> {
    pub counterparty: K,
    pub display_name: String,
    pub total_increase: Cents,
    pub total_decrease: Cents,
    /// `total_increase - total_decrease`
    pub outstanding: Cents,
    pub transaction_count: usize,
    pub last_activity_at: DateTime<Utc>,
    pub entries: Vec<LedgerEntry<K>>,
}

impl<K> CounterpartyBalance<K> {
    fn open(counterparty: K, display_name: String, first_seen: DateTime<Utc>) -> Self {
        Self {
            counterparty,
            display_name,
            total_increase: 0,
            total_decrease: 0,
            outstanding: 0,
            transaction_count: 0,
            last_activity_at: first_seen,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, entry: LedgerEntry<K>) {
        match entry.direction {
            Direction::Increase => {
                self.total_increase = self.total_increase.saturating_add(entry.amount_cents)
            }
            Direction::Decrease => {
                self.total_decrease = self.total_decrease.saturating_add(entry.amount_cents)
            }
        }
        // both totals are non-negative, so this cannot overflow
        self.outstanding = self.total_increase - self.total_decrease;
        self.transaction_count += 1;
        if entry.occurred_at > self.last_activity_at {
            self.last_activity_at = entry.occurred_at;
        }
        self.entries.push(entry);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub total_outstanding: Cents,
    pub total_increase: Cents,
    pub total_decrease: Cents,
    pub counterparty_count: usize,
    pub transaction_count: usize,
}

impl AggregateSummary {
    pub fn from_balances<K>(balances: &[CounterpartyBalance<K>]) -> Self {
        balances.iter().fold(Self::default(), |acc, balance| Self {
            total_outstanding: acc.total_outstanding.saturating_add(balance.outstanding),
            total_increase: acc.total_increase.saturating_add(balance.total_increase),
            total_decrease: acc.total_decrease.saturating_add(balance.total_decrease),
            counterparty_count: acc.counterparty_count + 1,
            transaction_count: acc.transaction_count + balance.transaction_count,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BalanceOrder {
    /// Order in which each counterparty first appears in the input.
    #[default]
    FirstSeen,
    /// Highest outstanding first; ties go to the most recent activity, then
    /// to first-seen order.
    OutstandingDesc,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateOptions {
    /// Drop counterparties whose outstanding is zero or negative. Applied
    /// after aggregation so that both totals stay complete.
    pub only_positive_outstanding: bool,
    pub order: BalanceOrder,
    /// Keep at most this many balances, after ordering and filtering.
    pub limit: Option<usize>,
}

impl AggregateOptions {
    pub fn by_outstanding() -> Self {
        Self {
            order: BalanceOrder::OutstandingDesc,
            ..Self::default()
        }
    }

    pub fn only_positive(mut self) -> Self {
        self.only_positive_outstanding = true;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation<K> {
    pub balances: Vec<CounterpartyBalance<K>>,
    /// Summary over `balances` as returned (i.e. after filtering and limit).
    pub summary: AggregateSummary,
}

impl<K: PartialEq> Aggregation<K> {
    pub fn balance_for(&self, counterparty: &K) -> Option<&CounterpartyBalance<K>> {
        self.balances.iter().find(|b| &b.counterparty == counterparty)
    }
}

/// Aggregate entries using the counterparty key itself as display name.
pub fn aggregate<K>(
    entries: impl IntoIterator<Item = LedgerEntry<K>>,
    options: &AggregateOptions,
) -> Aggregation<K>
where
    K: Clone + Eq + Hash + Display,
{
    aggregate_named(entries, options, |_| None)
}

/// Aggregate entries that all belong to one owner into per-counterparty
/// balances.
///
/// `resolve_name` is asked once per counterparty, when it is first seen; a
/// `None` falls back to the key's `Display` form. Entries are kept in input
/// order inside each balance.
pub fn aggregate_named<K, F>(
    entries: impl IntoIterator<Item = LedgerEntry<K>>,
    options: &AggregateOptions,
    mut resolve_name: F,
) -> Aggregation<K>
where
    K: Clone + Eq + Hash + Display,
    F: FnMut(&K) -> Option<String>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut balances: Vec<CounterpartyBalance<K>> = Vec::new();
    let mut owner: Option<UserId> = None;

    for entry in entries {
        debug_assert!(entry.amount_cents > 0, "ledger entry amount must be positive");
        debug_assert!(
            *owner.get_or_insert(entry.owner_id) == entry.owner_id,
            "entries passed to aggregate must share one owner"
        );

        let slot = match index.get(&entry.counterparty) {
            Some(&slot) => slot,
            None => {
                let key = entry.counterparty.clone();
                let name = resolve_name(&key).unwrap_or_else(|| key.to_string());
                balances.push(CounterpartyBalance::open(key.clone(), name, entry.occurred_at));
                index.insert(key, balances.len() - 1);
                balances.len() - 1
            }
        };
        balances[slot].push(entry);
    }

    if options.only_positive_outstanding {
        balances.retain(|b| b.outstanding > 0);
    }

    if options.order == BalanceOrder::OutstandingDesc {
        // stable: equal keys keep first-seen order
        balances.sort_by(|a, b| {
            b.outstanding
                .cmp(&a.outstanding)
                .then_with(|| b.last_activity_at.cmp(&a.last_activity_at))
        });
    }

    if let Some(limit) = options.limit {
        balances.truncate(limit);
    }

    let summary = AggregateSummary::from_balances(&balances);
    Aggregation { balances, summary }
}

/// Increase/decrease totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyActivity {
    /// `YYYY-MM`
    pub month: String,
    pub increase: Cents,
    pub decrease: Cents,
}

/// Group entries that occurred at or after `since` by month, newest first.
pub fn monthly_activity<K>(entries: &[LedgerEntry<K>], since: DateTime<Utc>) -> Vec<MonthlyActivity> {
    let mut months: BTreeMap<String, MonthlyActivity> = BTreeMap::new();

    for entry in entries.iter().filter(|e| e.occurred_at >= since) {
        let month = entry.occurred_at.format("%Y-%m").to_string();
        let bucket = months.entry(month.clone()).or_insert(MonthlyActivity {
            month,
            increase: 0,
            decrease: 0,
        });
        match entry.direction {
            Direction::Increase => bucket.increase = bucket.increase.saturating_add(entry.amount_cents),
            Direction::Decrease => bucket.decrease = bucket.decrease.saturating_add(entry.amount_cents),
        }
    }

    months.into_values().rev().collect()
}
