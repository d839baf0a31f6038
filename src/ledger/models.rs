use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// SPL token mint address - the identity of a monitored asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MintAddress(String);

impl MintAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MintAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MintAddress {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Holdings of one wallet at a single observation instant.
///
/// Only positive quantities are kept. Several token accounts for the same
/// mint are summed, saturating at `Decimal::MAX`. Iteration follows the order
/// in which each mint was first seen.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    holdings: Vec<(MintAddress, Decimal)>,
    observed_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new<I>(entries: I, observed_at: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = (MintAddress, Decimal)>,
    {
        let mut holdings: Vec<(MintAddress, Decimal)> = Vec::new();
        let mut index: HashMap<MintAddress, usize> = HashMap::new();

        for (mint, quantity) in entries {
            if quantity <= Decimal::ZERO {
                continue;
            }
            match index.get(&mint) {
                Some(&pos) => {
                    let merged = &mut holdings[pos].1;
                    *merged = merged.checked_add(quantity).unwrap_or_else(|| {
                        warn!("⚠️ Holdings of {} overflow, clamping to {}", mint, Decimal::MAX);
                        Decimal::MAX
                    });
                }
                None => {
                    index.insert(mint.clone(), holdings.len());
                    holdings.push((mint, quantity));
                }
            }
        }

        Self { holdings, observed_at }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MintAddress, Decimal)> {
        self.holdings.iter().map(|(mint, qty)| (mint, *qty))
    }

    pub fn get(&self, mint: &MintAddress) -> Option<Decimal> {
        self.holdings
            .iter()
            .find(|(m, _)| m == mint)
            .map(|(_, qty)| *qty)
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    NewItem,
    BalanceChanged,
}

/// A detected change in the wallet's holdings, consumed once by the notifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub mint: MintAddress,
    /// None when the mint was not held before
    pub previous_quantity: Option<Decimal>,
    pub new_quantity: Decimal,
    pub observed_at: DateTime<Utc>,
}

impl TransitionEvent {
    pub fn kind(&self) -> TransitionKind {
        match self.previous_quantity {
            None => TransitionKind::NewItem,
            Some(_) => TransitionKind::BalanceChanged,
        }
    }

    /// Signed change relative to the previous quantity
    pub fn delta(&self) -> Option<Decimal> {
        self.previous_quantity.map(|prev| self.new_quantity - prev)
    }
}
