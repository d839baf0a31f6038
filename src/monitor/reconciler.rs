// Reconciliation Engine
//
// Owns the last-known holdings of the monitored wallet and turns each fresh
// snapshot into transition events:
// - baseline() seeds the state once at startup, emitting nothing
// - reconcile() reports mints never seen before (and, when enabled, balance
//   changes on known mints), then records every observed quantity
// - mints missing from a snapshot keep their last-known quantity

use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::ledger::models::{MintAddress, Snapshot, TransitionEvent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// Emit `BalanceChanged` when a known mint reports a different quantity
    pub notify_on_balance_change: bool,
}

#[derive(Debug, Default)]
pub struct ReconciliationEngine {
    policy: ReconcilePolicy,
    known: HashMap<MintAddress, Decimal>,
    baselined: bool,
}

impl ReconciliationEngine {
    pub fn new(policy: ReconcilePolicy) -> Self {
        Self {
            policy,
            known: HashMap::new(),
            baselined: false,
        }
    }

    /// Replace the state wholesale; every held mint counts as already known.
    pub fn baseline(&mut self, snapshot: &Snapshot) {
        self.known = snapshot
            .iter()
            .map(|(mint, quantity)| (mint.clone(), quantity))
            .collect();
        self.baselined = true;

        info!("Initial scan complete. Monitoring {} tokens...", self.known.len());
    }

    pub fn reconcile(&mut self, snapshot: &Snapshot) -> Vec<TransitionEvent> {
        let mut events = Vec::new();

        for (mint, quantity) in snapshot.iter() {
            if quantity <= Decimal::ZERO {
                continue;
            }

            match self.known.insert(mint.clone(), quantity) {
                None => {
                    info!("🆕 New token detected: {} (balance {})", mint, quantity);
                    events.push(TransitionEvent {
                        mint: mint.clone(),
                        previous_quantity: None,
                        new_quantity: quantity,
                        observed_at: snapshot.observed_at(),
                    });
                }
                Some(previous) if previous != quantity => {
                    debug!("Balance of {} moved {} -> {}", mint, previous, quantity);
                    if self.policy.notify_on_balance_change {
                        events.push(TransitionEvent {
                            mint: mint.clone(),
                            previous_quantity: Some(previous),
                            new_quantity: quantity,
                            observed_at: snapshot.observed_at(),
                        });
                    }
                }
                Some(_) => {}
            }
        }

        events
    }

    pub fn is_baselined(&self) -> bool {
        self.baselined
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    pub fn known_quantity(&self, mint: &MintAddress) -> Option<Decimal> {
        self.known.get(mint).copied()
    }

    pub fn known_count(&self) -> usize {
        self.known.len()
    }
}
