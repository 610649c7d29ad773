// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bridge lifecycle state.
//!
//! The state machine is `Uninitialized → Loading → Ready | Failed`, with
//! `Failed` terminal for the process lifetime. The cell exposes only
//! transition-safe operations: exactly one caller wins the
//! `Uninitialized → Loading` transition and runs the real initialization;
//! everyone else awaits the outcome over a watch channel.

use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeState {
    Uninitialized,
    Loading,
    Ready,
    Failed(String),
}

pub struct BridgeCell {
    tx: watch::Sender<BridgeState>,
    attempts: AtomicU32,
}

impl BridgeCell {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(BridgeState::Uninitialized);
        BridgeCell {
            tx,
            attempts: AtomicU32::new(0),
        }
    }

    pub fn state(&self) -> BridgeState {
        self.tx.borrow().clone()
    }

    /// Attempts the `Uninitialized → Loading` transition. Returns true for
    /// exactly one caller per process lifetime; that caller must later call
    /// [`BridgeCell::complete`].
    pub fn try_begin(&self) -> bool {
        let mut won = false;
        self.tx.send_if_modified(|state| {
            if *state == BridgeState::Uninitialized {
                *state = BridgeState::Loading;
                won = true;
                true
            } else {
                false
            }
        });
        if won {
            self.attempts.fetch_add(1, Ordering::SeqCst);
        }
        won
    }

    /// Resolves `Loading` into its terminal-or-ready outcome.
    pub fn complete(&self, outcome: Result<(), String>) {
        let next = match outcome {
            Ok(()) => BridgeState::Ready,
            Err(message) => BridgeState::Failed(message),
        };
        self.tx.send_if_modified(|state| {
            if *state == BridgeState::Loading {
                *state = next.clone();
                true
            } else {
                false
            }
        });
    }

    /// Awaits until the cell leaves `Loading`, returning the settled state.
    pub async fn settled(&self) -> BridgeState {
        let mut rx = self.tx.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            match current {
                BridgeState::Ready | BridgeState::Failed(_) => return current,
                BridgeState::Uninitialized | BridgeState::Loading => {
                    if rx.changed().await.is_err() {
                        // Sender dropped; report whatever was last observed.
                        return self.tx.borrow().clone();
                    }
                }
            }
        }
    }

    /// Number of times an initialization actually began. Used to assert the
    /// collapse of concurrent `initialize()` calls.
    pub(crate) fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Default for BridgeCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_one_caller_wins_begin() {
        let cell = BridgeCell::new();
        assert!(cell.try_begin());
        assert!(!cell.try_begin());
        assert_eq!(cell.attempts(), 1);
        assert_eq!(cell.state(), BridgeState::Loading);
    }

    #[test]
    fn test_failed_is_terminal() {
        let cell = BridgeCell::new();
        assert!(cell.try_begin());
        cell.complete(Err("boom".to_string()));
        assert_eq!(cell.state(), BridgeState::Failed("boom".to_string()));

        // No further transitions: not back to loading, not to ready.
        assert!(!cell.try_begin());
        cell.complete(Ok(()));
        assert_eq!(cell.state(), BridgeState::Failed("boom".to_string()));
    }

    #[tokio::test]
    async fn test_settled_observes_ready() {
        let cell = std::sync::Arc::new(BridgeCell::new());
        assert!(cell.try_begin());

        let waiter = {
            let cell = cell.clone();
            tokio::spawn(async move { cell.settled().await })
        };

        cell.complete(Ok(()));
        assert_eq!(waiter.await.unwrap(), BridgeState::Ready);
    }

    #[tokio::test]
    async fn test_settled_returns_immediately_when_already_ready() {
        let cell = BridgeCell::new();
        assert!(cell.try_begin());
        cell.complete(Ok(()));
        assert_eq!(cell.settled().await, BridgeState::Ready);
    }
}
