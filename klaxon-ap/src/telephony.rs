//! Telephony call-state observation

use klaxon_common::CallState;
use tokio::sync::watch;
use tracing::info;

/// Source of call-state changes
pub trait TelephonyObserver: Send + Sync {
    fn call_state(&self) -> CallState;

    fn subscribe(&self) -> watch::Receiver<CallState>;
}

/// Call state set explicitly (HTTP API, tests)
#[derive(Debug)]
pub struct ManualTelephony {
    tx: watch::Sender<CallState>,
}

impl ManualTelephony {
    pub fn new(initial: CallState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Update the call state, notifying subscribers only on change
    pub fn set(&self, state: CallState) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            info!("Call state changed to {}", state);
        }
    }
}

impl Default for ManualTelephony {
    fn default() -> Self {
        Self::new(CallState::Idle)
    }
}

impl TelephonyObserver for ManualTelephony {
    fn call_state(&self) -> CallState {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<CallState> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let telephony = ManualTelephony::default();
        let mut rx = telephony.subscribe();

        telephony.set(CallState::Active);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), CallState::Active);
        assert!(telephony.call_state().is_active());
    }

    #[test]
    fn test_same_state_does_not_notify() {
        let telephony = ManualTelephony::default();
        let rx = telephony.subscribe();

        telephony.set(CallState::Idle);
        assert!(!rx.has_changed().unwrap());
    }
}
