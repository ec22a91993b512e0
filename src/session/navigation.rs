//! Navigation state machine and auto-save race protection
//!
//! Owns the one piece of mutable state that gates auto-save during history
//! navigation. The machine cycles for the life of a session:
//!
//! ```text
//! Idle --begin_load--> Loading --on_confirmed--> Settling --grace elapsed--> Idle
//!   ^                     |                          |
//!   +----on_load_failed---+--------begin_load--------+   (last request wins)
//! ```
//!
//! `Loading` is an unconfirmed load request: protected regardless of age
//! (until the stall timeout). `Settling` is the trailing grace window after
//! a confirmed load, stamped from the moment of confirmed arrival, which
//! absorbs an auto-save tick firing before the rendering surface has
//! visually settled. Timing uses the tokio monotonic clock, never wall time.

use std::time::Duration;

use tokio::time::Instant;

use crate::annotations::AnnotationState;

/// Protection state: non-idle exactly while a historical load is
/// outstanding or within its trailing grace window.
#[derive(Debug)]
pub enum Protection {
    Idle,
    /// Load command issued, confirmation not yet received. Retains the
    /// state sent to the surface so a confirmation can install it as the
    /// last-saved reference.
    Loading {
        target: u64,
        issued_at: Instant,
        state: AnnotationState,
    },
    /// Load confirmed; auto-save stays suppressed until the grace window
    /// has elapsed.
    Settling { target: u64, confirmed_at: Instant },
}

/// What a load confirmation amounted to
#[derive(Debug, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The confirmation matched the pending target and was applied.
    Applied { target: u64 },
    /// The confirmation referred to a superseded or unknown target.
    Stale,
}

/// Per-session navigation state: cursor, protection, last-saved reference
pub struct NavigationController {
    cursor: Option<u64>,
    protection: Protection,
    last_saved: Option<AnnotationState>,
}

impl NavigationController {
    /// A session starts Idle at its most recent snapshot.
    pub fn new(cursor: Option<u64>, last_saved: Option<AnnotationState>) -> Self {
        Self {
            cursor,
            protection: Protection::Idle,
            last_saved,
        }
    }

    /// Index of the snapshot currently shown, if any exists.
    pub fn cursor(&self) -> Option<u64> {
        self.cursor
    }

    pub fn last_saved(&self) -> Option<&AnnotationState> {
        self.last_saved.as_ref()
    }

    /// Target of the pending load request, if one is outstanding.
    pub fn pending_target(&self) -> Option<u64> {
        match self.protection {
            Protection::Loading { target, .. } => Some(target),
            _ => None,
        }
    }

    /// True while auto-save must not run.
    pub fn is_protected(&self, grace_window: Duration) -> bool {
        match self.protection {
            Protection::Idle => false,
            Protection::Loading { .. } => true,
            Protection::Settling { confirmed_at, .. } => {
                confirmed_at.elapsed() < grace_window
            }
        }
    }

    /// Enter `Loading` for `target`, superseding any prior pending request.
    /// Set before the load command goes out, never after.
    pub fn begin_load(&mut self, target: u64, state: AnnotationState) {
        self.protection = Protection::Loading {
            target,
            issued_at: Instant::now(),
            state,
        };
    }

    /// Handle a load confirmation from the rendering surface.
    ///
    /// A match installs the state-at-target as the last-saved reference,
    /// moves the cursor, and re-stamps the protection so the grace window
    /// runs from confirmed arrival. Anything else is stale and changes
    /// nothing.
    pub fn on_confirmed(&mut self, index: u64) -> ConfirmOutcome {
        match std::mem::replace(&mut self.protection, Protection::Idle) {
            Protection::Loading { target, state, .. } if target == index => {
                self.last_saved = Some(state);
                self.cursor = Some(target);
                self.protection = Protection::Settling {
                    target,
                    confirmed_at: Instant::now(),
                };
                ConfirmOutcome::Applied { target }
            }
            other => {
                self.protection = other;
                ConfirmOutcome::Stale
            }
        }
    }

    /// A navigation load failed before it could be issued or applied:
    /// resume normal auto-save immediately, cursor unchanged.
    pub fn on_load_failed(&mut self) {
        self.protection = Protection::Idle;
    }

    /// Force-clear a load request whose confirmation never arrived.
    /// Returns the abandoned target when the timeout fired.
    pub fn expire_if_stalled(&mut self, load_timeout: Duration) -> Option<u64> {
        if let Protection::Loading {
            target, issued_at, ..
        } = &self.protection
        {
            if issued_at.elapsed() >= load_timeout {
                let target = *target;
                self.protection = Protection::Idle;
                return Some(target);
            }
        }
        None
    }

    /// A scheduler append succeeded: the cursor advances to the new index
    /// and the candidate becomes the last-saved reference.
    pub fn record_append(&mut self, index: u64, state: AnnotationState) {
        self.cursor = Some(index);
        self.last_saved = Some(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{Point, Stroke};

    const GRACE: Duration = Duration::from_secs(2);
    const LOAD_TIMEOUT: Duration = Duration::from_secs(10);

    fn state(x: f64) -> AnnotationState {
        AnnotationState::empty().with_stroke(Stroke::new(vec![Point::new(x, x)], "#ff0000", 2.0))
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_idle_and_unprotected() {
        let nav = NavigationController::new(Some(4), Some(state(4.0)));
        assert!(!nav.is_protected(GRACE));
        assert_eq!(nav.cursor(), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_protects_regardless_of_age() {
        let mut nav = NavigationController::new(Some(4), None);
        nav.begin_load(3, state(3.0));

        assert!(nav.is_protected(GRACE));
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(nav.is_protected(GRACE));
        // Cursor does not move until confirmation.
        assert_eq!(nav.cursor(), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmation_restamps_grace_from_arrival() {
        let mut nav = NavigationController::new(Some(4), None);
        nav.begin_load(3, state(3.0));
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(nav.on_confirmed(3), ConfirmOutcome::Applied { target: 3 });
        assert_eq!(nav.cursor(), Some(3));
        assert_eq!(nav.last_saved(), Some(&state(3.0)));

        // Grace runs from confirmation, not from the request.
        tokio::time::advance(Duration::from_millis(1999)).await;
        assert!(nav.is_protected(GRACE));
        tokio::time::advance(Duration::from_millis(2)).await;
        assert!(!nav.is_protected(GRACE));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_confirmation_is_discarded() {
        let mut nav = NavigationController::new(Some(4), None);
        nav.begin_load(3, state(3.0));
        // Second request supersedes the first before it confirms.
        nav.begin_load(2, state(2.0));

        assert_eq!(nav.on_confirmed(3), ConfirmOutcome::Stale);
        assert_eq!(nav.cursor(), Some(4));
        assert_eq!(nav.pending_target(), Some(2));

        assert_eq!(nav.on_confirmed(2), ConfirmOutcome::Applied { target: 2 });
        assert_eq!(nav.cursor(), Some(2));
        assert_eq!(nav.last_saved(), Some(&state(2.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmation_while_idle_is_stale() {
        let mut nav = NavigationController::new(Some(4), None);
        assert_eq!(nav.on_confirmed(3), ConfirmOutcome::Stale);
        assert!(!nav.is_protected(GRACE));
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_failure_clears_protection() {
        let mut nav = NavigationController::new(Some(4), Some(state(4.0)));
        nav.begin_load(3, state(3.0));
        nav.on_load_failed();

        assert!(!nav.is_protected(GRACE));
        assert_eq!(nav.cursor(), Some(4));
        assert_eq!(nav.last_saved(), Some(&state(4.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_load_expires_after_timeout() {
        let mut nav = NavigationController::new(Some(4), None);
        nav.begin_load(3, state(3.0));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(nav.expire_if_stalled(LOAD_TIMEOUT), None);
        assert!(nav.is_protected(GRACE));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(nav.expire_if_stalled(LOAD_TIMEOUT), Some(3));
        assert!(!nav.is_protected(GRACE));
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_append_moves_cursor() {
        let mut nav = NavigationController::new(Some(4), Some(state(4.0)));
        nav.record_append(5, state(5.0));

        assert_eq!(nav.cursor(), Some(5));
        assert_eq!(nav.last_saved(), Some(&state(5.0)));
        assert!(!nav.is_protected(GRACE));
    }
}
