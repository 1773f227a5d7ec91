use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::debug;

use crate::error::SessionError;

/// Result of one refresh: the new access token, or the failure every
/// participant receives.
pub type RefreshOutcome = Result<String, SessionError>;

#[derive(Default)]
struct FlightState {
    in_flight: bool,
    waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
}

/// Single-flight gate for token refreshes.
///
/// The first caller to `join` while idle becomes the leader and performs the
/// refresh. Callers arriving while it runs get a waiter ticket and are
/// settled, in arrival order, with the leader's outcome. At most one refresh
/// is in flight per coordinator.
#[derive(Clone, Default)]
pub struct RefreshCoordinator {
    state: Arc<Mutex<FlightState>>,
}

pub enum Ticket {
    /// Caller must perform the refresh and hand the outcome to the guard
    Leader(FlightGuard),
    /// A refresh is already running; await its outcome
    Waiter(oneshot::Receiver<RefreshOutcome>),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self) -> Ticket {
        let mut state = self.lock();
        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            debug!(waiters = state.waiters.len(), "Refresh in flight, queued waiter");
            Ticket::Waiter(rx)
        } else {
            state.in_flight = true;
            Ticket::Leader(FlightGuard {
                state: Arc::clone(&self.state),
                settled: false,
            })
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().in_flight
    }

    /// Number of callers queued behind the current refresh
    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }

    fn lock(&self) -> MutexGuard<'_, FlightState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Await the outcome of a refresh led by someone else.
pub async fn wait(rx: oneshot::Receiver<RefreshOutcome>) -> RefreshOutcome {
    rx.await.unwrap_or(Err(SessionError::RefreshAborted))
}

/// Held by the refresh leader. Dropping it unsettled (e.g. the leader's
/// future was cancelled) rejects every waiter with `RefreshAborted`.
pub struct FlightGuard {
    state: Arc<Mutex<FlightState>>,
    settled: bool,
}

impl FlightGuard {
    /// Return the coordinator to idle and settle all waiters with `outcome`.
    pub fn complete(mut self, outcome: &RefreshOutcome) {
        self.settle(outcome);
    }

    fn settle(&mut self, outcome: &RefreshOutcome) {
        let waiters = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };
        self.settled = true;
        debug!(waiters = waiters.len(), ok = outcome.is_ok(), "Settling refresh waiters");
        for waiter in waiters {
            // A waiter whose request was cancelled has dropped its receiver
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if !self.settled {
            self.settle(&Err(SessionError::RefreshAborted));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leader(coordinator: &RefreshCoordinator) -> FlightGuard {
        match coordinator.join() {
            Ticket::Leader(guard) => guard,
            Ticket::Waiter(_) => panic!("expected to lead the refresh"),
        }
    }

    fn waiter(coordinator: &RefreshCoordinator) -> oneshot::Receiver<RefreshOutcome> {
        match coordinator.join() {
            Ticket::Waiter(rx) => rx,
            Ticket::Leader(_) => panic!("expected to wait on the refresh"),
        }
    }

    #[tokio::test]
    async fn test_waiters_receive_leader_token() {
        let coordinator = RefreshCoordinator::new();
        let guard = leader(&coordinator);
        let first = waiter(&coordinator);
        let second = waiter(&coordinator);
        assert!(coordinator.is_refreshing());
        assert_eq!(coordinator.waiting(), 2);

        guard.complete(&Ok("new-token".to_string()));

        assert_eq!(wait(first).await.unwrap(), "new-token");
        assert_eq!(wait(second).await.unwrap(), "new-token");
        assert!(!coordinator.is_refreshing());
        assert_eq!(coordinator.waiting(), 0);
    }

    #[tokio::test]
    async fn test_waiters_settled_in_arrival_order() {
        let coordinator = RefreshCoordinator::new();
        let guard = leader(&coordinator);
        let settled = Arc::new(Mutex::new(Vec::new()));

        // Current-thread runtime: woken tasks run in the order they were woken
        let tasks: Vec<_> = (0..5)
            .map(|i| {
                let rx = waiter(&coordinator);
                let settled = Arc::clone(&settled);
                tokio::spawn(async move {
                    wait(rx).await.unwrap();
                    settled.lock().unwrap().push(i);
                })
            })
            .collect();
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert!(settled.lock().unwrap().is_empty());

        guard.complete(&Ok("new-token".to_string()));
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(*settled.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_waiters_rejected_with_leader_error() {
        let coordinator = RefreshCoordinator::new();
        let guard = leader(&coordinator);
        let rx = waiter(&coordinator);

        guard.complete(&Err(SessionError::Http {
            status: 400,
            message: "Invalid refresh token".to_string(),
        }));

        match wait(rx).await {
            Err(SessionError::Http { status, .. }) => assert_eq!(status, 400),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dropped_leader_aborts_waiters() {
        let coordinator = RefreshCoordinator::new();
        let guard = leader(&coordinator);
        let rx = waiter(&coordinator);

        drop(guard);

        assert!(matches!(wait(rx).await, Err(SessionError::RefreshAborted)));
        assert!(!coordinator.is_refreshing());
    }

    #[test]
    fn test_next_refresh_after_completion_leads_again() {
        let coordinator = RefreshCoordinator::new();
        leader(&coordinator).complete(&Ok("t1".to_string()));
        let _guard = leader(&coordinator);
        assert!(coordinator.is_refreshing());
    }
}
