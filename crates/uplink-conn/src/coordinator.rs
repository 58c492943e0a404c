//! Client-level coordination of per-link connection status.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::retry::RetryToken;
use crate::status::{fold_client_status, ConnectionStatus, LinkId, TransitionResult};

/// Per-link bookkeeping, owned exclusively by the coordinator.
#[derive(Debug, Default)]
struct LinkEntry {
    /// Last explicitly applied status. `None` until the link is first
    /// transitioned; an untouched link reads as `Disabled` but has not
    /// been terminally disabled the way an explicit transition would.
    status: Option<ConnectionStatus>,
    /// Token for the in-flight retry attempt. Held only while the link is
    /// `Retrying`.
    retry: Option<RetryToken>,
}

impl LinkEntry {
    fn current(&self) -> ConnectionStatus {
        self.status.unwrap_or(ConnectionStatus::Disabled)
    }

    fn is_terminally_disabled(&self) -> bool {
        self.status == Some(ConnectionStatus::Disabled)
    }
}

#[derive(Debug)]
struct CoordinatorState {
    links: HashMap<LinkId, LinkEntry>,
    client_status: ConnectionStatus,
}

/// Tracks the connection status of every configured link and folds them
/// into one client-level status.
///
/// The device client owns a single coordinator and shares it with each
/// link's connection-management logic. All validation, mutation, and
/// folding happen under one internal lock, so concurrent callers observe
/// a consistent order of transitions and every [`TransitionResult`] is a
/// faithful snapshot of the call that produced it. No I/O happens under
/// the lock and nothing here ever sleeps; deciding when to connect or
/// retry belongs to the links themselves.
#[derive(Debug)]
pub struct StatusCoordinator {
    state: Mutex<CoordinatorState>,
}

impl StatusCoordinator {
    /// Creates a coordinator for the given set of links.
    ///
    /// Duplicates collapse. Every configured link starts untouched: it
    /// reads as `Disabled`, and the client status is `Disabled`, until the
    /// first transition request arrives.
    pub fn new<I>(links: I) -> Self
    where
        I: IntoIterator<Item = LinkId>,
    {
        let links = links
            .into_iter()
            .map(|link| (link, LinkEntry::default()))
            .collect();
        Self {
            state: Mutex::new(CoordinatorState {
                links,
                client_status: ConnectionStatus::Disabled,
            }),
        }
    }

    /// Current client-level status: the most severe active status across
    /// the links, or `Disabled` when no link is active.
    pub fn client_status(&self) -> ConnectionStatus {
        self.state.lock().client_status
    }

    /// Current status of one link.
    ///
    /// # Panics
    ///
    /// Panics if `link` is not part of this coordinator's configured set.
    pub fn link_status(&self, link: LinkId) -> ConnectionStatus {
        self.state
            .lock()
            .links
            .get(&link)
            .unwrap_or_else(|| panic!("{link} is not a configured link of this client"))
            .current()
    }

    /// Requests an unconditional transition of `link` to `target`.
    ///
    /// The request is rejected, leaving all state untouched, when the link
    /// has been terminally disabled or when `target` is `Retrying` and the
    /// link is not currently `Connected`. An accepted transition into
    /// `Retrying` carries a fresh [`RetryToken`] in the result; leaving
    /// `Retrying` by any route cancels the token issued on entry.
    ///
    /// # Panics
    ///
    /// Panics if `link` is not part of this coordinator's configured set.
    pub fn request_transition(&self, link: LinkId, target: ConnectionStatus) -> TransitionResult {
        self.apply(link, target, None)
    }

    /// Requests a transition of `link` to `target` only if the link is
    /// still at `expected`.
    ///
    /// This is the compare-and-swap form of [`request_transition`]: on top
    /// of the usual validity rules, the request is rejected when the
    /// link's current status differs from `expected`, which means the
    /// caller acted on a stale view. An untouched link compares as
    /// `Disabled` here.
    ///
    /// [`request_transition`]: StatusCoordinator::request_transition
    ///
    /// # Panics
    ///
    /// Panics if `link` is not part of this coordinator's configured set.
    pub fn request_transition_from(
        &self,
        link: LinkId,
        expected: ConnectionStatus,
        target: ConnectionStatus,
    ) -> TransitionResult {
        self.apply(link, target, Some(expected))
    }

    /// Forces every link to the terminal `Disabled` status and cancels
    /// every outstanding retry token. The client status becomes
    /// `Disabled`.
    ///
    /// This is the client-shutdown path. It follows the same lock
    /// discipline as single transitions, so it can race against them
    /// safely, and calling it again once everything is disabled is a
    /// harmless no-op.
    pub fn disable_all(&self) {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let mut cancelled_tokens = 0usize;
        for entry in state.links.values_mut() {
            if let Some(token) = entry.retry.take() {
                token.cancel();
                cancelled_tokens += 1;
            }
            entry.status = Some(ConnectionStatus::Disabled);
        }
        state.client_status = fold_client_status(state.links.values().map(LinkEntry::current));

        info!(cancelled_tokens, "All links disabled");
    }

    fn apply(
        &self,
        link: LinkId,
        target: ConnectionStatus,
        expected: Option<ConnectionStatus>,
    ) -> TransitionResult {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let entry = state
            .links
            .get_mut(&link)
            .unwrap_or_else(|| panic!("{link} is not a configured link of this client"));
        let current = entry.current();

        let rejected = entry.is_terminally_disabled()
            || expected.is_some_and(|expected| current != expected)
            || (target == ConnectionStatus::Retrying && current != ConnectionStatus::Connected);
        if rejected {
            debug!(
                link = %link,
                current = %current,
                requested = %target,
                "Link transition rejected"
            );
            return TransitionResult {
                link_status_changed: false,
                client_status_changed: false,
                client_status: state.client_status,
                retry_token: None,
            };
        }

        // A token only lives while its link is `Retrying`, so taking it
        // here cancels exactly the attempt this transition steps out of.
        if let Some(previous) = entry.retry.take() {
            previous.cancel();
        }
        let retry_token = (target == ConnectionStatus::Retrying).then(|| {
            let token = RetryToken::new();
            entry.retry = Some(token.clone());
            token
        });
        entry.status = Some(target);

        let previous_client = state.client_status;
        let client_status = fold_client_status(state.links.values().map(LinkEntry::current));
        state.client_status = client_status;
        let client_status_changed = client_status != previous_client;

        debug!(link = %link, from = %current, to = %target, "Link transition applied");
        if client_status_changed {
            info!(
                previous = %previous_client,
                current = %client_status,
                "Client connection status changed"
            );
        }

        TransitionResult {
            link_status_changed: true,
            client_status_changed,
            client_status,
            retry_token,
        }
    }
}

impl Default for StatusCoordinator {
    /// Coordinator configured with every link in [`LinkId::ALL`].
    fn default() -> Self {
        Self::new(LinkId::ALL)
    }
}
