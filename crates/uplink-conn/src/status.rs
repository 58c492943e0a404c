//! Link identities, connection statuses, and transition outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::retry::RetryToken;

/// Logical links the device client keeps open toward its backend.
///
/// Each link carries one kind of traffic and connects, drops, and retries
/// independently of the others. The coordinator tracks a status per link
/// and folds them into a single client-level status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkId {
    /// Device-to-backend telemetry stream.
    Telemetry,
    /// Backend-to-device delivery: commands, messages, acknowledgements.
    Commands,
}

impl LinkId {
    /// Every link the client can be configured with.
    pub const ALL: [LinkId; 2] = [LinkId::Telemetry, LinkId::Commands];

    /// Stable lowercase name, used for log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkId::Telemetry => "telemetry",
            LinkId::Commands => "commands",
        }
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection status of a single link, and of the client as a whole.
///
/// The client-level status is folded from the per-link statuses: the most
/// severe active status wins, ranked [`Disconnected`] over [`Retrying`]
/// over [`Connected`]. [`Disabled`] sits outside that ranking and surfaces
/// as the client status only when no link carries an active status.
///
/// [`Disconnected`]: ConnectionStatus::Disconnected
/// [`Retrying`]: ConnectionStatus::Retrying
/// [`Connected`]: ConnectionStatus::Connected
/// [`Disabled`]: ConnectionStatus::Disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// The link is not in use. Once a link is explicitly moved here the
    /// status is terminal: every later transition request is rejected.
    Disabled,
    /// The link lost its connection and no automatic retry is running.
    Disconnected,
    /// The link lost its connection and an automatic retry attempt is in
    /// flight.
    Retrying,
    /// The link is connected and operational.
    Connected,
}

impl ConnectionStatus {
    /// Rank of an active status in the client-level fold; higher is worse.
    /// `Disabled` never competes, so it has no rank.
    pub(crate) fn severity(self) -> Option<u8> {
        match self {
            ConnectionStatus::Connected => Some(0),
            ConnectionStatus::Retrying => Some(1),
            ConnectionStatus::Disconnected => Some(2),
            ConnectionStatus::Disabled => None,
        }
    }

    /// Stable lowercase name, used for log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Disabled => "disabled",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Retrying => "retrying",
            ConnectionStatus::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Folds per-link statuses into the single client-level status.
///
/// Pure over its input: `Disabled` entries are excluded from the ranking,
/// and when nothing active remains the client as a whole is `Disabled`.
pub(crate) fn fold_client_status<I>(statuses: I) -> ConnectionStatus
where
    I: IntoIterator<Item = ConnectionStatus>,
{
    statuses
        .into_iter()
        .filter_map(|status| status.severity().map(|rank| (rank, status)))
        .max_by_key(|&(rank, _)| rank)
        .map(|(_, status)| status)
        .unwrap_or(ConnectionStatus::Disabled)
}

/// Outcome of a single transition request.
///
/// The coordinator does not retain this; every call receives its own
/// snapshot describing what that call changed.
#[derive(Debug, Clone)]
pub struct TransitionResult {
    /// Whether the requested transition was applied to the link. `false`
    /// means the request was rejected and nothing changed.
    pub link_status_changed: bool,
    /// Whether applying the transition moved the client-level status.
    pub client_status_changed: bool,
    /// Client-level status after the request. Unchanged on rejection.
    pub client_status: ConnectionStatus,
    /// Fresh cancellation token when the transition entered `Retrying`.
    /// The retry loop holds it for the lifetime of that attempt and must
    /// stop promptly once it observes cancellation.
    pub retry_token: Option<RetryToken>,
}

impl TransitionResult {
    /// Whether the request was accepted and applied.
    ///
    /// A rejection is authoritative: the caller's view of the link was
    /// stale, and the right response is to re-read the current status and
    /// re-decide, not to force the transition through.
    pub fn accepted(&self) -> bool {
        self.link_status_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_picks_the_most_severe_active_status() {
        use super::ConnectionStatus::*;

        assert_eq!(fold_client_status([Connected, Connected]), Connected);
        assert_eq!(fold_client_status([Connected, Retrying]), Retrying);
        assert_eq!(fold_client_status([Retrying, Disconnected]), Disconnected);
        assert_eq!(
            fold_client_status([Connected, Retrying, Disconnected]),
            Disconnected
        );
    }

    #[test]
    fn fold_excludes_disabled_links_unless_nothing_else_remains() {
        use super::ConnectionStatus::*;

        assert_eq!(fold_client_status([Disabled, Connected]), Connected);
        assert_eq!(fold_client_status([Disabled, Retrying]), Retrying);
        assert_eq!(fold_client_status([Disabled, Disabled]), Disabled);
        assert_eq!(fold_client_status([]), Disabled);
    }

    #[test]
    fn status_names_are_stable() {
        assert_eq!(ConnectionStatus::Disabled.as_str(), "disabled");
        assert_eq!(ConnectionStatus::Disconnected.as_str(), "disconnected");
        assert_eq!(ConnectionStatus::Retrying.as_str(), "retrying");
        assert_eq!(ConnectionStatus::Connected.as_str(), "connected");
        assert_eq!(LinkId::Telemetry.to_string(), "telemetry");
        assert_eq!(LinkId::Commands.to_string(), "commands");
    }

    #[test]
    fn statuses_serialize_as_plain_variant_names() {
        let json = serde_json::to_string(&ConnectionStatus::Retrying).unwrap();
        assert_eq!(json, "\"Retrying\"");

        let status: ConnectionStatus = serde_json::from_str("\"Connected\"").unwrap();
        assert_eq!(status, ConnectionStatus::Connected);

        let link: LinkId = serde_json::from_str("\"Telemetry\"").unwrap();
        assert_eq!(link, LinkId::Telemetry);
    }
}
