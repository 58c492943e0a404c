//! Connection-status coordination for a multi-link device client.
//!
//! A device client keeps several independent logical links open toward its
//! backend (telemetry, commands). Each link connects, drops, and retries on
//! its own schedule, yet the rest of the client needs one answer to "are we
//! connected right now?". This crate provides that answer.
//!
//! [`StatusCoordinator`] owns a status table with one entry per configured
//! link, validates and applies transition requests atomically, and folds
//! the per-link statuses into a single client-level [`ConnectionStatus`]:
//! the most severe active status wins, and terminally disabled links are
//! left out of the fold. Entering the retrying state hands the caller a
//! fresh [`RetryToken`]; the coordinator fires it as soon as the link
//! leaves that state again, so an automatic-retry loop can observe exactly
//! when its attempt stopped mattering.
//!
//! The coordinator performs no I/O and never sleeps. When to reconnect,
//! how often to retry, and what backoff to use are all decisions of the
//! links and their retry policy; this crate only keeps the shared view of
//! those decisions consistent under concurrency.

pub mod coordinator;
pub mod retry;
pub mod status;

pub use coordinator::*;
pub use retry::*;
pub use status::*;
