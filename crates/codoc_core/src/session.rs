//! Session registry and outbound fan-out.
//!
//! Each attached session owns an unbounded outbound queue; the service
//! addresses them individually, all at once, or all-but-one. Identity is
//! resolved by the transport before attach and cached here for edit
//! attribution.

use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::protocol::{Outbound, OutboundMessage};

/// Identifier the transport assigns to a connected session.
pub type SessionId = u32;

/// Resolved identity of a connected session, cached at attach time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Stable user id, used to attribute edits.
    pub id: u32,
    /// Display name.
    pub username: String,
}

/// Which sessions an outbound event is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A single session.
    Only(SessionId),
    /// Every attached session.
    Everyone,
    /// Every attached session except one.
    EveryoneExcept(SessionId),
}

/// The attached sessions and their outbound queues.
#[derive(Debug, Default)]
pub struct SessionMap {
    senders: HashMap<SessionId, mpsc::UnboundedSender<OutboundMessage>>,
}

impl SessionMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session's outbound queue.
    pub fn attach(&mut self, session: SessionId, sender: mpsc::UnboundedSender<OutboundMessage>) {
        self.senders.insert(session, sender);
    }

    /// Drop a session. Returns whether it was attached.
    pub fn detach(&mut self, session: SessionId) -> bool {
        self.senders.remove(&session).is_some()
    }

    /// Ids of all attached sessions.
    pub fn ids(&self) -> Vec<SessionId> {
        self.senders.keys().copied().collect()
    }

    /// Number of attached sessions.
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    /// Whether no sessions are attached.
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Send an event to the selected sessions, without a reference echo.
    pub fn send(&mut self, target: Target, body: Outbound) {
        let recipients: Vec<SessionId> = match target {
            Target::Only(session) => vec![session],
            Target::Everyone => self.ids(),
            Target::EveryoneExcept(excluded) => {
                self.ids().into_iter().filter(|s| *s != excluded).collect()
            }
        };

        for session in recipients {
            self.send_to(session, None, body.clone());
        }
    }

    /// Send an event to one session, echoing the given request reference.
    ///
    /// A session whose receiver is gone is pruned; losing a message to a
    /// dead session is not an error.
    pub fn send_to(&mut self, session: SessionId, reference: Option<String>, body: Outbound) {
        let Some(sender) = self.senders.get(&session) else {
            debug!("No outbound queue for session {}", session);
            return;
        };

        let message = OutboundMessage {
            session,
            reference,
            body,
        };
        if sender.send(message).is_err() {
            warn!("Outbound queue for session {} is closed, detaching", session);
            self.senders.remove(&session);
        }
    }
}
