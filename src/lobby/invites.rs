//! Pending invites addressed to the local user
//!
//! Each invite moves `pending -> accepted` or `pending -> declined` exactly
//! once. Resolution is recorded so a re-delivered invite with the same
//! timestamp cannot become pending again.

use crate::error::{LobbyError, Result};
use crate::types::{InviteId, InviteResolution, PendingInvite, UserId};
use std::collections::HashMap;
use tracing::debug;

/// Pending and resolved invites for one user
#[derive(Debug, Clone)]
pub struct InviteBook {
    owner: UserId,
    pending: Vec<PendingInvite>,
    /// Every invite resolved this session. Kept for the session's lifetime
    /// so a re-delivered invite cannot become pending again.
    resolved: HashMap<InviteId, InviteResolution>,
}

impl InviteBook {
    pub fn new(owner: impl Into<UserId>) -> Self {
        Self {
            owner: owner.into(),
            pending: Vec::new(),
            resolved: HashMap::new(),
        }
    }

    /// Record an incoming invite. Returns whether it became pending.
    ///
    /// Invites for another user, duplicates, and already resolved invites are
    /// ignored.
    pub fn receive(&mut self, invite: PendingInvite) -> bool {
        if invite.to_user_id != self.owner {
            debug!(
                "Ignoring invite {} addressed to '{}'",
                invite.timestamp, invite.to_user_id
            );
            return false;
        }
        if self.resolved.contains_key(&invite.timestamp) || self.get(invite.timestamp).is_some() {
            debug!("Ignoring repeated invite {}", invite.timestamp);
            return false;
        }
        self.pending.push(invite);
        true
    }

    /// Move a pending invite to its terminal state and hand it back.
    ///
    /// This is irreversible: whatever happens afterwards (a failed join
    /// included), the invite never returns to pending.
    pub fn resolve(
        &mut self,
        timestamp: InviteId,
        resolution: InviteResolution,
    ) -> Result<PendingInvite> {
        let index = self
            .pending
            .iter()
            .position(|invite| invite.timestamp == timestamp)
            .ok_or(LobbyError::InviteNotFound { timestamp })?;
        let invite = self.pending.remove(index);
        self.resolved.insert(timestamp, resolution);
        Ok(invite)
    }

    pub fn get(&self, timestamp: InviteId) -> Option<&PendingInvite> {
        self.pending.iter().find(|invite| invite.timestamp == timestamp)
    }

    pub fn resolution(&self, timestamp: InviteId) -> Option<InviteResolution> {
        self.resolved.get(&timestamp).copied()
    }

    pub fn pending(&self) -> &[PendingInvite] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invite(timestamp: InviteId, to: &str) -> PendingInvite {
        PendingInvite {
            timestamp,
            from_user_id: "host".to_string(),
            from_email: "host@example.com".to_string(),
            to_user_id: to.to_string(),
            to_email: format!("{}@example.com", to),
            table_name: "Friday Seka".to_string(),
            entry_fee: 10.0,
            max_players: 4,
            game_id: "friday-seka".to_string(),
        }
    }

    #[test]
    fn test_receive_and_resolve() {
        let mut book = InviteBook::new("me");
        assert!(book.receive(invite(1, "me")));
        assert_eq!(book.len(), 1);

        let taken = book.resolve(1, InviteResolution::Accepted).unwrap();
        assert_eq!(taken.game_id, "friday-seka");
        assert!(book.is_empty());
        assert_eq!(book.resolution(1), Some(InviteResolution::Accepted));
    }

    #[test]
    fn test_resolve_is_at_most_once() {
        let mut book = InviteBook::new("me");
        book.receive(invite(1, "me"));
        book.resolve(1, InviteResolution::Declined).unwrap();

        let err = book.resolve(1, InviteResolution::Accepted).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LobbyError>(),
            Some(LobbyError::InviteNotFound { timestamp: 1 })
        ));
        assert_eq!(book.resolution(1), Some(InviteResolution::Declined));
    }

    #[test]
    fn test_duplicates_and_foreign_invites_ignored() {
        let mut book = InviteBook::new("me");
        assert!(book.receive(invite(1, "me")));
        assert!(!book.receive(invite(1, "me")));
        assert!(!book.receive(invite(2, "someone-else")));
        assert_eq!(book.len(), 1);

        book.resolve(1, InviteResolution::Accepted).unwrap();
        assert!(!book.receive(invite(1, "me")));
        assert!(book.is_empty());
    }
}
