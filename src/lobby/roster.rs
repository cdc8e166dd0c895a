//! Online-user roster

use crate::types::{OnlineUser, UserId};

/// Peers currently online, excluding the local user
#[derive(Debug, Clone)]
pub struct Roster {
    local_user: UserId,
    users: Vec<OnlineUser>,
}

impl Roster {
    pub fn new(local_user: impl Into<UserId>) -> Self {
        Self {
            local_user: local_user.into(),
            users: Vec::new(),
        }
    }

    /// Replace the whole roster with a server broadcast (last write wins)
    pub fn replace(&mut self, users: Vec<OnlineUser>) {
        let mut next: Vec<OnlineUser> = Vec::with_capacity(users.len());
        for user in users {
            if user.user_id == self.local_user || next.iter().any(|u| u.user_id == user.user_id) {
                continue;
            }
            next.push(user);
        }
        self.users = next;
    }

    pub fn get(&self, user_id: &str) -> Option<&OnlineUser> {
        self.users.iter().find(|user| user.user_id == user_id)
    }

    pub fn users(&self) -> &[OnlineUser] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
