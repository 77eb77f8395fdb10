use shared::domain::{User, UserId};

/// Users currently typing in one room. Keyed by user id; the local user is
/// never a member.
#[derive(Debug, Clone)]
pub struct TypingRoster {
    self_id: UserId,
    members: Vec<User>,
}

impl TypingRoster {
    pub fn new(self_id: UserId) -> Self {
        Self {
            self_id,
            members: Vec::new(),
        }
    }

    /// Returns `true` when the roster changed.
    pub fn add(&mut self, user: User) -> bool {
        if user.id == self.self_id || self.contains(&user.id) {
            return false;
        }
        self.members.push(user);
        true
    }

    /// Returns `true` when the roster changed.
    pub fn remove(&mut self, user_id: &UserId) -> bool {
        let before = self.members.len();
        self.members.retain(|member| &member.id != user_id);
        self.members.len() != before
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        self.members.iter().any(|member| &member.id == user_id)
    }

    pub fn members(&self) -> &[User] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::user;

    #[test]
    fn add_is_idempotent_and_skips_self() {
        let mut roster = TypingRoster::new(UserId::from("u-me"));
        assert!(roster.add(user("u-bob")));
        assert!(!roster.add(user("u-bob")));
        assert!(!roster.add(user("u-me")));
        assert!(roster.add(user("u-carol")));

        let ids: Vec<_> = roster.members().iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["u-bob", "u-carol"]);
        assert!(!roster.contains(&UserId::from("u-me")));
    }

    #[test]
    fn remove_is_a_no_op_when_absent() {
        let mut roster = TypingRoster::new(UserId::from("u-me"));
        roster.add(user("u-bob"));
        assert!(!roster.remove(&UserId::from("u-carol")));
        assert!(roster.remove(&UserId::from("u-bob")));
        assert!(!roster.remove(&UserId::from("u-bob")));
        assert!(roster.is_empty());
    }

    #[test]
    fn clear_drops_every_member() {
        let mut roster = TypingRoster::new(UserId::from("u-me"));
        roster.add(user("u-bob"));
        roster.add(user("u-carol"));
        roster.clear();
        assert!(roster.is_empty());
    }
}
