//! Team model.

use super::User;
use serde::{Deserialize, Serialize};

/// A named group of users. Membership is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub members: Vec<User>,
}

impl Team {
    /// Build a team, stamping every member's `team_name` with `name`.
    ///
    /// Members are ordered by user id, the same order every read returns.
    pub fn new(name: impl Into<String>, members: Vec<User>) -> Self {
        let name = name.into();
        let mut members: Vec<User> = members
            .into_iter()
            .map(|mut member| {
                member.team_name = name.clone();
                member
            })
            .collect();
        members.sort_by(|a, b| a.id.cmp(&b.id));

        Self { name, members }
    }

    /// Ids of all members, in member order.
    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stamps_team_name() {
        let team = Team::new(
            "core",
            vec![
                User::new("u1", "alice", "", true),
                User::new("u2", "bob", "legacy", false),
            ],
        );

        assert!(team.members.iter().all(|m| m.team_name == "core"));
        assert_eq!(team.member_ids(), vec!["u1", "u2"]);
        assert!(!team.members[1].is_active);
    }

    #[test]
    fn test_new_orders_members_by_id() {
        let team = Team::new(
            "core",
            vec![
                User::new("u3", "carol", "", true),
                User::new("u1", "alice", "", true),
                User::new("u2", "bob", "", true),
            ],
        );

        assert_eq!(team.member_ids(), vec!["u1", "u2", "u3"]);
    }
}
