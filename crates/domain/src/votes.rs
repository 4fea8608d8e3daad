use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteTarget {
    Post,
    Comment,
    Reply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn value(self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

/// Result of applying a vote click to an existing vote value.
///
/// `new_value` of 0 means the vote row is removed. `delta` is what the
/// target's `vote_status` tally changes by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub previous_value: i64,
    pub new_value: i64,
    pub delta: i64,
}

impl VoteOutcome {
    /// Clicking the same arrow twice clears the vote; clicking the opposite
    /// arrow flips it.
    pub fn resolve(existing: Option<i64>, direction: VoteDirection) -> Self {
        let previous_value = existing.unwrap_or(0).signum();
        let requested = direction.value();
        let new_value = if previous_value == requested { 0 } else { requested };
        Self {
            previous_value,
            new_value,
            delta: new_value - previous_value,
        }
    }

    /// True when this click produced a fresh upvote, which is what notifies
    /// the content's author.
    pub fn is_new_upvote(&self) -> bool {
        self.new_value == 1 && self.previous_value != 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRecord {
    pub target: VoteTarget,
    pub target_id: String,
    pub user_id: String,
    pub value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResult {
    pub target: VoteTarget,
    pub target_id: String,
    pub user_vote: i64,
    pub vote_status: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_votes() {
        let up = VoteOutcome::resolve(None, VoteDirection::Up);
        assert_eq!((up.new_value, up.delta), (1, 1));
        assert!(up.is_new_upvote());

        let down = VoteOutcome::resolve(None, VoteDirection::Down);
        assert_eq!((down.new_value, down.delta), (-1, -1));
        assert!(!down.is_new_upvote());
    }

    #[test]
    fn test_repeat_clears() {
        let o = VoteOutcome::resolve(Some(1), VoteDirection::Up);
        assert_eq!((o.new_value, o.delta), (0, -1));
        assert!(!o.is_new_upvote());

        let o = VoteOutcome::resolve(Some(-1), VoteDirection::Down);
        assert_eq!((o.new_value, o.delta), (0, 1));
    }

    #[test]
    fn test_flip() {
        let o = VoteOutcome::resolve(Some(-1), VoteDirection::Up);
        assert_eq!((o.new_value, o.delta), (1, 2));
        assert!(o.is_new_upvote());

        let o = VoteOutcome::resolve(Some(1), VoteDirection::Down);
        assert_eq!((o.new_value, o.delta), (-1, -2));
    }

    #[test]
    fn test_stale_zero_row_counts_as_no_vote() {
        let o = VoteOutcome::resolve(Some(0), VoteDirection::Down);
        assert_eq!((o.previous_value, o.new_value, o.delta), (0, -1, -1));
    }
}
