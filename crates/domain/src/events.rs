use crate::models::{Comment, Post, Reply};
use crate::votes::{VoteOutcome, VoteTarget};
use serde::{Deserialize, Serialize};

/// Broadcast after a write commits. Consumed by the live stream and the
/// notification fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityEvent {
    PostCreated {
        community_id: String,
        post: Post,
    },
    PostDeleted {
        community_id: String,
        post_id: String,
    },
    CommentCreated {
        community_id: String,
        post_creator_id: String,
        post_title: String,
        comment: Comment,
    },
    ReplyCreated {
        community_id: String,
        comment_creator_id: String,
        reply: Reply,
    },
    VoteCast {
        community_id: String,
        post_id: String,
        target: VoteTarget,
        target_id: String,
        target_creator_id: String,
        voter_id: String,
        voter_name: String,
        outcome: VoteOutcome,
        vote_status: i64,
    },
    MemberJoined {
        community_id: String,
        community_creator_id: String,
        user_id: String,
        display_name: String,
    },
}

impl ActivityEvent {
    pub fn community_id(&self) -> &str {
        match self {
            ActivityEvent::PostCreated { community_id, .. }
            | ActivityEvent::PostDeleted { community_id, .. }
            | ActivityEvent::CommentCreated { community_id, .. }
            | ActivityEvent::ReplyCreated { community_id, .. }
            | ActivityEvent::VoteCast { community_id, .. }
            | ActivityEvent::MemberJoined { community_id, .. } => community_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ActivityEvent::PostCreated { .. } => "new_post",
            ActivityEvent::PostDeleted { .. } => "delete_post",
            ActivityEvent::CommentCreated { .. } => "new_comment",
            ActivityEvent::ReplyCreated { .. } => "new_reply",
            ActivityEvent::VoteCast { .. } => "vote",
            ActivityEvent::MemberJoined { .. } => "member_joined",
        }
    }
}
