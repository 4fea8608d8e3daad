use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::events::ActivityEvent;
use crate::votes::VoteTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Comment,
    Reply,
    Upvote,
    CommunityJoin,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Comment => "comment",
            NotificationKind::Reply => "reply",
            NotificationKind::Upvote => "upvote",
            NotificationKind::CommunityJoin => "community_join",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "comment" => Some(NotificationKind::Comment),
            "reply" => Some(NotificationKind::Reply),
            "upvote" => Some(NotificationKind::Upvote),
            "community_join" => Some(NotificationKind::CommunityJoin),
            _ => None,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserNotification {
    pub id: String,
    pub recipient_id: String,
    pub kind: NotificationKind,
    pub actor_id: String,
    pub actor_name: String,
    pub community_id: String,
    pub post_id: Option<String>,
    pub comment_id: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub recipient_id: String,
    pub kind: NotificationKind,
    pub actor_id: String,
    pub actor_name: String,
    pub community_id: String,
    pub post_id: Option<String>,
    pub comment_id: Option<String>,
    pub message: String,
}

/// Maps an activity to the single inbox entry it produces, if any.
/// Acting on your own content never notifies you.
pub fn notification_for(event: &ActivityEvent) -> Option<NewNotification> {
    let n = match event {
        ActivityEvent::CommentCreated {
            community_id,
            post_creator_id,
            post_title,
            comment,
        } => NewNotification {
            recipient_id: post_creator_id.clone(),
            kind: NotificationKind::Comment,
            actor_id: comment.creator_id.clone(),
            actor_name: comment.creator_display_name.clone(),
            community_id: community_id.clone(),
            post_id: Some(comment.post_id.clone()),
            comment_id: Some(comment.id.clone()),
            message: format!(
                "{} commented on your post \"{}\"",
                comment.creator_display_name, post_title
            ),
        },
        ActivityEvent::ReplyCreated {
            community_id,
            comment_creator_id,
            reply,
        } => NewNotification {
            recipient_id: comment_creator_id.clone(),
            kind: NotificationKind::Reply,
            actor_id: reply.creator_id.clone(),
            actor_name: reply.creator_display_name.clone(),
            community_id: community_id.clone(),
            post_id: Some(reply.post_id.clone()),
            comment_id: Some(reply.comment_id.clone()),
            message: format!("{} replied to your comment", reply.creator_display_name),
        },
        ActivityEvent::VoteCast {
            community_id,
            post_id,
            target,
            target_id,
            target_creator_id,
            voter_id,
            voter_name,
            outcome,
            ..
        } => {
            if !outcome.is_new_upvote() {
                return None;
            }
            let what = match target {
                VoteTarget::Post => "post",
                VoteTarget::Comment => "comment",
                VoteTarget::Reply => "reply",
            };
            NewNotification {
                recipient_id: target_creator_id.clone(),
                kind: NotificationKind::Upvote,
                actor_id: voter_id.clone(),
                actor_name: voter_name.clone(),
                community_id: community_id.clone(),
                post_id: Some(post_id.clone()),
                comment_id: (*target != VoteTarget::Post).then(|| target_id.clone()),
                message: format!("{} upvoted your {}", voter_name, what),
            }
        }
        ActivityEvent::MemberJoined {
            community_id,
            community_creator_id,
            user_id,
            display_name,
        } => NewNotification {
            recipient_id: community_creator_id.clone(),
            kind: NotificationKind::CommunityJoin,
            actor_id: user_id.clone(),
            actor_name: display_name.clone(),
            community_id: community_id.clone(),
            post_id: None,
            comment_id: None,
            message: format!("{} joined {}", display_name, community_id),
        },
        ActivityEvent::PostCreated { .. } | ActivityEvent::PostDeleted { .. } => return None,
    };

    if n.recipient_id == n.actor_id {
        return None;
    }
    Some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Comment, Reply};
    use crate::votes::{VoteDirection, VoteOutcome};
    use chrono::Utc;

    fn comment(creator: &str) -> Comment {
        Comment {
            id: "c1".into(),
            post_id: "p1".into(),
            community_id: "cleanup".into(),
            creator_id: creator.into(),
            creator_display_name: "Ana".into(),
            text: "Count me in".into(),
            vote_status: 0,
            number_of_replies: 0,
            created_at: Utc::now().naive_utc(),
            edited_at: None,
        }
    }

    fn vote(outcome: VoteOutcome, voter: &str) -> ActivityEvent {
        ActivityEvent::VoteCast {
            community_id: "cleanup".into(),
            post_id: "p1".into(),
            target: VoteTarget::Comment,
            target_id: "c1".into(),
            target_creator_id: "owner".into(),
            voter_id: voter.into(),
            voter_name: "Ben".into(),
            outcome,
            vote_status: 1,
        }
    }

    #[test]
    fn test_comment_notifies_post_creator() {
        let event = ActivityEvent::CommentCreated {
            community_id: "cleanup".into(),
            post_creator_id: "owner".into(),
            post_title: "Saturday cleanup".into(),
            comment: comment("u-ana"),
        };
        let n = notification_for(&event).unwrap();
        assert_eq!(n.recipient_id, "owner");
        assert_eq!(n.kind, NotificationKind::Comment);
        assert_eq!(n.comment_id.as_deref(), Some("c1"));
        assert!(n.message.contains("Saturday cleanup"));
    }

    #[test]
    fn test_own_content_is_silent() {
        let event = ActivityEvent::CommentCreated {
            community_id: "cleanup".into(),
            post_creator_id: "owner".into(),
            post_title: "Saturday cleanup".into(),
            comment: comment("owner"),
        };
        assert!(notification_for(&event).is_none());

        let upvote = VoteOutcome::resolve(None, VoteDirection::Up);
        assert!(notification_for(&vote(upvote, "owner")).is_none());
    }

    #[test]
    fn test_only_fresh_upvotes_notify() {
        let upvote = VoteOutcome::resolve(None, VoteDirection::Up);
        let n = notification_for(&vote(upvote, "u-ben")).unwrap();
        assert_eq!(n.kind, NotificationKind::Upvote);
        assert_eq!(n.comment_id.as_deref(), Some("c1"));

        let cleared = VoteOutcome::resolve(Some(1), VoteDirection::Up);
        assert!(notification_for(&vote(cleared, "u-ben")).is_none());

        let down = VoteOutcome::resolve(None, VoteDirection::Down);
        assert!(notification_for(&vote(down, "u-ben")).is_none());
    }

    #[test]
    fn test_reply_and_join() {
        let reply = Reply {
            id: "r1".into(),
            comment_id: "c1".into(),
            post_id: "p1".into(),
            community_id: "cleanup".into(),
            creator_id: "u-ben".into(),
            creator_display_name: "Ben".into(),
            text: "Same".into(),
            vote_status: 0,
            created_at: Utc::now().naive_utc(),
            edited_at: None,
        };
        let n = notification_for(&ActivityEvent::ReplyCreated {
            community_id: "cleanup".into(),
            comment_creator_id: "u-ana".into(),
            reply,
        })
        .unwrap();
        assert_eq!((n.recipient_id.as_str(), n.kind), ("u-ana", NotificationKind::Reply));

        let n = notification_for(&ActivityEvent::MemberJoined {
            community_id: "cleanup".into(),
            community_creator_id: "owner".into(),
            user_id: "u-ben".into(),
            display_name: "Ben".into(),
        })
        .unwrap();
        assert_eq!(n.kind, NotificationKind::CommunityJoin);
        assert_eq!(n.message, "Ben joined cleanup");
    }

    #[test]
    fn test_kind_db_roundtrip_names() {
        for kind in [
            NotificationKind::Comment,
            NotificationKind::Reply,
            NotificationKind::Upvote,
            NotificationKind::CommunityJoin,
        ] {
            assert_eq!(NotificationKind::from_db(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::from_db("mention"), None);
    }
}
