use chrono::{NaiveDate, NaiveDateTime};
use domain::{
    BanSnippet, Comment, Community, CommunityRule, CommunitySnippet, ContactInfo,
    ModeratorSnippet, NotificationKind, Post, PostReport, PrivacyType, Reply, SponsorSnippet,
    UserNotification, UserProfile, VolunteerEvent,
};
use sqlx::{types::Json, FromRow};

#[derive(FromRow)]
pub struct SqlUser {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<SqlUser> for UserProfile {
    fn from(sql: SqlUser) -> Self {
        UserProfile {
            id: sql.id,
            email: sql.email,
            display_name: sql.display_name,
            photo_url: sql.photo_url,
            bio: sql.bio,
            created_at: sql.created_at,
        }
    }
}

#[derive(FromRow)]
pub struct SqlCommunity {
    pub id: String,
    pub creator_id: String,
    pub privacy_type: String,
    pub category: String,
    pub description: String,
    pub image_url: Option<String>,
    pub rules: Json<Vec<CommunityRule>>,
    pub number_of_members: i64,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_website: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<SqlCommunity> for Community {
    fn from(sql: SqlCommunity) -> Self {
        let privacy_type = sql.privacy_type.parse().unwrap_or_else(|_| {
            tracing::warn!(
                "Community {} has unknown privacy type '{}', treating as private",
                sql.id,
                sql.privacy_type
            );
            PrivacyType::Private
        });
        Community {
            id: sql.id,
            creator_id: sql.creator_id,
            privacy_type,
            category: sql.category,
            description: sql.description,
            image_url: sql.image_url,
            rules: sql.rules.0,
            number_of_members: sql.number_of_members,
            contact: ContactInfo {
                email: sql.contact_email,
                phone: sql.contact_phone,
                website: sql.contact_website,
            },
            created_at: sql.created_at,
        }
    }
}

#[derive(FromRow)]
pub struct SqlPost {
    pub id: String,
    pub community_id: String,
    pub creator_id: String,
    pub creator_display_name: String,
    pub title: String,
    pub body: String,
    pub image_urls: Json<Vec<String>>,
    pub vote_status: i64,
    pub number_of_comments: i64,
    pub is_volunteer: bool,
    pub event_date: Option<NaiveDate>,
    pub event_time: Option<String>,
    pub event_location: Option<String>,
    pub volunteers_needed: Option<i64>,
    pub created_at: NaiveDateTime,
    pub edited_at: Option<NaiveDateTime>,
}

impl From<SqlPost> for Post {
    fn from(sql: SqlPost) -> Self {
        let event = sql.event_date.map(|event_date| VolunteerEvent {
            event_date,
            event_time: sql.event_time,
            event_location: sql.event_location,
            volunteers_needed: sql.volunteers_needed,
        });
        Post {
            id: sql.id,
            community_id: sql.community_id,
            creator_id: sql.creator_id,
            creator_display_name: sql.creator_display_name,
            title: sql.title,
            body: sql.body,
            image_urls: sql.image_urls.0,
            vote_status: sql.vote_status,
            number_of_comments: sql.number_of_comments,
            is_volunteer: sql.is_volunteer,
            event,
            created_at: sql.created_at,
            edited_at: sql.edited_at,
        }
    }
}

#[derive(FromRow)]
pub struct SqlComment {
    pub id: String,
    pub post_id: String,
    pub community_id: String,
    pub creator_id: String,
    pub creator_display_name: String,
    pub text: String,
    pub vote_status: i64,
    pub number_of_replies: i64,
    pub created_at: NaiveDateTime,
    pub edited_at: Option<NaiveDateTime>,
}

impl From<SqlComment> for Comment {
    fn from(sql: SqlComment) -> Self {
        Comment {
            id: sql.id,
            post_id: sql.post_id,
            community_id: sql.community_id,
            creator_id: sql.creator_id,
            creator_display_name: sql.creator_display_name,
            text: sql.text,
            vote_status: sql.vote_status,
            number_of_replies: sql.number_of_replies,
            created_at: sql.created_at,
            edited_at: sql.edited_at,
        }
    }
}

#[derive(FromRow)]
pub struct SqlReply {
    pub id: String,
    pub comment_id: String,
    pub post_id: String,
    pub community_id: String,
    pub creator_id: String,
    pub creator_display_name: String,
    pub text: String,
    pub vote_status: i64,
    pub created_at: NaiveDateTime,
    pub edited_at: Option<NaiveDateTime>,
}

impl From<SqlReply> for Reply {
    fn from(sql: SqlReply) -> Self {
        Reply {
            id: sql.id,
            comment_id: sql.comment_id,
            post_id: sql.post_id,
            community_id: sql.community_id,
            creator_id: sql.creator_id,
            creator_display_name: sql.creator_display_name,
            text: sql.text,
            vote_status: sql.vote_status,
            created_at: sql.created_at,
            edited_at: sql.edited_at,
        }
    }
}

// Snippet rows (image_url joined from communities)
#[derive(FromRow)]
pub struct SqlCommunitySnippet {
    pub community_id: String,
    pub is_moderator: bool,
    pub image_url: Option<String>,
    pub joined_at: NaiveDateTime,
}

impl From<SqlCommunitySnippet> for CommunitySnippet {
    fn from(sql: SqlCommunitySnippet) -> Self {
        CommunitySnippet {
            community_id: sql.community_id,
            is_moderator: sql.is_moderator,
            image_url: sql.image_url,
            joined_at: sql.joined_at,
        }
    }
}

#[derive(FromRow)]
pub struct SqlModeratorSnippet {
    pub community_id: String,
    pub user_id: String,
    pub added_by: String,
    pub created_at: NaiveDateTime,
}

impl From<SqlModeratorSnippet> for ModeratorSnippet {
    fn from(sql: SqlModeratorSnippet) -> Self {
        ModeratorSnippet {
            community_id: sql.community_id,
            user_id: sql.user_id,
            added_by: sql.added_by,
            created_at: sql.created_at,
        }
    }
}

#[derive(FromRow)]
pub struct SqlSponsorSnippet {
    pub community_id: String,
    pub user_id: String,
    pub created_at: NaiveDateTime,
}

impl From<SqlSponsorSnippet> for SponsorSnippet {
    fn from(sql: SqlSponsorSnippet) -> Self {
        SponsorSnippet {
            community_id: sql.community_id,
            user_id: sql.user_id,
            created_at: sql.created_at,
        }
    }
}

#[derive(FromRow)]
pub struct SqlBanSnippet {
    pub community_id: String,
    pub user_id: String,
    pub banned_by: String,
    pub reason: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<SqlBanSnippet> for BanSnippet {
    fn from(sql: SqlBanSnippet) -> Self {
        BanSnippet {
            community_id: sql.community_id,
            user_id: sql.user_id,
            banned_by: sql.banned_by,
            reason: sql.reason,
            created_at: sql.created_at,
        }
    }
}

#[derive(FromRow)]
pub struct SqlReport {
    pub id: String,
    pub post_id: String,
    pub community_id: String,
    pub reporter_id: String,
    pub reason: String,
    pub created_at: NaiveDateTime,
}

impl From<SqlReport> for PostReport {
    fn from(sql: SqlReport) -> Self {
        PostReport {
            id: sql.id,
            post_id: sql.post_id,
            community_id: sql.community_id,
            reporter_id: sql.reporter_id,
            reason: sql.reason,
            created_at: sql.created_at,
        }
    }
}

#[derive(FromRow)]
pub struct SqlNotification {
    pub id: String,
    pub recipient_id: String,
    pub kind: String,
    pub actor_id: String,
    pub actor_name: String,
    pub community_id: String,
    pub post_id: Option<String>,
    pub comment_id: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

impl SqlNotification {
    /// Rows with a kind this build does not know are skipped.
    pub fn into_domain(self) -> Option<UserNotification> {
        let kind = NotificationKind::from_db(&self.kind)?;
        Some(UserNotification {
            id: self.id,
            recipient_id: self.recipient_id,
            kind,
            actor_id: self.actor_id,
            actor_name: self.actor_name,
            community_id: self.community_id,
            post_id: self.post_id,
            comment_id: self.comment_id,
            message: self.message,
            is_read: self.is_read,
            created_at: self.created_at,
        })
    }
}
