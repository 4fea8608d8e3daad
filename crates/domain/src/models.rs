use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyType {
    #[default]
    Public,
    Restricted,
    Private,
}

impl PrivacyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyType::Public => "public",
            PrivacyType::Restricted => "restricted",
            PrivacyType::Private => "private",
        }
    }

    /// Non-members may read posts unless the community is private.
    pub fn visible_to_outsiders(&self) -> bool {
        !matches!(self, PrivacyType::Private)
    }
}

impl fmt::Display for PrivacyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivacyType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(PrivacyType::Public),
            "restricted" => Ok(PrivacyType::Restricted),
            "private" => Ok(PrivacyType::Private),
            other => Err(ValidationError::UnknownPrivacyType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityRule {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    pub id: String,
    pub creator_id: String,
    pub privacy_type: PrivacyType,
    pub category: String,
    pub description: String,
    pub image_url: Option<String>,
    pub rules: Vec<CommunityRule>,
    pub number_of_members: i64,
    pub contact: ContactInfo,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerEvent {
    pub event_date: NaiveDate,
    pub event_time: Option<String>,
    pub event_location: Option<String>,
    pub volunteers_needed: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub community_id: String,
    pub creator_id: String,
    pub creator_display_name: String,
    pub title: String,
    pub body: String,
    pub image_urls: Vec<String>,
    pub vote_status: i64,
    pub number_of_comments: i64,
    pub is_volunteer: bool,
    pub event: Option<VolunteerEvent>,
    pub created_at: NaiveDateTime,
    pub edited_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: NaiveDateTime,
}

// Snippets: one row per (user, community) relationship.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunitySnippet {
    pub community_id: String,
    pub is_moderator: bool,
    pub image_url: Option<String>,
    pub joined_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeratorSnippet {
    pub community_id: String,
    pub user_id: String,
    pub added_by: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsorSnippet {
    pub community_id: String,
    pub user_id: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanSnippet {
    pub community_id: String,
    pub user_id: String,
    pub banned_by: String,
    pub reason: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostReport {
    pub id: String,
    pub post_id: String,
    pub community_id: String,
    pub reporter_id: String,
    pub reason: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostSort {
    #[default]
    New,
    Top,
}
