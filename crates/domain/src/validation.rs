use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::models::{CommunityRule, ContactInfo, PrivacyType, VolunteerEvent};

pub const COMMUNITY_NAME_MIN: usize = 3;
pub const COMMUNITY_NAME_MAX: usize = 21;
pub const POST_TITLE_MAX: usize = 300;
pub const POST_BODY_MAX: usize = 40_000;
pub const COMMENT_TEXT_MAX: usize = 10_000;
pub const DISPLAY_NAME_MAX: usize = 50;
pub const DESCRIPTION_MAX: usize = 500;
pub const RULES_MAX: usize = 15;
pub const IMAGES_PER_POST_MAX: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Community name must be between 3 and 21 characters")]
    CommunityNameLength,
    #[error("Community name can only contain letters, numbers and underscores")]
    CommunityNameCharacters,
    #[error("Unknown privacy type: {0}")]
    UnknownPrivacyType(String),
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
    #[error("{field} is too long (max {max} chars)")]
    TooLong { field: &'static str, max: usize },
    #[error("At most 15 rules are allowed")]
    TooManyRules,
    #[error("At most 10 images are allowed per post")]
    TooManyImages,
    #[error("Volunteer posts need an event date")]
    MissingEventDate,
    #[error("Volunteers needed must be positive")]
    InvalidVolunteerCount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommunityName(String);

impl CommunityName {
    pub fn parse(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        let len = s.chars().count();
        if !(COMMUNITY_NAME_MIN..=COMMUNITY_NAME_MAX).contains(&len) {
            return Err(ValidationError::CommunityNameLength);
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ValidationError::CommunityNameCharacters);
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CommunityName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<CommunityName> for String {
    fn from(name: CommunityName) -> Self {
        name.0
    }
}

impl fmt::Display for CommunityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trims `value` and checks it is non-empty and within `max` characters.
pub fn require_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    limit_text(field, trimmed, max)
}

pub fn limit_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(value.to_string())
}

fn validate_rules(rules: &[CommunityRule]) -> Result<(), ValidationError> {
    if rules.len() > RULES_MAX {
        return Err(ValidationError::TooManyRules);
    }
    for rule in rules {
        require_text("Rule title", &rule.title, 100)?;
        limit_text("Rule body", &rule.body, DESCRIPTION_MAX)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCommunity {
    pub name: String,
    #[serde(default)]
    pub privacy_type: PrivacyType,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
}

impl NewCommunity {
    pub fn validate(&self) -> Result<CommunityName, ValidationError> {
        limit_text("Category", &self.category, 50)?;
        limit_text("Description", &self.description, DESCRIPTION_MAX)?;
        CommunityName::parse(self.name.trim())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommunityUpdate {
    pub privacy_type: Option<PrivacyType>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub rules: Option<Vec<CommunityRule>>,
    pub contact: Option<ContactInfo>,
}

impl CommunityUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(category) = &self.category {
            limit_text("Category", category, 50)?;
        }
        if let Some(description) = &self.description {
            limit_text("Description", description, DESCRIPTION_MAX)?;
        }
        if let Some(rules) = &self.rules {
            validate_rules(rules)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub is_volunteer: bool,
    pub event: Option<VolunteerEvent>,
}

impl NewPost {
    /// Normalises the draft in place: trims the title, drops event data on
    /// non-volunteer posts.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.title = require_text("Title", &self.title, POST_TITLE_MAX)?;
        limit_text("Body", &self.body, POST_BODY_MAX)?;
        if self.image_urls.len() > IMAGES_PER_POST_MAX {
            return Err(ValidationError::TooManyImages);
        }
        if self.is_volunteer {
            let event = self.event.as_ref().ok_or(ValidationError::MissingEventDate)?;
            if matches!(event.volunteers_needed, Some(n) if n <= 0) {
                return Err(ValidationError::InvalidVolunteerCount);
            }
        } else {
            self.event = None;
        }
        Ok(self)
    }
}

pub fn validate_comment_text(text: &str) -> Result<String, ValidationError> {
    require_text("Comment", text, COMMENT_TEXT_MAX)
}

pub fn validate_display_name(name: &str) -> Result<String, ValidationError> {
    require_text("Display name", name, DISPLAY_NAME_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_community_name_rules() {
        assert!(CommunityName::parse("volunteers_ph").is_ok());
        assert!(CommunityName::parse("abc").is_ok());
        assert_eq!(
            CommunityName::parse("ab"),
            Err(ValidationError::CommunityNameLength)
        );
        assert_eq!(
            CommunityName::parse("a".repeat(22)),
            Err(ValidationError::CommunityNameLength)
        );
        assert_eq!(
            CommunityName::parse("food-bank"),
            Err(ValidationError::CommunityNameCharacters)
        );
        assert_eq!(
            CommunityName::parse("food bank"),
            Err(ValidationError::CommunityNameCharacters)
        );
    }

    #[test]
    fn test_community_name_deserialize_validates() {
        let ok: Result<CommunityName, _> = serde_json::from_str("\"tree_planting\"");
        assert!(ok.is_ok());
        let bad: Result<CommunityName, _> = serde_json::from_str("\"no!\"");
        assert!(bad.is_err());
    }

    fn draft(is_volunteer: bool, event: Option<VolunteerEvent>) -> NewPost {
        NewPost {
            title: "  Coastal cleanup  ".into(),
            body: "Bring gloves".into(),
            image_urls: vec![],
            is_volunteer,
            event,
        }
    }

    #[test]
    fn test_volunteer_post_needs_event() {
        assert_eq!(
            draft(true, None).validate().unwrap_err(),
            ValidationError::MissingEventDate
        );

        let event = VolunteerEvent {
            event_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            event_time: Some("08:00".into()),
            event_location: Some("Baywalk".into()),
            volunteers_needed: Some(0),
        };
        assert_eq!(
            draft(true, Some(event.clone())).validate().unwrap_err(),
            ValidationError::InvalidVolunteerCount
        );

        let post = draft(true, Some(VolunteerEvent { volunteers_needed: Some(20), ..event }))
            .validate()
            .unwrap();
        assert_eq!(post.title, "Coastal cleanup");
        assert!(post.event.is_some());
    }

    #[test]
    fn test_regular_post_drops_event() {
        let event = VolunteerEvent {
            event_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            event_time: None,
            event_location: None,
            volunteers_needed: None,
        };
        let post = draft(false, Some(event)).validate().unwrap();
        assert!(post.event.is_none());
    }

    #[test]
    fn test_text_limits() {
        assert_eq!(
            validate_comment_text("   "),
            Err(ValidationError::Empty { field: "Comment" })
        );
        assert!(validate_comment_text(&"x".repeat(COMMENT_TEXT_MAX)).is_ok());
        assert!(validate_comment_text(&"x".repeat(COMMENT_TEXT_MAX + 1)).is_err());

        let too_many = CommunityUpdate {
            rules: Some(vec![
                CommunityRule {
                    title: "Be kind".into(),
                    body: String::new()
                };
                RULES_MAX + 1
            ]),
            ..Default::default()
        };
        assert_eq!(too_many.validate(), Err(ValidationError::TooManyRules));
    }
}
