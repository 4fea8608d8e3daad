mod events;
mod models;
mod notifications;
pub mod validation;
mod votes;

pub use events::ActivityEvent;
pub use models::{
    BanSnippet, Comment, Community, CommunityRule, CommunitySnippet, ContactInfo,
    ModeratorSnippet, Post, PostReport, PostSort, PrivacyType, Reply, SponsorSnippet,
    UserProfile, VolunteerEvent,
};
pub use notifications::{notification_for, NewNotification, NotificationKind, UserNotification};
pub use validation::{CommunityName, CommunityUpdate, NewCommunity, NewPost, ValidationError};
pub use votes::{VoteDirection, VoteOutcome, VoteRecord, VoteResult, VoteTarget};
