use domain::Community;
use storage::{Db, Membership};

use crate::error::{ApiError, ApiResult};

pub struct CommunityAccess {
    pub community: Community,
    pub membership: Membership,
}

impl CommunityAccess {
    pub async fn load(db: &Db, community_id: &str, viewer: Option<&str>) -> ApiResult<Self> {
        let community = db
            .get_community(community_id)
            .await?
            .ok_or(ApiError::NotFound("Community"))?;
        let membership = match viewer {
            Some(user_id) => db.membership(user_id, community_id).await?,
            None => Membership::default(),
        };
        Ok(Self {
            community,
            membership,
        })
    }

    pub fn can_view(&self) -> bool {
        self.community.privacy_type.visible_to_outsiders() || self.membership.is_member
    }

    pub fn ensure_can_view(&self) -> ApiResult<()> {
        if !self.can_view() {
            return Err(ApiError::forbidden(format!(
                "{} is private; join to see its posts",
                self.community.id
            )));
        }
        Ok(())
    }

    fn ensure_not_banned(&self) -> ApiResult<()> {
        if self.membership.is_banned {
            return Err(ApiError::forbidden(format!(
                "You are banned from {}",
                self.community.id
            )));
        }
        Ok(())
    }

    pub fn ensure_can_interact(&self) -> ApiResult<()> {
        self.ensure_can_view()?;
        self.ensure_not_banned()
    }

    pub fn ensure_can_post(&self) -> ApiResult<()> {
        self.ensure_not_banned()?;
        if !self.membership.is_member {
            return Err(ApiError::forbidden(format!(
                "Join {} before posting",
                self.community.id
            )));
        }
        Ok(())
    }

    pub fn ensure_can_join(&self) -> ApiResult<()> {
        self.ensure_not_banned()
    }

    pub fn ensure_moderator(&self) -> ApiResult<()> {
        if !self.membership.is_moderator {
            return Err(ApiError::forbidden("Only moderators can do that"));
        }
        Ok(())
    }

    pub fn is_creator(&self, user_id: &str) -> bool {
        self.community.creator_id == user_id
    }

    pub fn ensure_creator(&self, user_id: &str) -> ApiResult<()> {
        if !self.is_creator(user_id) {
            return Err(ApiError::forbidden("Only the community creator can do that"));
        }
        Ok(())
    }

    /// Authors delete their own content; moderators delete anything.
    pub fn ensure_can_delete(&self, author_id: &str, user_id: &str) -> ApiResult<()> {
        if author_id == user_id || self.membership.is_moderator {
            return Ok(());
        }
        Err(ApiError::forbidden("You can only delete your own content"))
    }
}
