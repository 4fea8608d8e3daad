use crate::{
    models::{SqlBanSnippet, SqlCommunitySnippet, SqlModeratorSnippet, SqlSponsorSnippet},
    now, Db,
};
use domain::{BanSnippet, CommunitySnippet, ModeratorSnippet, SponsorSnippet};
use serde::Serialize;
use sqlx::{Sqlite, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Changed,
    Unchanged,
}

impl MembershipChange {
    fn from_rows(rows: u64) -> Self {
        if rows > 0 {
            MembershipChange::Changed
        } else {
            MembershipChange::Unchanged
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self, MembershipChange::Changed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Membership {
    pub is_member: bool,
    pub is_moderator: bool,
    pub is_banned: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserSnippets {
    pub communities: Vec<CommunitySnippet>,
    pub moderating: Vec<ModeratorSnippet>,
    pub sponsoring: Vec<SponsorSnippet>,
    pub bans: Vec<BanSnippet>,
}

async fn remove_member(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: &str,
    community_id: &str,
) -> anyhow::Result<u64> {
    let res = sqlx::query("DELETE FROM community_snippets WHERE user_id = ? AND community_id = ?")
        .bind(user_id)
        .bind(community_id)
        .execute(&mut **tx)
        .await?;

    if res.rows_affected() > 0 {
        sqlx::query(
            "UPDATE communities SET number_of_members = MAX(number_of_members - 1, 0) WHERE id = ?",
        )
        .bind(community_id)
        .execute(&mut **tx)
        .await?;
    }

    // Leaving also gives up the moderator seat.
    sqlx::query("DELETE FROM moderator_snippets WHERE user_id = ? AND community_id = ?")
        .bind(user_id)
        .bind(community_id)
        .execute(&mut **tx)
        .await?;

    Ok(res.rows_affected())
}

impl Db {
    pub async fn join_community(
        &self,
        user_id: &str,
        community_id: &str,
    ) -> anyhow::Result<MembershipChange> {
        let mut tx = self.pool.begin().await?;

        let res = sqlx::query(
            r#"
            INSERT INTO community_snippets (user_id, community_id, is_moderator, joined_at)
            VALUES (?, ?, FALSE, ?)
            ON CONFLICT(user_id, community_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(community_id)
        .bind(now())
        .execute(&mut *tx)
        .await?;

        if res.rows_affected() > 0 {
            sqlx::query("UPDATE communities SET number_of_members = number_of_members + 1 WHERE id = ?")
                .bind(community_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(MembershipChange::from_rows(res.rows_affected()))
    }

    pub async fn leave_community(
        &self,
        user_id: &str,
        community_id: &str,
    ) -> anyhow::Result<MembershipChange> {
        let mut tx = self.pool.begin().await?;
        let removed = remove_member(&mut tx, user_id, community_id).await?;
        tx.commit().await?;
        Ok(MembershipChange::from_rows(removed))
    }

    pub async fn membership(&self, user_id: &str, community_id: &str) -> anyhow::Result<Membership> {
        let (is_member, is_moderator, is_banned): (bool, bool, bool) = sqlx::query_as(
            r#"
            SELECT
                EXISTS(SELECT 1 FROM community_snippets WHERE user_id = ?1 AND community_id = ?2),
                EXISTS(SELECT 1 FROM moderator_snippets WHERE user_id = ?1 AND community_id = ?2),
                EXISTS(SELECT 1 FROM ban_snippets WHERE user_id = ?1 AND community_id = ?2)
            "#,
        )
        .bind(user_id)
        .bind(community_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Membership {
            is_member,
            is_moderator,
            is_banned,
        })
    }

    pub async fn user_snippets(&self, user_id: &str) -> anyhow::Result<UserSnippets> {
        let communities = sqlx::query_as::<_, SqlCommunitySnippet>(
            r#"
            SELECT s.community_id, s.is_moderator, c.image_url, s.joined_at
            FROM community_snippets s
            JOIN communities c ON c.id = s.community_id
            WHERE s.user_id = ?
            ORDER BY s.joined_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let moderating = sqlx::query_as::<_, SqlModeratorSnippet>(
            "SELECT community_id, user_id, added_by, created_at FROM moderator_snippets WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let sponsoring = sqlx::query_as::<_, SqlSponsorSnippet>(
            "SELECT community_id, user_id, created_at FROM sponsor_snippets WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let bans = sqlx::query_as::<_, SqlBanSnippet>(
            "SELECT community_id, user_id, banned_by, reason, created_at FROM ban_snippets WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(UserSnippets {
            communities: communities.into_iter().map(Into::into).collect(),
            moderating: moderating.into_iter().map(Into::into).collect(),
            sponsoring: sponsoring.into_iter().map(Into::into).collect(),
            bans: bans.into_iter().map(Into::into).collect(),
        })
    }

    // --- moderators ---

    /// The target must already be a member; non-members are left unchanged.
    pub async fn add_moderator(
        &self,
        community_id: &str,
        user_id: &str,
        added_by: &str,
    ) -> anyhow::Result<MembershipChange> {
        let mut tx = self.pool.begin().await?;

        let flagged = sqlx::query(
            "UPDATE community_snippets SET is_moderator = TRUE WHERE user_id = ? AND community_id = ?",
        )
        .bind(user_id)
        .bind(community_id)
        .execute(&mut *tx)
        .await?;
        if flagged.rows_affected() == 0 {
            return Ok(MembershipChange::Unchanged);
        }

        let res = sqlx::query(
            r#"
            INSERT INTO moderator_snippets (user_id, community_id, added_by, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, community_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(community_id)
        .bind(added_by)
        .bind(now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(MembershipChange::from_rows(res.rows_affected()))
    }

    pub async fn remove_moderator(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> anyhow::Result<MembershipChange> {
        let mut tx = self.pool.begin().await?;

        let res = sqlx::query("DELETE FROM moderator_snippets WHERE user_id = ? AND community_id = ?")
            .bind(user_id)
            .bind(community_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "UPDATE community_snippets SET is_moderator = FALSE WHERE user_id = ? AND community_id = ?",
        )
        .bind(user_id)
        .bind(community_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(MembershipChange::from_rows(res.rows_affected()))
    }

    pub async fn list_moderators(&self, community_id: &str) -> anyhow::Result<Vec<ModeratorSnippet>> {
        let rows = sqlx::query_as::<_, SqlModeratorSnippet>(
            r#"
            SELECT community_id, user_id, added_by, created_at
            FROM moderator_snippets WHERE community_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(community_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    // --- sponsors ---

    pub async fn join_sponsors(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> anyhow::Result<MembershipChange> {
        let res = sqlx::query(
            r#"
            INSERT INTO sponsor_snippets (user_id, community_id, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id, community_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(community_id)
        .bind(now())
        .execute(&self.pool)
        .await?;
        Ok(MembershipChange::from_rows(res.rows_affected()))
    }

    pub async fn leave_sponsors(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> anyhow::Result<MembershipChange> {
        let res = sqlx::query("DELETE FROM sponsor_snippets WHERE user_id = ? AND community_id = ?")
            .bind(user_id)
            .bind(community_id)
            .execute(&self.pool)
            .await?;
        Ok(MembershipChange::from_rows(res.rows_affected()))
    }

    pub async fn list_sponsors(&self, community_id: &str) -> anyhow::Result<Vec<SponsorSnippet>> {
        let rows = sqlx::query_as::<_, SqlSponsorSnippet>(
            r#"
            SELECT community_id, user_id, created_at
            FROM sponsor_snippets WHERE community_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(community_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    // --- bans ---

    /// Banning also removes membership, moderator seat and sponsorship.
    pub async fn ban_user(
        &self,
        community_id: &str,
        user_id: &str,
        banned_by: &str,
        reason: Option<&str>,
    ) -> anyhow::Result<MembershipChange> {
        let mut tx = self.pool.begin().await?;

        let res = sqlx::query(
            r#"
            INSERT INTO ban_snippets (user_id, community_id, banned_by, reason, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id, community_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(community_id)
        .bind(banned_by)
        .bind(reason)
        .bind(now())
        .execute(&mut *tx)
        .await?;

        if res.rows_affected() > 0 {
            remove_member(&mut tx, user_id, community_id).await?;
            sqlx::query("DELETE FROM sponsor_snippets WHERE user_id = ? AND community_id = ?")
                .bind(user_id)
                .bind(community_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(MembershipChange::from_rows(res.rows_affected()))
    }

    pub async fn unban_user(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> anyhow::Result<MembershipChange> {
        let res = sqlx::query("DELETE FROM ban_snippets WHERE user_id = ? AND community_id = ?")
            .bind(user_id)
            .bind(community_id)
            .execute(&self.pool)
            .await?;
        Ok(MembershipChange::from_rows(res.rows_affected()))
    }

    pub async fn list_bans(&self, community_id: &str) -> anyhow::Result<Vec<BanSnippet>> {
        let rows = sqlx::query_as::<_, SqlBanSnippet>(
            r#"
            SELECT community_id, user_id, banned_by, reason, created_at
            FROM ban_snippets WHERE community_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(community_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn test_join_leave_keeps_counter_in_sync() {
        let db = testing::db().await;
        let owner = testing::user(&db, "owner").await;
        let ana = testing::user(&db, "ana").await;
        testing::community(&db, &owner, "tree_planting").await;

        assert!(db.join_community(&ana.id, "tree_planting").await.unwrap().changed());
        assert!(!db.join_community(&ana.id, "tree_planting").await.unwrap().changed());
        let c = db.get_community("tree_planting").await.unwrap().unwrap();
        assert_eq!(c.number_of_members, 2);

        assert!(db.leave_community(&ana.id, "tree_planting").await.unwrap().changed());
        assert!(!db.leave_community(&ana.id, "tree_planting").await.unwrap().changed());
        let c = db.get_community("tree_planting").await.unwrap().unwrap();
        assert_eq!(c.number_of_members, 1);
    }

    #[tokio::test]
    async fn test_moderators_must_be_members() {
        let db = testing::db().await;
        let owner = testing::user(&db, "owner").await;
        let ana = testing::user(&db, "ana").await;
        testing::community(&db, &owner, "food_bank").await;

        let change = db.add_moderator("food_bank", &ana.id, &owner.id).await.unwrap();
        assert_eq!(change, MembershipChange::Unchanged);

        db.join_community(&ana.id, "food_bank").await.unwrap();
        assert!(db.add_moderator("food_bank", &ana.id, &owner.id).await.unwrap().changed());
        assert!(db.membership(&ana.id, "food_bank").await.unwrap().is_moderator);
        assert_eq!(db.list_moderators("food_bank").await.unwrap().len(), 2);

        let snippets = db.user_snippets(&ana.id).await.unwrap();
        assert!(snippets.communities[0].is_moderator);

        assert!(db.remove_moderator("food_bank", &ana.id).await.unwrap().changed());
        let m = db.membership(&ana.id, "food_bank").await.unwrap();
        assert!(m.is_member && !m.is_moderator);
    }

    #[tokio::test]
    async fn test_ban_removes_membership() {
        let db = testing::db().await;
        let owner = testing::user(&db, "owner").await;
        let troll = testing::user(&db, "troll").await;
        testing::community(&db, &owner, "blood_drive").await;
        db.join_community(&troll.id, "blood_drive").await.unwrap();
        db.join_sponsors("blood_drive", &troll.id).await.unwrap();

        assert!(db
            .ban_user("blood_drive", &troll.id, &owner.id, Some("spam"))
            .await
            .unwrap()
            .changed());

        let m = db.membership(&troll.id, "blood_drive").await.unwrap();
        assert_eq!(
            m,
            Membership {
                is_member: false,
                is_moderator: false,
                is_banned: true
            }
        );
        let c = db.get_community("blood_drive").await.unwrap().unwrap();
        assert_eq!(c.number_of_members, 1);
        assert!(db.list_sponsors("blood_drive").await.unwrap().is_empty());
        assert_eq!(db.list_bans("blood_drive").await.unwrap()[0].reason.as_deref(), Some("spam"));

        assert!(db.unban_user("blood_drive", &troll.id).await.unwrap().changed());
        assert!(!db.membership(&troll.id, "blood_drive").await.unwrap().is_banned);
    }

    #[tokio::test]
    async fn test_sponsor_toggle() {
        let db = testing::db().await;
        let owner = testing::user(&db, "owner").await;
        let acme = testing::user(&db, "acme").await;
        testing::community(&db, &owner, "school_supplies").await;

        assert!(db.join_sponsors("school_supplies", &acme.id).await.unwrap().changed());
        assert!(!db.join_sponsors("school_supplies", &acme.id).await.unwrap().changed());
        assert_eq!(db.user_snippets(&acme.id).await.unwrap().sponsoring.len(), 1);
        assert!(db.leave_sponsors("school_supplies", &acme.id).await.unwrap().changed());
        assert!(db.list_sponsors("school_supplies").await.unwrap().is_empty());
    }
}
