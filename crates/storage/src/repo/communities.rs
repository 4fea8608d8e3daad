use crate::{models::SqlCommunity, now, Db};
use domain::{Community, CommunityName, CommunityUpdate, ContactInfo, NewCommunity};

use super::is_unique_violation;

const COMMUNITY_COLUMNS: &str = r#"
    id, creator_id, privacy_type, category, description, image_url, rules,
    number_of_members, contact_email, contact_phone, contact_website, created_at
"#;

#[derive(Debug)]
pub enum CreateCommunityOutcome {
    Created(Community),
    NameTaken,
}

impl Db {
    /// Creates the community and makes the creator its first member and
    /// moderator, all in one transaction.
    pub async fn create_community(
        &self,
        name: &CommunityName,
        creator_id: &str,
        draft: &NewCommunity,
    ) -> anyhow::Result<CreateCommunityOutcome> {
        let mut tx = self.pool.begin().await?;
        let created_at = now();

        // Insert first: the primary key decides the race, and the write lock is
        // held before anything else runs.
        let inserted = sqlx::query(
            r#"
            INSERT INTO communities (
                id, creator_id, privacy_type, category, description,
                rules, number_of_members, created_at
            )
            VALUES (?, ?, ?, ?, ?, '[]', 1, ?)
            "#,
        )
        .bind(name.as_str())
        .bind(creator_id)
        .bind(draft.privacy_type.as_str())
        .bind(draft.category.trim())
        .bind(draft.description.trim())
        .bind(created_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Ok(CreateCommunityOutcome::NameTaken),
            Err(e) => return Err(e.into()),
        }

        sqlx::query(
            r#"
            INSERT INTO community_snippets (user_id, community_id, is_moderator, joined_at)
            VALUES (?, ?, TRUE, ?)
            "#,
        )
        .bind(creator_id)
        .bind(name.as_str())
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO moderator_snippets (user_id, community_id, added_by, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(creator_id)
        .bind(name.as_str())
        .bind(creator_id)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CreateCommunityOutcome::Created(Community {
            id: name.to_string(),
            creator_id: creator_id.to_string(),
            privacy_type: draft.privacy_type,
            category: draft.category.trim().to_string(),
            description: draft.description.trim().to_string(),
            image_url: None,
            rules: Vec::new(),
            number_of_members: 1,
            contact: ContactInfo::default(),
            created_at,
        }))
    }

    pub async fn get_community(&self, community_id: &str) -> anyhow::Result<Option<Community>> {
        let sql = format!("SELECT {COMMUNITY_COLUMNS} FROM communities WHERE id = ?");
        let row = sqlx::query_as::<_, SqlCommunity>(&sql)
            .bind(community_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    pub async fn list_communities(
        &self,
        category: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<(Vec<Community>, i64)> {
        let sql = format!(
            r#"
            SELECT {COMMUNITY_COLUMNS}
            FROM communities
            WHERE (?1 IS NULL OR category = ?1)
            ORDER BY number_of_members DESC, created_at ASC
            LIMIT ?2 OFFSET ?3
            "#
        );
        let rows = sqlx::query_as::<_, SqlCommunity>(&sql)
            .bind(category)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM communities WHERE (?1 IS NULL OR category = ?1)")
                .bind(category)
                .fetch_one(&self.pool)
                .await?;

        Ok((rows.into_iter().map(Into::into).collect(), count))
    }

    pub async fn update_community(
        &self,
        community_id: &str,
        update: &CommunityUpdate,
    ) -> anyhow::Result<Option<Community>> {
        let rules_json = update
            .rules
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let contact = update.contact.as_ref();

        let res = sqlx::query(
            r#"
            UPDATE communities SET
                privacy_type = COALESCE(?, privacy_type),
                category = COALESCE(?, category),
                description = COALESCE(?, description),
                image_url = COALESCE(?, image_url),
                rules = COALESCE(?, rules),
                contact_email = CASE WHEN ? THEN ? ELSE contact_email END,
                contact_phone = CASE WHEN ? THEN ? ELSE contact_phone END,
                contact_website = CASE WHEN ? THEN ? ELSE contact_website END
            WHERE id = ?
            "#,
        )
        .bind(update.privacy_type.map(|p| p.as_str()))
        .bind(update.category.as_deref().map(str::trim))
        .bind(update.description.as_deref().map(str::trim))
        .bind(update.image_url.as_deref())
        .bind(rules_json)
        .bind(contact.is_some())
        .bind(contact.and_then(|c| c.email.as_deref()))
        .bind(contact.is_some())
        .bind(contact.and_then(|c| c.phone.as_deref()))
        .bind(contact.is_some())
        .bind(contact.and_then(|c| c.website.as_deref()))
        .bind(community_id)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_community(community_id).await
    }

    pub async fn delete_community(&self, community_id: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM communities WHERE id = ?")
            .bind(community_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() == 1)
    }
}
