use crate::{models::SqlUser, new_id, now, Db};
use domain::UserProfile;

use super::is_unique_violation;

const USER_COLUMNS: &str = "id, email, display_name, photo_url, bio, created_at";

impl Db {
    /// Returns `None` when the email is already registered.
    pub async fn create_user(
        &self,
        email: &str,
        display_name: &str,
        token_hash: &str,
    ) -> anyhow::Result<Option<UserProfile>> {
        let id = new_id();
        let created_at = now();

        let res = sqlx::query(
            r#"
            INSERT INTO users (id, email, display_name, token_hash, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(email)
        .bind(display_name)
        .bind(token_hash)
        .bind(created_at)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(Some(UserProfile {
                id,
                email: email.to_string(),
                display_name: display_name.to_string(),
                photo_url: None,
                bio: None,
                created_at,
            })),
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_user(&self, user_id: &str) -> anyhow::Result<Option<UserProfile>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let row = sqlx::query_as::<_, SqlUser>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    pub async fn find_user_by_token(&self, token_hash: &str) -> anyhow::Result<Option<UserProfile>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE token_hash = ?");
        let row = sqlx::query_as::<_, SqlUser>(&sql)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    pub async fn rotate_token(&self, user_id: &str, token_hash: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE users SET token_hash = ?, updated_at = ? WHERE id = ?")
            .bind(token_hash)
            .bind(now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        display_name: Option<&str>,
        photo_url: Option<&str>,
        bio: Option<&str>,
    ) -> anyhow::Result<Option<UserProfile>> {
        sqlx::query(
            r#"
            UPDATE users SET
                display_name = COALESCE(?, display_name),
                photo_url = COALESCE(?, photo_url),
                bio = COALESCE(?, bio),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(display_name)
        .bind(photo_url)
        .bind(bio)
        .bind(now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        self.get_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use crate::testing;

    #[tokio::test]
    async fn test_register_and_lookup() {
        let db = testing::db().await;
        let user = db
            .create_user("ana@example.org", "Ana", "digest-1")
            .await
            .unwrap()
            .unwrap();

        let by_token = db.find_user_by_token("digest-1").await.unwrap().unwrap();
        assert_eq!(by_token.id, user.id);
        assert!(db.find_user_by_token("digest-2").await.unwrap().is_none());

        let dup = db.create_user("ana@example.org", "Ana 2", "digest-3").await.unwrap();
        assert!(dup.is_none());
    }

    #[tokio::test]
    async fn test_profile_edit_keeps_unset_fields() {
        let db = testing::db().await;
        let user = testing::user(&db, "ben").await;

        db.update_profile(&user.id, None, Some("/media/abc.png"), Some("Tree planter"))
            .await
            .unwrap();
        let updated = db
            .update_profile(&user.id, Some("Benedict"), None, None)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.display_name, "Benedict");
        assert_eq!(updated.photo_url.as_deref(), Some("/media/abc.png"));
        assert_eq!(updated.bio.as_deref(), Some("Tree planter"));
    }

    #[tokio::test]
    async fn test_rotate_token() {
        let db = testing::db().await;
        let user = testing::user(&db, "cai").await;
        assert!(db.rotate_token(&user.id, "fresh").await.unwrap());
        assert!(db.find_user_by_token("hash-cai").await.unwrap().is_none());
        assert!(db.find_user_by_token("fresh").await.unwrap().is_some());
    }
}
