use crate::{models::SqlComment, new_id, now, Db};
use domain::{Comment, Post, UserProfile};

const COMMENT_COLUMNS: &str = r#"
    id, post_id, community_id, creator_id, creator_display_name, text,
    vote_status, number_of_replies, created_at, edited_at
"#;

impl Db {
    pub async fn create_comment(
        &self,
        post: &Post,
        author: &UserProfile,
        text: &str,
    ) -> anyhow::Result<Comment> {
        let mut tx = self.pool.begin().await?;

        let comment = Comment {
            id: new_id(),
            post_id: post.id.clone(),
            community_id: post.community_id.clone(),
            creator_id: author.id.clone(),
            creator_display_name: author.display_name.clone(),
            text: text.to_string(),
            vote_status: 0,
            number_of_replies: 0,
            created_at: now(),
            edited_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO comments (
                id, post_id, community_id, creator_id, creator_display_name,
                text, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.post_id)
        .bind(&comment.community_id)
        .bind(&comment.creator_id)
        .bind(&comment.creator_display_name)
        .bind(&comment.text)
        .bind(comment.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE posts SET number_of_comments = number_of_comments + 1 WHERE id = ?")
            .bind(&post.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(comment)
    }

    pub async fn get_comment(&self, comment_id: &str) -> anyhow::Result<Option<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?");
        let row = sqlx::query_as::<_, SqlComment>(&sql)
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    pub async fn list_comments(
        &self,
        post_id: &str,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<(Vec<Comment>, i64)> {
        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE post_id = ?
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#
        );
        let rows = sqlx::query_as::<_, SqlComment>(&sql)
            .bind(post_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows.into_iter().map(Into::into).collect(), count))
    }

    /// Removes the comment with its replies and votes; returns what was deleted.
    pub async fn delete_comment(&self, comment_id: &str) -> anyhow::Result<Option<Comment>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("DELETE FROM comments WHERE id = ? RETURNING {COMMENT_COLUMNS}");
        let Some(row) = sqlx::query_as::<_, SqlComment>(&sql)
            .bind(comment_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        sqlx::query(
            "UPDATE posts SET number_of_comments = MAX(number_of_comments - 1, 0) WHERE id = ?",
        )
        .bind(&row.post_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(row.into()))
    }
}
