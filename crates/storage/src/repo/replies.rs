use crate::{models::SqlReply, new_id, now, Db};
use domain::{Comment, Reply, UserProfile};

const REPLY_COLUMNS: &str = r#"
    id, comment_id, post_id, community_id, creator_id, creator_display_name,
    text, vote_status, created_at, edited_at
"#;

impl Db {
    pub async fn create_reply(
        &self,
        comment: &Comment,
        author: &UserProfile,
        text: &str,
    ) -> anyhow::Result<Reply> {
        let mut tx = self.pool.begin().await?;

        let reply = Reply {
            id: new_id(),
            comment_id: comment.id.clone(),
            post_id: comment.post_id.clone(),
            community_id: comment.community_id.clone(),
            creator_id: author.id.clone(),
            creator_display_name: author.display_name.clone(),
            text: text.to_string(),
            vote_status: 0,
            created_at: now(),
            edited_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO replies (
                id, comment_id, post_id, community_id, creator_id,
                creator_display_name, text, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&reply.id)
        .bind(&reply.comment_id)
        .bind(&reply.post_id)
        .bind(&reply.community_id)
        .bind(&reply.creator_id)
        .bind(&reply.creator_display_name)
        .bind(&reply.text)
        .bind(reply.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE comments SET number_of_replies = number_of_replies + 1 WHERE id = ?")
            .bind(&comment.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(reply)
    }

    pub async fn get_reply(&self, reply_id: &str) -> anyhow::Result<Option<Reply>> {
        let sql = format!("SELECT {REPLY_COLUMNS} FROM replies WHERE id = ?");
        let row = sqlx::query_as::<_, SqlReply>(&sql)
            .bind(reply_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    pub async fn list_replies(&self, comment_id: &str) -> anyhow::Result<Vec<Reply>> {
        let sql = format!(
            "SELECT {REPLY_COLUMNS} FROM replies WHERE comment_id = ? ORDER BY created_at ASC"
        );
        let rows = sqlx::query_as::<_, SqlReply>(&sql)
            .bind(comment_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn delete_reply(&self, reply_id: &str) -> anyhow::Result<Option<Reply>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("DELETE FROM replies WHERE id = ? RETURNING {REPLY_COLUMNS}");
        let Some(row) = sqlx::query_as::<_, SqlReply>(&sql)
            .bind(reply_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        sqlx::query(
            "UPDATE comments SET number_of_replies = MAX(number_of_replies - 1, 0) WHERE id = ?",
        )
        .bind(&row.comment_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(row.into()))
    }
}

#[cfg(test)]
mod tests {
    use crate::testing;

    #[tokio::test]
    async fn test_replies_thread_under_comment() {
        let db = testing::db().await;
        let owner = testing::user(&db, "owner").await;
        let ana = testing::user(&db, "ana").await;
        let community = testing::community(&db, &owner, "clinic_day").await;
        let post = testing::post(&db, &community, &owner, "Nurses needed").await;
        let comment = db.create_comment(&post, &ana, "I'm a nurse").await.unwrap();

        let r1 = db.create_reply(&comment, &owner, "Welcome!").await.unwrap();
        db.create_reply(&comment, &ana, "Thanks").await.unwrap();
        assert_eq!(r1.post_id, post.id);
        assert_eq!(r1.community_id, community.id);

        let replies = db.list_replies(&comment.id).await.unwrap();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].text, "Welcome!");
        let c = db.get_comment(&comment.id).await.unwrap().unwrap();
        assert_eq!(c.number_of_replies, 2);

        db.delete_reply(&r1.id).await.unwrap().unwrap();
        let c = db.get_comment(&comment.id).await.unwrap().unwrap();
        assert_eq!(c.number_of_replies, 1);

        // Deleting the parent comment takes the rest of the thread with it.
        db.delete_comment(&comment.id).await.unwrap();
        assert!(db.list_replies(&comment.id).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reply_deletes_count_once() {
        let db = testing::file_db().await;
        let owner = testing::user(&db, "owner").await;
        let community = testing::community(&db, &owner, "soup_kitchen").await;
        let post = testing::post(&db, &community, &owner, "Friday shift").await;
        let comment = db.create_comment(&post, &owner, "Who can cook?").await.unwrap();
        db.create_reply(&comment, &owner, "Me").await.unwrap();
        let target = db.create_reply(&comment, &owner, "Me too").await.unwrap();

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let db = db.clone();
                let id = target.id.clone();
                tokio::spawn(async move { db.delete_reply(&id).await })
            })
            .collect();

        let mut deleted = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_some() {
                deleted += 1;
            }
        }
        assert_eq!(deleted, 1);

        let c = db.get_comment(&comment.id).await.unwrap().unwrap();
        assert_eq!(c.number_of_replies, 1);
    }
}
