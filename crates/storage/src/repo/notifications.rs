use crate::{models::SqlNotification, new_id, now, Db};
use domain::{NewNotification, UserNotification};

impl Db {
    pub async fn insert_notification(&self, n: &NewNotification) -> anyhow::Result<UserNotification> {
        let stored = UserNotification {
            id: new_id(),
            recipient_id: n.recipient_id.clone(),
            kind: n.kind,
            actor_id: n.actor_id.clone(),
            actor_name: n.actor_name.clone(),
            community_id: n.community_id.clone(),
            post_id: n.post_id.clone(),
            comment_id: n.comment_id.clone(),
            message: n.message.clone(),
            is_read: false,
            created_at: now(),
        };

        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, recipient_id, kind, actor_id, actor_name, community_id,
                post_id, comment_id, message, is_read, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, FALSE, ?)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.recipient_id)
        .bind(stored.kind.as_str())
        .bind(&stored.actor_id)
        .bind(&stored.actor_name)
        .bind(&stored.community_id)
        .bind(&stored.post_id)
        .bind(&stored.comment_id)
        .bind(&stored.message)
        .bind(stored.created_at)
        .execute(&self.pool)
        .await?;

        Ok(stored)
    }

    pub async fn list_notifications(
        &self,
        recipient_id: &str,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<UserNotification>> {
        let rows = sqlx::query_as::<_, SqlNotification>(
            r#"
            SELECT id, recipient_id, kind, actor_id, actor_name, community_id,
                   post_id, comment_id, message, is_read, created_at
            FROM notifications
            WHERE recipient_id = ? AND (? = FALSE OR is_read = FALSE)
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(recipient_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(SqlNotification::into_domain).collect())
    }

    pub async fn unread_notification_count(&self, recipient_id: &str) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ? AND is_read = FALSE",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn mark_notification_read(
        &self,
        recipient_id: &str,
        notification_id: &str,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE id = ? AND recipient_id = ?",
        )
        .bind(notification_id)
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    pub async fn mark_all_notifications_read(&self, recipient_id: &str) -> anyhow::Result<u64> {
        let res = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE recipient_id = ? AND is_read = FALSE",
        )
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use crate::testing;
    use domain::{NewNotification, NotificationKind};

    fn upvote_for(recipient: &str) -> NewNotification {
        NewNotification {
            recipient_id: recipient.into(),
            kind: NotificationKind::Upvote,
            actor_id: "someone".into(),
            actor_name: "Someone".into(),
            community_id: "cleanup".into(),
            post_id: Some("p1".into()),
            comment_id: None,
            message: "Someone upvoted your post".into(),
        }
    }

    #[tokio::test]
    async fn test_inbox_read_state() {
        let db = testing::db().await;
        let first = db.insert_notification(&upvote_for("ana")).await.unwrap();
        db.insert_notification(&upvote_for("ana")).await.unwrap();
        db.insert_notification(&upvote_for("ben")).await.unwrap();

        assert_eq!(db.unread_notification_count("ana").await.unwrap(), 2);
        assert!(db.mark_notification_read("ana", &first.id).await.unwrap());
        // Someone else's notification cannot be touched.
        assert!(!db.mark_notification_read("ben", &first.id).await.unwrap());

        let unread = db.list_notifications("ana", true, 10, 0).await.unwrap();
        assert_eq!(unread.len(), 1);
        let all = db.list_notifications("ana", false, 10, 0).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].kind, NotificationKind::Upvote);

        assert_eq!(db.mark_all_notifications_read("ana").await.unwrap(), 1);
        assert_eq!(db.unread_notification_count("ana").await.unwrap(), 0);
        assert_eq!(db.unread_notification_count("ben").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unread_filter_and_mark_all() {
        let db = testing::db().await;
        let mut ids = Vec::new();
        for _ in 0..4 {
            ids.push(db.insert_notification(&upvote_for("ana")).await.unwrap().id);
        }
        db.mark_notification_read("ana", &ids[1]).await.unwrap();

        let unread = db.list_notifications("ana", true, 10, 0).await.unwrap();
        assert_eq!(unread.len(), 3);
        assert!(unread.iter().all(|n| !n.is_read && n.id != ids[1]));
        let paged = db.list_notifications("ana", true, 2, 2).await.unwrap();
        assert_eq!(paged.len(), 1);

        assert_eq!(db.mark_all_notifications_read("ana").await.unwrap(), 3);
        assert!(db.list_notifications("ana", true, 10, 0).await.unwrap().is_empty());
        assert_eq!(db.list_notifications("ana", false, 10, 0).await.unwrap().len(), 4);
        // Nothing left to update.
        assert_eq!(db.mark_all_notifications_read("ana").await.unwrap(), 0);
    }
}
