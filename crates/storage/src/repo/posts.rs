use crate::{
    models::{SqlPost, SqlReport},
    new_id, now, Db,
};
use chrono::NaiveDate;
use domain::{NewPost, Post, PostReport, PostSort, UserProfile};

use super::is_unique_violation;

const POST_COLUMNS: &str = r#"
    p.id, p.community_id, p.creator_id, p.creator_display_name, p.title, p.body,
    p.image_urls, p.vote_status, p.number_of_comments, p.is_volunteer,
    p.event_date, p.event_time, p.event_location, p.volunteers_needed,
    p.created_at, p.edited_at
"#;

// Hidden posts never show up in the hider's listings. `?1` is the viewer id.
const NOT_HIDDEN: &str =
    "NOT EXISTS (SELECT 1 FROM hidden_posts h WHERE h.post_id = p.id AND h.user_id = ?1)";

fn order_by(sort: PostSort) -> &'static str {
    match sort {
        PostSort::New => "p.created_at DESC",
        PostSort::Top => "p.vote_status DESC, p.created_at DESC",
    }
}

impl Db {
    pub async fn create_post(
        &self,
        community_id: &str,
        author: &UserProfile,
        draft: &NewPost,
    ) -> anyhow::Result<Post> {
        let id = new_id();
        let created_at = now();
        let image_urls = serde_json::to_string(&draft.image_urls)?;
        let event = draft.event.as_ref();

        sqlx::query(
            r#"
            INSERT INTO posts (
                id, community_id, creator_id, creator_display_name, title, body,
                image_urls, is_volunteer, event_date, event_time, event_location,
                volunteers_needed, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(community_id)
        .bind(&author.id)
        .bind(&author.display_name)
        .bind(&draft.title)
        .bind(&draft.body)
        .bind(image_urls)
        .bind(draft.is_volunteer)
        .bind(event.map(|e| e.event_date))
        .bind(event.and_then(|e| e.event_time.as_deref()))
        .bind(event.and_then(|e| e.event_location.as_deref()))
        .bind(event.and_then(|e| e.volunteers_needed))
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(Post {
            id,
            community_id: community_id.to_string(),
            creator_id: author.id.clone(),
            creator_display_name: author.display_name.clone(),
            title: draft.title.clone(),
            body: draft.body.clone(),
            image_urls: draft.image_urls.clone(),
            vote_status: 0,
            number_of_comments: 0,
            is_volunteer: draft.is_volunteer,
            event: draft.event.clone(),
            created_at,
            edited_at: None,
        })
    }

    pub async fn get_post(&self, post_id: &str) -> anyhow::Result<Option<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = ?");
        let row = sqlx::query_as::<_, SqlPost>(&sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    pub async fn list_community_posts(
        &self,
        community_id: &str,
        viewer_id: Option<&str>,
        sort: PostSort,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Post>> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            WHERE p.community_id = ?2 AND {NOT_HIDDEN}
            ORDER BY {}
            LIMIT ?3 OFFSET ?4
            "#,
            order_by(sort)
        );
        let rows = sqlx::query_as::<_, SqlPost>(&sql)
            .bind(viewer_id.unwrap_or_default())
            .bind(community_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Posts from the viewer's communities. Viewers without memberships (or
    /// anonymous ones) get posts from every non-private community instead.
    pub async fn home_feed(
        &self,
        viewer_id: Option<&str>,
        sort: PostSort,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Post>> {
        let viewer = viewer_id.unwrap_or_default();
        let (memberships,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM community_snippets WHERE user_id = ?")
                .bind(viewer)
                .fetch_one(&self.pool)
                .await?;

        let scope = if memberships > 0 {
            "p.community_id IN (SELECT community_id FROM community_snippets WHERE user_id = ?1)"
        } else {
            "p.community_id IN (SELECT id FROM communities WHERE privacy_type != 'private')"
        };
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            WHERE {scope} AND {NOT_HIDDEN}
            ORDER BY {}
            LIMIT ?2 OFFSET ?3
            "#,
            order_by(sort)
        );
        let rows = sqlx::query_as::<_, SqlPost>(&sql)
            .bind(viewer)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Volunteer posts whose event is on or after `from`, soonest first.
    /// Private communities only contribute when the viewer is a member.
    pub async fn upcoming_events(
        &self,
        viewer_id: Option<&str>,
        community_id: Option<&str>,
        from: NaiveDate,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Post>> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            JOIN communities c ON c.id = p.community_id
            WHERE p.is_volunteer = TRUE
              AND p.event_date >= ?2
              AND (?3 IS NULL OR p.community_id = ?3)
              AND (
                c.privacy_type != 'private'
                OR EXISTS (
                    SELECT 1 FROM community_snippets s
                    WHERE s.community_id = p.community_id AND s.user_id = ?1
                )
              )
              AND {NOT_HIDDEN}
            ORDER BY p.event_date ASC, p.event_time ASC
            LIMIT ?4 OFFSET ?5
            "#
        );
        let rows = sqlx::query_as::<_, SqlPost>(&sql)
            .bind(viewer_id.unwrap_or_default())
            .bind(from)
            .bind(community_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn delete_post(&self, post_id: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    // --- saved / hidden ---

    pub async fn save_post(&self, user_id: &str, post_id: &str) -> anyhow::Result<bool> {
        self.flag_post("saved_posts", user_id, post_id).await
    }

    pub async fn unsave_post(&self, user_id: &str, post_id: &str) -> anyhow::Result<bool> {
        self.unflag_post("saved_posts", user_id, post_id).await
    }

    pub async fn hide_post(&self, user_id: &str, post_id: &str) -> anyhow::Result<bool> {
        self.flag_post("hidden_posts", user_id, post_id).await
    }

    pub async fn unhide_post(&self, user_id: &str, post_id: &str) -> anyhow::Result<bool> {
        self.unflag_post("hidden_posts", user_id, post_id).await
    }

    async fn flag_post(&self, table: &'static str, user_id: &str, post_id: &str) -> anyhow::Result<bool> {
        let sql = format!(
            "INSERT INTO {table} (user_id, post_id, created_at) VALUES (?, ?, ?) \
             ON CONFLICT(user_id, post_id) DO NOTHING"
        );
        let res = sqlx::query(&sql)
            .bind(user_id)
            .bind(post_id)
            .bind(now())
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn unflag_post(&self, table: &'static str, user_id: &str, post_id: &str) -> anyhow::Result<bool> {
        let sql = format!("DELETE FROM {table} WHERE user_id = ? AND post_id = ?");
        let res = sqlx::query(&sql)
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    /// Most recently saved first. Saves in private communities the user no
    /// longer belongs to are kept but not shown.
    pub async fn list_saved_posts(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Post>> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM saved_posts s
            JOIN posts p ON p.id = s.post_id
            JOIN communities c ON c.id = p.community_id
            WHERE s.user_id = ?1
              AND (
                c.privacy_type != 'private'
                OR EXISTS (
                    SELECT 1 FROM community_snippets m
                    WHERE m.community_id = p.community_id AND m.user_id = ?1
                )
              )
            ORDER BY s.created_at DESC
            LIMIT ?2 OFFSET ?3
            "#
        );
        let rows = sqlx::query_as::<_, SqlPost>(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    // --- reports ---

    /// Returns `None` when this user already reported the post.
    pub async fn report_post(
        &self,
        post: &Post,
        reporter_id: &str,
        reason: &str,
    ) -> anyhow::Result<Option<PostReport>> {
        let report = PostReport {
            id: new_id(),
            post_id: post.id.clone(),
            community_id: post.community_id.clone(),
            reporter_id: reporter_id.to_string(),
            reason: reason.to_string(),
            created_at: now(),
        };

        let res = sqlx::query(
            r#"
            INSERT INTO post_reports (id, post_id, community_id, reporter_id, reason, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&report.id)
        .bind(&report.post_id)
        .bind(&report.community_id)
        .bind(&report.reporter_id)
        .bind(&report.reason)
        .bind(report.created_at)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(Some(report)),
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_reports(&self, community_id: &str) -> anyhow::Result<Vec<PostReport>> {
        let rows = sqlx::query_as::<_, SqlReport>(
            r#"
            SELECT id, post_id, community_id, reporter_id, reason, created_at
            FROM post_reports
            WHERE community_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(community_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn dismiss_report(&self, community_id: &str, report_id: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM post_reports WHERE id = ? AND community_id = ?")
            .bind(report_id)
            .bind(community_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() == 1)
    }
}
