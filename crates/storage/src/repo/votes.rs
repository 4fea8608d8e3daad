use crate::Db;
use domain::{VoteDirection, VoteOutcome, VoteRecord, VoteTarget};

struct VoteTable {
    content: &'static str,
    votes: &'static str,
    id_column: &'static str,
    /// Extra column stored on the vote row so a client can bulk-load votes:
    /// the community for post votes, the post for comment and reply votes.
    scope_column: &'static str,
    post_expr: &'static str,
}

fn table_for(target: VoteTarget) -> VoteTable {
    match target {
        VoteTarget::Post => VoteTable {
            content: "posts",
            votes: "post_votes",
            id_column: "post_id",
            scope_column: "community_id",
            post_expr: "id",
        },
        VoteTarget::Comment => VoteTable {
            content: "comments",
            votes: "comment_votes",
            id_column: "comment_id",
            scope_column: "post_id",
            post_expr: "post_id",
        },
        VoteTarget::Reply => VoteTable {
            content: "replies",
            votes: "reply_votes",
            id_column: "reply_id",
            scope_column: "post_id",
            post_expr: "post_id",
        },
    }
}

#[derive(Debug, Clone)]
pub struct VoteCastOutcome {
    pub outcome: VoteOutcome,
    pub vote_status: i64,
    pub creator_id: String,
    pub community_id: String,
    pub post_id: String,
}

impl Db {
    /// Reads the caller's current vote, applies the toggle rule, then writes
    /// the vote row and the tally in the same transaction.
    /// Returns `None` when the target does not exist.
    pub async fn cast_vote(
        &self,
        target: VoteTarget,
        target_id: &str,
        user_id: &str,
        direction: VoteDirection,
    ) -> anyhow::Result<Option<VoteCastOutcome>> {
        let t = table_for(target);
        let mut tx = self.pool.begin().await?;

        // A no-op write as the first statement takes SQLite's write lock up
        // front. Reading first would leave a deferred transaction that fails
        // with SQLITE_BUSY when it later tries to upgrade.
        let sql = format!("UPDATE {} SET vote_status = vote_status WHERE id = ?", t.content);
        let locked = sqlx::query(&sql).bind(target_id).execute(&mut *tx).await?;
        if locked.rows_affected() == 0 {
            return Ok(None);
        }

        let sql = format!(
            "SELECT creator_id, community_id, {} FROM {} WHERE id = ?",
            t.post_expr, t.content
        );
        let (creator_id, community_id, post_id): (String, String, String) = sqlx::query_as(&sql)
            .bind(target_id)
            .fetch_one(&mut *tx)
            .await?;

        let sql = format!(
            "SELECT vote_value FROM {} WHERE user_id = ? AND {} = ?",
            t.votes, t.id_column
        );
        let existing: Option<(i64,)> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(target_id)
            .fetch_optional(&mut *tx)
            .await?;

        let outcome = VoteOutcome::resolve(existing.map(|(v,)| v), direction);

        if outcome.new_value == 0 {
            let sql = format!("DELETE FROM {} WHERE user_id = ? AND {} = ?", t.votes, t.id_column);
            sqlx::query(&sql)
                .bind(user_id)
                .bind(target_id)
                .execute(&mut *tx)
                .await?;
        } else {
            let sql = format!(
                r#"
                INSERT INTO {votes} (user_id, {id}, {scope}, vote_value)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(user_id, {id}) DO UPDATE SET vote_value = excluded.vote_value
                "#,
                votes = t.votes,
                id = t.id_column,
                scope = t.scope_column,
            );
            let scope_value = match target {
                VoteTarget::Post => &community_id,
                VoteTarget::Comment | VoteTarget::Reply => &post_id,
            };
            sqlx::query(&sql)
                .bind(user_id)
                .bind(target_id)
                .bind(scope_value)
                .bind(outcome.new_value)
                .execute(&mut *tx)
                .await?;
        }

        let sql = format!(
            "UPDATE {} SET vote_status = vote_status + ? WHERE id = ? RETURNING vote_status",
            t.content
        );
        let (vote_status,): (i64,) = sqlx::query_as(&sql)
            .bind(outcome.delta)
            .bind(target_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(VoteCastOutcome {
            outcome,
            vote_status,
            creator_id,
            community_id,
            post_id,
        }))
    }

    pub async fn list_post_votes(
        &self,
        user_id: &str,
        community_id: &str,
    ) -> anyhow::Result<Vec<VoteRecord>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT post_id, vote_value FROM post_votes WHERE user_id = ? AND community_id = ?",
        )
        .bind(user_id)
        .bind(community_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(target_id, value)| VoteRecord {
                target: VoteTarget::Post,
                target_id,
                user_id: user_id.to_string(),
                value,
            })
            .collect())
    }

    pub async fn list_thread_votes(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> anyhow::Result<Vec<VoteRecord>> {
        let mut records = Vec::new();
        for target in [VoteTarget::Comment, VoteTarget::Reply] {
            let t = table_for(target);
            let sql = format!(
                "SELECT {}, vote_value FROM {} WHERE user_id = ? AND post_id = ?",
                t.id_column, t.votes
            );
            let rows: Vec<(String, i64)> = sqlx::query_as(&sql)
                .bind(user_id)
                .bind(post_id)
                .fetch_all(&self.pool)
                .await?;
            records.extend(rows.into_iter().map(|(target_id, value)| VoteRecord {
                target,
                target_id,
                user_id: user_id.to_string(),
                value,
            }));
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn test_post_vote_toggle_and_flip() {
        let db = testing::db().await;
        let owner = testing::user(&db, "owner").await;
        let ana = testing::user(&db, "ana").await;
        let ben = testing::user(&db, "ben").await;
        let community = testing::community(&db, &owner, "tutoring").await;
        let post = testing::post(&db, &community, &owner, "Math tutors").await;

        let v = db.cast_vote(VoteTarget::Post, &post.id, &ana.id, VoteDirection::Up).await.unwrap().unwrap();
        assert_eq!((v.outcome.new_value, v.vote_status), (1, 1));
        assert_eq!(v.creator_id, owner.id);
        assert_eq!(v.post_id, post.id);

        let v = db.cast_vote(VoteTarget::Post, &post.id, &ben.id, VoteDirection::Up).await.unwrap().unwrap();
        assert_eq!(v.vote_status, 2);

        // Ana flips to down: -2.
        let v = db.cast_vote(VoteTarget::Post, &post.id, &ana.id, VoteDirection::Down).await.unwrap().unwrap();
        assert_eq!((v.outcome.new_value, v.outcome.delta, v.vote_status), (-1, -2, 0));

        // Ben clicks up again: cleared.
        let v = db.cast_vote(VoteTarget::Post, &post.id, &ben.id, VoteDirection::Up).await.unwrap().unwrap();
        assert_eq!((v.outcome.new_value, v.vote_status), (0, -1));

        let ana_votes = db.list_post_votes(&ana.id, &community.id).await.unwrap();
        assert_eq!(ana_votes.len(), 1);
        assert_eq!(ana_votes[0].value, -1);
        assert!(db.list_post_votes(&ben.id, &community.id).await.unwrap().is_empty());

        let stored = db.get_post(&post.id).await.unwrap().unwrap();
        assert_eq!(stored.vote_status, -1);
    }

    #[tokio::test]
    async fn test_comment_and_reply_votes() {
        let db = testing::db().await;
        let owner = testing::user(&db, "owner").await;
        let ana = testing::user(&db, "ana").await;
        let community = testing::community(&db, &owner, "animal_shelter").await;
        let post = testing::post(&db, &community, &owner, "Dog walkers").await;
        let comment = db.create_comment(&post, &ana, "Me!").await.unwrap();
        let reply = db.create_reply(&comment, &owner, "Great").await.unwrap();

        let v = db.cast_vote(VoteTarget::Comment, &comment.id, &owner.id, VoteDirection::Up).await.unwrap().unwrap();
        assert_eq!(v.vote_status, 1);
        assert_eq!(v.creator_id, ana.id);
        assert_eq!(v.post_id, post.id);

        let v = db.cast_vote(VoteTarget::Reply, &reply.id, &owner.id, VoteDirection::Down).await.unwrap().unwrap();
        assert_eq!(v.vote_status, -1);

        let votes = db.list_thread_votes(&owner.id, &post.id).await.unwrap();
        assert_eq!(votes.len(), 2);
        assert!(votes.iter().any(|r| r.target == VoteTarget::Comment && r.value == 1));
        assert!(votes.iter().any(|r| r.target == VoteTarget::Reply && r.value == -1));

        assert_eq!(
            db.get_comment(&comment.id).await.unwrap().unwrap().vote_status,
            1
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_votes_all_land() {
        let db = testing::file_db().await;
        let owner = testing::user(&db, "owner").await;
        let community = testing::community(&db, &owner, "food_bank").await;
        let post = testing::post(&db, &community, &owner, "Sorting shift").await;

        let mut voters = Vec::new();
        for i in 0..30 {
            voters.push(testing::user(&db, &format!("voter{}", i)).await);
        }

        let handles: Vec<_> = voters
            .into_iter()
            .map(|voter| {
                let db = db.clone();
                let post_id = post.id.clone();
                tokio::spawn(async move {
                    db.cast_vote(VoteTarget::Post, &post_id, &voter.id, VoteDirection::Up)
                        .await
                })
            })
            .collect();

        for handle in handles {
            let cast = handle.await.unwrap().unwrap().unwrap();
            assert_eq!(cast.outcome.new_value, 1);
        }

        let stored = db.get_post(&post.id).await.unwrap().unwrap();
        assert_eq!(stored.vote_status, 30);
    }

    #[tokio::test]
    async fn test_vote_on_missing_target() {
        let db = testing::db().await;
        let ana = testing::user(&db, "ana").await;
        let res = db
            .cast_vote(VoteTarget::Reply, "nope", &ana.id, VoteDirection::Up)
            .await
            .unwrap();
        assert!(res.is_none());
    }
}
