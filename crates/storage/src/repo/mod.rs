pub mod comments;
pub mod communities;
pub mod notifications;
pub mod posts;
pub mod replies;
pub mod snippets;
pub mod users;
pub mod votes;

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
