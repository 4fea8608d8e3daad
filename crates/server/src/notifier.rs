use domain::{notification_for, ActivityEvent};
use storage::Db;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Writes inbox entries for activity events until cancelled or the
/// channel closes.
pub async fn run(db: Db, mut rx: broadcast::Receiver<ActivityEvent>, cancel: CancellationToken) {
    info!("Notification worker started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Notification worker stopping");
                break;
            }
            msg = rx.recv() => match msg {
                Ok(event) => {
                    let Some(notification) = notification_for(&event) else {
                        continue;
                    };
                    match db.insert_notification(&notification).await {
                        Ok(stored) => debug!(
                            "Notified {} ({})",
                            stored.recipient_id, stored.kind
                        ),
                        Err(e) => error!("Failed to store notification: {:?}", e),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Notification worker lagged, {} events dropped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::{Comment, NotificationKind};

    #[tokio::test]
    async fn test_comment_event_lands_in_inbox() {
        let db = Db::new("sqlite::memory:").await.unwrap();
        let (tx, rx) = broadcast::channel(16);
        let worker = tokio::spawn(run(db.clone(), rx, CancellationToken::new()));

        let comment = Comment {
            id: "c1".into(),
            post_id: "p1".into(),
            community_id: "cleanup".into(),
            creator_id: "u-ana".into(),
            creator_display_name: "Ana".into(),
            text: "Count me in".into(),
            vote_status: 0,
            number_of_replies: 0,
            created_at: Utc::now().naive_utc(),
            edited_at: None,
        };
        tx.send(ActivityEvent::CommentCreated {
            community_id: "cleanup".into(),
            post_creator_id: "owner".into(),
            post_title: "Saturday".into(),
            comment,
        })
        .unwrap();
        tx.send(ActivityEvent::PostDeleted {
            community_id: "cleanup".into(),
            post_id: "p1".into(),
        })
        .unwrap();
        drop(tx);
        worker.await.unwrap();

        let inbox = db.list_notifications("owner", false, 10, 0).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::Comment);
        assert_eq!(inbox[0].actor_name, "Ana");
    }

    #[tokio::test]
    async fn test_stops_on_cancel() {
        let db = Db::new("sqlite::memory:").await.unwrap();
        let (_tx, rx) = broadcast::channel::<ActivityEvent>(4);
        let cancel = CancellationToken::new();
        let worker = tokio::spawn(run(db, rx, cancel.clone()));
        cancel.cancel();
        worker.await.unwrap();
    }
}
