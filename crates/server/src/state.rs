use axum::extract::FromRef;
use domain::ActivityEvent;
use storage::Db;
use tokio::sync::broadcast;

use crate::auth::TokenService;
use crate::media::MediaStore;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub tx_activity: broadcast::Sender<ActivityEvent>,
    pub tokens: TokenService,
    pub media: MediaStore,
}

impl AppState {
    /// Fire-and-forget: nobody listening is not an error.
    pub fn publish(&self, event: ActivityEvent) {
        let kind = event.kind();
        if self.tx_activity.send(event).is_err() {
            tracing::debug!("No subscribers for {} event", kind);
        }
    }
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for MediaStore {
    fn from_ref(state: &AppState) -> Self {
        state.media.clone()
    }
}
