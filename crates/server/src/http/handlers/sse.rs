use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use domain::{ActivityEvent, VoteTarget};
use futures::stream::Stream;
use serde::Serialize;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};

use crate::access::CommunityAccess;
use crate::auth::MaybeUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// Votes go out as the new tally only. Who voted which way stays private.
#[derive(Serialize)]
struct VoteTally<'a> {
    post_id: &'a str,
    target: VoteTarget,
    target_id: &'a str,
    vote_status: i64,
}

fn payload(event: &ActivityEvent) -> serde_json::Result<serde_json::Value> {
    match event {
        ActivityEvent::VoteCast {
            post_id,
            target,
            target_id,
            vote_status,
            ..
        } => serde_json::to_value(VoteTally {
            post_id,
            target: *target,
            target_id,
            vote_status: *vote_status,
        }),
        other => serde_json::to_value(other),
    }
}

fn to_sse(event: &ActivityEvent) -> Result<Event, axum::Error> {
    let data = payload(event).map_err(|e| {
        tracing::error!("SSE serialization error: {}", e);
        axum::Error::new(e)
    })?;
    Event::default()
        .event(event.kind())
        .json_data(data)
        .map_err(axum::Error::new)
}

/// Live activity for one community. Visibility is checked once at connect
/// time.
pub async fn community_stream(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(community_id): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let access = CommunityAccess::load(&state.db, &community_id, viewer.id()).await?;
    access.ensure_can_view()?;

    let rx = state.tx_activity.subscribe();
    tracing::info!("SSE connected: community={}", community_id);

    let stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(event) if event.community_id() == community_id => Some(to_sse(&event)),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("SSE subscriber lagging: {}", e);
            None
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(std::time::Duration::from_secs(15))))
}
