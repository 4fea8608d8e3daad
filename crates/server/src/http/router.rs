use super::handlers::{
    comments, communities, media, moderation, notifications, posts, sse, users, votes,
};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

const METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PATCH, Method::DELETE];

fn cors_layer(allowed_origins: &str) -> CorsLayer {
    if allowed_origins == "*" {
        return CorsLayer::new()
            .allow_methods(METHODS)
            .allow_origin(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS config is invalid or empty, falling back to allow ANY.");
        CorsLayer::new()
            .allow_methods(METHODS)
            .allow_origin(Any)
            .allow_headers(Any)
    } else {
        tracing::info!("CORS enabled for origins: {:?}", origins);
        CorsLayer::new()
            .allow_methods(METHODS)
            .allow_origin(origins)
            .allow_headers(Any)
    }
}

pub fn build_router(state: AppState, allowed_origins: &str) -> Router {
    // Leave room for the multipart framing around the file itself.
    let upload_limit = state.media.max_bytes() + 64 * 1024;

    Router::new()
        // users
        .route("/api/users", post(users::register))
        .route("/api/users/:user_id", get(users::get_user))
        .route("/api/me", get(users::me).patch(users::update_me))
        .route("/api/me/token", post(users::rotate_token))
        .route("/api/me/snippets", get(users::my_snippets))
        .route("/api/me/saved", get(users::my_saved_posts))
        // communities
        .route(
            "/api/communities",
            get(communities::list_communities).post(communities::create_community),
        )
        .route(
            "/api/communities/:community_id",
            get(communities::get_community)
                .patch(communities::update_community)
                .delete(communities::delete_community),
        )
        .route(
            "/api/communities/:community_id/members",
            post(communities::join_community).delete(communities::leave_community),
        )
        .route(
            "/api/communities/:community_id/moderators",
            get(moderation::list_moderators),
        )
        .route(
            "/api/communities/:community_id/moderators/:user_id",
            post(moderation::add_moderator).delete(moderation::remove_moderator),
        )
        .route(
            "/api/communities/:community_id/sponsors",
            get(moderation::list_sponsors)
                .post(moderation::join_sponsors)
                .delete(moderation::leave_sponsors),
        )
        .route("/api/communities/:community_id/bans", get(moderation::list_bans))
        .route(
            "/api/communities/:community_id/bans/:user_id",
            post(moderation::ban_user).delete(moderation::unban_user),
        )
        .route(
            "/api/communities/:community_id/reports",
            get(moderation::list_reports),
        )
        .route(
            "/api/communities/:community_id/reports/:report_id",
            delete(moderation::dismiss_report),
        )
        .route(
            "/api/communities/:community_id/posts",
            get(posts::community_feed).post(posts::create_post),
        )
        .route("/api/communities/:community_id/votes", get(votes::community_votes))
        .route("/api/communities/:community_id/sse", get(sse::community_stream))
        // posts
        .route("/api/feed", get(posts::home_feed))
        .route("/api/events", get(posts::upcoming_events))
        .route("/api/posts/:post_id", get(posts::get_post).delete(posts::delete_post))
        .route("/api/posts/:post_id/vote", post(votes::vote_post))
        .route("/api/posts/:post_id/votes", get(votes::thread_votes))
        .route(
            "/api/posts/:post_id/save",
            post(posts::save_post).delete(posts::unsave_post),
        )
        .route(
            "/api/posts/:post_id/hide",
            post(posts::hide_post).delete(posts::unhide_post),
        )
        .route("/api/posts/:post_id/report", post(posts::report_post))
        .route(
            "/api/posts/:post_id/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        // comments and replies
        .route("/api/comments/:comment_id", delete(comments::delete_comment))
        .route("/api/comments/:comment_id/vote", post(votes::vote_comment))
        .route(
            "/api/comments/:comment_id/replies",
            get(comments::list_replies).post(comments::create_reply),
        )
        .route("/api/replies/:reply_id", delete(comments::delete_reply))
        .route("/api/replies/:reply_id/vote", post(votes::vote_reply))
        // notifications
        .route("/api/notifications", get(notifications::list_notifications))
        .route("/api/notifications/unread", get(notifications::unread_count))
        .route("/api/notifications/read", post(notifications::mark_all_read))
        .route(
            "/api/notifications/:notification_id/read",
            post(notifications::mark_read),
        )
        // media
        .route(
            "/api/media",
            post(media::upload_media).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/media/:file", get(media::serve_media))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}
