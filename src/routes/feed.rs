//! Neighborhood feed endpoints (authenticated + gated).
//!
//! The neighborhood always comes from the gate, never from the request.

use crate::auth::middleware::{AppState, GatedSession};
use crate::error::AppError;
use crate::models::{CreatePostRequest, FeedQuery, NewPost, Page};
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// POST /feed: Create a post in the caller's neighborhood
pub async fn create_post(
    GatedSession(ctx): GatedSession,
    State(state): State<AppState>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;

    let post = NewPost::new(
        req.content.unwrap_or_default(),
        ctx.session.address,
        ctx.membership.neighborhood_hash,
        state.config.max_post_chars,
    )?;

    let post = state.posts.create(post).await?;

    tracing::info!(
        action = "post_created",
        post_id = %post.id,
        author = %post.author_address,
        neighborhood = %post.neighborhood_hash,
        "Post created"
    );

    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /feed: Newest posts in the caller's neighborhood
pub async fn list_posts(
    GatedSession(ctx): GatedSession,
    State(state): State<AppState>,
    query: Result<Query<FeedQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;
    let page = Page::from_query(
        &query,
        state.config.feed_default_limit,
        state.config.feed_max_limit,
    );

    let posts = state
        .posts
        .list(&ctx.membership.neighborhood_hash, page)
        .await?;

    Ok(Json(posts))
}
