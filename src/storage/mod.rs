//! Feed storage.
//!
//! Posts are scoped by neighborhood. Every backend must uphold the
//! isolation rule: listing neighborhood A never yields a post from B.

pub mod memory;
pub mod post;

use crate::models::{NeighborhoodHash, NewPost, Page, Post};
use async_trait::async_trait;
use std::time::{SystemTime, UNIX_EPOCH};

pub use memory::MemoryPostStore;
pub use post::RedisPostStore;

/// Error type for feed storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Persistence for feed posts.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Persist a validated post. Either the whole post is stored or nothing is.
    async fn create(&self, post: NewPost) -> Result<Post, StoreError>;

    /// Posts for one neighborhood, newest first.
    async fn list(&self, neighborhood: &NeighborhoodHash, page: Page)
        -> Result<Vec<Post>, StoreError>;
}

/// Assign an id and creation time.
pub(crate) fn materialize(post: NewPost) -> Post {
    let created_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    Post {
        id: nanoid::nanoid!(12),
        content: post.content,
        author_address: post.author_address,
        neighborhood_hash: post.neighborhood_hash,
        created_at,
    }
}
