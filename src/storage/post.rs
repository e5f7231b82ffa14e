//! Redis post storage.
//!
//! Redis key patterns:
//! - `post:{id}`: post (JSON)
//! - `feed:{neighborhood}`: ZSET of post IDs scored by insertion sequence
//! - `feed_seq:{neighborhood}`: counter issuing that sequence

use crate::models::{NeighborhoodHash, NewPost, Page, Post};
use crate::storage::{materialize, PostStore, StoreError};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

fn post_key(id: &str) -> String {
    format!("post:{}", id)
}

fn feed_key(neighborhood: &NeighborhoodHash) -> String {
    format!("feed:{}", neighborhood)
}

fn feed_seq_key(neighborhood: &NeighborhoodHash) -> String {
    format!("feed_seq:{}", neighborhood)
}

/// Post store on a shared multiplexed Redis connection.
#[derive(Clone)]
pub struct RedisPostStore {
    con: MultiplexedConnection,
}

impl RedisPostStore {
    /// Open the client and establish the multiplexed connection.
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let con = client.get_multiplexed_async_connection().await?;
        Ok(Self { con })
    }

    pub fn from_connection(con: MultiplexedConnection) -> Self {
        Self { con }
    }
}

#[async_trait]
impl PostStore for RedisPostStore {
    async fn create(&self, post: NewPost) -> Result<Post, StoreError> {
        let post = materialize(post);
        let json = serde_json::to_string(&post)?;
        let mut con = self.con.clone();

        // Record and index in one step so a post is never half-written.
        // Scores come from a per-feed counter, so posts created within the
        // same millisecond still list newest first.
        let script = redis::Script::new(
            r"
            redis.call('SET', KEYS[1], ARGV[1])
            local seq = redis.call('INCR', KEYS[3])
            redis.call('ZADD', KEYS[2], seq, ARGV[2])
            return seq
            ",
        );

        let _: i64 = script
            .key(post_key(&post.id))
            .key(feed_key(&post.neighborhood_hash))
            .key(feed_seq_key(&post.neighborhood_hash))
            .arg(json)
            .arg(&post.id)
            .invoke_async(&mut con)
            .await?;

        Ok(post)
    }

    async fn list(
        &self,
        neighborhood: &NeighborhoodHash,
        page: Page,
    ) -> Result<Vec<Post>, StoreError> {
        let mut con = self.con.clone();

        let start = page.offset() as isize;
        let stop = start + page.limit as isize - 1;
        let ids: Vec<String> = con.zrevrange(feed_key(neighborhood), start, stop).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| post_key(id)).collect();
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut con)
            .await?;

        let mut posts = Vec::with_capacity(values.len());
        for (id, value) in ids.iter().zip(values) {
            let Some(json) = value else {
                tracing::warn!(post_id = %id, "Feed index references missing post");
                continue;
            };
            let post: Post = serde_json::from_str(&json)?;
            if post.neighborhood_hash != *neighborhood {
                tracing::error!(
                    post_id = %id,
                    expected = %neighborhood,
                    actual = %post.neighborhood_hash,
                    "Post indexed under wrong neighborhood, skipping"
                );
                continue;
            }
            posts.push(post);
        }

        Ok(posts)
    }
}
