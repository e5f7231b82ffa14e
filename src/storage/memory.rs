//! In-process post store for development and tests.

use crate::models::{NeighborhoodHash, NewPost, Page, Post};
use crate::storage::{materialize, PostStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Posts kept in memory, bucketed by neighborhood in insertion order.
#[derive(Debug, Default)]
pub struct MemoryPostStore {
    feeds: RwLock<HashMap<NeighborhoodHash, Vec<Post>>>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn create(&self, post: NewPost) -> Result<Post, StoreError> {
        let post = materialize(post);
        self.feeds
            .write()
            .await
            .entry(post.neighborhood_hash)
            .or_default()
            .push(post.clone());
        Ok(post)
    }

    async fn list(
        &self,
        neighborhood: &NeighborhoodHash,
        page: Page,
    ) -> Result<Vec<Post>, StoreError> {
        let feeds = self.feeds.read().await;
        let Some(posts) = feeds.get(neighborhood) else {
            return Ok(Vec::new());
        };

        Ok(posts
            .iter()
            .rev()
            .filter(|p| p.neighborhood_hash == *neighborhood)
            .skip(page.offset())
            .take(page.limit as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Address;

    const AUTHOR: Address = Address([0xab; 20]);

    fn hood(byte: u8) -> NeighborhoodHash {
        NeighborhoodHash([byte; 32])
    }

    async fn create(store: &MemoryPostStore, content: &str, neighborhood: NeighborhoodHash) -> Post {
        let post = NewPost::new(content.to_string(), AUTHOR, neighborhood, 2000).unwrap();
        store.create(post).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_scope() {
        let store = MemoryPostStore::new();
        let post = create(&store, "hello", hood(1)).await;

        assert_eq!(post.id.len(), 12);
        assert_eq!(post.content, "hello");
        assert_eq!(post.author_address, AUTHOR);
        assert_eq!(post.neighborhood_hash, hood(1));
        assert!(post.created_at > 0);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_pages() {
        let store = MemoryPostStore::new();
        for i in 0..5 {
            create(&store, &format!("post {}", i), hood(1)).await;
        }

        let first = store.list(&hood(1), Page { page: 1, limit: 2 }).await.unwrap();
        let contents: Vec<_> = first.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["post 4", "post 3"]);

        let third = store.list(&hood(1), Page { page: 3, limit: 2 }).await.unwrap();
        let contents: Vec<_> = third.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["post 0"]);

        let past_end = store.list(&hood(1), Page { page: 9, limit: 2 }).await.unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn test_list_never_crosses_neighborhoods() {
        let store = MemoryPostStore::new();
        let hoods = [hood(1), hood(2), hood(3)];
        for i in 0..30u8 {
            let neighborhood = hoods[(i as usize * 7) % hoods.len()];
            create(&store, &format!("post {}", i), neighborhood).await;
        }

        let mut total = 0;
        for neighborhood in &hoods {
            let posts = store
                .list(neighborhood, Page { page: 1, limit: 100 })
                .await
                .unwrap();
            assert!(posts.iter().all(|p| p.neighborhood_hash == *neighborhood));
            total += posts.len();
        }
        assert_eq!(total, 30);

        let empty = store.list(&hood(9), Page { page: 1, limit: 10 }).await.unwrap();
        assert!(empty.is_empty());
    }
}
