//! Bounded cache of recently fetched posts

use crate::models::Post;
use moka::future::Cache;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CachedPost {
    post: Post,
    fetched_at: Instant,
}

/// Latest post per account, served while younger than the freshness window.
///
/// Keys are case-insensitive account names. Stale entries stay in place until
/// overwritten or evicted by capacity.
#[derive(Debug, Clone)]
pub struct PostCache {
    inner: Cache<String, CachedPost>,
    ttl: Duration,
}

impl PostCache {
    /// Cache holding at most `capacity` accounts, fresh for `ttl`
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder().max_capacity(capacity).build(),
            ttl,
        }
    }

    fn key(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Cached post for `name` if it was fetched less than `ttl` ago
    pub async fn get_fresh(&self, name: &str) -> Option<Post> {
        self.inner
            .get(&Self::key(name))
            .await
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.post)
    }

    /// Store `post` as the latest for `name`, stamped now
    pub async fn insert(&self, name: &str, post: Post) {
        self.inner
            .insert(
                Self::key(name),
                CachedPost {
                    post,
                    fetched_at: Instant::now(),
                },
            )
            .await;
    }

    /// Approximate number of cached accounts
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Freshness window
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: u64) -> Post {
        Post {
            id,
            full_text: format!("post {id}"),
            ..Post::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_by_age() {
        let cache = PostCache::new(16, Duration::from_secs(60));
        cache.insert("Someone", post(1)).await;

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get_fresh("someone").await.map(|p| p.id), Some(1));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get_fresh("someone").await.is_none());
    }

    #[tokio::test]
    async fn test_insert_overwrites() {
        let cache = PostCache::new(16, Duration::from_secs(60));
        cache.insert("a", post(1)).await;
        cache.insert("A ", post(2)).await;

        assert_eq!(cache.get_fresh("a").await.map(|p| p.id), Some(2));
        assert!(cache.get_fresh("b").await.is_none());
    }
}
