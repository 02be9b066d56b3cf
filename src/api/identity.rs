//! Memoizing wrapper around an identity resolver.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use anyhow::Result;

use crate::models::Identity;

use super::IdentityResolver;

/// Maximum number of identities to keep in cache
const MAX_CACHE_SIZE: usize = 256;

/// Cache entry for an identity
#[derive(Debug, Clone)]
struct CachedIdentity {
    identity: Identity,
    last_access: Instant,
}

/// Caches successful resolutions so chips re-render without refetching.
///
/// Failures are not cached; the next render tries again.
#[derive(Debug)]
pub struct IdentityCache<R> {
    resolver: R,
    entries: Mutex<HashMap<String, CachedIdentity>>,
}

impl<R: IdentityResolver> IdentityCache<R> {
    /// Wrap a resolver
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cached identity, without resolving
    pub fn peek(&self, id: &str) -> Option<Identity> {
        let mut entries = self.entries.lock().ok()?;
        let entry = entries.get_mut(id)?;
        entry.last_access = Instant::now();
        Some(entry.identity.clone())
    }

    /// Number of cached identities
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, id: &str, identity: Identity) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };

        // Evict oldest entry if cache is full
        if entries.len() >= MAX_CACHE_SIZE
            && let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, v)| v.last_access)
                .map(|(k, _)| k.clone())
        {
            entries.remove(&oldest);
        }

        entries.insert(
            id.to_string(),
            CachedIdentity {
                identity,
                last_access: Instant::now(),
            },
        );
    }
}

impl<R: IdentityResolver> IdentityResolver for IdentityCache<R> {
    async fn resolve(&self, id: &str) -> Result<Identity> {
        if let Some(identity) = self.peek(id) {
            return Ok(identity);
        }

        let identity = self.resolver.resolve(id).await?;
        self.insert(id, identity.clone());
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingResolver {
        calls: AtomicUsize,
    }

    impl IdentityResolver for CountingResolver {
        async fn resolve(&self, id: &str) -> Result<Identity> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if id == "missing" {
                anyhow::bail!("entity not found");
            }
            Ok(Identity {
                username: format!("user-{id}"),
                avatar_url: format!("https://avatars.example/{id}.png"),
            })
        }
    }

    #[tokio::test]
    async fn test_resolutions_are_memoized() {
        let cache = IdentityCache::new(CountingResolver {
            calls: AtomicUsize::new(0),
        });

        let first = cache.resolve("CC1").await.unwrap();
        let second = cache.resolve("CC1").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.username, "user-CC1");
        assert_eq!(cache.resolver.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = IdentityCache::new(CountingResolver {
            calls: AtomicUsize::new(0),
        });

        assert!(cache.resolve("missing").await.is_err());
        assert!(cache.resolve("missing").await.is_err());
        assert_eq!(cache.resolver.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }
}
