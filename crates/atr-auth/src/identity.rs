//! The pluggable identity provider the capability ladder consults to
//! decide committee/committer membership, plus a 10-minute per-user cache
//! wrapper so a hot path never pays a directory round trip on every call.

use async_trait::async_trait;
use atr_core::EngineResult;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// A user's committee affiliations, as resolved by an external directory
/// (session data, LDAP, or a committer-list file) outside this crate's
/// scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memberships {
    /// Committees this user is a full (binding-vote) member of.
    pub member_of: Vec<String>,
    /// Committees this user is a committer on but not a full member of.
    pub committer_of: Vec<String>,
}

impl Memberships {
    pub fn is_member_of(&self, committee_name: &str) -> bool {
        self.member_of.iter().any(|c| c == committee_name)
    }

    pub fn is_committer_of(&self, committee_name: &str) -> bool {
        self.is_member_of(committee_name) || self.committer_of.iter().any(|c| c == committee_name)
    }
}

/// The plug-in seam for identity resolution. Implementations call out to
/// whatever directory a deployment uses; none is provided here.
#[async_trait]
pub trait Authorisation: Send + Sync {
    async fn memberships(&self, asf_uid: &str) -> EngineResult<Memberships>;
}

const CACHE_TTL_SECONDS: i64 = 600;

struct CacheEntry {
    memberships: Memberships,
    fetched_at: DateTime<Utc>,
}

/// Wraps an [`Authorisation`] provider with a per-user cache, tolerating
/// staleness for up to ten minutes, matching `principal.py`'s
/// `cache_for_at_most_seconds = 600`.
pub struct CachedAuthorisation<P: Authorisation> {
    inner: P,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

impl<P: Authorisation> CachedAuthorisation<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<P: Authorisation> Authorisation for CachedAuthorisation<P> {
    async fn memberships(&self, asf_uid: &str) -> EngineResult<Memberships> {
        let now = Utc::now();
        if let Some(entry) = self.cache.lock().unwrap().get(asf_uid) {
            if (now - entry.fetched_at).num_seconds() < CACHE_TTL_SECONDS {
                return Ok(entry.memberships.clone());
            }
        }

        let memberships = self.inner.memberships(asf_uid).await?;
        self.cache.lock().unwrap().insert(
            asf_uid.to_string(),
            CacheEntry {
                memberships: memberships.clone(),
                fetched_at: now,
            },
        );
        Ok(memberships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider(Memberships);

    #[async_trait]
    impl Authorisation for FixedProvider {
        async fn memberships(&self, _asf_uid: &str) -> EngineResult<Memberships> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn a_cached_lookup_does_not_change_within_the_ttl() {
        let cached = CachedAuthorisation::new(FixedProvider(Memberships {
            member_of: vec!["foo".to_string()],
            committer_of: vec![],
        }));
        let first = cached.memberships("alice").await.unwrap();
        let second = cached.memberships("alice").await.unwrap();
        assert_eq!(first, second);
        assert!(first.is_member_of("foo"));
        assert!(!first.is_member_of("bar"));
    }
}
