//! Storage composition with two-tier read-through lookups.
//!
//! The repository pairs the durable stores with the cache mirror: reads hit
//! the cache first, fall back to the durable store, and populate the cache
//! (including the negative marker) on the way out. Cache population is best
//! effort: a failed write is logged, never raised, so read-through
//! correctness does not depend on it.

use crate::config::AuthConfig;
use crate::error::Result;
use crate::guard::JwtStorage;
use crate::providers::{SessionCache, SessionStore, UserStore};
use crate::state::{CacheLookup, SessionData, SessionId, SessionRecord, User, UserId, UserInfo};

/// Composition of user store, session store, and cache mirror.
#[derive(Clone)]
pub struct AuthRepository<U, S, C>
where
    U: UserStore + Clone,
    S: SessionStore + Clone,
    C: SessionCache + Clone,
{
    users: U,
    sessions: S,
    cache: C,
    session_lifetime: i64,
}

impl<U, S, C> AuthRepository<U, S, C>
where
    U: UserStore + Clone,
    S: SessionStore + Clone,
    C: SessionCache + Clone,
{
    /// Create a repository; the session lifetime (refresh-token lifetime)
    /// bounds what `session_for` treats as live.
    #[must_use]
    pub fn new(users: U, sessions: S, cache: C, config: &AuthConfig) -> Self {
        Self {
            users,
            sessions,
            cache,
            session_lifetime: config.refresh_token_lifetime,
        }
    }

    /// Durable user store.
    pub const fn users(&self) -> &U {
        &self.users
    }

    /// Durable session store.
    pub const fn sessions(&self) -> &S {
        &self.sessions
    }

    /// Cache mirror.
    pub const fn cache(&self) -> &C {
        &self.cache
    }

    /// Fetch a user row through the cache.
    ///
    /// # Errors
    ///
    /// Returns error when both tiers fail.
    pub async fn user_by_id(&self, user_id: UserId) -> Result<Option<User>> {
        match self.cache.user_entry(user_id).await? {
            CacheLookup::Hit(user) => return Ok(Some(user)),
            CacheLookup::NegativeHit => return Ok(None),
            CacheLookup::Miss => {}
        }

        let user = self.users.user_by_id(user_id).await?;

        if let Err(e) = self.cache.put_user_entry(user_id, user.as_ref()).await {
            tracing::error!(user_id = %user_id, error = %e, "Failed to write user data to cache");
        }

        Ok(user)
    }

    /// Fetch a session row through the cache.
    ///
    /// # Errors
    ///
    /// Returns error when both tiers fail.
    pub async fn session_by_id(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> Result<Option<SessionRecord>> {
        match self.cache.session_entry(user_id, session_id).await? {
            CacheLookup::Hit(record) => return Ok(Some(record)),
            CacheLookup::NegativeHit => return Ok(None),
            CacheLookup::Miss => {}
        }

        let record = self.sessions.session_by_id(user_id, session_id).await?;

        if let Err(e) = self
            .cache
            .put_session_entry(user_id, session_id, record.as_ref())
            .await
        {
            tracing::error!(
                user_id = %user_id,
                session_id = %session_id,
                error = %e,
                "Failed to write session data to cache"
            );
        }

        Ok(record)
    }
}

impl<U, S, C> JwtStorage for AuthRepository<U, S, C>
where
    U: UserStore + Clone,
    S: SessionStore + Clone,
    C: SessionCache + Clone,
{
    async fn session_for(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> Result<Option<SessionData>> {
        let Some(session) = self.session_by_id(user_id, session_id).await? else {
            return Ok(None);
        };

        let expiry_threshold = chrono::Utc::now().timestamp() - self.session_lifetime;
        if session.deleted_at != 0 || session.refreshed_at < expiry_threshold {
            return Ok(None);
        }

        Ok(Some(SessionData {
            session_id: SessionId(session.session_id),
            access_id: session.access_id,
            refresh_id: session.refresh_id,
        }))
    }

    async fn user_for(&self, user_id: UserId) -> Result<Option<UserInfo>> {
        let Some(user) = self.user_by_id(user_id).await? else {
            return Ok(None);
        };

        if !user.is_active() {
            return Ok(None);
        }

        Ok(Some(UserInfo::from(&user)))
    }
}
