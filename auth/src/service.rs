//! Auth orchestrator.
//!
//! Coordinates registration, login, logout, refresh, heartbeat, OTP and
//! reset-password flows over the provider traits. Token issuance and
//! rotation run under the per-user session lock; everything that mutates
//! OTP state or counters goes through the atomic store operations.

use crate::config::AuthConfig;
use crate::constants;
use crate::crypto;
use crate::error::{AuthError, Result};
use crate::guard::{self, AuthContext, TokenMode};
use crate::providers::{
    EmailSender, GeoLocator, LoginAttempts, OtpStore, ResetStore, SessionCache, SessionLock,
    SessionStore, UserStore,
};
use crate::repository::AuthRepository;
use crate::state::{
    OtpKind, ResetSession, SessionId, SessionMarkers, SessionRecord, TokenPair, User, UserId,
    UserInfo,
};
use crate::templates;
use crate::token::{TokenSigner, TokenType};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::Rng;
use rand::rngs::OsRng;
use std::net::IpAddr;

/// Session and credential lifecycle orchestrator.
///
/// Generic over every external collaborator so the full flow logic runs
/// against in-memory mocks in tests.
#[derive(Clone)]
pub struct AuthService<U, S, C, O, A, T, L, E, G>
where
    U: UserStore + Clone,
    S: SessionStore + Clone,
    C: SessionCache + Clone,
    O: OtpStore + Clone,
    A: LoginAttempts + Clone,
    T: ResetStore + Clone,
    L: SessionLock + Clone,
    E: EmailSender + Clone,
    G: GeoLocator + Clone,
{
    repo: AuthRepository<U, S, C>,
    otp: O,
    attempts: A,
    reset: T,
    lock: L,
    email: E,
    geo: G,
    signer: TokenSigner,
    config: AuthConfig,
}

impl<U, S, C, O, A, T, L, E, G> AuthService<U, S, C, O, A, T, L, E, G>
where
    U: UserStore + Clone,
    S: SessionStore + Clone,
    C: SessionCache + Clone,
    O: OtpStore + Clone,
    A: LoginAttempts + Clone,
    T: ResetStore + Clone,
    L: SessionLock + Clone,
    E: EmailSender + Clone,
    G: GeoLocator + Clone,
{
    /// Create the orchestrator.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: AuthRepository<U, S, C>,
        otp: O,
        attempts: A,
        reset: T,
        lock: L,
        email: E,
        geo: G,
        signer: TokenSigner,
        config: AuthConfig,
    ) -> Self {
        Self {
            repo,
            otp,
            attempts,
            reset,
            lock,
            email,
            geo,
            signer,
            config,
        }
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    /// Register a new user.
    ///
    /// Requires a prior OTP verification for the email (kind = Register);
    /// the email must be unique.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` when the OTP code does not verify.
    /// - `Conflict` when the email is already registered.
    /// - `Internal` when session issuance fails.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        otp_code: &str,
        ip: IpAddr,
        device_name: &str,
    ) -> Result<(User, TokenPair)> {
        if !self.check_otp(OtpKind::Register, email, otp_code).await? {
            return Err(AuthError::unauthorized("OTP verification failed."));
        }

        let hashed = BASE64.encode(crypto::hash_secret(password, constants::PASSWORD_SALT_LEN));
        let user = self
            .repo
            .users()
            .create_user(email, &hashed, Self::now())
            .await?;

        let pair = self.issue_session(user.user_id(), ip, device_name, true).await?;

        tracing::info!(user_id = user.id, "Registered new user");
        Ok((user, pair))
    }

    /// Log a user in with email and password.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` when the user is absent, blocked, deleted, or the
    ///   password does not match.
    /// - `TooManyRequests` when the attempt counter exceeds its cap.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        ip: IpAddr,
        device_name: &str,
    ) -> Result<(User, TokenPair)> {
        let user = self
            .repo
            .users()
            .user_by_email(email)
            .await?
            .ok_or_else(|| AuthError::unauthorized("User record not found."))?;

        if !user.is_active() {
            return Err(AuthError::unauthorized("User has been blocked or deleted."));
        }

        // Counted before password verification so wrong-password storms
        // consume the budget; count > cap rejects even a correct password.
        let count = self.attempts.increment(user.user_id()).await?;
        if count > self.config.max_login_attempts {
            tracing::warn!(user_id = user.id, attempts = count, "Login attempts exceeded");
            return Err(AuthError::TooManyRequests("Too many login attempts.".to_string()));
        }

        let stored = BASE64
            .decode(&user.password)
            .map_err(|e| AuthError::internal(format!("Corrupt stored password: {e}")))?;
        if !crypto::verify_secret(&stored, password, constants::PASSWORD_SALT_LEN)? {
            return Err(AuthError::unauthorized("Password mismatch."));
        }

        let pair = self.issue_session(user.user_id(), ip, device_name, true).await?;

        self.attempts.clear(user.user_id()).await?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok((user, pair))
    }

    /// Log one session out: soft-delete the row and drop its cache mirror.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    pub async fn logout(&self, user_id: UserId, session_id: SessionId) -> Result<()> {
        self.repo
            .sessions()
            .soft_delete(user_id, session_id, Self::now())
            .await?;
        self.repo.cache().invalidate_session(user_id, session_id).await?;

        tracing::info!(user_id = %user_id, session_id = %session_id, "Logged out session");
        Ok(())
    }

    /// Rotate a session's marker pair and sign fresh tokens.
    ///
    /// The caller must have validated the presented refresh token (refresh
    /// mode guard). No session-count pruning happens here.
    ///
    /// # Errors
    ///
    /// Returns error on store failure or lock timeout.
    pub async fn refresh_token(&self, user_id: UserId, session_id: SessionId) -> Result<TokenPair> {
        self.lock
            .with_lock(user_id, async {
                let now = Self::now();
                let markers = SessionMarkers::new();

                self.repo
                    .sessions()
                    .rotate_markers(user_id, session_id, markers, now)
                    .await?;

                // Drop the mirror so the next guard check re-derives the
                // new pair from the durable row.
                self.repo.cache().invalidate_session(user_id, session_id).await?;

                self.signer
                    .generate_pair(user_id, session_id, markers, false, now)
            })
            .await
    }

    /// Keep a session alive: update `last_online` and location on the
    /// cached entry, then mirror the change durably.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` when the session has no live cache entry; the entry
    ///   is never silently recreated.
    pub async fn heartbeat(&self, user_id: UserId, session_id: SessionId, ip: IpAddr) -> Result<()> {
        let last_online = Self::now();
        let (city, country) = self.geo.city_country(ip).await;
        let location = format!("{city},{country}");
        let ip_str = ip.to_string();

        let touched = self
            .repo
            .cache()
            .touch_session(user_id, session_id, last_online, &ip_str, &location)
            .await?;

        if !touched {
            return Err(AuthError::unauthorized(format!(
                "Session id not exists, user_id: {user_id}, session_id: {session_id}."
            )));
        }

        self.repo
            .sessions()
            .update_last_seen(user_id, session_id, &ip_str, &location, last_online)
            .await
    }

    /// Send an OTP code to an identifier.
    ///
    /// # Errors
    ///
    /// - `TooManyRequests` when the per-IP budget or the per-identifier
    ///   cooldown rejects the send.
    /// - `Conflict` for a Register OTP on an already-taken email.
    pub async fn send_otp(&self, ip: IpAddr, kind: OtpKind, identifier: &str) -> Result<()> {
        let sends = self.otp.record_ip_send(ip, self.config.otp_ip_window).await?;
        if sends > self.config.max_otp_per_ip {
            tracing::warn!(ip = %ip, sends, "OTP per-IP budget exceeded");
            return Err(AuthError::TooManyRequests(
                "Too many OTP requests from this address.".to_string(),
            ));
        }

        if kind == OtpKind::Register
            && self.repo.users().user_by_email(identifier).await?.is_some()
        {
            return Err(AuthError::Conflict("Email already exists.".to_string()));
        }

        let code = Self::generate_otp_code();
        let code_hash = BASE64.encode(crypto::hash_secret(&code, 0));

        let Some(expiry) = self
            .otp
            .save_otp(kind, identifier, &code_hash, Self::now())
            .await?
        else {
            return Err(AuthError::TooManyRequests("OTP send on cooldown.".to_string()));
        };

        let tz = self.geo.timezone_offset(ip).await;
        let (subject, body) = templates::otp_email(&code, &templates::format_expiry(expiry, &tz));

        if !self
            .email
            .send_email(&[identifier.to_string()], &subject, &body)
            .await
        {
            tracing::error!(identifier = %identifier, "Failed to send OTP email");
        }

        Ok(())
    }

    /// Fail with `Conflict` when the email is already registered.
    ///
    /// # Errors
    ///
    /// - `Conflict` when taken.
    /// - `Internal` on store failure.
    pub async fn check_email(&self, email: &str) -> Result<()> {
        if self.repo.users().user_by_email(email).await?.is_some() {
            return Err(AuthError::Conflict("Email already exists.".to_string()));
        }

        Ok(())
    }

    /// Send a reset-password link to an existing, active user.
    ///
    /// An inactive (blocked/deleted) user gets a silent success so the
    /// endpoint does not leak account state.
    ///
    /// # Errors
    ///
    /// - `NotFound` when the email is unknown.
    /// - `TooManyRequests` while a prior link is inside its cooldown.
    pub async fn send_reset_password_link(&self, ip: IpAddr, email: &str) -> Result<()> {
        let user = self
            .repo
            .users()
            .user_by_email(email)
            .await?
            .ok_or_else(|| AuthError::NotFound("Email record not found.".to_string()))?;

        if !user.is_active() {
            return Ok(());
        }

        let now = Self::now();
        if let Some(existing) = self.reset.peek(user.user_id()).await? {
            if existing.issued_at + constants::RESET_PASSWORD_SEND_COOLDOWN_SECS > now {
                return Err(AuthError::TooManyRequests(
                    "Send reset password link on cooldown.".to_string(),
                ));
            }
        }

        let reset_session = ResetSession {
            session_id: SessionId::new(),
            issued_at: now,
        };
        let expiry = self.reset.save(user.user_id(), reset_session).await?;

        let token =
            self.signer
                .generate_reset_token(user.user_id(), email, reset_session.session_id, now)?;
        let link = format!(
            "{}?token={token}&exp={expiry}",
            self.config.reset_password_link
        );

        let tz = self.geo.timezone_offset(ip).await;
        let (subject, body) =
            templates::reset_password_email(&link, &templates::format_expiry(expiry, &tz));

        if !self
            .email
            .send_email(&[email.to_string()], &subject, &body)
            .await
        {
            tracing::error!(user_id = user.id, "Failed to send reset-password email");
        }

        Ok(())
    }

    /// Redeem a reset token: replace the password, invalidate every session
    /// and the attempt counter, consume the reset session.
    ///
    /// The reset session is consumed atomically up front, so a second
    /// redemption, concurrent or later, observes nothing and fails.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` when no reset session exists or the presented id
    ///   does not match.
    pub async fn reset_password(
        &self,
        user_id: UserId,
        presented: SessionId,
        new_password: &str,
    ) -> Result<()> {
        let stored = self
            .reset
            .take(user_id)
            .await?
            .ok_or_else(|| AuthError::unauthorized("Reset password session not found."))?;

        if stored.session_id != presented {
            return Err(AuthError::unauthorized("Reset password session mismatch."));
        }

        let hashed = BASE64.encode(crypto::hash_secret(
            new_password,
            constants::PASSWORD_SALT_LEN,
        ));
        self.repo
            .users()
            .update_password(user_id, &hashed, Self::now())
            .await?;
        self.repo.cache().invalidate_user(user_id).await?;

        self.remove_all_sessions(user_id).await?;
        self.attempts.clear(user_id).await?;

        tracing::info!(user_id = %user_id, "Password reset completed");
        Ok(())
    }

    /// Block a user and invalidate everything they hold.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    pub async fn block_user(&self, user_id: UserId) -> Result<()> {
        self.repo.users().block_user(user_id, Self::now()).await?;
        self.repo.cache().invalidate_user(user_id).await?;
        self.remove_all_sessions(user_id).await
    }

    /// Soft-delete every session of a user and purge the cache mirrors.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    pub async fn remove_all_sessions(&self, user_id: UserId) -> Result<()> {
        let deleted = self
            .repo
            .sessions()
            .soft_delete_all(user_id, Self::now())
            .await?;
        self.repo.cache().invalidate_sessions(user_id, &deleted).await
    }

    /// Public info for an authenticated user.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` when the user is absent or inactive.
    pub async fn user_info(&self, user_id: UserId) -> Result<UserInfo> {
        use crate::guard::JwtStorage as _;

        self.repo
            .user_for(user_id)
            .await?
            .ok_or_else(|| AuthError::unauthorized("User not found."))
    }

    /// Run the bearer-token verification chain against this service's
    /// storage.
    ///
    /// # Errors
    ///
    /// See [`guard::authenticate`].
    pub async fn authenticate(&self, token: &str, mode: TokenMode) -> Result<AuthContext> {
        guard::authenticate(&self.signer, &self.repo, token, mode).await
    }

    /// Verify a reset token's signature and expiry and extract the user and
    /// reset-session ids. Storage validation happens in
    /// [`Self::reset_password`].
    ///
    /// # Errors
    ///
    /// - `TokenExpired`/`Unauthorized` per [`TokenSigner::verify`].
    pub fn verify_reset_token(&self, token: &str) -> Result<(UserId, SessionId)> {
        let claims = self.signer.verify(token, TokenType::Access)?;
        Ok((UserId(claims.sub), SessionId(claims.sid)))
    }

    /// Hash an OTP code and check it against the stored digest.
    async fn check_otp(&self, kind: OtpKind, identifier: &str, code: &str) -> Result<bool> {
        let code_hash = BASE64.encode(crypto::hash_secret(code, 0));
        self.otp
            .verify_otp(kind, identifier, &code_hash, Self::now())
            .await
    }

    fn generate_otp_code() -> String {
        let bound = 10u32.pow(constants::OTP_CODE_DIGITS);
        let code = OsRng.gen_range(0..bound);
        format!(
            "{code:0width$}",
            width = constants::OTP_CODE_DIGITS as usize
        )
    }

    /// Issue a new session under the user's lock: find a free session id
    /// (bounded retries), persist the row, prune beyond the cap, sign the
    /// pair.
    async fn issue_session(
        &self,
        user_id: UserId,
        ip: IpAddr,
        device_name: &str,
        fresh: bool,
    ) -> Result<TokenPair> {
        let (city, country) = self.geo.city_country(ip).await;
        let location = format!("{city},{country}");
        let ip_str = ip.to_string();

        self.lock
            .with_lock(user_id, async {
                let now = Self::now();

                let mut created: Option<(SessionId, SessionMarkers)> = None;
                for _ in 0..constants::SESSION_CREATE_RETRIES {
                    let session_id = SessionId::new();
                    let markers = SessionMarkers::new();
                    let record = SessionRecord::new(
                        user_id,
                        session_id,
                        markers,
                        now,
                        ip_str.clone(),
                        location.clone(),
                        device_name.to_string(),
                    );

                    if self.repo.sessions().create_session(&record).await? {
                        created = Some((session_id, markers));
                        break;
                    }
                }

                let Some((session_id, markers)) = created else {
                    return Err(AuthError::internal(format!(
                        "Session id already exists, user_id: {user_id}."
                    )));
                };

                let pruned = self
                    .repo
                    .sessions()
                    .prune_sessions(
                        user_id,
                        self.config.max_sessions_per_user,
                        now - self.config.refresh_token_lifetime,
                        now,
                    )
                    .await?;
                if !pruned.is_empty() {
                    self.repo.cache().invalidate_sessions(user_id, &pruned).await?;
                }

                self.signer.generate_pair(user_id, session_id, markers, fresh, now)
            })
            .await
    }
}
