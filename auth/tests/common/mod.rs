//! Shared test harness: the orchestrator wired over in-memory mocks.

// Each test binary uses a different slice of these helpers.
#![allow(dead_code)]

use tradelog_auth::config::AuthConfig;
use tradelog_auth::crypto;
use tradelog_auth::mocks::{
    MockEmailSender, MockGeoLocator, MockLoginAttempts, MockOtpStore, MockResetStore,
    MockSessionCache, MockSessionLock, MockSessionStore, MockUserStore,
};
use tradelog_auth::repository::AuthRepository;
use tradelog_auth::service::AuthService;
use tradelog_auth::state::{OtpKind, TokenPair, User};
use tradelog_auth::token::TokenSigner;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::net::IpAddr;

pub const PRIVATE_PEM: &str = include_str!("../keys/es256_private.pem");
pub const PUBLIC_PEM: &str = include_str!("../keys/es256_public.pem");

pub type TestService = AuthService<
    MockUserStore,
    MockSessionStore,
    MockSessionCache,
    MockOtpStore,
    MockLoginAttempts,
    MockResetStore,
    MockSessionLock,
    MockEmailSender,
    MockGeoLocator,
>;

pub struct TestHarness {
    pub service: TestService,
    pub users: MockUserStore,
    pub sessions: MockSessionStore,
    pub cache: MockSessionCache,
    pub otp: MockOtpStore,
    pub attempts: MockLoginAttempts,
    pub reset: MockResetStore,
    pub email: MockEmailSender,
}

pub fn client_ip() -> IpAddr {
    "203.0.113.7".parse().unwrap()
}

pub fn harness() -> TestHarness {
    harness_with_config(AuthConfig::new("https://app.tradelog.dev/reset".to_string()))
}

pub fn harness_with_config(config: AuthConfig) -> TestHarness {
    let users = MockUserStore::new();
    let sessions = MockSessionStore::new();
    let cache = MockSessionCache::new();
    let otp = MockOtpStore::new();
    let attempts = MockLoginAttempts::new();
    let reset = MockResetStore::new();
    let email = MockEmailSender::new();

    let signer = TokenSigner::from_pem(PRIVATE_PEM.as_bytes(), PUBLIC_PEM.as_bytes(), &config)
        .expect("test keys must parse");

    let repo = AuthRepository::new(users.clone(), sessions.clone(), cache.clone(), &config);
    let service = AuthService::new(
        repo,
        otp.clone(),
        attempts.clone(),
        reset.clone(),
        MockSessionLock::new(),
        email.clone(),
        MockGeoLocator::default(),
        signer,
        config,
    );

    TestHarness {
        service,
        users,
        sessions,
        cache,
        otp,
        attempts,
        reset,
        email,
    }
}

/// Pull the OTP code out of the most recently captured email.
pub fn latest_otp_code(email: &MockEmailSender) -> String {
    let sent = email.sent();
    let body = &sent.last().expect("an OTP email should have been sent").body;

    body.lines()
        .find_map(|line| line.strip_prefix("Your One-Time Password (OTP) is: "))
        .expect("OTP email should contain a code")
        .trim()
        .to_string()
}

/// Pull the reset token out of the most recently captured email link.
pub fn latest_reset_token(email: &MockEmailSender) -> String {
    let sent = email.sent();
    let body = &sent.last().expect("a reset email should have been sent").body;

    let start = body.find("token=").expect("reset link should carry a token") + "token=".len();
    let rest = &body[start..];
    let end = rest.find('&').unwrap_or(rest.len());
    rest[..end].to_string()
}

/// Plant an OTP session directly, bypassing the send path.
pub async fn seed_otp(harness: &TestHarness, email: &str, code: &str) {
    use tradelog_auth::providers::OtpStore;

    let code_hash = BASE64.encode(crypto::hash_secret(code, 0));
    harness
        .otp
        .save_otp(
            OtpKind::Register,
            email,
            &code_hash,
            chrono::Utc::now().timestamp(),
        )
        .await
        .expect("seeding OTP should succeed")
        .expect("seeded OTP should not hit a cooldown");
}

/// Register a user end to end: send OTP, read the code from the captured
/// email, register.
pub async fn register_user(
    harness: &TestHarness,
    email: &str,
    password: &str,
) -> (User, TokenPair) {
    harness
        .service
        .send_otp(client_ip(), OtpKind::Register, email)
        .await
        .expect("OTP send should succeed");

    let code = latest_otp_code(&harness.email);

    harness
        .service
        .register(email, password, &code, client_ip(), "Firefox on Linux")
        .await
        .expect("registration should succeed")
}
