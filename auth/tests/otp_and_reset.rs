//! OTP and reset-password integration tests over the mock providers.

mod common;

use common::{client_ip, harness, harness_with_config, latest_reset_token, register_user, seed_otp};
use tradelog_auth::config::AuthConfig;
use tradelog_auth::error::AuthError;
use tradelog_auth::guard::TokenMode;
use tradelog_auth::state::OtpKind;

#[tokio::test]
async fn test_otp_send_cooldown() {
    let h = harness();

    h.service
        .send_otp(client_ip(), OtpKind::Register, "trader@example.com")
        .await
        .expect("first OTP send should succeed");

    let second = h
        .service
        .send_otp(client_ip(), OtpKind::Register, "trader@example.com")
        .await;
    assert!(matches!(second, Err(AuthError::TooManyRequests(_))));

    // Only the first send produced an email.
    assert_eq!(h.email.sent().len(), 1);
}

#[tokio::test]
async fn test_otp_send_conflicts_on_taken_email() {
    let h = harness();
    register_user(&h, "trader@example.com", "s3cret-passphrase").await;

    let result = h
        .service
        .send_otp(client_ip(), OtpKind::Register, "trader@example.com")
        .await;
    assert!(matches!(result, Err(AuthError::Conflict(_))));
}

#[tokio::test]
async fn test_otp_per_ip_budget() {
    let config = AuthConfig::new("https://app.tradelog.dev/reset".to_string())
        .with_otp_ip_limit(2, 600);
    let h = harness_with_config(config);

    h.service
        .send_otp(client_ip(), OtpKind::Register, "a@example.com")
        .await
        .unwrap();
    h.service
        .send_otp(client_ip(), OtpKind::Register, "b@example.com")
        .await
        .unwrap();

    let third = h
        .service
        .send_otp(client_ip(), OtpKind::Register, "c@example.com")
        .await;
    assert!(matches!(third, Err(AuthError::TooManyRequests(_))));
}

#[tokio::test]
async fn test_otp_retry_budget_blocks_correct_code() {
    let h = harness();
    seed_otp(&h, "trader@example.com", "1234").await;

    for _ in 0..5 {
        let result = h
            .service
            .register(
                "trader@example.com",
                "s3cret-passphrase",
                "0000",
                client_ip(),
                "CLI",
            )
            .await;
        assert!(matches!(result, Err(AuthError::Unauthorized(_))));
    }

    // Five failures burned the budget: the correct code no longer verifies.
    let result = h
        .service
        .register(
            "trader@example.com",
            "s3cret-passphrase",
            "1234",
            client_ip(),
            "CLI",
        )
        .await;
    assert!(matches!(result, Err(AuthError::Unauthorized(_))));
    assert_eq!(h.users.user_count().unwrap(), 0);
}

#[tokio::test]
async fn test_otp_verifies_exactly_once() {
    let h = harness();
    seed_otp(&h, "trader@example.com", "1234").await;

    h.service
        .register(
            "trader@example.com",
            "s3cret-passphrase",
            "1234",
            client_ip(),
            "CLI",
        )
        .await
        .expect("first verification should succeed");

    // The same code cannot gate a second registration: the status already
    // flipped to verified, so the OTP check fails before the email check.
    let result = h
        .service
        .register(
            "trader@example.com",
            "s3cret-passphrase",
            "1234",
            client_ip(),
            "CLI",
        )
        .await;
    assert!(matches!(result, Err(AuthError::Unauthorized(_))));
}

#[tokio::test]
async fn test_reset_password_is_single_use_and_invalidates_sessions() {
    let h = harness();
    let (user, pair) = register_user(&h, "trader@example.com", "s3cret-passphrase").await;

    h.service
        .send_reset_password_link(client_ip(), "trader@example.com")
        .await
        .unwrap();

    let token = latest_reset_token(&h.email);
    let (user_id, reset_session_id) = h.service.verify_reset_token(&token).unwrap();
    assert_eq!(user_id, user.user_id());

    h.service
        .reset_password(user_id, reset_session_id, "new-passphrase")
        .await
        .expect("first redemption should succeed");

    // All pre-existing sessions are gone.
    assert!(matches!(
        h.service
            .authenticate(&pair.access_token, TokenMode::Access)
            .await,
        Err(AuthError::Unauthorized(_))
    ));

    // Old password dead, new password live.
    assert!(matches!(
        h.service
            .login("trader@example.com", "s3cret-passphrase", client_ip(), "CLI")
            .await,
        Err(AuthError::Unauthorized(_))
    ));
    h.service
        .login("trader@example.com", "new-passphrase", client_ip(), "CLI")
        .await
        .expect("login with the new password should succeed");

    // The reset session was consumed: the same token fails now.
    let result = h
        .service
        .reset_password(user_id, reset_session_id, "another-passphrase")
        .await;
    assert!(matches!(result, Err(AuthError::Unauthorized(_))));
}

#[tokio::test]
async fn test_reset_password_clears_login_attempts() {
    let h = harness();
    let (user, _) = register_user(&h, "trader@example.com", "s3cret-passphrase").await;

    h.attempts.set_count(user.user_id(), 15).unwrap();

    h.service
        .send_reset_password_link(client_ip(), "trader@example.com")
        .await
        .unwrap();
    let token = latest_reset_token(&h.email);
    let (user_id, reset_session_id) = h.service.verify_reset_token(&token).unwrap();

    h.service
        .reset_password(user_id, reset_session_id, "new-passphrase")
        .await
        .unwrap();

    assert_eq!(h.attempts.count(user.user_id()).unwrap(), 0);
}

#[tokio::test]
async fn test_reset_link_cooldown_and_unknown_email() {
    let h = harness();
    register_user(&h, "trader@example.com", "s3cret-passphrase").await;

    h.service
        .send_reset_password_link(client_ip(), "trader@example.com")
        .await
        .unwrap();

    let second = h
        .service
        .send_reset_password_link(client_ip(), "trader@example.com")
        .await;
    assert!(matches!(second, Err(AuthError::TooManyRequests(_))));

    let unknown = h
        .service
        .send_reset_password_link(client_ip(), "nobody@example.com")
        .await;
    assert!(matches!(unknown, Err(AuthError::NotFound(_))));
}

#[tokio::test]
async fn test_reset_link_silent_for_blocked_user() {
    let h = harness();
    let (user, _) = register_user(&h, "trader@example.com", "s3cret-passphrase").await;

    h.service.block_user(user.user_id()).await.unwrap();
    let emails_before = h.email.sent().len();

    // Success without an email: account state must not leak.
    h.service
        .send_reset_password_link(client_ip(), "trader@example.com")
        .await
        .expect("blocked users get a silent success");
    assert_eq!(h.email.sent().len(), emails_before);
}

#[tokio::test]
async fn test_reset_session_mismatch_is_rejected() {
    let h = harness();
    let (user, _) = register_user(&h, "trader@example.com", "s3cret-passphrase").await;

    h.service
        .send_reset_password_link(client_ip(), "trader@example.com")
        .await
        .unwrap();

    // A forged reset-session id must not redeem the stored entry.
    let result = h
        .service
        .reset_password(
            user.user_id(),
            tradelog_auth::state::SessionId::new(),
            "new-passphrase",
        )
        .await;
    assert!(matches!(result, Err(AuthError::Unauthorized(_))));

    // The mismatch consumed the entry (atomic take): the legitimate token
    // now fails too, forcing a fresh link.
    let sent_token = latest_reset_token(&h.email);
    let (user_id, reset_session_id) = h.service.verify_reset_token(&sent_token).unwrap();
    let result = h
        .service
        .reset_password(user_id, reset_session_id, "new-passphrase")
        .await;
    assert!(matches!(result, Err(AuthError::Unauthorized(_))));
}
