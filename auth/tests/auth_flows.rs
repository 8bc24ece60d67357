//! Session lifecycle integration tests over the mock providers.

mod common;

use common::{client_ip, harness, register_user, seed_otp};
use tradelog_auth::error::AuthError;
use tradelog_auth::guard::TokenMode;
use tradelog_auth::state::{SessionId, SessionMarkers, SessionRecord, UserId};

#[tokio::test]
async fn test_register_then_authenticate() {
    let h = harness();

    let (user, pair) = register_user(&h, "trader@example.com", "s3cret-passphrase").await;
    assert_eq!(user.email, "trader@example.com");

    let context = h
        .service
        .authenticate(&pair.access_token, TokenMode::Access)
        .await
        .expect("fresh access token should authenticate");
    assert_eq!(context.user.user_id, user.user_id());

    // The refresh token passes only the refresh-mode check.
    assert!(matches!(
        h.service
            .authenticate(&pair.refresh_token, TokenMode::Access)
            .await,
        Err(AuthError::Unauthorized(_))
    ));
    h.service
        .authenticate(&pair.refresh_token, TokenMode::Refresh)
        .await
        .expect("refresh token should pass the refresh-mode check");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts_without_partial_state() {
    let h = harness();

    let (user, _) = register_user(&h, "trader@example.com", "s3cret-passphrase").await;
    let sessions_before = h.sessions.live_sessions(user.user_id()).unwrap().len();

    // A fresh, valid OTP so the second attempt reaches the user store.
    seed_otp(&h, "trader@example.com", "1234").await;
    let result = h
        .service
        .register(
            "trader@example.com",
            "other-passphrase",
            "1234",
            client_ip(),
            "Chrome on macOS",
        )
        .await;

    assert!(matches!(result, Err(AuthError::Conflict(_))));
    assert_eq!(h.users.user_count().unwrap(), 1);
    assert_eq!(
        h.sessions.live_sessions(user.user_id()).unwrap().len(),
        sessions_before,
        "a rejected registration must not leave session state behind"
    );
}

#[tokio::test]
async fn test_login_wrong_password_and_unknown_user() {
    let h = harness();
    let (user, _) = register_user(&h, "trader@example.com", "s3cret-passphrase").await;

    assert!(matches!(
        h.service
            .login("trader@example.com", "wrong", client_ip(), "CLI")
            .await,
        Err(AuthError::Unauthorized(_))
    ));
    assert_eq!(h.attempts.count(user.user_id()).unwrap(), 1);

    assert!(matches!(
        h.service
            .login("nobody@example.com", "whatever", client_ip(), "CLI")
            .await,
        Err(AuthError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_login_throttled_even_with_correct_password() {
    let h = harness();
    let (user, _) = register_user(&h, "trader@example.com", "s3cret-passphrase").await;

    h.attempts.set_count(user.user_id(), 20).unwrap();

    let result = h
        .service
        .login("trader@example.com", "s3cret-passphrase", client_ip(), "CLI")
        .await;
    assert!(matches!(result, Err(AuthError::TooManyRequests(_))));

    // Under the cap the login succeeds and the counter resets.
    h.attempts.set_count(user.user_id(), 5).unwrap();
    h.service
        .login("trader@example.com", "s3cret-passphrase", client_ip(), "CLI")
        .await
        .expect("login under the cap should succeed");
    assert_eq!(h.attempts.count(user.user_id()).unwrap(), 0);
}

#[tokio::test]
async fn test_session_cap_invalidates_exactly_one() {
    let h = harness();
    let (user, first_pair) = register_user(&h, "trader@example.com", "s3cret-passphrase").await;

    let mut pairs = vec![first_pair];
    for i in 0..5 {
        let (_, pair) = h
            .service
            .login(
                "trader@example.com",
                "s3cret-passphrase",
                client_ip(),
                &format!("Device {i}"),
            )
            .await
            .expect("login should succeed");
        pairs.push(pair);
    }

    assert_eq!(
        h.sessions.live_sessions(user.user_id()).unwrap().len(),
        5,
        "the sixth session must push the count back to the cap"
    );

    let mut valid = 0;
    for pair in &pairs {
        if h.service
            .authenticate(&pair.access_token, TokenMode::Access)
            .await
            .is_ok()
        {
            valid += 1;
        }
    }
    assert_eq!(valid, 5, "exactly one of six token pairs must stop validating");
}

#[tokio::test]
async fn test_prune_picks_oldest_by_refreshed_at() {
    use tradelog_auth::providers::SessionStore;

    let h = harness();
    let user_id = UserId(1);

    let mut oldest = None;
    for i in 0..6i64 {
        let session_id = SessionId::new();
        let mut record = SessionRecord::new(
            user_id,
            session_id,
            SessionMarkers::new(),
            1_700_000_000 + i,
            "203.0.113.7".to_string(),
            "-,-".to_string(),
            format!("Device {i}"),
        );
        record.refreshed_at = 1_700_000_000 + i;
        assert!(h.sessions.create_session(&record).await.unwrap());

        if i == 0 {
            oldest = Some(session_id);
        }
    }

    let pruned = h
        .sessions
        .prune_sessions(user_id, 5, 0, 1_700_000_100)
        .await
        .unwrap();

    assert_eq!(pruned, vec![oldest.unwrap()]);
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let h = harness();
    let (_, pair) = register_user(&h, "trader@example.com", "s3cret-passphrase").await;

    let context = h
        .service
        .authenticate(&pair.access_token, TokenMode::Access)
        .await
        .unwrap();

    h.service
        .logout(context.user.user_id, context.session_id)
        .await
        .unwrap();

    assert!(matches!(
        h.service
            .authenticate(&pair.access_token, TokenMode::Access)
            .await,
        Err(AuthError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_refresh_rotates_markers() {
    let h = harness();
    let (user, pair) = register_user(&h, "trader@example.com", "s3cret-passphrase").await;

    let context = h
        .service
        .authenticate(&pair.refresh_token, TokenMode::Refresh)
        .await
        .unwrap();

    let new_pair = h
        .service
        .refresh_token(user.user_id(), context.session_id)
        .await
        .unwrap();

    // The new pair is live; both halves of the old pair are stale.
    h.service
        .authenticate(&new_pair.access_token, TokenMode::Access)
        .await
        .expect("rotated access token should validate");
    assert!(matches!(
        h.service
            .authenticate(&pair.access_token, TokenMode::Access)
            .await,
        Err(AuthError::Unauthorized(_))
    ));
    assert!(matches!(
        h.service
            .authenticate(&pair.refresh_token, TokenMode::Refresh)
            .await,
        Err(AuthError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_concurrent_refresh_serializes_to_one_current_pair() {
    let h = harness();
    let (user, pair) = register_user(&h, "trader@example.com", "s3cret-passphrase").await;

    let context = h
        .service
        .authenticate(&pair.refresh_token, TokenMode::Refresh)
        .await
        .unwrap();

    let service2 = h.service.clone();
    let (a, b) = tokio::join!(
        h.service.refresh_token(user.user_id(), context.session_id),
        service2.refresh_token(user.user_id(), context.session_id),
    );

    let pair_a = a.expect("serialized refresh should succeed");
    let pair_b = b.expect("serialized refresh should succeed");

    let a_valid = h
        .service
        .authenticate(&pair_a.access_token, TokenMode::Access)
        .await
        .is_ok();
    let b_valid = h
        .service
        .authenticate(&pair_b.access_token, TokenMode::Access)
        .await
        .is_ok();

    assert!(
        a_valid ^ b_valid,
        "exactly one refresh may own the current marker pair"
    );
}

#[tokio::test]
async fn test_block_user_invalidates_immediately() {
    let h = harness();
    let (user, pair) = register_user(&h, "trader@example.com", "s3cret-passphrase").await;

    h.service
        .authenticate(&pair.access_token, TokenMode::Access)
        .await
        .expect("token should validate before the block");

    h.service.block_user(user.user_id()).await.unwrap();

    assert!(matches!(
        h.service
            .authenticate(&pair.access_token, TokenMode::Access)
            .await,
        Err(AuthError::Unauthorized(_))
    ));
    assert!(h.sessions.live_sessions(user.user_id()).unwrap().is_empty());
}

#[tokio::test]
async fn test_heartbeat_updates_but_never_recreates() {
    let h = harness();
    let (user, pair) = register_user(&h, "trader@example.com", "s3cret-passphrase").await;

    use tradelog_auth::providers::SessionCache;

    let context = h
        .service
        .authenticate(&pair.access_token, TokenMode::Access)
        .await
        .unwrap();
    let session_id = context.session_id;

    // Without a mirror entry the heartbeat must refuse rather than recreate.
    h.cache
        .invalidate_session(user.user_id(), session_id)
        .await
        .unwrap();
    assert!(matches!(
        h.service.heartbeat(user.user_id(), session_id, client_ip()).await,
        Err(AuthError::Unauthorized(_))
    ));

    // Authenticated traffic repopulates the mirror; now the heartbeat lands.
    h.service
        .authenticate(&pair.access_token, TokenMode::Access)
        .await
        .unwrap();
    h.service
        .heartbeat(user.user_id(), session_id, client_ip())
        .await
        .expect("heartbeat against a cached session should succeed");

    let stored = h
        .sessions
        .stored_session(user.user_id(), session_id)
        .unwrap()
        .unwrap();
    assert!(stored.last_online > 0);
    assert_eq!(stored.last_ip, client_ip().to_string());
}
