//! # Tradelog Authentication Engine
//!
//! Session and credential lifecycle management backed by PostgreSQL (source
//! of truth) and Redis (authoritative-for-reads session cache).
//!
//! ## Features
//!
//! - **Marker-based rotation**: tokens embed opaque `access_id`/`refresh_id`
//!   nonces mirrored in storage; a stale or replayed token is detected by id
//!   mismatch without storing the token itself.
//! - **Atomic cache updates**: OTP state and counters are mutated through a
//!   single server-side conditional script, never client-side check-then-act.
//! - **Race-free issuance**: token generation runs under a short-TTL
//!   per-user distributed lock with scoped acquire/release.
//! - **Testable**: every external collaborator sits behind a trait with an
//!   in-memory mock, so the orchestrator runs at memory speed in tests.
//!
//! ## Architecture
//!
//! ```text
//! handlers → AuthService → AuthRepository → { PostgreSQL, Redis }
//!                        → OtpStore / LoginAttempts / ResetStore / SessionLock
//!                        → EmailSender / GeoLocator
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod config;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod guard;
pub mod mocks;
pub mod providers;
pub mod repository;
pub mod service;
pub mod state;
pub mod stores;
pub mod templates;
pub mod token;

// Re-export main types for convenience
pub use config::AuthConfig;
pub use error::{AuthError, Result};
pub use guard::{AuthContext, TokenMode};
pub use repository::AuthRepository;
pub use service::AuthService;
pub use state::{OtpKind, SessionId, TokenPair, User, UserId, UserInfo};
pub use token::TokenSigner;
