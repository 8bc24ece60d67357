//! Collaborator traits.
//!
//! Every external dependency of the orchestrator sits behind one of these
//! traits so the auth logic is testable at memory speed: production wires
//! the Redis/PostgreSQL/SMTP implementations from [`crate::stores`] and
//! sibling modules here, tests wire [`crate::mocks`].

pub mod email;
pub mod geo;
pub mod http_geo;
pub mod lock;
pub mod login_attempts;
pub mod otp_store;
pub mod reset_store;
pub mod session_cache;
pub mod session_store;
pub mod smtp_email;
pub mod user_store;

pub use email::EmailSender;
pub use geo::{GeoLocator, NullGeoLocator};
pub use http_geo::HttpGeoLocator;
pub use lock::SessionLock;
pub use login_attempts::LoginAttempts;
pub use otp_store::OtpStore;
pub use reset_store::ResetStore;
pub use session_cache::SessionCache;
pub use session_store::SessionStore;
pub use smtp_email::SmtpEmailSender;
pub use user_store::UserStore;
