//! Email templates and expiry formatting.
//!
//! Templates are plain string substitution; delivery mechanics live behind
//! [`crate::providers::EmailSender`].

use chrono::{DateTime, FixedOffset};

/// Reset-password email subject and body.
#[must_use]
pub fn reset_password_email(reset_link: &str, expiry: &str) -> (String, String) {
    let subject = "Reset Your Password".to_string();
    let body = format!(
        "Hello,\n\n\
         We received a request to reset your password. You can reset your \
         password by clicking on the link below:\n{reset_link}\n\n\
         If you did not request a password reset, you can safely ignore this \
         email.\nThis link will expire on {expiry}.\n"
    );

    (subject, body)
}

/// OTP email subject and body.
#[must_use]
pub fn otp_email(code: &str, expiry: &str) -> (String, String) {
    let subject = "Your One-Time Password (OTP)".to_string();
    let body = format!(
        "Hello,\n\n\
         Your One-Time Password (OTP) is: {code}\n\n\
         Please use this OTP to complete your request.\n\
         This OTP will expire on {expiry}.\n\n\
         If you did not request this OTP, please ignore this message.\n"
    );

    (subject, body)
}

/// Render an epoch-second timestamp in the requester's timezone.
///
/// `tz_offset` is `"+HH:MM"`/`"-HH:MM"` (a bare `"HH:MM"` is treated as
/// east of UTC); anything unparsable falls back to UTC.
#[must_use]
pub fn format_expiry(timestamp: i64, tz_offset: &str) -> String {
    let Some(utc) = DateTime::from_timestamp(timestamp, 0) else {
        return timestamp.to_string();
    };

    match parse_offset(tz_offset) {
        Some(offset) => utc
            .with_timezone(&offset)
            .format("%Y-%m-%d %H:%M:%S (UTC%:z)")
            .to_string(),
        None => utc.format("%Y-%m-%d %H:%M:%S (UTC%:z)").to_string(),
    }
}

fn parse_offset(tz_offset: &str) -> Option<FixedOffset> {
    let (sign, rest) = match tz_offset.as_bytes().first() {
        Some(b'-') => (-1, &tz_offset[1..]),
        Some(b'+') => (1, &tz_offset[1..]),
        _ => (1, tz_offset),
    };

    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_substitute_values() {
        let (subject, body) = otp_email("0420", "2026-01-01 10:00:00 (UTC+08:00)");
        assert_eq!(subject, "Your One-Time Password (OTP)");
        assert!(body.contains("0420"));
        assert!(body.contains("2026-01-01 10:00:00"));

        let (subject, body) =
            reset_password_email("https://app.tradelog.dev/reset?token=abc", "soon");
        assert_eq!(subject, "Reset Your Password");
        assert!(body.contains("https://app.tradelog.dev/reset?token=abc"));
    }

    #[test]
    fn test_format_expiry_applies_offset() {
        // 2024-01-01T00:00:00Z at +08:00 renders as 08:00 local.
        let rendered = format_expiry(1_704_067_200, "+08:00");
        assert!(rendered.starts_with("2024-01-01 08:00:00"), "{rendered}");

        let bare = format_expiry(1_704_067_200, "08:00");
        assert_eq!(bare, rendered);
    }

    #[test]
    fn test_format_expiry_degrades_to_utc() {
        let rendered = format_expiry(1_704_067_200, "-");
        assert!(rendered.starts_with("2024-01-01 00:00:00"), "{rendered}");

        let rendered = format_expiry(1_704_067_200, "00:00");
        assert!(rendered.starts_with("2024-01-01 00:00:00"), "{rendered}");
    }
}
