//! Field-level predicates applied to raw request values before any domain call.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MIN_PASSWORD_LENGTH: usize = 8;

// Dot-atom local part, and a domain of DNS labels with at least one dot.
static EMAIL_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+)*@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .ok()
});

#[must_use]
pub fn valid_email(email: &str) -> bool {
    !email.is_empty() && EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email))
}

/// Length is counted in characters, so multi-byte passwords are not penalised.
#[must_use]
pub fn valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

#[must_use]
pub const fn valid_application_id(app_id: i32) -> bool {
    app_id > 0
}

/// Any representable user id passes here; existence is checked by the domain.
#[must_use]
pub const fn valid_user_id(_user_id: i64) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(valid_email("a@b.com"));
        assert!(valid_email("first.last+tag@sub.example.org"));
        assert!(valid_email("user_name@example-domain.io"));
    }

    #[test]
    fn test_invalid_email() {
        for email in [
            "",
            "not-an-email",
            "@example.com",
            "user@",
            "user@example",
            "user @example.com",
            "user@@example.com",
            "user@-example.com",
            "user@example..com",
            ".a@b.com",
            "a.@b.com",
            "a..b@b.com",
        ] {
            assert!(!valid_email(email), "{email:?} should be rejected");
        }
    }

    #[test]
    fn test_valid_password() {
        assert!(valid_password("longenough1"));
        assert!(valid_password("12345678"));
        // 8 characters, 16 bytes
        assert!(valid_password("пароль12"));
    }

    #[test]
    fn test_invalid_password() {
        assert!(!valid_password(""));
        assert!(!valid_password("short"));
        assert!(!valid_password("1234567"));
    }

    #[test]
    fn test_application_id() {
        assert!(valid_application_id(1));
        assert!(valid_application_id(i32::MAX));
        assert!(!valid_application_id(0));
        assert!(!valid_application_id(-5));
    }

    #[test]
    fn test_user_id_accepts_everything() {
        for id in [i64::MIN, -1, 0, 7, i64::MAX] {
            assert!(valid_user_id(id));
        }
    }
}
