//! # Authgate (Authentication Gateway)
//!
//! `authgate` is the trust boundary in front of an authentication domain
//! service. It accepts untrusted login, registration and admin-check requests,
//! validates them before any domain logic runs, forwards validated commands to
//! the domain, and answers with a small, stable set of outcome codes.
//!
//! ## Outcomes
//!
//! - **`ok`:** the domain call succeeded; the body carries the payload.
//! - **`invalid_argument`:** the request was rejected before the domain was
//!   invoked. Every violated field is listed as `{field, rule, message}`.
//! - **`internal`:** the domain failed. Why it failed (unknown email, wrong
//!   password, duplicate user, storage fault) is never revealed to callers, so
//!   "email not found" and "wrong password" are indistinguishable.
//! - **`cancelled` / `deadline_exceeded`:** the caller's context ended while
//!   the domain call was in flight.
//!
//! ## Domain Contract
//!
//! The gateway holds a single [`domain::Auth`] implementation for its whole
//! lifetime. [`domain::RemoteAuth`] forwards to an upstream HTTP service; tests
//! substitute their own implementations.

pub mod api;
pub mod cli;
pub mod domain;
pub mod gateway;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
