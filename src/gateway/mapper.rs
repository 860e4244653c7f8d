//! Wire request shapes and their validated command counterparts.
//!
//! Mapping never touches the domain. Every field is checked, and all
//! violations are reported together in field-declaration order.

use super::validation::{
    MIN_PASSWORD_LENGTH, valid_application_id, valid_email, valid_password, valid_user_id,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub app_id: i32,
}

#[derive(ToSchema, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default)]
pub struct IsAdminRequest {
    pub user_id: i64,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .field("app_id", &self.app_id)
            .finish()
    }
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug)]
pub struct LoginCommand {
    pub email: String,
    pub password: SecretString,
    pub app_id: i32,
}

#[derive(Debug)]
pub struct RegisterCommand {
    pub email: String,
    pub password: SecretString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminCheckQuery {
    pub user_id: i64,
}

#[derive(ToSchema, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Email,
    Password,
    AppId,
    UserId,
}

impl Field {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Password => "password",
            Self::AppId => "app_id",
            Self::UserId => "user_id",
        }
    }
}

#[derive(ToSchema, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Required,
    Email,
    MinLength,
    Positive,
}

/// One violated rule on one field. The message is safe to show to callers.
#[derive(ToSchema, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: Field,
    pub rule: Rule,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid request: {}", join_messages(.violations))]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    #[must_use]
    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}

fn join_messages(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Default)]
struct Violations(Vec<Violation>);

impl Violations {
    fn push(&mut self, field: Field, rule: Rule, message: String) {
        self.0.push(Violation {
            field,
            rule,
            message,
        });
    }

    // First failing rule per field wins; `required` is always checked first.
    fn email(&mut self, email: &str) {
        if email.is_empty() {
            self.push(Field::Email, Rule::Required, "email is required".to_string());
        } else if !valid_email(email) {
            self.push(
                Field::Email,
                Rule::Email,
                "email must be a valid email address".to_string(),
            );
        }
    }

    fn password(&mut self, password: &str) {
        if password.is_empty() {
            self.push(
                Field::Password,
                Rule::Required,
                "password is required".to_string(),
            );
        } else if !valid_password(password) {
            self.push(
                Field::Password,
                Rule::MinLength,
                format!("password must be at least {MIN_PASSWORD_LENGTH} characters"),
            );
        }
    }

    fn app_id(&mut self, app_id: i32) {
        if app_id == 0 {
            self.push(Field::AppId, Rule::Required, "app_id is required".to_string());
        } else if !valid_application_id(app_id) {
            self.push(
                Field::AppId,
                Rule::Positive,
                "app_id must be greater than zero".to_string(),
            );
        }
    }

    fn user_id(&mut self, user_id: i64) {
        if !valid_user_id(user_id) {
            self.push(
                Field::UserId,
                Rule::Required,
                "user_id is required".to_string(),
            );
        }
    }

    fn finish<T>(self, build: impl FnOnce() -> T) -> Result<T, ValidationError> {
        if self.0.is_empty() {
            Ok(build())
        } else {
            Err(ValidationError { violations: self.0 })
        }
    }
}

impl TryFrom<&LoginRequest> for LoginCommand {
    type Error = ValidationError;

    fn try_from(request: &LoginRequest) -> Result<Self, Self::Error> {
        let mut violations = Violations::default();
        violations.email(&request.email);
        violations.password(&request.password);
        violations.app_id(request.app_id);

        violations.finish(|| Self {
            email: request.email.clone(),
            password: SecretString::from(request.password.clone()),
            app_id: request.app_id,
        })
    }
}

impl TryFrom<&RegisterRequest> for RegisterCommand {
    type Error = ValidationError;

    fn try_from(request: &RegisterRequest) -> Result<Self, Self::Error> {
        let mut violations = Violations::default();
        violations.email(&request.email);
        violations.password(&request.password);

        violations.finish(|| Self {
            email: request.email.clone(),
            password: SecretString::from(request.password.clone()),
        })
    }
}

impl TryFrom<&IsAdminRequest> for AdminCheckQuery {
    type Error = ValidationError;

    fn try_from(request: &IsAdminRequest) -> Result<Self, Self::Error> {
        let mut violations = Violations::default();
        violations.user_id(request.user_id);

        violations.finish(|| Self {
            user_id: request.user_id,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn login(email: &str, password: &str, app_id: i32) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            app_id,
        }
    }

    fn fields(err: &ValidationError) -> Vec<(Field, Rule)> {
        err.violations().iter().map(|v| (v.field, v.rule)).collect()
    }

    #[test]
    fn test_login_valid() {
        let command = LoginCommand::try_from(&login("a@b.com", "longenough1", 3)).unwrap();
        assert_eq!(command.email, "a@b.com");
        assert_eq!(command.password.expose_secret(), "longenough1");
        assert_eq!(command.app_id, 3);
    }

    #[test]
    fn test_login_collects_every_violation_in_order() {
        let err = LoginCommand::try_from(&login("not-an-email", "short", 0)).unwrap_err();
        assert_eq!(
            fields(&err),
            vec![
                (Field::Email, Rule::Email),
                (Field::Password, Rule::MinLength),
                (Field::AppId, Rule::Required),
            ]
        );
        assert_eq!(
            err.to_string(),
            "invalid request: email must be a valid email address; password must be at least 8 characters; app_id is required"
        );
    }

    #[test]
    fn test_login_missing_fields() {
        let err = LoginCommand::try_from(&LoginRequest::default()).unwrap_err();
        assert_eq!(
            fields(&err),
            vec![
                (Field::Email, Rule::Required),
                (Field::Password, Rule::Required),
                (Field::AppId, Rule::Required),
            ]
        );
    }

    #[test]
    fn test_login_negative_app_id() {
        let err = LoginCommand::try_from(&login("a@b.com", "longenough1", -1)).unwrap_err();
        assert_eq!(fields(&err), vec![(Field::AppId, Rule::Positive)]);
    }

    #[test]
    fn test_register_valid() {
        let request = RegisterRequest {
            email: "a@b.com".to_string(),
            password: "longenough1".to_string(),
        };
        let command = RegisterCommand::try_from(&request).unwrap();
        assert_eq!(command.email, "a@b.com");
        assert_eq!(command.password.expose_secret(), "longenough1");
    }

    #[test]
    fn test_register_password_only() {
        let request = RegisterRequest {
            email: "a@b.com".to_string(),
            password: "1234567".to_string(),
        };
        let err = RegisterCommand::try_from(&request).unwrap_err();
        assert_eq!(fields(&err), vec![(Field::Password, Rule::MinLength)]);
    }

    #[test]
    fn test_is_admin_accepts_any_user_id() {
        for user_id in [0, -1, 7, i64::MAX] {
            let query = AdminCheckQuery::try_from(&IsAdminRequest { user_id }).unwrap();
            assert_eq!(query.user_id, user_id);
        }
    }

    #[test]
    fn test_mapping_is_idempotent() {
        let request = login("bad@", "", -9);
        let first = LoginCommand::try_from(&request).unwrap_err();
        let second = LoginCommand::try_from(&request).unwrap_err();
        assert_eq!(first, second);
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", login("a@b.com", "hunter2hunter2", 1));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_violation_serializes_snake_case() {
        let err = LoginCommand::try_from(&login("a@b.com", "longenough1", 0)).unwrap_err();
        let json = serde_json::to_value(err.violations()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"field": "app_id", "rule": "required", "message": "app_id is required"}
            ])
        );
    }
}
