//! Write-time enforcement of the document shapes
//!
//! Payloads are checked against [`USER_SHAPE`] and [`MESSAGE_SHAPE`]: string
//! fields are trimmed where declared, required fields must be present and
//! non-empty, pattern rules must match, and defaults fill the gaps. Every
//! violation is collected so the caller sees all of them at once.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Message, NewMessage, NewUser, UpdateUser, User};
use crate::schema::{DefaultValue, Field, MESSAGE_SHAPE, MatchRule, Shape, USER_SHAPE};

/// What a field violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Required,
    Format,
}

/// A single failed constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Dotted path, e.g. `email` or `messages.2.content`
    pub path: String,
    pub kind: ViolationKind,
    pub message: &'static str,
}

/// Rejected write, carrying every violation found
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} validation failed: {}", .shape, summarize(.violations))]
pub struct ValidationError {
    pub shape: &'static str,
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Violation reported for `path`, if any
    pub fn violation(&self, path: &str) -> Option<&FieldViolation> {
        self.violations.iter().find(|v| v.path == path)
    }

    /// Declared message for `path`, if it was violated
    pub fn message_for(&self, path: &str) -> Option<&'static str> {
        self.violation(path).map(|v| v.message)
    }
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.path, v.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate email against the declared pattern
pub fn validate_email(email: &str) -> Result<(), String> {
    let rule = USER_SHAPE
        .field("email")
        .and_then(|field| field.matches)
        .ok_or_else(|| "User shape declares no email pattern".to_string())?;

    if email.is_empty() || !pattern_matches(&rule, email) {
        return Err(rule.message.to_string());
    }

    Ok(())
}

fn pattern_matches(rule: &MatchRule, value: &str) -> bool {
    static PATTERNS: OnceLock<Mutex<HashMap<&'static str, Regex>>> = OnceLock::new();

    let mut patterns = PATTERNS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    let regex = patterns.entry(rule.pattern).or_insert_with(|| {
        Regex::new(rule.pattern).expect("Failed to compile declared field pattern")
    });

    regex.is_match(value)
}

/// Validate a creation payload and build the user document.
///
/// Defaults declared on [`USER_SHAPE`] apply to absent flags, embedded
/// messages default their `createdAt` to `now`, and a fresh `_id` is assigned.
pub fn validate_new_user(payload: NewUser, now: DateTime<Utc>) -> Result<User, ValidationError> {
    let mut report = Report::new(&USER_SHAPE);

    let username = report.string("username", payload.username);
    let email = report.string("email", payload.email);
    let password = report.string("password", payload.password);
    let verify_code = report.string("verifyCode", payload.verify_code);
    let verify_code_expiry = report.value("verifyCodeExpiry", payload.verify_code_expiry);
    let is_verified = report.flag("isVerified", payload.is_verified);
    let is_accepting_message = report.flag("isAcceptingMessage", payload.is_accepting_message);

    let messages: Vec<Message> = payload
        .messages
        .into_iter()
        .enumerate()
        .filter_map(|(index, message)| report.embedded_message(index, message, now))
        .collect();

    match (username, email, password, verify_code, verify_code_expiry) {
        (Some(username), Some(email), Some(password), Some(verify_code), Some(verify_code_expiry))
            if report.is_clean() =>
        {
            Ok(User {
                id: Uuid::new_v4(),
                username,
                email,
                password,
                verify_code,
                verify_code_expiry,
                is_verified,
                is_accepting_message,
                messages,
            })
        }
        _ => Err(report.into_error()),
    }
}

/// Validate a message payload, defaulting `createdAt` to `now`
pub fn validate_new_message(
    payload: NewMessage,
    now: DateTime<Utc>,
) -> Result<Message, ValidationError> {
    let mut report = Report::new(&MESSAGE_SHAPE);
    match report.message(payload, now) {
        Some(message) if report.is_clean() => Ok(message),
        _ => Err(report.into_error()),
    }
}

/// Validate the fields present in an update, leaving absent ones untouched.
///
/// Returns the normalized changes (username trimmed).
pub fn validate_changes(changes: UpdateUser) -> Result<UpdateUser, ValidationError> {
    let mut report = Report::new(&USER_SHAPE);

    let username = changes
        .username
        .map(|value| report.string("username", Some(value)));
    let email = changes.email.map(|value| report.string("email", Some(value)));
    let password = changes
        .password
        .map(|value| report.string("password", Some(value)));
    let verify_code = changes
        .verify_code
        .map(|value| report.string("verifyCode", Some(value)));

    if !report.is_clean() {
        return Err(report.into_error());
    }

    Ok(UpdateUser {
        username: username.flatten(),
        email: email.flatten(),
        password: password.flatten(),
        verify_code: verify_code.flatten(),
        ..changes
    })
}

/// Accumulates violations for one shape
struct Report {
    shape: &'static Shape,
    prefix: String,
    violations: Vec<FieldViolation>,
}

impl Report {
    fn new(shape: &'static Shape) -> Self {
        Self::nested(shape, String::new())
    }

    fn nested(shape: &'static Shape, prefix: String) -> Self {
        Self {
            shape,
            prefix,
            violations: Vec::new(),
        }
    }

    fn field(&self, name: &str) -> Option<&'static Field> {
        let field = self.shape.field(name);
        debug_assert!(
            field.is_some(),
            "{} shape has no field {}",
            self.shape.name,
            name
        );
        field
    }

    fn push(&mut self, field: &Field, kind: ViolationKind, message: &'static str) {
        self.violations.push(FieldViolation {
            path: format!("{}{}", self.prefix, field.name),
            kind,
            message,
        });
    }

    fn string(&mut self, name: &str, value: Option<String>) -> Option<String> {
        let Some(field) = self.field(name) else {
            return value;
        };
        let value = match value {
            Some(value) if field.trim => Some(value.trim().to_string()),
            other => other,
        };

        match value {
            Some(value) if !value.is_empty() => {
                if let Some(rule) = field.matches {
                    if !pattern_matches(&rule, &value) {
                        self.push(field, ViolationKind::Format, rule.message);
                        return None;
                    }
                }
                Some(value)
            }
            // Empty strings count as missing for required fields
            Some(value) if field.required.is_none() => Some(value),
            _ => {
                if let Some(message) = field.required {
                    self.push(field, ViolationKind::Required, message);
                }
                None
            }
        }
    }

    fn value<T>(&mut self, name: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            if let Some(field) = self.field(name) {
                if let Some(message) = field.required {
                    self.push(field, ViolationKind::Required, message);
                }
            }
        }
        value
    }

    fn flag(&self, name: &str, value: Option<bool>) -> bool {
        match (value, self.field(name).map(|field| field.default)) {
            (Some(value), _) => value,
            (None, Some(DefaultValue::Bool(default))) => default,
            (None, _) => false,
        }
    }

    fn timestamp(
        &mut self,
        name: &str,
        value: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let value = match (value, self.field(name).map(|field| field.default)) {
            (None, Some(DefaultValue::Now)) => Some(now),
            (value, _) => value,
        };
        self.value(name, value)
    }

    fn message(&mut self, payload: NewMessage, now: DateTime<Utc>) -> Option<Message> {
        let content = self.string("content", payload.content);
        let created_at = self.timestamp("createdAt", payload.created_at, now);
        Some(Message {
            content: content?,
            created_at: created_at?,
        })
    }

    fn embedded_message(
        &mut self,
        index: usize,
        payload: NewMessage,
        now: DateTime<Utc>,
    ) -> Option<Message> {
        let mut nested = Report::nested(&MESSAGE_SHAPE, format!("messages.{}.", index));
        let message = nested.message(payload, now);
        self.absorb(nested);
        message
    }

    fn absorb(&mut self, other: Report) {
        self.violations.extend(other.violations);
    }

    fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    fn into_error(self) -> ValidationError {
        ValidationError {
            shape: self.shape.name,
            violations: self.violations,
        }
    }
}
