// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Custom Test Assertions
//!
//! Domain-specific assertion helpers with informative failure messages.

use axum::http::StatusCode;
use gauth_core::AuditLog;
use serde_json::Value;

use super::harness::TestResponse;

/// Field names that must never appear in a serialized user.
pub const SECRET_FIELDS: [&str; 3] = ["password", "password_hash", "deleted_at"];

// =============================================================================
// Response Assertions
// =============================================================================

/// Assertion extensions for [`TestResponse`].
pub trait ResponseAssertions {
    /// Assert an error response with the given status and message.
    fn assert_error(&self, status: StatusCode, message: &str);

    /// Assert a `{"message": ...}` success body.
    fn assert_message(&self, message: &str);
}

impl ResponseAssertions for TestResponse {
    fn assert_error(&self, status: StatusCode, message: &str) {
        self.assert_status(status);
        assert_eq!(
            self.error_message(),
            message,
            "Unexpected error message for {}",
            status
        );
    }

    fn assert_message(&self, message: &str) {
        self.assert_status(StatusCode::OK);
        assert_eq!(self.json()["message"], message);
    }
}

// =============================================================================
// User Assertions
// =============================================================================

/// Asserts that no object in `value` carries a secret field, recursively.
pub fn assert_no_secret_fields(value: &Value) {
    match value {
        Value::Object(map) => {
            for field in SECRET_FIELDS {
                assert!(
                    !map.contains_key(field),
                    "Serialized user leaks '{}': {}",
                    field,
                    value
                );
            }
            map.values().for_each(assert_no_secret_fields);
        }
        Value::Array(items) => items.iter().for_each(assert_no_secret_fields),
        _ => {}
    }
}

/// Asserts that a serialized user carries exactly the given role names.
pub fn assert_role_names(user: &Value, expected: &[&str]) {
    let mut names: Vec<&str> = user["roles"]
        .as_array()
        .unwrap_or_else(|| panic!("User has no roles array: {}", user))
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    names.sort_unstable();

    let mut expected = expected.to_vec();
    expected.sort_unstable();
    assert_eq!(names, expected, "Unexpected roles on {}", user["username"]);
}

// =============================================================================
// Audit Assertions
// =============================================================================

/// Returns the records for one method and path.
pub fn audit_records_for<'a>(entries: &'a [AuditLog], method: &str, path: &str) -> Vec<&'a AuditLog> {
    entries
        .iter()
        .filter(|e| e.action == method && e.resource == path)
        .collect()
}

/// Asserts exactly one record for `method path` and returns it.
pub fn assert_single_audit<'a>(entries: &'a [AuditLog], method: &str, path: &str) -> &'a AuditLog {
    let matching = audit_records_for(entries, method, path);
    assert_eq!(
        matching.len(),
        1,
        "Expected one audit record for {} {}, found {}",
        method,
        path,
        matching.len()
    );
    matching[0]
}

/// Asserts an audit record's recorded status and success flag agree.
pub fn assert_audit_status(entry: &AuditLog, status: StatusCode) {
    assert_eq!(
        entry.status_code(),
        Some(status.as_u16()),
        "Unexpected audited status for {} {}",
        entry.action,
        entry.resource
    );
    assert_eq!(entry.success, status.as_u16() < 400);
}
