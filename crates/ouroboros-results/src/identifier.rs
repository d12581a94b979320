//! Namespace (table name) validation and quoting.
//!
//! The namespace is spliced into SQL text as an identifier, so it is checked
//! once at construction and quoted on every use.

use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

use crate::{ResultError, Result};

/// Quotes a SQL identifier.
///
/// Handles schema-qualified names by quoting each part separately.
pub fn quote_identifier(name: &str) -> String {
    name.split('.')
        .map(|part| format!("\"{}\"", part))
        .collect::<Vec<_>>()
        .join(".")
}

/// Validates a namespace: a table name, optionally schema-qualified
/// (e.g. "jobs.results").
pub fn validate_namespace(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid("Namespace cannot be empty".to_string()));
    }

    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 {
        return Err(invalid(format!(
            "Invalid namespace '{}': must be 'table' or 'schema.table'",
            name
        )));
    }

    for part in parts {
        validate_identifier_part(part)?;
    }
    Ok(())
}

/// PostgreSQL identifier limit in bytes
const MAX_IDENTIFIER_LEN: usize = 63;

/// Index name derived from the namespace, kept under the 63-byte limit.
///
/// Names that would not fit keep a prefix of the table name followed by a
/// hash of the full namespace, so long namespaces never truncate into the
/// table's own name or into each other.
pub fn expiry_index_name(name: &str) -> String {
    let table = name.rsplit('.').next().unwrap_or(name);
    let index = format!("{}_expires_at_idx", table);
    if index.len() <= MAX_IDENTIFIER_LEN {
        return index;
    }

    let digest = Sha256::digest(name.as_bytes());
    let hash = digest[..4].iter().map(|b| format!("{:02x}", b)).collect::<String>();
    let suffix = format!("_{}_exp_idx", hash);

    let mut cut = MAX_IDENTIFIER_LEN - suffix.len();
    while !table.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{}", &table[..cut], suffix)
}

fn validate_identifier_part(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid("Namespace part cannot be empty".to_string()));
    }

    // Normalize to NFKC to catch Unicode confusables
    let normalized = name.nfkc().collect::<String>();
    if normalized != name {
        return Err(invalid(format!(
            "Namespace part '{}' is not in normalized form",
            name
        )));
    }

    // PostgreSQL limit is 63 bytes per part
    if name.len() > 63 {
        return Err(invalid(format!(
            "Namespace part '{}' exceeds maximum length of 63",
            name
        )));
    }

    let first_char = name
        .chars()
        .next()
        .ok_or_else(|| invalid(format!("Namespace part '{}' is empty", name)))?;
    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(invalid(format!(
            "Namespace part '{}' must start with a letter or underscore",
            name
        )));
    }

    if let Some(ch) = name.chars().find(|ch| !ch.is_ascii_alphanumeric() && *ch != '_') {
        return Err(invalid(format!(
            "Namespace part '{}' contains invalid character '{}'",
            name, ch
        )));
    }

    let lower = name.to_lowercase();
    if lower.starts_with("pg_") || lower == "information_schema" {
        return Err(invalid(format!(
            "Namespace part '{}' refers to a system catalog",
            name
        )));
    }

    const SQL_KEYWORDS: &[&str] = &[
        "select", "insert", "update", "delete", "drop", "create", "alter",
        "truncate", "grant", "revoke", "table", "index", "view", "schema",
        "database", "user", "role", "from", "where", "join", "on", "and",
        "or", "not", "null", "true", "false", "order", "group", "limit",
    ];
    if SQL_KEYWORDS.contains(&lower.as_str()) {
        return Err(invalid(format!(
            "Namespace part '{}' is a reserved SQL keyword",
            name
        )));
    }

    Ok(())
}

fn invalid(message: String) -> ResultError {
    ResultError::Configuration(message)
}
