use anyhow::{anyhow, Result};

/// ClickHouse database/table names are interpolated into DDL, so only plain
/// identifiers are accepted.
pub fn validate_identifier(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("{} is empty", field));
    }
    let mut chars = value.chars();
    let starts_ok = chars
        .next()
        .map(|ch| ch.is_ascii_alphabetic() || ch == '_')
        .unwrap_or(false);
    if !starts_ok || !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(anyhow!("{} must be a plain identifier, got '{}'", field, value));
    }
    Ok(())
}
