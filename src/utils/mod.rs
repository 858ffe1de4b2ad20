//! Small helpers shared by the domain modules.

/// Display text used when an optional book field is absent.
pub const UNKNOWN: &str = "Unknown";

/// Trim `value`, mapping empty or whitespace-only text to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Display an optional field, falling back to [`UNKNOWN`].
pub fn or_unknown(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(UNKNOWN)
}
