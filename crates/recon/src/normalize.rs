//! Canonical forms for name comparison.

/// Uppercase and trim. Empty input yields an empty key.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Split on whitespace, preserving order.
pub fn tokenize(full_name: &str) -> Vec<String> {
    full_name.split_whitespace().map(str::to_string).collect()
}

/// Normalized tokens of a name.
pub fn name_tokens(raw: &str) -> Vec<String> {
    tokenize(&normalize(raw))
}
