//! Sensitive key names.

/// Substrings that mark a key as sensitive (compared lowercase).
pub const SENSITIVE_KEY_FRAGMENTS: &[&str] = &["password", "token", "api_key", "apikey", "secret"];

/// True if `key` contains a sensitive fragment, ignoring case.
pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_KEY_FRAGMENTS
        .iter()
        .any(|fragment| lower.contains(fragment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_case_insensitively() {
        assert!(is_sensitive_key("password"));
        assert!(is_sensitive_key("DB_PASSWORD"));
        assert!(is_sensitive_key("accessToken"));
        assert!(is_sensitive_key("OPENPROJECT_API_KEY"));
        assert!(is_sensitive_key("client_secret"));
    }

    #[test]
    fn ordinary_keys_pass() {
        assert!(!is_sensitive_key("project_id"));
        assert!(!is_sensitive_key("subject"));
        assert!(!is_sensitive_key("custom_data"));
    }
}
