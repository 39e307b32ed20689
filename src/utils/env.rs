/// Get environment variable with TIDEMARK_ prefix, falling back to unprefixed version
///
/// This helper function checks for `TIDEMARK_{key}` first, then falls back to `{key}`
/// so deployments that already export `REDIS_URL` or `REDIS_HOST` work unchanged.
///
/// # Examples
///
/// ```rust,ignore
/// use crate::utils::get_env_with_prefix;
///
/// // Checks TIDEMARK_REDIS_URL first, then REDIS_URL
/// let url = get_env_with_prefix("REDIS_URL");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("TIDEMARK_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

/// Truncate a string to a maximum number of characters, preserving valid UTF-8.
pub fn truncate_string(s: String, max_chars: usize) -> String {
    if s.len() <= max_chars {
        s
    } else {
        s.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_with_prefix() {
        // Test with TIDEMARK_ prefix
        unsafe {
            std::env::set_var("TIDEMARK_TEST_VAR", "prefixed_value");
        }
        assert_eq!(get_env_with_prefix("TEST_VAR"), Some("prefixed_value".to_string()));
        unsafe {
            std::env::remove_var("TIDEMARK_TEST_VAR");
        }

        // Test with unprefixed fallback
        unsafe {
            std::env::set_var("FALLBACK_ONLY_VAR_X", "unprefixed_value");
        }
        assert_eq!(
            get_env_with_prefix("FALLBACK_ONLY_VAR_X"),
            Some("unprefixed_value".to_string())
        );
        unsafe {
            std::env::remove_var("FALLBACK_ONLY_VAR_X");
        }

        // Test non-existent variable
        assert_eq!(get_env_with_prefix("NON_EXISTENT_VAR"), None);
    }

    #[test]
    fn test_truncate_string_utf8_safe() {
        let locks = "🔐🔐🔐🔐🔐";
        assert_eq!(truncate_string(locks.to_string(), 10), locks);
        assert_eq!(truncate_string(locks.to_string(), 3), "🔐🔐🔐");
        assert_eq!(truncate_string("a".repeat(100), 45).len(), 45);
    }
}
