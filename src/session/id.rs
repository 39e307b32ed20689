//! Session identifier generation.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

/// Random bytes per identifier (256 bits).
const SESSION_ID_BYTES: usize = 32;

/// Encoded length of an identifier: 32 bytes in unpadded base64url.
pub const SESSION_ID_LENGTH: usize = 43;

/// Generate a new session identifier.
///
/// 32 bytes from the operating system's CSPRNG, encoded as base64url without
/// padding. The alphabet (`A-Z a-z 0-9 - _`) is safe in cookie values and
/// URLs without escaping.
pub fn generate_session_id() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Whether `id` has the shape of an identifier produced by
/// [`generate_session_id`].
///
/// Lets callers reject garbage tokens without a store round trip.
pub fn is_well_formed(id: &str) -> bool {
    id.len() == SESSION_ID_LENGTH
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_well_formed() {
        for _ in 0..100 {
            let id = generate_session_id();
            assert_eq!(id.len(), SESSION_ID_LENGTH);
            assert!(is_well_formed(&id), "unexpected id shape: {}", id);
        }
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_session_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_rejects_malformed_ids() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("short"));
        assert!(!is_well_formed(&"a".repeat(44)));
        // Standard base64 characters are not cookie-safe
        assert!(!is_well_formed(&format!("{}+", "a".repeat(42))));
        assert!(!is_well_formed(&format!("{}=", "a".repeat(42))));
        assert!(!is_well_formed(&format!("{};", "a".repeat(42))));
        assert!(is_well_formed(&format!("{}-_", "a".repeat(41))));
    }
}
