//! Utility functions and helpers

use alloy::primitives::{B256, U256};

/// Interpret a storage key as the integer slot index used by JSON-RPC
pub fn word_to_u256(word: B256) -> U256 {
    U256::from_be_bytes(word.0)
}

/// Convert a storage value returned by JSON-RPC into a 32-byte word
pub fn u256_to_word(value: U256) -> B256 {
    B256::from(value.to_be_bytes::<32>())
}

/// Validate that an RPC URL uses an HTTP scheme
pub fn is_valid_rpc_url(url: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .any(|scheme| url.starts_with(scheme) && url.len() > scheme.len())
}

/// Shorten hashes and addresses for logging
pub fn sanitize_for_logging(s: &str) -> String {
    if s.len() <= 10 {
        return s.to_string();
    }

    if s.starts_with("0x") && s.len() > 20 {
        format!("{}...{}", &s[..6], &s[s.len() - 4..])
    } else {
        format!("{}...", &s[..10])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_conversion() {
        let word = B256::with_last_byte(0x2a);
        assert_eq!(word_to_u256(word), U256::from(42u64));
        assert_eq!(u256_to_word(U256::from(42u64)), word);
        assert_eq!(u256_to_word(U256::MAX), B256::repeat_byte(0xff));
    }

    #[test]
    fn test_rpc_url_validation() {
        assert!(is_valid_rpc_url("http://localhost:8545"));
        assert!(is_valid_rpc_url("https://mainnet.example.org"));
        assert!(!is_valid_rpc_url("wss://mainnet.example.org"));
        assert!(!is_valid_rpc_url("localhost:8545"));
        assert!(!is_valid_rpc_url("https://"));
    }

    #[test]
    fn test_sanitize_for_logging() {
        assert_eq!(
            sanitize_for_logging("0x1234567890123456789012345678901234567890"),
            "0x1234...7890"
        );
        assert_eq!(sanitize_for_logging("short"), "short");
        assert_eq!(sanitize_for_logging("verylongstring"), "verylongst...");
    }
}
