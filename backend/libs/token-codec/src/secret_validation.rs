//! Shared-secret strength checks
//!
//! Every service trusting the issuer holds a copy of an HMAC secret, so a
//! guessable secret lets anyone mint identities. Weak secrets are refused
//! when a policy is provisioned.

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

const MIN_SECRET_LENGTH: usize = 32; // 256 bits minimum
const RECOMMENDED_SECRET_LENGTH: usize = 64; // 512 bits recommended

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretStrength {
    /// Refuse to start
    Weak,
    /// Start, but warn
    Acceptable,
    Strong,
}

#[derive(Debug, Error)]
pub enum SecretGenerationError {
    #[error("secret length must be at least {MIN_SECRET_LENGTH} bytes, got {0}")]
    TooShort(usize),

    #[error("failed to read from the OS random source: {0}")]
    Rng(#[from] rand::Error),
}

/// Classify an HMAC secret
///
/// - at least 32 bytes
/// - Shannon entropy of at least 4 bits per byte
/// - no runs of four repeated or sequential bytes
/// - `Strong` needs 64 bytes and 5 bits per byte
pub fn validate_secret_strength(secret: &str) -> SecretStrength {
    let bytes = secret.as_bytes();

    if bytes.len() < MIN_SECRET_LENGTH {
        return SecretStrength::Weak;
    }

    let entropy = shannon_entropy(bytes);
    if entropy < 4.0 || has_obvious_patterns(bytes) {
        return SecretStrength::Weak;
    }

    if bytes.len() >= RECOMMENDED_SECRET_LENGTH && entropy >= 5.0 {
        SecretStrength::Strong
    } else {
        SecretStrength::Acceptable
    }
}

/// Bits per byte (0-8)
fn shannon_entropy(data: &[u8]) -> f64 {
    let mut freq = [0u32; 256];
    for &byte in data {
        freq[byte as usize] += 1;
    }

    let len = data.len() as f64;
    freq.iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = f64::from(count) / len;
            -p * p.log2()
        })
        .sum()
}

fn has_obvious_patterns(data: &[u8]) -> bool {
    let mut repeated = 1;
    let mut sequential = 1;

    for window in data.windows(2) {
        repeated = if window[0] == window[1] { repeated + 1 } else { 1 };
        sequential = if i16::from(window[1]) - i16::from(window[0]) == 1 {
            sequential + 1
        } else {
            1
        };

        if repeated >= 4 || sequential >= 4 {
            return true;
        }
    }

    false
}

/// Generate a random secret of `length` bytes, base64 encoded
///
/// For provisioning dev and test environments.
pub fn generate_secure_secret(length: usize) -> Result<String, SecretGenerationError> {
    if length < MIN_SECRET_LENGTH {
        return Err(SecretGenerationError::TooShort(length));
    }

    let mut buffer = vec![0u8; length];
    OsRng.try_fill_bytes(&mut buffer)?;

    Ok(STANDARD.encode(&buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weak_secret_too_short() {
        assert_eq!(validate_secret_strength("short"), SecretStrength::Weak);
        assert_eq!(validate_secret_strength(""), SecretStrength::Weak);
    }

    #[test]
    fn test_weak_secret_low_entropy() {
        let weak = "abababababababababababababababab";
        assert_eq!(validate_secret_strength(weak), SecretStrength::Weak);
    }

    #[test]
    fn test_weak_secret_repeated_run() {
        let weak = "q8Vn2LrT5xWz9KcB4mJd7HsF1gYpzzzz";
        assert_eq!(validate_secret_strength(weak), SecretStrength::Weak);
    }

    #[test]
    fn test_weak_secret_sequential_pattern() {
        let weak = "abcdefghijklmnopqrstuvwxyzabcdef";
        assert_eq!(validate_secret_strength(weak), SecretStrength::Weak);
    }

    #[test]
    fn test_acceptable_secret() {
        let acceptable = "J8Kq2mPvRx4TnZs9YwLcGf7DhBe3Xa6W";
        assert_eq!(validate_secret_strength(acceptable), SecretStrength::Acceptable);
    }

    #[test]
    fn test_strong_secret() {
        let strong = "y9K$mP2vRx#TnZ@s4Yw!cGf7Dh&e3Xa6Wq8Lj5BtNu1Zp0MkYhVgCxFbAsSdQwEr";
        assert_eq!(validate_secret_strength(strong), SecretStrength::Strong);
    }

    #[test]
    fn test_generate_secure_secret() {
        let secret = generate_secure_secret(64).unwrap();
        let decoded = STANDARD.decode(&secret).unwrap();
        assert_eq!(decoded.len(), 64);

        assert!(matches!(generate_secure_secret(16), Err(SecretGenerationError::TooShort(16))));
    }

    #[test]
    fn test_shannon_entropy() {
        assert!(shannon_entropy(&[b'a'; 100]) < 0.1);

        let uniform: Vec<u8> = (0..=255).collect();
        assert!(shannon_entropy(&uniform) > 7.5);
    }

    #[test]
    fn test_pattern_detection() {
        assert!(has_obvious_patterns(b"aaaa"));
        assert!(has_obvious_patterns(b"xx1234yy"));
        assert!(!has_obvious_patterns(b"aZ3$"));
        assert!(!has_obvious_patterns(b"abc"));
    }
}
