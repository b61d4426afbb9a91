//! One-time password generation and verification.
//!
//! Codes are generated from the OS RNG and only their SHA-256 digest is
//! stored. Verification hashes the submitted code and compares
//! fixed-length digests, so comparison time does not depend on the secret.

use sha2::{Digest, Sha256};

/// Number of digits in a withdrawal OTP.
pub const OTP_LENGTH: u32 = 6;

/// A freshly generated OTP and its storable digest.
#[derive(Debug, Clone)]
pub struct OtpCode {
    /// The plain code, sent to the organizer and never stored.
    pub code: String,
    /// SHA-256 hex digest of the code, stored with the withdrawal.
    pub digest: String,
}

impl OtpCode {
    /// Generates a new random numeric code.
    #[must_use]
    pub fn generate() -> Self {
        let upper = 10u32.pow(OTP_LENGTH);
        let code = format!("{:06}", rand::random_range(0..upper));
        let digest = hash_code(&code);
        Self { code, digest }
    }
}

/// Hashes an OTP code for storage.
#[must_use]
pub fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Verifies a submitted code against a stored digest.
///
/// Both sides are 32-byte SHA-256 digests, so the byte comparison runs
/// over fixed-length inputs regardless of what was submitted.
#[must_use]
pub fn verify_code(submitted: &str, stored_digest: &str) -> bool {
    let mut hasher = Sha256::new();
    hasher.update(submitted.as_bytes());
    let submitted_digest = hasher.finalize();

    let Ok(stored) = hex::decode(stored_digest) else {
        return false;
    };

    submitted_digest.as_slice() == stored.as_slice()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_code_shape() {
        let otp = OtpCode::generate();
        assert_eq!(otp.code.len(), 6);
        assert!(otp.code.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(otp.digest.len(), 64);
    }

    #[test]
    fn test_verify_accepts_correct_code() {
        let otp = OtpCode::generate();
        assert!(verify_code(&otp.code, &otp.digest));
    }

    #[test]
    fn test_verify_rejects_wrong_code() {
        let otp = OtpCode::generate();
        let wrong = if otp.code == "000000" { "000001" } else { "000000" };
        assert!(!verify_code(wrong, &otp.digest));
    }

    #[test]
    fn test_verify_rejects_malformed_digest() {
        assert!(!verify_code("123456", "not-hex"));
        assert!(!verify_code("123456", ""));
    }

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(hash_code("123456"), hash_code("123456"));
        assert_ne!(hash_code("123456"), hash_code("123457"));
    }
}
