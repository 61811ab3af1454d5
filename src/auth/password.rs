// Password hashing with Argon2id
use crate::config::AuthConfig;
use crate::errors::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};

const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Hash a password using Argon2id with OWASP recommended parameters
///
/// Parameters (OWASP 2023):
/// - Memory: 19 MiB (19456 KiB)
/// - Iterations: 2
/// - Parallelism: 1
/// - Output length: 32 bytes
pub fn hash_password(password: &str) -> Result<String> {
    let params = Params::new(19456, 2, 1, Some(32))
        .map_err(|e| AppError::Cryptographic(format!("Failed to create Argon2 params: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Cryptographic(format!("Failed to hash password: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a PHC hash string
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Cryptographic(format!("Failed to parse password hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => {
            tracing::error!("Password verification error: {}", e);
            Err(AppError::Cryptographic(format!(
                "Password verification error: {}",
                e
            )))
        }
    }
}

/// Complexity rules applied on registration and password change
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::from_config(&AuthConfig::default())
    }
}

impl PasswordPolicy {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
            require_uppercase: config.password_require_uppercase,
            require_lowercase: config.password_require_lowercase,
            require_digit: config.password_require_digit,
            require_special: config.password_require_special,
        }
    }

    /// First violated rule wins
    pub fn validate(&self, password: &str) -> Result<()> {
        if password.chars().count() < self.min_length {
            return Err(AppError::InvalidPassword(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        if self.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            return Err(AppError::InvalidPassword(
                "Password must contain at least one uppercase letter".to_string(),
            ));
        }

        if self.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            return Err(AppError::InvalidPassword(
                "Password must contain at least one lowercase letter".to_string(),
            ));
        }

        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AppError::InvalidPassword(
                "Password must contain at least one number".to_string(),
            ));
        }

        if self.require_special && !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
            return Err(AppError::InvalidPassword(format!(
                "Password must contain at least one special character ({})",
                SPECIAL_CHARACTERS
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let hash = hash_password("Str0ng!pass").unwrap();
        assert!(hash.starts_with("$argon2id$"));

        // Random salt
        assert_ne!(hash, hash_password("Str0ng!pass").unwrap());
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("Str0ng!pass").unwrap();
        assert!(verify_password("Str0ng!pass", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AppError::Cryptographic(_))
        ));
    }

    #[test]
    fn test_policy_messages() {
        let policy = PasswordPolicy::default();

        let cases = [
            ("Sh0rt!", "Password must be at least 8 characters long"),
            ("lowercase1!", "Password must contain at least one uppercase letter"),
            ("UPPERCASE1!", "Password must contain at least one lowercase letter"),
            ("NoDigits!!", "Password must contain at least one number"),
            (
                "NoSpecial12",
                "Password must contain at least one special character (!@#$%^&*(),.?\":{}|<>)",
            ),
        ];

        for (password, expected) in cases {
            let err = policy.validate(password).unwrap_err();
            assert_eq!(err.to_string(), expected, "password {:?}", password);
        }

        assert!(policy.validate("Val1d!Password").is_ok());
    }

    #[test]
    fn test_relaxed_policy() {
        let policy = PasswordPolicy {
            require_special: false,
            require_uppercase: false,
            ..PasswordPolicy::default()
        };
        assert!(policy.validate("lowercase1").is_ok());
    }
}
