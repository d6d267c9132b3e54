use crate::config::AdminConfig;
use sha2::{Digest, Sha256};

/// The fixed token handed out on every successful login. It is not signed,
/// not time-limited and not tied to a session.
pub const ADMIN_TOKEN: &str = "admin_token";

/// SHA-256 hash of a password, returned as hex.
pub fn hash_password(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hex::encode(hasher.finalize())
}

/// The single configured admin account. Only the password digest is kept.
#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password_hash: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: &str) -> Self {
        Self {
            username: username.into(),
            password_hash: hash_password(password),
        }
    }

    pub fn from_config(config: &AdminConfig) -> Self {
        Self::new(config.username.clone(), &config.password)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Plain equality on username and digest. Wrong user and wrong password are
    /// indistinguishable to the caller.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        username == self.username && hash_password(password) == self.password_hash
    }
}

/// Whether `token` is the admin token.
pub fn token_is_valid(token: Option<&str>) -> bool {
    token == Some(ADMIN_TOKEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_is_sha256_hex() {
        let hash = hash_password("anything");
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash_password(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_verify_requires_both_fields() {
        let creds = AdminCredentials::new("admin", "hunter2");
        assert!(creds.verify("admin", "hunter2"));
        assert!(!creds.verify("admin", "hunter3"));
        assert!(!creds.verify("root", "hunter2"));
        assert!(!creds.verify("", ""));
    }

    #[test]
    fn test_debug_does_not_leak_digest() {
        let creds = AdminCredentials::new("admin", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains(&hash_password("hunter2")));
    }

    #[test]
    fn test_token_check() {
        assert!(token_is_valid(Some("admin_token")));
        assert!(!token_is_valid(Some("admin_token ")));
        assert!(!token_is_valid(Some("")));
        assert!(!token_is_valid(None));
    }
}
