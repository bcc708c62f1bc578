use serde::{Deserialize, Serialize};
use std::fmt;

/// 秘密情報（トークン、SSH秘密鍵）のラッパー
///
/// `Debug` / `Display` では値を出力しない。
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// 生の値を取得する。ログに渡さないこと
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_redacted() {
        let secret = Secret::new("ghp_supersecret");
        assert_eq!(format!("{}", secret), "***");
        assert!(!format!("{:?}", secret).contains("supersecret"));
        assert_eq!(secret.expose(), "ghp_supersecret");
    }

    #[test]
    fn test_blank_secret_is_empty() {
        assert!(Secret::new("  ").is_empty());
        assert!(Secret::default().is_empty());
    }
}
