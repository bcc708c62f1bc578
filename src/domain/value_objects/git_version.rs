use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// バージョン解析エラー
#[derive(Debug, Error, PartialEq)]
pub enum GitVersionError {
    #[error("Unable to determine version from output: {0}")]
    Unparseable(String),
}

/// Git / git-lfs のバージョン（major.minor[.patch]）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GitVersion {
    major: u32,
    minor: u32,
    patch: Option<u32>,
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("static regex"))
}

impl GitVersion {
    pub const fn new(major: u32, minor: u32, patch: Option<u32>) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// `git version` / `git lfs version` の出力からバージョンを抽出する
    ///
    /// 複数行の出力は不正とみなす。
    pub fn from_version_output(output: &str) -> Result<Self, GitVersionError> {
        let trimmed = output.trim();
        if trimmed.contains('\n') {
            return Err(GitVersionError::Unparseable(trimmed.to_string()));
        }

        let captures = version_regex()
            .captures(trimmed)
            .ok_or_else(|| GitVersionError::Unparseable(trimmed.to_string()))?;

        let parse = |i: usize| captures.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
        match (parse(1), parse(2)) {
            (Some(major), Some(minor)) => Ok(Self::new(major, minor, parse(3))),
            _ => Err(GitVersionError::Unparseable(trimmed.to_string())),
        }
    }

    /// このバージョンが `minimum` 以上かどうか
    pub fn check_minimum(&self, minimum: &GitVersion) -> bool {
        let own = (self.major, self.minor, self.patch.unwrap_or(0));
        let min = (minimum.major, minimum.minor, minimum.patch.unwrap_or(0));
        own >= min
    }
}

impl fmt::Display for GitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{}", self.major, self.minor, patch),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}
