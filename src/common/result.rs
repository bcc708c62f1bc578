use crate::common::error::ReposyncError;

/// reposync全体で使用するResult型のエイリアス
///
/// # Examples
///
/// ```
/// use reposync::common::result::ReposyncResult;
/// use reposync::common::error::ReposyncError;
///
/// fn example_function() -> ReposyncResult<String> {
///     Ok("success".to_string())
/// }
///
/// fn example_with_error() -> ReposyncResult<()> {
///     Err(ReposyncError::internal_error("Something went wrong"))
/// }
/// ```
pub type ReposyncResult<T> = Result<T, ReposyncError>;

/// Optionのエラー変換ヘルパー
pub trait OptionExt<T> {
    /// OptionをReposyncResultに変換する
    ///
    /// ```
    /// use reposync::common::result::{ReposyncResult, OptionExt};
    ///
    /// let none_value: Option<String> = None;
    /// let result: ReposyncResult<String> = none_value.ok_or_internal_error("Value not found");
    /// assert!(result.is_err());
    /// ```
    fn ok_or_internal_error(self, message: impl Into<String>) -> ReposyncResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_internal_error(self, message: impl Into<String>) -> ReposyncResult<T> {
        self.ok_or_else(|| ReposyncError::internal_error(message))
    }
}

/// Resultのエラー変換ヘルパー
pub trait ResultExt<T, E> {
    /// ファイルシステムエラーとしてReposyncResultに変換
    ///
    /// ```
    /// use reposync::common::result::{ReposyncResult, ResultExt};
    ///
    /// let result: Result<String, std::io::Error> = Err(std::io::Error::new(
    ///     std::io::ErrorKind::NotFound, "file not found"
    /// ));
    /// let converted: ReposyncResult<String> = result.with_filesystem_error("read failed", None);
    /// assert!(converted.is_err());
    /// ```
    fn with_filesystem_error(
        self,
        message: impl Into<String>,
        path: Option<std::path::PathBuf>,
    ) -> ReposyncResult<T>
    where
        E: Into<std::io::Error>;

    /// 内部エラーとしてReposyncResultに変換
    fn with_internal_error(self, message: impl Into<String>) -> ReposyncResult<T>
    where
        E: std::error::Error + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn with_filesystem_error(
        self,
        message: impl Into<String>,
        path: Option<std::path::PathBuf>,
    ) -> ReposyncResult<T>
    where
        E: Into<std::io::Error>,
    {
        self.map_err(|e| ReposyncError::filesystem_error_with_source(message, path, e.into()))
    }

    fn with_internal_error(self, message: impl Into<String>) -> ReposyncResult<T>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.map_err(|e| ReposyncError::internal_error_with_source(message, e))
    }
}

/// 後始末処理用のヘルパー
///
/// 失敗しても処理全体を止めてはいけない操作（認証情報の削除など）で使用する。
pub trait ReposyncResultExt<T> {
    /// エラーを警告ログに落としてOptionに変換
    fn warn_on_error(self, context: &str) -> Option<T>;
}

impl<T> ReposyncResultExt<T> for ReposyncResult<T> {
    fn warn_on_error(self, context: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "{}", context);
                None
            }
        }
    }
}
