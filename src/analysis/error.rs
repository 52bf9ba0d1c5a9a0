//! Typed failures of a deal analysis.

use thiserror::Error;

pub const NETWORK_MESSAGE: &str = "查询失败，请检查网络后重试";
pub const PARSE_MESSAGE: &str = "解析省钱方案出错，请稍后再试";
pub const INPUT_MESSAGE: &str = "请输入商品名称或链接";

/// Error surfaced by [`DealAnalysisClient::analyze`](super::DealAnalysisClient::analyze).
///
/// `Display` is the user-facing message; [`AnalysisError::detail`] keeps the
/// underlying cause for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// Blank query, rejected before any outbound call
    #[error("{}", INPUT_MESSAGE)]
    Input,

    /// The model call could not complete
    #[error("{}", NETWORK_MESSAGE)]
    Network(String),

    /// The reply was not valid JSON or failed validation
    #[error("{}", PARSE_MESSAGE)]
    Parse(String),
}

impl AnalysisError {
    pub(crate) fn network(err: &anyhow::Error) -> Self {
        AnalysisError::Network(format!("{:#}", err))
    }

    pub(crate) fn parse(detail: impl Into<String>) -> Self {
        AnalysisError::Parse(detail.into())
    }

    /// Underlying cause, or the user-facing message for input errors.
    pub fn detail(&self) -> &str {
        match self {
            AnalysisError::Input => INPUT_MESSAGE,
            AnalysisError::Network(detail) | AnalysisError::Parse(detail) => detail,
        }
    }

    /// True for failures that retrying the same query may fix.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AnalysisError::Input)
    }
}
