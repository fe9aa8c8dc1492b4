//! # Gateway エラー型

use axum::http::StatusCode;

/// Gatewayエラー型。レスポンスはステータスコードと平文のメッセージ。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 不正なリクエスト
    #[error("invalid request: {0}")]
    BadRequest(String),
    /// 必須の設定値が欠けている
    #[error("server misconfigured: {0}")]
    Config(String),
    /// 内部エラー
    #[error("internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Config(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}
