//! # クライアント エラー型
//!
//! 署名取得の失敗と、バナー表示用のメッセージ整形。

use std::fmt::Display;

/// クライアントエラー型。
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// 署名エンドポイントのURLが不正
    #[error("invalid signature endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    /// 通信に失敗（接続不可、タイムアウト等）
    #[error("network error: {0}")]
    Network(String),
    /// 署名エンドポイントが2xx以外を返した
    #[error("Signature request failed ({status}){}", fmt_body(.body))]
    SignatureRequest { status: String, body: String },
    /// レスポンスがJSONでない、または署名を含まない
    #[error("{0}")]
    MalformedResponse(String),
    /// HTTPクライアントの構築に失敗
    #[error("internal error: {0}")]
    Internal(String),
}

fn fmt_body(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {body}")
    }
}

/// バナー表示用に `"<文脈>: <詳細>"` 形式へ整形する。
/// 詳細が空の場合は `Unknown error` とする。
pub fn format_error(context: &str, detail: impl Display) -> String {
    let detail = detail.to_string();
    if detail.trim().is_empty() {
        format!("{context}: Unknown error")
    } else {
        format!("{context}: {detail}")
    }
}
