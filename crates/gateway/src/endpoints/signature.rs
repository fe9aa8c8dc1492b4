//! # POST /api/zoom/signature
//!
//! 参加トークンの発行。
//!
//! リクエスト `{ meetingNumber, role }` を受け取り、共有シークレットで署名した
//! JWTと公開クライアント識別子を返す。トークンは保存しない。

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use lecture_types::{SignatureRequest, SignatureResponse};

use crate::config::GatewayState;
use crate::error::GatewayError;

/// POST /api/zoom/signature — 参加トークン発行。
///
/// - ボディが不正（JSONでない、ミーティング番号が数字でない、ロールが0/1以外）: 400
/// - クライアント識別子・共有シークレットが未設定: 500（トークンは発行しない）
pub async fn handle_signature(
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<SignatureRequest>, JsonRejection>,
) -> Result<Json<SignatureResponse>, GatewayError> {
    let Json(body) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "署名リクエストを拒否");
        GatewayError::BadRequest(rejection.body_text())
    })?;

    let issuer = state.issuer().inspect_err(|e| {
        tracing::error!(error = %e, "署名用の設定が不足しています");
    })?;

    let issued = issuer
        .issue(&body.meeting_number, body.role)
        .map_err(|e| GatewayError::Internal(e.to_string()))?;

    tracing::info!(
        meeting_number = %body.meeting_number,
        role = body.role.as_u8(),
        exp = issued.claims.exp,
        "参加トークンを発行しました"
    );

    Ok(Json(issued.into_response()))
}
