//! # GET /.well-known/meeting-sdk-info
//!
//! ページがベンダーSDKを読み込むための公開情報。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use lecture_types::SdkInfo;

use crate::config::GatewayState;

/// GET /.well-known/meeting-sdk-info — SDK情報公開。
///
/// シークレットは含めない。
pub async fn handle_sdk_info(State(state): State<Arc<GatewayState>>) -> Json<SdkInfo> {
    Json(state.sdk_info())
}

/// GET /health
pub async fn handle_health() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;

    #[tokio::test]
    async fn test_sdk_info() {
        let config = GatewayConfig::from_lookup(|key| match key {
            "ZOOM_CLIENT_ID" => Some("public-id".to_string()),
            "ZOOM_CLIENT_SECRET" => Some("secret".to_string()),
            "ZOOM_SDK_VERSION" => Some("4.0.0".to_string()),
            _ => None,
        });
        let state = Arc::new(GatewayState::new(config));

        let info = handle_sdk_info(State(state)).await.0;
        assert_eq!(info.client_id.as_deref(), Some("public-id"));
        assert_eq!(info.sdk_version, "4.0.0");
        assert_eq!(info.sdk_lib_url, "https://source.zoom.us/4.0.0/lib");

        let body = serde_json::to_string(&info).unwrap();
        assert!(!body.contains("secret"));
    }
}
