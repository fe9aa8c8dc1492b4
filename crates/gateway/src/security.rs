//! # レスポンスヘッダとCORS
//!
//! 全レスポンスに付与するセキュリティヘッダと、署名エンドポイントを
//! 別オリジンのページから呼べるようにするCORS設定。

use axum::http::header::{self, HeaderValue};
use axum::http::Method;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::AllowedOrigins;

/// HSTS（2年、サブドメイン含む、preload）
pub const STRICT_TRANSPORT_SECURITY: &str = "max-age=63072000; includeSubDomains; preload";

/// リファラポリシー
pub const REFERRER_POLICY: &str = "strict-origin-when-cross-origin";

/// ベンダーSDKのスクリプト・フレーム・WebSocket接続を許可するCSP
pub const CONTENT_SECURITY_POLICY: &str = concat!(
    "default-src 'self'; ",
    "script-src 'self' 'unsafe-inline' 'unsafe-eval' https://zoom.us https://*.zoom.us https://zoom.com https://*.zoom.com https://source.zoom.us; ",
    "script-src-elem 'self' 'unsafe-inline' https://zoom.us https://*.zoom.us https://zoom.com https://*.zoom.com https://source.zoom.us; ",
    "frame-src 'self' https://*.zoom.us https://zoom.us https://zoom.com https://*.zoom.com; ",
    "connect-src 'self' https://*.zoom.us wss://*.zoom.us https://zoom.us https://zoom.com; ",
    "img-src 'self' data: blob: https://*.zoom.us https://zoom.us https://zoom.com; ",
    "style-src 'self' 'unsafe-inline';"
);

/// セキュリティヘッダを全レスポンスに付与する。
pub fn with_security_headers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(SetResponseHeaderLayer::overriding(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(STRICT_TRANSPORT_SECURITY),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static(REFERRER_POLICY),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
}

/// 設定からCORSレイヤを構築する。解釈できないオリジンは読み飛ばす。
pub fn cors_layer(allowed: &AllowedOrigins) -> CorsLayer {
    let origin = match allowed {
        AllowedOrigins::Any => AllowOrigin::any(),
        AllowedOrigins::List(origins) => {
            let values: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(v) => Some(v),
                    Err(_) => {
                        tracing::warn!(origin = %o, "CORSオリジンを解釈できないため無視します");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(values)
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_values_are_valid() {
        assert!(HeaderValue::from_str(CONTENT_SECURITY_POLICY).is_ok());
        assert!(!CONTENT_SECURITY_POLICY.contains('\n'));
        assert!(CONTENT_SECURITY_POLICY.contains("https://source.zoom.us"));
        assert!(CONTENT_SECURITY_POLICY.contains("wss://*.zoom.us"));
    }
}
