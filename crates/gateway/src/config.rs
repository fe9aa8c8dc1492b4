//! # Gateway設定・共有状態
//!
//! 環境変数からの設定読み込みとGatewayの共有状態の定義。
//!
//! クライアント識別子と共有シークレットは起動時に必須としない。
//! 欠けている場合は署名リクエストの時点で設定エラーとして返す。

use lecture_token::TokenIssuer;
use lecture_types::{SdkInfo, DEFAULT_SDK_VERSION};

use crate::error::GatewayError;

/// デフォルトの待ち受けアドレス
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// CORSで許可するオリジン。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// 任意のオリジン
    Any,
    /// 列挙されたオリジンのみ
    List(Vec<String>),
}

/// Gatewayの設定。
#[derive(Clone)]
pub struct GatewayConfig {
    /// 待ち受けアドレス
    pub bind_addr: String,
    /// 公開クライアント識別子（ZOOM_CLIENT_ID）
    pub client_id: Option<String>,
    /// 共有シークレット（ZOOM_CLIENT_SECRET）
    pub client_secret: Option<String>,
    /// ベンダーSDKのバージョン
    pub sdk_version: String,
    /// CORS許可オリジン
    pub allowed_origins: AllowedOrigins,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("bind_addr", &self.bind_addr)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("sdk_version", &self.sdk_version)
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}

impl GatewayConfig {
    /// 環境変数から構築する。
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から構築する。空文字列は未設定として扱う。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let client_id = get("ZOOM_CLIENT_ID").or_else(|| get("NEXT_PUBLIC_ZOOM_CLIENT_ID"));
        let sdk_version = get("ZOOM_SDK_VERSION")
            .or_else(|| get("NEXT_PUBLIC_ZOOM_SDK_VERSION"))
            .unwrap_or_else(|| DEFAULT_SDK_VERSION.to_string());

        let allowed_origins = match get("CORS_ALLOWED_ORIGINS") {
            None => AllowedOrigins::Any,
            Some(raw) if raw.split(',').any(|o| o.trim() == "*") => AllowedOrigins::Any,
            Some(raw) => AllowedOrigins::List(
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        };

        Self {
            bind_addr: get("GATEWAY_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            client_id,
            client_secret: get("ZOOM_CLIENT_SECRET"),
            sdk_version,
            allowed_origins,
        }
    }
}

/// Gatewayの共有状態。起動後は読み取り専用。
pub struct GatewayState {
    pub config: GatewayConfig,
}

impl GatewayState {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    /// リクエストごとにトークン発行者を構築する。
    /// 設定が欠けていればトークンを発行せずに設定エラーを返す。
    pub fn issuer(&self) -> Result<TokenIssuer, GatewayError> {
        TokenIssuer::from_parts(
            self.config.client_id.as_deref(),
            self.config.client_secret.as_deref(),
        )
        .map_err(|e| GatewayError::Config(e.to_string()))
    }

    /// ページ向けのSDK情報。
    pub fn sdk_info(&self) -> SdkInfo {
        SdkInfo {
            client_id: self.config.client_id.clone(),
            sdk_version: self.config.sdk_version.clone(),
            sdk_lib_url: SdkInfo::lib_url_for(&self.config.sdk_version),
        }
    }
}
