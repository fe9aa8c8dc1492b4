//! # 起動オプション
//!
//! ページURLのクエリパラメータ → 環境変数 → デフォルト値 の優先順で解決する。
//!
//! | クエリ | 環境変数 | デフォルト |
//! |--------|----------|-----------|
//! | `meetingNumber` | `ZOOM_MEETING_NUMBER` | （空） |
//! | `password` | `ZOOM_MEETING_PASSWORD` | （空） |
//! | `userName` | `ZOOM_USER_NAME` | `Student` |
//! | `signatureEndpoint` | `ZOOM_SIGNATURE_ENDPOINT` | `/api/zoom/signature` |
//! | `autoJoin` | — | `false` |
//! | `role` | — | `0` |
//! | — | `ZOOM_SDK_VERSION` | `5.1.0` |
//!
//! 環境変数は `NEXT_PUBLIC_` 接頭辞付きの名前も参照する。

use std::collections::HashMap;

use lecture_types::{Role, DEFAULT_SDK_VERSION, DEFAULT_SIGNATURE_PATH};
use reqwest::Url;

/// デフォルトの表示名
pub const DEFAULT_USER_NAME: &str = "Student";

/// ミーティング参加の起動オプション。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// ミーティング番号（未検証の入力値）
    pub meeting_number: String,
    /// ミーティングパスコード
    pub password: String,
    /// 表示名
    pub user_name: String,
    /// 署名エンドポイント（相対パスまたは絶対URL）
    pub signature_endpoint: String,
    /// 初期化完了後に自動で参加するか
    pub auto_join: bool,
    /// ロール
    pub role: Role,
    /// ベンダーSDKのバージョン
    pub sdk_version: String,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            meeting_number: String::new(),
            password: String::new(),
            user_name: DEFAULT_USER_NAME.to_string(),
            signature_endpoint: DEFAULT_SIGNATURE_PATH.to_string(),
            auto_join: false,
            role: Role::Attendee,
            sdk_version: DEFAULT_SDK_VERSION.to_string(),
        }
    }
}

impl LaunchOptions {
    /// ページURLのクエリとプロセスの環境変数から解決する。
    pub fn from_url(page_url: &Url) -> Self {
        let query: HashMap<String, String> = page_url.query_pairs().into_owned().collect();
        Self::resolve(&query, |key| std::env::var(key).ok())
    }

    /// クエリマップと環境変数参照関数から解決する。
    pub fn resolve(query: &HashMap<String, String>, env: impl Fn(&str) -> Option<String>) -> Self {
        let env_var = |name: &str| {
            env(&format!("ZOOM_{name}")).or_else(|| env(&format!("NEXT_PUBLIC_ZOOM_{name}")))
        };
        let pick = |param: &str, name: &str| query.get(param).cloned().or_else(|| env_var(name));
        let defaults = Self::default();

        let role = match query.get("role") {
            None => Role::Attendee,
            Some(raw) => match raw.trim().parse::<i64>().map(Role::try_from) {
                Ok(Ok(role)) => role,
                _ => {
                    tracing::warn!(role = %raw, "ロールを解釈できないため参加者として扱います");
                    Role::Attendee
                }
            },
        };

        Self {
            meeting_number: pick("meetingNumber", "MEETING_NUMBER").unwrap_or_default(),
            password: pick("password", "MEETING_PASSWORD").unwrap_or_default(),
            user_name: pick("userName", "USER_NAME").unwrap_or(defaults.user_name),
            signature_endpoint: pick("signatureEndpoint", "SIGNATURE_ENDPOINT")
                .unwrap_or(defaults.signature_endpoint),
            auto_join: query.get("autoJoin").map(String::as_str) == Some("true"),
            role,
            sdk_version: env_var("SDK_VERSION").unwrap_or(defaults.sdk_version),
        }
    }
}
