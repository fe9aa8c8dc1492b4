//! # Lecture Room 共有型定義
//!
//! 署名エンドポイントとクライアントの間で交換されるデータ構造を提供する。
//!
//! ## エンコーディング規則
//! - ワイヤ上のフィールド名は camelCase（ベンダーSDKの命名に合わせる）
//! - ミーティング番号は文字列・数値のどちらでも受け付け、数字列に正規化する

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// 定数
// ---------------------------------------------------------------------------

/// 発行時刻を過去にずらす秒数（クライアントとの時計ずれ吸収用）
pub const ISSUED_AT_SKEW_SECS: u64 = 30;

/// 参加トークンの有効期間（秒）。2時間。
pub const TOKEN_LIFETIME_SECS: u64 = 60 * 60 * 2;

/// 署名エンドポイントのデフォルトパス
pub const DEFAULT_SIGNATURE_PATH: &str = "/api/zoom/signature";

/// ベンダーSDKのデフォルトバージョン
pub const DEFAULT_SDK_VERSION: &str = "5.1.0";

// ---------------------------------------------------------------------------
// ミーティング番号
// ---------------------------------------------------------------------------

/// 不正な入力値。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInput {
    /// ミーティング番号が空
    #[error("meeting number is empty")]
    EmptyMeetingNumber,
    /// ミーティング番号に数字以外が含まれる
    #[error("meeting number must contain only digits: {0:?}")]
    NonNumericMeetingNumber(String),
    /// 未知のロール値
    #[error("role must be 0 (attendee) or 1 (host), got {0}")]
    UnknownRole(i64),
}

/// ミーティング番号。数字のみからなる文字列として保持する。
///
/// JSONでは `"123 456 7890"` のような文字列と `1234567890` のような数値の
/// 両方を受け付ける。空白は取り除かれる。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMeetingNumber", into = "String")]
pub struct MeetingNumber(String);

/// ワイヤ上のミーティング番号表現（文字列または数値）
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawMeetingNumber {
    Text(String),
    Number(u64),
}

impl MeetingNumber {
    /// 文字列からミーティング番号を構築する。
    pub fn parse(raw: &str) -> Result<Self, InvalidInput> {
        let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.is_empty() {
            return Err(InvalidInput::EmptyMeetingNumber);
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(InvalidInput::NonNumericMeetingNumber(raw.to_string()));
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<RawMeetingNumber> for MeetingNumber {
    type Error = InvalidInput;

    fn try_from(raw: RawMeetingNumber) -> Result<Self, Self::Error> {
        match raw {
            RawMeetingNumber::Text(s) => Self::parse(&s),
            RawMeetingNumber::Number(n) => Ok(Self(n.to_string())),
        }
    }
}

impl From<MeetingNumber> for String {
    fn from(mn: MeetingNumber) -> Self {
        mn.0
    }
}

impl fmt::Display for MeetingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for MeetingNumber {
    type Err = InvalidInput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// ロール
// ---------------------------------------------------------------------------

/// ミーティング内のロール。ワイヤ上は整数（0 / 1）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum Role {
    /// 参加者
    #[default]
    Attendee,
    /// ホスト
    Host,
}

impl Role {
    pub fn as_u8(self) -> u8 {
        match self {
            Role::Attendee => 0,
            Role::Host => 1,
        }
    }
}

impl TryFrom<i64> for Role {
    type Error = InvalidInput;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Role::Attendee),
            1 => Ok(Role::Host),
            other => Err(InvalidInput::UnknownRole(other)),
        }
    }
}

impl From<Role> for u8 {
    fn from(role: Role) -> Self {
        role.as_u8()
    }
}

// ---------------------------------------------------------------------------
// 署名エンドポイント (POST /api/zoom/signature)
// ---------------------------------------------------------------------------

/// 署名リクエスト。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRequest {
    /// 参加するミーティング番号
    pub meeting_number: MeetingNumber,
    /// ロール（省略時は参加者）
    #[serde(default)]
    pub role: Role,
}

/// 署名レスポンス。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureResponse {
    /// HS256で署名された参加トークン
    pub signature: String,
    /// 公開クライアント識別子（SDKキー）
    pub client_id: String,
}

// ---------------------------------------------------------------------------
// 参加トークンのペイロード
// ---------------------------------------------------------------------------

/// 参加トークンのクレーム。
///
/// `exp - iat` は常に [`TOKEN_LIFETIME_SECS`]、`tokenExp` は `exp` と等しい。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinTokenClaims {
    /// 公開クライアント識別子
    #[serde(rename = "appKey")]
    pub app_key: String,
    /// ミーティング番号
    pub mn: MeetingNumber,
    /// ロール
    pub role: Role,
    /// 発行時刻（UNIX秒、時計ずれ分だけ過去）
    pub iat: u64,
    /// 有効期限（UNIX秒）
    pub exp: u64,
    /// SDKセッションの有効期限（UNIX秒）
    #[serde(rename = "tokenExp")]
    pub token_exp: u64,
}

// ---------------------------------------------------------------------------
// SDK情報 (GET /.well-known/meeting-sdk-info)
// ---------------------------------------------------------------------------

/// ページがベンダーSDKを読み込むために必要な公開情報。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkInfo {
    /// 公開クライアント識別子（未設定の場合は null）
    pub client_id: Option<String>,
    /// ベンダーSDKのバージョン
    pub sdk_version: String,
    /// ベンダーSDKのJSライブラリURL
    pub sdk_lib_url: String,
}

impl SdkInfo {
    /// SDKバージョンからライブラリURLを組み立てる。
    pub fn lib_url_for(sdk_version: &str) -> String {
        format!("https://source.zoom.us/{sdk_version}/lib")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meeting_number_accepts_string_and_number() {
        let req: SignatureRequest =
            serde_json::from_str(r#"{"meetingNumber":"123 456 7890","role":1}"#).unwrap();
        assert_eq!(req.meeting_number.as_str(), "1234567890");
        assert_eq!(req.role, Role::Host);

        let req: SignatureRequest =
            serde_json::from_str(r#"{"meetingNumber":9876543210,"role":0}"#).unwrap();
        assert_eq!(req.meeting_number.as_str(), "9876543210");
        assert_eq!(req.role, Role::Attendee);
    }

    #[test]
    fn test_role_defaults_to_attendee() {
        let req: SignatureRequest = serde_json::from_str(r#"{"meetingNumber":"42"}"#).unwrap();
        assert_eq!(req.role, Role::Attendee);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(serde_json::from_str::<SignatureRequest>(r#"{"meetingNumber":""}"#).is_err());
        assert!(serde_json::from_str::<SignatureRequest>(r#"{"meetingNumber":"12ab"}"#).is_err());
        assert!(
            serde_json::from_str::<SignatureRequest>(r#"{"meetingNumber":"12","role":2}"#).is_err()
        );
        assert!(
            serde_json::from_str::<SignatureRequest>(r#"{"meetingNumber":"12","role":-1}"#)
                .is_err()
        );
        assert_eq!(
            MeetingNumber::parse("   "),
            Err(InvalidInput::EmptyMeetingNumber)
        );
    }

    #[test]
    fn test_claims_wire_names() {
        let claims = JoinTokenClaims {
            app_key: "client".to_string(),
            mn: MeetingNumber::parse("123").unwrap(),
            role: Role::Host,
            iat: 100,
            exp: 7300,
            token_exp: 7300,
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["appKey"], "client");
        assert_eq!(value["mn"], "123");
        assert_eq!(value["role"], 1);
        assert_eq!(value["tokenExp"], 7300);
    }

    #[test]
    fn test_sdk_lib_url() {
        assert_eq!(
            SdkInfo::lib_url_for("5.1.0"),
            "https://source.zoom.us/5.1.0/lib"
        );
    }
}
