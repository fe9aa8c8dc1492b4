//! # Lecture Room 参加トークン
//!
//! ベンダーSDKの認証に使う参加トークン（JWT）の発行と検証を行う。
//!
//! ## トークン形式
//! | 項目 | 値 |
//! |------|-----|
//! | ヘッダ | `{"alg":"HS256","typ":"JWT"}` |
//! | ペイロード | `appKey`, `mn`, `role`, `iat`, `exp`, `tokenExp` |
//! | 署名 | HMAC-SHA256（共有シークレット） |
//! | 有効期間 | `iat` = 発行時刻 - 30秒、`exp` = `iat` + 2時間 |

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lecture_types::{
    JoinTokenClaims, MeetingNumber, Role, SignatureResponse, ISSUED_AT_SKEW_SECS,
    TOKEN_LIFETIME_SECS,
};

/// トークン処理のエラー型
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// クライアント識別子が未設定
    #[error("client identifier is not configured (ZOOM_CLIENT_ID)")]
    MissingClientId,
    /// 共有シークレットが未設定
    #[error("client secret is not configured (ZOOM_CLIENT_SECRET)")]
    MissingClientSecret,
    /// システム時刻の取得に失敗
    #[error("system clock is before the UNIX epoch")]
    Clock,
    /// JWTのエンコードに失敗
    #[error("failed to encode join token: {0}")]
    Encode(String),
    /// 署名が一致しない
    #[error("join token signature does not match")]
    InvalidSignature,
    /// JWTとして解釈できない
    #[error("malformed join token: {0}")]
    Malformed(String),
    /// 発行時刻より前
    #[error("join token is not valid before {iat} (now {now})")]
    NotYetValid { iat: u64, now: u64 },
    /// 有効期限切れ
    #[error("join token expired at {exp} (now {now})")]
    Expired { exp: u64, now: u64 },
    /// 有効期間が規定と異なる
    #[error("join token lifetime is invalid: iat={iat}, exp={exp}, tokenExp={token_exp}")]
    InvalidLifetime { iat: u64, exp: u64, token_exp: u64 },
}

/// 現在のUNIX時刻（秒）。
pub fn unix_now() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| TokenError::Clock)
}

/// 設定値が空白のみでないことを確認して取り出す。
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// 発行
// ---------------------------------------------------------------------------

/// 発行済みトークン。
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// 署名済みJWT
    pub signature: String,
    /// 公開クライアント識別子
    pub client_id: String,
    /// 署名したクレーム
    pub claims: JoinTokenClaims,
}

impl IssuedToken {
    /// 署名エンドポイントのレスポンス形式に変換する。
    pub fn into_response(self) -> SignatureResponse {
        SignatureResponse {
            signature: self.signature,
            client_id: self.client_id,
        }
    }
}

/// 参加トークン発行者。クライアント識別子と共有シークレットを保持する。
#[derive(Clone)]
pub struct TokenIssuer {
    client_id: String,
    client_secret: String,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// 未設定かもしれない設定値から発行者を構築する。
    ///
    /// どちらかが欠けている（または空白のみ）場合はトークンを発行せずに失敗する。
    /// クライアント識別子の欠落が先に報告される。
    pub fn from_parts(
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> Result<Self, TokenError> {
        let client_id = non_blank(client_id).ok_or(TokenError::MissingClientId)?;
        let client_secret = non_blank(client_secret).ok_or(TokenError::MissingClientSecret)?;
        Ok(Self::new(client_id, client_secret))
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// 同じ共有シークレットで検証する検証器を返す。
    pub fn verifier(&self) -> TokenVerifier {
        TokenVerifier::new(&self.client_secret)
    }

    /// 現在時刻で参加トークンを発行する。
    pub fn issue(&self, meeting_number: &MeetingNumber, role: Role) -> Result<IssuedToken, TokenError> {
        self.issue_at(meeting_number, role, unix_now()?)
    }

    /// 指定時刻 `now`（UNIX秒）で参加トークンを発行する。
    pub fn issue_at(
        &self,
        meeting_number: &MeetingNumber,
        role: Role,
        now: u64,
    ) -> Result<IssuedToken, TokenError> {
        let iat = now.saturating_sub(ISSUED_AT_SKEW_SECS);
        let exp = iat + TOKEN_LIFETIME_SECS;

        let claims = JoinTokenClaims {
            app_key: self.client_id.clone(),
            mn: meeting_number.clone(),
            role,
            iat,
            exp,
            token_exp: exp,
        };

        let signature = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.client_secret.as_bytes()),
        )
        .map_err(|e| TokenError::Encode(e.to_string()))?;

        tracing::debug!(
            meeting_number = %meeting_number,
            role = role.as_u8(),
            iat,
            exp,
            "参加トークンを発行"
        );

        Ok(IssuedToken {
            signature,
            client_id: self.client_id.clone(),
            claims,
        })
    }
}

// ---------------------------------------------------------------------------
// 検証
// ---------------------------------------------------------------------------

/// 参加トークン検証器。
pub struct TokenVerifier {
    key: DecodingKey,
}

impl TokenVerifier {
    pub fn new(client_secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(client_secret.as_bytes()),
        }
    }

    /// 現在時刻で検証する。
    pub fn verify(&self, token: &str) -> Result<JoinTokenClaims, TokenError> {
        self.verify_at(token, unix_now()?)
    }

    /// 署名と有効期間を検証し、クレームを返す。
    ///
    /// 有効なのは `iat <= now < exp` の間。時計ずれ分は発行時に `iat` へ
    /// 織り込み済みのため、ここでは猶予を加えない。
    pub fn verify_at(&self, token: &str, now: u64) -> Result<JoinTokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        let data = jsonwebtoken::decode::<JoinTokenClaims>(token, &self.key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            })?;
        let claims = data.claims;

        if claims.exp.checked_sub(claims.iat) != Some(TOKEN_LIFETIME_SECS)
            || claims.token_exp != claims.exp
        {
            return Err(TokenError::InvalidLifetime {
                iat: claims.iat,
                exp: claims.exp,
                token_exp: claims.token_exp,
            });
        }
        if now < claims.iat {
            return Err(TokenError::NotYetValid { iat: claims.iat, now });
        }
        if now >= claims.exp {
            return Err(TokenError::Expired { exp: claims.exp, now });
        }

        Ok(claims)
    }
}

/// 署名を検証せずにペイロードを読み出す。
///
/// ログ出力や表示用。信頼判断には [`TokenVerifier`] を使うこと。
pub fn peek_claims(token: &str) -> Result<JoinTokenClaims, TokenError> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => {
            return Err(TokenError::Malformed(
                "expected three dot-separated segments".to_string(),
            ))
        }
    };

    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| TokenError::Malformed(format!("payload is not base64url: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| TokenError::Malformed(format!("payload is not valid claims JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const NOW: u64 = 1_760_000_000;

    fn random_secret() -> String {
        let bytes: [u8; 24] = rand::thread_rng().gen();
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    fn mn(s: &str) -> MeetingNumber {
        MeetingNumber::parse(s).unwrap()
    }

    /// 発行したトークンが同じシークレットで検証でき、有効期間が2時間であることを確認
    #[test]
    fn test_issue_and_verify_window() {
        let secret = random_secret();
        let issuer = TokenIssuer::new("client-abc", secret.as_str());

        for (number, role) in [
            ("1234567890", Role::Attendee),
            ("85746065432", Role::Host),
            ("1", Role::Attendee),
        ] {
            let issued = issuer.issue_at(&mn(number), role, NOW).unwrap();
            assert_eq!(issued.client_id, "client-abc");
            assert_eq!(issued.claims.iat, NOW - 30);
            assert_eq!(issued.claims.exp, issued.claims.iat + 7200);
            assert!(issued.claims.exp > issued.claims.iat);
            assert_eq!(issued.claims.token_exp, issued.claims.exp);

            let verifier = TokenVerifier::new(&secret);
            let claims = verifier.verify_at(&issued.signature, NOW).unwrap();
            assert_eq!(claims, issued.claims);
            assert_eq!(claims.mn.as_str(), number);
            assert_eq!(claims.role, role);
            assert_eq!(claims.app_key, "client-abc");

            // 窓の境界
            assert!(verifier.verify_at(&issued.signature, claims.iat).is_ok());
            assert!(verifier.verify_at(&issued.signature, claims.exp - 1).is_ok());
            assert!(matches!(
                verifier.verify_at(&issued.signature, claims.exp),
                Err(TokenError::Expired { .. })
            ));
            assert!(matches!(
                verifier.verify_at(&issued.signature, claims.iat - 1),
                Err(TokenError::NotYetValid { .. })
            ));
        }
    }

    /// 異なるシークレットでは検証に失敗することを確認
    #[test]
    fn test_verify_with_other_secret_fails() {
        let issuer = TokenIssuer::new("client-abc", random_secret());
        let issued = issuer.issue_at(&mn("123456789"), Role::Attendee, NOW).unwrap();

        let result = TokenVerifier::new(&random_secret()).verify_at(&issued.signature, NOW);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
    }

    /// 改ざんされたペイロードが拒否されることを確認
    #[test]
    fn test_tampered_payload_rejected() {
        let issuer = TokenIssuer::new("client-abc", "shared-secret");
        let issued = issuer.issue_at(&mn("123456789"), Role::Attendee, NOW).unwrap();

        let mut forged = issued.claims.clone();
        forged.role = Role::Host;
        let forged_payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&forged).unwrap());

        let parts: Vec<&str> = issued.signature.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(issuer.verifier().verify_at(&tampered, NOW).is_err());
    }

    /// ヘッダが HS256 / JWT であることを確認
    #[test]
    fn test_header_is_hs256_jwt() {
        let issuer = TokenIssuer::new("client-abc", "shared-secret");
        let issued = issuer.issue_at(&mn("42"), Role::Attendee, NOW).unwrap();

        let header = jsonwebtoken::decode_header(&issued.signature).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
        assert_eq!(header.typ.as_deref(), Some("JWT"));
    }

    /// 設定値が欠けている場合はトークンを発行しないことを確認
    #[test]
    fn test_missing_configuration() {
        assert!(matches!(
            TokenIssuer::from_parts(None, Some("secret")),
            Err(TokenError::MissingClientId)
        ));
        assert!(matches!(
            TokenIssuer::from_parts(Some("client"), None),
            Err(TokenError::MissingClientSecret)
        ));
        assert!(matches!(
            TokenIssuer::from_parts(Some("client"), Some("   ")),
            Err(TokenError::MissingClientSecret)
        ));
        assert!(matches!(
            TokenIssuer::from_parts(None, None),
            Err(TokenError::MissingClientId)
        ));

        let issuer = TokenIssuer::from_parts(Some(" client "), Some("secret")).unwrap();
        assert_eq!(issuer.client_id(), "client");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let issuer = TokenIssuer::new("client-abc", "very-secret-value");
        let debug = format!("{issuer:?}");
        assert!(debug.contains("client-abc"));
        assert!(!debug.contains("very-secret-value"));
    }

    #[test]
    fn test_peek_claims() {
        let issuer = TokenIssuer::new("client-abc", "shared-secret");
        let issued = issuer.issue_at(&mn("555"), Role::Host, NOW).unwrap();

        let peeked = peek_claims(&issued.signature).unwrap();
        assert_eq!(peeked, issued.claims);

        assert!(peek_claims("not-a-token").is_err());
        assert!(peek_claims("a.!!!.c").is_err());
        assert!(peek_claims("a.b.c.d").is_err());
    }

    #[test]
    fn test_into_response() {
        let issuer = TokenIssuer::new("client-abc", "shared-secret");
        let issued = issuer.issue_at(&mn("555"), Role::Attendee, NOW).unwrap();
        let signature = issued.signature.clone();

        let response = issued.into_response();
        assert_eq!(response.signature, signature);
        assert_eq!(response.client_id, "client-abc");
    }
}
