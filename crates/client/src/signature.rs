//! # 署名エンドポイント クライアント
//!
//! `POST {meetingNumber, role}` で参加トークンを取得する。
//! エンドポイントは絶対URLでも相対パスでもよく、相対パスの場合はページの
//! ベースURLに対して解決する。

use lecture_types::{MeetingNumber, Role, SignatureRequest};
use reqwest::Url;
use serde::Deserialize;

use crate::error::ClientError;

/// 署名取得のタイムアウト（秒）
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// 取得した署名。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSignature {
    /// 参加トークン
    pub signature: String,
    /// レスポンスに含まれていたSDKキー（`clientId`）
    pub sdk_key: Option<String>,
}

/// レスポンスを寛容に受けるための形。欠落はここでは許し、後で検査する。
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSignatureResponse {
    signature: Option<String>,
    client_id: Option<String>,
}

/// 署名エンドポイントのクライアント。
#[derive(Debug, Clone)]
pub struct SignatureClient {
    http: reqwest::Client,
    base_url: Option<Url>,
}

impl SignatureClient {
    /// `base_url` は相対エンドポイントの解決に使う（通常はページのURL）。
    pub fn new(base_url: Option<Url>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ClientError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, base_url })
    }

    /// エンドポイントを絶対URLに解決する。
    pub fn resolve(&self, endpoint: &str) -> Result<Url, ClientError> {
        let invalid = |reason: String| ClientError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        // 絶対URLはベースURLに関わらずそのまま採用される
        let resolved = match &self.base_url {
            Some(base) => base.join(endpoint),
            None => Url::parse(endpoint),
        };
        resolved.map_err(|e| invalid(e.to_string()))
    }

    /// 署名を取得する。
    ///
    /// - 通信失敗: [`ClientError::Network`]
    /// - 2xx以外: [`ClientError::SignatureRequest`]（ステータスと本文を含む）
    /// - JSONでない、署名が欠落・空: [`ClientError::MalformedResponse`]
    pub async fn fetch(
        &self,
        endpoint: &str,
        meeting_number: &MeetingNumber,
        role: Role,
    ) -> Result<FetchedSignature, ClientError> {
        let url = self.resolve(endpoint)?;
        let request = SignatureRequest {
            meeting_number: meeting_number.clone(),
            role,
        };

        tracing::debug!(url = %url, meeting_number = %meeting_number, "署名を要求します");

        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if status.is_success() => {
                return Err(ClientError::Network(format!(
                    "failed to read signature response: {e}"
                )));
            }
            // 本文が読めない場合でもステータスは報告する
            Err(_) => String::new(),
        };

        if !status.is_success() {
            return Err(ClientError::SignatureRequest {
                status: status.to_string(),
                body: body.trim().to_string(),
            });
        }

        let raw: RawSignatureResponse = serde_json::from_str(&body).map_err(|e| {
            ClientError::MalformedResponse(format!("Signature response could not be parsed: {e}"))
        })?;

        let signature = raw.signature.filter(|s| !s.is_empty()).ok_or_else(|| {
            ClientError::MalformedResponse(
                "Signature missing or invalid from endpoint response.".to_string(),
            )
        })?;

        if let Ok(claims) = lecture_token::peek_claims(&signature) {
            tracing::debug!(exp = claims.exp, "署名を受信しました");
        }

        Ok(FetchedSignature {
            signature,
            sdk_key: raw.client_id.filter(|k| !k.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_and_absolute() {
        let base = Url::parse("https://class.example/room/live?meetingNumber=1").unwrap();
        let client = SignatureClient::new(Some(base)).unwrap();

        assert_eq!(
            client.resolve("/api/zoom/signature").unwrap().as_str(),
            "https://class.example/api/zoom/signature"
        );
        assert_eq!(
            client
                .resolve("https://sign.example/api/zoom/signature")
                .unwrap()
                .as_str(),
            "https://sign.example/api/zoom/signature"
        );
    }

    /// 本文の途中で接続を切るサーバーを起動し、URLを返す。
    async fn start_truncating_server(status_line: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let head = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{{\"sig"
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        format!("http://127.0.0.1:{port}/api/zoom/signature")
    }

    /// 2xxで本文の読み取りに失敗した場合は通信エラーとして報告されることを確認
    #[tokio::test]
    async fn test_truncated_success_body_is_network_error() {
        let url = start_truncating_server("200 OK").await;
        let client = SignatureClient::new(None).unwrap();
        let mn = MeetingNumber::parse("123").unwrap();

        let err = client.fetch(&url, &mn, Role::Attendee).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)), "got {err:?}");
    }

    /// 2xx以外で本文が読めない場合もステータスは報告されることを確認
    #[tokio::test]
    async fn test_truncated_error_body_keeps_status() {
        let url = start_truncating_server("502 Bad Gateway").await;
        let client = SignatureClient::new(None).unwrap();
        let mn = MeetingNumber::parse("123").unwrap();

        match client.fetch(&url, &mn, Role::Attendee).await.unwrap_err() {
            ClientError::SignatureRequest { status, body } => {
                assert_eq!(status, "502 Bad Gateway");
                assert!(body.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_relative_without_base_is_error() {
        let client = SignatureClient::new(None).unwrap();
        assert!(matches!(
            client.resolve("/api/zoom/signature"),
            Err(ClientError::InvalidEndpoint { .. })
        ));
    }
}
