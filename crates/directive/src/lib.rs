//! # Koe ディレクティブ送信
//!
//! 検証済みリクエストが運ぶアクセストークンとコールバックエンドポイントを
//! 使い、プラットフォームへ追加のコマンド（ディレクティブ）を送り返す。
//!
//! 送信は最大1回で、再試行は行わない。読み上げディレクティブの重複は
//! そのまま二重発話になるため、冪等性の管理は呼び出し側に委ねる。

use std::time::Duration;

use koe_types::{DirectiveHeader, DirectiveRequest, SpeakDirective, SPEAK_DIRECTIVE_TYPE};
use koe_verify::VerifiedRequest;

/// ディレクティブAPIのパス。
pub const DIRECTIVE_PATH: &str = "/v1/directives";

/// ディレクティブ送信の接続タイムアウト
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// ディレクティブ送信の応答タイムアウト
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(15);

/// ディレクティブ送信のエラー型。
///
/// HTTPレベルのエラー応答（4xx/5xx）はエラーではなく通常の
/// [`DirectiveResponse`] として返す。ここに現れるのはDNS・接続・
/// タイムアウト等のトランスポート障害のみ。
#[derive(Debug, thiserror::Error)]
pub enum DirectiveError {
    /// トランスポート障害（DNS・接続・タイムアウト）
    #[error("ディレクティブの送信に失敗: {0}")]
    Network(String),
    /// クライアント構築等の内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

/// プラットフォームからのHTTP応答。
///
/// ステータスコードの解釈は呼び出し側が行う。プラットフォームからの
/// 4xx（期限切れトークン等）は業務上の結果でありトランスポート障害
/// ではない。
#[derive(Debug, Clone)]
pub struct DirectiveResponse {
    /// HTTPステータスコード
    pub status: u16,
    /// 応答ボディ
    pub body: String,
}

impl DirectiveResponse {
    /// ステータスコードが2xxかどうか。
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// ディレクティブ送信クライアント。
///
/// 検証済みリクエスト（[`VerifiedRequest`]）だけを受け付ける。
/// 未検証のリクエストからディレクティブを送る経路は型レベルで存在しない。
pub struct DirectiveClient {
    http_client: reqwest::Client,
}

impl DirectiveClient {
    /// 接続5秒・応答15秒のタイムアウトでクライアントを構築する。
    pub fn new() -> Result<Self, DirectiveError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(RESPONSE_TIMEOUT)
            .build()
            .map_err(|e| DirectiveError::Internal(format!("HTTPクライアントの構築に失敗: {e}")))?;

        Ok(Self { http_client })
    }

    /// 読み上げディレクティブを送信する。
    ///
    /// `POST {endpoint}/v1/directives` に `Authorization: Bearer` と
    /// `Accept: application/json` を付けてJSONボディを送る。
    pub async fn speak(
        &self,
        request: &VerifiedRequest<'_>,
        text: &str,
    ) -> Result<DirectiveResponse, DirectiveError> {
        let payload = DirectiveRequest {
            header: DirectiveHeader {
                request_id: request.request_id().to_string(),
            },
            directive: SpeakDirective {
                directive_type: SPEAK_DIRECTIVE_TYPE.to_string(),
                speech: text.to_string(),
            },
        };

        let url = format!("{}{}", request.endpoint(), DIRECTIVE_PATH);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(request.access_token())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| DirectiveError::Network(format!("HTTP送信失敗: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| DirectiveError::Network(format!("レスポンス読み取り失敗: {e}")))?;

        Ok(DirectiveResponse { status, body })
    }
}
