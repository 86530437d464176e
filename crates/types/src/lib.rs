//! # Koe 共有型定義
//!
//! 音声アシスタントプラットフォームから受信するWebhookペイロードと、
//! プラットフォームへ送り返すディレクティブのワイヤー型をRust構造体として提供する。
//!
//! ## エンコーディング規則
//! - タイムスタンプ: ISO-8601 (RFC 3339) 文字列
//! - 署名: Base64（トランスポートヘッダ経由、ボディには含まれない）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

mod registry;

pub use registry::{
    IntentRequest, LaunchRequest, RequestFactory, RequestRegistry, SessionEndedRequest,
    TypedRequest,
};

// ---------------------------------------------------------------------------
// トランスポートヘッダ
// ---------------------------------------------------------------------------

/// 証明書チェーンURLを運ぶHTTPヘッダ名。
pub const HEADER_CERT_CHAIN_URL: &str = "SignatureCertChainUrl";
/// Base64署名を運ぶHTTPヘッダ名。
pub const HEADER_SIGNATURE: &str = "Signature";

/// トランスポート層から明示的に渡される帯域外ヘッダ値。
///
/// プラットフォームはリクエストボディに署名し、その証明は
/// ボディ外のHTTPヘッダで送られてくる。受信側のトランスポート層が
/// この2値を読み取り、リクエスト構築時に明示的に渡す。
#[derive(Debug, Clone, Default)]
pub struct SignatureHeaders {
    /// `SignatureCertChainUrl` ヘッダの値
    pub cert_chain_url: Option<String>,
    /// `Signature` ヘッダの値（Base64）
    pub signature: Option<String>,
}

// ---------------------------------------------------------------------------
// 受信ペイロード
// ---------------------------------------------------------------------------

/// Webhookで受信するペイロード全体。
#[derive(Debug, Clone, Deserialize)]
pub struct RequestBody {
    /// リクエスト本体（種別・ID・タイムスタンプ）
    pub request: RequestSection,
    /// セッション情報
    pub session: Session,
    /// システムコンテキスト（APIトークン・エンドポイント）
    pub context: Context,
}

/// ペイロードの `request` セクション。
#[derive(Debug, Clone, Deserialize)]
pub struct RequestSection {
    /// リクエスト識別子。ディレクティブ送信時にエコーバックする
    #[serde(rename = "requestId")]
    pub request_id: String,
    /// リクエスト種別名（レジストリのディスパッチキー）
    #[serde(rename = "type")]
    pub request_type: String,
    /// 送信側が申告するタイムスタンプ（ISO-8601）
    pub timestamp: DateTime<Utc>,
    /// インテント情報（IntentRequestのみ）
    #[serde(default)]
    pub intent: Option<Intent>,
    /// セッション終了理由（SessionEndedRequestのみ）
    #[serde(default)]
    pub reason: Option<String>,
}

/// インテントとそのスロット値。
#[derive(Debug, Clone, Deserialize)]
pub struct Intent {
    /// インテント名
    pub name: String,
    /// スロット名 → スロット値のマップ
    #[serde(default)]
    pub slots: HashMap<String, Slot>,
}

/// インテントのスロット。
#[derive(Debug, Clone, Deserialize)]
pub struct Slot {
    /// スロット名
    pub name: String,
    /// 解決済みのスロット値（未指定の場合あり）
    #[serde(default)]
    pub value: Option<String>,
}

/// ペイロードの `session` セクション。
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    /// セッション識別子
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
    /// ユーザー情報
    pub user: User,
}

/// セッションのユーザー情報。不変条件は課さず、そのまま運搬する。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// ユーザー識別子
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    /// アカウントリンク済みの場合のアクセストークン
    #[serde(rename = "accessToken", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// その他のフィールド（温存のみ）
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// ペイロードの `context` セクション。
#[derive(Debug, Clone, Deserialize)]
pub struct Context {
    /// システムコンテキスト
    #[serde(rename = "System")]
    pub system: System,
}

/// `context.System` — 送り返しに必要な認証情報。
#[derive(Debug, Clone, Deserialize)]
pub struct System {
    /// プラットフォームAPIのBearerトークン
    #[serde(rename = "apiAccessToken")]
    pub api_access_token: String,
    /// プラットフォームAPIのベースURL（末尾スラッシュなし）
    #[serde(rename = "apiEndpoint")]
    pub api_endpoint: String,
}

// ---------------------------------------------------------------------------
// リクエストエンベロープ
// ---------------------------------------------------------------------------

/// 検証パイプラインとディレクティブ送信が参照するリクエストの中核。
///
/// ペイロードとトランスポートヘッダから構築される不変の値オブジェクト。
/// 検証済みかどうかはこの型では表現せず、パイプラインが返す
/// 検証済みラッパー型で表現する。
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    /// リクエスト識別子
    pub request_id: String,
    /// 送信側が申告するタイムスタンプ
    pub timestamp: DateTime<Utc>,
    /// ユーザー情報（そのまま運搬）
    pub user: User,
    /// 証明書チェーンURL（`SignatureCertChainUrl` ヘッダ由来）
    pub certificate_url: Option<String>,
    /// Base64署名（`Signature` ヘッダ由来）
    pub signature: Option<String>,
    /// プラットフォームAPIのBearerトークン
    pub access_token: String,
    /// プラットフォームAPIのベースURL
    pub endpoint: String,
}

impl RequestEnvelope {
    /// パース済みペイロードとトランスポートヘッダからエンベロープを構築する。
    pub fn from_body(body: &RequestBody, headers: SignatureHeaders) -> Self {
        Self {
            request_id: body.request.request_id.clone(),
            timestamp: body.request.timestamp,
            user: body.session.user.clone(),
            certificate_url: headers.cert_chain_url,
            signature: headers.signature,
            access_token: body.context.system.api_access_token.clone(),
            endpoint: body.context.system.api_endpoint.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// ディレクティブ（送信）
// ---------------------------------------------------------------------------

/// 読み上げディレクティブの種別名。
pub const SPEAK_DIRECTIVE_TYPE: &str = "VoicePlayer.Speak";

/// `POST {endpoint}/v1/directives` のリクエストボディ。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectiveRequest {
    /// 対象リクエストの識別情報
    pub header: DirectiveHeader,
    /// ディレクティブ本体
    pub directive: SpeakDirective,
}

/// ディレクティブのヘッダ部。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectiveHeader {
    /// 受信リクエストの識別子をエコーバックする
    #[serde(rename = "requestId")]
    pub request_id: String,
}

/// 読み上げディレクティブの本体。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakDirective {
    /// ディレクティブ種別（`VoicePlayer.Speak`）
    #[serde(rename = "type")]
    pub directive_type: String,
    /// 読み上げるテキスト
    pub speech: String,
}

// ---------------------------------------------------------------------------
// エラー型
// ---------------------------------------------------------------------------

/// 型定義層のエラー。
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// レジストリに登録されていないリクエスト種別
    #[error("未知のリクエスト種別です: {0}")]
    UnknownRequestType(String),
    /// 種別に対して必須フィールドが欠けている等
    #[error("ペイロードが不正です: {0}")]
    MalformedPayload(String),
}
