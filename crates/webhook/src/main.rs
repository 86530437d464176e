//! # Koe Webhookサーバー
//!
//! 音声アシスタントプラットフォームからのリクエストを受信し、
//! 認証パイプラインで検証するWebhookエンドポイント。
//!
//! ## エンドポイント
//! - `POST /webhook` — リクエスト受信・検証
//!
//! ## 環境変数
//! - `BIND_ADDR` — 待ち受けアドレス（既定: `0.0.0.0:3000`）
//! - `VERIFY_MODE` — `full`（既定）または `signature-only`
//! - `TIMESTAMP_TOLERANCE_SECS` — タイムスタンプ許容秒数（既定: 30）

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;

use koe_types::{
    RequestBody, RequestRegistry, SignatureHeaders, TypesError, HEADER_CERT_CHAIN_URL,
    HEADER_SIGNATURE,
};
use koe_verify::{VerificationMode, Verifier, VerifyError};

// ---------------------------------------------------------------------------
// エラー型
// ---------------------------------------------------------------------------

/// Webhookエラー型。
#[derive(Debug, thiserror::Error)]
enum WebhookError {
    /// 認証パイプラインによる拒否
    #[error("{0}")]
    Rejected(#[from] VerifyError),
    /// リクエスト種別の解決に失敗
    #[error("{0}")]
    Dispatch(#[from] TypesError),
    /// ペイロードのパースに失敗
    #[error("ペイロードのパースに失敗: {0}")]
    BadPayload(String),
}

impl axum::response::IntoResponse for WebhookError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            // トランスポート障害は偽造リクエストではなくインフラ障害
            WebhookError::Rejected(VerifyError::Network(_)) => StatusCode::BAD_GATEWAY,
            WebhookError::Rejected(_) => StatusCode::BAD_REQUEST,
            WebhookError::Dispatch(_) | WebhookError::BadPayload(_) => StatusCode::BAD_REQUEST,
        };
        (status, self.to_string()).into_response()
    }
}

// ---------------------------------------------------------------------------
// 共有状態
// ---------------------------------------------------------------------------

/// Webhookサーバーの共有状態。
struct AppState {
    /// 認証パイプライン
    verifier: Verifier,
    /// リクエスト種別レジストリ（起動時に登録済み）
    registry: RequestRegistry,
}

// ---------------------------------------------------------------------------
// ハンドラ
// ---------------------------------------------------------------------------

/// 検証成功時の応答。
#[derive(Debug, Serialize)]
struct WebhookAck {
    /// 受信リクエストの識別子
    #[serde(rename = "requestId")]
    request_id: String,
    /// ディスパッチされた種別名
    #[serde(rename = "requestType")]
    request_type: &'static str,
}

/// ヘッダ値を文字列として取り出す。
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(String::from)
}

/// POST /webhook — リクエスト受信・検証。
///
/// 署名の検証対象は受信したままのrawボディバイト列。パース後の再
/// シリアライズ値は決して使わない。
async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, WebhookError> {
    let signature_headers = SignatureHeaders {
        cert_chain_url: header_value(&headers, HEADER_CERT_CHAIN_URL),
        signature: header_value(&headers, HEADER_SIGNATURE),
    };

    let payload: RequestBody =
        serde_json::from_slice(&body).map_err(|e| WebhookError::BadPayload(e.to_string()))?;

    let typed = state.registry.construct(&payload, signature_headers)?;
    let envelope = typed.envelope();

    let verified = match state.verifier.verify(envelope, &body).await {
        Ok(verified) => verified,
        Err(reason) => {
            // 署名系の失敗は侵入検知のため他の拒否理由と区別してログする
            if reason.is_signature_class() {
                tracing::warn!(
                    request_id = %envelope.request_id,
                    reason = %reason,
                    "署名検証に失敗したリクエストを拒否"
                );
            } else {
                tracing::info!(
                    request_id = %envelope.request_id,
                    reason = %reason,
                    "リクエストを拒否"
                );
            }
            return Err(WebhookError::Rejected(reason));
        }
    };

    tracing::info!(
        request_id = %verified.request_id(),
        request_type = typed.type_name(),
        "リクエストを認証"
    );

    Ok(Json(WebhookAck {
        request_id: verified.request_id().to_string(),
        request_type: typed.type_name(),
    }))
}

// ---------------------------------------------------------------------------
// エントリポイント
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // 環境変数の読み込み
    let bind_addr =
        std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let mode_value =
        std::env::var("VERIFY_MODE").unwrap_or_else(|_| "full".to_string());
    let mode = match mode_value.as_str() {
        "full" => VerificationMode::Full,
        "signature-only" => VerificationMode::SignatureOnly,
        other => anyhow::bail!(
            "VERIFY_MODEが不正です: {other}（full / signature-only のいずれか）"
        ),
    };

    let tolerance_secs = match std::env::var("TIMESTAMP_TOLERANCE_SECS") {
        Ok(value) => value
            .parse::<i64>()
            .map_err(|_| anyhow::anyhow!("TIMESTAMP_TOLERANCE_SECSが不正です: {value}"))?,
        Err(_) => koe_verify::TIMESTAMP_TOLERANCE_SECS,
    };

    let state = Arc::new(AppState {
        verifier: Verifier::new(mode)?.with_tolerance(tolerance_secs),
        registry: RequestRegistry::builtin(),
    });

    tracing::info!(
        mode = ?mode,
        tolerance_secs,
        "検証パイプラインを構成"
    );

    let app = axum::Router::new()
        .route("/webhook", axum::routing::post(handle_webhook))
        .with_state(state);

    tracing::info!("Webhookサーバーを {} で起動します", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// テスト
// ---------------------------------------------------------------------------
