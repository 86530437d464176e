//! # 認証パイプライン
//!
//! 個別の検査（鮮度・URL構造・証明書内容・署名）を所定の順に合成し、
//! 最初の失敗を具体的な理由のまま呼び出し側へ返す。どのステップも
//! 自動では再試行しない。
//!
//! 検証モードは明示的な設定として公開する:
//! - `Full`（既定）: 鮮度 → URL構造 → 証明書内容 → 署名 の4段チェーン
//! - `SignatureOnly`: 鮮度 → 署名 のみ（証明書URLの構造・内容検査を省略）
//!
//! 全ステップを通過したリクエストだけが `VerifiedRequest` になる。
//! 部分的に検証済みの状態は外部から観測できない。

use chrono::Utc;
use koe_types::RequestEnvelope;

use crate::certificate::{self, parse_leaf_certificate};
use crate::{
    chain_url, freshness, signature, VerifyError, CONNECT_TIMEOUT, RESPONSE_TIMEOUT,
    TIMESTAMP_TOLERANCE_SECS,
};

/// 検証パイプラインの動作モード。
///
/// 弱い側のモードが暗黙に選ばれることがないよう、構築時に必ず指定する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationMode {
    /// 4段チェーン（鮮度・URL構造・証明書内容・署名）
    Full,
    /// 鮮度と署名のみ
    SignatureOnly,
}

impl Default for VerificationMode {
    fn default() -> Self {
        VerificationMode::Full
    }
}

/// 認証パイプライン。
///
/// HTTPクライアント・検証モード・許容秒数を保持する。リクエストを
/// またぐ可変状態は持たないため、複数リクエストの検証を並行して
/// 実行できる。
pub struct Verifier {
    http_client: reqwest::Client,
    mode: VerificationMode,
    tolerance_secs: i64,
}

impl Verifier {
    /// 指定モードのパイプラインを構築する。
    ///
    /// 証明書取得には接続5秒・応答15秒のタイムアウトを適用する。
    pub fn new(mode: VerificationMode) -> Result<Self, VerifyError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(RESPONSE_TIMEOUT)
            .build()
            .map_err(|e| VerifyError::Network(format!("HTTPクライアントの構築に失敗: {e}")))?;

        Ok(Self {
            http_client,
            mode,
            tolerance_secs: TIMESTAMP_TOLERANCE_SECS,
        })
    }

    /// タイムスタンプ許容秒数を差し替える。
    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// 構築時に指定した検証モード。
    pub fn mode(&self) -> VerificationMode {
        self.mode
    }

    /// リクエストを検証し、成功時に検証済みラッパーを返す。
    ///
    /// `raw_body` は受信したままのリクエスト本文バイト列であること。
    /// ステップはモードが定める順で実行され、最初の失敗で打ち切る。
    pub async fn verify<'a>(
        &self,
        envelope: &'a RequestEnvelope,
        raw_body: &[u8],
    ) -> Result<VerifiedRequest<'a>, VerifyError> {
        freshness::check_freshness(envelope.timestamp, Utc::now(), self.tolerance_secs)?;

        if self.mode == VerificationMode::Full {
            chain_url::check_certificate_url(envelope.certificate_url.as_deref())?;
            self.check_certificate_content(envelope.certificate_url.as_deref())
                .await?;
        }

        self.verify_signature(
            envelope.certificate_url.as_deref(),
            envelope.signature.as_deref(),
            raw_body,
        )
        .await?;

        Ok(VerifiedRequest {
            envelope,
            mode: self.mode,
        })
    }

    /// 証明書を取得し、subjectAltNameと有効期間を検査する。
    ///
    /// URLは事前に構造検査を通過していることを呼び出し側が保証する。
    /// ここでは構造の再検査は行わない。
    pub async fn check_certificate_content(
        &self,
        url: Option<&str>,
    ) -> Result<(), VerifyError> {
        let url = url.ok_or(VerifyError::MissingCertificate)?;

        let pem = certificate::fetch_certificate(&self.http_client, url).await?;
        certificate::validate_certificate(&pem, Utc::now())?;

        Ok(())
    }

    /// 証明書を取得し直し、その公開鍵で本文署名を検証する。
    ///
    /// 証明書内容の検査とは独立に取得を行い、取得結果はキャッシュしない。
    pub async fn verify_signature(
        &self,
        url: Option<&str>,
        signature_b64: Option<&str>,
        raw_body: &[u8],
    ) -> Result<(), VerifyError> {
        let (url, signature_b64) = match (url, signature_b64) {
            (Some(url), Some(signature_b64)) => (url, signature_b64),
            _ => return Err(VerifyError::MissingSignature),
        };

        let pem = certificate::fetch_certificate(&self.http_client, url).await?;
        let cert = parse_leaf_certificate(&pem)?;

        signature::verify_signature_with_cert(&cert, signature_b64, raw_body)
    }
}

/// 全ステップを通過したリクエスト。
///
/// パイプライン経由でしか構築できないため、この型を受け取るコードは
/// 検証済みであることを前提にできる。ディレクティブ送信に必要な
/// フィールドへの読み取りアクセスだけを公開する。
#[derive(Debug, Clone, Copy)]
pub struct VerifiedRequest<'a> {
    envelope: &'a RequestEnvelope,
    mode: VerificationMode,
}

impl<'a> VerifiedRequest<'a> {
    /// 元のエンベロープへの参照。
    pub fn envelope(&self) -> &RequestEnvelope {
        self.envelope
    }

    /// リクエスト識別子。
    pub fn request_id(&self) -> &str {
        &self.envelope.request_id
    }

    /// プラットフォームAPIのBearerトークン。
    pub fn access_token(&self) -> &str {
        &self.envelope.access_token
    }

    /// プラットフォームAPIのベースURL。
    pub fn endpoint(&self) -> &str {
        &self.envelope.endpoint
    }

    /// このリクエストを検証したモード。
    pub fn mode(&self) -> VerificationMode {
        self.mode
    }
}
