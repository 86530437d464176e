//! # Koe 認証・信頼検証
//!
//! 音声アシスタントプラットフォームから送信されたと主張するWebhook
//! リクエストを認証する検証パイプラインを提供する。
//!
//! ## 検証ステップ
//! | ステップ | 内容 |
//! |---------|------|
//! | 鮮度 | 申告タイムスタンプが許容秒数以内 |
//! | URL構造 | 証明書チェーンURLが信頼された配布元を指す |
//! | 証明書内容 | subjectAltNameと有効期間の検査 |
//! | 署名 | SHA-1 RSA PKCS#1 v1.5による本文署名の検証 |
//!
//! 署名アルゴリズムはプラットフォーム側の署名実装に合わせたSHA-1 RSAで、
//! 相互運用のため検証側では変更できない。

use std::time::Duration;

pub mod certificate;
pub mod chain_url;
pub mod error;
pub mod freshness;
pub mod pipeline;
pub mod signature;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::VerifyError;
pub use pipeline::{VerificationMode, VerifiedRequest, Verifier};

/// タイムスタンプ許容秒数の既定値
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 30;
/// 証明書チェーンURLに要求されるスキーム
pub const CERT_CHAIN_SCHEME: &str = "https";
/// 証明書チェーンURLに要求されるホスト
pub const CERT_CHAIN_HOST: &str = "s3.amazonaws.com";
/// 証明書チェーンURLに要求されるパスプレフィックス
pub const CERT_CHAIN_PATH_PREFIX: &str = "/echo.api/";
/// 証明書チェーンURLに許される明示ポート
pub const CERT_CHAIN_PORT: u16 = 443;
/// 証明書のsubjectAltNameに要求される識別子
pub const CERT_SUBJECT_ALT_NAME: &str = "echo-api.amazon.com";
/// 証明書取得の接続タイムアウト
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// 証明書取得の応答タイムアウト
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(15);

/// Base64エンジン（Standard）
pub(crate) fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}
