//! # 証明書チェーンURLの構造検査
//!
//! 攻撃者が指定したURLは、信頼された配布元を指すと構造的に確認
//! できるまで決してデリファレンスしない。取得処理とは意図的に
//! 分離された、ネットワークアクセスを伴わない文字列検査。

use url::Url;

use crate::{
    VerifyError, CERT_CHAIN_HOST, CERT_CHAIN_PATH_PREFIX, CERT_CHAIN_PORT, CERT_CHAIN_SCHEME,
};

/// 証明書チェーンURLが信頼された配布元を指すことを構造的に検査する。
///
/// 検査は次の順でフェイルファストに行う:
/// 1. URLが存在する
/// 2. スキームが `https`
/// 3. ホストが配布元と完全一致
/// 4. パスが既定プレフィックスで始まる
/// 5. 明示ポートがある場合は既定値と一致
pub fn check_certificate_url(url: Option<&str>) -> Result<(), VerifyError> {
    let raw = url.ok_or(VerifyError::MissingCertificate)?;

    let parsed =
        Url::parse(raw).map_err(|e| VerifyError::MalformedCertificateUrl(e.to_string()))?;

    if parsed.scheme() != CERT_CHAIN_SCHEME {
        return Err(VerifyError::InsecureProtocol);
    }
    if parsed.host_str() != Some(CERT_CHAIN_HOST) {
        return Err(VerifyError::UntrustedHost);
    }
    if !parsed.path().starts_with(CERT_CHAIN_PATH_PREFIX) {
        return Err(VerifyError::InvalidPath);
    }
    // Url::port() はスキームの既定ポート（https:443）を None に正規化するため、
    // Some が返るのは既定値以外の明示ポートのときだけ
    if let Some(port) = parsed.port() {
        if port != CERT_CHAIN_PORT {
            return Err(VerifyError::InvalidPort);
        }
    }

    Ok(())
}
