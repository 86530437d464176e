//! # 証明書の取得と内容検査
//!
//! 構造検査を通過したURLから署名証明書を取得し、PEMチェーンとして
//! パースした上で subjectAltName と有効期間を検査する。
//! 取得した証明書はリクエストをまたいでキャッシュしない。
//! 検証は受信リクエストごとに1回きりで、独立に行われる。

use chrono::{DateTime, Utc};
use der::Decode;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::SubjectAltName;
use x509_cert::Certificate;

use crate::{VerifyError, CERT_SUBJECT_ALT_NAME};

/// subjectAltName拡張のOID (2.5.29.17)
const SUBJECT_ALT_NAME_OID: der::asn1::ObjectIdentifier =
    der::asn1::ObjectIdentifier::new_unwrap("2.5.29.17");

/// URLから証明書のrawバイト列を取得する。
///
/// トランスポート障害と非2xx応答はいずれも `Network` として返す。
/// 偽造リクエストではなくインフラ障害を示すため、認証失敗の
/// 理由群とは区別される。
pub(crate) async fn fetch_certificate(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<u8>, VerifyError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| VerifyError::Network(format!("証明書の取得に失敗: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(VerifyError::Network(format!(
            "証明書の取得先がエラーを返しました: HTTP {status}"
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| VerifyError::Network(format!("証明書の読み取りに失敗: {e}")))?;

    Ok(bytes.to_vec())
}

/// PEMバイト列から先頭（リーフ）証明書をパースする。
pub(crate) fn parse_leaf_certificate(pem: &[u8]) -> Result<Certificate, VerifyError> {
    let chain = Certificate::load_pem_chain(pem)
        .map_err(|e| VerifyError::UnparseableCertificate(format!("PEMのパースに失敗: {e}")))?;

    chain.into_iter().next().ok_or_else(|| {
        VerifyError::UnparseableCertificate("PEMに証明書が含まれていません".to_string())
    })
}

/// 証明書の内容を検査し、後続の署名検証で使えるリーフ証明書を返す。
///
/// - subjectAltNameに信頼された識別子が含まれること
/// - `now` が有効期間 `[not_before, not_after]` に収まること
pub fn validate_certificate(
    pem: &[u8],
    now: DateTime<Utc>,
) -> Result<Certificate, VerifyError> {
    let cert = parse_leaf_certificate(pem)?;
    check_subject_alt_name(&cert)?;
    check_validity_window(&cert, now)?;
    Ok(cert)
}

/// subjectAltNameのDNS名に信頼された識別子が含まれることを検査する。
fn check_subject_alt_name(cert: &Certificate) -> Result<(), VerifyError> {
    let extensions = cert.tbs_certificate.extensions.as_deref().unwrap_or(&[]);

    let san_ext = extensions
        .iter()
        .find(|ext| ext.extn_id == SUBJECT_ALT_NAME_OID)
        .ok_or(VerifyError::UntrustedSubject)?;

    let san = SubjectAltName::from_der(san_ext.extn_value.as_bytes()).map_err(|e| {
        VerifyError::UnparseableCertificate(format!("subjectAltNameのパースに失敗: {e}"))
    })?;

    let trusted = san.0.iter().any(|name| match name {
        GeneralName::DnsName(dns) => dns.as_str().contains(CERT_SUBJECT_ALT_NAME),
        _ => false,
    });

    if trusted {
        Ok(())
    } else {
        Err(VerifyError::UntrustedSubject)
    }
}

/// `now` が証明書の有効期間に収まることを検査する。
fn check_validity_window(cert: &Certificate, now: DateTime<Utc>) -> Result<(), VerifyError> {
    let validity = &cert.tbs_certificate.validity;
    let now_secs = now.timestamp();

    let not_before = validity.not_before.to_unix_duration().as_secs() as i64;
    let not_after = validity.not_after.to_unix_duration().as_secs() as i64;

    if not_before > now_secs {
        return Err(VerifyError::NotYetValid);
    }
    if not_after < now_secs {
        return Err(VerifyError::Expired);
    }

    Ok(())
}
