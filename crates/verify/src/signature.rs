//! # リクエスト署名の検証
//!
//! 検証済み証明書から取り出したRSA公開鍵で、リクエスト本文に対する
//! 分離署名（トランスポートヘッダで別送される）を検証する。
//!
//! 検証対象は受信したままのrawバイト列でなければならない。パース後の
//! 構造体を再シリアライズした値は署名時のバイト列と一致する保証がなく、
//! 誤った拒否や、最悪の場合は誤った受理を生む。

use base64::Engine;
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use sha1::Sha1;
use x509_cert::Certificate;

use crate::{b64, VerifyError};

/// リーフ証明書の公開鍵でリクエスト本文の署名を検証する。
///
/// 署名はBase64文字列として渡され、デコード失敗・形式不正・検証不一致は
/// いずれも `InvalidSignature` として返す。
pub fn verify_signature_with_cert(
    cert: &Certificate,
    signature_b64: &str,
    raw_body: &[u8],
) -> Result<(), VerifyError> {
    let spki_der = der::Encode::to_der(&cert.tbs_certificate.subject_public_key_info)
        .map_err(|e| {
            VerifyError::UnparseableCertificate(format!("公開鍵のDERエンコードに失敗: {e}"))
        })?;

    let public_key = rsa::RsaPublicKey::from_public_key_der(&spki_der).map_err(|e| {
        VerifyError::UnparseableCertificate(format!("RSA公開鍵のパースに失敗: {e}"))
    })?;

    let sig_bytes = b64()
        .decode(signature_b64)
        .map_err(|_| VerifyError::InvalidSignature)?;
    let signature = rsa::pkcs1v15::Signature::try_from(sig_bytes.as_slice())
        .map_err(|_| VerifyError::InvalidSignature)?;

    // プラットフォームはSHA-1ベースのPKCS#1 v1.5署名を用いる
    let verifying_key = rsa::pkcs1v15::VerifyingKey::<Sha1>::new(public_key);
    verifying_key
        .verify(raw_body, &signature)
        .map_err(|_| VerifyError::InvalidSignature)
}
