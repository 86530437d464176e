//! テスト用フィクスチャ。
//!
//! RSA鍵ペア・自己署名証明書（PEM）・本文署名と、証明書を配信する
//! モックHTTPサーバーを提供する。

use std::sync::OnceLock;

use base64::Engine;
use der::asn1::{BitString, GeneralizedTime, Ia5String, ObjectIdentifier, OctetString};
use der::{Decode, Encode, EncodePem};
use rsa::pkcs8::EncodePublicKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha1::Sha1;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::SubjectAltName;

use crate::b64;

/// テスト用RSA秘密鍵（生成が重いためプロセス内で共有する）。
pub(crate) fn test_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| {
        RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048).expect("RSA鍵の生成に失敗")
    })
}

/// 署名者違いのケース用の別鍵。
pub(crate) fn other_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| {
        RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048).expect("RSA鍵の生成に失敗")
    })
}

/// テスト証明書の内容オプション。
pub(crate) struct TestCertOptions {
    /// subjectAltNameに載せるDNS名（Noneで拡張自体を省略）
    pub san: Option<&'static str>,
    /// 有効期間の開始年
    pub not_before_year: u16,
    /// 有効期間の終了年
    pub not_after_year: u16,
}

impl Default for TestCertOptions {
    fn default() -> Self {
        Self {
            san: Some("echo-api.amazon.com"),
            not_before_year: 2020,
            not_after_year: 2049,
        }
    }
}

/// 自己署名のRSA証明書を作り、PEM文字列で返す。
pub(crate) fn build_certificate_pem(key: &RsaPrivateKey, options: &TestCertOptions) -> String {
    let spki_doc = key
        .to_public_key()
        .to_public_key_der()
        .expect("SPKIのエンコードに失敗");
    let spki = x509_cert::spki::SubjectPublicKeyInfoOwned::from_der(spki_doc.as_bytes())
        .expect("SPKIのパースに失敗");

    let serial = x509_cert::serial_number::SerialNumber::new(&[1]).expect("シリアル番号");
    // sha1WithRSAEncryption
    let sig_alg = x509_cert::spki::AlgorithmIdentifierOwned {
        oid: ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5"),
        parameters: None,
    };

    let name = x509_cert::name::Name::default();

    let validity = x509_cert::time::Validity {
        not_before: x509_cert::time::Time::GeneralTime(GeneralizedTime::from_date_time(
            der::DateTime::new(options.not_before_year, 1, 1, 0, 0, 0).expect("開始日時"),
        )),
        not_after: x509_cert::time::Time::GeneralTime(GeneralizedTime::from_date_time(
            der::DateTime::new(options.not_after_year, 12, 31, 23, 59, 59).expect("終了日時"),
        )),
    };

    let extensions = options.san.map(|dns| {
        let san = SubjectAltName(vec![GeneralName::DnsName(
            Ia5String::new(dns).expect("DNS名"),
        )]);
        let san_der = san.to_der().expect("SANのエンコードに失敗");
        vec![x509_cert::ext::Extension {
            extn_id: ObjectIdentifier::new_unwrap("2.5.29.17"),
            critical: false,
            extn_value: OctetString::new(san_der).expect("SAN拡張値"),
        }]
    });

    let tbs = x509_cert::TbsCertificate {
        version: x509_cert::certificate::Version::V3,
        serial_number: serial,
        signature: sig_alg.clone(),
        issuer: name.clone(),
        validity,
        subject: name,
        subject_public_key_info: spki,
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions,
    };

    let tbs_der = tbs.to_der().expect("TBSのエンコードに失敗");
    let signing_key = rsa::pkcs1v15::SigningKey::<Sha1>::new(key.clone());
    let tbs_signature = signing_key.sign(&tbs_der);

    let cert = x509_cert::Certificate {
        tbs_certificate: tbs,
        signature_algorithm: sig_alg,
        signature: BitString::from_bytes(&tbs_signature.to_bytes()).expect("署名ビット列"),
    };

    cert.to_pem(der::pem::LineEnding::LF).expect("PEMエンコードに失敗")
}

/// 本文バイト列にSHA-1 RSA PKCS#1 v1.5署名を付け、Base64で返す。
pub(crate) fn sign_body(key: &RsaPrivateKey, body: &[u8]) -> String {
    let signing_key = rsa::pkcs1v15::SigningKey::<Sha1>::new(key.clone());
    let signature = signing_key.sign(body);
    b64().encode(signature.to_bytes())
}

/// PEMを `/cert.pem` で配信するモックサーバーを起動し、証明書URLを返す。
pub(crate) async fn spawn_cert_server(pem: String) -> String {
    let app = axum::Router::new().route(
        "/cert.pem",
        axum::routing::get(move || {
            let pem = pem.clone();
            async move { pem }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    format!("http://127.0.0.1:{port}/cert.pem")
}
