//! # 検証エラー型
//!
//! 拒否理由ごとに個別のバリアントを持つ。呼び出し側が監査ログで
//! リプレイ・証明書不正・署名偽造を区別できるよう、理由を
//! 「認証失敗」のような総称に畳み込まない。

/// 認証パイプラインの拒否理由。
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// タイムスタンプが許容範囲より古い
    #[error("リクエストのタイムスタンプが古すぎます。リプレイ攻撃の可能性があります")]
    TooOld,
    /// 証明書チェーンURLが提供されていない
    #[error("証明書チェーンURLが提供されていません")]
    MissingCertificate,
    /// 証明書チェーンURLがURLとして解釈できない
    #[error("証明書チェーンURLを解釈できません: {0}")]
    MalformedCertificateUrl(String),
    /// スキームがhttpsでない
    #[error("証明書チェーンURLのプロトコルが安全ではありません")]
    InsecureProtocol,
    /// ホストが信頼された配布元と一致しない
    #[error("証明書チェーンURLのホストが信頼された配布元ではありません")]
    UntrustedHost,
    /// パスが既定のプレフィックスで始まらない
    #[error("証明書チェーンURLのパスが既定のフォルダ配下ではありません")]
    InvalidPath,
    /// 明示ポートが既定値と一致しない
    #[error("証明書チェーンURLのポートが既定値ではありません")]
    InvalidPort,
    /// 証明書のパースに失敗
    #[error("証明書を読み込めません: {0}")]
    UnparseableCertificate(String),
    /// subjectAltNameに信頼された識別子が含まれない
    #[error("証明書のsubjectAltNameに信頼された識別子が含まれていません")]
    UntrustedSubject,
    /// 証明書の有効期間がまだ始まっていない
    #[error("証明書はまだ有効ではありません")]
    NotYetValid,
    /// 証明書の有効期限が切れている
    #[error("証明書の有効期限が切れています")]
    Expired,
    /// 署名または証明書URLが提供されていない
    #[error("リクエスト署名が提供されていません")]
    MissingSignature,
    /// 署名が本文と一致しない
    #[error("リクエスト署名が有効ではありません")]
    InvalidSignature,
    /// 証明書取得等のトランスポート障害。認証失敗ではなく
    /// インフラ障害を示し、呼び出し側での再試行の余地がある
    #[error("外部通信に失敗: {0}")]
    Network(String),
}

impl VerifyError {
    /// 署名系の失敗かどうか。侵入検知のため、他の拒否理由と
    /// 区別してログすることが求められる。
    pub fn is_signature_class(&self) -> bool {
        matches!(
            self,
            VerifyError::MissingSignature | VerifyError::InvalidSignature
        )
    }

    /// トランスポート障害かどうか。
    pub fn is_network(&self) -> bool {
        matches!(self, VerifyError::Network(_))
    }
}
