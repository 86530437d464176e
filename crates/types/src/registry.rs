//! # リクエストレジストリ
//!
//! ペイロードの `request.type` 文字列から具象リクエスト型への
//! ディスパッチテーブル。起動時に組み込み種別を登録し、
//! リクエスト構築時に引く。未登録の種別は明示的なエラーとして返す。

use std::collections::HashMap;

use crate::{Intent, RequestBody, RequestEnvelope, SignatureHeaders, TypesError};

/// 種別ごとの具象リクエスト。いずれも共通のエンベロープを保持する。
#[derive(Debug, Clone)]
pub enum TypedRequest {
    /// スキル起動リクエスト
    Launch(LaunchRequest),
    /// インテント実行リクエスト
    Intent(IntentRequest),
    /// セッション終了通知
    SessionEnded(SessionEndedRequest),
}

impl TypedRequest {
    /// 共通エンベロープへの参照を返す。
    pub fn envelope(&self) -> &RequestEnvelope {
        match self {
            TypedRequest::Launch(r) => &r.envelope,
            TypedRequest::Intent(r) => &r.envelope,
            TypedRequest::SessionEnded(r) => &r.envelope,
        }
    }

    /// ワイヤー上の種別名を返す。
    pub fn type_name(&self) -> &'static str {
        match self {
            TypedRequest::Launch(_) => "LaunchRequest",
            TypedRequest::Intent(_) => "IntentRequest",
            TypedRequest::SessionEnded(_) => "SessionEndedRequest",
        }
    }
}

/// スキル起動リクエスト。
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// 共通エンベロープ
    pub envelope: RequestEnvelope,
}

/// インテント実行リクエスト。
#[derive(Debug, Clone)]
pub struct IntentRequest {
    /// 共通エンベロープ
    pub envelope: RequestEnvelope,
    /// 要求されたインテントとスロット値
    pub intent: Intent,
}

/// セッション終了通知。
#[derive(Debug, Clone)]
pub struct SessionEndedRequest {
    /// 共通エンベロープ
    pub envelope: RequestEnvelope,
    /// 終了理由（プラットフォーム定義の文字列）
    pub reason: Option<String>,
}

/// 種別名に対応する具象リクエストを構築するファクトリ関数。
pub type RequestFactory = fn(&RequestBody, RequestEnvelope) -> Result<TypedRequest, TypesError>;

/// 種別名 → ファクトリ関数のディスパッチテーブル。
pub struct RequestRegistry {
    factories: HashMap<String, RequestFactory>,
}

impl RequestRegistry {
    /// 空のレジストリを作る。
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// 組み込みのリクエスト種別を登録済みのレジストリを作る。
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("LaunchRequest", build_launch);
        registry.register("IntentRequest", build_intent);
        registry.register("SessionEndedRequest", build_session_ended);
        registry
    }

    /// 種別名にファクトリを登録する。同名の既存登録は上書きされる。
    pub fn register(&mut self, type_name: &str, factory: RequestFactory) {
        self.factories.insert(type_name.to_string(), factory);
    }

    /// ペイロードの種別名を解決し、具象リクエストを構築する。
    ///
    /// 未登録の種別は `TypesError::UnknownRequestType` を返す。
    pub fn construct(
        &self,
        body: &RequestBody,
        headers: SignatureHeaders,
    ) -> Result<TypedRequest, TypesError> {
        let factory = self
            .factories
            .get(&body.request.request_type)
            .ok_or_else(|| {
                TypesError::UnknownRequestType(body.request.request_type.clone())
            })?;

        let envelope = RequestEnvelope::from_body(body, headers);
        factory(body, envelope)
    }
}

impl Default for RequestRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn build_launch(
    _body: &RequestBody,
    envelope: RequestEnvelope,
) -> Result<TypedRequest, TypesError> {
    Ok(TypedRequest::Launch(LaunchRequest { envelope }))
}

fn build_intent(
    body: &RequestBody,
    envelope: RequestEnvelope,
) -> Result<TypedRequest, TypesError> {
    let intent = body.request.intent.clone().ok_or_else(|| {
        TypesError::MalformedPayload("IntentRequestにintentがありません".to_string())
    })?;

    Ok(TypedRequest::Intent(IntentRequest { envelope, intent }))
}

fn build_session_ended(
    body: &RequestBody,
    envelope: RequestEnvelope,
) -> Result<TypedRequest, TypesError> {
    Ok(TypedRequest::SessionEnded(SessionEndedRequest {
        envelope,
        reason: body.request.reason.clone(),
    }))
}
