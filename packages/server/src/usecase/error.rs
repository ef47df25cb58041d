//! UseCase 層のエラー型

use hiroma_shared::protocol::ProtocolError;
use thiserror::Error;

use crate::domain::StoreError;

/// 認証のエラー
#[derive(Debug, Error)]
pub enum AuthError {
    /// ログイン名またはパスワードが一致しない
    #[error("invalid credentials")]
    InvalidCredentials,

    /// 同じユーザー名が既にオンライン（既存セッションは追い出さない）
    #[error("user '{0}' is already online")]
    AlreadyOnline(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 登録のエラー
#[derive(Debug, Error)]
pub enum RegisterError {
    /// 入力チェックに失敗（理由はそのままクライアントに返す）
    #[error("{0}")]
    Invalid(String),

    #[error("login already taken")]
    LoginTaken,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 公開メッセージ送信のエラー
#[derive(Debug, Error)]
pub enum PublishError {
    /// 前回の受理から最小間隔が経過していない
    #[error("rate limited, retry after {retry_after_millis} ms")]
    RateLimited { retry_after_millis: i64 },

    /// 1 フレームに収まらない
    #[error("message too large: {0}")]
    TooLarge(#[source] ProtocolError),
}
