//! ドメイン層のエラー型

use thiserror::Error;

/// 値オブジェクト生成時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("username must not be empty")]
    EmptyUsername,
}

/// Registry 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// 同じユーザー名が既にオンライン
    #[error("user '{0}' is already online")]
    DuplicateName(String),
}

/// セッションへの送信キューが閉じている（接続が既に終了している）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("session '{0}' is closed")]
pub struct PushError(pub String);

/// UserStore / HistoryStore のエラー
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored data is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}
