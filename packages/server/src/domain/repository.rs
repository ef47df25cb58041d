//! 永続化まわりの trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! - `UserStore`: 認証情報（ソルト付きハッシュ）の保存と照合
//! - `HistoryStore`: 公開メッセージの追記専用ログ

use async_trait::async_trait;

use super::{HistoryEntry, StoreError};

/// 認証情報ストア
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// ユーザーを登録する
    ///
    /// `Ok(false)` はログイン名が既に使われていることを表す。
    async fn register(&self, login: &str, password: &str) -> Result<bool, StoreError>;

    /// ログイン名とパスワードを照合する
    async fn authenticate(&self, login: &str, password: &str) -> Result<bool, StoreError>;
}

/// メッセージ履歴ストア
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// 履歴の末尾に 1 件追記する
    async fn append(&self, entry: HistoryEntry) -> Result<(), StoreError>;

    /// 直近 `limit` 件を古い順で返す
    async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError>;
}
