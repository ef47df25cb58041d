//! UseCase: 状態の参照（ステータス API 用）

use std::sync::Arc;

use crate::{
    domain::{HistoryEntry, HistoryStore, StoreError},
    infrastructure::Registry,
};

/// オンラインユーザー一覧取得のユースケース
pub struct GetOnlineUsersUseCase {
    registry: Arc<Registry>,
}

impl GetOnlineUsersUseCase {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// 登録順のユーザー名一覧を返す
    pub async fn execute(&self) -> Vec<String> {
        self.registry.snapshot().await
    }
}

/// 履歴取得のユースケース
pub struct GetHistoryUseCase {
    history: Arc<dyn HistoryStore>,
}

impl GetHistoryUseCase {
    pub fn new(history: Arc<dyn HistoryStore>) -> Self {
        Self { history }
    }

    /// 直近 `limit` 件を古い順で返す
    pub async fn execute(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        self.history.recent(limit).await
    }
}
