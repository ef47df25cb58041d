//! InMemory HistoryStore 実装
//!
//! 直近 `capacity` 件だけを保持するリングバッファ。
//! 追記は Mutex で直列化されるので、保持される順序は到着順と一致する。

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{HistoryEntry, HistoryStore, StoreError};

/// デフォルトの保持件数
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// インメモリ HistoryStore 実装
pub struct InMemoryHistoryStore {
    entries: Mutex<VecDeque<HistoryEntry>>,
    capacity: usize,
}

impl InMemoryHistoryStore {
    /// デフォルト容量で作成
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// 保持件数を指定して作成（0 は 1 に切り上げ）
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY))),
            capacity,
        }
    }

    /// 現在保持している件数
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// 同期的に 1 件追加（起動時のロード用、`&mut self` なのでロック不要）
    pub(crate) fn push_loaded(&mut self, entry: HistoryEntry) {
        let entries = self.entries.get_mut();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }
}

impl Default for InMemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        let entries = self.entries.lock().await;
        let skip = entries.len().saturating_sub(limit);
        Ok(entries.iter().skip(skip).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(i: usize) -> HistoryEntry {
        HistoryEntry::new("alice", format!("message {i}"), i as i64)
    }

    #[tokio::test]
    async fn test_recent_returns_oldest_first() {
        // テスト項目: recent は直近の件数を古い順で返す
        // given (前提条件):
        let store = InMemoryHistoryStore::new();
        for i in 0..5 {
            store.append(entry(i)).await.unwrap();
        }

        // when (操作):
        let recent = store.recent(3).await.unwrap();

        // then (期待する結果):
        let bodies: Vec<&str> = recent.iter().map(|e| e.body.as_str()).collect();
        assert_eq!(bodies, vec!["message 2", "message 3", "message 4"]);
    }

    #[tokio::test]
    async fn test_recent_with_limit_larger_than_history() {
        // テスト項目: limit が保持件数より大きい場合は全件を返す
        // given (前提条件):
        let store = InMemoryHistoryStore::new();
        store.append(entry(0)).await.unwrap();
        store.append(entry(1)).await.unwrap();

        // when (操作):
        let recent = store.recent(20).await.unwrap();

        // then (期待する結果):
        assert_eq!(recent, vec![entry(0), entry(1)]);
    }

    #[tokio::test]
    async fn test_capacity_drops_oldest_entries() {
        // テスト項目: 容量を超えると古いものから捨てられる
        // given (前提条件):
        let store = InMemoryHistoryStore::with_capacity(2);

        // when (操作):
        for i in 0..4 {
            store.append(entry(i)).await.unwrap();
        }

        // then (期待する結果):
        assert_eq!(store.len().await, 2);
        assert_eq!(store.recent(10).await.unwrap(), vec![entry(2), entry(3)]);
    }

    #[tokio::test]
    async fn test_recent_zero_is_empty() {
        // テスト項目: limit 0 では何も返さない
        // given (前提条件):
        let store = InMemoryHistoryStore::new();
        store.append(entry(0)).await.unwrap();

        // when (操作):
        let recent = store.recent(0).await.unwrap();

        // then (期待する結果):
        assert!(recent.is_empty());
    }
}
