//! エンティティ

use serde::{Deserialize, Serialize};

/// 履歴に残る公開メッセージ 1 件
///
/// 到着順に追記され、新しく認証したセッションに古い順で再送される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// 送信者のユーザー名
    pub sender: String,
    /// メッセージ本文
    pub body: String,
    /// 受理した時刻（Unix ミリ秒）
    pub recorded_at: i64,
}

impl HistoryEntry {
    pub fn new(sender: impl Into<String>, body: impl Into<String>, recorded_at: i64) -> Self {
        Self {
            sender: sender.into(),
            body: body.into(),
            recorded_at,
        }
    }
}
