//! Broadcaster: Registry 全員への配信
//!
//! ## 責務
//!
//! - 参加処理（Registry への追加 + AUTH_OK + プレゼンス通知 + 履歴の再送）
//! - 公開メッセージの配信（履歴への追記 + 全員への配信）
//! - 退出処理（Registry からの削除 + プレゼンス通知）
//!
//! ## 順序の保証
//!
//! どの操作も Registry のロックを保持したまま行う。そのため
//!
//! - プレゼンス通知は Registry の変更順に届く
//! - 同じ送信者のメッセージは送信順に各受信者へ届く
//! - 新しく参加したセッションには、履歴の再送がその後のどの配信よりも先に届く
//!
//! 配信は各セッションの送信キューに積むだけなので、遅い受信者が他の受信者への
//! 配信を止めることはない。

use std::sync::Arc;

use hiroma_shared::{
    protocol::{Message, MessageKind, encode_payload},
    time::timestamp_to_rfc3339,
};

use crate::{
    domain::{HistoryEntry, HistoryStore, RegistryError, SessionId, Username},
    infrastructure::{Registry, Roster, SessionHandle},
};

use super::error::PublishError;

/// Registry 全員への配信を担当する
pub struct Broadcaster {
    registry: Arc<Registry>,
    history: Arc<dyn HistoryStore>,
    /// 参加時に再送する履歴の件数
    history_window: usize,
}

impl Broadcaster {
    pub fn new(
        registry: Arc<Registry>,
        history: Arc<dyn HistoryStore>,
        history_window: usize,
    ) -> Self {
        Self {
            registry,
            history,
            history_window,
        }
    }

    /// 認証済みセッションを参加させる
    ///
    /// 同じ名前が既にオンラインなら `DuplicateName` を返し、何も送らない。
    /// 成功時、新しいセッションには AUTH_OK、プレゼンス、直近の履歴（古い順）が
    /// この順で積まれ、他の全員にはプレゼンスが積まれる。
    pub async fn join(
        &self,
        username: Username,
        handle: SessionHandle,
    ) -> Result<(), RegistryError> {
        let mut roster = self.registry.lock().await;
        roster.add(username.clone(), handle.clone())?;
        tracing::info!("User '{}' joined ({} online)", username, roster.len());

        if let Err(e) = handle.push(Message::server(MessageKind::AuthOk, username.as_str())) {
            tracing::debug!("Session of '{}' closed before AUTH_OK: {}", username, e);
        }
        self.push_presence(&roster);

        let replay = match self.history.recent(self.history_window).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to load history for '{}': {}", username, e);
                Vec::new()
            }
        };
        tracing::debug!("Replaying {} history entries to '{}'", replay.len(), username);
        for entry in replay {
            if handle.push(history_message(entry)).is_err() {
                break;
            }
        }

        Ok(())
    }

    /// 公開メッセージを履歴に追記し、全員に配信する
    ///
    /// 履歴への追記に失敗しても配信は続ける。
    pub async fn publish(
        &self,
        sender: &Username,
        body: &str,
        now_millis: i64,
    ) -> Result<(), PublishError> {
        let mut message = Message::public(sender.as_str(), body);
        message.timestamp = timestamp_to_rfc3339(now_millis);
        encode_payload(&message).map_err(PublishError::TooLarge)?;

        let roster = self.registry.lock().await;
        if let Err(e) = self
            .history
            .append(HistoryEntry::new(sender.as_str(), body, now_millis))
            .await
        {
            tracing::error!("Failed to append message from '{}' to history: {}", sender, e);
        }

        let failures = roster.broadcast(&message);
        tracing::debug!(
            "Message from '{}' delivered to {} session(s)",
            sender,
            roster.len() - failures
        );
        Ok(())
    }

    /// 現在のオンライン一覧を全員に通知する
    pub async fn broadcast_presence(&self) {
        let roster = self.registry.lock().await;
        self.push_presence(&roster);
    }

    /// セッションを退出させる
    ///
    /// そのセッションが Registry にいた場合だけ削除してプレゼンスを通知し、`true` を返す。
    /// 2 回目以降の呼び出しや、同じ名前の別セッションに対しては何もしない。
    pub async fn leave(&self, username: &Username, session_id: SessionId) -> bool {
        let mut roster = self.registry.lock().await;
        if !roster.remove_session(username.as_str(), session_id) {
            return false;
        }
        tracing::info!("User '{}' left ({} online)", username, roster.len());
        self.push_presence(&roster);
        true
    }

    fn push_presence(&self, roster: &Roster) {
        match Message::presence(&roster.snapshot()) {
            Ok(message) => {
                roster.broadcast(&message);
            }
            Err(e) => tracing::error!("Failed to build presence update: {}", e),
        }
    }
}

/// 履歴 1 件を再送用の PUBLIC_MESSAGE にする
fn history_message(entry: HistoryEntry) -> Message {
    let mut message = Message::public(entry.sender, entry.body);
    message.timestamp = timestamp_to_rfc3339(entry.recorded_at);
    message
}
