//! オンラインユーザーの Registry
//!
//! 「誰がオンラインか」の唯一の情報源。ユーザー名（大文字小文字を区別）から
//! セッションの送信ハンドルへの対応を、登録順を保ったまま保持する。
//!
//! ## 排他制御
//!
//! 全操作は 1 つの `tokio::sync::Mutex` で直列化される。単発の操作は
//! `Registry` のメソッドで、複数の操作をまとめて原子的に行いたい場合
//! （参加 + プレゼンス通知、履歴追記 + 配信）は `lock()` で得たガード越しに
//! `Roster` を操作する。

use hiroma_shared::protocol::Message;
use tokio::sync::{Mutex, MutexGuard};

use crate::{
    domain::{PushError, RegistryError, SessionId, Username},
    infrastructure::session_handle::SessionHandle,
};

/// 登録順のオンラインユーザー一覧
#[derive(Debug, Default)]
pub struct Roster {
    entries: Vec<(Username, SessionHandle)>,
}

impl Roster {
    /// ユーザーを末尾に追加する
    ///
    /// 同じ名前が既にいる場合は `DuplicateName`。既存のエントリには触れない。
    pub fn add(&mut self, username: Username, handle: SessionHandle) -> Result<(), RegistryError> {
        if self.contains(username.as_str()) {
            return Err(RegistryError::DuplicateName(username.into_string()));
        }
        self.entries.push((username, handle));
        Ok(())
    }

    /// 名前でエントリを削除する。いなければ `None`
    pub fn remove(&mut self, username: &str) -> Option<SessionHandle> {
        let index = self.position(username)?;
        Some(self.entries.remove(index).1)
    }

    /// 指定したセッションのエントリである場合だけ削除する
    ///
    /// 古い接続の後片付けが、同じ名前で後から入った接続を消さないようにする。
    pub fn remove_session(&mut self, username: &str, session_id: SessionId) -> bool {
        match self.position(username) {
            Some(index) if self.entries[index].1.id() == session_id => {
                self.entries.remove(index);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, username: &str) -> bool {
        self.position(username).is_some()
    }

    pub fn get(&self, username: &str) -> Option<&SessionHandle> {
        self.position(username).map(|index| &self.entries[index].1)
    }

    /// 登録順のユーザー名一覧
    pub fn snapshot(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(username, _)| username.as_str().to_string())
            .collect()
    }

    /// 全エントリに `f` を登録順で適用する
    ///
    /// 1 件の失敗で残りへの配信を止めない。失敗はログに残し、件数を返す。
    pub fn for_each<F>(&self, mut f: F) -> usize
    where
        F: FnMut(&Username, &SessionHandle) -> Result<(), PushError>,
    {
        let mut failures = 0;
        for (username, handle) in &self.entries {
            if let Err(e) = f(username, handle) {
                tracing::warn!("Failed to deliver to '{}': {}", username, e);
                failures += 1;
            }
        }
        failures
    }

    /// 全員に同じメッセージを積む。失敗件数を返す
    pub fn broadcast(&self, message: &Message) -> usize {
        self.for_each(|_, handle| handle.push(message.clone()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, username: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(name, _)| name.as_str() == username)
    }
}

/// オンラインユーザーの Registry
#[derive(Debug, Default)]
pub struct Registry {
    roster: Mutex<Roster>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 複合操作用に排他ロックを取得する
    pub async fn lock(&self) -> MutexGuard<'_, Roster> {
        self.roster.lock().await
    }

    pub async fn add(&self, username: Username, handle: SessionHandle) -> Result<(), RegistryError> {
        self.roster.lock().await.add(username, handle)
    }

    /// 名前で削除する。既にいない場合は何もしない
    pub async fn remove(&self, username: &str) -> bool {
        self.roster.lock().await.remove(username).is_some()
    }

    pub async fn remove_session(&self, username: &str, session_id: SessionId) -> bool {
        self.roster.lock().await.remove_session(username, session_id)
    }

    pub async fn contains(&self, username: &str) -> bool {
        self.roster.lock().await.contains(username)
    }

    pub async fn snapshot(&self) -> Vec<String> {
        self.roster.lock().await.snapshot()
    }

    pub async fn len(&self) -> usize {
        self.roster.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.roster.lock().await.is_empty()
    }
}
