//! UseCase: 切断処理
//!
//! セッション終了時に呼ばれる。何度呼んでも、同じ名前で後から入った別セッションが
//! いても安全。

use std::sync::Arc;

use crate::domain::{SessionId, Username};

use super::broadcaster::Broadcaster;

/// 切断処理のユースケース
pub struct DisconnectUseCase {
    broadcaster: Arc<Broadcaster>,
}

impl DisconnectUseCase {
    pub fn new(broadcaster: Arc<Broadcaster>) -> Self {
        Self { broadcaster }
    }

    /// 切断を実行
    ///
    /// Registry から実際に削除した場合だけ `true` を返し、残りの全員にプレゼンスが通知される。
    pub async fn execute(&self, username: &Username, session_id: SessionId) -> bool {
        self.broadcaster.leave(username, session_id).await
    }
}

#[cfg(test)]
mod tests {
    use hiroma_shared::protocol::MessageKind;

    use super::*;
    use crate::infrastructure::{Registry, SessionHandle, repository::InMemoryHistoryStore};

    fn name(value: &str) -> Username {
        Username::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_execute_twice_notifies_once() {
        // テスト項目: 2 回の切断でもプレゼンス通知は 1 回だけ
        // given (前提条件):
        let registry = Arc::new(Registry::new());
        let broadcaster = Arc::new(Broadcaster::new(
            registry.clone(),
            Arc::new(InMemoryHistoryStore::new()),
            20,
        ));
        let usecase = DisconnectUseCase::new(broadcaster.clone());
        let (alice, _alice_outbox) = SessionHandle::channel(SessionId::generate());
        let (bob, mut bob_outbox) = SessionHandle::channel(SessionId::generate());
        let alice_id = alice.id();
        broadcaster.join(name("alice"), alice).await.unwrap();
        broadcaster.join(name("bob"), bob).await.unwrap();
        while bob_outbox.try_recv().is_ok() {}

        // when (操作):
        let first = usecase.execute(&name("alice"), alice_id).await;
        let second = usecase.execute(&name("alice"), alice_id).await;

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        let update = bob_outbox.try_recv().unwrap();
        assert_eq!(update.kind, MessageKind::PresenceUpdate);
        assert_eq!(update.presence_names().unwrap(), vec!["bob"]);
        assert!(bob_outbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stale_session_does_not_remove_new_login() {
        // テスト項目: 古いセッションの切断は、同じ名前の新しいセッションを削除しない
        // given (前提条件):
        let registry = Arc::new(Registry::new());
        let broadcaster = Arc::new(Broadcaster::new(
            registry.clone(),
            Arc::new(InMemoryHistoryStore::new()),
            20,
        ));
        let usecase = DisconnectUseCase::new(broadcaster.clone());
        let (current, _outbox) = SessionHandle::channel(SessionId::generate());
        broadcaster.join(name("alice"), current).await.unwrap();

        // when (操作):
        let removed = usecase
            .execute(&name("alice"), SessionId::generate())
            .await;

        // then (期待する結果):
        assert!(!removed);
        assert!(registry.contains("alice").await);
    }
}
