//! セッションへの送信ハンドル
//!
//! Registry / Broadcaster が保持するのはこのハンドルだけで、ソケットそのものは
//! セッションのタスクが所有する。`push` は送信キューに積むだけなので、
//! どのタスクから呼んでもブロックしない。キューは各セッションの writer タスクが
//! ソケットに書き出す。

use hiroma_shared::protocol::Message;
use tokio::sync::mpsc;

use crate::domain::{PushError, SessionId};

/// 送信キューの受信側（writer タスクが保持する）
pub type Outbox = mpsc::UnboundedReceiver<Message>;

/// セッションへの送信ハンドル
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    sender: mpsc::UnboundedSender<Message>,
}

impl SessionHandle {
    pub fn new(id: SessionId, sender: mpsc::UnboundedSender<Message>) -> Self {
        Self { id, sender }
    }

    /// 新しい送信キューを作り、ハンドルと受信側を返す
    pub fn channel(id: SessionId) -> (Self, Outbox) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(id, sender), receiver)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// メッセージを送信キューに積む
    ///
    /// writer タスクが終了している（接続が閉じている）場合は `PushError`。
    pub fn push(&self, message: Message) -> Result<(), PushError> {
        self.sender
            .send(message)
            .map_err(|_| PushError(self.id.to_string()))
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_enqueues_message() {
        // テスト項目: push したメッセージが受信側に届く
        // given (前提条件):
        let (handle, mut outbox) = SessionHandle::channel(SessionId::generate());

        // when (操作):
        let result = handle.push(Message::public("alice", "hi"));

        // then (期待する結果):
        assert!(result.is_ok());
        let received = outbox.recv().await.unwrap();
        assert_eq!(received.sender, "alice");
        assert_eq!(received.body, "hi");
    }

    #[tokio::test]
    async fn test_push_after_receiver_dropped_fails() {
        // テスト項目: 受信側が破棄された後の push は PushError になる
        // given (前提条件):
        let id = SessionId::generate();
        let (handle, outbox) = SessionHandle::channel(id);
        drop(outbox);

        // when (操作):
        let result = handle.push(Message::public("alice", "hi"));

        // then (期待する結果):
        assert_eq!(result, Err(PushError(id.to_string())));
        assert!(handle.is_closed());
    }
}
