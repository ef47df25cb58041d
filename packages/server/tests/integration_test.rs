//! Integration tests driving a real TCP server on an ephemeral port.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use hiroma_server::{
    build_app_state, config::ServerConfig, error::ServerError, ui::Server, ui::state::AppState,
};
use hiroma_shared::protocol::{Message, MessageCodec, MessageKind, reasons};
use tokio::{net::TcpStream, sync::oneshot, task::JoinHandle};
use tokio_util::codec::Framed;

const RECV_TIMEOUT: Duration = Duration::from_secs(3);
const QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Helper struct to manage an in-process server
struct TestServer {
    addr: SocketAddr,
    http_addr: Option<SocketAddr>,
    state: Arc<AppState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<(), ServerError>>>,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(ServerConfig::default()).await
    }

    /// Start a server on ephemeral ports with the given settings
    async fn start_with(config: ServerConfig) -> Self {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            http_port: Some(0),
            ..config
        };
        let state = Arc::new(build_app_state(&config).await.unwrap());
        let server = Server::bind(&config, state.clone()).await.unwrap();
        let addr = server.local_addr().unwrap();
        let http_addr = server.http_addr();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(server.run_until(async move {
            let _ = shutdown_rx.await;
        }));

        Self {
            addr,
            http_addr,
            state,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    async fn online_users(&self) -> Vec<String> {
        self.state.get_online_users_usecase.execute().await
    }

    /// Stop accepting and wait for the server to finish
    async fn stop(&mut self) -> Result<(), ServerError> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        match self.task.take() {
            Some(task) => task.await.unwrap(),
            None => Ok(()),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Helper struct speaking the wire protocol
struct TestClient {
    framed: Framed<TcpStream, MessageCodec>,
}

impl TestClient {
    async fn connect(server: &TestServer) -> Self {
        let stream = TcpStream::connect(server.addr).await.unwrap();
        Self {
            framed: Framed::new(stream, MessageCodec::new()),
        }
    }

    async fn send(&mut self, message: Message) {
        self.framed.send(message).await.unwrap();
    }

    /// Next frame, or `None` if the server closed the connection
    async fn next(&mut self, timeout: Duration) -> Option<Message> {
        match tokio::time::timeout(timeout, self.framed.next()).await {
            Ok(Some(frame)) => Some(frame.unwrap().unwrap()),
            Ok(None) => None,
            Err(_) => panic!("timed out after {timeout:?} waiting for a frame"),
        }
    }

    async fn recv(&mut self) -> Message {
        self.next(RECV_TIMEOUT)
            .await
            .expect("connection closed unexpectedly")
    }

    /// Next frame of `kind`, skipping presence updates
    async fn recv_kind(&mut self, kind: MessageKind) -> Message {
        loop {
            let message = self.recv().await;
            if message.kind == kind {
                return message;
            }
            assert_eq!(
                message.kind,
                MessageKind::PresenceUpdate,
                "expected {kind:?}, got {message:?}"
            );
        }
    }

    /// Next presence update
    async fn recv_presence(&mut self) -> Vec<String> {
        let message = self.recv().await;
        assert_eq!(message.kind, MessageKind::PresenceUpdate, "{message:?}");
        message.presence_names().unwrap()
    }

    /// Frames that arrive within `period`
    async fn drain_for(&mut self, period: Duration) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Ok(Some(frame)) = tokio::time::timeout(period, self.framed.next()).await {
            messages.push(frame.unwrap().unwrap());
        }
        messages
    }

    /// Returns true when nothing arrives within `period`
    async fn is_quiet(&mut self, period: Duration) -> bool {
        tokio::time::timeout(period, self.framed.next()).await.is_err()
    }

    async fn register(&mut self, login: &str, password: &str) -> Message {
        self.send(Message::register(login, password)).await;
        self.recv().await
    }

    /// REGISTER, AUTH and consume AUTH_OK plus the initial presence update
    async fn register_and_login(&mut self, login: &str, password: &str) {
        let reg = self.register(login, password).await;
        assert_eq!(reg.kind, MessageKind::RegOk, "{reg:?}");
        self.login(login, password).await;
    }

    async fn login(&mut self, login: &str, password: &str) {
        self.send(Message::auth(login, password)).await;
        let ack = self.recv().await;
        assert_eq!(ack.kind, MessageKind::AuthOk, "{ack:?}");
        assert_eq!(ack.body, login);
        let presence = self.recv_presence().await;
        assert!(presence.contains(&login.to_string()));
    }
}

#[tokio::test]
async fn test_register_then_authenticate() {
    // テスト項目: 登録で REG_OK、続く認証で AUTH_OK("alice") が返り、Registry に alice が入る
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;

    // when (操作):
    let reg = alice.register("alice", "secret1").await;
    alice.send(Message::auth("alice", "secret1")).await;
    let auth = alice.recv().await;

    // then (期待する結果):
    assert_eq!(reg.kind, MessageKind::RegOk);
    assert_eq!(reg.body, reasons::REGISTRATION_SUCCESSFUL);
    assert_eq!(auth.kind, MessageKind::AuthOk);
    assert_eq!(auth.body, "alice");
    assert_eq!(auth.sender, "Server");
    assert_eq!(server.online_users().await, vec!["alice"]);
}

#[tokio::test]
async fn test_rate_limited_message_reaches_nobody() {
    // テスト項目: 500ms 以内の 2 通目は alice にだけ "rate limited" が返り、bob には 1 通だけ届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;
    alice.register_and_login("alice", "secret1").await;
    let mut bob = TestClient::connect(&server).await;
    bob.register_and_login("bob", "secret2").await;
    assert_eq!(alice.recv_presence().await, vec!["alice", "bob"]);

    // when (操作):
    alice.send(Message::public("alice", "hi")).await;
    alice.send(Message::public("alice", "hi")).await;

    // then (期待する結果):
    let first = alice.recv().await;
    assert_eq!(first.kind, MessageKind::PublicMessage);
    let second = alice.recv().await;
    assert_eq!(second.kind, MessageKind::Error);
    assert_eq!(second.body, reasons::RATE_LIMITED);

    let received = bob.drain_for(QUIET_PERIOD).await;
    let public: Vec<&Message> = received
        .iter()
        .filter(|m| m.kind == MessageKind::PublicMessage)
        .collect();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].sender, "alice");
    assert_eq!(public[0].body, "hi");
    assert!(received.iter().all(|m| m.kind != MessageKind::Error));
}

#[tokio::test]
async fn test_duplicate_login_keeps_first_session() {
    // テスト項目: オンライン中の alice での再ログインは拒否され、最初のセッションは配信を受け続ける
    // given (前提条件):
    let server = TestServer::start().await;
    let mut first = TestClient::connect(&server).await;
    first.register_and_login("alice", "secret1").await;
    let mut bob = TestClient::connect(&server).await;
    bob.register_and_login("bob", "secret2").await;
    first.recv_presence().await;

    // when (操作):
    let mut second = TestClient::connect(&server).await;
    second.send(Message::auth("alice", "secret1")).await;
    let reply = second.recv().await;

    // then (期待する結果):
    assert_eq!(reply.kind, MessageKind::Error);
    assert_eq!(reply.body, reasons::USER_ALREADY_ONLINE);
    assert_eq!(server.online_users().await, vec!["alice", "bob"]);

    bob.send(Message::public("bob", "hello alice")).await;
    let delivered = first.recv_kind(MessageKind::PublicMessage).await;
    assert_eq!(delivered.sender, "bob");
    assert_eq!(delivered.body, "hello alice");
    assert!(second.is_quiet(QUIET_PERIOD).await);
}

#[tokio::test]
async fn test_abrupt_disconnect_updates_presence() {
    // テスト項目: alice の接続が突然切れると、bob に alice を含まないプレゼンスが届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;
    alice.register_and_login("alice", "secret1").await;
    let mut bob = TestClient::connect(&server).await;
    bob.register_and_login("bob", "secret2").await;

    // when (操作):
    drop(alice);

    // then (期待する結果):
    assert_eq!(bob.recv_presence().await, vec!["bob"]);
    assert_eq!(server.online_users().await, vec!["bob"]);
}

#[tokio::test]
async fn test_history_is_replayed_before_live_traffic() {
    // テスト項目: 新しく認証したセッションには直近の履歴が古い順で届き、その後にライブの配信が続く
    // given (前提条件):
    let server = TestServer::start_with(ServerConfig {
        min_message_interval: Duration::ZERO,
        history_window: 2,
        ..ServerConfig::default()
    })
    .await;
    let mut alice = TestClient::connect(&server).await;
    alice.register_and_login("alice", "secret1").await;
    for body in ["one", "two", "three"] {
        alice.send(Message::public("alice", body)).await;
        alice.recv_kind(MessageKind::PublicMessage).await;
    }

    // when (操作):
    let mut bob = TestClient::connect(&server).await;
    bob.register_and_login("bob", "secret2").await;
    alice.send(Message::public("alice", "four")).await;

    // then (期待する結果):
    let bodies: Vec<String> = vec![
        bob.recv_kind(MessageKind::PublicMessage).await.body,
        bob.recv_kind(MessageKind::PublicMessage).await.body,
        bob.recv_kind(MessageKind::PublicMessage).await.body,
    ];
    assert_eq!(bodies, vec!["two", "three", "four"]);
}

#[tokio::test]
async fn test_connections_beyond_pool_size_wait_for_a_slot() {
    // テスト項目: max_clients を超えた接続は拒否されずに待たされ、空きができると処理される
    // given (前提条件):
    let server = TestServer::start_with(ServerConfig {
        max_clients: 1,
        ..ServerConfig::default()
    })
    .await;
    let mut alice = TestClient::connect(&server).await;
    alice.register_and_login("alice", "secret1").await;

    // when (操作):
    let mut queued = TestClient::connect(&server).await;
    queued.send(Message::register("bob", "secret2")).await;
    let served_while_busy = !queued.is_quiet(QUIET_PERIOD).await;
    alice.send(Message::logout()).await;
    let logout = alice.recv_kind(MessageKind::LogoutOk).await;

    // then (期待する結果):
    assert!(!served_while_busy);
    assert_eq!(logout.body, reasons::LOGOUT);
    let reg = queued.recv().await;
    assert_eq!(reg.kind, MessageKind::RegOk);
}

#[tokio::test]
async fn test_logout_ack_then_close() {
    // テスト項目: LOGOUT には LOGOUT_OK("logout") が返った後に接続が閉じる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;
    alice.register_and_login("alice", "secret1").await;
    let mut bob = TestClient::connect(&server).await;
    bob.register_and_login("bob", "secret2").await;
    alice.recv_presence().await;

    // when (操作):
    alice.send(Message::logout()).await;

    // then (期待する結果):
    let ack = alice.recv().await;
    assert_eq!(ack.kind, MessageKind::LogoutOk);
    assert_eq!(ack.body, reasons::LOGOUT);
    assert!(alice.next(RECV_TIMEOUT).await.is_none());
    assert_eq!(bob.recv_presence().await, vec!["bob"]);
}

#[tokio::test]
async fn test_status_api() {
    // テスト項目: ステータス API がヘルスチェック、オンライン一覧、履歴を返す
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;
    alice.register_and_login("alice", "secret1").await;
    alice.send(Message::public("alice", "hello")).await;
    alice.recv_kind(MessageKind::PublicMessage).await;
    let base = format!("http://{}", server.http_addr.unwrap());
    let http = reqwest::Client::new();

    // when (操作):
    let health: serde_json::Value = http
        .get(format!("{base}/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let online: serde_json::Value = http
        .get(format!("{base}/api/users/online"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let history: serde_json::Value = http
        .get(format!("{base}/api/history?limit=5"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(health, serde_json::json!({"status": "ok"}));
    assert_eq!(online, serde_json::json!({"users": ["alice"], "count": 1}));
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["sender"], "alice");
    assert_eq!(entries[0]["message"], "hello");
}

#[tokio::test]
async fn test_shutdown_closes_in_flight_sessions() {
    // テスト項目: シャットダウンで待ち受けが閉じ、接続中のセッションも閉じられる
    // given (前提条件):
    let mut server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;
    alice.register_and_login("alice", "secret1").await;

    // when (操作):
    let result = server.stop().await;

    // then (期待する結果):
    assert!(result.is_ok());
    assert!(alice.next(RECV_TIMEOUT).await.is_none());
    assert!(TcpStream::connect(server.addr).await.is_err());
}
