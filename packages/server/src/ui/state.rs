//! Server state shared by every session and HTTP handler.

use std::{sync::Arc, time::Duration};

use hiroma_shared::time::Clock;

use crate::{
    domain::{HistoryStore, UserStore},
    infrastructure::Registry,
    usecase::{
        AuthenticateUseCase, Broadcaster, DisconnectUseCase, GetHistoryUseCase,
        GetOnlineUsersUseCase, RegisterUseCase, SendMessageUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// AuthenticateUseCase（認証と参加のユースケース）
    pub authenticate_usecase: Arc<AuthenticateUseCase>,
    /// RegisterUseCase（ユーザー登録のユースケース）
    pub register_usecase: Arc<RegisterUseCase>,
    /// SendMessageUseCase（公開メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// DisconnectUseCase（切断処理のユースケース）
    pub disconnect_usecase: Arc<DisconnectUseCase>,
    /// GetOnlineUsersUseCase（オンライン一覧取得のユースケース）
    pub get_online_users_usecase: Arc<GetOnlineUsersUseCase>,
    /// GetHistoryUseCase（履歴取得のユースケース）
    pub get_history_usecase: Arc<GetHistoryUseCase>,
    /// Minimum interval between two accepted public messages of one session
    pub min_message_interval: Duration,
    /// Default number of entries returned by the history API
    pub history_window: usize,
}

impl AppState {
    /// Wire the use cases around one Registry
    pub fn new(
        user_store: Arc<dyn UserStore>,
        history_store: Arc<dyn HistoryStore>,
        clock: Arc<dyn Clock>,
        min_message_interval: Duration,
        history_window: usize,
    ) -> Self {
        let registry = Arc::new(Registry::new());
        let broadcaster = Arc::new(Broadcaster::new(
            registry.clone(),
            history_store.clone(),
            history_window,
        ));

        Self {
            authenticate_usecase: Arc::new(AuthenticateUseCase::new(
                user_store.clone(),
                broadcaster.clone(),
            )),
            register_usecase: Arc::new(RegisterUseCase::new(user_store)),
            send_message_usecase: Arc::new(SendMessageUseCase::new(broadcaster.clone(), clock)),
            disconnect_usecase: Arc::new(DisconnectUseCase::new(broadcaster)),
            get_online_users_usecase: Arc::new(GetOnlineUsersUseCase::new(registry)),
            get_history_usecase: Arc::new(GetHistoryUseCase::new(history_store)),
            min_message_interval,
            history_window,
        }
    }
}
