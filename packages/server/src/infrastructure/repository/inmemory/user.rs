//! InMemory UserStore 実装
//!
//! ドメイン層が定義する UserStore trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。プロセス終了で内容は消えます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{StoreError, UserStore},
    infrastructure::password::StoredCredential,
};

/// インメモリ UserStore 実装
#[derive(Default)]
pub struct InMemoryUserStore {
    /// login -> 認証情報
    users: Mutex<HashMap<String, StoredCredential>>,
}

impl InMemoryUserStore {
    /// 新しい InMemoryUserStore を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存の認証情報から作成（ファイル実装からの読み込み用）
    pub fn from_credentials(users: HashMap<String, StoredCredential>) -> Self {
        Self {
            users: Mutex::new(users),
        }
    }

    /// 登録済みユーザー数
    pub async fn count(&self) -> usize {
        self.users.lock().await.len()
    }

    /// 現在の認証情報のコピーを取得
    pub async fn credentials(&self) -> HashMap<String, StoredCredential> {
        self.users.lock().await.clone()
    }

    /// 永続化済みの認証情報を反映する（既存のエントリは上書き）
    pub async fn insert(&self, login: &str, credential: StoredCredential) {
        self.users.lock().await.insert(login.to_string(), credential);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn register(&self, login: &str, password: &str) -> Result<bool, StoreError> {
        let mut users = self.users.lock().await;
        if users.contains_key(login) {
            tracing::warn!("Registration failed for '{}': login already taken", login);
            return Ok(false);
        }
        users.insert(login.to_string(), StoredCredential::create(password));
        tracing::info!("New user registered: {}", login);
        Ok(true)
    }

    async fn authenticate(&self, login: &str, password: &str) -> Result<bool, StoreError> {
        let users = self.users.lock().await;
        Ok(users
            .get(login)
            .is_some_and(|credential| credential.verify(password)))
    }
}
