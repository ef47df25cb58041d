//! JSON ファイルに永続化する UserStore 実装
//!
//! 起動時にファイル全体を読み込み、登録のたびに一時ファイルへ書き出してから
//! rename で置き換える。照合はメモリ上のコピーで行う。

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{StoreError, UserStore},
    infrastructure::{password::StoredCredential, repository::inmemory::InMemoryUserStore},
};

/// JSON ファイル UserStore 実装
pub struct JsonFileUserStore {
    path: PathBuf,
    users: InMemoryUserStore,
    /// 登録とファイル書き出しをまとめて直列化する
    write_lock: Mutex<()>,
}

impl JsonFileUserStore {
    /// ファイルを開く（存在しなければ空のストアとして開始）
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let credentials: HashMap<String, StoredCredential> =
            match tokio::fs::read_to_string(&path).await {
                Ok(content) if content.trim().is_empty() => HashMap::new(),
                Ok(content) => serde_json::from_str(&content)?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
                Err(e) => return Err(e.into()),
            };
        tracing::info!(
            "Loaded {} user(s) from {}",
            credentials.len(),
            path.display()
        );

        Ok(Self {
            path,
            users: InMemoryUserStore::from_credentials(credentials),
            write_lock: Mutex::new(()),
        })
    }

    async fn persist(
        &self,
        credentials: &HashMap<String, StoredCredential>,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(credentials)?;
        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for JsonFileUserStore {
    async fn register(&self, login: &str, password: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut credentials = self.users.credentials().await;
        if credentials.contains_key(login) {
            tracing::warn!("Registration failed for '{}': login already taken", login);
            return Ok(false);
        }

        // ファイルへの書き出しが成功してからメモリに反映する
        let credential = StoredCredential::create(password);
        credentials.insert(login.to_string(), credential.clone());
        self.persist(&credentials).await?;
        self.users.insert(login, credential).await;
        tracing::info!("New user registered: {}", login);
        Ok(true)
    }

    async fn authenticate(&self, login: &str, password: &str) -> Result<bool, StoreError> {
        self.users.authenticate(login, password).await
    }
}
