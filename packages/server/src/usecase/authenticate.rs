//! UseCase: 認証と参加
//!
//! 認証情報を UserStore で照合し、成功したら Broadcaster 経由で Registry に参加させる。
//! 同じ名前が既にオンラインの場合は拒否し、既存のセッションは追い出さない。

use std::sync::Arc;

use crate::{
    domain::{UserStore, Username},
    infrastructure::SessionHandle,
};

use super::{broadcaster::Broadcaster, error::AuthError};

/// 認証のユースケース
pub struct AuthenticateUseCase {
    user_store: Arc<dyn UserStore>,
    broadcaster: Arc<Broadcaster>,
}

impl AuthenticateUseCase {
    pub fn new(user_store: Arc<dyn UserStore>, broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            user_store,
            broadcaster,
        }
    }

    /// 認証を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Username)` - 参加したユーザー名。AUTH_OK 以降のフレームは `handle` に積まれている
    /// * `Err(AuthError)` - 認証失敗。セッションは未認証のまま
    pub async fn execute(
        &self,
        login: &str,
        password: &str,
        handle: SessionHandle,
    ) -> Result<Username, AuthError> {
        if !self.user_store.authenticate(login, password).await? {
            tracing::info!("Authentication failed for '{}'", login);
            return Err(AuthError::InvalidCredentials);
        }

        // 照合済みなので空文字にはならない
        let username =
            Username::new(login.to_string()).map_err(|_| AuthError::InvalidCredentials)?;

        self.broadcaster
            .join(username.clone(), handle)
            .await
            .map_err(|_| {
                tracing::warn!("Rejected duplicate login for '{}'", username);
                AuthError::AlreadyOnline(username.as_str().to_string())
            })?;

        Ok(username)
    }
}
