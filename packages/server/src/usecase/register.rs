//! UseCase: ユーザー登録
//!
//! 入力チェックの後 UserStore に登録する。登録してもセッションは認証されない。

use std::sync::Arc;

use crate::domain::{UserStore, validate};

use super::error::RegisterError;

/// ユーザー登録のユースケース
pub struct RegisterUseCase {
    user_store: Arc<dyn UserStore>,
}

impl RegisterUseCase {
    pub fn new(user_store: Arc<dyn UserStore>) -> Self {
        Self { user_store }
    }

    pub async fn execute(&self, login: &str, password: &str) -> Result<(), RegisterError> {
        if let Some(reason) = validate(login, password) {
            tracing::info!("Registration rejected for '{}': {}", login, reason);
            return Err(RegisterError::Invalid(reason));
        }

        if !self.user_store.register(login, password).await? {
            return Err(RegisterError::LoginTaken);
        }
        Ok(())
    }
}
