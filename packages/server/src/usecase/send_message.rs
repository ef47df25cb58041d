//! UseCase: 公開メッセージ送信
//!
//! セッションごとの RateLimiter を通し、受理されたものだけを Broadcaster に渡す。
//! 拒否されたメッセージは履歴にも配信にも現れない。

use std::sync::Arc;

use hiroma_shared::time::Clock;

use crate::domain::{RateDecision, RateLimiter, Username};

use super::{broadcaster::Broadcaster, error::PublishError};

/// 公開メッセージ送信のユースケース
pub struct SendMessageUseCase {
    broadcaster: Arc<Broadcaster>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    pub fn new(broadcaster: Arc<Broadcaster>, clock: Arc<dyn Clock>) -> Self {
        Self { broadcaster, clock }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `sender` - 送信者（認証済み）
    /// * `body` - メッセージ本文
    /// * `limiter` - 送信者のセッションが持つ RateLimiter
    pub async fn execute(
        &self,
        sender: &Username,
        body: &str,
        limiter: &mut RateLimiter,
    ) -> Result<(), PublishError> {
        let now = self.clock.now_millis();
        if let RateDecision::Denied { retry_after_millis } = limiter.check(now) {
            tracing::info!(
                "Rate limited '{}' (retry after {} ms)",
                sender,
                retry_after_millis
            );
            return Err(PublishError::RateLimited { retry_after_millis });
        }

        self.broadcaster.publish(sender, body, now).await
    }
}
