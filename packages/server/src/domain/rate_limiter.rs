//! 公開メッセージのレート制限
//!
//! セッションごとに 1 つ持つ。前回受理した時刻から `min_interval` 以上
//! 経過していれば受理し、そのときだけ時刻を更新する。
//! セッション間で状態を共有しないのでロックは不要。

use std::time::Duration;

/// レート制限の判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// 拒否。次に受理されるまでの残り時間（ミリ秒）
    Denied { retry_after_millis: i64 },
}

/// セッション単位の最小送信間隔ゲート
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_interval_millis: i64,
    last_accepted_millis: Option<i64>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval_millis: i64::try_from(min_interval.as_millis()).unwrap_or(i64::MAX),
            last_accepted_millis: None,
        }
    }

    /// `now_millis` 時点での送信可否を判定する
    ///
    /// 初回は常に受理される。拒否時は最終受理時刻を更新しない。
    pub fn check(&mut self, now_millis: i64) -> RateDecision {
        if let Some(last) = self.last_accepted_millis {
            let elapsed = now_millis.saturating_sub(last);
            if elapsed < self.min_interval_millis {
                return RateDecision::Denied {
                    retry_after_millis: self.min_interval_millis - elapsed,
                };
            }
        }
        self.last_accepted_millis = Some(now_millis);
        RateDecision::Allowed
    }

    pub fn last_accepted_millis(&self) -> Option<i64> {
        self.last_accepted_millis
    }
}
