//! ドメイン層
//!
//! 外部のフレームワークや I/O に依存しない型とルールを置く。

pub mod entity;
pub mod error;
pub mod rate_limiter;
pub mod repository;
pub mod validation;
pub mod value_object;

pub use entity::HistoryEntry;
pub use error::{DomainError, PushError, RegistryError, StoreError};
pub use rate_limiter::{RateDecision, RateLimiter};
pub use repository::{HistoryStore, UserStore};
pub use validation::validate;
pub use value_object::{SessionId, Username};

#[cfg(test)]
pub use repository::{MockHistoryStore, MockUserStore};
