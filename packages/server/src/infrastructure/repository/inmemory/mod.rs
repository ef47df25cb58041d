//! インメモリ実装
//!
//! プロセス終了で内容が消える。テストやファイル指定なしの起動で使う。

pub mod history;
pub mod user;

pub use history::{DEFAULT_HISTORY_CAPACITY, InMemoryHistoryStore};
pub use user::InMemoryUserStore;
