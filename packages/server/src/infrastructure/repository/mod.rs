//! Repository（UserStore / HistoryStore）の具体的な実装
//!
//! - `inmemory`: HashMap / VecDeque を使った実装
//! - `file`: JSON / JSON Lines ファイルに永続化する実装

pub mod file;
pub mod inmemory;

pub use file::{JsonFileUserStore, JsonLinesHistoryStore};
pub use inmemory::{DEFAULT_HISTORY_CAPACITY, InMemoryHistoryStore, InMemoryUserStore};
