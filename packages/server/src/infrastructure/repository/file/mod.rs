//! ファイル永続化実装

pub mod history;
pub mod user;

pub use history::JsonLinesHistoryStore;
pub use user::JsonFileUserStore;
