//! UseCase 層
//!
//! セッション（UI 層）から呼ばれるアプリケーションの操作をまとめる。
//! 共有状態への変更はすべて `Broadcaster` を経由する。

pub mod authenticate;
pub mod broadcaster;
pub mod disconnect;
pub mod error;
pub mod query;
pub mod register;
pub mod send_message;

pub use authenticate::AuthenticateUseCase;
pub use broadcaster::Broadcaster;
pub use disconnect::DisconnectUseCase;
pub use error::{AuthError, PublishError, RegisterError};
pub use query::{GetHistoryUseCase, GetOnlineUsersUseCase};
pub use register::RegisterUseCase;
pub use send_message::SendMessageUseCase;
