//! インフラストラクチャ層
//!
//! ドメイン層の trait の実装と、セッション間で共有される状態（Registry）を置く。

pub mod dto;
pub mod password;
pub mod registry;
pub mod repository;
pub mod session_handle;

pub use registry::{Registry, Roster};
pub use session_handle::SessionHandle;
