//! ソルト付き SHA-256 によるパスワードハッシュ
//!
//! ユーザーごとにランダムなソルトを生成し、`sha256(password || salt)` の
//! 16 進文字列をソルトと一緒に保存する。

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;

/// 保存される認証情報（平文パスワードは保持しない）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub salt: String,
    pub hash: String,
}

impl StoredCredential {
    /// 新しいソルトを生成してパスワードをハッシュ化する
    pub fn create(password: &str) -> Self {
        let salt = generate_salt();
        let hash = hash_password(password, &salt);
        Self { salt, hash }
    }

    /// パスワードが一致するか照合する
    pub fn verify(&self, password: &str) -> bool {
        hash_password(password, &self.salt) == self.hash
    }
}

/// `sha256(password || salt)` を 16 進文字列で返す
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
