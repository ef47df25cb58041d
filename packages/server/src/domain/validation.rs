//! 登録時のログイン名・パスワード検証
//!
//! 検証は上から順に行い、最初に違反したルールの理由だけを返す。

const MIN_LOGIN_LENGTH: usize = 3;
const MAX_LOGIN_LENGTH: usize = 20;
const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_PASSWORD_LENGTH: usize = 30;

const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?~`";

/// ログイン名とパスワードを検証する
///
/// # Returns
///
/// * `None` - 問題なし
/// * `Some(reason)` - 最初に違反したルールの説明
pub fn validate(login: &str, password: &str) -> Option<String> {
    if login.is_empty() {
        return Some("login must not be empty".to_string());
    }
    if password.is_empty() {
        return Some("password must not be empty".to_string());
    }
    if login.trim().is_empty() {
        return Some("login must not consist of whitespace only".to_string());
    }
    if password.trim().is_empty() {
        return Some("password must not consist of whitespace only".to_string());
    }
    if login.chars().any(char::is_whitespace) {
        return Some("login must not contain whitespace".to_string());
    }
    if password.chars().any(char::is_whitespace) {
        return Some("password must not contain whitespace".to_string());
    }

    let login_len = login.chars().count();
    if login_len < MIN_LOGIN_LENGTH {
        return Some(format!(
            "login is too short, at least {MIN_LOGIN_LENGTH} characters required"
        ));
    }
    if login_len > MAX_LOGIN_LENGTH {
        return Some(format!(
            "login is too long, at most {MAX_LOGIN_LENGTH} characters allowed"
        ));
    }

    let password_len = password.chars().count();
    if password_len < MIN_PASSWORD_LENGTH {
        return Some(format!(
            "password is too short, at least {MIN_PASSWORD_LENGTH} characters required"
        ));
    }
    if password_len > MAX_PASSWORD_LENGTH {
        return Some(format!(
            "password is too long, at most {MAX_PASSWORD_LENGTH} characters allowed"
        ));
    }

    if !login
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Some(
            "login may only contain latin letters, digits and underscore".to_string(),
        );
    }
    if !password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIAL_CHARS.contains(c))
    {
        return Some(
            "password may only contain latin letters, digits and special characters".to_string(),
        );
    }

    None
}
