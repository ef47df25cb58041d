//! Message formatting utilities for client display.

use hiroma_shared::protocol::{Message, MessageKind};

const RULE: &str = "------------------------------------------------------------";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format any incoming frame
    ///
    /// # Arguments
    ///
    /// * `message` - The frame received from the server
    /// * `me` - The name this client is logged in as, if any
    pub fn format(message: &Message, me: Option<&str>) -> String {
        match message.kind {
            MessageKind::AuthOk => format!("\n* Logged in as '{}'\n", message.body),
            MessageKind::RegOk => format!("\n* {}\n", message.body),
            MessageKind::LogoutOk => "\n* Logged out\n".to_string(),
            MessageKind::Error => format!("\n! {}\n", message.body),
            MessageKind::PublicMessage => {
                Self::format_public_message(&message.sender, &message.body, &message.timestamp)
            }
            MessageKind::PresenceUpdate => match message.presence_names() {
                Ok(names) => Self::format_presence(&names, me),
                Err(_) => Self::format_raw_message(&message.body),
            },
            _ => Self::format_raw_message(&message.body),
        }
    }

    /// Format a public message
    pub fn format_public_message(sender: &str, body: &str, timestamp: &str) -> String {
        format!("\n\n{RULE}\n@{sender}: {body}\nsent at {timestamp}\n{RULE}\n")
    }

    /// Format the list of online users, marking this client
    pub fn format_presence(names: &[String], me: Option<&str>) -> String {
        if names.is_empty() {
            return "\nOnline: (nobody)\n".to_string();
        }
        let listed: Vec<String> = names
            .iter()
            .map(|name| {
                if Some(name.as_str()) == me {
                    format!("{name} (me)")
                } else {
                    name.clone()
                }
            })
            .collect();
        format!("\nOnline: {}\n", listed.join(", "))
    }

    /// Format a frame this client does not know how to show
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {text}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_public_message() {
        // テスト項目: 公開メッセージは送信者、本文、送信時刻を含む
        // given (前提条件):
        let message = Message {
            kind: MessageKind::PublicMessage,
            sender: "alice".to_string(),
            body: "Hello, world!".to_string(),
            timestamp: "2023-01-01T00:00:00.000Z".to_string(),
        };

        // when (操作):
        let result = MessageFormatter::format(&message, Some("bob"));

        // then (期待する結果):
        assert!(result.contains("@alice: Hello, world!"));
        assert!(result.contains("sent at 2023-01-01T00:00:00.000Z"));
        assert!(result.contains(RULE));
    }

    #[test]
    fn test_format_presence_marks_me() {
        // テスト項目: オンライン一覧では自分にマークが付く
        // given (前提条件):
        let message = Message::presence(&["alice".to_string(), "bob".to_string()]).unwrap();

        // when (操作):
        let result = MessageFormatter::format(&message, Some("alice"));

        // then (期待する結果):
        assert!(result.contains("Online: alice (me), bob"));
        assert!(!result.contains("bob (me)"));
    }

    #[test]
    fn test_format_empty_presence() {
        // テスト項目: 誰もいない場合の表示
        // given (前提条件):

        // when (操作):
        let result = MessageFormatter::format_presence(&[], None);

        // then (期待する結果):
        assert!(result.contains("(nobody)"));
    }

    #[test]
    fn test_format_error_and_acks() {
        // テスト項目: ERROR は "!"、AUTH_OK / LOGOUT_OK は "*" で表示される
        // given (前提条件):
        let error = Message::error("rate limited");
        let auth_ok = Message::server(MessageKind::AuthOk, "alice");
        let logout_ok = Message::server(MessageKind::LogoutOk, "logout");

        // when (操作):
        let error_text = MessageFormatter::format(&error, None);
        let auth_text = MessageFormatter::format(&auth_ok, None);
        let logout_text = MessageFormatter::format(&logout_ok, Some("alice"));

        // then (期待する結果):
        assert!(error_text.contains("! rate limited"));
        assert!(auth_text.contains("Logged in as 'alice'"));
        assert!(logout_text.contains("Logged out"));
    }

    #[test]
    fn test_format_raw_message() {
        // テスト項目: 表示方法のないフレームは本文をそのまま表示する
        // given (前提条件):
        let text = "unknown message format";

        // when (操作):
        let result = MessageFormatter::format_raw_message(text);

        // then (期待する結果):
        assert!(result.contains("unknown message format"));
        assert!(result.contains("Received:"));
    }
}
