//! User-visible default messages.
//!
//! SYSTEM CONTEXT
//! ==============
//! Error classification produces structured errors; views turn them into text
//! with [`text`]. Server-provided messages always win over these defaults.

#[cfg(test)]
#[path = "messages_test.rs"]
mod messages_test;

/// Display language for default messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    ZhCn,
}

/// Keys for the fixed message catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    NetworkError,
    LoginExpired,
    Forbidden,
    RequestFailed,
    LoginFailed,
}

#[must_use]
pub fn text(message: Message, locale: Locale) -> &'static str {
    match (locale, message) {
        (Locale::En, Message::NetworkError) => "Network error, please check the server connection",
        (Locale::En, Message::LoginExpired) => "Login expired, please sign in again",
        (Locale::En, Message::Forbidden) => "You do not have permission to access this",
        (Locale::En, Message::RequestFailed) => "Request failed",
        (Locale::En, Message::LoginFailed) => "Login failed",
        (Locale::ZhCn, Message::NetworkError) => "网络错误，请检查服务器连接",
        (Locale::ZhCn, Message::LoginExpired) => "登录已过期，请重新登录",
        (Locale::ZhCn, Message::Forbidden) => "没有权限访问",
        (Locale::ZhCn, Message::RequestFailed) => "请求失败",
        (Locale::ZhCn, Message::LoginFailed) => "登录失败",
    }
}
