//! One-time notifications carried between requests in a signed cookie.
//!
//! A write request adds a [`Message`] and redirects; the next render reads
//! the `messages` cookie, shows the messages, and clears the cookie. The
//! cookie value is the JSON-encoded message list, base64url-encoded and
//! signed with HMAC-SHA256 via [`Signer`], so clients can neither forge nor
//! edit it. A cookie that fails verification is dropped with a warning.

use eventos_core::signing::Signer;
use http::header::COOKIE;
use http::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

/// Name of the cookie holding pending messages.
pub const MESSAGES_COOKIE: &str = "messages";

/// Upper bound in bytes for the signed cookie value.
pub const MAX_COOKIE_SIZE: usize = 2048;

const MESSAGES_SALT: &str = "eventos.views.messages";

/// The severity level of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MessageLevel {
    /// Debug-level message.
    Debug = 10,
    /// Informational message.
    Info = 20,
    /// Success notification.
    Success = 25,
    /// Warning that requires attention.
    Warning = 30,
    /// Error message.
    Error = 40,
}

impl MessageLevel {
    /// The tag used as a CSS class for this level.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A single notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Severity.
    pub level: MessageLevel,
    /// The text shown to the user.
    pub message: String,
    /// Extra space-separated tags.
    #[serde(default)]
    pub extra_tags: String,
}

impl Message {
    /// Creates a message without extra tags.
    pub fn new(level: MessageLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            extra_tags: String::new(),
        }
    }

    /// A success message.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(MessageLevel::Success, message)
    }

    /// An error message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(MessageLevel::Error, message)
    }

    /// Adds extra tags.
    #[must_use]
    pub fn with_extra_tags(mut self, tags: impl Into<String>) -> Self {
        self.extra_tags = tags.into();
        self
    }

    /// Extra tags followed by the level tag.
    pub fn tags(&self) -> String {
        if self.extra_tags.is_empty() {
            self.level.tag().to_string()
        } else {
            format!("{} {}", self.extra_tags, self.level.tag())
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// What templates see for each message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageContext {
    /// Level tag.
    pub level: &'static str,
    /// Text.
    pub message: String,
    /// All tags, extra tags first.
    pub tags: String,
}

impl From<&Message> for MessageContext {
    fn from(m: &Message) -> Self {
        Self {
            level: m.level.tag(),
            message: m.message.clone(),
            tags: m.tags(),
        }
    }
}

/// Reads and writes the `messages` cookie.
#[derive(Debug, Clone)]
pub struct CookieMessageStorage {
    signer: Signer,
}

impl CookieMessageStorage {
    /// Creates storage that signs with `secret_key`.
    pub fn new(secret_key: &str) -> Self {
        Self {
            signer: Signer::new(secret_key).with_salt(MESSAGES_SALT),
        }
    }

    /// Pending messages from the request's `Cookie` headers.
    ///
    /// Missing cookies yield an empty list; tampered ones are logged and
    /// ignored.
    pub fn load(&self, headers: &HeaderMap) -> Vec<Message> {
        let Some(raw) = cookie_value(headers, MESSAGES_COOKIE) else {
            return Vec::new();
        };
        if raw.is_empty() {
            return Vec::new();
        }
        match self.signer.unsign_object::<Vec<Message>>(&raw) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(error = %e, "discarding invalid messages cookie");
                Vec::new()
            }
        }
    }

    /// Returns `true` if the request carries a `messages` cookie at all.
    pub fn has_cookie(headers: &HeaderMap) -> bool {
        cookie_value(headers, MESSAGES_COOKIE).is_some()
    }

    /// A `Set-Cookie` value storing `messages`, or clearing the cookie when
    /// the list is empty.
    ///
    /// The signed value is kept within [`MAX_COOKIE_SIZE`] bytes by dropping
    /// the oldest messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the messages cannot be serialized.
    pub fn store(&self, messages: &[Message]) -> eventos_core::EventosResult<HeaderValue> {
        let mut kept = messages;
        let signed = loop {
            if kept.is_empty() {
                return Ok(Self::clear());
            }
            let signed = self.signer.sign_object(&kept)?;
            if signed.len() <= MAX_COOKIE_SIZE {
                break signed;
            }
            kept = &kept[1..];
        };
        if kept.len() < messages.len() {
            tracing::debug!(
                dropped = messages.len() - kept.len(),
                "messages cookie too large, oldest messages dropped"
            );
        }
        HeaderValue::from_str(&format!(
            "{MESSAGES_COOKIE}={signed}; Path=/; HttpOnly; SameSite=Lax"
        ))
        .map_err(|e| eventos_core::EventosError::SerializationError(e.to_string()))
    }

    /// A `Set-Cookie` value that deletes the cookie.
    pub fn clear() -> HeaderValue {
        HeaderValue::from_static("messages=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
    }
}

/// Finds a cookie by name across every `Cookie` header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|h| h.split(';'))
        .find_map(|pair| {
            let (k, v) = pair.trim().split_once('=')?;
            (k == name).then(|| v.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    fn cookie_pair(set_cookie: &HeaderValue) -> String {
        set_cookie
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_level_order_and_tags() {
        assert!(MessageLevel::Debug < MessageLevel::Info);
        assert!(MessageLevel::Success < MessageLevel::Warning);
        assert_eq!(MessageLevel::Error as i32, 40);
        assert_eq!(MessageLevel::Success.to_string(), "success");
        let m = Message::error("x").with_extra_tags("danger");
        assert_eq!(m.tags(), "danger error");
        assert_eq!(Message::success("y").tags(), "success");
    }

    #[test]
    fn test_round_trip_through_cookie() {
        let storage = CookieMessageStorage::new("secret");
        let messages = vec![
            Message::success("Evento creado correctamente."),
            Message::error("Acción no válida."),
        ];
        let set_cookie = storage.store(&messages).unwrap();
        assert!(set_cookie.to_str().unwrap().contains("HttpOnly"));

        let headers = headers_with_cookie(&format!("other=1; {}", cookie_pair(&set_cookie)));
        assert_eq!(storage.load(&headers), messages);
    }

    #[test]
    fn test_missing_cookie_is_empty() {
        let storage = CookieMessageStorage::new("secret");
        assert!(storage.load(&HeaderMap::new()).is_empty());
        assert!(storage.load(&headers_with_cookie("messages=")).is_empty());
        assert!(!CookieMessageStorage::has_cookie(&HeaderMap::new()));
    }

    #[test]
    fn test_tampered_cookie_ignored() {
        let storage = CookieMessageStorage::new("secret");
        let set_cookie = storage.store(&[Message::success("ok")]).unwrap();
        let pair = cookie_pair(&set_cookie);
        let tampered = format!("{}x", pair);
        assert!(storage.load(&headers_with_cookie(&tampered)).is_empty());

        let other_key = CookieMessageStorage::new("another");
        assert!(other_key.load(&headers_with_cookie(&pair)).is_empty());
    }

    #[test]
    fn test_store_empty_clears() {
        let storage = CookieMessageStorage::new("secret");
        let v = storage.store(&[]).unwrap();
        assert!(v.to_str().unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn test_store_drops_oldest_over_size() {
        let storage = CookieMessageStorage::new("secret");
        let messages: Vec<Message> = (0..40)
            .map(|i| Message::success(format!("Evento {i:02} creado correctamente.")))
            .collect();
        let set_cookie = storage.store(&messages).unwrap();
        let pair = cookie_pair(&set_cookie);
        assert!(pair.len() <= MESSAGES_COOKIE.len() + 1 + MAX_COOKIE_SIZE);

        let loaded = storage.load(&headers_with_cookie(&pair));
        assert!(!loaded.is_empty());
        assert!(loaded.len() < messages.len());
        assert_eq!(loaded.last(), messages.last());
        assert_eq!(loaded[..], messages[messages.len() - loaded.len()..]);
    }

    #[test]
    fn test_store_single_oversized_message_clears() {
        let storage = CookieMessageStorage::new("secret");
        let v = storage.store(&[Message::error("x".repeat(4000))]).unwrap();
        assert!(v.to_str().unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn test_cookie_value_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1"));
        headers.append(COOKIE, HeaderValue::from_static("b=2; messages=abc"));
        assert_eq!(cookie_value(&headers, "messages").as_deref(), Some("abc"));
        assert_eq!(cookie_value(&headers, "a").as_deref(), Some("1"));
        assert_eq!(cookie_value(&headers, "zzz"), None);
    }

    #[test]
    fn test_message_context() {
        let ctx = MessageContext::from(&Message::success("hecho"));
        assert_eq!(ctx.level, "success");
        assert_eq!(ctx.tags, "success");
        assert_eq!(ctx.message, "hecho");
    }
}
