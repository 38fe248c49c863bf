//! Error taxonomy shared by every service.
//!
//! Each domain condition is a fixed [`ErrorDef`]: the HTTP status it renders
//! with, a stable numeric code for clients, and a message. Business-rule
//! failures render with HTTP 200 and carry their meaning in the code; only
//! token problems (401/403) and infrastructure failures (5xx) change the
//! status.
//!
//! [`AppError`] is the runtime value produced from a definition. It owns its
//! message so that templated conditions ("order is not exist") and unknown
//! failures (original message preserved) fit the same shape.

use std::fmt;

use thiserror::Error;

/// Result of a unit of work: a payload or a structured failure, never both.
pub type Outcome<T> = Result<T, AppError>;

const OK: u16 = 200;
const UNAUTHORIZED: u16 = 401;
const FORBIDDEN: u16 = 403;
const INTERNAL_SERVER_ERROR: u16 = 500;
const SERVICE_UNAVAILABLE: u16 = 503;
const GATEWAY_TIMEOUT: u16 = 504;

/// Domain an error belongs to.
///
/// Monitoring keys off this to tell infrastructure outages
/// ([`Category::Connectivity`]) apart from business-logic bugs
/// ([`Category::Unknown`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    AccessControl,
    Validation,
    NotFound,
    Conflict,
    Connectivity,
    Unknown,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessControl => "access_control",
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Connectivity => "connectivity",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable definition of one error condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorDef {
    pub status: u16,
    pub code: i32,
    pub message: &'static str,
    pub category: Category,
}

impl ErrorDef {
    pub const fn new(status: u16, code: i32, message: &'static str, category: Category) -> Self {
        Self {
            status,
            code,
            message,
            category,
        }
    }

    const fn logic(code: i32, message: &'static str, category: Category) -> Self {
        Self::new(OK, code, message, category)
    }
}

// Infrastructure (5xx band)
pub const UNKNOWN_ERROR: ErrorDef =
    ErrorDef::new(INTERNAL_SERVER_ERROR, 500, "unknown error", Category::Unknown);
pub const CONNECTION_ERROR: ErrorDef = ErrorDef::new(
    SERVICE_UNAVAILABLE,
    501,
    "connection error",
    Category::Connectivity,
);
pub const TIMEOUT: ErrorDef =
    ErrorDef::new(GATEWAY_TIMEOUT, 503, "request timed out", Category::Connectivity);

// Access control
pub const ACCESS_DENIED: ErrorDef = ErrorDef::logic(1000, "access denied", Category::AccessControl);
pub const BANNED: ErrorDef = ErrorDef::logic(1001, "user banned", Category::AccessControl);
pub const NOT_VERIFIED: ErrorDef =
    ErrorDef::logic(1011, "user is not verified", Category::AccessControl);
pub const UNAUTHORIZED_TOKEN: ErrorDef =
    ErrorDef::new(UNAUTHORIZED, 2000, "unauthorized", Category::AccessControl);
pub const FORBIDDEN_TOKEN: ErrorDef =
    ErrorDef::new(FORBIDDEN, 2000, "forbidden", Category::AccessControl);

// State conflicts
pub const ALREADY_BANNED: ErrorDef = ErrorDef::logic(1002, "user already banned", Category::Conflict);
pub const ALREADY_UNBANNED: ErrorDef =
    ErrorDef::logic(1003, "user already unbanned", Category::Conflict);
pub const STATUS_ALREADY_CHANGED: ErrorDef =
    ErrorDef::logic(1004, "status already changed", Category::Conflict);
pub const ALREADY_EXISTS: ErrorDef = ErrorDef::logic(1007, "already exists", Category::Conflict);
pub const ALREADY_REGISTERED: ErrorDef =
    ErrorDef::logic(1023, "user already registered", Category::Conflict);
pub const SAME_PASSWORD: ErrorDef = ErrorDef::logic(1031, "same password", Category::Conflict);

// Not found
pub const STATUS_IS_NOT_EXIST: ErrorDef =
    ErrorDef::logic(1005, "status is not exist", Category::NotFound);
pub const OBJECT_IS_NOT_EXIST: ErrorDef = ErrorDef::logic(1006, "is not exist", Category::NotFound);

// Validation
pub const INCORRECT_CONTENT_TYPE: ErrorDef =
    ErrorDef::logic(1009, "incorrect content type", Category::Validation);
pub const INCORRECT_IMAGE_TYPE: ErrorDef =
    ErrorDef::logic(1010, "incorrect image type", Category::Validation);
pub const INCORRECT_ID: ErrorDef = ErrorDef::logic(1012, "incorrect id", Category::Validation);
pub const INCORRECT_USER_ID: ErrorDef =
    ErrorDef::logic(1013, "incorrect user id", Category::Validation);
pub const INCORRECT_ALBUM_ID: ErrorDef =
    ErrorDef::logic(1014, "incorrect album id", Category::Validation);
pub const INCORRECT_ADVERT_TYPE: ErrorDef =
    ErrorDef::logic(1015, "incorrect advert type", Category::Validation);
pub const INCORRECT_ADVERT_ID: ErrorDef =
    ErrorDef::logic(1016, "incorrect advert id", Category::Validation);
pub const INCORRECT_OBJECT_TYPE: ErrorDef =
    ErrorDef::logic(1017, "incorrect object type", Category::Validation);
pub const INCORRECT_BAN_TYPE: ErrorDef =
    ErrorDef::logic(1018, "incorrect ban type", Category::Validation);
pub const INCORRECT_PHONE: ErrorDef = ErrorDef::logic(1019, "incorrect phone", Category::Validation);
pub const INCORRECT_CODE: ErrorDef = ErrorDef::logic(1020, "incorrect code", Category::Validation);
pub const INCORRECT_DATA: ErrorDef = ErrorDef::logic(1021, "incorrect data", Category::Validation);
pub const INCORRECT_LOGIN_OR_PASSWORD: ErrorDef =
    ErrorDef::logic(1022, "incorrect login or password", Category::Validation);
pub const INCORRECT_TYPE: ErrorDef = ErrorDef::logic(1024, "incorrect type", Category::Validation);
pub const INCORRECT_CHAT_ID: ErrorDef =
    ErrorDef::logic(1025, "incorrect chat id", Category::Validation);
pub const INCORRECT_NAME: ErrorDef = ErrorDef::logic(1026, "incorrect name", Category::Validation);
pub const INCORRECT_TO_ID: ErrorDef = ErrorDef::logic(1027, "incorrect to id", Category::Validation);
pub const INCORRECT_TITLE: ErrorDef = ErrorDef::logic(1028, "incorrect title", Category::Validation);
pub const INCORRECT_TEXT: ErrorDef = ErrorDef::logic(1029, "incorrect text", Category::Validation);
pub const INCORRECT_KEY: ErrorDef = ErrorDef::logic(1030, "incorrect key", Category::Validation);
pub const INCORRECT_PASSWORD: ErrorDef =
    ErrorDef::logic(1032, "incorrect password", Category::Validation);

/// A rendered failure: status, stable code, human-readable message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (code {code})")]
pub struct AppError {
    pub status: u16,
    pub code: i32,
    pub message: String,
    pub category: Category,
}

impl AppError {
    /// Build from a definition, overriding its message.
    pub fn with_message(def: ErrorDef, message: impl Into<String>) -> Self {
        Self {
            status: def.status,
            code: def.code,
            message: message.into(),
            category: def.category,
        }
    }

    /// `"<object> is not exist"`.
    pub fn is_not_exist(object: &str) -> Self {
        Self::with_message(
            OBJECT_IS_NOT_EXIST,
            format!("{} {}", object, OBJECT_IS_NOT_EXIST.message),
        )
    }

    /// `"<object> already exists"`.
    pub fn already_exists(object: &str) -> Self {
        Self::with_message(ALREADY_EXISTS, format!("{} {}", object, ALREADY_EXISTS.message))
    }

    /// Catch-all: generic code, original message kept for operators.
    pub fn unknown(err: impl fmt::Display) -> Self {
        Self::with_message(UNKNOWN_ERROR, err.to_string())
    }

    pub fn connection() -> Self {
        CONNECTION_ERROR.into()
    }

    pub fn timeout() -> Self {
        TIMEOUT.into()
    }

    pub fn unauthorized() -> Self {
        UNAUTHORIZED_TOKEN.into()
    }

    pub fn forbidden() -> Self {
        FORBIDDEN_TOKEN.into()
    }

    /// Whether this failure should be treated as a server fault (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status >= INTERNAL_SERVER_ERROR
    }
}

impl From<ErrorDef> for AppError {
    fn from(def: ErrorDef) -> Self {
        Self::with_message(def, def.message)
    }
}
