//! Lifecycle status shared by records across services.
//!
//! Stored and sent as its integer value (`1..=5`). An integer outside that
//! range is [`STATUS_IS_NOT_EXIST`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, STATUS_ALREADY_CHANGED, STATUS_IS_NOT_EXIST};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Status {
    Moderation = 1,
    Active = 2,
    Draft = 3,
    Cancelled = 4,
    Closed = 5,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Self::Moderation,
        Self::Active,
        Self::Draft,
        Self::Cancelled,
        Self::Closed,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Moderation => "moderation",
            Self::Active => "active",
            Self::Draft => "draft",
            Self::Cancelled => "cancelled",
            Self::Closed => "closed",
        }
    }

    /// Move from `self` to `next`. Asking for the status a record already
    /// has is [`STATUS_ALREADY_CHANGED`].
    pub fn change_to(self, next: Status) -> Result<Status, AppError> {
        if self == next {
            return Err(STATUS_ALREADY_CHANGED.into());
        }
        Ok(next)
    }
}

impl TryFrom<i32> for Status {
    type Error = AppError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|status| status.code() == value)
            .ok_or_else(|| STATUS_IS_NOT_EXIST.into())
    }
}

impl From<Status> for i32 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
