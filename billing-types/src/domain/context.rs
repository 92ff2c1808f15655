//! Caller context passed into every operation.

use serde::{Deserialize, Serialize};

use super::ids::AccountId;

/// Date format used when the account has not configured one (`Dec 1, 2013`).
pub const DEFAULT_DATE_FORMAT: &str = "%b %d, %Y";

/// The authenticated account and its session preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountContext {
    /// Account every read and write is scoped to
    pub account_id: AccountId,
    /// Whether archived records are included in listings
    pub show_trash: bool,
    /// `chrono` format the account enters dates in
    pub date_format: String,
}

impl AccountContext {
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            show_trash: false,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    pub fn with_trash(mut self, show_trash: bool) -> Self {
        self.show_trash = show_trash;
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }
}
