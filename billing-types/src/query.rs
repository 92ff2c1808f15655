//! Payment listing query specification.
//!
//! A `PaymentQuery` only describes *what* to list. Storage adapters render it
//! into SQL and execute it; nothing here touches IO.

use serde::{Deserialize, Serialize};

use crate::domain::{AccountContext, AccountId, PublicId};

/// Filters for the payments listing.
///
/// Always scoped to one account. The join set and projection are fixed: every
/// listing reads payments with their client, invoice, the client's primary
/// contact and (optionally) the payment type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentQuery {
    pub account_id: AccountId,
    /// Include archived payments
    pub include_trashed: bool,
    /// Restrict to one client
    pub client_public_id: Option<PublicId>,
    /// Case-insensitive substring of the client name
    pub filter: Option<String>,
}

impl PaymentQuery {
    /// Starts a query for the context's account, honoring its trash flag.
    pub fn new(ctx: &AccountContext) -> Self {
        Self {
            account_id: ctx.account_id,
            include_trashed: ctx.show_trash,
            client_public_id: None,
            filter: None,
        }
    }

    pub fn for_client(mut self, client: Option<PublicId>) -> Self {
        self.client_public_id = client;
        self
    }

    /// Adds a client name filter; blank text leaves the query unfiltered.
    pub fn matching(mut self, filter: Option<&str>) -> Self {
        self.filter = filter
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string);
        self
    }

    pub fn with_trash(mut self, include: bool) -> Self {
        self.include_trashed = include;
        self
    }

    /// The filter as a `LIKE` pattern, with wildcard characters escaped by `\`.
    pub fn like_pattern(&self) -> Option<String> {
        self.filter.as_ref().map(|f| {
            let mut pattern = String::with_capacity(f.len() + 2);
            pattern.push('%');
            for c in f.chars() {
                if matches!(c, '%' | '_' | '\\') {
                    pattern.push('\\');
                }
                pattern.push(c);
            }
            pattern.push('%');
            pattern
        })
    }
}
