//! Data Transfer Objects (DTOs) for payment input and listings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Money, PaymentTypeId, PublicId};
use crate::error::DomainError;

// ─────────────────────────────────────────────────────────────────────────────
// Input DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Invoice value meaning "not tied to an invoice".
pub const NO_INVOICE: &str = "-1";

/// Raw payment fields as submitted by the caller.
///
/// References are client/invoice *public* ids as entered; amount and date are
/// the user's strings and are parsed by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInput {
    /// Client public id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    /// Invoice public id, or `-1` for none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice: Option<String>,
    /// Amount in major units, as typed (e.g. `"1,250.00"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_type_id: Option<PaymentTypeId>,
    /// Date in the account's date format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_reference: Option<String>,
}

impl PaymentInput {
    /// Returns true when the caller asked to pay with client credit.
    pub fn pays_with_credit(&self) -> bool {
        self.payment_type_id.is_some_and(PaymentTypeId::is_credit)
    }

    /// The invoice reference, unless absent, blank or the `-1` sentinel.
    pub fn invoice_reference(&self) -> Option<&str> {
        self.invoice
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != NO_INVOICE)
    }
}

/// What to do with the payments selected for a bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    /// Move to the trash only
    Archive,
    /// Flag as deleted, then move to the trash
    Delete,
}

impl std::fmt::Display for BulkAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BulkAction::Archive => write!(f, "archive"),
            BulkAction::Delete => write!(f, "delete"),
        }
    }
}

impl std::str::FromStr for BulkAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "archive" => Ok(BulkAction::Archive),
            "delete" => Ok(BulkAction::Delete),
            other => Err(DomainError::UnknownAction(other.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Listing DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Window applied when executing a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.max(0),
            offset: offset.max(0),
        }
    }
}

/// One row of the payments listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentListing {
    pub public_id: PublicId,
    pub transaction_reference: Option<String>,
    pub client_name: String,
    pub client_public_id: PublicId,
    pub amount: Money,
    pub payment_date: Option<NaiveDate>,
    pub invoice_public_id: PublicId,
    pub invoice_number: String,
    pub currency_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    /// Payment type name, when the payment has one
    pub payment_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_sentinel() {
        let mut input = PaymentInput {
            invoice: Some(NO_INVOICE.into()),
            ..Default::default()
        };
        assert_eq!(input.invoice_reference(), None);

        input.invoice = Some(" 4 ".into());
        assert_eq!(input.invoice_reference(), Some("4"));

        input.invoice = None;
        assert_eq!(input.invoice_reference(), None);
    }

    #[test]
    fn test_bulk_action_parse() {
        assert_eq!("delete".parse::<BulkAction>().unwrap(), BulkAction::Delete);
        assert_eq!("Archive".parse::<BulkAction>().unwrap(), BulkAction::Archive);
        assert!(matches!(
            "purge".parse::<BulkAction>(),
            Err(DomainError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_input_deserializes_from_form_json() {
        let input: PaymentInput = serde_json::from_str(
            r#"{"client":"3","invoice":"-1","amount":"10.00","payment_type_id":1}"#,
        )
        .unwrap();

        assert!(input.pays_with_credit());
        assert_eq!(input.client.as_deref(), Some("3"));
        assert_eq!(input.payment_date, None);
    }
}
