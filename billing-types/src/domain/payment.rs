//! Payment domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AccountId, ClientId, InvoiceId, PaymentId, PublicId};
use super::money::Money;

/// Lookup id of a payment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentTypeId(i64);

impl PaymentTypeId {
    /// The reserved "Apply Credit" type: the payment is covered by client credits.
    pub const CREDIT: PaymentTypeId = PaymentTypeId(1);

    pub fn from_raw(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }

    pub fn is_credit(self) -> bool {
        self == Self::CREDIT
    }
}

impl std::fmt::Display for PaymentTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fields written by a save, resolved to storage references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDraft {
    pub client_id: ClientId,
    pub invoice_id: Option<InvoiceId>,
    pub payment_type_id: Option<PaymentTypeId>,
    pub payment_date: Option<NaiveDate>,
    pub amount: Money,
    pub transaction_reference: Option<String>,
}

/// A recorded payment against a client (and usually an invoice).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Storage id
    pub id: PaymentId,
    /// Per-account id shown to callers
    pub public_id: PublicId,
    pub account_id: AccountId,
    pub client_id: ClientId,
    pub invoice_id: Option<InvoiceId>,
    pub payment_type_id: Option<PaymentTypeId>,
    pub amount: Money,
    pub payment_date: Option<NaiveDate>,
    /// External reference (e.g., bank transfer id)
    pub transaction_reference: Option<String>,
    /// Set by the bulk `delete` action
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Archive tombstone; archived payments only show up in the trash
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Reconstructs a payment from storage, stamping a fresh row with the draft.
    pub fn from_draft(
        id: PaymentId,
        public_id: PublicId,
        account_id: AccountId,
        draft: PaymentDraft,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            public_id,
            account_id,
            client_id: draft.client_id,
            invoice_id: draft.invoice_id,
            payment_type_id: draft.payment_type_id,
            amount: draft.amount,
            payment_date: draft.payment_date,
            transaction_reference: draft.transaction_reference,
            is_deleted: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Overwrites the editable fields with the draft.
    pub fn apply_draft(&mut self, draft: PaymentDraft) {
        self.client_id = draft.client_id;
        self.invoice_id = draft.invoice_id;
        self.payment_type_id = draft.payment_type_id;
        self.amount = draft.amount;
        self.payment_date = draft.payment_date;
        // An omitted reference keeps the one already on record
        if draft.transaction_reference.is_some() {
            self.transaction_reference = draft.transaction_reference;
        }
    }

    pub fn is_archived(&self) -> bool {
        self.deleted_at.is_some()
    }
}
