//! Shared database row types with feature-gated fields for SQLite and PostgreSQL.

use sqlx::FromRow;

use billing_types::{
    AccountId, ClientId, Credit, CreditId, InvoiceId, Money, Payment, PaymentId, PaymentListing,
    PaymentTypeId, PublicId, RepoError,
};

// ─────────────────────────────────────────────────────────────────────────────
// Feature-gated imports
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(not(feature = "sqlite"))]
use chrono::{DateTime, NaiveDate, Utc};
#[cfg(not(feature = "sqlite"))]
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Payment row from database.
#[derive(FromRow)]
pub struct DbPayment {
    pub id: i64,
    pub public_id: i64,

    #[cfg(not(feature = "sqlite"))]
    pub account_id: Uuid,
    #[cfg(feature = "sqlite")]
    pub account_id: String,

    pub client_id: i64,
    pub invoice_id: Option<i64>,
    pub payment_type_id: Option<i64>,
    pub amount: i64,

    #[cfg(not(feature = "sqlite"))]
    pub payment_date: Option<NaiveDate>,
    #[cfg(feature = "sqlite")]
    pub payment_date: Option<String>,

    pub transaction_reference: Option<String>,

    #[cfg(not(feature = "sqlite"))]
    pub is_deleted: bool,
    #[cfg(feature = "sqlite")]
    pub is_deleted: i64,

    #[cfg(not(feature = "sqlite"))]
    pub created_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub created_at: String,

    #[cfg(not(feature = "sqlite"))]
    pub updated_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub updated_at: String,

    #[cfg(not(feature = "sqlite"))]
    pub deleted_at: Option<DateTime<Utc>>,
    #[cfg(feature = "sqlite")]
    pub deleted_at: Option<String>,
}

/// Credit row from database.
#[derive(FromRow)]
pub struct DbCredit {
    pub id: i64,
    pub public_id: i64,

    #[cfg(not(feature = "sqlite"))]
    pub account_id: Uuid,
    #[cfg(feature = "sqlite")]
    pub account_id: String,

    pub client_id: i64,
    pub amount: i64,
    pub balance: i64,

    #[cfg(not(feature = "sqlite"))]
    pub created_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub created_at: String,
}

/// Projected listing row (payments joined with clients, invoices, contacts
/// and payment types).
#[derive(FromRow)]
pub struct DbPaymentListing {
    pub public_id: i64,
    pub transaction_reference: Option<String>,
    pub client_name: String,
    pub client_public_id: i64,
    pub amount: i64,

    #[cfg(not(feature = "sqlite"))]
    pub payment_date: Option<NaiveDate>,
    #[cfg(feature = "sqlite")]
    pub payment_date: Option<String>,

    pub invoice_public_id: i64,
    pub invoice_number: String,
    pub currency_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub payment_type: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers (SQLite stores dates and timestamps as text)
// ─────────────────────────────────────────────────────────────────────────────

/// Formats a timestamp with fixed precision so text ordering matches time
/// ordering.
#[cfg(feature = "sqlite")]
pub fn format_timestamp(dt: chrono::DateTime<chrono::Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

#[cfg(feature = "sqlite")]
pub fn parse_timestamp(s: &str) -> Result<chrono::DateTime<chrono::Utc>, RepoError> {
    Ok(chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| RepoError::Database(e.to_string()))?
        .with_timezone(&chrono::Utc))
}

#[cfg(feature = "sqlite")]
pub fn parse_date(s: &str) -> Result<chrono::NaiveDate, RepoError> {
    chrono::NaiveDate::parse_from_str(s, billing_types::convert::SQL_DATE_FORMAT)
        .map_err(|e| RepoError::Database(e.to_string()))
}

#[cfg(feature = "sqlite")]
fn parse_account_id(s: &str) -> Result<AccountId, RepoError> {
    s.parse().map_err(|e: uuid::Error| RepoError::Database(e.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Domain conversion (feature-gated implementations)
// ─────────────────────────────────────────────────────────────────────────────

impl DbPayment {
    /// Convert database row to domain Payment.
    pub fn into_domain(self) -> Result<Payment, RepoError> {
        #[cfg(not(feature = "sqlite"))]
        let (account_id, payment_date, is_deleted, created_at, updated_at, deleted_at) = (
            AccountId::from_uuid(self.account_id),
            self.payment_date,
            self.is_deleted,
            self.created_at,
            self.updated_at,
            self.deleted_at,
        );

        #[cfg(feature = "sqlite")]
        let (account_id, payment_date, is_deleted, created_at, updated_at, deleted_at) = (
            parse_account_id(&self.account_id)?,
            self.payment_date.as_deref().map(parse_date).transpose()?,
            self.is_deleted != 0,
            parse_timestamp(&self.created_at)?,
            parse_timestamp(&self.updated_at)?,
            self.deleted_at.as_deref().map(parse_timestamp).transpose()?,
        );

        Ok(Payment {
            id: PaymentId::from_raw(self.id),
            public_id: PublicId::new(self.public_id)?,
            account_id,
            client_id: ClientId::from_raw(self.client_id),
            invoice_id: self.invoice_id.map(InvoiceId::from_raw),
            payment_type_id: self.payment_type_id.map(PaymentTypeId::from_raw),
            amount: Money::new(self.amount)?,
            payment_date,
            transaction_reference: self.transaction_reference,
            is_deleted,
            created_at,
            updated_at,
            deleted_at,
        })
    }
}

impl DbCredit {
    /// Convert database row to domain Credit.
    pub fn into_domain(self) -> Result<Credit, RepoError> {
        #[cfg(not(feature = "sqlite"))]
        let (account_id, created_at) = (AccountId::from_uuid(self.account_id), self.created_at);

        #[cfg(feature = "sqlite")]
        let (account_id, created_at) = (
            parse_account_id(&self.account_id)?,
            parse_timestamp(&self.created_at)?,
        );

        Ok(Credit {
            id: CreditId::from_raw(self.id),
            public_id: PublicId::new(self.public_id)?,
            account_id,
            client_id: ClientId::from_raw(self.client_id),
            amount: Money::new(self.amount)?,
            balance: Money::new(self.balance)?,
            created_at,
        })
    }
}

impl DbPaymentListing {
    /// Convert database row to a listing DTO.
    pub fn into_domain(self) -> Result<PaymentListing, RepoError> {
        #[cfg(not(feature = "sqlite"))]
        let payment_date = self.payment_date;

        #[cfg(feature = "sqlite")]
        let payment_date = self.payment_date.as_deref().map(parse_date).transpose()?;

        Ok(PaymentListing {
            public_id: PublicId::new(self.public_id)?,
            transaction_reference: self.transaction_reference,
            client_name: self.client_name,
            client_public_id: PublicId::new(self.client_public_id)?,
            amount: Money::new(self.amount)?,
            payment_date,
            invoice_public_id: PublicId::new(self.invoice_public_id)?,
            invoice_number: self.invoice_number,
            currency_id: self.currency_id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            payment_type: self.payment_type,
        })
    }
}
