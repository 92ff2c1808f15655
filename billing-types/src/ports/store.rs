//! Storage port trait.
//!
//! This is the primary port in our hexagonal architecture.
//! Adapters (SQLite, Postgres, in-memory test doubles) implement this trait.

use crate::domain::{
    AccountId, ClientId, Credit, InvoiceId, Money, Payment, PaymentDraft, PublicId,
};
use crate::dto::{Page, PaymentListing};
use crate::error::RepoError;
use crate::query::PaymentQuery;

/// Persistence operations the payment service is built on.
///
/// Every method is scoped to one account. "Archived" rows are those with a
/// `deleted_at` tombstone; unless stated otherwise they are invisible.
/// No method is expected to open a transaction spanning calls.
#[async_trait::async_trait]
pub trait PaymentStore: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────────
    // Listing
    // ─────────────────────────────────────────────────────────────────────────────

    /// Executes a listing query, optionally windowed.
    async fn list_payments(
        &self,
        query: &PaymentQuery,
        page: Option<Page>,
    ) -> Result<Vec<PaymentListing>, RepoError>;

    /// Counts the rows `list_payments` would return without a page.
    async fn count_payments(&self, query: &PaymentQuery) -> Result<i64, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Payments
    // ─────────────────────────────────────────────────────────────────────────────

    /// Gets a non-archived payment by public id.
    async fn find_payment(
        &self,
        account: AccountId,
        public_id: PublicId,
    ) -> Result<Option<Payment>, RepoError>;

    /// Gets every non-archived payment whose public id is in `ids`.
    async fn find_payments(
        &self,
        account: AccountId,
        ids: &[PublicId],
    ) -> Result<Vec<Payment>, RepoError>;

    /// Inserts a new payment, allocating its storage id and public id.
    async fn insert_payment(
        &self,
        account: AccountId,
        draft: PaymentDraft,
    ) -> Result<Payment, RepoError>;

    /// Writes all mutable fields of an existing payment and refreshes
    /// `updated_at`.
    async fn update_payment(&self, payment: &Payment) -> Result<Payment, RepoError>;

    /// Stamps the archive tombstone on a payment.
    async fn archive_payment(&self, payment: &Payment) -> Result<(), RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // References
    // ─────────────────────────────────────────────────────────────────────────────

    /// Resolves a non-archived client's public id.
    async fn resolve_client(
        &self,
        account: AccountId,
        public_id: PublicId,
    ) -> Result<Option<ClientId>, RepoError>;

    /// Resolves a non-archived invoice's public id.
    async fn resolve_invoice(
        &self,
        account: AccountId,
        public_id: PublicId,
    ) -> Result<Option<InvoiceId>, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Credits
    // ─────────────────────────────────────────────────────────────────────────────

    /// Lists a client's credits with a positive balance, oldest first.
    async fn credits_with_balance(
        &self,
        account: AccountId,
        client: ClientId,
    ) -> Result<Vec<Credit>, RepoError>;

    /// Persists a credit's balance.
    async fn update_credit_balance(&self, credit: &Credit) -> Result<(), RepoError>;

    /// Sums the remaining balance of a client's credits.
    async fn available_credit(
        &self,
        account: AccountId,
        client: ClientId,
    ) -> Result<Money, RepoError>;
}
