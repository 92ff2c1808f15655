//! Payment Application Service
//!
//! Orchestrates listing, validation and mutations through the storage port.
//! Contains NO infrastructure logic - pure business orchestration.

use billing_types::convert::{parse_amount, to_sql_date};
use billing_types::{
    AccountContext, AccountId, AppError, BulkAction, ClientId, Money, Page, Payment, PaymentDraft,
    PaymentInput, PaymentListing, PaymentQuery, PaymentStore, PublicId, RepoError, RuleSet,
    ValidationErrors, apply_credits,
};

/// Application service for payment operations.
///
/// Generic over `S: PaymentStore` - the adapter is injected at compile time.
/// This enables:
/// - Swapping storage without code changes
/// - Testing with an in-memory store
/// - Compile-time checks for port implementation
///
/// Every operation runs its store calls in order; nothing is wrapped in a
/// database transaction.
pub struct PaymentService<S: PaymentStore> {
    store: S,
}

impl<S: PaymentStore> PaymentService<S> {
    /// Creates a new payment service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Listing
    // ─────────────────────────────────────────────────────────────────────────────

    /// Describes the payments listing for the account. Nothing is executed.
    pub fn find(
        &self,
        ctx: &AccountContext,
        client_public_id: Option<PublicId>,
        filter: Option<&str>,
    ) -> PaymentQuery {
        PaymentQuery::new(ctx)
            .for_client(client_public_id)
            .matching(filter)
    }

    /// Executes a listing query, optionally windowed.
    #[tracing::instrument(skip(self), fields(account_id = %query.account_id))]
    pub async fn list(
        &self,
        query: &PaymentQuery,
        page: Option<Page>,
    ) -> Result<Vec<PaymentListing>, AppError> {
        self.store
            .list_payments(query, page)
            .await
            .map_err(Into::into)
    }

    /// Counts the rows a listing query would return.
    #[tracing::instrument(skip(self), fields(account_id = %query.account_id))]
    pub async fn count(&self, query: &PaymentQuery) -> Result<i64, AppError> {
        self.store.count_payments(query).await.map_err(Into::into)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────────────

    /// Checks `input` against the payment rules.
    ///
    /// Returns `Ok(None)` when the input is acceptable. The only store access
    /// is the credit lookup made when paying with credit.
    #[tracing::instrument(skip(self, ctx, input), fields(account_id = %ctx.account_id))]
    pub async fn get_errors(
        &self,
        ctx: &AccountContext,
        input: &PaymentInput,
    ) -> Result<Option<ValidationErrors>, AppError> {
        let rules = RuleSet::for_input(input);

        let available = match rules.credit_check() {
            Some((client, _)) => Some(self.credit_for_reference(ctx.account_id, client).await?),
            None => None,
        };

        let errors = rules.evaluate(input, available);
        if let Some(errors) = &errors {
            tracing::debug!(count = errors.len(), %errors, "payment input rejected");
        }
        Ok(errors)
    }

    /// Unused credit of a client; zero when the client does not resolve.
    #[tracing::instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn available_credit(
        &self,
        ctx: &AccountContext,
        client_public_id: PublicId,
    ) -> Result<Money, AppError> {
        match self
            .store
            .resolve_client(ctx.account_id, client_public_id)
            .await?
        {
            Some(client) => Ok(self.store.available_credit(ctx.account_id, client).await?),
            None => Ok(Money::zero()),
        }
    }

    async fn credit_for_reference(
        &self,
        account: AccountId,
        client: &str,
    ) -> Result<Money, AppError> {
        let Ok(public_id) = client.parse::<PublicId>() else {
            return Ok(Money::zero());
        };

        match self.store.resolve_client(account, public_id).await? {
            Some(client) => Ok(self.store.available_credit(account, client).await?),
            None => Ok(Money::zero()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Creates (`public_id == None`) or updates a payment from raw input.
    ///
    /// Input is not validated here; see [`Self::submit`]. Every reference and
    /// the date are resolved first; paying with credit then draws the client's
    /// credits down right before the payment itself is written.
    #[tracing::instrument(skip(self, ctx, input), fields(account_id = %ctx.account_id, public_id = ?public_id))]
    pub async fn save(
        &self,
        ctx: &AccountContext,
        public_id: Option<PublicId>,
        input: PaymentInput,
    ) -> Result<Payment, AppError> {
        let account = ctx.account_id;

        let existing = match public_id {
            Some(id) => Some(
                self.store
                    .find_payment(account, id)
                    .await?
                    .ok_or_else(|| AppError::payment_not_found(id))?,
            ),
            None => None,
        };

        let amount = Money::new(parse_amount(input.amount.as_deref().unwrap_or_default()))?;

        let client_id = self.resolve_client(account, input.client.as_deref()).await?;

        let invoice_id = match input.invoice_reference() {
            Some(reference) => {
                let invoice: PublicId = reference.parse()?;
                Some(
                    self.store
                        .resolve_invoice(account, invoice)
                        .await?
                        .ok_or_else(|| RepoError::unresolved("invoice", invoice))?,
                )
            }
            None => None,
        };

        let payment_date = to_sql_date(
            input.payment_date.as_deref().unwrap_or_default(),
            &ctx.date_format,
        )?;

        // No input check may fail past this point
        if input.pays_with_credit() {
            self.draw_credit(account, client_id, amount).await?;
        }

        let draft = PaymentDraft {
            client_id,
            invoice_id,
            payment_type_id: input.payment_type_id,
            payment_date,
            amount,
            transaction_reference: input.transaction_reference,
        };

        let payment = match existing {
            Some(mut payment) => {
                payment.apply_draft(draft);
                self.store.update_payment(&payment).await?
            }
            None => self.store.insert_payment(account, draft).await?,
        };

        Ok(payment)
    }

    /// Validates `input`, then saves it.
    pub async fn submit(
        &self,
        ctx: &AccountContext,
        public_id: Option<PublicId>,
        input: PaymentInput,
    ) -> Result<Payment, AppError> {
        if let Some(errors) = self.get_errors(ctx, &input).await? {
            return Err(AppError::Validation(errors));
        }
        self.save(ctx, public_id, input).await
    }

    /// Archives the selected payments, flagging them as deleted first when
    /// `action` is `Delete`.
    ///
    /// Unknown and already archived ids are skipped. Returns how many payments
    /// were processed; the first failure stops the batch.
    #[tracing::instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn bulk(
        &self,
        ctx: &AccountContext,
        ids: &[PublicId],
        action: BulkAction,
    ) -> Result<usize, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let payments = self.store.find_payments(ctx.account_id, ids).await?;
        let count = payments.len();

        for mut payment in payments {
            if action == BulkAction::Delete {
                payment.is_deleted = true;
                payment = self.store.update_payment(&payment).await?;
            }
            self.store.archive_payment(&payment).await?;
        }

        tracing::info!(count, %action, "bulk action applied");
        Ok(count)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────────

    async fn resolve_client(
        &self,
        account: AccountId,
        reference: Option<&str>,
    ) -> Result<ClientId, AppError> {
        let reference = reference
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| AppError::BadRequest("Client is required".into()))?;
        let public_id: PublicId = reference.parse()?;

        self.store
            .resolve_client(account, public_id)
            .await?
            .ok_or_else(|| RepoError::unresolved("client", public_id).into())
    }

    /// Draws `amount` from the client's credits, oldest first.
    async fn draw_credit(
        &self,
        account: AccountId,
        client: ClientId,
        amount: Money,
    ) -> Result<(), AppError> {
        let mut credits = self.store.credits_with_balance(account, client).await?;
        let outcome = apply_credits(&mut credits, amount);

        for credit in &credits[..outcome.touched] {
            self.store.update_credit_balance(credit).await?;
        }

        tracing::info!(
            client_id = %client,
            requested = %amount,
            applied = %outcome.applied,
            credits = outcome.touched,
            "credit applied"
        );
        Ok(())
    }
}
