//! PostgreSQL storage adapter.

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use sqlx::{PgPool, Postgres};

use billing_types::{
    AccountId, ClientId, Credit, InvoiceId, Money, Page, Payment, PaymentDraft, PaymentId,
    PaymentListing, PaymentQuery, PaymentStore, PublicId, RepoError,
};

use crate::listing::{count_query, listing_query};
use crate::types::{DbCredit, DbPayment, DbPaymentListing};

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository implementation.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_tables_pg.sql"),
        "0001",
    )
    .await
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        tracing::debug!("postgres schema ready");
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the database schema (for testing with existing pool).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        run_migrations(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl PaymentStore for PostgresRepo {
    async fn list_payments(
        &self,
        query: &PaymentQuery,
        page: Option<Page>,
    ) -> Result<Vec<PaymentListing>, RepoError> {
        let mut qb = listing_query::<Postgres, _>(query, query.account_id.into_uuid(), page);
        tracing::debug!(sql = qb.sql(), "listing payments");

        let rows: Vec<DbPaymentListing> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbPaymentListing::into_domain).collect()
    }

    async fn count_payments(&self, query: &PaymentQuery) -> Result<i64, RepoError> {
        let mut qb = count_query::<Postgres, _>(query, query.account_id.into_uuid());

        qb.build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))
    }

    async fn find_payment(
        &self,
        account: AccountId,
        public_id: PublicId,
    ) -> Result<Option<Payment>, RepoError> {
        let row: Option<DbPayment> = sqlx::query_as(
            r#"SELECT id, public_id, account_id, client_id, invoice_id, payment_type_id, amount, payment_date,
                      transaction_reference, is_deleted, created_at, updated_at, deleted_at
               FROM payments WHERE account_id = $1 AND public_id = $2 AND deleted_at IS NULL"#,
        )
        .bind(account.into_uuid())
        .bind(public_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbPayment::into_domain).transpose()
    }

    async fn find_payments(
        &self,
        account: AccountId,
        ids: &[PublicId],
    ) -> Result<Vec<Payment>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw_ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();

        let rows: Vec<DbPayment> = sqlx::query_as(
            r#"SELECT id, public_id, account_id, client_id, invoice_id, payment_type_id, amount, payment_date,
                      transaction_reference, is_deleted, created_at, updated_at, deleted_at
               FROM payments
               WHERE account_id = $1 AND public_id = ANY($2) AND deleted_at IS NULL
               ORDER BY id"#,
        )
        .bind(account.into_uuid())
        .bind(&raw_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbPayment::into_domain).collect()
    }

    async fn insert_payment(
        &self,
        account: AccountId,
        draft: PaymentDraft,
    ) -> Result<Payment, RepoError> {
        let now = Utc::now().trunc_subsecs(6);

        // Public ids keep counting past archived rows
        let public_id: i64 = sqlx::query_scalar(
            r#"SELECT COALESCE(MAX(public_id), 0) + 1 FROM payments WHERE account_id = $1"#,
        )
        .bind(account.into_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO payments (account_id, public_id, client_id, invoice_id, payment_type_id, amount,
                                     payment_date, transaction_reference, is_deleted, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE, $9, $9)
               RETURNING id"#,
        )
        .bind(account.into_uuid())
        .bind(public_id)
        .bind(draft.client_id.get())
        .bind(draft.invoice_id.map(InvoiceId::get))
        .bind(draft.payment_type_id.map(|t| t.get()))
        .bind(draft.amount.cents())
        .bind(draft.payment_date)
        .bind(&draft.transaction_reference)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        tracing::info!(payment_id = id, public_id, account_id = %account, "payment inserted");

        Ok(Payment::from_draft(
            PaymentId::from_raw(id),
            PublicId::new(public_id)?,
            account,
            draft,
            now,
        ))
    }

    async fn update_payment(&self, payment: &Payment) -> Result<Payment, RepoError> {
        let now = Utc::now().trunc_subsecs(6);

        let result = sqlx::query(
            r#"UPDATE payments
               SET client_id = $1, invoice_id = $2, payment_type_id = $3, amount = $4, payment_date = $5,
                   transaction_reference = $6, is_deleted = $7, updated_at = $8
               WHERE id = $9 AND account_id = $10"#,
        )
        .bind(payment.client_id.get())
        .bind(payment.invoice_id.map(InvoiceId::get))
        .bind(payment.payment_type_id.map(|t| t.get()))
        .bind(payment.amount.cents())
        .bind(payment.payment_date)
        .bind(&payment.transaction_reference)
        .bind(payment.is_deleted)
        .bind(now)
        .bind(payment.id.get())
        .bind(payment.account_id.into_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        tracing::info!(public_id = %payment.public_id, "payment updated");

        let mut updated = payment.clone();
        updated.updated_at = now;
        Ok(updated)
    }

    async fn archive_payment(&self, payment: &Payment) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"UPDATE payments SET deleted_at = NOW(), updated_at = NOW()
               WHERE id = $1 AND account_id = $2 AND deleted_at IS NULL"#,
        )
        .bind(payment.id.get())
        .bind(payment.account_id.into_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        tracing::info!(public_id = %payment.public_id, "payment archived");
        Ok(())
    }

    async fn resolve_client(
        &self,
        account: AccountId,
        public_id: PublicId,
    ) -> Result<Option<ClientId>, RepoError> {
        let id: Option<i64> = sqlx::query_scalar(
            r#"SELECT id FROM clients WHERE account_id = $1 AND public_id = $2 AND deleted_at IS NULL"#,
        )
        .bind(account.into_uuid())
        .bind(public_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(id.map(ClientId::from_raw))
    }

    async fn resolve_invoice(
        &self,
        account: AccountId,
        public_id: PublicId,
    ) -> Result<Option<InvoiceId>, RepoError> {
        let id: Option<i64> = sqlx::query_scalar(
            r#"SELECT id FROM invoices WHERE account_id = $1 AND public_id = $2 AND deleted_at IS NULL"#,
        )
        .bind(account.into_uuid())
        .bind(public_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(id.map(InvoiceId::from_raw))
    }

    async fn credits_with_balance(
        &self,
        account: AccountId,
        client: ClientId,
    ) -> Result<Vec<Credit>, RepoError> {
        let rows: Vec<DbCredit> = sqlx::query_as(
            r#"SELECT id, public_id, account_id, client_id, amount, balance, created_at
               FROM credits
               WHERE account_id = $1 AND client_id = $2 AND balance > 0 AND deleted_at IS NULL
               ORDER BY created_at ASC, id ASC"#,
        )
        .bind(account.into_uuid())
        .bind(client.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbCredit::into_domain).collect()
    }

    async fn update_credit_balance(&self, credit: &Credit) -> Result<(), RepoError> {
        let result =
            sqlx::query(r#"UPDATE credits SET balance = $1 WHERE id = $2 AND account_id = $3"#)
                .bind(credit.balance.cents())
                .bind(credit.id.get())
                .bind(credit.account_id.into_uuid())
                .execute(&self.pool)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn available_credit(
        &self,
        account: AccountId,
        client: ClientId,
    ) -> Result<Money, RepoError> {
        let total: i64 = sqlx::query_scalar(
            r#"SELECT CAST(COALESCE(SUM(balance), 0) AS BIGINT) FROM credits
               WHERE account_id = $1 AND client_id = $2 AND deleted_at IS NULL"#,
        )
        .bind(account.into_uuid())
        .bind(client.get())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(Money::new(total)?)
    }
}
