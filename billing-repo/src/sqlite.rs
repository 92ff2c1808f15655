//! SQLite storage adapter.
#![allow(clippy::collapsible_if)]

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;

use billing_types::{
    AccountId, ClientId, Credit, InvoiceId, Money, Page, Payment, PaymentDraft, PaymentId,
    PaymentListing, PaymentQuery, PaymentStore, PublicId, RepoError, convert::SQL_DATE_FORMAT,
};

use crate::listing::{count_query, listing_query};
use crate::types::{DbCredit, DbPayment, DbPaymentListing, format_timestamp};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            // Remove query parameters
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options).await?;

        // Run migration from migration file
        let ddl = include_str!("../migrations/0001_create_tables.sql");
        sqlx::query(ddl).execute(&pool).await?;

        tracing::debug!("sqlite schema ready");
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the database schema (for testing with existing pool).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        let ddl = include_str!("../migrations/0001_create_tables.sql");
        sqlx::query(ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(())
    }
}

fn format_date(date: Option<chrono::NaiveDate>) -> Option<String> {
    date.map(|d| d.format(SQL_DATE_FORMAT).to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Store implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl PaymentStore for SqliteRepo {
    async fn list_payments(
        &self,
        query: &PaymentQuery,
        page: Option<Page>,
    ) -> Result<Vec<PaymentListing>, RepoError> {
        let mut qb = listing_query::<Sqlite, _>(query, query.account_id.to_string(), page);
        tracing::debug!(sql = qb.sql(), "listing payments");

        let rows: Vec<DbPaymentListing> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbPaymentListing::into_domain).collect()
    }

    async fn count_payments(&self, query: &PaymentQuery) -> Result<i64, RepoError> {
        let mut qb = count_query::<Sqlite, _>(query, query.account_id.to_string());

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
               FROM payments WHERE account_id = ? AND public_id = ? AND deleted_at IS NULL"#,
        )
        .bind(account.to_string())
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

        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"SELECT id, public_id, account_id, client_id, invoice_id, payment_type_id, amount, payment_date,
                      transaction_reference, is_deleted, created_at, updated_at, deleted_at
               FROM payments WHERE deleted_at IS NULL AND account_id = "#,
        );
        qb.push_bind(account.to_string());
        qb.push(" AND public_id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.get());
        }
        separated.push_unseparated(") ORDER BY id");

        let rows: Vec<DbPayment> = qb
            .build_query_as()
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
        let account_str = account.to_string();
        let now = Utc::now().trunc_subsecs(6);
        let now_str = format_timestamp(now);

        // Public ids keep counting past archived rows
        let public_id: i64 = sqlx::query_scalar(
            r#"SELECT COALESCE(MAX(public_id), 0) + 1 FROM payments WHERE account_id = ?"#,
        )
        .bind(&account_str)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO payments (account_id, public_id, client_id, invoice_id, payment_type_id, amount,
                                     payment_date, transaction_reference, is_deleted, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
               RETURNING id"#,
        )
        .bind(&account_str)
        .bind(public_id)
        .bind(draft.client_id.get())
        .bind(draft.invoice_id.map(InvoiceId::get))
        .bind(draft.payment_type_id.map(|t| t.get()))
        .bind(draft.amount.cents())
        .bind(format_date(draft.payment_date))
        .bind(&draft.transaction_reference)
        .bind(&now_str)
        .bind(&now_str)
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
               SET client_id = ?, invoice_id = ?, payment_type_id = ?, amount = ?, payment_date = ?,
                   transaction_reference = ?, is_deleted = ?, updated_at = ?
               WHERE id = ? AND account_id = ?"#,
        )
        .bind(payment.client_id.get())
        .bind(payment.invoice_id.map(InvoiceId::get))
        .bind(payment.payment_type_id.map(|t| t.get()))
        .bind(payment.amount.cents())
        .bind(format_date(payment.payment_date))
        .bind(&payment.transaction_reference)
        .bind(payment.is_deleted)
        .bind(format_timestamp(now))
        .bind(payment.id.get())
        .bind(payment.account_id.to_string())
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
        let now = format_timestamp(Utc::now().trunc_subsecs(6));

        let result = sqlx::query(
            r#"UPDATE payments SET deleted_at = ?, updated_at = ?
               WHERE id = ? AND account_id = ? AND deleted_at IS NULL"#,
        )
        .bind(&now)
        .bind(&now)
        .bind(payment.id.get())
        .bind(payment.account_id.to_string())
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
            r#"SELECT id FROM clients WHERE account_id = ? AND public_id = ? AND deleted_at IS NULL"#,
        )
        .bind(account.to_string())
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
            r#"SELECT id FROM invoices WHERE account_id = ? AND public_id = ? AND deleted_at IS NULL"#,
        )
        .bind(account.to_string())
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
               WHERE account_id = ? AND client_id = ? AND balance > 0 AND deleted_at IS NULL
               ORDER BY created_at ASC, id ASC"#,
        )
        .bind(account.to_string())
        .bind(client.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbCredit::into_domain).collect()
    }

    async fn update_credit_balance(&self, credit: &Credit) -> Result<(), RepoError> {
        let result = sqlx::query(r#"UPDATE credits SET balance = ? WHERE id = ? AND account_id = ?"#)
            .bind(credit.balance.cents())
            .bind(credit.id.get())
            .bind(credit.account_id.to_string())
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
               WHERE account_id = ? AND client_id = ? AND deleted_at IS NULL"#,
        )
        .bind(account.to_string())
        .bind(client.get())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(Money::new(total)?)
    }
}
