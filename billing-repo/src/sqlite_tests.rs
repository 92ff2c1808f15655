//! SQLite repository integration tests.

#[cfg(test)]
mod tests {
    use billing_types::{
        AccountContext, AccountId, ClientId, InvoiceId, Money, Page, PaymentDraft, PaymentQuery,
        PaymentStore, PaymentTypeId, PublicId, RepoError,
    };
    use chrono::NaiveDate;

    use crate::SqliteRepo;
    use crate::types::format_timestamp;

    async fn setup_repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.unwrap()
    }

    /// Inserts a client with a primary contact and returns its row id.
    async fn seed_client(repo: &SqliteRepo, account: AccountId, public_id: i64, name: &str) -> i64 {
        let now = format_timestamp(chrono::Utc::now());
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO clients (account_id, public_id, name, currency_id, created_at)
             VALUES (?, ?, ?, 1, ?) RETURNING id",
        )
        .bind(account.to_string())
        .bind(public_id)
        .bind(name)
        .bind(&now)
        .fetch_one(repo.pool())
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO contacts (account_id, client_id, is_primary, first_name, last_name, email)
             VALUES (?, ?, 1, 'Ada', 'Lovelace', 'ada@example.com')",
        )
        .bind(account.to_string())
        .bind(id)
        .execute(repo.pool())
        .await
        .unwrap();

        id
    }

    async fn seed_invoice(repo: &SqliteRepo, account: AccountId, client_id: i64, public_id: i64) -> i64 {
        let now = format_timestamp(chrono::Utc::now());
        sqlx::query_scalar(
            "INSERT INTO invoices (account_id, client_id, public_id, invoice_number, created_at)
             VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(account.to_string())
        .bind(client_id)
        .bind(public_id)
        .bind(format!("INV-{public_id:04}"))
        .bind(&now)
        .fetch_one(repo.pool())
        .await
        .unwrap()
    }

    async fn seed_credit(
        repo: &SqliteRepo,
        account: AccountId,
        client_id: i64,
        public_id: i64,
        balance: i64,
        created_at: &str,
    ) {
        sqlx::query(
            "INSERT INTO credits (account_id, client_id, public_id, amount, balance, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(account.to_string())
        .bind(client_id)
        .bind(public_id)
        .bind(balance)
        .bind(balance)
        .bind(created_at)
        .execute(repo.pool())
        .await
        .unwrap();
    }

    fn draft(client_id: i64, invoice_id: Option<i64>, amount: i64) -> PaymentDraft {
        PaymentDraft {
            client_id: ClientId::from_raw(client_id),
            invoice_id: invoice_id.map(InvoiceId::from_raw),
            payment_type_id: Some(PaymentTypeId::from_raw(3)),
            payment_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            amount: Money::new(amount).unwrap(),
            transaction_reference: Some("ref-1".to_string()),
        }
    }

    fn pid(v: i64) -> PublicId {
        PublicId::new(v).unwrap()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Insert / find / update
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_insert_and_find_payment() {
        let repo = setup_repo().await;
        let account = AccountId::new();
        let client = seed_client(&repo, account, 1, "Acme").await;
        let invoice = seed_invoice(&repo, account, client, 1).await;

        let payment = repo
            .insert_payment(account, draft(client, Some(invoice), 1050))
            .await
            .unwrap();

        assert_eq!(payment.public_id, pid(1));
        assert_eq!(payment.amount.cents(), 1050);
        assert!(!payment.is_deleted);

        let fetched = repo.find_payment(account, pid(1)).await.unwrap().unwrap();
        assert_eq!(fetched.id, payment.id);
        assert_eq!(fetched.invoice_id, Some(InvoiceId::from_raw(invoice)));
        assert_eq!(fetched.payment_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(fetched.transaction_reference.as_deref(), Some("ref-1"));
        assert_eq!(fetched.created_at, payment.created_at);
    }

    #[tokio::test]
    async fn test_public_ids_are_per_account() {
        let repo = setup_repo().await;
        let a = AccountId::new();
        let b = AccountId::new();
        let client_a = seed_client(&repo, a, 1, "Acme").await;
        let client_b = seed_client(&repo, b, 1, "Globex").await;

        let first = repo.insert_payment(a, draft(client_a, None, 100)).await.unwrap();
        let second = repo.insert_payment(a, draft(client_a, None, 200)).await.unwrap();
        let other = repo.insert_payment(b, draft(client_b, None, 300)).await.unwrap();

        assert_eq!(first.public_id, pid(1));
        assert_eq!(second.public_id, pid(2));
        assert_eq!(other.public_id, pid(1));
    }

    #[tokio::test]
    async fn test_find_payment_other_account_is_none() {
        let repo = setup_repo().await;
        let account = AccountId::new();
        let client = seed_client(&repo, account, 1, "Acme").await;
        repo.insert_payment(account, draft(client, None, 100)).await.unwrap();

        let result = repo.find_payment(AccountId::new(), pid(1)).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_update_payment() {
        let repo = setup_repo().await;
        let account = AccountId::new();
        let client = seed_client(&repo, account, 1, "Acme").await;
        let mut payment = repo.insert_payment(account, draft(client, None, 100)).await.unwrap();

        payment.amount = Money::new(750).unwrap();
        payment.transaction_reference = None;
        let updated = repo.update_payment(&payment).await.unwrap();
        assert!(updated.updated_at >= payment.created_at);

        let fetched = repo.find_payment(account, payment.public_id).await.unwrap().unwrap();
        assert_eq!(fetched.amount.cents(), 750);
        assert!(fetched.transaction_reference.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_payment_is_not_found() {
        let repo = setup_repo().await;
        let account = AccountId::new();
        let client = seed_client(&repo, account, 1, "Acme").await;
        let mut payment = repo.insert_payment(account, draft(client, None, 100)).await.unwrap();
        payment.account_id = AccountId::new();

        let result = repo.update_payment(&payment).await;

        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Archive
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_archive_hides_payment_but_keeps_public_id() {
        let repo = setup_repo().await;
        let account = AccountId::new();
        let client = seed_client(&repo, account, 1, "Acme").await;
        let payment = repo.insert_payment(account, draft(client, None, 100)).await.unwrap();

        repo.archive_payment(&payment).await.unwrap();

        assert!(repo.find_payment(account, pid(1)).await.unwrap().is_none());
        assert!(matches!(
            repo.archive_payment(&payment).await,
            Err(RepoError::NotFound)
        ));

        let next = repo.insert_payment(account, draft(client, None, 100)).await.unwrap();
        assert_eq!(next.public_id, pid(2));
    }

    #[tokio::test]
    async fn test_find_payments_skips_unknown_and_archived() {
        let repo = setup_repo().await;
        let account = AccountId::new();
        let client = seed_client(&repo, account, 1, "Acme").await;
        for amount in [100, 200, 300] {
            repo.insert_payment(account, draft(client, None, amount)).await.unwrap();
        }
        let second = repo.find_payment(account, pid(2)).await.unwrap().unwrap();
        repo.archive_payment(&second).await.unwrap();

        let found = repo
            .find_payments(account, &[pid(1), pid(2), pid(3), pid(9)])
            .await
            .unwrap();

        let ids: Vec<i64> = found.iter().map(|p| p.public_id.get()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(repo.find_payments(account, &[]).await.unwrap().is_empty());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Listing
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_listing_filters() {
        let repo = setup_repo().await;
        let account = AccountId::new();
        let acme = seed_client(&repo, account, 1, "Acme Corp").await;
        let globex = seed_client(&repo, account, 2, "Globex").await;
        let acme_inv = seed_invoice(&repo, account, acme, 1).await;
        let globex_inv = seed_invoice(&repo, account, globex, 2).await;

        repo.insert_payment(account, draft(acme, Some(acme_inv), 100)).await.unwrap();
        let archived = repo
            .insert_payment(account, draft(acme, Some(acme_inv), 200))
            .await
            .unwrap();
        repo.insert_payment(account, draft(globex, Some(globex_inv), 300)).await.unwrap();
        repo.archive_payment(&archived).await.unwrap();

        let ctx = AccountContext::new(account);
        let live = PaymentQuery::new(&ctx);
        let rows = repo.list_payments(&live, None).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(repo.count_payments(&live).await.unwrap(), 2);

        let with_trash = PaymentQuery::new(&ctx.clone().with_trash(true));
        assert_eq!(repo.count_payments(&with_trash).await.unwrap(), 3);

        let for_client = PaymentQuery::new(&ctx).for_client(Some(pid(2)));
        let rows = repo.list_payments(&for_client, None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].client_name, "Globex");
        assert_eq!(rows[0].amount.cents(), 300);

        let by_name = PaymentQuery::new(&ctx).matching(Some("ACME"));
        let rows = repo.list_payments(&by_name, None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].invoice_number, "INV-0001");
        assert_eq!(rows[0].payment_type.as_deref(), Some("Cash"));
        assert_eq!(rows[0].email.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn test_listing_is_account_scoped_and_paged() {
        let repo = setup_repo().await;
        let account = AccountId::new();
        let other = AccountId::new();
        let client = seed_client(&repo, account, 1, "Acme").await;
        let invoice = seed_invoice(&repo, account, client, 1).await;
        let other_client = seed_client(&repo, other, 1, "Acme").await;
        let other_invoice = seed_invoice(&repo, other, other_client, 1).await;

        for amount in [100, 200, 300] {
            repo.insert_payment(account, draft(client, Some(invoice), amount))
                .await
                .unwrap();
        }
        repo.insert_payment(other, draft(other_client, Some(other_invoice), 999))
            .await
            .unwrap();

        let query = PaymentQuery::new(&AccountContext::new(account));
        let page = repo.list_payments(&query, Some(Page::new(2, 1))).await.unwrap();

        let amounts: Vec<i64> = page.iter().map(|r| r.amount.cents()).collect();
        assert_eq!(amounts, vec![200, 300]);
        assert_eq!(repo.count_payments(&query).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_listing_like_wildcards_are_literal() {
        let repo = setup_repo().await;
        let account = AccountId::new();
        let plain = seed_client(&repo, account, 1, "Acme").await;
        let percent = seed_client(&repo, account, 2, "100% Widgets").await;
        let inv1 = seed_invoice(&repo, account, plain, 1).await;
        let inv2 = seed_invoice(&repo, account, percent, 2).await;
        repo.insert_payment(account, draft(plain, Some(inv1), 100)).await.unwrap();
        repo.insert_payment(account, draft(percent, Some(inv2), 200)).await.unwrap();

        let query = PaymentQuery::new(&AccountContext::new(account)).matching(Some("%"));
        let rows = repo.list_payments(&query, None).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].client_name, "100% Widgets");
    }

    #[tokio::test]
    async fn test_listing_skips_archived_clients_and_secondary_contacts() {
        let repo = setup_repo().await;
        let account = AccountId::new();
        let acme = seed_client(&repo, account, 1, "Acme").await;
        let globex = seed_client(&repo, account, 2, "Globex").await;
        let acme_inv = seed_invoice(&repo, account, acme, 1).await;
        let globex_inv = seed_invoice(&repo, account, globex, 2).await;
        repo.insert_payment(account, draft(acme, Some(acme_inv), 100)).await.unwrap();
        repo.insert_payment(account, draft(globex, Some(globex_inv), 200)).await.unwrap();

        sqlx::query(
            "INSERT INTO contacts (account_id, client_id, is_primary, first_name, last_name, email)
             VALUES (?, ?, 0, 'Bob', 'Builder', 'bob@example.com')",
        )
        .bind(account.to_string())
        .bind(acme)
        .execute(repo.pool())
        .await
        .unwrap();

        sqlx::query("UPDATE clients SET deleted_at = ? WHERE id = ?")
            .bind(format_timestamp(chrono::Utc::now()))
            .bind(globex)
            .execute(repo.pool())
            .await
            .unwrap();

        let query = PaymentQuery::new(&AccountContext::new(account));
        let rows = repo.list_payments(&query, None).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].client_name, "Acme");
        assert_eq!(rows[0].email.as_deref(), Some("ada@example.com"));
        assert_eq!(repo.count_payments(&query).await.unwrap(), 1);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // References and credits
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_resolve_references() {
        let repo = setup_repo().await;
        let account = AccountId::new();
        let client = seed_client(&repo, account, 7, "Acme").await;
        let invoice = seed_invoice(&repo, account, client, 12).await;

        assert_eq!(
            repo.resolve_client(account, pid(7)).await.unwrap(),
            Some(ClientId::from_raw(client))
        );
        assert_eq!(
            repo.resolve_invoice(account, pid(12)).await.unwrap(),
            Some(InvoiceId::from_raw(invoice))
        );
        assert!(repo.resolve_client(account, pid(8)).await.unwrap().is_none());
        assert!(repo.resolve_client(AccountId::new(), pid(7)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_credits_oldest_first_with_balance() {
        let repo = setup_repo().await;
        let account = AccountId::new();
        let client = seed_client(&repo, account, 1, "Acme").await;
        seed_credit(&repo, account, client, 1, 500, "2024-02-01T00:00:00.000000Z").await;
        seed_credit(&repo, account, client, 2, 1000, "2024-01-01T00:00:00.000000Z").await;
        seed_credit(&repo, account, client, 3, 0, "2023-12-01T00:00:00.000000Z").await;

        let credits = repo
            .credits_with_balance(account, ClientId::from_raw(client))
            .await
            .unwrap();

        let balances: Vec<i64> = credits.iter().map(|c| c.balance.cents()).collect();
        assert_eq!(balances, vec![1000, 500]);
        assert_eq!(
            repo.available_credit(account, ClientId::from_raw(client))
                .await
                .unwrap()
                .cents(),
            1500
        );
    }

    #[tokio::test]
    async fn test_update_credit_balance() {
        let repo = setup_repo().await;
        let account = AccountId::new();
        let client = seed_client(&repo, account, 1, "Acme").await;
        seed_credit(&repo, account, client, 1, 1000, "2024-01-01T00:00:00.000000Z").await;

        let mut credits = repo
            .credits_with_balance(account, ClientId::from_raw(client))
            .await
            .unwrap();
        credits[0].balance = Money::zero();
        repo.update_credit_balance(&credits[0]).await.unwrap();

        let remaining = repo
            .credits_with_balance(account, ClientId::from_raw(client))
            .await
            .unwrap();
        assert!(remaining.is_empty());
        assert!(
            repo.available_credit(account, ClientId::from_raw(client))
                .await
                .unwrap()
                .is_zero()
        );
    }
}
