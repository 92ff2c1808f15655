//! Renders a `PaymentQuery` into SQL.
//!
//! Shared by both adapters; `QueryBuilder` takes care of placeholder syntax
//! (`?` vs `$n`). The account key is passed pre-encoded because SQLite stores
//! account ids as text while PostgreSQL uses `UUID`.

use sqlx::{Database, Encode, QueryBuilder, Type};

use billing_types::{Page, PaymentQuery};

const LISTING_COLUMNS: &str = "SELECT payments.public_id, payments.transaction_reference, \
     clients.name AS client_name, clients.public_id AS client_public_id, \
     payments.amount, payments.payment_date, \
     invoices.public_id AS invoice_public_id, invoices.invoice_number, \
     clients.currency_id, contacts.first_name, contacts.last_name, contacts.email, \
     payment_types.name AS payment_type";

const LISTING_SOURCE: &str = " FROM payments \
     JOIN clients ON clients.id = payments.client_id \
     JOIN invoices ON invoices.id = payments.invoice_id \
     JOIN contacts ON contacts.client_id = clients.id \
     LEFT JOIN payment_types ON payment_types.id = payments.payment_type_id";

/// Builds the projected listing query, ordered by insertion.
pub(crate) fn listing_query<'a, DB, K>(
    query: &PaymentQuery,
    account_key: K,
    page: Option<Page>,
) -> QueryBuilder<'a, DB>
where
    DB: Database,
    <DB as Database>::Arguments<'a>: Default,
    K: 'a + Encode<'a, DB> + Type<DB>,
    i64: Encode<'a, DB> + Type<DB>,
    String: Encode<'a, DB> + Type<DB>,
{
    let mut qb = QueryBuilder::new(LISTING_COLUMNS);
    qb.push(LISTING_SOURCE);
    push_predicates(&mut qb, query, account_key);

    qb.push(" ORDER BY payments.id");
    if let Some(page) = page {
        qb.push(" LIMIT ");
        qb.push_bind(page.limit);
        qb.push(" OFFSET ");
        qb.push_bind(page.offset);
    }

    qb
}

/// Builds `SELECT COUNT(*)` over the same joins and predicates.
pub(crate) fn count_query<'a, DB, K>(query: &PaymentQuery, account_key: K) -> QueryBuilder<'a, DB>
where
    DB: Database,
    <DB as Database>::Arguments<'a>: Default,
    K: 'a + Encode<'a, DB> + Type<DB>,
    i64: Encode<'a, DB> + Type<DB>,
    String: Encode<'a, DB> + Type<DB>,
{
    let mut qb = QueryBuilder::new("SELECT COUNT(*)");
    qb.push(LISTING_SOURCE);
    push_predicates(&mut qb, query, account_key);
    qb
}

fn push_predicates<'a, DB, K>(qb: &mut QueryBuilder<'a, DB>, query: &PaymentQuery, account_key: K)
where
    DB: Database,
    K: 'a + Encode<'a, DB> + Type<DB>,
    i64: Encode<'a, DB> + Type<DB>,
    String: Encode<'a, DB> + Type<DB>,
{
    qb.push(" WHERE payments.account_id = ");
    qb.push_bind(account_key);
    qb.push(" AND clients.deleted_at IS NULL AND contacts.is_primary = TRUE");

    if !query.include_trashed {
        qb.push(" AND payments.deleted_at IS NULL");
    }

    if let Some(client) = query.client_public_id {
        qb.push(" AND clients.public_id = ");
        qb.push_bind(client.get());
    }

    // Grouped so more name/contact alternatives can be OR-ed in later
    if let Some(pattern) = query.like_pattern() {
        qb.push(" AND (LOWER(clients.name) LIKE LOWER(");
        qb.push_bind(pattern);
        qb.push(") ESCAPE '\\')");
    }
}
