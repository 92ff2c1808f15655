//! # Billing Hex
//!
//! Application service layer for the billing payments data-access layer.
//!
//! ## Architecture
//!
//! - `service/` - Application service (listing queries, validation, save, bulk)
//!
//! The service is generic over `S: PaymentStore`, allowing different storage
//! implementations to be injected. Use [`build_service`] to wire it to the
//! database adapter selected by the crate features.

pub mod service;


pub use service::PaymentService;

/// Connects to `database_url` and returns a service backed by the database.
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub async fn build_service(
    database_url: &str,
) -> anyhow::Result<PaymentService<billing_repo::Repo>> {
    let repo = billing_repo::build_repo(database_url).await?;
    Ok(PaymentService::new(repo))
}
