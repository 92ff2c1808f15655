//! Domain models for the billing payments layer.

pub mod context;
pub mod credit;
pub mod ids;
pub mod money;
pub mod payment;

pub use context::{AccountContext, DEFAULT_DATE_FORMAT};
pub use credit::{Credit, CreditApplication, apply_credits};
pub use ids::{AccountId, ClientId, CreditId, InvoiceId, PaymentId, PublicId};
pub use money::Money;
pub use payment::{Payment, PaymentDraft, PaymentTypeId};
