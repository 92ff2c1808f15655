//! # Billing Types
//!
//! Domain types and port traits for the billing payments layer.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Money, Payment, Credit, ids, context)
//! - `query/` - Listing query specification (built, never executed, here)
//! - `validation/` - Static payment input rules
//! - `convert/` - Amount and date conversions for user input
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for input and listings
//! - `error/` - Domain, repository and application error types

pub mod convert;
pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;
pub mod query;
pub mod validation;

// Re-export commonly used types
pub use domain::{
    AccountContext, AccountId, ClientId, Credit, CreditApplication, CreditId, InvoiceId, Money,
    Payment, PaymentDraft, PaymentId, PaymentTypeId, PublicId, apply_credits,
};
pub use dto::*;
pub use error::{AppError, DomainError, RepoError};
pub use ports::PaymentStore;
pub use query::PaymentQuery;
pub use validation::{Field, FieldError, Rule, RuleSet, ValidationErrors};
