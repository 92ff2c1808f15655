//! Identifier newtypes.
//!
//! `AccountId` names the tenant that owns every record. `PublicId` is the
//! per-account number handed to callers; the remaining ids are storage row
//! ids and never leave the repository/service boundary as input.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Unique identifier for the owning account (tenant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Creates a new random AccountId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an AccountId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns the UUID value.
    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AccountId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Per-account surrogate identifier exposed to callers.
///
/// Allocated sequentially inside an account, so two accounts can both own a
/// payment `#1` while their storage ids differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicId(i64);

impl PublicId {
    /// Creates a PublicId, rejecting zero and negative values.
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value <= 0 {
            return Err(DomainError::InvalidPublicId(value.to_string()));
        }
        Ok(Self(value))
    }

    /// Returns the raw value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for PublicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PublicId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| DomainError::InvalidPublicId(s.to_string()))?;
        Self::new(value)
    }
}

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a storage row id.
            pub fn from_raw(id: i64) -> Self {
                Self(id)
            }

            /// Returns the storage row id.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Storage id of a payment row.
    PaymentId
);
row_id!(
    /// Storage id of a client row.
    ClientId
);
row_id!(
    /// Storage id of an invoice row.
    InvoiceId
);
row_id!(
    /// Storage id of a credit row.
    CreditId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_id_parse() {
        let id: PublicId = " 42 ".parse().unwrap();
        assert_eq!(id.get(), 42);
    }

    #[test]
    fn test_public_id_rejects_non_positive() {
        assert!(matches!(
            "0".parse::<PublicId>(),
            Err(DomainError::InvalidPublicId(_))
        ));
        assert!(matches!(
            "-1".parse::<PublicId>(),
            Err(DomainError::InvalidPublicId(_))
        ));
        assert!("abc".parse::<PublicId>().is_err());
    }

    #[test]
    fn test_account_id_roundtrips_through_string() {
        let id = AccountId::new();
        let parsed: AccountId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
