//! Client credit balances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AccountId, ClientId, CreditId, PublicId};
use super::money::Money;

/// A prepaid balance belonging to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    pub id: CreditId,
    pub public_id: PublicId,
    pub account_id: AccountId,
    pub client_id: ClientId,
    /// Amount originally credited
    pub amount: Money,
    /// What is left to draw down
    pub balance: Money,
    pub created_at: DateTime<Utc>,
}

impl Credit {
    /// Draws up to `requested` from the balance and returns what was taken.
    ///
    /// The balance never goes below zero.
    pub fn apply(&mut self, requested: Money) -> Money {
        let applied = requested.min(self.balance);
        self.balance = self.balance.saturating_sub(applied);
        applied
    }
}

/// Result of draining a run of credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditApplication {
    /// Total drawn across all credits
    pub applied: Money,
    /// Number of leading credits whose balance was touched
    pub touched: usize,
}

/// Greedily applies `credits` (expected oldest first) towards `amount`.
///
/// Each credit is asked for the amount still owed, so the total applied never
/// exceeds `amount`. Stops at the first point where the target is covered.
pub fn apply_credits(credits: &mut [Credit], amount: Money) -> CreditApplication {
    let mut applied = Money::zero();
    let mut touched = 0;

    for credit in credits.iter_mut() {
        if applied >= amount {
            break;
        }
        let remaining = amount.saturating_sub(applied);
        applied = applied.saturating_add(credit.apply(remaining));
        touched += 1;
    }

    CreditApplication { applied, touched }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credit(id: i64, balance: i64) -> Credit {
        Credit {
            id: CreditId::from_raw(id),
            public_id: PublicId::new(id).unwrap(),
            account_id: AccountId::new(),
            client_id: ClientId::from_raw(1),
            amount: Money::new(balance).unwrap(),
            balance: Money::new(balance).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_apply_caps_at_balance() {
        let mut c = credit(1, 500);
        let applied = c.apply(Money::new(800).unwrap());
        assert_eq!(applied.cents(), 500);
        assert!(c.balance.is_zero());
    }

    #[test]
    fn test_apply_partial() {
        let mut c = credit(1, 500);
        let applied = c.apply(Money::new(200).unwrap());
        assert_eq!(applied.cents(), 200);
        assert_eq!(c.balance.cents(), 300);
    }

    #[test]
    fn test_apply_credits_oldest_first() {
        let mut credits = vec![credit(1, 1000), credit(2, 500)];
        let result = apply_credits(&mut credits, Money::new(1200).unwrap());

        assert_eq!(result.applied.cents(), 1200);
        assert_eq!(result.touched, 2);
        assert_eq!(credits[0].balance.cents(), 0);
        assert_eq!(credits[1].balance.cents(), 300);
    }

    #[test]
    fn test_apply_credits_stops_when_covered() {
        let mut credits = vec![credit(1, 1000), credit(2, 500)];
        let result = apply_credits(&mut credits, Money::new(400).unwrap());

        assert_eq!(result.applied.cents(), 400);
        assert_eq!(result.touched, 1);
        assert_eq!(credits[0].balance.cents(), 600);
        assert_eq!(credits[1].balance.cents(), 500);
    }

    #[test]
    fn test_apply_credits_insufficient() {
        let mut credits = vec![credit(1, 100), credit(2, 50)];
        let result = apply_credits(&mut credits, Money::new(1000).unwrap());

        assert_eq!(result.applied.cents(), 150);
        assert_eq!(result.touched, 2);
        assert!(credits.iter().all(|c| c.balance.is_zero()));
    }
}
