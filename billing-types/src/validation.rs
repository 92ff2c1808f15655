//! Payment input validation.
//!
//! Rules are a fixed list of `(Field, Rule)` pairs built from the input. Only
//! `HasCredit` needs outside data (the client's remaining credit), which the
//! caller looks up and passes to [`RuleSet::evaluate`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::convert::parse_amount;
use crate::domain::Money;
use crate::dto::PaymentInput;

/// Input field a rule is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Client,
    Invoice,
    Amount,
    PaymentTypeId,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Client => "client",
            Field::Invoice => "invoice",
            Field::Amount => "amount",
            Field::PaymentTypeId => "payment_type_id",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single check applied to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    /// Value must be present and non-blank
    Required,
    /// Parsed amount must be greater than zero
    Positive,
    /// Client must hold at least `amount` cents of unused credit
    HasCredit { client: String, amount: i64 },
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Positive => "positive",
            Rule::HasCredit { .. } => "has_credit",
        }
    }
}

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: Field,
    #[serde(flatten)]
    pub rule: Rule,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule {
            Rule::Required => write!(f, "The {} field is required", self.field),
            Rule::Positive => write!(f, "The {} must be greater than zero", self.field),
            Rule::HasCredit { client, .. } => {
                write!(f, "Client {} does not have enough credit", client)
            }
        }
    }
}

/// Every rule the input violated, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Returns true if `field` failed the rule called `rule_name`.
    pub fn has(&self, field: Field, rule_name: &str) -> bool {
        self.0
            .iter()
            .any(|e| e.field == field && e.rule.name() == rule_name)
    }

    /// Errors reported against one field.
    pub fn for_field(&self, field: Field) -> impl Iterator<Item = &FieldError> {
        self.0.iter().filter(move |e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

/// The rules that apply to one payment input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<(Field, Rule)>,
}

impl RuleSet {
    /// Builds the rule list for `input`.
    ///
    /// `client`, `invoice` and `amount` are always checked; paying with credit
    /// adds a balance check on `payment_type_id`.
    pub fn for_input(input: &PaymentInput) -> Self {
        let mut rules = vec![
            (Field::Client, Rule::Required),
            (Field::Invoice, Rule::Required),
            (Field::Amount, Rule::Required),
            (Field::Amount, Rule::Positive),
        ];

        if input.pays_with_credit() {
            rules.push((
                Field::PaymentTypeId,
                Rule::HasCredit {
                    client: input.client.clone().unwrap_or_default(),
                    amount: input.amount.as_deref().map(parse_amount).unwrap_or(0),
                },
            ));
        }

        Self { rules }
    }

    pub fn rules(&self) -> &[(Field, Rule)] {
        &self.rules
    }

    /// Client and amount of the credit check, if one applies.
    pub fn credit_check(&self) -> Option<(&str, i64)> {
        self.rules.iter().find_map(|(_, rule)| match rule {
            Rule::HasCredit { client, amount } => Some((client.as_str(), *amount)),
            _ => None,
        })
    }

    /// Runs the rules. `available_credit` is the client's unused credit, only
    /// consulted by `HasCredit` (missing counts as zero).
    ///
    /// Returns `None` when the input passes.
    pub fn evaluate(
        &self,
        input: &PaymentInput,
        available_credit: Option<Money>,
    ) -> Option<ValidationErrors> {
        let mut errors = Vec::new();

        for (field, rule) in &self.rules {
            let value = field_value(input, *field);

            let passed = match (rule, value) {
                (Rule::Required, value) => value.is_some(),
                // Only `Required` looks at empty fields
                (_, None) => true,
                (Rule::Positive, Some(v)) => parse_amount(&v) > 0,
                (Rule::HasCredit { amount, .. }, Some(_)) => {
                    available_credit.unwrap_or_default().cents() >= *amount
                }
            };

            if !passed {
                errors.push(FieldError {
                    field: *field,
                    rule: rule.clone(),
                });
            }
        }

        if errors.is_empty() {
            None
        } else {
            Some(ValidationErrors(errors))
        }
    }
}

fn field_value(input: &PaymentInput, field: Field) -> Option<String> {
    let raw = match field {
        Field::Client => input.client.clone(),
        Field::Invoice => input.invoice.clone(),
        Field::Amount => input.amount.clone(),
        Field::PaymentTypeId => input.payment_type_id.map(|id| id.to_string()),
    };
    raw.filter(|v| !v.trim().is_empty())
}
