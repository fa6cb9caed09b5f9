use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use super::non_blank;
use super::validation::{require, MissingField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    Monthly,
    Annual,
    OneTime,
}

impl FromStr for PaymentFrequency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(PaymentFrequency::Monthly),
            "annual" => Ok(PaymentFrequency::Annual),
            "one_time" => Ok(PaymentFrequency::OneTime),
            _ => Err(anyhow::anyhow!("Invalid payment frequency: {}", s)),
        }
    }
}

impl Display for PaymentFrequency {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PaymentFrequency::Monthly => write!(f, "monthly"),
            PaymentFrequency::Annual => write!(f, "annual"),
            PaymentFrequency::OneTime => write!(f, "one_time"),
        }
    }
}

/// Pricing tier row as returned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPricingTier {
    pub id: Uuid,
    pub course_id: Uuid,
    pub tier_name: Option<String>,
    pub description: Option<String>,
    pub payment_frequency: Option<String>,
    #[serde(default)]
    pub is_free: bool,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    pub position: i32,
}

impl RawPricingTier {
    /// A free tier, or a paid tier with a positive price and a currency.
    pub fn has_valid_price(&self) -> bool {
        if self.is_free {
            return self.price.map_or(true, |p| p.is_zero());
        }
        let priced = self.price.is_some_and(|p| p > Decimal::ZERO);
        priced && self.currency.as_deref().is_some_and(is_currency_code)
    }
}

/// Sanitized pricing tier; also the publish schema for a tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingTierDraft {
    pub id: Uuid,
    pub course_id: Uuid,
    pub tier_name: Option<String>,
    pub description: Option<String>,
    pub payment_frequency: Option<String>,
    pub is_free: bool,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub is_active: bool,
    pub position: i32,
}

impl From<RawPricingTier> for PricingTierDraft {
    fn from(raw: RawPricingTier) -> Self {
        PricingTierDraft {
            id: raw.id,
            course_id: raw.course_id,
            tier_name: non_blank(raw.tier_name),
            description: non_blank(raw.description),
            payment_frequency: non_blank(raw.payment_frequency),
            is_free: raw.is_free,
            price: raw.price,
            currency: non_blank(raw.currency).map(|c| c.to_uppercase()),
            is_active: raw.is_active,
            position: raw.position,
        }
    }
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

// Price rules depend on `is_free`, so the schema is written by hand.
impl Validate for PricingTierDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.tier_name.is_none() {
            errors.add("tier_name", field_error("required", "Tier name is required"));
        }

        match self.payment_frequency.as_deref() {
            None => errors.add(
                "payment_frequency",
                field_error("required", "Choose a payment frequency"),
            ),
            Some(value) if value.parse::<PaymentFrequency>().is_err() => errors.add(
                "payment_frequency",
                field_error(
                    "invalid",
                    "Payment frequency must be monthly, annual or one_time",
                ),
            ),
            Some(_) => {}
        }

        if self.is_free {
            if self.price.is_some_and(|p| !p.is_zero()) {
                errors.add("price", field_error("free_tier_price", "A free tier cannot have a price"));
            }
        } else {
            if !self.price.is_some_and(|p| p > Decimal::ZERO) {
                errors.add(
                    "price",
                    field_error("range", "Paid tiers need a price greater than 0"),
                );
            }
            if !self.currency.as_deref().is_some_and(is_currency_code) {
                errors.add(
                    "currency",
                    field_error("currency", "Paid tiers need a 3-letter currency code"),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TierPrice {
    Free,
    Paid { amount: Decimal, currency: String },
}

/// Pricing tier that satisfies the publish schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingTier {
    pub id: Uuid,
    pub course_id: Uuid,
    pub tier_name: String,
    pub description: Option<String>,
    pub payment_frequency: PaymentFrequency,
    pub price: TierPrice,
    pub is_active: bool,
    pub position: i32,
}

impl TryFrom<PricingTierDraft> for PricingTier {
    type Error = MissingField;

    fn try_from(draft: PricingTierDraft) -> Result<Self, Self::Error> {
        let payment_frequency = draft
            .payment_frequency
            .as_deref()
            .and_then(|value| value.parse().ok());
        let price = if draft.is_free {
            TierPrice::Free
        } else {
            TierPrice::Paid {
                amount: require(draft.price, "price")?,
                currency: require(draft.currency, "currency")?,
            }
        };

        Ok(PricingTier {
            id: draft.id,
            course_id: draft.course_id,
            tier_name: require(draft.tier_name, "tier_name")?,
            description: draft.description,
            payment_frequency: require(payment_frequency, "payment_frequency")?,
            price,
            is_active: draft.is_active,
            position: draft.position,
        })
    }
}
