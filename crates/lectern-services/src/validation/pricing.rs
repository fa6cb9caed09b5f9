use lectern_core::constants::MIN_ACTIVE_PRICING_TIERS;
use lectern_core::models::{
    CompletionStatus, PaymentFrequency, PricingTier, PricingTierDraft, RawPricingTier,
    ValidationDomain, ValidationResult,
};
use lectern_db::CourseSnapshotSource;
use uuid::Uuid;

use super::navigation::{CourseRoutes, PricingField};
use super::scorer::{has_text, FieldRequirement, Requirements, StructuralRequirement};
use super::{log_outcome, schema, typing_error, unassessed};

pub static PRICING_REQUIREMENTS: Requirements<RawPricingTier> = Requirements {
    fields: &[
        FieldRequirement {
            field: "tier_name",
            weight: 1,
            is_valid: |t| has_text(&t.tier_name),
        },
        FieldRequirement {
            field: "payment_frequency",
            weight: 1,
            is_valid: |t| {
                t.payment_frequency
                    .as_deref()
                    .is_some_and(|f| f.trim().parse::<PaymentFrequency>().is_ok())
            },
        },
        FieldRequirement {
            field: "price",
            weight: 1,
            is_valid: RawPricingTier::has_valid_price,
        },
    ],
    structural: &[StructuralRequirement {
        field: "active_tier_count",
        weight: 1,
        is_met: |tiers| tiers.iter().filter(|t| t.is_active).count() >= MIN_ACTIVE_PRICING_TIERS,
    }],
};

pub type PricingValidation = ValidationResult<Vec<PricingTier>, Vec<PricingTierDraft>>;

/// Check that the course can be sold: at least one active tier, every tier priced.
#[tracing::instrument(skip(source), fields(domain = "pricing"))]
pub async fn validate_pricing(
    source: &dyn CourseSnapshotSource,
    course_id: Uuid,
    organization_id: Uuid,
) -> PricingValidation {
    let routes = CourseRoutes::new(course_id, organization_id);
    let raw = match source.pricing_tiers(course_id, organization_id).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return unassessed(ValidationDomain::Pricing, PricingField::Id, &routes, None),
        Err(e) => return unassessed(ValidationDomain::Pricing, PricingField::Id, &routes, Some(e)),
    };

    let result = check_pricing(raw, &routes);
    log_outcome(ValidationDomain::Pricing, &routes, &result);
    result
}

pub(crate) fn check_pricing(raw: Vec<RawPricingTier>, routes: &CourseRoutes) -> PricingValidation {
    let completion_status = PRICING_REQUIREMENTS.score(&raw);

    let mut errors: Vec<_> = PRICING_REQUIREMENTS
        .unmet_structural(&raw)
        .into_iter()
        .map(|_| {
            schema::course_error(
                PricingField::ActiveTierCount,
                "Activate at least one pricing tier",
                routes,
            )
        })
        .collect();

    let drafts: Vec<PricingTierDraft> = raw.into_iter().map(PricingTierDraft::from).collect();
    for (index, draft) in drafts.iter().enumerate() {
        errors.extend(schema::entity_errors::<PricingField, _>(
            draft,
            routes,
            Some(index),
            Some(draft.id),
        ));
    }

    if !errors.is_empty() {
        return ValidationResult::Failure {
            data: Some(drafts),
            errors,
            completion_status,
        };
    }

    let mut tiers = Vec::with_capacity(drafts.len());
    for (index, draft) in drafts.iter().enumerate() {
        match PricingTier::try_from(draft.clone()) {
            Ok(tier) => tiers.push(tier),
            Err(missing) => {
                let error =
                    typing_error::<PricingField>(missing, routes, Some(index), Some(draft.id));
                return ValidationResult::Failure {
                    data: Some(drafts),
                    errors: vec![error],
                    completion_status,
                };
            }
        }
    }

    ValidationResult::Success {
        completion_status: CompletionStatus::complete(PRICING_REQUIREMENTS.total(tiers.len())),
        data: tiers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::models::TierPrice;
    use rust_decimal::Decimal;

    fn tier(is_free: bool, price: Option<Decimal>, currency: Option<&str>) -> RawPricingTier {
        RawPricingTier {
            id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            tier_name: Some("Pro".to_string()),
            description: None,
            payment_frequency: Some("annual".to_string()),
            is_free,
            price,
            currency: currency.map(String::from),
            is_active: true,
            position: 0,
        }
    }

    #[test]
    fn inactive_tiers_do_not_satisfy_active_tier_count() {
        let routes = CourseRoutes::new(Uuid::new_v4(), Uuid::new_v4());
        let mut raw = tier(true, None, None);
        raw.is_active = false;

        let result = check_pricing(vec![raw], &routes);
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].field, "active_tier_count");
        assert_eq!(result.errors()[0].navigation, routes.pricing());
        assert_eq!(result.completion_status(), CompletionStatus::new(4, 3));
    }

    #[test]
    fn paid_tier_without_currency_links_to_tier_editor() {
        let routes = CourseRoutes::new(Uuid::new_v4(), Uuid::new_v4());
        let raw = tier(false, Some(Decimal::new(4900, 2)), None);
        let tier_id = raw.id;

        let result = check_pricing(vec![raw], &routes);
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].field, "currency");
        assert_eq!(result.errors()[0].navigation, routes.pricing_tier(tier_id));
        assert_eq!(result.errors()[0].entity_index, Some(0));
        assert_eq!(result.completion_status(), CompletionStatus::new(4, 3));
    }

    #[test]
    fn free_and_paid_tiers_pass() {
        let routes = CourseRoutes::new(Uuid::new_v4(), Uuid::new_v4());
        let result = check_pricing(
            vec![
                tier(true, None, None),
                tier(false, Some(Decimal::new(1999, 2)), Some("eur")),
            ],
            &routes,
        );

        assert!(result.is_success());
        let tiers = result.into_success_data().unwrap();
        assert_eq!(tiers[0].price, TierPrice::Free);
        assert_eq!(
            tiers[1].price,
            TierPrice::Paid {
                amount: Decimal::new(1999, 2),
                currency: "EUR".to_string()
            }
        );
    }
}
