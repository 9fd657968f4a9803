use bigdecimal::{BigDecimal, RoundingMode};
use shared::PriceBreakdown;
use uuid::Uuid;

use crate::error::BookingError;
use crate::models::{PricingTier, VendorService};

/// Platform commission, percent of the subtotal.
pub const PLATFORM_FEE_PERCENT: i64 = 15;
/// Sales tax, percent of the subtotal.
pub const TAX_PERCENT: i64 = 8;

const MONEY_SCALE: i64 = 2;

fn platform_fee_rate() -> BigDecimal {
    BigDecimal::new(PLATFORM_FEE_PERCENT.into(), 2)
}

fn tax_rate() -> BigDecimal {
    BigDecimal::new(TAX_PERCENT.into(), 2)
}

fn round_money(amount: BigDecimal) -> BigDecimal {
    amount.with_scale_round(MONEY_SCALE, RoundingMode::HalfUp)
}

/// Compute the itemized price for `quantity` units of `service`.
///
/// If `tier_id` names an active tier of this service its price overrides the
/// service base price; a missing or inactive tier silently falls back to the
/// base price rather than failing. `tiers` must be the service's own tiers.
///
/// The caller is responsible for only passing active services; the only
/// error here is a quantity below 1.
pub fn calculate_total_price(
    service: &VendorService,
    tiers: &[PricingTier],
    quantity: i32,
    tier_id: Option<Uuid>,
) -> Result<PriceBreakdown, BookingError> {
    if quantity < 1 {
        return Err(BookingError::Validation(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let base_price = tier_id
        .and_then(|id| {
            tiers
                .iter()
                .find(|tier| tier.id == id && tier.service_id == service.id && tier.is_active)
        })
        .map(|tier| tier.price.clone())
        .unwrap_or_else(|| service.base_price.clone());

    // Full precision through the arithmetic, rounding only at the edges.
    let subtotal = &base_price * BigDecimal::from(quantity);
    let platform_fee = round_money(&subtotal * platform_fee_rate());
    let tax_amount = round_money(&subtotal * tax_rate());
    let subtotal = round_money(subtotal);
    let total_amount = round_money(&subtotal + &platform_fee + &tax_amount);

    Ok(PriceBreakdown {
        base_price: round_money(base_price),
        subtotal,
        platform_fee,
        tax_amount,
        total_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn money(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn service(base_price: &str) -> VendorService {
        VendorService {
            id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            name: "Catering".to_string(),
            description: String::new(),
            base_price: money(base_price),
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    fn tier(service_id: Uuid, price: &str, is_active: bool) -> PricingTier {
        PricingTier {
            id: Uuid::new_v4(),
            service_id,
            tier_name: "Bulk".to_string(),
            description: String::new(),
            price: money(price),
            min_quantity: 10,
            max_quantity: Some(100),
            is_active,
        }
    }

    #[test]
    fn breakdown_is_deterministic() {
        let svc = service("100.00");
        let breakdown = calculate_total_price(&svc, &[], 3, None).unwrap();
        assert_eq!(breakdown.base_price, money("100.00"));
        assert_eq!(breakdown.subtotal, money("300.00"));
        assert_eq!(breakdown.platform_fee, money("45.00"));
        assert_eq!(breakdown.tax_amount, money("24.00"));
        assert_eq!(breakdown.total_amount, money("369.00"));
    }

    #[test]
    fn end_to_end_reference_amounts() {
        let svc = service("50.00");
        let breakdown = calculate_total_price(&svc, &[], 1, None).unwrap();
        assert_eq!(breakdown.platform_fee, money("7.50"));
        assert_eq!(breakdown.tax_amount, money("4.00"));
        assert_eq!(breakdown.total_amount, money("61.50"));
    }

    #[test]
    fn active_tier_overrides_base_price() {
        let svc = service("100.00");
        let t = tier(svc.id, "80.00", true);
        let tier_id = t.id;
        let breakdown = calculate_total_price(&svc, &[t], 10, Some(tier_id)).unwrap();
        assert_eq!(breakdown.base_price, money("80.00"));
        assert_eq!(breakdown.subtotal, money("800.00"));
    }

    #[test]
    fn unknown_tier_falls_back_silently() {
        let svc = service("100.00");
        let breakdown = calculate_total_price(&svc, &[], 2, Some(Uuid::new_v4())).unwrap();
        assert_eq!(breakdown.base_price, money("100.00"));
        assert_eq!(breakdown.total_amount, money("246.00"));
    }

    #[test]
    fn inactive_tier_falls_back_silently() {
        let svc = service("100.00");
        let t = tier(svc.id, "80.00", false);
        let tier_id = t.id;
        let breakdown = calculate_total_price(&svc, &[t], 2, Some(tier_id)).unwrap();
        assert_eq!(breakdown.base_price, money("100.00"));
    }

    #[test]
    fn tier_of_another_service_is_ignored() {
        let svc = service("100.00");
        let t = tier(Uuid::new_v4(), "1.00", true);
        let tier_id = t.id;
        let breakdown = calculate_total_price(&svc, &[t], 1, Some(tier_id)).unwrap();
        assert_eq!(breakdown.base_price, money("100.00"));
    }

    #[test]
    fn fee_and_tax_round_half_up() {
        let svc = service("33.33");
        let breakdown = calculate_total_price(&svc, &[], 1, None).unwrap();
        // 33.33 * 0.15 = 4.9995 -> 5.00; 33.33 * 0.08 = 2.6664 -> 2.67
        assert_eq!(breakdown.platform_fee, money("5.00"));
        assert_eq!(breakdown.tax_amount, money("2.67"));
        assert_eq!(breakdown.total_amount, money("41.00"));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let svc = service("10.00");
        assert!(matches!(
            calculate_total_price(&svc, &[], 0, None),
            Err(BookingError::Validation(_))
        ));
    }
}
