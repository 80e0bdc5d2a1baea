use serde::Serialize;

use crate::constants::ARV_PROFIT_MARGIN;
use crate::error::{AppError, Result};

/// One row of the allowance schedule: list prices at or below `max_price`
/// earn `pct` of the price, capped at `cap`.
struct Tier {
    max_price: f64,
    pct: f64,
    cap: f64,
}

// Evaluated top-down; the last row catches everything above 600k.
const TIERS: [Tier; 3] = [
    Tier {
        max_price: 300_000.0,
        pct: 0.165,
        cap: 45_000.0,
    },
    Tier {
        max_price: 600_000.0,
        pct: 0.135,
        cap: 75_000.0,
    },
    Tier {
        max_price: f64::INFINITY,
        pct: 0.115,
        cap: 120_000.0,
    },
];

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RenovationEstimate {
    pub renovation_allowance: f64,
    pub after_renovation_value: f64,
}

/// Maps a listing price to a renovation budget and an after-renovation value.
/// Deterministic, no I/O: identical input always yields identical output.
pub fn estimate(list_price: f64) -> Result<RenovationEstimate> {
    if !list_price.is_finite() || list_price <= 0.0 {
        return Err(AppError::InvalidPrice(format!(
            "list price must be a positive number, got {}",
            list_price
        )));
    }

    let tier = TIERS
        .iter()
        .find(|tier| list_price <= tier.max_price)
        .unwrap_or(&TIERS[TIERS.len() - 1]);

    let renovation_allowance = (list_price * tier.pct).min(tier.cap);
    let after_renovation_value = list_price + renovation_allowance * (1.0 + ARV_PROFIT_MARGIN);

    Ok(RenovationEstimate {
        renovation_allowance,
        after_renovation_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn low_tier_uses_percentage_below_cap() {
        let result = estimate(200_000.0).unwrap();
        assert_close(result.renovation_allowance, 33_000.0); // 16.5%
        assert_close(result.after_renovation_value, 200_000.0 + 33_000.0 * 1.3);
    }

    #[test]
    fn low_tier_cap_applies_at_boundary() {
        // 300_000 * 0.165 = 49_500, capped at 45_000
        let result = estimate(300_000.0).unwrap();
        assert_close(result.renovation_allowance, 45_000.0);
    }

    #[test]
    fn tier_boundaries_are_inclusive_on_the_lower_tier() {
        // 300_001 falls into the middle tier
        let result = estimate(300_001.0).unwrap();
        assert_close(result.renovation_allowance, 300_001.0 * 0.135);

        // 600_000 still uses 13.5%
        let result = estimate(600_000.0).unwrap();
        assert_close(result.renovation_allowance, 75_000.0); // 81_000 capped

        // 600_001 crosses into the top tier
        let result = estimate(600_001.0).unwrap();
        assert_close(result.renovation_allowance, 600_001.0 * 0.115);
    }

    #[test]
    fn high_tier_cap_applies_to_luxury_listings() {
        // 2M * 0.115 = 230_000, capped at 120_000
        let result = estimate(2_000_000.0).unwrap();
        assert_close(result.renovation_allowance, 120_000.0);
        assert_close(
            result.after_renovation_value,
            2_000_000.0 + 120_000.0 * 1.3,
        );
    }

    #[test]
    fn arv_adds_allowance_plus_profit_margin() {
        let result = estimate(450_000.0).unwrap();
        assert_close(
            result.after_renovation_value,
            450_000.0 + result.renovation_allowance * 1.3,
        );
    }

    #[test]
    fn non_positive_prices_are_rejected() {
        assert!(matches!(estimate(0.0), Err(AppError::InvalidPrice(_))));
        assert!(matches!(estimate(-100.0), Err(AppError::InvalidPrice(_))));
        assert!(matches!(estimate(f64::NAN), Err(AppError::InvalidPrice(_))));
    }
}
