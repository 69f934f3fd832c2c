use crate::models::{ClassRole, InstitutionLevel};

/// Base fee per session in KRW, by (role, institution level).
pub const BASE_FEES: [(ClassRole, InstitutionLevel, i64); 6] = [
    (ClassRole::Main, InstitutionLevel::Elementary, 40_000),
    (ClassRole::Main, InstitutionLevel::Middle, 45_000),
    (ClassRole::Main, InstitutionLevel::High, 50_000),
    (ClassRole::Assistant, InstitutionLevel::Elementary, 25_000),
    (ClassRole::Assistant, InstitutionLevel::Middle, 28_000),
    (ClassRole::Assistant, InstitutionLevel::High, 30_000),
];

/// Travel allowance brackets: (lower bound in km, flat amount in KRW).
/// Closed below, open above; below the first bound pays nothing.
pub const TRAVEL_BRACKETS: [(f64, i64); 5] = [
    (50.0, 10_000),
    (70.0, 15_000),
    (90.0, 20_000),
    (110.0, 25_000),
    (130.0, 30_000),
];

pub const REMOTE_ALLOWANCE_PER_SESSION: i64 = 10_000;
pub const SPECIAL_EDUCATION_ALLOWANCE_PER_SESSION: i64 = 10_000;
pub const WEEKEND_ALLOWANCE_PER_SESSION: i64 = 10_000;
pub const UNDERSTAFFED_ALLOWANCE_PER_SESSION: i64 = 5_000;
pub const UNDERSTAFFED_STUDENT_THRESHOLD: i64 = 15;

pub const EVENT_HOURLY_RATE: i64 = 30_000;
pub const EQUIPMENT_TRANSPORT_PER_DAY: i64 = 20_000;
pub const EQUIPMENT_TRANSPORT_MONTHLY_CAP: i64 = 300_000;

// Withholding tax in per-mille so the floor stays in integer arithmetic.
// The statement view splits the combined rate back into income + local.
pub const INCOME_TAX_PERMILLE: i64 = 30;
pub const LOCAL_TAX_PERMILLE: i64 = 3;
pub const WITHHOLDING_TAX_PERMILLE: i64 = INCOME_TAX_PERMILLE + LOCAL_TAX_PERMILLE;

pub fn base_fee(role: ClassRole, level: InstitutionLevel) -> i64 {
    BASE_FEES
        .iter()
        .find(|(r, l, _)| *r == role && *l == level)
        .map(|(_, _, fee)| *fee)
        .unwrap_or(0)
}

pub fn travel_allowance(total_km: f64) -> i64 {
    TRAVEL_BRACKETS
        .iter()
        .rev()
        .find(|(lower, _)| total_km >= *lower)
        .map(|(_, amount)| *amount)
        .unwrap_or(0)
}

pub fn withholding_tax(gross: i64) -> i64 {
    gross * WITHHOLDING_TAX_PERMILLE / 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_rates_exceed_assistant_at_every_level() {
        for level in [
            InstitutionLevel::Elementary,
            InstitutionLevel::Middle,
            InstitutionLevel::High,
        ] {
            assert!(base_fee(ClassRole::Main, level) > base_fee(ClassRole::Assistant, level));
        }
    }

    #[test]
    fn rates_increase_with_level_within_each_role() {
        for role in [ClassRole::Main, ClassRole::Assistant] {
            assert!(
                base_fee(role, InstitutionLevel::Elementary)
                    < base_fee(role, InstitutionLevel::Middle)
            );
            assert!(
                base_fee(role, InstitutionLevel::Middle) < base_fee(role, InstitutionLevel::High)
            );
        }
    }

    #[test]
    fn travel_brackets_are_closed_below() {
        assert_eq!(travel_allowance(0.0), 0);
        assert_eq!(travel_allowance(49.9), 0);
        assert_eq!(travel_allowance(50.0), 10_000);
        assert_eq!(travel_allowance(69.9), 10_000);
        assert_eq!(travel_allowance(70.0), 15_000);
        assert_eq!(travel_allowance(89.9), 15_000);
        assert_eq!(travel_allowance(90.0), 20_000);
        assert_eq!(travel_allowance(109.9), 20_000);
        assert_eq!(travel_allowance(110.0), 25_000);
        assert_eq!(travel_allowance(129.9), 25_000);
        assert_eq!(travel_allowance(130.0), 30_000);
        assert_eq!(travel_allowance(500.0), 30_000);
    }

    #[test]
    fn withholding_tax_floors_to_whole_won() {
        assert_eq!(withholding_tax(100_000), 3_300);
        assert_eq!(withholding_tax(96_969), 3_199);
        assert_eq!(withholding_tax(0), 0);
    }

    #[test]
    fn tax_split_matches_combined_rate() {
        assert_eq!(
            WITHHOLDING_TAX_PERMILLE,
            INCOME_TAX_PERMILLE + LOCAL_TAX_PERMILLE
        );
    }
}
