use anyhow::bail;
use chrono::Datelike;

use crate::models::{DailySettlement, MonthlySettlement};
use crate::rates;

/// Rolls one instructor's daily settlements for one month into a statement:
/// category totals, the equipment-transport cap, withholding tax, and the
/// net payable amount. Mixed or empty input is a caller bug and fails fast.
pub fn compute_monthly(days: Vec<DailySettlement>) -> anyhow::Result<MonthlySettlement> {
    let first = match days.first() {
        Some(day) => day,
        None => bail!("monthly settlement requires at least one daily settlement"),
    };
    let instructor_id = first.instructor_id;
    let instructor_name = first.instructor_name.clone();
    let year = first.date.year();
    let month = first.date.month();

    for day in &days {
        if day.instructor_id != instructor_id {
            bail!(
                "monthly settlement input mixes instructors {} and {}",
                instructor_id,
                day.instructor_id
            );
        }
        if day.date.year() != year || day.date.month() != month {
            bail!(
                "monthly settlement input mixes months {year}-{month:02} and {}-{:02}",
                day.date.year(),
                day.date.month()
            );
        }
    }

    let teaching_base_total: i64 = days.iter().map(|d| d.teaching_base_amount).sum();
    let remote_allowance_total: i64 = days.iter().map(|d| d.remote_allowance).sum();
    let special_education_total: i64 = days.iter().map(|d| d.special_education_allowance).sum();
    let weekend_allowance_total: i64 = days.iter().map(|d| d.weekend_allowance).sum();
    let understaffed_total: i64 = days.iter().map(|d| d.understaffed_allowance).sum();
    let travel_allowance_total: i64 = days.iter().map(|d| d.travel_allowance).sum();
    let event_total: i64 = days.iter().map(|d| d.event_amount).sum();
    let cancelled_amount_preview_total: i64 =
        days.iter().map(|d| d.cancelled_amount_preview).sum();

    let equipment_raw: i64 = days.iter().map(|d| d.equipment_transport_amount).sum();
    let cap = rates::EQUIPMENT_TRANSPORT_MONTHLY_CAP;
    let (equipment_transport_total, equipment_cap_applied, equipment_cap_reduced_amount) =
        if equipment_raw > cap {
            (cap, true, equipment_raw - cap)
        } else {
            (equipment_raw, false, 0)
        };

    let gross_amount = teaching_base_total
        + remote_allowance_total
        + special_education_total
        + weekend_allowance_total
        + understaffed_total
        + travel_allowance_total
        + equipment_transport_total
        + event_total;
    let tax_withheld = rates::withholding_tax(gross_amount);
    let net_amount = gross_amount - tax_withheld;

    Ok(MonthlySettlement {
        instructor_id,
        instructor_name,
        year,
        month,
        day_count: days.len(),
        teaching_base_total,
        remote_allowance_total,
        special_education_total,
        weekend_allowance_total,
        understaffed_total,
        travel_allowance_total,
        equipment_transport_total,
        event_total,
        equipment_cap_applied,
        equipment_cap_reduced_amount,
        gross_amount,
        tax_withheld,
        net_amount,
        cancelled_amount_preview_total,
        days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TravelDetail;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn sample_day(
        instructor_id: Uuid,
        date: NaiveDate,
        teaching: i64,
        equipment: i64,
    ) -> DailySettlement {
        DailySettlement {
            instructor_id,
            instructor_name: "Kim Jiyoon".to_string(),
            date,
            teaching_base_amount: teaching,
            remote_allowance: 0,
            special_education_allowance: 0,
            weekend_allowance: 0,
            understaffed_allowance: 0,
            travel_allowance: 0,
            equipment_transport_amount: equipment,
            event_amount: 0,
            gross_amount: teaching + equipment,
            cancelled_amount_preview: 0,
            classes: Vec::new(),
            events: Vec::new(),
            travel: TravelDetail {
                route: vec!["Suwon".to_string(), "Suwon".to_string()],
                legs: Vec::new(),
                total_km: 0.0,
                allowance: 0,
            },
            equipment_note: "no equipment transport".to_string(),
            warnings: Vec::new(),
        }
    }

    fn march(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    #[test]
    fn sums_days_and_withholds_tax() {
        let instructor_id = Uuid::new_v4();
        let days = vec![
            sample_day(instructor_id, march(2), 60_000, 0),
            sample_day(instructor_id, march(3), 40_000, 0),
        ];
        let monthly = compute_monthly(days).unwrap();
        assert_eq!(monthly.day_count, 2);
        assert_eq!(monthly.gross_amount, 100_000);
        assert_eq!(monthly.tax_withheld, 3_300);
        assert_eq!(monthly.net_amount, 96_700);
    }

    #[test]
    fn equipment_sum_over_cap_is_clamped() {
        let instructor_id = Uuid::new_v4();
        let days: Vec<DailySettlement> = (1..=7)
            .map(|day| sample_day(instructor_id, march(day), 0, 50_000))
            .collect();
        let monthly = compute_monthly(days).unwrap();
        assert!(monthly.equipment_cap_applied);
        assert_eq!(monthly.equipment_transport_total, 300_000);
        assert_eq!(monthly.equipment_cap_reduced_amount, 50_000);
        assert_eq!(monthly.gross_amount, 300_000);
    }

    #[test]
    fn equipment_sum_under_cap_is_untouched() {
        let instructor_id = Uuid::new_v4();
        let days: Vec<DailySettlement> = (1..=5)
            .map(|day| sample_day(instructor_id, march(day), 0, 50_000))
            .collect();
        let monthly = compute_monthly(days).unwrap();
        assert!(!monthly.equipment_cap_applied);
        assert_eq!(monthly.equipment_transport_total, 250_000);
        assert_eq!(monthly.equipment_cap_reduced_amount, 0);
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = compute_monthly(Vec::new()).unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn mixed_instructors_are_rejected() {
        let days = vec![
            sample_day(Uuid::new_v4(), march(2), 10_000, 0),
            sample_day(Uuid::new_v4(), march(3), 10_000, 0),
        ];
        let err = compute_monthly(days).unwrap_err();
        assert!(err.to_string().contains("mixes instructors"));
    }

    #[test]
    fn mixed_months_are_rejected() {
        let instructor_id = Uuid::new_v4();
        let days = vec![
            sample_day(instructor_id, march(31), 10_000, 0),
            sample_day(
                instructor_id,
                NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
                10_000,
                0,
            ),
        ];
        let err = compute_monthly(days).unwrap_err();
        assert!(err.to_string().contains("mixes months"));
    }

    #[test]
    fn cancelled_preview_total_stays_out_of_gross() {
        let instructor_id = Uuid::new_v4();
        let mut day = sample_day(instructor_id, march(2), 50_000, 0);
        day.cancelled_amount_preview = 80_000;
        let monthly = compute_monthly(vec![day]).unwrap();
        assert_eq!(monthly.gross_amount, 50_000);
        assert_eq!(monthly.cancelled_amount_preview_total, 80_000);
    }
}
