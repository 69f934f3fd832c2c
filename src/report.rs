use std::fmt::Write;

use crate::models::MonthlySettlement;
use crate::rates;

/// Splits the combined withheld amount into income + local tax for display.
/// Income tax is floored from the same constants the engine uses; local tax
/// is the remainder, so the split always reconciles with the withheld total.
pub fn tax_split(gross: i64, tax_withheld: i64) -> (i64, i64) {
    let income = gross * rates::INCOME_TAX_PERMILLE / 1000;
    let local = tax_withheld - income;
    (income, local)
}

pub fn build_statement(monthly: &MonthlySettlement) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Instructor Settlement Statement");
    let _ = writeln!(
        output,
        "{} for {}-{:02} ({} settled days)",
        monthly.instructor_name, monthly.year, monthly.month, monthly.day_count
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Daily Settlements");

    if monthly.days.is_empty() {
        let _ = writeln!(output, "No settled days this month.");
    } else {
        for day in monthly.days.iter() {
            let _ = writeln!(
                output,
                "- {}: gross {} KRW ({} classes, {} events, {:.1} km travelled)",
                day.date,
                day.gross_amount,
                day.classes.len(),
                day.events.len(),
                day.travel.total_km
            );
            for warning in &day.warnings {
                let _ = writeln!(output, "  - warning: {warning}");
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Category Totals");
    let _ = writeln!(output, "- teaching base: {} KRW", monthly.teaching_base_total);
    let _ = writeln!(
        output,
        "- remote-site allowance: {} KRW",
        monthly.remote_allowance_total
    );
    let _ = writeln!(
        output,
        "- special-education allowance: {} KRW",
        monthly.special_education_total
    );
    let _ = writeln!(
        output,
        "- weekend allowance: {} KRW",
        monthly.weekend_allowance_total
    );
    let _ = writeln!(
        output,
        "- understaffed-class allowance: {} KRW",
        monthly.understaffed_total
    );
    let _ = writeln!(
        output,
        "- travel allowance: {} KRW",
        monthly.travel_allowance_total
    );
    let _ = writeln!(
        output,
        "- equipment transport: {} KRW",
        monthly.equipment_transport_total
    );
    if monthly.equipment_cap_applied {
        let _ = writeln!(
            output,
            "  - monthly cap applied: {} KRW clamped off (cap {} KRW)",
            monthly.equipment_cap_reduced_amount,
            rates::EQUIPMENT_TRANSPORT_MONTHLY_CAP
        );
    }
    let _ = writeln!(output, "- event pay: {} KRW", monthly.event_total);

    let (income_tax, local_tax) = tax_split(monthly.gross_amount, monthly.tax_withheld);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Payable");
    let _ = writeln!(output, "- gross: {} KRW", monthly.gross_amount);
    let _ = writeln!(
        output,
        "- withholding tax: {} KRW (income {} KRW + local {} KRW)",
        monthly.tax_withheld, income_tax, local_tax
    );
    let _ = writeln!(output, "- net payable: {} KRW", monthly.net_amount);

    if monthly.cancelled_amount_preview_total > 0 {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "Cancelled activities would have paid {} KRW (excluded from the totals above).",
            monthly.cancelled_amount_preview_total
        );
    }

    output
}
