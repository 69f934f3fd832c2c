use chrono::{Datelike, Weekday};

use crate::models::{AllowanceCategory, AllowanceLine, ClassActivity, ClassRole, Institution};
use crate::rates;

/// The four conditional allowances for one payable class activity, each
/// evaluated independently. Every line carries a reason, granted or not,
/// so the statement can explain a zero as well as a payout.
pub fn class_allowances(class: &ClassActivity, institution: &Institution) -> Vec<AllowanceLine> {
    vec![
        remote_allowance(class, institution),
        special_education_allowance(class, institution),
        weekend_allowance(class),
        understaffed_allowance(class),
    ]
}

fn remote_allowance(class: &ClassActivity, institution: &Institution) -> AllowanceLine {
    if institution.is_remote {
        granted(
            AllowanceCategory::Remote,
            rates::REMOTE_ALLOWANCE_PER_SESSION,
            class.sessions,
            "institution is in a remote or underserved area",
        )
    } else {
        denied(AllowanceCategory::Remote, "institution is not a remote site")
    }
}

fn special_education_allowance(class: &ClassActivity, institution: &Institution) -> AllowanceLine {
    if institution.is_special {
        granted(
            AllowanceCategory::SpecialEducation,
            rates::SPECIAL_EDUCATION_ALLOWANCE_PER_SESSION,
            class.sessions,
            "institution is a special-education site",
        )
    } else {
        denied(
            AllowanceCategory::SpecialEducation,
            "institution is not a special-education site",
        )
    }
}

fn weekend_allowance(class: &ClassActivity) -> AllowanceLine {
    match class.date.weekday() {
        Weekday::Sat | Weekday::Sun => granted(
            AllowanceCategory::Weekend,
            rates::WEEKEND_ALLOWANCE_PER_SESSION,
            class.sessions,
            "class fell on a weekend",
        ),
        _ => denied(AllowanceCategory::Weekend, "class fell on a weekday"),
    }
}

fn understaffed_allowance(class: &ClassActivity) -> AllowanceLine {
    if class.role != ClassRole::Main {
        return denied(
            AllowanceCategory::Understaffed,
            "assistant role is not eligible",
        );
    }
    if class.students < rates::UNDERSTAFFED_STUDENT_THRESHOLD {
        return denied(
            AllowanceCategory::Understaffed,
            "fewer than 15 students",
        );
    }
    if class.has_assistant {
        return denied(AllowanceCategory::Understaffed, "assistant was present");
    }
    granted(
        AllowanceCategory::Understaffed,
        rates::UNDERSTAFFED_ALLOWANCE_PER_SESSION,
        class.sessions,
        "15 or more students with no assistant present",
    )
}

fn granted(
    category: AllowanceCategory,
    per_session: i64,
    sessions: i64,
    reason: &str,
) -> AllowanceLine {
    AllowanceLine {
        category,
        per_session,
        amount: per_session * sessions,
        reason: reason.to_string(),
    }
}

fn denied(category: AllowanceCategory, reason: &str) -> AllowanceLine {
    AllowanceLine {
        category,
        per_session: 0,
        amount: 0,
        reason: reason.to_string(),
    }
}
