use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::allowance::class_allowances;
use crate::models::{
    Activity, AllowanceCategory, ClassActivity, ClassLine, DailySettlement, EventActivity,
    EventLine, EventStatus, Institution, Instructor, TravelDetail,
};
use crate::rates;
use crate::route::{build_route, measure_route, DistanceMatrix};

/// Groups one instructor's raw activity records into per-day sets, in date
/// order, preserving the order records arrived within a day.
pub fn group_by_date(activities: &[Activity]) -> BTreeMap<NaiveDate, Vec<Activity>> {
    let mut days: BTreeMap<NaiveDate, Vec<Activity>> = BTreeMap::new();
    for activity in activities {
        days.entry(activity.date()).or_default().push(activity.clone());
    }
    days
}

/// Settles one instructor's one calendar day of activities into a gross
/// amount plus the full breakdown. Cancelled activities stay visible as
/// preview lines but never reach the payable total, the travel route, or
/// the equipment flag. Reference-data gaps degrade to warnings.
pub fn compute_daily(
    instructor: &Instructor,
    date: NaiveDate,
    activities: &[Activity],
    institutions: &HashMap<Uuid, Institution>,
    matrix: &DistanceMatrix,
) -> DailySettlement {
    let mut classes: Vec<&ClassActivity> = Vec::new();
    let mut events: Vec<&EventActivity> = Vec::new();
    for activity in activities {
        match activity {
            Activity::Class(class) => classes.push(class),
            Activity::Event(event) => events.push(event),
        }
    }
    let payable_classes: Vec<&ClassActivity> = classes
        .iter()
        .copied()
        .filter(|class| !class.status.is_cancelled())
        .collect();

    let mut warnings = Vec::new();

    let (route, route_warnings) = build_route(&instructor.home_city, &payable_classes, institutions);
    warnings.extend(route_warnings);
    let (legs, total_km, leg_warnings) = measure_route(&route, matrix);
    warnings.extend(leg_warnings);
    let travel_allowance = rates::travel_allowance(total_km);
    let travel = TravelDetail {
        route,
        legs,
        total_km,
        allowance: travel_allowance,
    };

    let mut class_lines = Vec::new();
    let mut teaching_base_amount = 0;
    let mut remote_allowance = 0;
    let mut special_education_allowance = 0;
    let mut weekend_allowance = 0;
    let mut understaffed_allowance = 0;
    let mut cancelled_amount_preview = 0;

    for class in &classes {
        let institution = match institutions.get(&class.institution_id) {
            Some(institution) => institution,
            None => {
                warnings.push(format!(
                    "no institution record for {}; class contribution skipped",
                    class.institution_id
                ));
                continue;
            }
        };
        let fee_per_session = rates::base_fee(class.role, institution.level);
        let base = fee_per_session * class.sessions;

        if class.status.is_cancelled() {
            cancelled_amount_preview += base;
            class_lines.push(ClassLine {
                institution_id: institution.id,
                institution_name: institution.name.clone(),
                role: class.role,
                level: institution.level,
                status: class.status,
                sessions: class.sessions,
                fee_per_session,
                base_amount: 0,
                allowances: Vec::new(),
                cancelled: true,
                cancelled_preview: base,
            });
            continue;
        }

        let allowances = class_allowances(class, institution);
        for line in &allowances {
            match line.category {
                AllowanceCategory::Remote => remote_allowance += line.amount,
                AllowanceCategory::SpecialEducation => special_education_allowance += line.amount,
                AllowanceCategory::Weekend => weekend_allowance += line.amount,
                AllowanceCategory::Understaffed => understaffed_allowance += line.amount,
            }
        }
        teaching_base_amount += base;
        class_lines.push(ClassLine {
            institution_id: institution.id,
            institution_name: institution.name.clone(),
            role: class.role,
            level: institution.level,
            status: class.status,
            sessions: class.sessions,
            fee_per_session,
            base_amount: base,
            allowances,
            cancelled: false,
            cancelled_preview: 0,
        });
    }

    let mut event_lines = Vec::new();
    let mut event_amount = 0;
    for event in &events {
        let cancelled = event.status == EventStatus::Cancelled;
        let amount = if cancelled {
            0
        } else {
            event.hours * rates::EVENT_HOURLY_RATE
        };
        event_amount += amount;
        event_lines.push(EventLine {
            status: event.status,
            hours: event.hours,
            hourly_rate: rates::EVENT_HOURLY_RATE,
            amount,
            cancelled,
        });
    }

    // Day-level flag: transporting equipment is one trip no matter how many
    // activities used it. Cancelled activities never trigger it.
    let equipment_requested = activities
        .iter()
        .any(|activity| !activity.is_cancelled() && activity.equipment_transport());
    let (equipment_transport_amount, equipment_note) = if equipment_requested {
        (
            rates::EQUIPMENT_TRANSPORT_PER_DAY,
            "equipment transported; flat per-day amount".to_string(),
        )
    } else {
        (0, "no equipment transport".to_string())
    };

    let gross_amount = teaching_base_amount
        + remote_allowance
        + special_education_allowance
        + weekend_allowance
        + understaffed_allowance
        + equipment_transport_amount
        + event_amount
        + travel_allowance;

    DailySettlement {
        instructor_id: instructor.id,
        instructor_name: instructor.name.clone(),
        date,
        teaching_base_amount,
        remote_allowance,
        special_education_allowance,
        weekend_allowance,
        understaffed_allowance,
        travel_allowance,
        equipment_transport_amount,
        event_amount,
        gross_amount,
        cancelled_amount_preview,
        classes: class_lines,
        events: event_lines,
        travel,
        equipment_note,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassRole, ClassStatus, InstitutionLevel};

    fn sample_instructor() -> Instructor {
        Instructor {
            id: Uuid::new_v4(),
            name: "Kim Jiyoon".to_string(),
            email: "jiyoon.kim@example.com".to_string(),
            home_city: "Suwon".to_string(),
        }
    }

    fn sample_institution(
        id: Uuid,
        city: &str,
        level: InstitutionLevel,
        is_remote: bool,
        is_special: bool,
    ) -> Institution {
        Institution {
            id,
            name: format!("{city} School"),
            city: city.to_string(),
            level,
            is_remote,
            is_special,
        }
    }

    fn class_on(
        instructor: &Instructor,
        date: NaiveDate,
        institution_id: Uuid,
        status: ClassStatus,
        sessions: i64,
    ) -> ClassActivity {
        ClassActivity {
            instructor_id: instructor.id,
            date,
            status,
            role: ClassRole::Main,
            institution_id,
            sessions,
            students: 20,
            has_assistant: true,
            equipment_transport: false,
        }
    }

    fn tuesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    #[test]
    fn same_city_weekday_class_pays_base_only() {
        let instructor = sample_instructor();
        let institution_id = Uuid::new_v4();
        let mut institutions = HashMap::new();
        institutions.insert(
            institution_id,
            sample_institution(
                institution_id,
                "Suwon",
                InstitutionLevel::Elementary,
                false,
                false,
            ),
        );
        let matrix = DistanceMatrix::default();

        let activities = vec![Activity::Class(class_on(
            &instructor,
            tuesday(),
            institution_id,
            ClassStatus::Completed,
            4,
        ))];

        let settlement =
            compute_daily(&instructor, tuesday(), &activities, &institutions, &matrix);
        assert_eq!(settlement.teaching_base_amount, 160_000);
        assert_eq!(settlement.travel.total_km, 0.0);
        assert_eq!(settlement.travel_allowance, 0);
        assert_eq!(settlement.remote_allowance, 0);
        assert_eq!(settlement.special_education_allowance, 0);
        assert_eq!(settlement.weekend_allowance, 0);
        assert_eq!(settlement.understaffed_allowance, 0);
        assert_eq!(settlement.gross_amount, 160_000);
        assert!(settlement.warnings.is_empty());
    }

    #[test]
    fn second_city_brackets_on_total_route_distance() {
        let instructor = sample_instructor();
        let near_id = Uuid::new_v4();
        let far_id = Uuid::new_v4();
        let mut institutions = HashMap::new();
        institutions.insert(
            near_id,
            sample_institution(near_id, "Suwon", InstitutionLevel::Elementary, false, false),
        );
        institutions.insert(
            far_id,
            sample_institution(far_id, "Wonju", InstitutionLevel::Elementary, false, false),
        );
        let matrix = DistanceMatrix::from_rows(&[(
            "Suwon".to_string(),
            "Wonju".to_string(),
            80.0,
        )]);

        let activities = vec![
            Activity::Class(class_on(
                &instructor,
                tuesday(),
                near_id,
                ClassStatus::Completed,
                4,
            )),
            Activity::Class(class_on(
                &instructor,
                tuesday(),
                far_id,
                ClassStatus::Completed,
                2,
            )),
        ];

        let settlement =
            compute_daily(&instructor, tuesday(), &activities, &institutions, &matrix);
        // Suwon -> Suwon (0) -> Wonju (80) -> Suwon (80) = 160 km
        assert_eq!(settlement.travel.total_km, 160.0);
        assert_eq!(settlement.travel_allowance, 30_000);
    }

    #[test]
    fn cancelled_class_is_preview_only() {
        let instructor = sample_instructor();
        let far_id = Uuid::new_v4();
        let mut institutions = HashMap::new();
        institutions.insert(
            far_id,
            sample_institution(far_id, "Wonju", InstitutionLevel::High, false, false),
        );
        let matrix = DistanceMatrix::from_rows(&[(
            "Suwon".to_string(),
            "Wonju".to_string(),
            80.0,
        )]);

        let activities = vec![Activity::Class(class_on(
            &instructor,
            tuesday(),
            far_id,
            ClassStatus::Cancelled,
            2,
        ))];

        let settlement =
            compute_daily(&instructor, tuesday(), &activities, &institutions, &matrix);
        assert_eq!(settlement.teaching_base_amount, 0);
        assert_eq!(settlement.travel.total_km, 0.0);
        assert_eq!(settlement.travel_allowance, 0);
        assert_eq!(settlement.gross_amount, 0);
        assert_eq!(settlement.cancelled_amount_preview, 100_000);
        assert_eq!(settlement.classes.len(), 1);
        assert!(settlement.classes[0].cancelled);
        assert_eq!(settlement.classes[0].cancelled_preview, 100_000);
        assert_eq!(settlement.travel.route, vec!["Suwon", "Suwon"]);
    }

    #[test]
    fn event_only_day_is_valid() {
        let instructor = sample_instructor();
        let institutions = HashMap::new();
        let matrix = DistanceMatrix::default();

        let activities = vec![Activity::Event(EventActivity {
            instructor_id: instructor.id,
            date: tuesday(),
            status: EventStatus::Completed,
            hours: 3,
            equipment_transport: false,
        })];

        let settlement =
            compute_daily(&instructor, tuesday(), &activities, &institutions, &matrix);
        assert_eq!(settlement.teaching_base_amount, 0);
        assert_eq!(settlement.travel.total_km, 0.0);
        assert_eq!(settlement.event_amount, 90_000);
        assert_eq!(settlement.gross_amount, 90_000);
    }

    #[test]
    fn weekend_event_gets_no_weekend_allowance() {
        let instructor = sample_instructor();
        let institutions = HashMap::new();
        let matrix = DistanceMatrix::default();
        let saturday = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();

        let activities = vec![Activity::Event(EventActivity {
            instructor_id: instructor.id,
            date: saturday,
            status: EventStatus::Completed,
            hours: 2,
            equipment_transport: false,
        })];

        let settlement = compute_daily(&instructor, saturday, &activities, &institutions, &matrix);
        assert_eq!(settlement.weekend_allowance, 0);
        assert_eq!(settlement.event_amount, 60_000);
    }

    #[test]
    fn cancelled_event_pays_nothing() {
        let instructor = sample_instructor();
        let institutions = HashMap::new();
        let matrix = DistanceMatrix::default();

        let activities = vec![Activity::Event(EventActivity {
            instructor_id: instructor.id,
            date: tuesday(),
            status: EventStatus::Cancelled,
            hours: 5,
            equipment_transport: true,
        })];

        let settlement =
            compute_daily(&instructor, tuesday(), &activities, &institutions, &matrix);
        assert_eq!(settlement.event_amount, 0);
        assert_eq!(settlement.equipment_transport_amount, 0);
        assert_eq!(settlement.gross_amount, 0);
        assert_eq!(settlement.events.len(), 1);
        assert!(settlement.events[0].cancelled);
    }

    #[test]
    fn equipment_is_flat_per_day_not_per_activity() {
        let instructor = sample_instructor();
        let institution_id = Uuid::new_v4();
        let mut institutions = HashMap::new();
        institutions.insert(
            institution_id,
            sample_institution(
                institution_id,
                "Suwon",
                InstitutionLevel::Elementary,
                false,
                false,
            ),
        );
        let matrix = DistanceMatrix::default();

        let mut one_flag = class_on(
            &instructor,
            tuesday(),
            institution_id,
            ClassStatus::Completed,
            1,
        );
        one_flag.equipment_transport = true;
        let single = compute_daily(
            &instructor,
            tuesday(),
            &[Activity::Class(one_flag.clone())],
            &institutions,
            &matrix,
        );

        let many: Vec<Activity> = (0..5).map(|_| Activity::Class(one_flag.clone())).collect();
        let repeated = compute_daily(&instructor, tuesday(), &many, &institutions, &matrix);

        assert_eq!(single.equipment_transport_amount, 20_000);
        assert_eq!(repeated.equipment_transport_amount, 20_000);
    }

    #[test]
    fn missing_institution_degrades_to_warning() {
        let instructor = sample_instructor();
        let institutions = HashMap::new();
        let matrix = DistanceMatrix::default();

        let activities = vec![Activity::Class(class_on(
            &instructor,
            tuesday(),
            Uuid::new_v4(),
            ClassStatus::Completed,
            2,
        ))];

        let settlement =
            compute_daily(&instructor, tuesday(), &activities, &institutions, &matrix);
        assert_eq!(settlement.teaching_base_amount, 0);
        assert_eq!(settlement.gross_amount, 0);
        assert!(settlement.classes.is_empty());
        assert!(!settlement.warnings.is_empty());
    }

    #[test]
    fn group_by_date_orders_days_and_keeps_arrival_order() {
        let instructor = sample_instructor();
        let institution_id = Uuid::new_v4();
        let day_one = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let day_two = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();

        let activities = vec![
            Activity::Class(class_on(
                &instructor,
                day_two,
                institution_id,
                ClassStatus::Completed,
                1,
            )),
            Activity::Class(class_on(
                &instructor,
                day_one,
                institution_id,
                ClassStatus::Completed,
                2,
            )),
            Activity::Class(class_on(
                &instructor,
                day_two,
                institution_id,
                ClassStatus::Cancelled,
                3,
            )),
        ];

        let days = group_by_date(&activities);
        let dates: Vec<NaiveDate> = days.keys().copied().collect();
        assert_eq!(dates, vec![day_one, day_two]);
        assert_eq!(days[&day_two].len(), 2);
    }
}
