use anyhow::bail;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Instructor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub home_city: String,
}

#[derive(Debug, Clone)]
pub struct Institution {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub level: InstitutionLevel,
    pub is_remote: bool,
    pub is_special: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstitutionLevel {
    Elementary,
    Middle,
    High,
}

impl InstitutionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstitutionLevel::Elementary => "elementary",
            InstitutionLevel::Middle => "middle",
            InstitutionLevel::High => "high",
        }
    }

    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "elementary" => Ok(InstitutionLevel::Elementary),
            "middle" => Ok(InstitutionLevel::Middle),
            "high" => Ok(InstitutionLevel::High),
            other => bail!("unknown institution level: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassRole {
    Main,
    Assistant,
}

impl ClassRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassRole::Main => "main",
            ClassRole::Assistant => "assistant",
        }
    }

    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "main" => Ok(ClassRole::Main),
            "assistant" => Ok(ClassRole::Assistant),
            other => bail!("unknown class role: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassStatus {
    Planned,
    Open,
    Assigned,
    Confirmed,
    Completed,
    Cancelled,
}

impl ClassStatus {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClassStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassStatus::Planned => "planned",
            ClassStatus::Open => "open",
            ClassStatus::Assigned => "assigned",
            ClassStatus::Confirmed => "confirmed",
            ClassStatus::Completed => "completed",
            ClassStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "planned" => Ok(ClassStatus::Planned),
            "open" => Ok(ClassStatus::Open),
            "assigned" => Ok(ClassStatus::Assigned),
            "confirmed" => Ok(ClassStatus::Confirmed),
            "completed" => Ok(ClassStatus::Completed),
            "cancelled" => Ok(ClassStatus::Cancelled),
            other => bail!("unknown class status: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Confirmed,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Confirmed => "confirmed",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "confirmed" => Ok(EventStatus::Confirmed),
            "completed" => Ok(EventStatus::Completed),
            "cancelled" => Ok(EventStatus::Cancelled),
            other => bail!("unknown event status: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassActivity {
    pub instructor_id: Uuid,
    pub date: NaiveDate,
    pub status: ClassStatus,
    pub role: ClassRole,
    pub institution_id: Uuid,
    pub sessions: i64,
    pub students: i64,
    pub has_assistant: bool,
    pub equipment_transport: bool,
}

#[derive(Debug, Clone)]
pub struct EventActivity {
    pub instructor_id: Uuid,
    pub date: NaiveDate,
    pub status: EventStatus,
    pub hours: i64,
    pub equipment_transport: bool,
}

#[derive(Debug, Clone)]
pub enum Activity {
    Class(ClassActivity),
    Event(EventActivity),
}

impl Activity {
    pub fn date(&self) -> NaiveDate {
        match self {
            Activity::Class(class) => class.date,
            Activity::Event(event) => event.date,
        }
    }

    pub fn instructor_id(&self) -> Uuid {
        match self {
            Activity::Class(class) => class.instructor_id,
            Activity::Event(event) => event.instructor_id,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match self {
            Activity::Class(class) => class.status == ClassStatus::Cancelled,
            Activity::Event(event) => event.status == EventStatus::Cancelled,
        }
    }

    pub fn equipment_transport(&self) -> bool {
        match self {
            Activity::Class(class) => class.equipment_transport,
            Activity::Event(event) => event.equipment_transport,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowanceCategory {
    Remote,
    SpecialEducation,
    Weekend,
    Understaffed,
}

impl AllowanceCategory {
    pub fn label(&self) -> &'static str {
        match self {
            AllowanceCategory::Remote => "remote site",
            AllowanceCategory::SpecialEducation => "special education",
            AllowanceCategory::Weekend => "weekend",
            AllowanceCategory::Understaffed => "understaffed class",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AllowanceLine {
    pub category: AllowanceCategory,
    pub per_session: i64,
    pub amount: i64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassLine {
    pub institution_id: Uuid,
    pub institution_name: String,
    pub role: ClassRole,
    pub level: InstitutionLevel,
    pub status: ClassStatus,
    pub sessions: i64,
    pub fee_per_session: i64,
    pub base_amount: i64,
    pub allowances: Vec<AllowanceLine>,
    pub cancelled: bool,
    // would-be base fee for a cancelled class, never part of the gross
    pub cancelled_preview: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventLine {
    pub status: EventStatus,
    pub hours: i64,
    pub hourly_rate: i64,
    pub amount: i64,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteLeg {
    pub from: String,
    pub to: String,
    pub km: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TravelDetail {
    pub route: Vec<String>,
    pub legs: Vec<RouteLeg>,
    pub total_km: f64,
    pub allowance: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailySettlement {
    pub instructor_id: Uuid,
    pub instructor_name: String,
    pub date: NaiveDate,
    pub teaching_base_amount: i64,
    pub remote_allowance: i64,
    pub special_education_allowance: i64,
    pub weekend_allowance: i64,
    pub understaffed_allowance: i64,
    pub travel_allowance: i64,
    pub equipment_transport_amount: i64,
    pub event_amount: i64,
    pub gross_amount: i64,
    pub cancelled_amount_preview: i64,
    pub classes: Vec<ClassLine>,
    pub events: Vec<EventLine>,
    pub travel: TravelDetail,
    pub equipment_note: String,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlySettlement {
    pub instructor_id: Uuid,
    pub instructor_name: String,
    pub year: i32,
    pub month: u32,
    pub day_count: usize,
    pub teaching_base_total: i64,
    pub remote_allowance_total: i64,
    pub special_education_total: i64,
    pub weekend_allowance_total: i64,
    pub understaffed_total: i64,
    pub travel_allowance_total: i64,
    pub equipment_transport_total: i64,
    pub event_total: i64,
    pub equipment_cap_applied: bool,
    pub equipment_cap_reduced_amount: i64,
    pub gross_amount: i64,
    pub tax_withheld: i64,
    pub net_amount: i64,
    pub cancelled_amount_preview_total: i64,
    pub days: Vec<DailySettlement>,
}
