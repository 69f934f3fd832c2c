use std::collections::HashMap;

use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    Activity, ClassActivity, ClassRole, ClassStatus, EventActivity, EventStatus, Institution,
    InstitutionLevel, Instructor,
};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let instructors = vec![
        (
            Uuid::parse_str("8d1c4a2e-5b7f-4f7d-9b1a-0c2d3e4f5a6b")?,
            "Kim Jiyoon",
            "jiyoon.kim@dispatch.example.com",
            "Suwon",
        ),
        (
            Uuid::parse_str("1f2e3d4c-5b6a-4978-8b7c-6d5e4f3a2b1c")?,
            "Park Minho",
            "minho.park@dispatch.example.com",
            "Incheon",
        ),
    ];

    for (id, name, email, home_city) in instructors {
        sqlx::query(
            r#"
            INSERT INTO instructor_settlement.instructors (id, full_name, email, home_city)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name, home_city = EXCLUDED.home_city
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(home_city)
        .execute(pool)
        .await?;
    }

    let institutions = vec![
        ("Jangan Elementary", "Suwon", "elementary", false, false),
        ("Daesin Middle", "Yeoju", "middle", true, false),
        ("Gangnam High", "Seoul", "high", false, false),
        ("Wooman Special School", "Suwon", "elementary", false, true),
    ];

    for (name, city, level, is_remote, is_special) in institutions {
        sqlx::query(
            r#"
            INSERT INTO instructor_settlement.institutions
            (id, name, city, level, is_remote, is_special)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO UPDATE
            SET city = EXCLUDED.city, level = EXCLUDED.level,
                is_remote = EXCLUDED.is_remote, is_special = EXCLUDED.is_special
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(city)
        .bind(level)
        .bind(is_remote)
        .bind(is_special)
        .execute(pool)
        .await?;
    }

    let distances = vec![
        ("Suwon", "Seoul", 34.0),
        ("Suwon", "Incheon", 52.5),
        ("Suwon", "Yeoju", 55.5),
        ("Incheon", "Seoul", 28.0),
        ("Incheon", "Yeoju", 98.0),
        ("Seoul", "Yeoju", 70.0),
    ];

    for (city_a, city_b, km) in distances {
        sqlx::query(
            r#"
            INSERT INTO instructor_settlement.distances (city_a, city_b, km)
            VALUES ($1, $2, $3)
            ON CONFLICT (city_a, city_b) DO UPDATE SET km = EXCLUDED.km
            "#,
        )
        .bind(city_a)
        .bind(city_b)
        .bind(km)
        .execute(pool)
        .await?;
    }

    let classes = vec![
        (
            "seed-001",
            "jiyoon.kim@dispatch.example.com",
            NaiveDate::from_ymd_opt(2026, 3, 2).context("invalid date")?,
            "completed",
            "main",
            "Jangan Elementary",
            4i64,
            20i64,
            true,
            false,
        ),
        (
            "seed-002",
            "jiyoon.kim@dispatch.example.com",
            NaiveDate::from_ymd_opt(2026, 3, 4).context("invalid date")?,
            "completed",
            "main",
            "Daesin Middle",
            3i64,
            18i64,
            false,
            true,
        ),
        (
            "seed-003",
            "jiyoon.kim@dispatch.example.com",
            NaiveDate::from_ymd_opt(2026, 3, 7).context("invalid date")?,
            "completed",
            "main",
            "Wooman Special School",
            2i64,
            8i64,
            true,
            false,
        ),
        (
            "seed-004",
            "jiyoon.kim@dispatch.example.com",
            NaiveDate::from_ymd_opt(2026, 3, 11).context("invalid date")?,
            "cancelled",
            "main",
            "Gangnam High",
            4i64,
            25i64,
            false,
            false,
        ),
        (
            "seed-005",
            "minho.park@dispatch.example.com",
            NaiveDate::from_ymd_opt(2026, 3, 4).context("invalid date")?,
            "completed",
            "assistant",
            "Gangnam High",
            4i64,
            30i64,
            false,
            false,
        ),
    ];

    for (source_key, email, date, status, role, institution, sessions, students, has_assistant, equipment) in
        classes
    {
        let instructor_id = instructor_id_by_email(pool, email).await?;
        let institution_id: Uuid =
            sqlx::query("SELECT id FROM instructor_settlement.institutions WHERE name = $1")
                .bind(institution)
                .fetch_one(pool)
                .await?
                .get("id");

        sqlx::query(
            r#"
            INSERT INTO instructor_settlement.activities
            (id, instructor_id, activity_date, kind, status, role, institution_id,
             sessions, students, has_assistant, equipment_transport, source_key)
            VALUES ($1, $2, $3, 'class', $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(instructor_id)
        .bind(date)
        .bind(status)
        .bind(role)
        .bind(institution_id)
        .bind(sessions)
        .bind(students)
        .bind(has_assistant)
        .bind(equipment)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    let events = vec![
        (
            "seed-101",
            "jiyoon.kim@dispatch.example.com",
            NaiveDate::from_ymd_opt(2026, 3, 14).context("invalid date")?,
            "completed",
            3i64,
            true,
        ),
        (
            "seed-102",
            "minho.park@dispatch.example.com",
            NaiveDate::from_ymd_opt(2026, 3, 20).context("invalid date")?,
            "cancelled",
            2i64,
            false,
        ),
    ];

    for (source_key, email, date, status, hours, equipment) in events {
        let instructor_id = instructor_id_by_email(pool, email).await?;
        sqlx::query(
            r#"
            INSERT INTO instructor_settlement.activities
            (id, instructor_id, activity_date, kind, status, hours, equipment_transport, source_key)
            VALUES ($1, $2, $3, 'event', $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(instructor_id)
        .bind(date)
        .bind(status)
        .bind(hours)
        .bind(equipment)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

async fn instructor_id_by_email(pool: &PgPool, email: &str) -> anyhow::Result<Uuid> {
    let id = sqlx::query("SELECT id FROM instructor_settlement.instructors WHERE email = $1")
        .bind(email)
        .fetch_one(pool)
        .await
        .with_context(|| format!("no instructor with email {email}"))?
        .get("id");
    Ok(id)
}

pub async fn fetch_instructor(pool: &PgPool, email: &str) -> anyhow::Result<Instructor> {
    let row = sqlx::query(
        "SELECT id, full_name, email, home_city \
         FROM instructor_settlement.instructors WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?
    .with_context(|| format!("no instructor with email {email}"))?;

    Ok(Instructor {
        id: row.get("id"),
        name: row.get("full_name"),
        email: row.get("email"),
        home_city: row.get("home_city"),
    })
}

pub async fn fetch_instructors(pool: &PgPool) -> anyhow::Result<Vec<Instructor>> {
    let rows = sqlx::query(
        "SELECT id, full_name, email, home_city \
         FROM instructor_settlement.instructors ORDER BY full_name",
    )
    .fetch_all(pool)
    .await?;

    let mut instructors = Vec::new();
    for row in rows {
        instructors.push(Instructor {
            id: row.get("id"),
            name: row.get("full_name"),
            email: row.get("email"),
            home_city: row.get("home_city"),
        });
    }

    Ok(instructors)
}

pub async fn fetch_institutions(pool: &PgPool) -> anyhow::Result<HashMap<Uuid, Institution>> {
    let rows = sqlx::query(
        "SELECT id, name, city, level, is_remote, is_special \
         FROM instructor_settlement.institutions",
    )
    .fetch_all(pool)
    .await?;

    let mut institutions = HashMap::new();
    for row in rows {
        let level: String = row.get("level");
        let institution = Institution {
            id: row.get("id"),
            name: row.get("name"),
            city: row.get("city"),
            level: InstitutionLevel::parse(&level)?,
            is_remote: row.get("is_remote"),
            is_special: row.get("is_special"),
        };
        institutions.insert(institution.id, institution);
    }

    Ok(institutions)
}

pub async fn fetch_distance_rows(pool: &PgPool) -> anyhow::Result<Vec<(String, String, f64)>> {
    let rows = sqlx::query("SELECT city_a, city_b, km FROM instructor_settlement.distances")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.get("city_a"), row.get("city_b"), row.get("km")))
        .collect())
}

pub async fn fetch_activities(
    pool: &PgPool,
    instructor_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> anyhow::Result<Vec<Activity>> {
    let rows = sqlx::query(
        "SELECT instructor_id, activity_date, kind, status, role, institution_id, \
         sessions, students, has_assistant, hours, equipment_transport \
         FROM instructor_settlement.activities \
         WHERE instructor_id = $1 AND activity_date >= $2 AND activity_date < $3 \
         ORDER BY activity_date, seq",
    )
    .bind(instructor_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    let mut activities = Vec::new();
    for row in rows {
        let kind: String = row.get("kind");
        let status: String = row.get("status");
        match kind.as_str() {
            "class" => {
                let role: Option<String> = row.get("role");
                let role = role.context("class activity without a role")?;
                let institution_id: Option<Uuid> = row.get("institution_id");
                let sessions: Option<i64> = row.get("sessions");
                let students: Option<i64> = row.get("students");
                let has_assistant: Option<bool> = row.get("has_assistant");
                activities.push(Activity::Class(ClassActivity {
                    instructor_id: row.get("instructor_id"),
                    date: row.get("activity_date"),
                    status: ClassStatus::parse(&status)?,
                    role: ClassRole::parse(&role)?,
                    institution_id: institution_id
                        .context("class activity without an institution")?,
                    sessions: sessions.context("class activity without a session count")?,
                    students: students.unwrap_or(0),
                    has_assistant: has_assistant.unwrap_or(false),
                    equipment_transport: row.get("equipment_transport"),
                }));
            }
            "event" => {
                let hours: Option<i64> = row.get("hours");
                activities.push(Activity::Event(EventActivity {
                    instructor_id: row.get("instructor_id"),
                    date: row.get("activity_date"),
                    status: EventStatus::parse(&status)?,
                    hours: hours.context("event activity without hours")?,
                    equipment_transport: row.get("equipment_transport"),
                }));
            }
            other => anyhow::bail!("unknown activity kind: {other}"),
        }
    }

    Ok(activities)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        instructor_name: String,
        instructor_email: String,
        home_city: String,
        activity_date: NaiveDate,
        kind: String,
        status: String,
        role: Option<String>,
        institution: Option<String>,
        sessions: Option<i64>,
        students: Option<i64>,
        has_assistant: Option<bool>,
        hours: Option<i64>,
        equipment_transport: bool,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let instructor_id: Uuid = sqlx::query(
            r#"
            INSERT INTO instructor_settlement.instructors
            (id, full_name, email, home_city)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name, home_city = EXCLUDED.home_city
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.instructor_name)
        .bind(&row.instructor_email)
        .bind(&row.home_city)
        .fetch_one(pool)
        .await?
        .get("id");

        let institution_id: Option<Uuid> = match &row.institution {
            Some(name) => Some(
                sqlx::query("SELECT id FROM instructor_settlement.institutions WHERE name = $1")
                    .bind(name)
                    .fetch_optional(pool)
                    .await?
                    .with_context(|| format!("unknown institution in CSV: {name}"))?
                    .get("id"),
            ),
            None => None,
        };

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO instructor_settlement.activities
            (id, instructor_id, activity_date, kind, status, role, institution_id,
             sessions, students, has_assistant, hours, equipment_transport, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(instructor_id)
        .bind(row.activity_date)
        .bind(&row.kind)
        .bind(&row.status)
        .bind(&row.role)
        .bind(institution_id)
        .bind(row.sessions)
        .bind(row.students)
        .bind(row.has_assistant)
        .bind(row.hours)
        .bind(row.equipment_transport)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
