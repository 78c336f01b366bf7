use crate::db::models::{Guardian, StudentNonAcademic};

const GUARDIAN_COLUMNS: &str = "\
    id, student_id, position, relationship, last_name, first_name, middle_name, birth_date, \
    occupation, contact_number, email, address, created_at";

const NON_ACADEMIC_COLUMNS: &str = "\
    student_id, study_hours, study_place, study_with, family_support, \
    parent_highest_education, parent_marital_status, house_type, has_quiet_place, study_area, \
    transport_mode, travel_time, access_resources, computer_use, hobbies, personality_traits, \
    confidence_level, updated_at";

pub(crate) struct CreateGuardian<'a> {
    pub id: &'a str,
    pub student_id: &'a str,
    pub position: i32,
    pub relationship: &'a str,
    pub last_name: &'a str,
    pub first_name: &'a str,
    pub middle_name: Option<&'a str>,
    pub birth_date: Option<time::Date>,
    pub occupation: Option<&'a str>,
    pub contact_number: Option<&'a str>,
    pub email: Option<&'a str>,
    pub address: Option<&'a str>,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpsertNonAcademic<'a> {
    pub student_id: &'a str,
    pub study_hours: Option<&'a str>,
    pub study_place: Option<&'a str>,
    pub study_with: Option<&'a str>,
    pub family_support: Option<&'a str>,
    pub parent_highest_education: Option<&'a str>,
    pub parent_marital_status: Option<&'a str>,
    pub house_type: Option<&'a str>,
    pub has_quiet_place: bool,
    pub study_area: Option<&'a str>,
    pub transport_mode: Option<&'a str>,
    pub travel_time: Option<&'a str>,
    pub access_resources: Option<&'a str>,
    pub computer_use: Option<&'a str>,
    pub hobbies: Option<&'a str>,
    pub personality_traits: Option<&'a str>,
    pub confidence_level: Option<&'a str>,
    pub updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn list_guardians(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
) -> Result<Vec<Guardian>, sqlx::Error> {
    sqlx::query_as::<_, Guardian>(&format!(
        "SELECT {GUARDIAN_COLUMNS} FROM guardians WHERE student_id = $1 ORDER BY position"
    ))
    .bind(student_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn delete_guardians(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM guardians WHERE student_id = $1")
        .bind(student_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn create_guardian(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateGuardian<'_>,
) -> Result<Guardian, sqlx::Error> {
    sqlx::query_as::<_, Guardian>(&format!(
        "INSERT INTO guardians (
            id, student_id, position, relationship, last_name, first_name, middle_name,
            birth_date, occupation, contact_number, email, address, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)
         RETURNING {GUARDIAN_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.position)
    .bind(params.relationship)
    .bind(params.last_name)
    .bind(params.first_name)
    .bind(params.middle_name)
    .bind(params.birth_date)
    .bind(params.occupation)
    .bind(params.contact_number)
    .bind(params.email)
    .bind(params.address)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_non_academic(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
) -> Result<Option<StudentNonAcademic>, sqlx::Error> {
    sqlx::query_as::<_, StudentNonAcademic>(&format!(
        "SELECT {NON_ACADEMIC_COLUMNS} FROM student_non_academics WHERE student_id = $1"
    ))
    .bind(student_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn upsert_non_academic(
    executor: impl sqlx::PgExecutor<'_>,
    params: UpsertNonAcademic<'_>,
) -> Result<StudentNonAcademic, sqlx::Error> {
    sqlx::query_as::<_, StudentNonAcademic>(&format!(
        "INSERT INTO student_non_academics (
            student_id, study_hours, study_place, study_with, family_support,
            parent_highest_education, parent_marital_status, house_type, has_quiet_place,
            study_area, transport_mode, travel_time, access_resources, computer_use, hobbies,
            personality_traits, confidence_level, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18)
         ON CONFLICT (student_id) DO UPDATE SET
            study_hours = EXCLUDED.study_hours,
            study_place = EXCLUDED.study_place,
            study_with = EXCLUDED.study_with,
            family_support = EXCLUDED.family_support,
            parent_highest_education = EXCLUDED.parent_highest_education,
            parent_marital_status = EXCLUDED.parent_marital_status,
            house_type = EXCLUDED.house_type,
            has_quiet_place = EXCLUDED.has_quiet_place,
            study_area = EXCLUDED.study_area,
            transport_mode = EXCLUDED.transport_mode,
            travel_time = EXCLUDED.travel_time,
            access_resources = EXCLUDED.access_resources,
            computer_use = EXCLUDED.computer_use,
            hobbies = EXCLUDED.hobbies,
            personality_traits = EXCLUDED.personality_traits,
            confidence_level = EXCLUDED.confidence_level,
            updated_at = EXCLUDED.updated_at
         RETURNING {NON_ACADEMIC_COLUMNS}",
    ))
    .bind(params.student_id)
    .bind(params.study_hours)
    .bind(params.study_place)
    .bind(params.study_with)
    .bind(params.family_support)
    .bind(params.parent_highest_education)
    .bind(params.parent_marital_status)
    .bind(params.house_type)
    .bind(params.has_quiet_place)
    .bind(params.study_area)
    .bind(params.transport_mode)
    .bind(params.travel_time)
    .bind(params.access_resources)
    .bind(params.computer_use)
    .bind(params.hobbies)
    .bind(params.personality_traits)
    .bind(params.confidence_level)
    .bind(params.updated_at)
    .fetch_one(executor)
    .await
}
