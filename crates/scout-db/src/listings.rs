//! Normalized listing storage.

use crate::error::{DatabaseError, Result};
use scout_core::{ItemId, JobListing, Timestamp};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// Columns selected when reading listings, shared with the evaluation queries.
pub(crate) const LISTING_COLUMNS: &str = "
    l.job_id, l.job_name, l.city, l.area_district, l.business_district, l.address,
    l.experience, l.degree, l.salary, l.description, l.skills, l.labels,
    l.company_id, l.company_name, l.company_stage, l.company_scale,
    l.company_industry, l.company_introduction,
    l.recruiter_name, l.recruiter_title, l.recruiter_activity";

/// Insert a listing, or update every field of an existing one.
///
/// `created_at` is set on first insert and preserved afterwards, so a listing
/// rediscovered later keeps its place in the evaluation backlog.
pub async fn upsert_listing(conn: &mut SqliteConnection, listing: &JobListing) -> Result<()> {
    let now = Timestamp::now().to_rfc3339();
    let skills = encode_list(&listing.skills)?;
    let labels = encode_list(&listing.labels)?;

    sqlx::query(
        r"
        INSERT INTO job_listings (
            job_id, job_name, city, area_district, business_district, address,
            experience, degree, salary, description, skills, labels,
            company_id, company_name, company_stage, company_scale,
            company_industry, company_introduction,
            recruiter_name, recruiter_title, recruiter_activity,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(job_id) DO UPDATE SET
            job_name = excluded.job_name,
            city = excluded.city,
            area_district = excluded.area_district,
            business_district = excluded.business_district,
            address = excluded.address,
            experience = excluded.experience,
            degree = excluded.degree,
            salary = excluded.salary,
            description = excluded.description,
            skills = excluded.skills,
            labels = excluded.labels,
            company_id = excluded.company_id,
            company_name = excluded.company_name,
            company_stage = excluded.company_stage,
            company_scale = excluded.company_scale,
            company_industry = excluded.company_industry,
            company_introduction = excluded.company_introduction,
            recruiter_name = excluded.recruiter_name,
            recruiter_title = excluded.recruiter_title,
            recruiter_activity = excluded.recruiter_activity,
            updated_at = excluded.updated_at
        ",
    )
    .bind(listing.job_id.as_str())
    .bind(&listing.job_name)
    .bind(&listing.city)
    .bind(&listing.area_district)
    .bind(&listing.business_district)
    .bind(&listing.address)
    .bind(&listing.experience)
    .bind(&listing.degree)
    .bind(&listing.salary)
    .bind(&listing.description)
    .bind(skills)
    .bind(labels)
    .bind(&listing.company_id)
    .bind(&listing.company_name)
    .bind(&listing.company_stage)
    .bind(&listing.company_scale)
    .bind(&listing.company_industry)
    .bind(&listing.company_introduction)
    .bind(&listing.recruiter_name)
    .bind(&listing.recruiter_title)
    .bind(&listing.recruiter_activity)
    .bind(&now)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    tracing::debug!("Upserted listing {}", listing.job_id);
    Ok(())
}

/// Fetch a listing by id.
pub async fn get_listing(conn: &mut SqliteConnection, job_id: &ItemId) -> Result<Option<JobListing>> {
    let sql = format!("SELECT {LISTING_COLUMNS} FROM job_listings l WHERE l.job_id = ?");
    let row = sqlx::query(&sql)
        .bind(job_id.as_str())
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(listing_from_row).transpose()
}

/// Count stored listings.
pub async fn count_listings(conn: &mut SqliteConnection) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM job_listings")
        .fetch_one(&mut *conn)
        .await?)
}

pub(crate) fn listing_from_row(row: &SqliteRow) -> Result<JobListing> {
    let job_id: String = row.try_get("job_id")?;
    Ok(JobListing {
        job_id: ItemId::new(job_id).map_err(|e| DatabaseError::Decode(e.to_string()))?,
        job_name: row.try_get("job_name")?,
        city: row.try_get("city")?,
        area_district: row.try_get("area_district")?,
        business_district: row.try_get("business_district")?,
        address: row.try_get("address")?,
        experience: row.try_get("experience")?,
        degree: row.try_get("degree")?,
        salary: row.try_get("salary")?,
        description: row.try_get("description")?,
        skills: decode_list(&row.try_get::<String, _>("skills")?)?,
        labels: decode_list(&row.try_get::<String, _>("labels")?)?,
        company_id: row.try_get("company_id")?,
        company_name: row.try_get("company_name")?,
        company_stage: row.try_get("company_stage")?,
        company_scale: row.try_get("company_scale")?,
        company_industry: row.try_get("company_industry")?,
        company_introduction: row.try_get("company_introduction")?,
        recruiter_name: row.try_get("recruiter_name")?,
        recruiter_title: row.try_get("recruiter_title")?,
        recruiter_activity: row.try_get("recruiter_activity")?,
    })
}

fn encode_list(values: &[String]) -> Result<String> {
    serde_json::to_string(values).map_err(|e| DatabaseError::SerializationError(e.to_string()))
}

fn decode_list(raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| DatabaseError::Decode(format!("invalid list column: {e}")))
}
