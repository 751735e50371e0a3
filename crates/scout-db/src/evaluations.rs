//! Evaluation storage and backlog selection.

use crate::error::{DatabaseError, Result};
use crate::listings::{listing_from_row, LISTING_COLUMNS};
use scout_core::{DimensionScore, ItemId, JobEvaluation, JobListing, Timestamp};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// A stored listing together with its evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedListing {
    /// The listing
    pub listing: JobListing,
    /// Its evaluation
    pub evaluation: JobEvaluation,
}

/// Insert or replace the evaluation of a listing.
///
/// The listing must already be stored. Writing the same evaluation twice
/// leaves exactly one row.
pub async fn upsert_evaluation(conn: &mut SqliteConnection, evaluation: &JobEvaluation) -> Result<()> {
    let now = Timestamp::now().to_rfc3339();

    sqlx::query(
        r"
        INSERT INTO job_evaluations (
            job_id,
            technology_match_score, technology_match_reason,
            project_experience_match_score, project_experience_match_reason,
            industry_experience_match_score, industry_experience_match_reason,
            level_match_score, level_match_reason,
            growth_potential_score, growth_potential_reason,
            technical_depth_potential_score, technical_depth_potential_reason,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(job_id) DO UPDATE SET
            technology_match_score = excluded.technology_match_score,
            technology_match_reason = excluded.technology_match_reason,
            project_experience_match_score = excluded.project_experience_match_score,
            project_experience_match_reason = excluded.project_experience_match_reason,
            industry_experience_match_score = excluded.industry_experience_match_score,
            industry_experience_match_reason = excluded.industry_experience_match_reason,
            level_match_score = excluded.level_match_score,
            level_match_reason = excluded.level_match_reason,
            growth_potential_score = excluded.growth_potential_score,
            growth_potential_reason = excluded.growth_potential_reason,
            technical_depth_potential_score = excluded.technical_depth_potential_score,
            technical_depth_potential_reason = excluded.technical_depth_potential_reason,
            updated_at = excluded.updated_at
        ",
    )
    .bind(evaluation.job_id.as_str())
    .bind(i64::from(evaluation.technology_match.score))
    .bind(&evaluation.technology_match.reason)
    .bind(i64::from(evaluation.project_experience_match.score))
    .bind(&evaluation.project_experience_match.reason)
    .bind(i64::from(evaluation.industry_experience_match.score))
    .bind(&evaluation.industry_experience_match.reason)
    .bind(i64::from(evaluation.level_match.score))
    .bind(&evaluation.level_match.reason)
    .bind(i64::from(evaluation.growth_potential.score))
    .bind(&evaluation.growth_potential.reason)
    .bind(i64::from(evaluation.technical_depth_potential.score))
    .bind(&evaluation.technical_depth_potential.reason)
    .bind(&now)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    tracing::debug!(
        "Stored evaluation for {} (total {})",
        evaluation.job_id,
        evaluation.total()
    );
    Ok(())
}

/// Fetch the evaluation of a listing, if any.
pub async fn get_evaluation(
    conn: &mut SqliteConnection,
    job_id: &ItemId,
) -> Result<Option<JobEvaluation>> {
    let row = sqlx::query("SELECT * FROM job_evaluations WHERE job_id = ?")
        .bind(job_id.as_str())
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(evaluation_from_row).transpose()
}

/// Select up to `limit` listings that have no evaluation, oldest first.
pub async fn select_unevaluated(conn: &mut SqliteConnection, limit: usize) -> Result<Vec<JobListing>> {
    let sql = format!(
        r"
        SELECT {LISTING_COLUMNS}
        FROM job_listings l
        LEFT JOIN job_evaluations e ON e.job_id = l.job_id
        WHERE e.job_id IS NULL
        ORDER BY l.created_at ASC, l.rowid ASC
        LIMIT ?
        "
    );
    let rows = sqlx::query(&sql)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(listing_from_row).collect()
}

/// List evaluated listings, highest total score first.
pub async fn list_ranked(conn: &mut SqliteConnection, limit: usize) -> Result<Vec<RankedListing>> {
    let sql = format!(
        r"
        SELECT {LISTING_COLUMNS},
            e.technology_match_score, e.technology_match_reason,
            e.project_experience_match_score, e.project_experience_match_reason,
            e.industry_experience_match_score, e.industry_experience_match_reason,
            e.level_match_score, e.level_match_reason,
            e.growth_potential_score, e.growth_potential_reason,
            e.technical_depth_potential_score, e.technical_depth_potential_reason
        FROM job_listings l
        JOIN job_evaluations e ON e.job_id = l.job_id
        ORDER BY (
            e.technology_match_score + e.project_experience_match_score
            + e.industry_experience_match_score + e.level_match_score
            + e.growth_potential_score + e.technical_depth_potential_score
        ) DESC, l.created_at ASC
        LIMIT ?
        "
    );
    let rows = sqlx::query(&sql)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&mut *conn)
        .await?;

    rows.iter()
        .map(|row| -> Result<RankedListing> {
            Ok(RankedListing {
                listing: listing_from_row(row)?,
                evaluation: evaluation_from_row(row)?,
            })
        })
        .collect()
}

fn evaluation_from_row(row: &SqliteRow) -> Result<JobEvaluation> {
    let job_id: String = row.try_get("job_id")?;
    Ok(JobEvaluation {
        job_id: ItemId::new(job_id).map_err(|e| DatabaseError::Decode(e.to_string()))?,
        technology_match: dimension(row, "technology_match")?,
        project_experience_match: dimension(row, "project_experience_match")?,
        industry_experience_match: dimension(row, "industry_experience_match")?,
        level_match: dimension(row, "level_match")?,
        growth_potential: dimension(row, "growth_potential")?,
        technical_depth_potential: dimension(row, "technical_depth_potential")?,
    })
}

fn dimension(row: &SqliteRow, prefix: &str) -> Result<DimensionScore> {
    let score: i64 = row.try_get(format!("{prefix}_score").as_str())?;
    let score = u8::try_from(score)
        .ok()
        .filter(|s| *s <= DimensionScore::MAX)
        .ok_or_else(|| DatabaseError::Decode(format!("{prefix}_score out of range: {score}")))?;
    Ok(DimensionScore {
        score,
        reason: row.try_get(format!("{prefix}_reason").as_str())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::upsert_listing;
    use crate::test_support::{create_test_db, listing};

    fn evaluation(id: &str, score: u8) -> JobEvaluation {
        JobEvaluation {
            job_id: ItemId::new(id).expect("valid item ID"),
            technology_match: DimensionScore::new(score, "Rust and Tokio overlap"),
            project_experience_match: DimensionScore::new(score, "storage work"),
            industry_experience_match: DimensionScore::new(score, "internet"),
            level_match: DimensionScore::new(score, "senior"),
            growth_potential: DimensionScore::new(score, "growing team"),
            technical_depth_potential: DimensionScore::new(score, "deep systems work"),
        }
    }

    #[tokio::test]
    async fn test_upsert_evaluation_is_idempotent() {
        let db = create_test_db().await;
        let mut conn = db.pool().acquire().await.expect("acquire connection");
        upsert_listing(&mut conn, &listing("job-1"))
            .await
            .expect("upsert listing");

        let eval = evaluation("job-1", 4);
        upsert_evaluation(&mut conn, &eval).await.expect("first write");
        upsert_evaluation(&mut conn, &eval).await.expect("second write");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_evaluations")
            .fetch_one(&mut *conn)
            .await
            .expect("count");
        assert_eq!(count, 1);

        let stored = get_evaluation(&mut conn, &eval.job_id)
            .await
            .expect("get evaluation")
            .expect("evaluation exists");
        assert_eq!(stored, eval);
    }

    #[tokio::test]
    async fn test_evaluation_requires_listing() {
        let db = create_test_db().await;
        let mut conn = db.pool().acquire().await.expect("acquire connection");
        let result = upsert_evaluation(&mut conn, &evaluation("orphan", 3)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_select_unevaluated_oldest_first() {
        let db = create_test_db().await;
        let mut conn = db.pool().acquire().await.expect("acquire connection");

        for id in ["t1", "t2", "t3"] {
            upsert_listing(&mut conn, &listing(id))
                .await
                .expect("upsert listing");
        }
        upsert_evaluation(&mut conn, &evaluation("t2", 3))
            .await
            .expect("evaluate t2");

        let pending = select_unevaluated(&mut conn, 10).await.expect("select");
        let ids: Vec<&str> = pending.iter().map(|l| l.job_id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t3"]);

        let limited = select_unevaluated(&mut conn, 1).await.expect("select");
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].job_id.as_str(), "t1");
    }

    #[tokio::test]
    async fn test_rediscovered_listing_keeps_backlog_position() {
        let db = create_test_db().await;
        let mut conn = db.pool().acquire().await.expect("acquire connection");

        upsert_listing(&mut conn, &listing("old")).await.expect("old");
        upsert_listing(&mut conn, &listing("new")).await.expect("new");
        upsert_listing(&mut conn, &listing("old")).await.expect("old again");

        let pending = select_unevaluated(&mut conn, 10).await.expect("select");
        assert_eq!(pending[0].job_id.as_str(), "old");
    }

    #[tokio::test]
    async fn test_list_ranked_orders_by_total() {
        let db = create_test_db().await;
        let mut conn = db.pool().acquire().await.expect("acquire connection");

        for (id, score) in [("low", 1), ("high", 5), ("mid", 3)] {
            upsert_listing(&mut conn, &listing(id)).await.expect("listing");
            upsert_evaluation(&mut conn, &evaluation(id, score))
                .await
                .expect("evaluation");
        }
        upsert_listing(&mut conn, &listing("unscored"))
            .await
            .expect("listing");

        let ranked = list_ranked(&mut conn, 10).await.expect("ranked");
        let ids: Vec<&str> = ranked.iter().map(|r| r.listing.job_id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid", "low"]);
        assert_eq!(ranked[0].evaluation.total(), 30);
    }
}
