//! `scout review`: evaluated listings ranked by total score.

use anyhow::Result;
use clap::Args;
use scout_core::AppConfig;
use scout_db::{evaluations, RankedListing};
use std::fmt::Write;

#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Number of listings to show
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

pub async fn run(config: &AppConfig, args: &ReviewArgs) -> Result<()> {
    let db = super::open_database(config).await?;
    let ranked = {
        let mut conn = db.pool().acquire().await?;
        evaluations::list_ranked(&mut conn, args.limit).await?
    };
    db.close().await;

    if ranked.is_empty() {
        println!("No evaluated listings yet; run `scout evaluate` first");
    } else {
        print!("{}", render(&ranked));
    }
    Ok(())
}

/// One line per listing, followed by its per-dimension scores.
fn render(ranked: &[RankedListing]) -> String {
    let mut out = String::new();
    for (rank, entry) in ranked.iter().enumerate() {
        let listing = &entry.listing;
        let _ = writeln!(
            out,
            "{:>3}. [{:>2}] {} | {} | {} | {} {}",
            rank + 1,
            entry.evaluation.total(),
            listing.job_name,
            listing.company_name,
            listing.salary,
            listing.city,
            listing.area_district
        );
        let scores: Vec<String> = entry
            .evaluation
            .dimensions()
            .iter()
            .map(|(name, dim)| format!("{name}={}", dim.score))
            .collect();
        let _ = writeln!(out, "     {}", scores.join(" "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_core::{DimensionScore, ItemId, JobEvaluation, JobListing};

    fn entry(id: &str, score: u8) -> RankedListing {
        let job_id = ItemId::new(id).expect("valid id");
        let dim = || DimensionScore::new(score, "");
        RankedListing {
            listing: JobListing {
                job_id: job_id.clone(),
                job_name: format!("Rust Engineer {id}"),
                city: "上海".to_string(),
                area_district: "徐汇区".to_string(),
                business_district: String::new(),
                address: String::new(),
                experience: String::new(),
                degree: String::new(),
                salary: "30-50K".to_string(),
                description: String::new(),
                skills: vec![],
                labels: vec![],
                company_id: String::new(),
                company_name: "Acme".to_string(),
                company_stage: String::new(),
                company_scale: String::new(),
                company_industry: String::new(),
                company_introduction: String::new(),
                recruiter_name: String::new(),
                recruiter_title: String::new(),
                recruiter_activity: String::new(),
            },
            evaluation: JobEvaluation {
                job_id,
                technology_match: dim(),
                project_experience_match: dim(),
                industry_experience_match: dim(),
                level_match: dim(),
                growth_potential: dim(),
                technical_depth_potential: dim(),
            },
        }
    }

    #[test]
    fn test_render_ranks_in_given_order() {
        let out = render(&[entry("a", 5), entry("b", 2)]);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "  1. [30] Rust Engineer a | Acme | 30-50K | 上海 徐汇区"
        );
        assert!(lines[1].contains("technology_match=5"));
        assert!(lines[3].contains("technical_depth_potential=2"));
        assert!(lines[2].starts_with("  2. [12]"));
    }
}
