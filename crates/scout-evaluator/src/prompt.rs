//! Prompts sent to the scoring model.

use chrono::NaiveDate;
use scout_core::JobListing;
use std::fmt::Write;

const SYSTEM_PROMPT: &str = r#"You are a meticulous job-to-resume fit assessor specialising in software engineering roles.

From the candidate's point of view, rate how worthwhile the job is for them along six dimensions. Every score is an integer from 0 to 5.

1. technology_match: normalise the technologies the job requires and the candidate's skills (lowercase, common synonyms such as golang=go, js=javascript). Map the share of required technologies the candidate has to a base score (>=0.9: 5, >=0.7: 4, >=0.5: 3, >=0.25: 2, >0: 1, 0: 0). Add 1 when the resume shows deep project evidence for the matched technologies, subtract 1 when they only appear in coursework.
2. project_experience_match: count resume projects that cover at least one key responsibility of the job. Weigh them by the candidate's role (owner or lead 2, core contributor 1.5, participant 1) and map the sum (>=6: 5, >=4: 4, >=3: 3, >=1.5: 2, >0: 1, 0: 0).
3. industry_experience_match: years the candidate spent in the same industry niche as the job (>=3 years: 5, 2-3: 4, 1-2: 3, under 1 with hands-on work: 2, coursework only: 1, none: 0).
4. level_match: whether years of experience, past titles and past responsibilities fit the seniority of the role (clear fit 5, years without matching responsibilities 4, close 3, clearly short 1-2, far below 0).
5. growth_potential: signals in the posting of leadership or management opportunities (lead, mentor, build team, own product), combined with the candidate's ability to use them.
6. technical_depth_potential: signals of technical depth in the posting (system design, architecture, scalability, performance, distributed systems, low latency, ML, big data, concurrency, security), combined with the candidate's foundation to benefit from them.

Every reason must cite concrete evidence: keywords or short quotes from the posting and the resume. When key information is missing, still give a best-effort score and write "missing information: ..." in the reason.

Output a single JSON object and nothing else, using exactly these keys:
{
  "technology_match_score": 4,
  "technology_match_reason": "...",
  "project_experience_match_score": 3,
  "project_experience_match_reason": "...",
  "industry_experience_match_score": 5,
  "industry_experience_match_reason": "...",
  "level_match_score": 5,
  "level_match_reason": "...",
  "growth_potential_score": 4,
  "growth_potential_reason": "...",
  "technical_depth_potential_score": 4,
  "technical_depth_potential_reason": "..."
}"#;

/// Rubric and output format.
#[must_use]
pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

/// Reference document and listing to score.
#[must_use]
pub fn user_prompt(reference: &str, listing: &JobListing, today: NaiveDate) -> String {
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "Rate how worthwhile this job is for the candidate, based on their resume."
    );
    let _ = writeln!(prompt, "\nToday's date: {}", today.format("%Y-%m-%d"));
    let _ = writeln!(prompt, "\n<Resume>\n{}\n</Resume>", reference.trim());

    let _ = writeln!(prompt, "\n<Job>");
    let _ = writeln!(prompt, "Company name: {}", listing.company_name);
    let _ = writeln!(prompt, "Company funding stage: {}", listing.company_stage);
    let _ = writeln!(prompt, "Company size: {}", listing.company_scale);
    let _ = writeln!(prompt, "Company industry: {}", listing.company_industry);
    let _ = writeln!(prompt, "Company introduction: {}", listing.company_introduction);
    let _ = writeln!(prompt, "Job title: {}", listing.job_name);
    let _ = writeln!(
        prompt,
        "Job location: {} {} {}",
        listing.city, listing.area_district, listing.business_district
    );
    let _ = writeln!(prompt, "Required experience: {}", listing.experience);
    let _ = writeln!(prompt, "Required degree: {}", listing.degree);
    let _ = writeln!(prompt, "Salary: {}", listing.salary);
    if !listing.skills.is_empty() {
        let _ = writeln!(prompt, "Skills: {}", listing.skills.join(", "));
    }
    let _ = writeln!(prompt, "Job description:\n{}", listing.description.trim());
    let _ = writeln!(prompt, "</Job>");

    prompt
}
