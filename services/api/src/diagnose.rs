use crate::infra::{load_rule_snapshot, InMemoryDiagnosisRepository};
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use visa_pathway::config::AppConfig;
use visa_pathway::error::AppError;
use visa_pathway::rules::RuleTableStore;
use visa_pathway::workflows::diagnosis::{
    read_submissions_from_path, DiagnosisResult, DiagnosisService, Pathway, ProfileSubmission,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DiagnoseArgs {
    /// ISO 3166-1 alpha-2 nationality code
    #[arg(long, required_unless_present = "csv")]
    pub(crate) nationality: Option<String>,
    /// Applicant age in years (18-65)
    #[arg(long, required_unless_present = "csv", allow_negative_numbers = true)]
    pub(crate) age: Option<i64>,
    /// HIGH_SCHOOL, BACHELOR, MASTER or DOCTORATE
    #[arg(long, required_unless_present = "csv")]
    pub(crate) education: Option<String>,
    /// Funds available per year in KRW
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub(crate) annual_fund: i64,
    /// PERMANENT_RESIDENCE, CITIZENSHIP, WORK or STUDY
    #[arg(long, required_unless_present = "csv")]
    pub(crate) goal: Option<String>,
    /// SPEED, COST, STABILITY or INCOME
    #[arg(long, required_unless_present = "csv")]
    pub(crate) priority: Option<String>,
    /// Planned start date (YYYY-MM-DD) used to date milestones
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start_date: Option<NaiveDate>,
    /// CSV export of profiles to diagnose in one run
    #[arg(long, conflicts_with_all = ["nationality", "age", "education", "goal", "priority"])]
    pub(crate) csv: Option<PathBuf>,
    /// Load the rule book from this JSON file instead of RULES_PATH
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
    /// Print the full diagnosis as JSON instead of a readable summary
    #[arg(long)]
    pub(crate) json: bool,
}

impl DiagnoseArgs {
    fn submission(&self) -> ProfileSubmission {
        ProfileSubmission {
            nationality: self.nationality.clone().unwrap_or_default(),
            age: self.age.unwrap_or_default(),
            education: self.education.clone().unwrap_or_default(),
            annual_fund: self.annual_fund,
            goal: self.goal.clone().unwrap_or_default(),
            priority: self.priority.clone().unwrap_or_default(),
            start_date: self.start_date,
        }
    }
}

pub(crate) fn run_diagnose(args: DiagnoseArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(rules) = args.rules.clone() {
        config.engine.rules_path = Some(rules);
    }

    let snapshot = load_rule_snapshot(config.engine.rules_path.as_deref())?;
    let service = DiagnosisService::new(
        Arc::new(RuleTableStore::with_snapshot(snapshot)),
        Arc::new(InMemoryDiagnosisRepository::default()),
        config.engine.settings(),
    );

    if let Some(path) = &args.csv {
        let submissions = read_submissions_from_path(path)?;
        println!("Batch diagnosis of {} profiles", submissions.len());
        for (index, submission) in submissions.into_iter().enumerate() {
            let line = match service.submit(submission) {
                Ok(result) => batch_line(index + 1, &result),
                Err(err) => format!("  row {}: failed ({}): {}", index + 1, err.reason_code(), err),
            };
            println!("{}", line);
        }
        return Ok(());
    }

    let result = service.submit(args.submission())?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", render_diagnosis(&result));
    }
    Ok(())
}

fn batch_line(row: usize, result: &DiagnosisResult) -> String {
    let summary = result.summary_view();
    match (summary.top_pathway, summary.top_score, summary.top_feasibility) {
        (Some(pathway), Some(score), Some(label)) => format!(
            "  row {}: {} pathways | best {} (score {}, {})",
            row,
            summary.pathway_count,
            pathway,
            score,
            label.label()
        ),
        _ => format!("  row {}: no admissible pathway", row),
    }
}

pub(crate) fn render_diagnosis(result: &DiagnosisResult) -> String {
    let profile = &result.input_summary;
    let mut lines = vec![
        format!(
            "Diagnosis {} (rules {})",
            result.diagnosis_id, result.rule_table_version
        ),
        format!(
            "Profile: {} | age {} | {:?} | {} KRW/yr | goal {:?} | priority {:?}",
            profile.nationality,
            profile.age,
            profile.education,
            profile.annual_fund,
            profile.goal,
            profile.priority
        ),
    ];

    if result.pathways.is_empty() {
        lines.push("No admissible pathway for this profile.".to_string());
        return lines.join("\n");
    }
    if !result.search.goal_reached {
        lines.push("Goal not reachable within the search depth; showing nearest statuses.".to_string());
    }

    for (rank, pathway) in result.pathways.iter().enumerate() {
        lines.push(String::new());
        render_pathway(&mut lines, rank + 1, pathway);
    }
    lines.join("\n")
}

fn render_pathway(lines: &mut Vec<String>, rank: usize, pathway: &Pathway) {
    lines.push(format!(
        "{}. {} [{} | score {}]",
        rank,
        pathway.chain_label(),
        pathway.feasibility_label.label(),
        pathway.final_score
    ));
    lines.push(format!(
        "   {} months | {} KRW | {:?}",
        pathway.estimated_months,
        pathway.estimated_cost_krw,
        pathway.score_breakdown.characteristic
    ));
    lines.push(format!("   {}", pathway.score_breakdown.formula()));

    for milestone in &pathway.milestones {
        let work = if milestone.can_work_part_time {
            format!(
                "{} h/week, ~{} KRW/month",
                milestone.weekly_hours, milestone.estimated_monthly_income
            )
        } else {
            "no work permitted".to_string()
        };
        let date = milestone
            .projected_date
            .map(|date| format!(" ({date})"))
            .unwrap_or_default();
        lines.push(format!(
            "   - month {}{}: {} {} | {}",
            milestone.month_from_start, date, milestone.visa_status, milestone.visa_name, work
        ));
        if let Some(action) = &milestone.platform_action {
            lines.push(format!("     next: {}", action.label));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visa_pathway::rules::RuleSnapshot;
    use visa_pathway::workflows::diagnosis::{diagnose, normalize_profile, EngineSettings};

    fn args() -> DiagnoseArgs {
        DiagnoseArgs {
            nationality: Some("vn".to_string()),
            age: Some(25),
            education: Some("bachelor".to_string()),
            annual_fund: 30_000_000,
            goal: Some("permanent_residence".to_string()),
            priority: Some("speed".to_string()),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 15),
            ..DiagnoseArgs::default()
        }
    }

    fn result() -> DiagnosisResult {
        let profile = normalize_profile(args().submission()).expect("valid profile");
        let snapshot = RuleSnapshot::standard().expect("standard catalog");
        diagnose(profile, &snapshot, &EngineSettings::default()).expect("diagnosis succeeds")
    }

    #[test]
    fn rendering_lists_formula_and_dated_milestones() {
        let rendered = render_diagnosis(&result());

        assert!(rendered.contains("1. D-10 -> F-2-7 -> F-5 [High | score 89]"));
        assert!(rendered.contains("round(50.0 x 1.20 x 1.10 x 1.20 x 1.00 + 10.0) = 89"));
        assert!(rendered.contains("month 1 (2026-02-15): D-10"));
        assert!(rendered.contains("no work permitted"));
    }

    #[test]
    fn batch_line_summarizes_top_pathway() {
        let line = batch_line(3, &result());
        assert_eq!(
            line,
            "  row 3: 5 pathways | best D-10 -> F-2-7 -> F-5 (score 89, High)"
        );
    }

    #[test]
    fn missing_flags_surface_as_validation_errors() {
        let mut incomplete = args();
        incomplete.goal = None;
        let error = normalize_profile(incomplete.submission()).expect_err("goal missing");
        assert_eq!(error.field, "goal");
    }
}
