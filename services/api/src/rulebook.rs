use clap::Args;
use std::path::PathBuf;
use visa_pathway::error::AppError;
use visa_pathway::rules::{RuleBookDocument, RuleSnapshot};

#[derive(Args, Debug)]
pub(crate) struct RulesCheckArgs {
    /// Rule book JSON file to validate
    #[arg(long)]
    pub(crate) path: PathBuf,
}

pub(crate) fn run_rules_export() -> Result<(), AppError> {
    println!(
        "{}",
        serde_json::to_string_pretty(&RuleBookDocument::standard())?
    );
    Ok(())
}

pub(crate) fn run_rules_check(args: RulesCheckArgs) -> Result<(), AppError> {
    let snapshot = RuleSnapshot::from_document(RuleBookDocument::from_path(&args.path)?)?;
    println!("{}", summarize(&snapshot));
    Ok(())
}

fn summarize(snapshot: &RuleSnapshot) -> String {
    let table = snapshot.table();
    let mut summary = format!(
        "Rule book {} is valid: {} visa states ({} entry points), {} transitions",
        snapshot.version(),
        table.state_count(),
        table.entry_states().count(),
        table.transition_count()
    );
    if table.dangling_transitions() > 0 {
        summary.push_str(&format!(
            "\n  warning: {} transitions reference unknown visa codes and will be skipped",
            table.dangling_transitions()
        ));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use visa_pathway::rules::{Transition, VisaCode};

    #[test]
    fn summary_counts_standard_catalog() {
        let snapshot = RuleSnapshot::standard().expect("standard catalog");
        let summary = summarize(&snapshot);
        assert!(summary.starts_with("Rule book kr-2025.1 is valid: 10 visa states"));
        assert!(!summary.contains("warning"));
    }

    #[test]
    fn summary_warns_about_dangling_transitions() {
        let mut document = RuleBookDocument::standard();
        document.transitions.push(Transition {
            from: VisaCode::new("F-5"),
            to: VisaCode::new("F-6"),
            min_stay_months: 12,
            cost_krw: 0,
        });
        let snapshot = RuleSnapshot::from_document(document).expect("loads");

        assert!(summarize(&snapshot).contains("warning: 1 transitions"));
    }
}
