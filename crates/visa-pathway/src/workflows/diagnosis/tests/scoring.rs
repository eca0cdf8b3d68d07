use super::common::{profile, snapshot, standard_chain};
use crate::rules::RuleBookDocument;
use crate::workflows::diagnosis::domain::{
    ApplicantProfile, Education, Goal, PathwayCharacteristic, Priority,
};
use crate::workflows::diagnosis::milestones::{expand, ExpandedCandidate};
use crate::workflows::diagnosis::scoring::{
    score_pathway, AgeBand, FundStep, ScoringModel, ScoringTableError, FUND_MULTIPLIER_FLOOR,
};

fn expanded(applicant: &ApplicantProfile, codes: &[&str]) -> ExpandedCandidate {
    let chain = standard_chain(applicant, codes);
    expand(chain, applicant, snapshot().scoring()).expect("chain expands")
}

#[test]
fn scenario_profile_scores_fast_chain() {
    let applicant = profile();
    let candidate = expanded(&applicant, &["E-7", "F-2-7", "F-5"]);

    let breakdown =
        score_pathway(&candidate, &applicant, snapshot().scoring()).expect("factors valid");

    assert_eq!(breakdown.base, 50.0);
    assert_eq!(breakdown.age_multiplier, 1.2);
    assert_eq!(breakdown.nationality_multiplier, 1.1);
    assert_eq!(breakdown.fund_multiplier, 1.2);
    assert_eq!(breakdown.education_multiplier, 1.0);
    assert_eq!(breakdown.characteristic, PathwayCharacteristic::Fast);
    assert_eq!(breakdown.priority_weight, 10.0);
    assert_eq!(breakdown.final_score(), 89);
}

#[test]
fn final_score_recomputes_from_breakdown() {
    let applicant = profile();
    let candidate = expanded(&applicant, &["D-2", "D-10", "F-2-7", "F-5"]);

    let breakdown =
        score_pathway(&candidate, &applicant, snapshot().scoring()).expect("factors valid");

    let manual = breakdown.base
        * breakdown.age_multiplier
        * breakdown.nationality_multiplier
        * breakdown.fund_multiplier
        * breakdown.education_multiplier
        + breakdown.priority_weight;
    assert_eq!(breakdown.final_score(), manual.round() as i64);
}

#[test]
fn empty_funds_hit_the_multiplier_floor() {
    let mut applicant = profile();
    applicant.annual_fund = 0;
    let candidate = expanded(&applicant, &["D-10", "F-2-7", "F-5"]);

    let breakdown =
        score_pathway(&candidate, &applicant, snapshot().scoring()).expect("factors valid");

    assert_eq!(breakdown.fund_multiplier, FUND_MULTIPLIER_FLOOR);
    assert!(breakdown.final_score() < 89);
}

#[test]
fn fund_ratio_uses_strictest_status_minimum() {
    let mut applicant = profile();
    applicant.annual_fund = 20_000_000;
    let candidate = expanded(&applicant, &["D-2", "E-7", "F-5"]);

    let breakdown =
        score_pathway(&candidate, &applicant, snapshot().scoring()).expect("factors valid");

    assert_eq!(breakdown.fund_multiplier, 1.0);
}

#[test]
fn unlisted_nationality_uses_default_multiplier() {
    let mut applicant = profile();
    applicant.nationality = "FR".to_string();
    let candidate = expanded(&applicant, &["E-7", "F-5"]);

    let breakdown =
        score_pathway(&candidate, &applicant, snapshot().scoring()).expect("factors valid");

    assert_eq!(breakdown.nationality_multiplier, 1.0);
}

#[test]
fn age_band_boundaries_switch_multipliers() {
    let snapshot = snapshot();
    let model = snapshot.scoring();

    assert_eq!(model.age_multiplier_for(18), Some(1.0));
    assert_eq!(model.age_multiplier_for(24), Some(1.0));
    assert_eq!(model.age_multiplier_for(25), Some(1.2));
    assert_eq!(model.age_multiplier_for(65), Some(0.6));
    assert_eq!(model.age_multiplier_for(66), None);
}

#[test]
fn priority_changes_the_additive_weight() {
    let mut applicant = profile();
    let candidate = expanded(&applicant, &["E-7", "F-2-7", "F-5"]);
    let speed = score_pathway(&candidate, &applicant, snapshot().scoring()).expect("valid");

    applicant.priority = Priority::Cost;
    let cost = score_pathway(&candidate, &applicant, snapshot().scoring()).expect("valid");

    assert_eq!(cost.characteristic, speed.characteristic);
    assert_eq!(cost.priority_weight, 0.0);
    assert_eq!(speed.final_score() - cost.final_score(), 10);
}

#[test]
fn characteristics_follow_threshold_order() {
    let snapshot = snapshot();
    let applicant = profile();
    let classify = |applicant: &ApplicantProfile, codes: &[&str]| {
        score_pathway(&expanded(applicant, codes), applicant, snapshot.scoring())
            .expect("valid")
            .characteristic
    };

    assert_eq!(
        classify(&applicant, &["D-10", "F-2-7", "F-5"]),
        PathwayCharacteristic::Fast
    );
    assert_eq!(
        classify(&applicant, &["E-9", "E-7-4", "F-5"]),
        PathwayCharacteristic::Affordable
    );
    assert_eq!(
        classify(&applicant, &["D-2", "D-10", "F-2-7", "F-5"]),
        PathwayCharacteristic::Stable
    );

    let mut doctor = applicant.clone();
    doctor.education = Education::Doctorate;
    assert_eq!(
        classify(&doctor, &["D-2", "E-7", "F-5"]),
        PathwayCharacteristic::HighEarning
    );

    let mut worker = applicant;
    worker.goal = Goal::Work;
    assert_eq!(
        classify(&worker, &["D-4", "D-2", "E-7"]),
        PathwayCharacteristic::Balanced
    );
}

#[test]
fn missing_priority_weight_is_rejected() {
    let mut tables = RuleBookDocument::standard().scoring;
    tables.priority_weights.retain(|entry| {
        !(entry.characteristic == PathwayCharacteristic::Balanced
            && entry.priority == Priority::Income)
    });

    let error = ScoringModel::try_from_tables(tables).expect_err("incomplete table");
    assert_eq!(
        error,
        ScoringTableError::MissingPriorityWeight {
            characteristic: PathwayCharacteristic::Balanced,
            priority: Priority::Income,
        }
    );
}

#[test]
fn duplicate_priority_weight_is_rejected() {
    let mut tables = RuleBookDocument::standard().scoring;
    let first = tables.priority_weights[0];
    tables.priority_weights.push(first);

    let error = ScoringModel::try_from_tables(tables).expect_err("duplicate entry");
    assert!(matches!(
        error,
        ScoringTableError::DuplicatePriorityWeight { .. }
    ));
}

#[test]
fn age_bands_must_cover_every_accepted_age_once() {
    let mut gap = RuleBookDocument::standard().scoring;
    gap.age_bands.retain(|band| band.min != 36);
    assert_eq!(
        ScoringModel::try_from_tables(gap).expect_err("gap"),
        ScoringTableError::AgeNotCovered(36)
    );

    let mut overlap = RuleBookDocument::standard().scoring;
    overlap.age_bands.push(AgeBand::new(30, 37, 1.1));
    assert_eq!(
        ScoringModel::try_from_tables(overlap).expect_err("overlap"),
        ScoringTableError::AgeOverlap(30)
    );
}

#[test]
fn multipliers_must_be_positive() {
    let mut education = RuleBookDocument::standard().scoring;
    education.education.master = 0.0;
    assert_eq!(
        ScoringModel::try_from_tables(education).expect_err("zero multiplier"),
        ScoringTableError::NonPositiveMultiplier { table: "education" }
    );

    let mut fund = RuleBookDocument::standard().scoring;
    fund.fund.steps[0] = FundStep::new(0.2, 0.5);
    assert_eq!(
        ScoringModel::try_from_tables(fund).expect_err("steps skip zero"),
        ScoringTableError::FundSteps
    );
}

#[test]
fn fund_table_must_start_at_the_floor() {
    let mut fund = RuleBookDocument::standard().scoring;
    fund.fund.steps[0] = FundStep::new(0.0, 0.8);

    assert_eq!(
        ScoringModel::try_from_tables(fund).expect_err("lenient zero step"),
        ScoringTableError::FundFloor {
            floor: FUND_MULTIPLIER_FLOOR
        }
    );
}
