use std::collections::BTreeMap;

use super::table::RuleBookDocument;
use super::{
    PlatformAction, Prerequisite, Transition, VisaCategory, VisaCode, VisaState, WorkRights,
};
use crate::workflows::diagnosis::domain::{Education, PathwayCharacteristic, Priority};
use crate::workflows::diagnosis::scoring::{
    AgeBand, CharacteristicThresholds, EducationTable, FundStep, FundTable, GoalBase,
    PriorityWeightEntry, ScoringTables,
};

const STANDARD_VERSION: &str = "kr-2025.1";

/// Sending countries covered by Employment Permit System MOUs.
const EPS_COUNTRIES: [&str; 16] = [
    "PH", "MN", "LK", "VN", "TH", "ID", "UZ", "PK", "KH", "CN", "BD", "NP", "MM", "KG", "TL", "LA",
];

impl RuleBookDocument {
    /// Bundled catalog of Korean long-stay statuses used when no rule book path is configured.
    pub fn standard() -> Self {
        Self {
            version: STANDARD_VERSION.to_string(),
            states: standard_states(),
            transitions: standard_transitions(),
            scoring: standard_scoring(),
        }
    }
}

fn action(workflow: &str, label: &str) -> Option<PlatformAction> {
    Some(PlatformAction {
        workflow: workflow.to_string(),
        label: label.to_string(),
    })
}

fn requirements(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn codes(items: &[&str]) -> Vec<VisaCode> {
    items.iter().map(|item| VisaCode::new(*item)).collect()
}

fn standard_states() -> Vec<VisaState> {
    vec![
        VisaState {
            code: VisaCode::new("D-4"),
            name: "General trainee (Korean language)".to_string(),
            category: VisaCategory::LanguageStudy,
            work_rights: WorkRights::PartTime {
                weekly_hours_cap: 20,
            },
            processing_months: 2,
            fee_krw: 60_000,
            entry_point: true,
            prerequisites: vec![Prerequisite::MinAnnualFund { krw: 10_000_000 }],
            requirements: requirements(&[
                "Admission letter from a university language institute",
                "Proof of funds of at least 10,000,000 KRW",
            ]),
            platform_action: action("language_school_search", "Compare Korean language programs"),
        },
        VisaState {
            code: VisaCode::new("D-2"),
            name: "Degree student".to_string(),
            category: VisaCategory::Study,
            work_rights: WorkRights::PartTime {
                weekly_hours_cap: 25,
            },
            processing_months: 2,
            fee_krw: 60_000,
            entry_point: true,
            prerequisites: vec![
                Prerequisite::MinEducation {
                    level: Education::HighSchool,
                },
                Prerequisite::MinAnnualFund { krw: 20_000_000 },
            ],
            requirements: requirements(&[
                "University admission letter",
                "Proof of funds of at least 20,000,000 KRW",
                "Apostilled academic transcripts",
            ]),
            platform_action: action("university_admission", "Start a university application"),
        },
        VisaState {
            code: VisaCode::new("D-10"),
            name: "Job seeker".to_string(),
            category: VisaCategory::JobSeeking,
            work_rights: WorkRights::None,
            processing_months: 1,
            fee_krw: 60_000,
            entry_point: true,
            prerequisites: vec![Prerequisite::AnyOf {
                options: vec![
                    Prerequisite::PriorStatus {
                        any_of: codes(&["D-2"]),
                    },
                    Prerequisite::MinEducation {
                        level: Education::Bachelor,
                    },
                ],
            }],
            requirements: requirements(&["Job-seeking activity plan", "Degree certificate"]),
            platform_action: action("job_matching", "Browse jobs open to D-10 holders"),
        },
        VisaState {
            code: VisaCode::new("E-9"),
            name: "Non-professional employment (EPS)".to_string(),
            category: VisaCategory::Work,
            work_rights: WorkRights::Full,
            processing_months: 6,
            fee_krw: 200_000,
            entry_point: true,
            prerequisites: vec![
                Prerequisite::NationalityIn {
                    codes: EPS_COUNTRIES.iter().map(|code| code.to_string()).collect(),
                },
                Prerequisite::AgeRange { min: 18, max: 39 },
            ],
            requirements: requirements(&[
                "EPS-TOPIK pass",
                "Standard labor contract",
                "Medical examination",
            ]),
            platform_action: action("job_matching", "Browse EPS employer listings"),
        },
        VisaState {
            code: VisaCode::new("E-7"),
            name: "Designated professional activities".to_string(),
            category: VisaCategory::Work,
            work_rights: WorkRights::Full,
            processing_months: 2,
            fee_krw: 130_000,
            entry_point: true,
            prerequisites: vec![Prerequisite::MinEducation {
                level: Education::Bachelor,
            }],
            requirements: requirements(&[
                "Employment contract in a designated professional occupation",
                "Degree certificate",
                "Employer sponsorship documents",
            ]),
            platform_action: action("job_matching", "Browse E-7 eligible job listings"),
        },
        VisaState {
            code: VisaCode::new("E-7-4"),
            name: "Skilled worker (points-based transition)".to_string(),
            category: VisaCategory::Work,
            work_rights: WorkRights::Full,
            processing_months: 3,
            fee_krw: 130_000,
            entry_point: false,
            prerequisites: vec![Prerequisite::PriorStatus {
                any_of: codes(&["E-9"]),
            }],
            requirements: requirements(&[
                "KIIP level 2 or TOPIK level 2",
                "Employer recommendation",
                "Annual income of at least 26,000,000 KRW",
            ]),
            platform_action: None,
        },
        VisaState {
            code: VisaCode::new("D-8"),
            name: "Corporate investor".to_string(),
            category: VisaCategory::Investment,
            work_rights: WorkRights::Full,
            processing_months: 2,
            fee_krw: 130_000,
            entry_point: true,
            prerequisites: vec![Prerequisite::MinAnnualFund { krw: 100_000_000 }],
            requirements: requirements(&[
                "Foreign direct investment of at least 100,000,000 KRW",
                "Business registration certificate",
            ]),
            platform_action: action("business_setup", "Prepare a foreign investment filing"),
        },
        VisaState {
            code: VisaCode::new("F-2-7"),
            name: "Points-based long-term resident".to_string(),
            category: VisaCategory::Residence,
            work_rights: WorkRights::Full,
            processing_months: 2,
            fee_krw: 130_000,
            entry_point: false,
            prerequisites: vec![
                Prerequisite::PriorStatus {
                    any_of: codes(&["E-7", "D-10", "D-8"]),
                },
                Prerequisite::AgeRange { min: 18, max: 50 },
            ],
            requirements: requirements(&[
                "At least 80 points on the F-2-7 points table",
                "Income statement for the past year",
                "KIIP or TOPIK certificate",
            ]),
            platform_action: action("points_calculator", "Check your F-2-7 points"),
        },
        VisaState {
            code: VisaCode::new("F-5"),
            name: "Permanent resident".to_string(),
            category: VisaCategory::PermanentResidence,
            work_rights: WorkRights::Full,
            processing_months: 4,
            fee_krw: 230_000,
            entry_point: false,
            prerequisites: Vec::new(),
            requirements: requirements(&[
                "Qualifying residence period completed",
                "Income above the gross national income per capita",
                "KIIP level 5 completion",
                "Clean criminal record",
            ]),
            platform_action: action("document_checklist", "Prepare the F-5 document checklist"),
        },
        VisaState {
            code: VisaCode::new("KR-NAT"),
            name: "General naturalization".to_string(),
            category: VisaCategory::Citizenship,
            work_rights: WorkRights::Full,
            processing_months: 18,
            fee_krw: 300_000,
            entry_point: false,
            prerequisites: vec![Prerequisite::PriorStatus {
                any_of: codes(&["F-5"]),
            }],
            requirements: requirements(&[
                "Naturalization aptitude test",
                "Interview",
                "Proof of financial self-sufficiency",
            ]),
            platform_action: action(
                "document_checklist",
                "Prepare the naturalization document checklist",
            ),
        },
    ]
}

fn transition(from: &str, to: &str, min_stay_months: u32, cost_krw: u64) -> Transition {
    Transition {
        from: VisaCode::new(from),
        to: VisaCode::new(to),
        min_stay_months,
        cost_krw,
    }
}

fn standard_transitions() -> Vec<Transition> {
    vec![
        transition("D-4", "D-2", 12, 6_000_000),
        transition("D-2", "D-10", 48, 24_000_000),
        transition("D-2", "E-7", 48, 24_000_000),
        transition("D-10", "E-7", 6, 1_000_000),
        transition("D-10", "F-2-7", 6, 500_000),
        transition("E-9", "E-7-4", 48, 500_000),
        transition("E-7", "F-2-7", 12, 500_000),
        transition("E-7", "F-5", 60, 800_000),
        transition("E-7-4", "F-5", 60, 800_000),
        transition("D-8", "F-2-7", 12, 1_000_000),
        transition("D-8", "F-5", 36, 1_000_000),
        transition("F-2-7", "F-5", 36, 800_000),
        transition("F-5", "KR-NAT", 24, 500_000),
    ]
}

fn standard_scoring() -> ScoringTables {
    use PathwayCharacteristic::{Affordable, Balanced, Fast, HighEarning, Stable};
    use Priority::{Cost, Income, Speed, Stability};

    let weights = [
        (Fast, Speed, 10.0),
        (Fast, Cost, 0.0),
        (Fast, Stability, -2.0),
        (Fast, Income, 2.0),
        (Affordable, Speed, 0.0),
        (Affordable, Cost, 10.0),
        (Affordable, Stability, 0.0),
        (Affordable, Income, -2.0),
        (HighEarning, Speed, 0.0),
        (HighEarning, Cost, -3.0),
        (HighEarning, Stability, 2.0),
        (HighEarning, Income, 10.0),
        (Stable, Speed, -3.0),
        (Stable, Cost, 0.0),
        (Stable, Stability, 10.0),
        (Stable, Income, 2.0),
        (Balanced, Speed, 2.0),
        (Balanced, Cost, 2.0),
        (Balanced, Stability, 2.0),
        (Balanced, Income, 2.0),
    ];

    ScoringTables {
        goal_base: GoalBase {
            permanent_residence: 50.0,
            citizenship: 45.0,
            work: 60.0,
            study: 65.0,
        },
        age_bands: vec![
            AgeBand::new(18, 24, 1.0),
            AgeBand::new(25, 35, 1.2),
            AgeBand::new(36, 40, 1.0),
            AgeBand::new(41, 50, 0.8),
            AgeBand::new(51, 65, 0.6),
        ],
        nationality_multipliers: EPS_COUNTRIES
            .iter()
            .map(|code| (code.to_string(), 1.1))
            .collect::<BTreeMap<_, _>>(),
        default_nationality_multiplier: 1.0,
        fund: FundTable {
            reference_krw: 20_000_000,
            steps: vec![
                FundStep::new(0.0, 0.5),
                FundStep::new(0.5, 0.8),
                FundStep::new(1.0, 1.0),
                FundStep::new(1.5, 1.2),
                FundStep::new(2.0, 1.4),
            ],
        },
        education: EducationTable {
            high_school: 0.8,
            bachelor: 1.0,
            master: 1.15,
            doctorate: 1.3,
        },
        wage_reference_krw: EducationTable {
            high_school: 43_600.0,
            bachelor: 52_000.0,
            master: 60_000.0,
            doctorate: 70_000.0,
        },
        characteristics: CharacteristicThresholds {
            fast_months: 60,
            affordable_cost_krw: 3_000_000,
            high_income_monthly_krw: 2_500_000,
        },
        priority_weights: weights
            .into_iter()
            .map(|(characteristic, priority, weight)| PriorityWeightEntry {
                characteristic,
                priority,
                weight,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSnapshot;

    #[test]
    fn standard_catalog_is_valid() {
        let snapshot = RuleSnapshot::standard().expect("standard catalog validates");

        assert_eq!(snapshot.version(), STANDARD_VERSION);
        assert_eq!(snapshot.table().dangling_transitions(), 0);
        assert!(snapshot.table().entry_states().count() >= 5);
    }

    #[test]
    fn every_transition_target_is_defined() {
        let document = RuleBookDocument::standard();
        for transition in &document.transitions {
            assert!(
                document
                    .states
                    .iter()
                    .any(|state| state.code == transition.to),
                "missing target {}",
                transition.to
            );
        }
    }
}
