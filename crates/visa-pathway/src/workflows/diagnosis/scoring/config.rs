use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::factors::FUND_MULTIPLIER_FLOOR;
use super::super::domain::{Education, Goal, PathwayCharacteristic, Priority};

pub(crate) const MIN_APPLICANT_AGE: u8 = 18;
pub(crate) const MAX_APPLICANT_AGE: u8 = 65;

/// Scoring tables as supplied by domain experts alongside the rule book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringTables {
    pub goal_base: GoalBase,
    pub age_bands: Vec<AgeBand>,
    #[serde(default)]
    pub nationality_multipliers: BTreeMap<String, f64>,
    pub default_nationality_multiplier: f64,
    pub fund: FundTable,
    pub education: EducationTable,
    /// Monthly KRW earned per weekly hour worked, by education tier.
    pub wage_reference_krw: EducationTable,
    pub characteristics: CharacteristicThresholds,
    pub priority_weights: Vec<PriorityWeightEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalBase {
    pub permanent_residence: f64,
    pub citizenship: f64,
    pub work: f64,
    pub study: f64,
}

impl GoalBase {
    pub fn for_goal(&self, goal: Goal) -> f64 {
        match goal {
            Goal::PermanentResidence => self.permanent_residence,
            Goal::Citizenship => self.citizenship,
            Goal::Work => self.work,
            Goal::Study => self.study,
        }
    }
}

/// Inclusive age range sharing one multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeBand {
    pub min: u8,
    pub max: u8,
    pub multiplier: f64,
}

impl AgeBand {
    pub fn new(min: u8, max: u8, multiplier: f64) -> Self {
        Self {
            min,
            max,
            multiplier,
        }
    }

    fn contains(&self, age: u8) -> bool {
        (self.min..=self.max).contains(&age)
    }
}

/// Step function over the ratio of available funds to the pathway's required funds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundTable {
    /// Required funds assumed for chains whose statuses declare no minimum.
    pub reference_krw: u64,
    pub steps: Vec<FundStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundStep {
    pub min_ratio: f64,
    pub multiplier: f64,
}

impl FundStep {
    pub fn new(min_ratio: f64, multiplier: f64) -> Self {
        Self {
            min_ratio,
            multiplier,
        }
    }
}

/// One value per education level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EducationTable {
    pub high_school: f64,
    pub bachelor: f64,
    pub master: f64,
    pub doctorate: f64,
}

impl EducationTable {
    pub fn for_level(&self, level: Education) -> f64 {
        match level {
            Education::HighSchool => self.high_school,
            Education::Bachelor => self.bachelor,
            Education::Master => self.master,
            Education::Doctorate => self.doctorate,
        }
    }

    fn values(&self) -> [f64; 4] {
        [self.high_school, self.bachelor, self.master, self.doctorate]
    }
}

/// Cut-offs used to classify the dominant characteristic of a pathway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacteristicThresholds {
    pub fast_months: u32,
    pub affordable_cost_krw: u64,
    pub high_income_monthly_krw: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityWeightEntry {
    pub characteristic: PathwayCharacteristic,
    pub priority: Priority,
    pub weight: f64,
}

/// Validation failures for scoring tables.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringTableError {
    #[error("{table} contains a multiplier that is not strictly positive and finite")]
    NonPositiveMultiplier { table: &'static str },
    #[error("goal base constants must be strictly positive and finite")]
    InvalidGoalBase,
    #[error("no age band covers age {0}")]
    AgeNotCovered(u8),
    #[error("age {0} is covered by more than one band")]
    AgeOverlap(u8),
    #[error("fund steps must start at ratio 0 and strictly increase")]
    FundSteps,
    #[error("fund step at ratio 0 must use the floor multiplier {floor}")]
    FundFloor { floor: f64 },
    #[error("fund reference amount must be positive")]
    FundReference,
    #[error("wage reference must be non-negative and finite")]
    WageReference,
    #[error("priority weight missing for {characteristic:?} x {priority:?}")]
    MissingPriorityWeight {
        characteristic: PathwayCharacteristic,
        priority: Priority,
    },
    #[error("priority weight declared twice for {characteristic:?} x {priority:?}")]
    DuplicatePriorityWeight {
        characteristic: PathwayCharacteristic,
        priority: Priority,
    },
    #[error("priority weight for {characteristic:?} x {priority:?} is not finite")]
    NonFiniteWeight {
        characteristic: PathwayCharacteristic,
        priority: Priority,
    },
}

/// Dense characteristic x priority lookup, complete by construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityWeightTable {
    weights: [[f64; 4]; 5],
}

impl PriorityWeightTable {
    pub fn try_from_entries(entries: &[PriorityWeightEntry]) -> Result<Self, ScoringTableError> {
        let mut cells: [[Option<f64>; 4]; 5] = [[None; 4]; 5];
        for entry in entries {
            let PriorityWeightEntry {
                characteristic,
                priority,
                weight,
            } = *entry;
            if !weight.is_finite() {
                return Err(ScoringTableError::NonFiniteWeight {
                    characteristic,
                    priority,
                });
            }
            let cell = &mut cells[characteristic.index()][priority.index()];
            if cell.is_some() {
                return Err(ScoringTableError::DuplicatePriorityWeight {
                    characteristic,
                    priority,
                });
            }
            *cell = Some(weight);
        }

        let mut weights = [[0.0; 4]; 5];
        for characteristic in PathwayCharacteristic::ALL {
            for priority in Priority::ALL {
                weights[characteristic.index()][priority.index()] = cells[characteristic.index()]
                    [priority.index()]
                .ok_or(ScoringTableError::MissingPriorityWeight {
                    characteristic,
                    priority,
                })?;
            }
        }

        Ok(Self { weights })
    }

    pub fn weight(&self, characteristic: PathwayCharacteristic, priority: Priority) -> f64 {
        self.weights[characteristic.index()][priority.index()]
    }
}

/// Validated scoring tables ready for lookups.
#[derive(Debug, Clone)]
pub struct ScoringModel {
    tables: ScoringTables,
    priority_weights: PriorityWeightTable,
}

impl ScoringModel {
    pub fn try_from_tables(tables: ScoringTables) -> Result<Self, ScoringTableError> {
        let base = &tables.goal_base;
        if ![base.permanent_residence, base.citizenship, base.work, base.study]
            .iter()
            .all(|value| is_positive(*value))
        {
            return Err(ScoringTableError::InvalidGoalBase);
        }

        validate_age_bands(&tables.age_bands)?;

        if !tables
            .nationality_multipliers
            .values()
            .chain(std::iter::once(&tables.default_nationality_multiplier))
            .all(|value| is_positive(*value))
        {
            return Err(ScoringTableError::NonPositiveMultiplier {
                table: "nationality_multipliers",
            });
        }

        validate_fund_table(&tables.fund)?;

        if !tables.education.values().iter().all(|value| is_positive(*value)) {
            return Err(ScoringTableError::NonPositiveMultiplier { table: "education" });
        }
        if !tables
            .wage_reference_krw
            .values()
            .iter()
            .all(|value| value.is_finite() && *value >= 0.0)
        {
            return Err(ScoringTableError::WageReference);
        }

        let priority_weights = PriorityWeightTable::try_from_entries(&tables.priority_weights)?;

        Ok(Self {
            tables,
            priority_weights,
        })
    }

    pub fn tables(&self) -> &ScoringTables {
        &self.tables
    }

    pub fn priority_weights(&self) -> &PriorityWeightTable {
        &self.priority_weights
    }

    pub(crate) fn age_multiplier_for(&self, age: u8) -> Option<f64> {
        self.tables
            .age_bands
            .iter()
            .find(|band| band.contains(age))
            .map(|band| band.multiplier)
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn validate_age_bands(bands: &[AgeBand]) -> Result<(), ScoringTableError> {
    if !bands.iter().all(|band| is_positive(band.multiplier)) {
        return Err(ScoringTableError::NonPositiveMultiplier { table: "age_bands" });
    }

    for age in MIN_APPLICANT_AGE..=MAX_APPLICANT_AGE {
        match bands.iter().filter(|band| band.contains(age)).count() {
            0 => return Err(ScoringTableError::AgeNotCovered(age)),
            1 => {}
            _ => return Err(ScoringTableError::AgeOverlap(age)),
        }
    }

    Ok(())
}

fn validate_fund_table(fund: &FundTable) -> Result<(), ScoringTableError> {
    if fund.reference_krw == 0 {
        return Err(ScoringTableError::FundReference);
    }
    if !fund.steps.iter().all(|step| is_positive(step.multiplier)) {
        return Err(ScoringTableError::NonPositiveMultiplier { table: "fund" });
    }

    let starts_at_zero = fund
        .steps
        .first()
        .map(|step| step.min_ratio == 0.0)
        .unwrap_or(false);
    let ascending = fund
        .steps
        .windows(2)
        .all(|pair| pair[0].min_ratio < pair[1].min_ratio);
    if !starts_at_zero || !ascending {
        return Err(ScoringTableError::FundSteps);
    }
    if fund.steps[0].multiplier != FUND_MULTIPLIER_FLOOR {
        return Err(ScoringTableError::FundFloor {
            floor: FUND_MULTIPLIER_FLOOR,
        });
    }

    Ok(())
}
