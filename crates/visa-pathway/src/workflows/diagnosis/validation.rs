use super::domain::{ApplicantProfile, Education, Goal, Priority, ProfileSubmission};
use super::error::ValidationError;
use super::scoring::{MAX_APPLICANT_AGE, MIN_APPLICANT_AGE};

/// Turn a raw submission into a normalized profile, naming the first offending field.
pub fn normalize_profile(submission: ProfileSubmission) -> Result<ApplicantProfile, ValidationError> {
    let nationality = submission.nationality.trim().to_ascii_uppercase();
    if nationality.len() != 2 || !nationality.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return Err(ValidationError::new(
            "nationality",
            format!(
                "expected an ISO 3166-1 alpha-2 code, found '{}'",
                submission.nationality
            ),
        ));
    }

    let age = u8::try_from(submission.age)
        .ok()
        .filter(|age| (MIN_APPLICANT_AGE..=MAX_APPLICANT_AGE).contains(age))
        .ok_or_else(|| {
            ValidationError::new(
                "age",
                format!(
                    "must be between {MIN_APPLICANT_AGE} and {MAX_APPLICANT_AGE}, found {}",
                    submission.age
                ),
            )
        })?;

    let education = Education::parse(&submission.education).ok_or_else(|| {
        ValidationError::new(
            "education",
            format!(
                "expected HIGH_SCHOOL, BACHELOR, MASTER or DOCTORATE, found '{}'",
                submission.education
            ),
        )
    })?;

    let annual_fund = u64::try_from(submission.annual_fund).map_err(|_| {
        ValidationError::new(
            "annual_fund",
            format!("must be zero or positive, found {}", submission.annual_fund),
        )
    })?;

    let goal = Goal::parse(&submission.goal).ok_or_else(|| {
        ValidationError::new(
            "goal",
            format!(
                "expected PERMANENT_RESIDENCE, CITIZENSHIP, WORK or STUDY, found '{}'",
                submission.goal
            ),
        )
    })?;

    let priority = Priority::parse(&submission.priority).ok_or_else(|| {
        ValidationError::new(
            "priority",
            format!(
                "expected SPEED, COST, STABILITY or INCOME, found '{}'",
                submission.priority
            ),
        )
    })?;

    Ok(ApplicantProfile {
        nationality,
        age,
        education,
        annual_fund,
        goal,
        priority,
        start_date: submission.start_date,
    })
}
