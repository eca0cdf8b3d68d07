use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use super::domain::ProfileSubmission;

#[derive(Debug)]
pub enum BatchImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidDate { row: usize, value: String },
}

impl std::fmt::Display for BatchImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchImportError::Io(err) => write!(f, "failed to read profile batch: {}", err),
            BatchImportError::Csv(err) => write!(f, "invalid profile CSV data: {}", err),
            BatchImportError::InvalidDate { row, value } => write!(
                f,
                "row {} has start_date '{}', expected YYYY-MM-DD",
                row, value
            ),
        }
    }
}

impl std::error::Error for BatchImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchImportError::Io(err) => Some(err),
            BatchImportError::Csv(err) => Some(err),
            BatchImportError::InvalidDate { .. } => None,
        }
    }
}

impl From<std::io::Error> for BatchImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for BatchImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    nationality: String,
    age: i64,
    education: String,
    annual_fund: i64,
    goal: String,
    priority: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    start_date: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Parse profile submissions from a CSV export. Field validation happens at submission time.
pub fn read_submissions<R: Read>(reader: R) -> Result<Vec<ProfileSubmission>, BatchImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut submissions = Vec::new();

    for (index, record) in csv_reader.deserialize::<ProfileRow>().enumerate() {
        let row = record?;
        let start_date = match row.start_date {
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                    BatchImportError::InvalidDate {
                        row: index + 1,
                        value: raw.clone(),
                    }
                })?,
            ),
            None => None,
        };

        submissions.push(ProfileSubmission {
            nationality: row.nationality,
            age: row.age,
            education: row.education,
            annual_fund: row.annual_fund,
            goal: row.goal,
            priority: row.priority,
            start_date,
        });
    }

    Ok(submissions)
}

pub fn read_submissions_from_path<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<ProfileSubmission>, BatchImportError> {
    let file = std::fs::File::open(path)?;
    read_submissions(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_with_and_without_start_date() {
        let csv = "nationality,age,education,annual_fund,goal,priority,start_date\n\
                   VN,25,BACHELOR,30000000,PERMANENT_RESIDENCE,SPEED,2026-03-01\n\
                   ph , 31 , HIGH_SCHOOL , 0 , WORK , INCOME ,\n";

        let submissions = read_submissions(csv.as_bytes()).expect("csv parses");

        assert_eq!(submissions.len(), 2);
        assert_eq!(
            submissions[0].start_date,
            NaiveDate::from_ymd_opt(2026, 3, 1)
        );
        assert_eq!(submissions[1].nationality, "ph");
        assert_eq!(submissions[1].age, 31);
        assert!(submissions[1].start_date.is_none());
    }

    #[test]
    fn accepts_files_without_start_date_column() {
        let csv = "nationality,age,education,annual_fund,goal,priority\n\
                   VN,40,MASTER,5000000,CITIZENSHIP,STABILITY\n";

        let submissions = read_submissions(csv.as_bytes()).expect("csv parses");
        assert_eq!(submissions.len(), 1);
        assert!(submissions[0].start_date.is_none());
    }

    #[test]
    fn reports_row_of_malformed_date() {
        let csv = "nationality,age,education,annual_fund,goal,priority,start_date\n\
                   VN,25,BACHELOR,30000000,WORK,SPEED,03/01/2026\n";

        let error = read_submissions(csv.as_bytes()).expect_err("date rejected");
        assert!(matches!(error, BatchImportError::InvalidDate { row: 1, .. }));
    }

    #[test]
    fn non_numeric_age_is_a_csv_error() {
        let csv = "nationality,age,education,annual_fund,goal,priority\n\
                   VN,old,BACHELOR,1,WORK,SPEED\n";

        let error = read_submissions(csv.as_bytes()).expect_err("age rejected");
        assert!(matches!(error, BatchImportError::Csv(_)));
    }
}
