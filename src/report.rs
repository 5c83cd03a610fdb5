use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chart;
use crate::session::Tally;
use crate::timer::format_clock;

/// Minimum percentage, inclusive, for a passing grade.
pub const PASS_THRESHOLD: f64 = 50.0;

pub const RESULTS_HEADER: [&str; 6] = [
    "Timestamp",
    "User Name",
    "Score",
    "Percentage",
    "Status",
    "Time Taken",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pass,
    Fail,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pass => f.write_str("Pass"),
            Status::Fail => f.write_str("Fail"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    user_name: String,
    total: usize,
    correct: usize,
    percentage: f64,
    status: Status,
    elapsed_secs: u64,
}

impl ScoreReport {
    pub fn compute(user_name: impl Into<String>, total: usize, correct: usize, elapsed_secs: u64) -> Self {
        let correct = correct.min(total);
        let percentage = if total > 0 {
            100.0 * correct as f64 / total as f64
        } else {
            0.0
        };
        let status = if percentage >= PASS_THRESHOLD {
            Status::Pass
        } else {
            Status::Fail
        };

        Self {
            user_name: user_name.into(),
            total,
            correct,
            percentage,
            status,
            elapsed_secs,
        }
    }

    pub fn from_tally(user_name: impl Into<String>, tally: Tally) -> Self {
        Self::compute(user_name, tally.total, tally.correct, tally.elapsed_secs)
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn correct(&self) -> usize {
        self.correct
    }

    pub fn incorrect(&self) -> usize {
        self.total - self.correct
    }

    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn time_taken(&self) -> String {
        format_clock(self.elapsed_secs)
    }

    pub fn score_label(&self) -> String {
        format!("{}/{}", self.correct, self.total)
    }

    pub fn percentage_label(&self) -> String {
        format!("{:.2}%", self.percentage)
    }

    pub fn to_row(&self, timestamp: DateTime<Local>) -> ResultRow {
        ResultRow {
            timestamp: timestamp.format(TIMESTAMP_FORMAT).to_string(),
            user_name: self.user_name.clone(),
            score: self.score_label(),
            percentage: self.percentage_label(),
            status: self.status.to_string(),
            time_taken: self.time_taken(),
        }
    }

    pub fn persist(&self, log: &ResultsLog) -> Result<(), ReportError> {
        log.append(self, Local::now())
    }

    /// Writes the pie chart for this report into `dir`, replacing any chart
    /// previously saved under the same user name.
    pub fn render_chart(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(dir)?;
        let path = chart_path_for(dir, &self.user_name);
        fs::write(&path, chart::render_pie(self))?;
        log::info!("Chart written to {}", path.display());
        Ok(path)
    }
}

pub fn chart_path_for(dir: &Path, user_name: &str) -> PathBuf {
    dir.join(format!("{}_performance.svg", sanitize_file_stem(user_name)))
}

fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == ' ' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "anonymous".to_string()
    } else {
        stem
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "User Name")]
    pub user_name: String,
    #[serde(rename = "Score")]
    pub score: String,
    #[serde(rename = "Percentage")]
    pub percentage: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Time Taken")]
    pub time_taken: String,
}

/// Append-only CSV log of completed sessions.
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
}

impl ResultsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, report: &ScoreReport, timestamp: DateTime<Local>) -> Result<(), ReportError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if is_new {
            writer.write_record(RESULTS_HEADER)?;
        }
        writer.serialize(report.to_row(timestamp))?;
        writer.flush()?;

        log::info!(
            "Saved result for {} ({}) to {}",
            report.user_name(),
            report.percentage_label(),
            self.path.display()
        );
        Ok(())
    }

    /// Reads back every stored row; a log that does not exist yet is empty.
    pub fn rows(&self) -> Result<Vec<ResultRow>, ReportError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = ReaderBuilder::new().from_path(&self.path)?;
        let rows = reader.deserialize().collect::<Result<Vec<ResultRow>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn percentage_and_status_follow_counts() {
        for total in 1..=12usize {
            for correct in 0..=total {
                let report = ScoreReport::compute("ada", total, correct, 0);
                let expected = 100.0 * correct as f64 / total as f64;
                assert!((report.percentage() - expected).abs() < 1e-9);
                let pass = expected >= 50.0;
                assert_eq!(report.status() == Status::Pass, pass, "{correct}/{total}");
            }
        }
    }

    #[test]
    fn half_marks_pass() {
        let report = ScoreReport::compute("ada", 4, 2, 0);
        assert_eq!(report.percentage_label(), "50.00%");
        assert_eq!(report.status(), Status::Pass);
    }

    #[test]
    fn zero_questions_scores_zero() {
        let report = ScoreReport::compute("ada", 0, 0, 30);
        assert_eq!(report.percentage(), 0.0);
        assert_eq!(report.status(), Status::Fail);
        assert_eq!(report.score_label(), "0/0");
    }

    #[test]
    fn three_of_five_is_a_pass() {
        let tally = Tally {
            total: 5,
            correct: 3,
            elapsed_secs: 599,
        };
        let report = ScoreReport::from_tally("grace", tally);
        assert_eq!(report.percentage_label(), "60.00%");
        assert_eq!(report.status().to_string(), "Pass");
        assert_eq!(report.time_taken(), "09:59");
        assert_eq!(report.incorrect(), 2);
    }

    #[test]
    fn correct_is_clamped_to_total() {
        let report = ScoreReport::compute("ada", 3, 7, 0);
        assert_eq!(report.correct(), 3);
        assert_eq!(report.incorrect(), 0);
    }

    #[test]
    fn row_uses_log_formats() {
        let report = ScoreReport::compute("ada", 3, 1, 600);
        let row = report.to_row(fixed_time());
        assert_eq!(row.timestamp, "2024-03-09 14:05:07");
        assert_eq!(row.score, "1/3");
        assert_eq!(row.percentage, "33.33%");
        assert_eq!(row.status, "Fail");
        assert_eq!(row.time_taken, "10:00");
    }

    #[test]
    fn append_creates_log_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let log = ResultsLog::new(dir.path().join("results").join("quiz_results.csv"));

        log.append(&ScoreReport::compute("ada", 5, 3, 42), fixed_time())
            .unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some("Timestamp,User Name,Score,Percentage,Status,Time Taken")
        );
        assert_eq!(
            lines.next(),
            Some("2024-03-09 14:05:07,ada,3/5,60.00%,Pass,00:42")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn append_grows_log_by_one_row_and_keeps_history() {
        let dir = tempfile::tempdir().unwrap();
        let log = ResultsLog::new(dir.path().join("quiz_results.csv"));

        log.append(&ScoreReport::compute("ada", 5, 3, 42), fixed_time())
            .unwrap();
        let first = log.rows().unwrap();
        assert_eq!(first.len(), 1);

        log.append(&ScoreReport::compute("ada", 5, 1, 90), fixed_time())
            .unwrap();
        let second = log.rows().unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second[0], first[0]);
        assert_eq!(second[1].score, "1/5");
        assert_eq!(second[1].status, "Fail");
    }

    #[test]
    fn missing_log_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = ResultsLog::new(dir.path().join("nothing.csv"));
        assert!(log.rows().unwrap().is_empty());
    }

    #[test]
    fn chart_is_keyed_by_user_name() {
        let dir = tempfile::tempdir().unwrap();
        let first = ScoreReport::compute("ada", 4, 1, 0).render_chart(dir.path()).unwrap();
        let second = ScoreReport::compute("ada", 4, 3, 0).render_chart(dir.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, dir.path().join("ada_performance.svg"));
        let svg = fs::read_to_string(&second).unwrap();
        assert!(svg.contains("3/4"));
    }

    #[test]
    fn chart_names_cannot_escape_the_directory() {
        let dir = Path::new("results");
        assert_eq!(
            chart_path_for(dir, "../etc/passwd"),
            dir.join("___etc_passwd_performance.svg")
        );
        assert_eq!(chart_path_for(dir, "  "), dir.join("anonymous_performance.svg"));
    }
}
