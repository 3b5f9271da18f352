use std::fmt::Write;
use std::path::Path;

use anyhow::Context;
use chrono::Utc;

use crate::evaluator;
use crate::models::{Assessment, Grade};

#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedAssessment {
    pub assessment_name: String,
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
}

pub fn load_assessments(csv_path: &Path) -> anyhow::Result<Vec<Assessment>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        assessment_name: String,
        score: Option<f64>,
        max_score: Option<f64>,
        points_earned: Option<f64>,
        grade_scores: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut assessments = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid assessment row {}", index + 1))?;
        let grades = match row.grade_scores.as_deref() {
            Some(raw) => parse_grade_scores(raw)
                .with_context(|| format!("invalid grade_scores for {}", row.assessment_name))?,
            None => Vec::new(),
        };

        assessments.push(Assessment {
            assessment_name: row.assessment_name,
            score: row.score,
            points_earned: row.points_earned,
            max_score: row.max_score,
            grades,
        });
    }

    Ok(assessments)
}

/// Parses `;`-separated grade scores; blank entries are ungraded.
fn parse_grade_scores(raw: &str) -> anyhow::Result<Vec<Grade>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    raw.split(';')
        .map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return Ok(Grade { score: None });
            }
            let score = entry
                .parse::<f64>()
                .with_context(|| format!("not a number: {entry}"))?;
            Ok(Grade { score: Some(score) })
        })
        .collect()
}

pub fn flag_assessments(assessments: &[Assessment], threshold: f64) -> Vec<FlaggedAssessment> {
    assessments
        .iter()
        .filter_map(|assessment| {
            let score = assessment.score?;
            let max_score = assessment.max_score?;
            if !evaluator::should_trigger_grade_alert_with(score, max_score, threshold) {
                return None;
            }
            Some(FlaggedAssessment {
                assessment_name: assessment.assessment_name.clone(),
                score,
                max_score,
                percentage: evaluator::grade_percentage(score, max_score)?,
            })
        })
        .collect()
}

pub fn build_report(course_name: &str, assessments: &[Assessment], threshold: f64) -> String {
    let flagged = flag_assessments(assessments, threshold);
    let completed = evaluator::is_course_completed(assessments);

    let mut output = String::new();

    let _ = writeln!(output, "# Course Status: {course_name}");
    let _ = writeln!(output, "Generated on {}", Utc::now().date_naive());
    let _ = writeln!(output);

    let graded = assessments
        .iter()
        .filter(|assessment| evaluator::has_recorded_score(assessment))
        .count();
    if completed {
        let _ = writeln!(
            output,
            "Course complete: all {} assessments graded.",
            assessments.len()
        );
    } else {
        let _ = writeln!(
            output,
            "Course in progress: {graded} of {} assessments graded.",
            assessments.len()
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Grade Alerts (below {threshold:.0}%)");

    if flagged.is_empty() {
        let _ = writeln!(output, "No assessments below the alert threshold.");
    } else {
        for item in flagged.iter() {
            let _ = writeln!(
                output,
                "- {}: {} / {} ({:.1}%)",
                item.assessment_name, item.score, item.max_score, item.percentage
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Assessments");

    if assessments.is_empty() {
        let _ = writeln!(output, "No assessments recorded.");
    } else {
        let _ = writeln!(output, "| Assessment | Score | Status |");
        let _ = writeln!(output, "|---|---|---|");
        for assessment in assessments {
            let score = match (assessment.score, assessment.max_score) {
                (Some(score), Some(max_score)) => format!("{score} / {max_score}"),
                (Some(score), None) => score.to_string(),
                (None, _) => match assessment.points_earned {
                    Some(points) => format!("{points} pts"),
                    None => "-".to_string(),
                },
            };
            let status = if evaluator::has_recorded_score(assessment) {
                "graded"
            } else {
                "pending"
            };
            let _ = writeln!(
                output,
                "| {} | {} | {} |",
                assessment.assessment_name, score, status
            );
        }
    }

    output
}
