use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeAlertRequest {
    pub user_email: String,
    pub course_name: String,
    pub assessment_name: String,
    pub score: f64,
    pub max_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseCompletionRequest {
    pub user_email: String,
    pub course_name: String,
    pub final_grade: String,
    pub semester: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRequest {
    pub user_email: String,
    pub reminder_title: String,
    pub reminder_message: String,
    pub reminder_type: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grade {
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assessment {
    pub assessment_name: String,
    pub score: Option<f64>,
    pub points_earned: Option<f64>,
    pub max_score: Option<f64>,
    pub grades: Vec<Grade>,
}

/// Kind of target a goal tracks.
///
/// Every kind is currently compared the same way ("higher is better"); the
/// enum exists so kind-specific comparisons have somewhere to live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalType {
    CourseGrade,
    Gpa,
    CumulativeGpa,
    SemesterGpa,
    Attendance,
    Other(String),
}

impl FromStr for GoalType {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let goal_type = match value.trim().to_ascii_uppercase().as_str() {
            "COURSE_GRADE" => GoalType::CourseGrade,
            "GPA" => GoalType::Gpa,
            // the backend spells it with a double M
            "CUMMULATIVE_GPA" | "CUMULATIVE_GPA" => GoalType::CumulativeGpa,
            "SEMESTER_GPA" => GoalType::SemesterGpa,
            "ATTENDANCE" => GoalType::Attendance,
            _ => GoalType::Other(value.trim().to_string()),
        };
        Ok(goal_type)
    }
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalType::CourseGrade => f.write_str("COURSE_GRADE"),
            GoalType::Gpa => f.write_str("GPA"),
            GoalType::CumulativeGpa => f.write_str("CUMMULATIVE_GPA"),
            GoalType::SemesterGpa => f.write_str("SEMESTER_GPA"),
            GoalType::Attendance => f.write_str("ATTENDANCE"),
            GoalType::Other(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Push was disabled and the gateway declined to initialize for the user.
    InitializationDeclined,
}

/// What happened on the push channel after email delivery succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Delivered,
    Failed(String),
    Skipped(SkipReason),
    /// The event type has no push channel.
    NotApplicable,
}

impl fmt::Display for PushOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushOutcome::Delivered => f.write_str("delivered"),
            PushOutcome::Failed(reason) => write!(f, "failed ({reason})"),
            PushOutcome::Skipped(SkipReason::InitializationDeclined) => {
                f.write_str("skipped (push not available for user)")
            }
            PushOutcome::NotApplicable => f.write_str("not applicable"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub dispatch_id: Uuid,
    /// Body returned by the email endpoint.
    pub response: serde_json::Value,
    pub push: PushOutcome,
}
