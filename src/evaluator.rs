use crate::models::{Assessment, GoalType};

/// Percentage below which a recorded score raises a grade alert.
pub const GRADE_ALERT_THRESHOLD: f64 = 70.0;

pub fn grade_percentage(score: f64, max_score: f64) -> Option<f64> {
    let percentage = (score / max_score) * 100.0;
    percentage.is_finite().then_some(percentage)
}

pub fn should_trigger_grade_alert(score: f64, max_score: f64) -> bool {
    should_trigger_grade_alert_with(score, max_score, GRADE_ALERT_THRESHOLD)
}

/// Returns false when the percentage cannot be computed (zero or
/// non-finite max score), so bad input never raises an alert.
pub fn should_trigger_grade_alert_with(score: f64, max_score: f64, threshold: f64) -> bool {
    match grade_percentage(score, max_score) {
        Some(percentage) => percentage < threshold,
        None => {
            tracing::warn!(score, max_score, "cannot compute grade percentage, no alert raised");
            false
        }
    }
}

/// Compares `actual >= target` after reading the leading number of each
/// value, so `"85%"` counts as 85.
///
/// Values without a leading number never count as achieved. `goal_type` does not change
/// the comparison for any kind today.
pub fn is_goal_achieved(actual: &str, target: &str, goal_type: &GoalType) -> bool {
    let (Some(actual), Some(target)) = (parse_goal_value(actual), parse_goal_value(target)) else {
        tracing::debug!(actual, target, %goal_type, "goal values are not numeric");
        return false;
    };

    match goal_type {
        GoalType::CourseGrade
        | GoalType::Gpa
        | GoalType::CumulativeGpa
        | GoalType::SemesterGpa
        | GoalType::Attendance
        | GoalType::Other(_) => actual >= target,
    }
}

/// Reads the longest leading decimal literal, ignoring whatever follows.
/// Only the spelled-out `Infinity` is accepted as infinite.
fn parse_goal_value(value: &str) -> Option<f64> {
    let value = value.trim_start();
    let bytes = value.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    if value[end..].starts_with("Infinity") {
        return value[..end + "Infinity".len()].replace("Infinity", "inf").parse().ok();
    }

    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let integer_digits = digits_from(end);
    end += integer_digits;
    let mut fraction_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction_digits = digits_from(end + 1);
        if integer_digits > 0 || fraction_digits > 0 {
            end += 1 + fraction_digits;
        }
    }
    if integer_digits == 0 && fraction_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent_end = end + 1;
        if matches!(bytes.get(exponent_end), Some(b'+' | b'-')) {
            exponent_end += 1;
        }
        let exponent_digits = digits_from(exponent_end);
        if exponent_digits > 0 {
            end = exponent_end + exponent_digits;
        }
    }

    value[..end].parse().ok()
}

pub fn is_course_completed(assessments: &[Assessment]) -> bool {
    assessments.iter().all(has_recorded_score)
}

pub fn has_recorded_score(assessment: &Assessment) -> bool {
    let positive = |value: Option<f64>| value.is_some_and(|v| v > 0.0);

    positive(assessment.score)
        || positive(assessment.points_earned)
        || assessment.grades.iter().any(|grade| positive(grade.score))
}
