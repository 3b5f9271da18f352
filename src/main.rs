use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gradegoal_notify::config::NotifierConfig;
use gradegoal_notify::dispatch::NotificationDispatcher;
use gradegoal_notify::models::{DispatchOutcome, GoalType};
use gradegoal_notify::push::ConfiguredPushGateway;
use gradegoal_notify::transport::HttpTransport;
use gradegoal_notify::{evaluator, report};

#[derive(Parser)]
#[command(name = "gradegoal-notify")]
#[command(about = "Grade alerts, goal checks and course notifications for GradeGoal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a grade alert by email and push
    GradeAlert {
        #[arg(long)]
        email: String,
        #[arg(long)]
        course: String,
        #[arg(long)]
        assessment: String,
        #[arg(long)]
        score: f64,
        #[arg(long)]
        max_score: f64,
    },
    /// Send a course completion notice by email and push
    CourseCompletion {
        #[arg(long)]
        email: String,
        #[arg(long)]
        course: String,
        #[arg(long)]
        final_grade: String,
        #[arg(long)]
        semester: String,
    },
    /// Send a custom reminder by email
    Reminder {
        #[arg(long)]
        email: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        message: String,
        #[arg(long, default_value = "GENERAL")]
        reminder_type: String,
    },
    /// Check whether a score would raise a grade alert
    CheckAlert {
        #[arg(long)]
        score: f64,
        #[arg(long)]
        max_score: f64,
    },
    /// Check whether a goal value has been reached
    CheckGoal {
        #[arg(long)]
        actual: String,
        #[arg(long)]
        target: String,
        #[arg(long, default_value = "GPA")]
        goal_type: String,
    },
    /// Summarize a course from an assessments CSV, optionally notifying
    Status {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        course: String,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        notify: bool,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        semester: Option<String>,
        #[arg(long)]
        final_grade: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = NotifierConfig::from_env().context("invalid GradeGoal configuration")?;

    match cli.command {
        Commands::GradeAlert {
            email,
            course,
            assessment,
            score,
            max_score,
        } => {
            anyhow::ensure!(max_score > 0.0, "--max-score must be greater than zero");
            let outcome = build_dispatcher(&config)?
                .send_grade_alert(&email, &course, &assessment, score, max_score)
                .await?;
            print_outcome("Grade alert", &outcome);
        }
        Commands::CourseCompletion {
            email,
            course,
            final_grade,
            semester,
        } => {
            let outcome = build_dispatcher(&config)?
                .send_course_completion(&email, &course, &final_grade, &semester)
                .await?;
            print_outcome("Course completion", &outcome);
        }
        Commands::Reminder {
            email,
            title,
            message,
            reminder_type,
        } => {
            let outcome = build_dispatcher(&config)?
                .send_custom_reminder(&email, &title, &message, &reminder_type)
                .await?;
            print_outcome("Reminder", &outcome);
        }
        Commands::CheckAlert { score, max_score } => {
            let alert =
                evaluator::should_trigger_grade_alert_with(score, max_score, config.alert_threshold);
            match evaluator::grade_percentage(score, max_score) {
                Some(percentage) => println!(
                    "{score} / {max_score} = {percentage:.1}%: {}",
                    if alert { "alert" } else { "no alert" }
                ),
                None => println!("{score} / {max_score} has no defined percentage: no alert"),
            }
        }
        Commands::CheckGoal {
            actual,
            target,
            goal_type,
        } => {
            let goal_type: GoalType = goal_type.parse()?;
            let achieved = evaluator::is_goal_achieved(&actual, &target, &goal_type);
            println!(
                "{goal_type} goal {target}: {}",
                if achieved { "achieved" } else { "not achieved" }
            );
        }
        Commands::Status {
            csv,
            course,
            out,
            notify,
            email,
            semester,
            final_grade,
        } => {
            let recipient = if notify {
                Some(notify_recipient(email, semester, final_grade)?)
            } else {
                None
            };

            let assessments = report::load_assessments(&csv)?;
            let markdown = report::build_report(&course, &assessments, config.alert_threshold);

            match &out {
                Some(path) => {
                    std::fs::write(path, &markdown)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Report written to {}.", path.display());
                }
                None => print!("{markdown}"),
            }

            if let Some(recipient) = recipient {
                let dispatcher = build_dispatcher(&config)?;

                for item in report::flag_assessments(&assessments, config.alert_threshold) {
                    let outcome = dispatcher
                        .send_grade_alert(
                            &recipient.email,
                            &course,
                            &item.assessment_name,
                            item.score,
                            item.max_score,
                        )
                        .await?;
                    print_outcome(&format!("Grade alert for {}", item.assessment_name), &outcome);
                }

                if !assessments.is_empty() && evaluator::is_course_completed(&assessments) {
                    let outcome = dispatcher
                        .send_course_completion(
                            &recipient.email,
                            &course,
                            &recipient.final_grade,
                            &recipient.semester,
                        )
                        .await?;
                    print_outcome("Course completion", &outcome);
                }
            }
        }
    }

    Ok(())
}

#[derive(Debug, PartialEq)]
struct NotifyRecipient {
    email: String,
    semester: String,
    final_grade: String,
}

/// Every field of a course completion notice must be given up front, so a
/// completed course never posts blank `finalGrade`/`semester` values.
fn notify_recipient(
    email: Option<String>,
    semester: Option<String>,
    final_grade: Option<String>,
) -> anyhow::Result<NotifyRecipient> {
    let required = |value: Option<String>, flag: &str| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .with_context(|| format!("{flag} is required with --notify"))
    };

    Ok(NotifyRecipient {
        email: required(email, "--email")?,
        semester: required(semester, "--semester")?,
        final_grade: required(final_grade, "--final-grade")?,
    })
}

fn build_dispatcher(config: &NotifierConfig) -> anyhow::Result<NotificationDispatcher> {
    let transport = HttpTransport::new(config).context("failed to build HTTP client")?;
    let push = Arc::new(ConfiguredPushGateway::from_config(config));
    Ok(NotificationDispatcher::new(config, transport, push))
}

fn print_outcome(label: &str, outcome: &DispatchOutcome) {
    println!("{label} sent (dispatch {}), push {}.", outcome.dispatch_id, outcome.push);
    if !outcome.response.is_null() {
        println!("Backend response: {}", outcome.response);
    }
}
