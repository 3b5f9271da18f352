//! Grade alert, goal and course completion checks for GradeGoal, plus
//! delivery of the resulting notifications over email and push.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod evaluator;
pub mod models;
pub mod push;
pub mod report;
pub mod transport;
