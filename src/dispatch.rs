use std::sync::Arc;

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::NotifierConfig;
use crate::error::NotificationError;
use crate::models::{
    CourseCompletionRequest, DispatchOutcome, GradeAlertRequest, PushOutcome, ReminderRequest,
    SkipReason,
};
use crate::push::PushGateway;
use crate::transport::{endpoint_url, HttpTransport};

const GRADE_ALERT: &str = "grade-alert";
const COURSE_COMPLETION: &str = "course-completion";
const CUSTOM_REMINDER: &str = "custom-reminder";

/// Sends notifications by email and, for alert-style events, by push.
///
/// Email is authoritative: its failure fails the call and push is never
/// attempted. Push is best-effort and only reported through [`PushOutcome`].
#[derive(Clone)]
pub struct NotificationDispatcher {
    transport: HttpTransport,
    api_base: String,
    push_api_base: String,
    push: Arc<dyn PushGateway>,
}

impl NotificationDispatcher {
    pub fn new(config: &NotifierConfig, transport: HttpTransport, push: Arc<dyn PushGateway>) -> Self {
        Self {
            transport,
            api_base: config.api_base.clone(),
            push_api_base: config.push_api_base.clone(),
            push,
        }
    }

    pub async fn send_grade_alert(
        &self,
        user_email: &str,
        course_name: &str,
        assessment_name: &str,
        score: f64,
        max_score: f64,
    ) -> Result<DispatchOutcome, NotificationError> {
        let request = GradeAlertRequest {
            user_email: user_email.to_string(),
            course_name: course_name.to_string(),
            assessment_name: assessment_name.to_string(),
            score,
            max_score,
        };
        self.send_with_push(GRADE_ALERT, user_email, &request).await
    }

    pub async fn send_course_completion(
        &self,
        user_email: &str,
        course_name: &str,
        final_grade: &str,
        semester: &str,
    ) -> Result<DispatchOutcome, NotificationError> {
        let request = CourseCompletionRequest {
            user_email: user_email.to_string(),
            course_name: course_name.to_string(),
            final_grade: final_grade.to_string(),
            semester: semester.to_string(),
        };
        self.send_with_push(COURSE_COMPLETION, user_email, &request).await
    }

    pub async fn send_custom_reminder(
        &self,
        user_email: &str,
        reminder_title: &str,
        reminder_message: &str,
        reminder_type: &str,
    ) -> Result<DispatchOutcome, NotificationError> {
        let request = ReminderRequest {
            user_email: user_email.to_string(),
            reminder_title: reminder_title.to_string(),
            reminder_message: reminder_message.to_string(),
            reminder_type: reminder_type.to_string(),
        };

        let dispatch_id = Uuid::new_v4();
        let span = tracing::info_span!("dispatch", %dispatch_id, endpoint = CUSTOM_REMINDER);

        async {
            let response = self.send_email(CUSTOM_REMINDER, &request).await?;
            tracing::info!("reminder sent");
            Ok::<_, NotificationError>(DispatchOutcome {
                dispatch_id,
                response,
                push: PushOutcome::NotApplicable,
            })
        }
        .instrument(span)
        .await
    }

    async fn send_with_push<B>(
        &self,
        endpoint: &'static str,
        user_email: &str,
        request: &B,
    ) -> Result<DispatchOutcome, NotificationError>
    where
        B: Serialize + Sync,
    {
        let dispatch_id = Uuid::new_v4();
        let span = tracing::info_span!("dispatch", %dispatch_id, endpoint);

        async {
            let response = self.send_email(endpoint, request).await?;
            let push = self.send_push(endpoint, user_email, request).await;
            tracing::info!(%push, "notification sent");

            Ok::<_, NotificationError>(DispatchOutcome {
                dispatch_id,
                response,
                push,
            })
        }
        .instrument(span)
        .await
    }

    async fn send_email<B>(
        &self,
        endpoint: &'static str,
        request: &B,
    ) -> Result<serde_json::Value, NotificationError>
    where
        B: Serialize + Sync,
    {
        let url = endpoint_url(&self.api_base, endpoint);
        self.transport
            .post_json(&url, request)
            .await
            .map_err(|source| {
                tracing::error!(error = %source, "email notification failed");
                NotificationError::Delivery { endpoint, source }
            })
    }

    async fn send_push<B>(&self, endpoint: &'static str, user_email: &str, request: &B) -> PushOutcome
    where
        B: Serialize + Sync,
    {
        if !self.push.is_enabled() && !self.push.initialize(user_email).await {
            return PushOutcome::Skipped(SkipReason::InitializationDeclined);
        }

        let url = endpoint_url(&self.push_api_base, endpoint);
        match self.transport.post_json(&url, request).await {
            Ok(_) => PushOutcome::Delivered,
            Err(err) => {
                tracing::warn!(error = %err, "push notification failed");
                PushOutcome::Failed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use mockito::{Matcher, Mock, Server, ServerGuard};
    use serde_json::json;

    use super::*;
    use crate::error::TransportError;

    struct FakePush {
        enabled: bool,
        initialize_result: bool,
        initialize_calls: AtomicUsize,
    }

    impl FakePush {
        fn new(enabled: bool, initialize_result: bool) -> Arc<Self> {
            Arc::new(Self {
                enabled,
                initialize_result,
                initialize_calls: AtomicUsize::new(0),
            })
        }

        fn initialize_calls(&self) -> usize {
            self.initialize_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PushGateway for FakePush {
        fn is_enabled(&self) -> bool {
            self.enabled
        }

        async fn initialize(&self, _user_email: &str) -> bool {
            self.initialize_calls.fetch_add(1, Ordering::SeqCst);
            self.initialize_result
        }
    }

    fn dispatcher(server: &ServerGuard, push: Arc<FakePush>) -> NotificationDispatcher {
        let config = NotifierConfig {
            api_base: format!("{}/api/notifications", server.url()),
            push_api_base: format!("{}/api/push-notifications", server.url()),
            ..NotifierConfig::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        NotificationDispatcher::new(&config, transport, push)
    }

    async fn mock_post(
        server: &mut ServerGuard,
        path: &str,
        status: usize,
        body: &str,
        hits: usize,
    ) -> Mock {
        server
            .mock("POST", path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn email_failure_aborts_before_push() {
        let mut server = Server::new_async().await;
        let email = mock_post(&mut server, "/api/notifications/grade-alert", 500, "{}", 1).await;
        let push_send = mock_post(&mut server, "/api/push-notifications/grade-alert", 200, "{}", 0).await;
        let push = FakePush::new(false, true);

        let err = dispatcher(&server, push.clone())
            .send_grade_alert("avery@example.com", "Calculus I", "Midterm", 55.0, 100.0)
            .await
            .unwrap_err();

        let NotificationError::Delivery { endpoint, source } = err;
        assert_eq!(endpoint, "grade-alert");
        assert!(matches!(source, TransportError::Status { .. }));
        assert_eq!(push.initialize_calls(), 0);
        email.assert_async().await;
        push_send.assert_async().await;
    }

    #[tokio::test]
    async fn grade_alert_posts_to_both_channels_when_push_enabled() {
        let mut server = Server::new_async().await;
        let expected_body = json!({
            "userEmail": "avery@example.com",
            "courseName": "Calculus I",
            "assessmentName": "Midterm",
            "score": 55.0,
            "maxScore": 100.0
        });
        let email = server
            .mock("POST", "/api/notifications/grade-alert")
            .match_body(Matcher::Json(expected_body.clone()))
            .with_status(200)
            .with_body(r#"{"success":true,"message":"Grade alert sent"}"#)
            .expect(1)
            .create_async()
            .await;
        let push_send = server
            .mock("POST", "/api/push-notifications/grade-alert")
            .match_body(Matcher::Json(expected_body))
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;
        let push = FakePush::new(true, false);

        let outcome = dispatcher(&server, push.clone())
            .send_grade_alert("avery@example.com", "Calculus I", "Midterm", 55.0, 100.0)
            .await
            .unwrap();

        assert_eq!(outcome.response, json!({"success": true, "message": "Grade alert sent"}));
        assert_eq!(outcome.push, PushOutcome::Delivered);
        assert_eq!(push.initialize_calls(), 0);
        email.assert_async().await;
        push_send.assert_async().await;
    }

    #[tokio::test]
    async fn disabled_push_initializes_then_sends_once() {
        let mut server = Server::new_async().await;
        let _email = mock_post(&mut server, "/api/notifications/grade-alert", 200, "{}", 1).await;
        let push_send = mock_post(&mut server, "/api/push-notifications/grade-alert", 200, "{}", 1).await;
        let push = FakePush::new(false, true);

        let outcome = dispatcher(&server, push.clone())
            .send_grade_alert("avery@example.com", "Calculus I", "Quiz 2", 6.0, 10.0)
            .await
            .unwrap();

        assert_eq!(outcome.push, PushOutcome::Delivered);
        assert_eq!(push.initialize_calls(), 1);
        push_send.assert_async().await;
    }

    #[tokio::test]
    async fn declined_initialization_skips_push_send() {
        let mut server = Server::new_async().await;
        let _email = mock_post(&mut server, "/api/notifications/grade-alert", 200, "{}", 1).await;
        let push_send = mock_post(&mut server, "/api/push-notifications/grade-alert", 200, "{}", 0).await;
        let push = FakePush::new(false, false);

        let outcome = dispatcher(&server, push.clone())
            .send_grade_alert("avery@example.com", "Calculus I", "Quiz 2", 6.0, 10.0)
            .await
            .unwrap();

        assert_eq!(outcome.push, PushOutcome::Skipped(SkipReason::InitializationDeclined));
        assert_eq!(push.initialize_calls(), 1);
        push_send.assert_async().await;
    }

    #[tokio::test]
    async fn push_failure_still_returns_email_response() {
        let mut server = Server::new_async().await;
        let _email = mock_post(
            &mut server,
            "/api/notifications/grade-alert",
            200,
            r#"{"success":true}"#,
            1,
        )
        .await;
        let push_send = mock_post(&mut server, "/api/push-notifications/grade-alert", 502, "{}", 1).await;
        let push = FakePush::new(true, false);

        let outcome = dispatcher(&server, push)
            .send_grade_alert("avery@example.com", "Calculus I", "Midterm", 55.0, 100.0)
            .await
            .unwrap();

        assert_eq!(outcome.response, json!({"success": true}));
        assert!(matches!(outcome.push, PushOutcome::Failed(_)));
        push_send.assert_async().await;
    }

    #[tokio::test]
    async fn push_failure_after_initialize_is_swallowed() {
        let mut server = Server::new_async().await;
        let _email = mock_post(&mut server, "/api/notifications/course-completion", 200, "{}", 1).await;
        let push_send =
            mock_post(&mut server, "/api/push-notifications/course-completion", 500, "{}", 1).await;
        let push = FakePush::new(false, true);

        let outcome = dispatcher(&server, push.clone())
            .send_course_completion("avery@example.com", "Calculus I", "A-", "Fall 2026")
            .await
            .unwrap();

        assert!(matches!(outcome.push, PushOutcome::Failed(_)));
        assert_eq!(push.initialize_calls(), 1);
        push_send.assert_async().await;
    }

    #[tokio::test]
    async fn course_completion_sends_camel_case_body() {
        let mut server = Server::new_async().await;
        let email = server
            .mock("POST", "/api/notifications/course-completion")
            .match_body(Matcher::Json(json!({
                "userEmail": "kiara@example.com",
                "courseName": "Organic Chemistry",
                "finalGrade": "B+",
                "semester": "Spring 2026"
            })))
            .with_status(200)
            .with_body(r#"{"success":true}"#)
            .expect(1)
            .create_async()
            .await;
        let _push_send =
            mock_post(&mut server, "/api/push-notifications/course-completion", 200, "{}", 1).await;

        let outcome = dispatcher(&server, FakePush::new(true, false))
            .send_course_completion("kiara@example.com", "Organic Chemistry", "B+", "Spring 2026")
            .await
            .unwrap();

        assert_eq!(outcome.push, PushOutcome::Delivered);
        email.assert_async().await;
    }

    #[tokio::test]
    async fn reminder_has_no_push_channel() {
        let mut server = Server::new_async().await;
        let email = server
            .mock("POST", "/api/notifications/custom-reminder")
            .match_body(Matcher::Json(json!({
                "userEmail": "jules@example.com",
                "reminderTitle": "Study session",
                "reminderMessage": "Review chapter 4 before Friday",
                "reminderType": "STUDY"
            })))
            .with_status(200)
            .with_body(r#"{"success":true}"#)
            .expect(1)
            .create_async()
            .await;
        let push_any = server
            .mock("POST", Matcher::Regex("^/api/push-notifications/.*".to_string()))
            .expect(0)
            .create_async()
            .await;
        let push = FakePush::new(false, true);

        let outcome = dispatcher(&server, push.clone())
            .send_custom_reminder(
                "jules@example.com",
                "Study session",
                "Review chapter 4 before Friday",
                "STUDY",
            )
            .await
            .unwrap();

        assert_eq!(outcome.push, PushOutcome::NotApplicable);
        assert_eq!(push.initialize_calls(), 0);
        email.assert_async().await;
        push_any.assert_async().await;
    }

    #[tokio::test]
    async fn reminder_failure_is_a_delivery_error() {
        let mut server = Server::new_async().await;
        let _email = mock_post(&mut server, "/api/notifications/custom-reminder", 400, "{}", 1).await;

        let err = dispatcher(&server, FakePush::new(true, true))
            .send_custom_reminder("jules@example.com", "Title", "Message", "GENERAL")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            NotificationError::Delivery {
                endpoint: "custom-reminder",
                ..
            }
        ));
    }
}
