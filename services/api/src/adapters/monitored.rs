//! services/api/src/adapters/monitored.rs
//!
//! A decorator over any `StudyAiService` that routes every call through the
//! shared `CallMonitor`, so the admin dashboard sees each AI call's timing and
//! outcome. Results and errors pass through untouched.

use async_trait::async_trait;
use std::sync::Arc;
use study_assistant_core::{
    domain::{ChatMessage, OperationName, QuizQuestion},
    monitor::CallMonitor,
    ports::{PortResult, StudyAiService},
};

#[derive(Clone)]
pub struct MonitoredStudyService {
    inner: Arc<dyn StudyAiService>,
    monitor: CallMonitor,
}

impl MonitoredStudyService {
    pub fn new(inner: Arc<dyn StudyAiService>, monitor: CallMonitor) -> Self {
        Self { inner, monitor }
    }
}

#[async_trait]
impl StudyAiService for MonitoredStudyService {
    async fn extract_text(&self, file_data: &[u8], mime_type: &str) -> PortResult<String> {
        self.monitor
            .track(
                OperationName::ExtractText,
                self.inner.extract_text(file_data, mime_type),
            )
            .await
    }

    async fn generate_summary(&self, text: &str) -> PortResult<String> {
        self.monitor
            .track(OperationName::Summarize, self.inner.generate_summary(text))
            .await
    }

    async fn generate_quiz(&self, text: &str) -> PortResult<Vec<QuizQuestion>> {
        self.monitor
            .track(OperationName::GenerateQuiz, self.inner.generate_quiz(text))
            .await
    }

    async fn chat(
        &self,
        history: &[ChatMessage],
        new_message: &str,
        context: &str,
    ) -> PortResult<String> {
        self.monitor
            .track(
                OperationName::Chat,
                self.inner.chat(history, new_message, context),
            )
            .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use study_assistant_core::domain::CallStatus;
    use study_assistant_core::ports::PortError;

    /// A canned `StudyAiService` for handler and decorator tests.
    pub(crate) struct FakeStudyAi {
        pub fail: bool,
    }

    #[async_trait]
    impl StudyAiService for FakeStudyAi {
        async fn extract_text(&self, file_data: &[u8], _mime_type: &str) -> PortResult<String> {
            if self.fail {
                return Err(PortError::Unexpected("Failed to process the file.".to_string()));
            }
            Ok(String::from_utf8_lossy(file_data).into_owned())
        }

        async fn generate_summary(&self, text: &str) -> PortResult<String> {
            if self.fail {
                return Err(PortError::Unexpected("Failed to generate summary.".to_string()));
            }
            Ok(format!("Summary of {} chars", text.len()))
        }

        async fn generate_quiz(&self, _text: &str) -> PortResult<Vec<QuizQuestion>> {
            if self.fail {
                return Err(PortError::Unexpected("Failed to generate quiz.".to_string()));
            }
            Ok(vec![QuizQuestion {
                question: "Q?".to_string(),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer: "a".to_string(),
            }])
        }

        async fn chat(
            &self,
            history: &[ChatMessage],
            new_message: &str,
            _context: &str,
        ) -> PortResult<String> {
            if self.fail {
                return Err(PortError::Unexpected("Failed to get a chat response.".to_string()));
            }
            Ok(format!("reply #{} to {}", history.len(), new_message))
        }
    }

    #[tokio::test]
    async fn successful_calls_are_logged_with_their_operation() {
        let monitor = CallMonitor::new();
        let service = MonitoredStudyService::new(Arc::new(FakeStudyAi { fail: false }), monitor.clone());

        assert_eq!(service.generate_summary("abc").await.unwrap(), "Summary of 3 chars");
        assert_eq!(service.generate_quiz("abc").await.unwrap().len(), 1);
        assert_eq!(service.extract_text(b"hi", "text/plain").await.unwrap(), "hi");
        assert_eq!(service.chat(&[], "why?", "ctx").await.unwrap(), "reply #0 to why?");

        let mut operations: Vec<_> = monitor.get_log().iter().map(|e| e.operation).collect();
        operations.sort();
        assert_eq!(operations, OperationName::ALL.to_vec());
        assert!(monitor.get_log().iter().all(|e| e.status == CallStatus::Success));
    }

    #[tokio::test]
    async fn failures_are_logged_and_returned_unchanged() {
        let monitor = CallMonitor::new();
        let service = MonitoredStudyService::new(Arc::new(FakeStudyAi { fail: true }), monitor.clone());

        let err = service.generate_summary("abc").await.unwrap_err();
        assert_eq!(err, PortError::Unexpected("Failed to generate summary.".to_string()));

        let log = monitor.get_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].status, CallStatus::Error);
        assert_eq!(
            log[0].error_message.as_deref(),
            Some("Failed to generate summary.")
        );
    }
}
