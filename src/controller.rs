use crate::agent::{AgentClient, TurnOutcome};
use crate::config::Config;
use crate::session::{Message, SessionStore};
use anyhow::Result;
use uuid::Uuid;

/// User-visible result of a resolved submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnResult {
    Reply(String),
    Error(String),
}

/// Drives the lifecycle of one submission at a time:
/// idle -> accepted -> pending -> resolved (reply or error) -> idle.
///
/// Blank input is rejected without side effects, and a new submission is
/// refused while one is pending, so the log only ever grows in
/// submission order. Errors replace the pending placeholder as transient
/// state; they are never written into the message log.
pub struct ConversationController {
    store: SessionStore,
    client: AgentClient,
    pending: bool,
    last_error: Option<String>,
}

impl ConversationController {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            store: SessionStore::new(),
            client: AgentClient::new(config)?,
            pending: false,
            last_error: None,
        })
    }

    /// Validate a raw submission. Returns the thread identifier and trimmed
    /// text if the turn was accepted, in which case the user message is
    /// already in the log and the controller is pending until `resolve`.
    ///
    /// Blank or whitespace-only input is a no-op, as is any input while a
    /// prior submission is still pending.
    pub fn accept(&mut self, input: &str) -> Option<(Uuid, String)> {
        if self.pending {
            return None;
        }
        let text = input.trim();
        if text.is_empty() {
            return None;
        }

        self.last_error = None;
        let thread_id = self.store.thread_id();
        self.store.append(Message::user(text));
        self.pending = true;
        Some((thread_id, text.to_string()))
    }

    /// Apply the terminal outcome of the in-flight submission. A reply is
    /// appended as the assistant message; failures become transient error
    /// text and append nothing.
    pub fn resolve(&mut self, outcome: TurnOutcome) -> TurnResult {
        self.pending = false;
        match outcome {
            TurnOutcome::Reply(reply) => {
                self.store.append(Message::assistant(reply.clone()));
                TurnResult::Reply(reply)
            }
            TurnOutcome::Rejected { status, body } => {
                let error = format!("Error {}: {}", status, body);
                self.last_error = Some(error.clone());
                TurnResult::Error(error)
            }
            TurnOutcome::Unreachable(description) => {
                let error = format!("Connection Failed: {}", description);
                self.last_error = Some(error.clone());
                TurnResult::Error(error)
            }
        }
    }

    /// Run one full submission: validate, call the endpoint once, apply the
    /// outcome. Returns `None` when the input was rejected at the gate.
    pub async fn submit(&mut self, input: &str) -> Option<TurnResult> {
        let (thread_id, text) = self.accept(input)?;
        let outcome = self.client.send_turn(thread_id, &text).await;
        Some(self.resolve(outcome))
    }

    /// Endpoint client handle for running the call on a background task.
    pub fn client(&self) -> AgentClient {
        self.client.clone()
    }

    pub fn snapshot(&self) -> &[Message] {
        self.store.snapshot()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Error from the most recent failed submission, cleared when the next
    /// one is accepted.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Start over with a fresh session. Refused while a submission is
    /// pending so the in-flight turn cannot land in the wrong session.
    pub fn reset_session(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.store.reset();
        self.last_error = None;
        true
    }

    pub fn save_transcript(&self, path: &std::path::Path) -> Result<()> {
        self.store.write_transcript(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;

    fn test_config(url: &str) -> Config {
        Config {
            api_url: Some(url.to_string()),
            api_key: Some("test-key".to_string()),
            timeout_secs: 5,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op_and_issues_no_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let mut controller = ConversationController::new(&test_config(&server.url())).unwrap();
        assert_eq!(controller.submit("").await, None);
        assert_eq!(controller.submit("   ").await, None);
        assert!(controller.snapshot().is_empty());
        assert!(controller.last_error().is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn successful_turn_appends_user_then_assistant() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("Sure, what day works?")
            .create_async()
            .await;

        let mut controller = ConversationController::new(&test_config(&server.url())).unwrap();
        let result = controller.submit("Book me an appointment").await;

        assert_eq!(
            result,
            Some(TurnResult::Reply("Sure, what day works?".to_string()))
        );
        let log = controller.snapshot();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].role, Role::User);
        assert_eq!(log[0].content, "Book me an appointment");
        assert_eq!(log[1].role, Role::Assistant);
        assert_eq!(log[1].content, "Sure, what day works?");
        assert!(!controller.is_pending());
    }

    #[tokio::test]
    async fn remote_rejection_surfaces_status_and_body_without_assistant_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .with_body("server error")
            .create_async()
            .await;

        let mut controller = ConversationController::new(&test_config(&server.url())).unwrap();
        let result = controller.submit("hello").await;

        match result {
            Some(TurnResult::Error(error)) => {
                assert!(error.contains("500"));
                assert!(error.contains("server error"));
            }
            other => panic!("expected error result, got {:?}", other),
        }
        let log = controller.snapshot();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].role, Role::User);
        assert_eq!(controller.last_error(), Some("Error 500: server error"));
    }

    #[tokio::test]
    async fn transport_fault_surfaces_connection_failure() {
        let mut controller =
            ConversationController::new(&test_config("http://127.0.0.1:1/")).unwrap();
        let result = controller.submit("hello").await;

        match result {
            Some(TurnResult::Error(error)) => {
                assert!(error.starts_with("Connection Failed:"));
            }
            other => panic!("expected error result, got {:?}", other),
        }
        assert_eq!(controller.snapshot().len(), 1);
        assert!(!controller.is_pending());
    }

    #[tokio::test]
    async fn session_stays_usable_after_a_failure() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("POST", "/")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .with_body("busy")
            .expect(1)
            .create_async()
            .await;

        let mut controller = ConversationController::new(&test_config(&server.url())).unwrap();
        controller.submit("first try").await;
        failing.remove_async().await;

        server
            .mock("POST", "/")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("recovered")
            .create_async()
            .await;

        let result = controller.submit("second try").await;
        assert_eq!(result, Some(TurnResult::Reply("recovered".to_string())));
        assert!(controller.last_error().is_none());

        let log = controller.snapshot();
        let contents: Vec<&str> = log.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first try", "second try", "recovered"]);
    }

    #[test]
    fn overlapping_submissions_are_refused_while_pending() {
        let mut controller =
            ConversationController::new(&test_config("http://127.0.0.1:1/")).unwrap();
        assert!(controller.accept("first").is_some());
        assert!(controller.is_pending());
        assert!(controller.accept("second").is_none());
        assert!(!controller.reset_session());

        controller.resolve(TurnOutcome::Reply("done".to_string()));
        assert!(controller.accept("second").is_some());
    }

    #[test]
    fn replaying_the_same_outcomes_produces_an_identical_log() {
        let script = [
            ("book a slot", TurnOutcome::Reply("which day?".to_string())),
            (
                "tuesday",
                TurnOutcome::Rejected {
                    status: 500,
                    body: "server error".to_string(),
                },
            ),
            ("tuesday please", TurnOutcome::Reply("booked.".to_string())),
        ];

        let run = || {
            let mut controller =
                ConversationController::new(&test_config("http://127.0.0.1:1/")).unwrap();
            for (input, outcome) in &script {
                controller.accept(input).unwrap();
                controller.resolve(outcome.clone());
            }
            controller
                .snapshot()
                .iter()
                .map(|m| (m.role, m.content.clone()))
                .collect::<Vec<_>>()
        };

        let first = run();
        let second = run();
        assert_eq!(first, second);

        let expected = vec![
            (Role::User, "book a slot".to_string()),
            (Role::Assistant, "which day?".to_string()),
            (Role::User, "tuesday".to_string()),
            (Role::User, "tuesday please".to_string()),
            (Role::Assistant, "booked.".to_string()),
        ];
        assert_eq!(first, expected);
    }
}
