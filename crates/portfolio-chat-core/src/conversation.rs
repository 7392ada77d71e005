//! Conversation state machine
//!
//! `Idle -> Sending -> Idle`. Only one reply can be outstanding; a submit
//! while `Sending` is rejected rather than queued.

use tracing::{debug, warn};

use crate::client::{ChatBackend, FALLBACK_REPLY};
use crate::error::{ChatError, SubmitError};
use crate::state::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Sending,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    log: Vec<Message>,
    phase: Phase,
    revision: u64,
}

impl Conversation {
    /// Start a session whose log holds only the assistant's greeting.
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            log: vec![Message::assistant(greeting)],
            phase: Phase::Idle,
            revision: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.log
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_pending(&self) -> bool {
        self.phase == Phase::Sending
    }

    /// Bumped on every transition. Front ends compare it against the last
    /// value they saw to know when to scroll to the newest entry.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Append the user's message and enter `Sending`.
    ///
    /// Returns the trimmed text to hand to the backend.
    pub fn begin_submit(&mut self, text: &str) -> Result<String, SubmitError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SubmitError::EmptyInput);
        }
        if self.is_pending() {
            debug!("submit ignored, reply still pending");
            return Err(SubmitError::Pending);
        }

        self.log.push(Message::user(text));
        self.transition(Phase::Sending);
        Ok(trimmed.to_string())
    }

    /// Append the backend's answer (or the fallback) and return to `Idle`.
    pub fn resolve(&mut self, outcome: Result<String, ChatError>) {
        if !self.is_pending() {
            warn!("reply arrived with no request pending, dropping it");
            return;
        }

        let text = match outcome {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "chat request failed");
                FALLBACK_REPLY.to_string()
            }
        };
        self.log.push(Message::assistant(text));
        self.transition(Phase::Idle);
    }

    /// Submit and wait for the reply in one step.
    pub async fn submit<B>(&mut self, backend: &B, text: &str) -> Result<(), SubmitError>
    where
        B: ChatBackend + ?Sized,
    {
        let message = self.begin_submit(text)?;
        let outcome = backend.send(&message).await;
        self.resolve(outcome);
        Ok(())
    }

    fn transition(&mut self, phase: Phase) {
        self.phase = phase;
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Sender;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedBackend {
        reply: Option<&'static str>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn replying(reply: &'static str) -> Self {
            Self { reply: Some(reply), seen: Mutex::new(Vec::new()) }
        }

        fn failing() -> Self {
            Self { reply: None, seen: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn send(&self, message: &str) -> Result<String, ChatError> {
            self.seen.lock().unwrap().push(message.to_string());
            match self.reply {
                Some(reply) => Ok(reply.to_string()),
                None => Err(ChatError::MalformedResponse("scripted failure".to_string())),
            }
        }
    }

    #[test]
    fn test_new_is_seeded_with_greeting() {
        let convo = Conversation::new("hello");
        assert_eq!(convo.messages(), &[Message::assistant("hello")]);
        assert_eq!(convo.phase(), Phase::Idle);
        assert_eq!(convo.revision(), 0);
    }

    #[tokio::test]
    async fn test_submit_success_appends_two() {
        let backend = ScriptedBackend::replying("He knows Rust.");
        let mut convo = Conversation::new("hi");

        convo.submit(&backend, "What does he know?").await.unwrap();

        let log = convo.messages();
        assert_eq!(log.len(), 3);
        assert_eq!(log[1], Message::user("What does he know?"));
        assert_eq!(log[2], Message::assistant("He knows Rust."));
        assert_eq!(convo.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_submit_failure_appends_fallback() {
        let backend = ScriptedBackend::failing();
        let mut convo = Conversation::new("hi");

        convo.submit(&backend, "anyone there?").await.unwrap();

        let log = convo.messages();
        assert_eq!(log.len(), 3);
        assert_eq!(log[2].sender(), Sender::Assistant);
        assert_eq!(log[2].text(), FALLBACK_REPLY);
        assert!(!convo.is_pending());
    }

    #[tokio::test]
    async fn test_backend_gets_trimmed_text() {
        let backend = ScriptedBackend::replying("ok");
        let mut convo = Conversation::new("hi");

        convo.submit(&backend, "  projects?  \n").await.unwrap();

        assert_eq!(*backend.seen.lock().unwrap(), vec!["projects?".to_string()]);
        assert_eq!(convo.messages()[1].text(), "  projects?  \n");
    }

    #[tokio::test]
    async fn test_blank_submit_is_noop() {
        let backend = ScriptedBackend::replying("unused");
        let mut convo = Conversation::new("hi");

        for blank in ["", "   ", "\n\t "] {
            assert_eq!(convo.submit(&backend, blank).await, Err(SubmitError::EmptyInput));
        }

        assert_eq!(convo.messages().len(), 1);
        assert_eq!(convo.phase(), Phase::Idle);
        assert_eq!(convo.revision(), 0);
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_submit_while_pending_is_rejected() {
        let mut convo = Conversation::new("hi");
        convo.begin_submit("first").unwrap();
        let revision = convo.revision();

        assert_eq!(convo.begin_submit("second"), Err(SubmitError::Pending));
        assert_eq!(convo.messages().len(), 2);
        assert_eq!(convo.revision(), revision);
        assert!(convo.is_pending());

        convo.resolve(Ok("reply".to_string()));
        assert_eq!(convo.messages().len(), 3);
        assert!(convo.begin_submit("second").is_ok());
    }

    #[test]
    fn test_resolve_without_pending_is_ignored() {
        let mut convo = Conversation::new("hi");
        convo.resolve(Ok("stray".to_string()));
        assert_eq!(convo.messages().len(), 1);
        assert_eq!(convo.revision(), 0);
    }

    #[test]
    fn test_each_transition_bumps_revision() {
        let mut convo = Conversation::new("hi");
        convo.begin_submit("a").unwrap();
        assert_eq!(convo.revision(), 1);
        convo.resolve(Err(ChatError::MalformedResponse("x".to_string())));
        assert_eq!(convo.revision(), 2);
    }
}
