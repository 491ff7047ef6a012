// ABOUTME: Core event routing - decides new-session vs resume-session and persists continuity
// ABOUTME: PromptRunner is the seam between routing logic and the claude CLI subprocess

use anyhow::Result;
use async_trait::async_trait;

use crate::claude::{self, ClaudeResult};
use crate::config::ClaudeConfig;
use crate::store::{ModelAlias, ModelStore, SessionStore};

/// Normalized inbound chat event
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub text: String,
    pub channel: String,
    /// Message id; becomes the thread key for a new top-level message
    pub ts: String,
    /// Set when the message is a reply inside an existing thread
    pub thread_ts: Option<String>,
}

/// Reply to deliver, threaded under `thread_ts`
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub thread_ts: String,
}

/// Runs one prompt against the conversational backend
#[async_trait]
pub trait PromptRunner: Send + Sync {
    async fn run(
        &self,
        prompt: &str,
        session_id: Option<&str>,
        model: Option<ModelAlias>,
    ) -> ClaudeResult;
}

/// PromptRunner backed by the claude CLI subprocess
pub struct CliRunner {
    config: ClaudeConfig,
}

impl CliRunner {
    pub fn new(config: ClaudeConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PromptRunner for CliRunner {
    async fn run(
        &self,
        prompt: &str,
        session_id: Option<&str>,
        model: Option<ModelAlias>,
    ) -> ClaudeResult {
        claude::invoke(&self.config, prompt, session_id, model, self.config.timeout()).await
    }
}

/// Route one inbound event through the runner and the stores.
///
/// A new top-level message starts a fresh session keyed by the event's own
/// ts; a thread reply resumes the stored session for its thread_ts. Events
/// with empty text, or replies in threads this process never started, are
/// dropped (returns None). Error results are relayed like any other reply.
pub async fn route_event(
    event: &InboundEvent,
    sessions: &SessionStore,
    models: &ModelStore,
    runner: &dyn PromptRunner,
) -> Result<Option<Reply>> {
    let text = event.text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let model = models.get(&event.channel);

    let (thread_key, session_id) = match &event.thread_ts {
        Some(thread_ts) => match sessions.get(thread_ts) {
            Some(session_id) => (thread_ts.clone(), Some(session_id)),
            None => {
                // Reply in a thread we never started - not ours to answer
                tracing::debug!(thread_ts = %thread_ts, "No session for thread, ignoring reply");
                return Ok(None);
            }
        },
        None => (event.ts.clone(), None),
    };

    let result = runner.run(text, session_id.as_deref(), model).await;

    if let Some(new_session_id) = &result.session_id {
        sessions.set(&thread_key, new_session_id)?;
    }

    if result.is_error {
        tracing::warn!(
            channel = %event.channel,
            thread_ts = %thread_key,
            "claude invocation reported an error"
        );
    }

    Ok(Some(Reply {
        text: result.text,
        thread_ts: thread_key,
    }))
}
