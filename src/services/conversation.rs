use std::sync::Arc;

use thiserror::Error;

use crate::modules::chat::model::{trim_to_window, Turn};
use crate::services::llm::{CompletionApi, LlmError};

/// Persona sent as the system turn of every completion call. Injected at
/// call time, never stored in the session history.
const SYSTEM_PROMPT: &str = "You are a pragmatic project management advisor. \
Users describe their team size, timeline, and constraints, and you recommend \
a suitable project management methodology such as Scrum, Kanban, Waterfall, \
or a hybrid, briefly explaining the trade-offs. Ask one clarifying question \
when key details are missing. Keep answers practical and under a few short \
paragraphs.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("completion service returned an empty reply")]
    EmptyResponse,
    #[error(transparent)]
    Remote(#[from] LlmError),
}

/// Mediates every call to the completion service and owns the window policy
/// for the session history. Persisting the updated history is the caller's
/// job.
pub struct ConversationManager {
    llm: Arc<dyn CompletionApi>,
}

impl ConversationManager {
    pub fn new(llm: Arc<dyn CompletionApi>) -> Self {
        Self { llm }
    }

    /// Runs one exchange. The outbound list is system turn + stored history
    /// + the new user turn; `history` is only mutated after the remote call
    /// succeeds, so a failed exchange leaves it exactly as it was.
    pub async fn submit(
        &self,
        history: &mut Vec<Turn>,
        user_message: &str,
    ) -> Result<String, ChatError> {
        let mut outbound = Vec::with_capacity(history.len() + 2);
        outbound.push(Turn::system(SYSTEM_PROMPT.to_string()));
        outbound.extend(history.iter().cloned());
        outbound.push(Turn::user(user_message.to_string()));

        let raw = self.llm.complete(&outbound).await?;
        let reply = raw.trim();
        if reply.is_empty() {
            return Err(ChatError::EmptyResponse);
        }

        history.push(Turn::user(user_message.to_string()));
        history.push(Turn::assistant(reply.to_string()));
        trim_to_window(history);

        Ok(reply.to_string())
    }
}
