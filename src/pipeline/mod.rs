//! Voice banking pipeline
//!
//! Five stages over one shared conversation state:
//!
//! speech → intent → retrieval → banking → dialog
//!
//! Wiring is signal-routed: every stage announces what should happen
//! next and the router resolves the hop, until a terminal signal (or
//! the transition cap) ends the turn.

use crate::accounts::AccountStore;
use crate::asr::Transcriber;
use crate::error::AssistantError;
use crate::knowledge::KnowledgeBase;
use crate::llm::TextGenerator;
use crate::models::TurnReply;
use crate::session::{parse_or_stable_uuid, SessionStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub mod banking;
pub mod dialog;
pub mod intent;
pub mod retrieval;
pub mod router;
pub mod speech;
pub mod state;
pub mod templates;

pub use state::{ChatMessage, ConversationState, NextAction, Speaker, Stage, TurnInput};

const MAX_STAGE_TRANSITIONS: u32 = 10;

/// The assembled assistant: collaborators plus the stores a turn needs
pub struct Pipeline {
    transcriber: Option<Arc<dyn Transcriber>>,
    generator: Option<Arc<dyn TextGenerator>>,
    accounts: Arc<dyn AccountStore>,
    knowledge: KnowledgeBase,
    sessions: SessionStore,
}

impl Pipeline {
    pub fn new(
        transcriber: Option<Arc<dyn Transcriber>>,
        generator: Option<Arc<dyn TextGenerator>>,
        accounts: Arc<dyn AccountStore>,
        sessions: SessionStore,
    ) -> Self {
        Self {
            transcriber,
            generator,
            accounts,
            knowledge: KnowledgeBase::new(),
            sessions,
        }
    }

    pub fn has_transcriber(&self) -> bool {
        self.transcriber.is_some()
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    pub fn accounts(&self) -> &Arc<dyn AccountStore> {
        &self.accounts
    }

    /// Run one full turn and produce the wire-facing reply
    pub async fn run_turn(&self, input: TurnInput) -> crate::Result<TurnReply> {
        let thread_token = input
            .thread_id
            .clone()
            .or_else(|| input.user_id.as_ref().map(|id| format!("session_{}", id)))
            .unwrap_or_else(|| "session_anonymous".to_string());
        let thread_key = parse_or_stable_uuid(Some(&thread_token), "session_anonymous");

        let mut state = ConversationState::new(input, thread_key);
        state.messages = match self.sessions.load(thread_key).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Session restore failed, starting thread fresh: {}", e);
                Vec::new()
            }
        };

        info!(
            user_id = ?state.user_id,
            language = state.language.code(),
            "Pipeline: starting turn"
        );

        // START always enters the speech stage
        speech::run(&mut state, self.transcriber.as_deref()).await;

        let mut transitions = 0u32;
        while let Some(stage) = router::route(state.next_action) {
            transitions += 1;
            if transitions > MAX_STAGE_TRANSITIONS {
                return Err(AssistantError::StageLimitExceeded(format!(
                    "exceeded {} stage transitions",
                    MAX_STAGE_TRANSITIONS
                )));
            }

            debug!(stage = stage.as_str(), "Pipeline: entering stage");

            match stage {
                Stage::Speech => speech::run(&mut state, self.transcriber.as_deref()).await,
                Stage::Intent => intent::run(&mut state, self.generator.as_deref()).await,
                Stage::Retrieval => retrieval::run(&mut state, &self.knowledge),
                Stage::Banking => banking::run(&mut state, self.accounts.as_ref()).await,
                Stage::Dialog => {
                    dialog::run(&mut state, self.generator.as_deref(), self.accounts.as_ref()).await
                }
            }
        }

        if let Err(e) = self.sessions.save(thread_key, &state.messages).await {
            warn!("Session checkpoint failed, reply unaffected: {}", e);
        }

        info!(
            intent = ?state.intent.map(|i| i.as_str()),
            compliance = state.compliance_passed,
            "Pipeline: turn complete"
        );

        Ok(state.into_reply())
    }
}
