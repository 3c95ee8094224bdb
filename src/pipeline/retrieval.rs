//! Retrieval stage
//!
//! Attaches knowledge snippets for the intents that have a mapped topic.
//! Most intents retrieve nothing; the dialog stage treats an empty set
//! as "no additional information".

use crate::knowledge::KnowledgeBase;
use crate::pipeline::state::{ConversationState, NextAction, Stage};
use tracing::debug;

pub fn run(state: &mut ConversationState, knowledge: &KnowledgeBase) {
    state.current_stage = Some(Stage::Retrieval);

    if let Some(intent) = state.intent {
        state.retrieved_context = knowledge.retrieve(intent);
        debug!(
            intent = intent.as_str(),
            snippets = state.retrieved_context.len(),
            "Retrieval: context collected"
        );
    }

    state.next_action = NextAction::ExecuteBanking;
}
