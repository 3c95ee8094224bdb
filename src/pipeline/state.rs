//! Shared conversation state threaded through the pipeline stages
//!
//! One turn owns one `ConversationState`. Stages read and mutate it in
//! place and announce the next hop through the `next_action` signal.

use crate::error::TurnError;
use crate::models::{Intent, Language, TransactionRecord, TurnReply};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

//
// ================= Control Signals =================
//

/// Signal a stage leaves behind for the router
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    UnderstandIntent,
    RetrieveContext,
    ExecuteBanking,
    GenerateResponse,
    Respond,
    End,
}

impl NextAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NextAction::UnderstandIntent => "understand_intent",
            NextAction::RetrieveContext => "retrieve_context",
            NextAction::ExecuteBanking => "execute_banking",
            NextAction::GenerateResponse => "generate_response",
            NextAction::Respond => "respond",
            NextAction::End => "end",
        }
    }
}

impl Default for NextAction {
    fn default() -> Self {
        NextAction::End
    }
}

/// Pipeline stages in wiring order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Speech,
    Intent,
    Retrieval,
    Banking,
    Dialog,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Speech => "speech",
            Stage::Intent => "intent",
            Stage::Retrieval => "retrieval",
            Stage::Banking => "banking",
            Stage::Dialog => "dialog",
        }
    }
}

//
// ================= Message Log =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// One speaker-tagged entry in a thread's persisted message log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: &str) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.to_string(),
        }
    }
}

//
// ================= Turn Input =================
//

/// Raw inputs for one pipeline turn, as received by the API layer
#[derive(Debug, Clone, Default)]
pub struct TurnInput {
    pub user_id: Option<String>,
    pub thread_id: Option<String>,
    pub text: Option<String>,
    pub audio: Option<Vec<u8>>,
    /// `None` means "auto": detect from audio, default to English for text
    pub language: Option<Language>,
}

//
// ================= Conversation State =================
//

#[derive(Debug, Clone)]
pub struct ConversationState {
    // Identity & input
    pub user_id: Option<String>,
    pub thread_key: Uuid,
    pub text_input: Option<String>,
    pub audio_input: Option<Vec<u8>>,
    pub language: Language,
    pub language_hint: Option<Language>,
    pub authenticated: bool,

    // Speech
    pub transcript: String,

    // Intent
    pub intent: Option<Intent>,
    pub confidence: f64,
    pub entities: Map<String, Value>,

    // Retrieval
    pub retrieved_context: Vec<String>,

    // Banking
    pub account_balance: Option<f64>,
    pub transaction_history: Vec<TransactionRecord>,
    pub account_number: Option<String>,

    // Output
    pub response: String,
    pub compliance_passed: bool,

    // Control
    pub next_action: NextAction,
    pub current_stage: Option<Stage>,
    pub error: Option<TurnError>,

    // Restored from the session store before the turn, persisted after
    pub messages: Vec<ChatMessage>,
}

impl ConversationState {
    pub fn new(input: TurnInput, thread_key: Uuid) -> Self {
        Self {
            user_id: input.user_id,
            thread_key,
            text_input: input.text,
            audio_input: input.audio,
            language: input.language.unwrap_or_default(),
            language_hint: input.language,
            authenticated: false,
            transcript: String::new(),
            intent: None,
            confidence: 0.0,
            entities: Map::new(),
            retrieved_context: Vec::new(),
            account_balance: None,
            transaction_history: Vec::new(),
            account_number: None,
            response: String::new(),
            compliance_passed: false,
            next_action: NextAction::End,
            current_stage: None,
            error: None,
            messages: Vec::new(),
        }
    }

    /// Collapse the finished state into the wire-facing reply
    pub fn into_reply(self) -> TurnReply {
        TurnReply {
            response: self.response,
            intent: self.intent,
            confidence: self.confidence,
            account_balance: self.account_balance,
            transaction_history: self.transaction_history,
            entities: self.entities,
            compliance_passed: self.compliance_passed,
            error: self.error.map(|e| e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_defaults() {
        let input = TurnInput {
            user_id: Some("neha".to_string()),
            text: Some("hello".to_string()),
            ..Default::default()
        };
        let state = ConversationState::new(input, Uuid::new_v4());

        assert_eq!(state.language, Language::En);
        assert!(state.language_hint.is_none());
        assert!(!state.authenticated);
        assert!(!state.compliance_passed);
        assert_eq!(state.next_action, NextAction::End);
        assert!(state.current_stage.is_none());
    }

    #[test]
    fn test_reply_carries_error_text() {
        let mut state = ConversationState::new(TurnInput::default(), Uuid::new_v4());
        state.error = Some(TurnError::UserNotAuthenticated);

        let reply = state.into_reply();
        assert_eq!(reply.error.as_deref(), Some("User not authenticated"));
        assert!(!reply.compliance_passed);
    }

    #[test]
    fn test_chat_message_roundtrip() {
        let message = ChatMessage::user("What is my balance?");
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("\"speaker\":\"user\""));

        let back: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, message);
    }
}
