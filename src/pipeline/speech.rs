//! Speech stage
//!
//! Turns the raw turn input into a transcript: audio goes through the
//! transcription collaborator when one is configured, text is taken
//! verbatim. Also owns the idempotent append to the thread message log.

use crate::asr::Transcriber;
use crate::error::TurnError;
use crate::pipeline::state::{ChatMessage, ConversationState, NextAction, Stage};
use tracing::{debug, warn};

pub async fn run(state: &mut ConversationState, transcriber: Option<&dyn Transcriber>) {
    state.current_stage = Some(Stage::Speech);

    let transcript = match (state.audio_input.as_deref(), transcriber) {
        (Some(audio), Some(transcriber)) => {
            match transcriber.transcribe(audio, state.language_hint).await {
                Ok(result) => {
                    if let Some(language) = result.language {
                        state.language = language;
                    }
                    result.text.trim().to_string()
                }
                Err(e) => {
                    warn!("Audio transcription failed: {}", e);
                    state.error = Some(TurnError::TranscriptionFailed(e.to_string()));
                    state.next_action = NextAction::End;
                    return;
                }
            }
        }
        _ => match state.text_input.clone().filter(|text| !text.is_empty()) {
            Some(text) => text,
            None => {
                state.error = Some(TurnError::NoInputProvided);
                state.next_action = NextAction::End;
                return;
            }
        },
    };

    debug!(
        language = state.language.code(),
        chars = transcript.len(),
        "Speech: transcript ready"
    );

    // Retried turns must not double up the thread log
    let duplicate = state
        .messages
        .last()
        .map(|m| m.text == transcript)
        .unwrap_or(false);
    if !duplicate {
        state.messages.push(ChatMessage::user(&transcript));
    }

    state.transcript = transcript;
    state.next_action = NextAction::UnderstandIntent;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asr::MockTranscriber;
    use crate::models::Language;
    use crate::pipeline::state::TurnInput;
    use uuid::Uuid;

    fn state_with(input: TurnInput) -> ConversationState {
        ConversationState::new(input, Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_text_input_used_verbatim() {
        let mut state = state_with(TurnInput {
            text: Some("What is my balance?".to_string()),
            ..Default::default()
        });

        run(&mut state, None).await;

        assert_eq!(state.transcript, "What is my balance?");
        assert_eq!(state.next_action, NextAction::UnderstandIntent);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_whitespace_only_text_still_flows() {
        let mut state = state_with(TurnInput {
            text: Some("   ".to_string()),
            ..Default::default()
        });

        run(&mut state, None).await;

        assert_eq!(state.transcript, "   ");
        assert_eq!(state.next_action, NextAction::UnderstandIntent);
    }

    #[tokio::test]
    async fn test_missing_input_is_terminal() {
        let mut state = state_with(TurnInput::default());

        run(&mut state, None).await;

        assert_eq!(state.error, Some(TurnError::NoInputProvided));
        assert_eq!(state.next_action, NextAction::End);
        assert!(state.messages.is_empty());
    }

    #[tokio::test]
    async fn test_audio_adopts_detected_language() {
        let transcriber = MockTranscriber::new("मेरा बैलेंस बताओ", Some(Language::Hi));
        let mut state = state_with(TurnInput {
            audio: Some(vec![1, 2, 3]),
            ..Default::default()
        });

        run(&mut state, Some(&transcriber)).await;

        assert_eq!(state.transcript, "मेरा बैलेंस बताओ");
        assert_eq!(state.language, Language::Hi);
        assert_eq!(state.next_action, NextAction::UnderstandIntent);
    }

    #[tokio::test]
    async fn test_audio_without_transcriber_falls_back_to_text() {
        let mut state = state_with(TurnInput {
            audio: Some(vec![1, 2, 3]),
            text: Some("hello".to_string()),
            ..Default::default()
        });

        run(&mut state, None).await;

        assert_eq!(state.transcript, "hello");
        assert_eq!(state.next_action, NextAction::UnderstandIntent);
    }

    #[tokio::test]
    async fn test_failed_transcription_is_terminal() {
        let transcriber = MockTranscriber::failing();
        let mut state = state_with(TurnInput {
            audio: Some(vec![1, 2, 3]),
            ..Default::default()
        });

        run(&mut state, Some(&transcriber)).await;

        assert!(matches!(
            state.error,
            Some(TurnError::TranscriptionFailed(_))
        ));
        assert_eq!(state.next_action, NextAction::End);
    }

    #[tokio::test]
    async fn test_log_append_skips_repeated_text() {
        let mut state = state_with(TurnInput {
            text: Some("send money".to_string()),
            ..Default::default()
        });
        state.messages.push(ChatMessage::user("send money"));

        run(&mut state, None).await;

        assert_eq!(state.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_log_append_keeps_distinct_turns() {
        let mut state = state_with(TurnInput {
            text: Some("send money".to_string()),
            ..Default::default()
        });
        state.messages.push(ChatMessage::user("what is my balance"));

        run(&mut state, None).await;

        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1].text, "send money");
    }
}
