//! Dialog stage
//!
//! Renders the final reply in the turn language. A configured generator
//! speaks first, grounded in a context block of account facts; the
//! deterministic templates then override any data-bearing reply so the
//! numbers always come from the store, never from the model. Generation
//! failure is non-fatal: the same templates carry the turn.

use crate::accounts::AccountStore;
use crate::error::TurnError;
use crate::llm::TextGenerator;
use crate::models::{AccountProfile, Intent, Language};
use crate::pipeline::state::{ConversationState, NextAction, Stage};
use crate::pipeline::templates;
use serde_json::Value;
use tracing::warn;

pub async fn run(
    state: &mut ConversationState,
    generator: Option<&dyn TextGenerator>,
    accounts: &dyn AccountStore,
) {
    state.current_stage = Some(Stage::Dialog);

    let profile = if state.authenticated {
        match state.user_id.as_deref() {
            Some(id) => accounts.get(id).await,
            None => None,
        }
    } else {
        None
    };
    let Some(profile) = profile else {
        state.response = templates::login_message(state.language).to_string();
        state.next_action = NextAction::End;
        return;
    };

    let first_name = profile.first_name().to_string();
    let context = build_context(state, &profile);

    let generated = match generator {
        Some(generator) => {
            let prompt = response_prompt(state, &first_name, &context);
            match generator
                .generate(&prompt, Some(system_message(state.language)))
                .await
            {
                Ok(text) => Some(text.trim().to_string()),
                Err(e) => {
                    warn!("Reply generation failed, rendering from templates: {}", e);
                    None
                }
            }
        }
        None => None,
    };

    state.response = match render_override(state, &first_name) {
        Some(template) => template,
        None => {
            generated.unwrap_or_else(|| templates::generic_greeting(state.language, &first_name))
        }
    };

    state.compliance_passed = true;
    state.next_action = NextAction::End;
}

/// Grounding block of account facts handed to the generator
fn build_context(state: &ConversationState, profile: &AccountProfile) -> String {
    let mut parts = Vec::new();

    parts.push(format!("Account Number: {}", profile.account_number));
    if let Some(balance) = state.account_balance {
        parts.push(format!(
            "Current Balance: ₹{}",
            templates::format_amount(balance)
        ));
    }
    if !state.transaction_history.is_empty() {
        parts.push(format!(
            "\nRecent Transactions (showing {} most recent):",
            state.transaction_history.len()
        ));
        for (i, t) in state.transaction_history.iter().enumerate() {
            parts.push(format!(
                "{}. {}: {} ₹{} - {}",
                i + 1,
                t.date,
                t.kind,
                templates::format_amount(t.amount.abs()),
                t.description
            ));
        }
    }
    if let Some(loan_balance) = nonzero_entity(state, "loan_balance") {
        parts.push(format!(
            "\nLoan Balance: ₹{}",
            templates::format_amount(loan_balance)
        ));
        if let Some(rate) = entity_f64(state, "interest_rate") {
            parts.push(format!("Interest Rate: {}%", rate));
        }
    }
    if let Some(limit) = nonzero_entity(state, "credit_limit") {
        parts.push(format!("Credit Limit: ₹{}", templates::format_amount(limit)));
    }
    if !state.retrieved_context.is_empty() {
        parts.push(format!(
            "\nAdditional Information: {}",
            state.retrieved_context.join("\n")
        ));
    }

    parts.join("\n")
}

/// Replace generated text with a template whenever backing data exists.
/// Returns `None` for intents that carry no account facts.
fn render_override(state: &ConversationState, name: &str) -> Option<String> {
    let language = state.language;

    match state.intent? {
        Intent::CheckBalance => {
            let balance = state.account_balance?;
            let account = state.account_number.as_deref().unwrap_or("");
            Some(templates::balance_reply(language, name, balance, account))
        }
        Intent::ViewTransactions => {
            if state.transaction_history.is_empty() {
                return None;
            }
            Some(templates::transactions_reply(
                language,
                name,
                &state.transaction_history,
            ))
        }
        Intent::LoanInquiry => {
            let loan_balance = nonzero_entity(state, "loan_balance")?;
            let interest_rate = entity_f64(state, "interest_rate").unwrap_or(0.0);
            Some(templates::loan_reply(language, name, loan_balance, interest_rate))
        }
        Intent::CreditInquiry => {
            let credit_limit = nonzero_entity(state, "credit_limit")?;
            Some(templates::credit_reply(language, name, credit_limit))
        }
        Intent::TransferFunds => render_transfer(state, name),
        Intent::MakePayment | Intent::GeneralQuestion => None,
    }
}

fn render_transfer(state: &ConversationState, name: &str) -> Option<String> {
    let language = state.language;

    let succeeded = state
        .entities
        .get("transfer_successful")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if succeeded {
        let amount = entity_f64(state, "amount_transferred").unwrap_or(0.0);
        let recipient = state
            .entities
            .get("recipient_name")
            .and_then(Value::as_str)
            .unwrap_or("");
        let new_balance = entity_f64(state, "new_balance").unwrap_or(0.0);
        let account = state
            .entities
            .get("recipient_account")
            .and_then(Value::as_str)
            .unwrap_or("");
        return Some(templates::transfer_success_reply(
            language,
            name,
            amount,
            recipient,
            new_balance,
            account,
        ));
    }

    if let Some(error) = state.entities.get("error").and_then(Value::as_str) {
        return Some(match error {
            "Recipient not found" => templates::recipient_not_found_reply(language, name),
            "Insufficient balance" => {
                let current = entity_f64(state, "current_balance").unwrap_or(0.0);
                templates::insufficient_balance_reply(language, name, current)
            }
            _ => templates::transfer_failed_reply(language, name),
        });
    }

    if state.error == Some(TurnError::InvalidTransferAmount) {
        return Some(templates::transfer_failed_reply(language, name));
    }

    None
}

fn entity_f64(state: &ConversationState, key: &str) -> Option<f64> {
    state.entities.get(key).and_then(Value::as_f64)
}

/// Zero means "not loaded" for the profile-derived figures
fn nonzero_entity(state: &ConversationState, key: &str) -> Option<f64> {
    entity_f64(state, key).filter(|v| *v != 0.0)
}

fn system_message(language: Language) -> &'static str {
    match language {
        Language::En => {
            "You are an English banking assistant. You must ALWAYS respond ONLY in English and include all specific account details."
        }
        Language::Hi => "आप एक हिंदी बैंकिंग सहायक हैं। आपको हमेशा केवल हिंदी में जवाब देना है।",
        Language::Gu => {
            "તમે એક ગુજરાતી બેન્કિંગ આસિસ્ટન્ટ છો. તમારે હંમેશા ફક્ત ગુજરાતીમાં જ જવાબ આપવાનો છે."
        }
    }
}

fn response_prompt(state: &ConversationState, name: &str, context: &str) -> String {
    let intent = state
        .intent
        .map(|i| i.as_str())
        .unwrap_or("general_question");

    match state.language {
        Language::En => format!(
            r#"You are speaking to {} in English.

User's request: "{}"
Intent: {}

Account Information:
{}

**CRITICAL INSTRUCTIONS:**
- Respond ONLY in English language
- Do NOT use Hindi, Gujarati or any other language
- MUST include ALL specific details from above (balance amounts, transaction details, account numbers)
- For balance queries: State the exact balance amount
- For transaction queries: List the recent transactions with dates, amounts, and descriptions
- Keep the response concise but complete (2-4 sentences)
- Be helpful and professional

Now respond ONLY in English with ALL the specific details:"#,
            name, state.transcript, intent, context
        ),
        Language::Hi => format!(
            r#"आप {} से हिंदी में बात कर रहे हैं।

उपयोगकर्ता का अनुरोध: "{}"
इंटेंट: {}

खाता जानकारी:
{}

**बहुत महत्वपूर्ण निर्देश:**
- आपको केवल हिंदी में उत्तर देना है
- अंग्रेजी शब्दों का बिल्कुल उपयोग न करें
- ऊपर दी गई सभी विशिष्ट जानकारी (बैलेंस, ट्रांजेक्शन) को अपने उत्तर में शामिल करें
- 2-3 वाक्यों में संक्षिप्त लेकिन पूर्ण उत्तर दें

अब केवल हिंदी में उत्तर दें:"#,
            name, state.transcript, intent, context
        ),
        Language::Gu => format!(
            r#"તમે {} સાથે ગુજરાતીમાં વાત કરો છો.

યુઝરની વિનંતી: "{}"
ઇન્ટેન્ટ: {}

ખાતાની માહિતી:
{}

**ખૂબ જ મહત્વપૂર્ણ સૂચનાઓ:**
- તમારે ફક્ત ગુજરાતીમાં જવાબ આપવાનો છે
- અંગ્રેજી શબ્દોનો બિલકુલ ઉપયોગ ન કરો
- ઉપર આપેલી બધી વિગતવાર માહિતી (બેલેન્સ, ટ્રાન્ઝેક્શન) તમારા જવાબમાં સામેલ કરો
- 2-3 વાક્યોમાં સંક્ષિપ્ત પણ સંપૂર્ણ જવાબ આપો

હવે ફક્ત ગુજરાતીમાં જવાબ આપો:"#,
            name, state.transcript, intent, context
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::InMemoryAccountStore;
    use crate::llm::MockGenerator;
    use crate::pipeline::state::TurnInput;
    use serde_json::json;
    use uuid::Uuid;

    fn authenticated_state(user_id: &str, intent: Intent) -> ConversationState {
        let mut state = ConversationState::new(
            TurnInput {
                user_id: Some(user_id.to_string()),
                ..Default::default()
            },
            Uuid::new_v4(),
        );
        state.authenticated = true;
        state.intent = Some(intent);
        state
    }

    #[tokio::test]
    async fn test_unauthenticated_turn_gets_login_message() {
        let store = InMemoryAccountStore::new();
        let mut state = ConversationState::new(TurnInput::default(), Uuid::new_v4());
        state.intent = Some(Intent::CheckBalance);

        run(&mut state, None, &store).await;

        assert_eq!(
            state.response,
            "Please log in to access your account information."
        );
        assert_eq!(state.next_action, NextAction::End);
        assert!(!state.compliance_passed);
    }

    #[tokio::test]
    async fn test_login_message_follows_turn_language() {
        let store = InMemoryAccountStore::new();
        let mut state = ConversationState::new(TurnInput::default(), Uuid::new_v4());
        state.language = Language::Hi;

        run(&mut state, None, &store).await;

        assert_eq!(
            state.response,
            "कृपया अपनी खाता जानकारी तक पहुंचने के लिए लॉगिन करें।"
        );
    }

    #[tokio::test]
    async fn test_balance_template_overrides_generated_text() {
        let store = InMemoryAccountStore::new();
        let generator = MockGenerator::new("Your balance is around one lakh.");
        let mut state = authenticated_state("neha", Intent::CheckBalance);
        state.account_balance = Some(125000.00);
        state.account_number = Some("NGB001234567890".to_string());

        run(&mut state, Some(&generator), &store).await;

        assert_eq!(
            state.response,
            "Hello Neha, your current account balance is ₹125,000.00. Account number: NGB001234567890. Is there anything else I can help you with?"
        );
        assert!(state.compliance_passed);
    }

    #[tokio::test]
    async fn test_generation_failure_still_renders_balance() {
        let store = InMemoryAccountStore::new();
        let generator = MockGenerator::failing();
        let mut state = authenticated_state("neha", Intent::CheckBalance);
        state.account_balance = Some(125000.00);
        state.account_number = Some("NGB001234567890".to_string());

        run(&mut state, Some(&generator), &store).await;

        assert!(state.response.contains("₹125,000.00"));
        assert!(state.compliance_passed);
        assert_eq!(state.next_action, NextAction::End);
    }

    #[tokio::test]
    async fn test_general_question_passes_generated_text_through() {
        let store = InMemoryAccountStore::new();
        let generator = MockGenerator::new("Our branches are open 9 to 5 on weekdays.");
        let mut state = authenticated_state("neha", Intent::GeneralQuestion);

        run(&mut state, Some(&generator), &store).await;

        assert_eq!(state.response, "Our branches are open 9 to 5 on weekdays.");
    }

    #[tokio::test]
    async fn test_general_question_without_generator_greets() {
        let store = InMemoryAccountStore::new();
        let mut state = authenticated_state("neha", Intent::GeneralQuestion);

        run(&mut state, None, &store).await;

        assert_eq!(
            state.response,
            "Hello Neha, I'm here to help with your banking needs."
        );
    }

    #[tokio::test]
    async fn test_transfer_success_renders_receipt() {
        let store = InMemoryAccountStore::new();
        let mut state = authenticated_state("neha", Intent::TransferFunds);
        state.entities.insert("transfer_successful".to_string(), json!(true));
        state.entities.insert("amount_transferred".to_string(), json!(5000.0));
        state
            .entities
            .insert("recipient_name".to_string(), json!("Niyati Patel"));
        state.entities.insert("new_balance".to_string(), json!(120000.0));
        state
            .entities
            .insert("recipient_account".to_string(), json!("NGB009876543210"));

        run(&mut state, None, &store).await;

        assert_eq!(
            state.response,
            "✅ Success! Neha, ₹5,000.00 has been transferred to Niyati Patel. Your new balance: ₹120,000.00. Recipient account: NGB009876543210."
        );
    }

    #[tokio::test]
    async fn test_invalid_amount_renders_failure_template() {
        let store = InMemoryAccountStore::new();
        let mut state = authenticated_state("neha", Intent::TransferFunds);
        state.error = Some(TurnError::InvalidTransferAmount);

        run(&mut state, None, &store).await;

        assert_eq!(state.response, "Sorry Neha, transfer failed. Please try again.");
    }

    #[tokio::test]
    async fn test_insufficient_balance_renders_current_balance() {
        let store = InMemoryAccountStore::new();
        let mut state = authenticated_state("neha", Intent::TransferFunds);
        state
            .entities
            .insert("error".to_string(), json!("Insufficient balance"));
        state
            .entities
            .insert("current_balance".to_string(), json!(125000.0));

        run(&mut state, None, &store).await;

        assert_eq!(
            state.response,
            "Sorry Neha, insufficient balance. Your current balance is ₹125,000.00."
        );
    }

    #[tokio::test]
    async fn test_loan_reply_in_gujarati() {
        let store = InMemoryAccountStore::new();
        let mut state = authenticated_state("niyati", Intent::LoanInquiry);
        state.language = Language::Gu;
        state.entities.insert("loan_balance".to_string(), json!(4120000.0));
        state.entities.insert("interest_rate".to_string(), json!(8.25));

        run(&mut state, None, &store).await;

        assert!(state.response.contains("નમસ્તે Niyati"));
        assert!(state.response.contains("₹4,120,000.00"));
        assert!(state.response.contains("8.25%"));
    }

    #[tokio::test]
    async fn test_context_block_contains_loaded_facts() {
        let store = InMemoryAccountStore::new();
        let profile = store.get("neha").await.unwrap();
        let mut state = authenticated_state("neha", Intent::CheckBalance);
        state.account_balance = Some(125000.00);
        state.retrieved_context = vec!["Daily limit applies.".to_string()];

        let context = build_context(&state, &profile);

        assert!(context.contains("Account Number: NGB001234567890"));
        assert!(context.contains("Current Balance: ₹125,000.00"));
        assert!(context.contains("Additional Information: Daily limit applies."));
    }

    #[test]
    fn test_zero_loan_balance_is_not_rendered() {
        let mut state = authenticated_state("neha", Intent::LoanInquiry);
        state.entities.insert("loan_balance".to_string(), json!(0.0));

        assert!(render_override(&state, "Neha").is_none());
    }
}
