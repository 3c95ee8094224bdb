//! Intent stage
//!
//! Classifies the transcript into one of the closed banking intents.
//! A generative classifier runs first when available; any failure there
//! drops to deterministic keyword rules, so classification never fails.

use crate::error::AssistantError;
use crate::llm::TextGenerator;
use crate::models::{Intent, Language};
use crate::pipeline::state::{ConversationState, NextAction, Stage};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

lazy_static! {
    static ref AMOUNT_CURRENCY_FIRST: Regex =
        Regex::new(r"(?:₹|rupees?|rs\.?)\s*(\d[\d,]*)").expect("valid amount regex");
    static ref AMOUNT_CURRENCY_LAST: Regex =
        Regex::new(r"(\d[\d,]*)\s*(?:rupees?|rs\.?|₹)").expect("valid amount regex");
    static ref AMOUNT_BARE: Regex = Regex::new(r"\b(\d[\d,]*)\b").expect("valid amount regex");
    static ref RECIPIENT: Regex = Regex::new(r"to\s+([a-zA-Z]+)").expect("valid recipient regex");
}

pub async fn run(state: &mut ConversationState, generator: Option<&dyn TextGenerator>) {
    state.current_stage = Some(Stage::Intent);
    let text = state.transcript.clone();

    let classified = match generator {
        Some(generator) => match classify_with_model(generator, &text, state.language).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("Model classification failed, using keyword rules: {}", e);
                None
            }
        },
        None => None,
    };

    let (intent, confidence, entities) = classified.unwrap_or_else(|| classify_by_keywords(&text));

    debug!(
        intent = intent.as_str(),
        confidence, "Intent: classification complete"
    );

    state.intent = Some(intent);
    state.confidence = confidence;
    state.entities = entities;
    state.next_action = NextAction::RetrieveContext;
}

async fn classify_with_model(
    generator: &dyn TextGenerator,
    text: &str,
    language: Language,
) -> crate::Result<(Intent, f64, Map<String, Value>)> {
    let prompt = classification_prompt(language, text);
    let raw = generator.generate(&prompt, None).await?;
    let cleaned = strip_code_fences(&raw);

    let parsed: Value = serde_json::from_str(cleaned).map_err(|e| {
        AssistantError::ClassificationError(format!("unparseable classifier output: {}", e))
    })?;

    let intent = parsed
        .get("intent")
        .and_then(Value::as_str)
        .and_then(Intent::parse)
        .ok_or_else(|| {
            AssistantError::ClassificationError("unknown intent in classifier output".to_string())
        })?;

    let confidence = parsed
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.8);

    let entities = parsed
        .get("entities")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    Ok((intent, confidence, entities))
}

/// Strip a Markdown ```json fence so the payload parses cleanly
fn strip_code_fences(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Deterministic keyword rules, checked in fixed precedence order.
/// The first matching rule wins; matching is on the lowercased text.
fn classify_by_keywords(text: &str) -> (Intent, f64, Map<String, Value>) {
    let lowered = text.to_lowercase();
    let mut entities = Map::new();

    let has_any = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));

    if has_any(&["balance", "बैलेंस", "બેલેન્સ"]) {
        return (Intent::CheckBalance, 0.9, entities);
    }

    if has_any(&["transaction", "history", "लेनदेन", "વ્યવહાર"]) {
        return (Intent::ViewTransactions, 0.9, entities);
    }

    if has_any(&["transfer", "send", "pay", "भेजें", "મોકલો"]) {
        if let Some(amount) = extract_amount(&lowered) {
            entities.insert("amount".to_string(), Value::String(amount));
        }
        if let Some(recipient) = extract_recipient(&lowered) {
            entities.insert("recipient".to_string(), Value::String(recipient));
        }
        return (Intent::TransferFunds, 0.8, entities);
    }

    if has_any(&["loan", "लोन", "લોન", "emi"]) {
        return (Intent::LoanInquiry, 0.9, entities);
    }

    if has_any(&["credit", "card", "क्रेडिट", "ક્રેડિટ"]) {
        return (Intent::CreditInquiry, 0.9, entities);
    }

    (Intent::GeneralQuestion, 0.7, entities)
}

/// Pull a transfer amount out of the text: currency-prefixed first,
/// then currency-suffixed, then any standalone digit run. Thousands
/// separators are stripped.
fn extract_amount(lowered: &str) -> Option<String> {
    for pattern in [
        &*AMOUNT_CURRENCY_FIRST,
        &*AMOUNT_CURRENCY_LAST,
        &*AMOUNT_BARE,
    ] {
        if let Some(found) = pattern.captures(lowered).and_then(|c| c.get(1)) {
            return Some(found.as_str().replace(',', ""));
        }
    }
    None
}

/// The word following "to", capitalized
fn extract_recipient(lowered: &str) -> Option<String> {
    let word = RECIPIENT.captures(lowered)?.get(1)?.as_str();
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().collect::<String>() + chars.as_str())
}

fn classification_prompt(language: Language, text: &str) -> String {
    match language {
        Language::En => format!(
            r#"You are an intent classifier for a banking assistant. Analyze the user's request and identify:
1. Primary intent (one of: check_balance, view_transactions, transfer_funds, make_payment, loan_inquiry, credit_inquiry, general_question)
2. Confidence level (0.0 to 1.0)
3. Entities (amounts, dates, account numbers)

User request: "{}"

Respond in JSON format:
{{
    "intent": "<intent_name>",
    "confidence": <float>,
    "entities": {{}}
}}"#,
            text
        ),
        Language::Hi => format!(
            r#"आप एक बैंकिंग सहायक के लिए इंटेंट क्लासिफायर हैं। उपयोगकर्ता के अनुरोध का विश्लेषण करें और पहचानें:
1. मुख्य इंटेंट (इनमें से एक: check_balance, view_transactions, transfer_funds, make_payment, loan_inquiry, credit_inquiry, general_question)
2. कॉन्फिडेंस स्तर (0.0 से 1.0)
3. एंटिटी (राशि, तारीखें, खाता संख्या)

उपयोगकर्ता का अनुरोध: "{}"

JSON प्रारूप में उत्तर दें:
{{
    "intent": "<intent_name>",
    "confidence": <float>,
    "entities": {{}}
}}"#,
            text
        ),
        Language::Gu => format!(
            r#"તમે બેન્કિંગ આસિસ્ટન્ટ માટે ઇન્ટેન્ટ ક્લાસિફાયર છો. યુઝરની વિનંતીનું વિશ્લેષણ કરો અને ઓળખો:
1. મુખ્ય ઇન્ટેન્ટ (આમાંથી એક: check_balance, view_transactions, transfer_funds, make_payment, loan_inquiry, credit_inquiry, general_question)
2. કોન્ફિડન્સ સ્તર (0.0 થી 1.0)
3. એન્ટિટી (રકમ, તારીખો, ખાતા નંબર)

યુઝરની વિનંતી: "{}"

JSON ફોર્મેટમાં જવાબ આપો:
{{
    "intent": "<intent_name>",
    "confidence": <float>,
    "entities": {{}}
}}"#,
            text
        ),
    }
}
