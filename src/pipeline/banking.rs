//! Banking stage
//!
//! Executes the account operation behind the classified intent. The
//! authentication guard runs first: without a known user the stage
//! stops with a terminal error and the store is never touched.

use crate::accounts::{AccountStore, TransferError};
use crate::error::TurnError;
use crate::models::Intent;
use crate::pipeline::state::{ConversationState, NextAction, Stage};
use serde_json::{json, Value};
use tracing::{info, warn};

pub async fn run(state: &mut ConversationState, accounts: &dyn AccountStore) {
    state.current_stage = Some(Stage::Banking);

    let profile = match state.user_id.as_deref() {
        Some(id) => accounts.get(id).await,
        None => None,
    };
    let Some(profile) = profile else {
        state.error = Some(TurnError::UserNotAuthenticated);
        state.next_action = NextAction::Respond;
        return;
    };

    state.authenticated = true;
    state.account_number = Some(profile.account_number.clone());

    match state.intent.unwrap_or(Intent::GeneralQuestion) {
        Intent::CheckBalance => {
            state.account_balance = Some(profile.balance);
        }
        Intent::ViewTransactions => {
            state.transaction_history = accounts.recent_transactions(&profile.user_id, 5).await;
        }
        Intent::LoanInquiry => {
            state
                .entities
                .insert("loan_balance".to_string(), json!(profile.loan_balance));
            state
                .entities
                .insert("interest_rate".to_string(), json!(profile.interest_rate));
            state.entities.insert("name".to_string(), json!(profile.name));
        }
        Intent::CreditInquiry => {
            state
                .entities
                .insert("credit_limit".to_string(), json!(profile.credit_limit));
            state.entities.insert("cards".to_string(), json!(profile.cards));
        }
        Intent::TransferFunds => {
            let Some(amount) = parse_amount(state.entities.get("amount")) else {
                state.error = Some(TurnError::InvalidTransferAmount);
                state.next_action = NextAction::Respond;
                return;
            };
            let recipient = state
                .entities
                .get("recipient")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();

            match accounts.transfer(&profile.user_id, &recipient, amount).await {
                Ok(receipt) => {
                    info!(
                        amount = receipt.amount,
                        recipient = %receipt.recipient_name,
                        "Banking: transfer complete"
                    );
                    state
                        .entities
                        .insert("transfer_successful".to_string(), json!(true));
                    state
                        .entities
                        .insert("amount_transferred".to_string(), json!(receipt.amount));
                    state
                        .entities
                        .insert("recipient_name".to_string(), json!(receipt.recipient_name));
                    state
                        .entities
                        .insert("new_balance".to_string(), json!(receipt.new_balance));
                    state.entities.insert(
                        "recipient_account".to_string(),
                        json!(receipt.recipient_account),
                    );
                    state.account_balance = Some(receipt.new_balance);
                }
                Err(e) => {
                    warn!("Banking: transfer rejected: {}", e);
                    if let TransferError::InsufficientBalance { balance } = e {
                        state
                            .entities
                            .insert("current_balance".to_string(), json!(balance));
                    }
                    state.entities.insert("error".to_string(), json!(e.to_string()));
                }
            }
        }
        Intent::MakePayment | Intent::GeneralQuestion => {}
    }

    state.next_action = NextAction::GenerateResponse;
}

/// Amounts arrive as numbers or as text with currency noise
fn parse_amount(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.replace(',', "").replace('₹', "").trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::InMemoryAccountStore;
    use crate::pipeline::state::TurnInput;
    use uuid::Uuid;

    fn state_for(user_id: Option<&str>, intent: Intent) -> ConversationState {
        let mut state = ConversationState::new(
            TurnInput {
                user_id: user_id.map(|s| s.to_string()),
                ..Default::default()
            },
            Uuid::new_v4(),
        );
        state.intent = Some(intent);
        state
    }

    #[tokio::test]
    async fn test_missing_user_is_unauthenticated() {
        let store = InMemoryAccountStore::new();
        let mut state = state_for(None, Intent::CheckBalance);

        run(&mut state, &store).await;

        assert_eq!(state.error, Some(TurnError::UserNotAuthenticated));
        assert_eq!(state.next_action, NextAction::Respond);
        assert!(!state.authenticated);
        assert!(state.account_balance.is_none());
    }

    #[tokio::test]
    async fn test_unknown_user_is_unauthenticated() {
        let store = InMemoryAccountStore::new();
        let mut state = state_for(Some("mallory"), Intent::CheckBalance);

        run(&mut state, &store).await;

        assert_eq!(state.error, Some(TurnError::UserNotAuthenticated));
        assert_eq!(state.next_action, NextAction::Respond);
    }

    #[tokio::test]
    async fn test_check_balance_loads_account_facts() {
        let store = InMemoryAccountStore::new();
        let mut state = state_for(Some("neha"), Intent::CheckBalance);

        run(&mut state, &store).await;

        assert!(state.authenticated);
        assert_eq!(state.account_balance, Some(125000.00));
        assert_eq!(state.account_number.as_deref(), Some("NGB001234567890"));
        assert_eq!(state.next_action, NextAction::GenerateResponse);
    }

    #[tokio::test]
    async fn test_view_transactions_loads_five_newest() {
        let store = InMemoryAccountStore::new();
        let mut state = state_for(Some("neha"), Intent::ViewTransactions);

        run(&mut state, &store).await;

        assert_eq!(state.transaction_history.len(), 5);
        assert_eq!(
            state.transaction_history[0].description,
            "Salary Credit - Tech Corp"
        );
    }

    #[tokio::test]
    async fn test_loan_inquiry_fills_entities() {
        let store = InMemoryAccountStore::new();
        let mut state = state_for(Some("neha"), Intent::LoanInquiry);

        run(&mut state, &store).await;

        assert_eq!(state.entities.get("loan_balance"), Some(&json!(180000.00)));
        assert_eq!(state.entities.get("interest_rate"), Some(&json!(7.5)));
        assert_eq!(state.entities.get("name"), Some(&json!("Neha Sharma")));
    }

    #[tokio::test]
    async fn test_credit_inquiry_fills_entities() {
        let store = InMemoryAccountStore::new();
        let mut state = state_for(Some("niyati"), Intent::CreditInquiry);

        run(&mut state, &store).await;

        assert_eq!(state.entities.get("credit_limit"), Some(&json!(150000.00)));
        let cards = state.entities.get("cards").and_then(Value::as_array);
        assert_eq!(cards.map(|c| c.len()), Some(2));
    }

    #[tokio::test]
    async fn test_transfer_success_updates_state_and_store() {
        let store = InMemoryAccountStore::new();
        let mut state = state_for(Some("neha"), Intent::TransferFunds);
        state
            .entities
            .insert("amount".to_string(), json!("₹5,000"));
        state
            .entities
            .insert("recipient".to_string(), json!("Niyati"));

        run(&mut state, &store).await;

        assert_eq!(state.entities.get("transfer_successful"), Some(&json!(true)));
        assert_eq!(
            state.entities.get("recipient_name"),
            Some(&json!("Niyati Patel"))
        );
        assert_eq!(state.entities.get("new_balance"), Some(&json!(120000.00)));
        assert_eq!(state.account_balance, Some(120000.00));
        assert_eq!(state.next_action, NextAction::GenerateResponse);

        let recipient = store.get("niyati").await.unwrap();
        assert_eq!(recipient.balance, 92500.00);
    }

    #[tokio::test]
    async fn test_transfer_to_unknown_recipient_sets_entity_error() {
        let store = InMemoryAccountStore::new();
        let mut state = state_for(Some("neha"), Intent::TransferFunds);
        state.entities.insert("amount".to_string(), json!(500));
        state
            .entities
            .insert("recipient".to_string(), json!("Nobody"));

        run(&mut state, &store).await;

        assert_eq!(
            state.entities.get("error"),
            Some(&json!("Recipient not found"))
        );
        assert!(state.error.is_none());
        assert_eq!(state.next_action, NextAction::GenerateResponse);

        let sender = store.get("neha").await.unwrap();
        assert_eq!(sender.balance, 125000.00);
    }

    #[tokio::test]
    async fn test_transfer_beyond_balance_reports_current() {
        let store = InMemoryAccountStore::new();
        let mut state = state_for(Some("neha"), Intent::TransferFunds);
        state
            .entities
            .insert("amount".to_string(), json!(9000000));
        state
            .entities
            .insert("recipient".to_string(), json!("Niyati"));

        run(&mut state, &store).await;

        assert_eq!(
            state.entities.get("error"),
            Some(&json!("Insufficient balance"))
        );
        assert_eq!(
            state.entities.get("current_balance"),
            Some(&json!(125000.00))
        );
    }

    #[tokio::test]
    async fn test_unparseable_amount_is_terminal() {
        let store = InMemoryAccountStore::new();
        let mut state = state_for(Some("neha"), Intent::TransferFunds);
        state
            .entities
            .insert("recipient".to_string(), json!("Niyati"));

        run(&mut state, &store).await;

        assert_eq!(state.error, Some(TurnError::InvalidTransferAmount));
        assert_eq!(state.next_action, NextAction::Respond);

        let sender = store.get("neha").await.unwrap();
        assert_eq!(sender.balance, 125000.00);
    }

    #[tokio::test]
    async fn test_general_question_loads_account_number_only() {
        let store = InMemoryAccountStore::new();
        let mut state = state_for(Some("neha"), Intent::GeneralQuestion);

        run(&mut state, &store).await;

        assert_eq!(state.account_number.as_deref(), Some("NGB001234567890"));
        assert!(state.account_balance.is_none());
        assert!(state.transaction_history.is_empty());
        assert!(state.entities.is_empty());
    }
}
