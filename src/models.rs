//! Core data models for the voice banking assistant

use serde::{Deserialize, Serialize};
use std::fmt;

//
// ================= Enums =================
//

/// Languages the assistant can understand and answer in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Hi,
    Gu,
}

impl Language {
    /// Parse a BCP-47-ish tag ("en", "hi", "gu"). Anything else, including
    /// "auto", is None and callers decide the fallback.
    pub fn parse(tag: &str) -> Option<Language> {
        match tag.trim().to_lowercase().as_str() {
            "en" => Some(Language::En),
            "hi" => Some(Language::Hi),
            "gu" => Some(Language::Gu),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Gu => "gu",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::En
    }
}

/// Closed intent vocabulary. The classifier never produces anything outside
/// this set; unknown model output falls back to keyword classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CheckBalance,
    ViewTransactions,
    TransferFunds,
    MakePayment,
    LoanInquiry,
    CreditInquiry,
    GeneralQuestion,
}

impl Intent {
    pub fn parse(value: &str) -> Option<Intent> {
        match value.trim() {
            "check_balance" => Some(Intent::CheckBalance),
            "view_transactions" => Some(Intent::ViewTransactions),
            "transfer_funds" => Some(Intent::TransferFunds),
            "make_payment" => Some(Intent::MakePayment),
            "loan_inquiry" => Some(Intent::LoanInquiry),
            "credit_inquiry" => Some(Intent::CreditInquiry),
            "general_question" => Some(Intent::GeneralQuestion),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::CheckBalance => "check_balance",
            Intent::ViewTransactions => "view_transactions",
            Intent::TransferFunds => "transfer_funds",
            Intent::MakePayment => "make_payment",
            Intent::LoanInquiry => "loan_inquiry",
            Intent::CreditInquiry => "credit_inquiry",
            Intent::GeneralQuestion => "general_question",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Debit,
    Credit,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Debit => "debit",
            TransactionKind::Credit => "credit",
        }
    }
}

//
// ================= Accounts =================
//

/// One ledger entry. Dates are kept as display strings because seeded rows
/// carry day precision while transfer rows carry second precision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    pub date: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub description: String,
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub number: String,
    pub expiry: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outstanding: Option<f64>,
}

/// Full user profile held by the account store. The password never
/// serializes; it exists only for the mock credential check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountProfile {
    pub user_id: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub name: String,
    pub account_number: String,
    pub balance: f64,
    pub voice_signature: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub account_type: String,
    pub ifsc_code: String,
    pub branch: String,
    pub date_opened: String,
    pub pan: String,
    pub aadhar: String,
    pub credit_limit: f64,
    pub loan_balance: f64,
    pub interest_rate: f64,
    pub cards: Vec<CardInfo>,
}

impl AccountProfile {
    /// First name used when addressing the user in replies.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

//
// ================= Turn Reply =================
//

/// Wire-level outcome of one pipeline turn, shaped for the frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReply {
    pub response: String,
    pub intent: Option<Intent>,
    pub confidence: f64,
    pub account_balance: Option<f64>,
    pub transaction_history: Vec<TransactionRecord>,
    pub entities: serde_json::Map<String, serde_json::Value>,
    pub compliance_passed: bool,
    pub error: Option<String>,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_round_trip() {
        for intent in [
            Intent::CheckBalance,
            Intent::ViewTransactions,
            Intent::TransferFunds,
            Intent::MakePayment,
            Intent::LoanInquiry,
            Intent::CreditInquiry,
            Intent::GeneralQuestion,
        ] {
            assert_eq!(Intent::parse(intent.as_str()), Some(intent));
        }
        assert_eq!(Intent::parse("greeting"), None);
    }

    #[test]
    fn test_language_parse() {
        assert_eq!(Language::parse("HI"), Some(Language::Hi));
        assert_eq!(Language::parse("auto"), None);
        assert_eq!(Language::parse("fr"), None);
    }

    #[test]
    fn test_transaction_serializes_with_type_key() {
        let record = TransactionRecord {
            date: "2025-11-22".to_string(),
            kind: TransactionKind::Credit,
            amount: 75000.0,
            description: "Salary Credit - Tech Corp".to_string(),
            balance: 125000.0,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "credit");
        assert_eq!(json["balance"], 125000.0);
    }
}
