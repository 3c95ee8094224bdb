//! Account store: user profiles, transaction ledgers, and the atomic
//! transfer primitive
//!
//! The store is an injectable trait so pipeline stages never touch shared
//! globals. The in-memory implementation keeps profiles and ledgers behind
//! one RwLock; a transfer takes the write guard once, so its check-then-
//! mutate sequence is a single critical section.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::models::{AccountProfile, CardInfo, TransactionKind, TransactionRecord};

/// Why a transfer was rejected. Display strings are part of the reply
/// contract; the dialog templates match on them verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    #[error("Recipient not found")]
    RecipientNotFound,

    #[error("Invalid transfer amount")]
    InvalidAmount,

    #[error("Insufficient balance")]
    InsufficientBalance { balance: f64 },

    #[error("Sender not found")]
    SenderNotFound,
}

/// Outcome of a successful transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub amount: f64,
    pub recipient_name: String,
    pub recipient_account: String,
    pub new_balance: f64,
    pub timestamp: String,
}

//
// ================= Store Trait =================
//

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Look up a profile by user id (case-insensitive).
    async fn get(&self, user_id: &str) -> Option<AccountProfile>;

    /// Mock credential check for the login endpoint.
    async fn authenticate(&self, user_id: &str, password: &str) -> Option<AccountProfile>;

    /// Full ledger, newest first.
    async fn transactions(&self, user_id: &str) -> Vec<TransactionRecord>;

    /// The `limit` newest ledger entries.
    async fn recent_transactions(&self, user_id: &str, limit: usize) -> Vec<TransactionRecord>;

    /// Move `amount` from sender to a recipient named by free text.
    ///
    /// Resolution, validation, and the double mutation happen atomically:
    /// a failed check leaves balances and ledgers exactly as they were.
    async fn transfer(
        &self,
        sender_id: &str,
        recipient: &str,
        amount: f64,
    ) -> std::result::Result<TransferReceipt, TransferError>;
}

//
// ================= In-Memory Store =================
//

struct Ledger {
    profiles: HashMap<String, AccountProfile>,
    transactions: HashMap<String, Vec<TransactionRecord>>,
}

/// Process-lifetime store seeded with the demo users. Reseeded on restart.
pub struct InMemoryAccountStore {
    inner: Arc<RwLock<Ledger>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        let mut profiles = HashMap::new();
        let mut transactions = HashMap::new();

        for profile in seed_profiles() {
            let key = profile.user_id.clone();
            transactions.insert(key.clone(), seed_transactions(&key));
            profiles.insert(key, profile);
        }

        info!("Account store seeded with {} users", profiles.len());

        Self {
            inner: Arc::new(RwLock::new(Ledger {
                profiles,
                transactions,
            })),
        }
    }

    fn normalize(user_id: &str) -> String {
        user_id.trim().to_lowercase()
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get(&self, user_id: &str) -> Option<AccountProfile> {
        let ledger = self.inner.read().await;
        ledger.profiles.get(&Self::normalize(user_id)).cloned()
    }

    async fn authenticate(&self, user_id: &str, password: &str) -> Option<AccountProfile> {
        let ledger = self.inner.read().await;
        ledger
            .profiles
            .get(&Self::normalize(user_id))
            .filter(|profile| profile.password == password)
            .cloned()
    }

    async fn transactions(&self, user_id: &str) -> Vec<TransactionRecord> {
        let ledger = self.inner.read().await;
        ledger
            .transactions
            .get(&Self::normalize(user_id))
            .cloned()
            .unwrap_or_default()
    }

    async fn recent_transactions(&self, user_id: &str, limit: usize) -> Vec<TransactionRecord> {
        let ledger = self.inner.read().await;
        ledger
            .transactions
            .get(&Self::normalize(user_id))
            .map(|records| records.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    async fn transfer(
        &self,
        sender_id: &str,
        recipient: &str,
        amount: f64,
    ) -> std::result::Result<TransferReceipt, TransferError> {
        let sender_key = Self::normalize(sender_id);
        let mut ledger = self.inner.write().await;

        if !ledger.profiles.contains_key(&sender_key) {
            return Err(TransferError::SenderNotFound);
        }

        // Resolve recipient by full name, first name, or user id, never the
        // sender themselves.
        let query = recipient.trim().to_lowercase();
        let recipient_key = ledger
            .profiles
            .values()
            .find(|profile| {
                profile.user_id != sender_key
                    && (profile.name.to_lowercase() == query
                        || profile.first_name().to_lowercase() == query
                        || profile.user_id.to_lowercase() == query)
            })
            .map(|profile| profile.user_id.clone())
            .ok_or(TransferError::RecipientNotFound)?;

        if amount <= 0.0 {
            return Err(TransferError::InvalidAmount);
        }

        let sender_balance = ledger.profiles[&sender_key].balance;
        if sender_balance < amount {
            return Err(TransferError::InsufficientBalance {
                balance: sender_balance,
            });
        }

        // Checks passed; both sides mutate under the same write guard.
        let sender_name = ledger.profiles[&sender_key].name.clone();
        let recipient_name = ledger.profiles[&recipient_key].name.clone();
        let recipient_account = ledger.profiles[&recipient_key].account_number.clone();
        let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let new_balance = sender_balance - amount;
        if let Some(sender) = ledger.profiles.get_mut(&sender_key) {
            sender.balance = new_balance;
        }
        let recipient_balance = ledger.profiles[&recipient_key].balance + amount;
        if let Some(receiver) = ledger.profiles.get_mut(&recipient_key) {
            receiver.balance = recipient_balance;
        }

        ledger
            .transactions
            .entry(sender_key.clone())
            .or_default()
            .insert(
                0,
                TransactionRecord {
                    date: timestamp.clone(),
                    kind: TransactionKind::Debit,
                    amount: -amount,
                    description: format!("Transfer to {}", recipient_name),
                    balance: new_balance,
                },
            );
        ledger
            .transactions
            .entry(recipient_key.clone())
            .or_default()
            .insert(
                0,
                TransactionRecord {
                    date: timestamp.clone(),
                    kind: TransactionKind::Credit,
                    amount,
                    description: format!("Transfer from {}", sender_name),
                    balance: recipient_balance,
                },
            );

        info!(
            sender = %sender_key,
            recipient = %recipient_key,
            amount,
            new_balance,
            "Transfer completed"
        );

        Ok(TransferReceipt {
            amount,
            recipient_name,
            recipient_account,
            new_balance,
            timestamp,
        })
    }
}

//
// ================= Seed Data =================
//

fn card(kind: &str, number: &str, expiry: &str) -> CardInfo {
    CardInfo {
        kind: kind.to_string(),
        number: number.to_string(),
        expiry: expiry.to_string(),
        limit: None,
        outstanding: None,
    }
}

fn credit_card(kind: &str, number: &str, expiry: &str, limit: f64, outstanding: f64) -> CardInfo {
    CardInfo {
        kind: kind.to_string(),
        number: number.to_string(),
        expiry: expiry.to_string(),
        limit: Some(limit),
        outstanding: Some(outstanding),
    }
}

fn seed_profiles() -> Vec<AccountProfile> {
    vec![
        AccountProfile {
            user_id: "neha".to_string(),
            password: "neha123".to_string(),
            name: "Neha Sharma".to_string(),
            account_number: "NGB001234567890".to_string(),
            balance: 125000.00,
            voice_signature: "verified".to_string(),
            phone: "+91-9876543210".to_string(),
            email: "neha.sharma@email.com".to_string(),
            address: "101, Prestige Apartments, Koramangala, Bangalore - 560034".to_string(),
            account_type: "Savings Account".to_string(),
            ifsc_code: "NXGB0001234".to_string(),
            branch: "Koramangala Branch, Bangalore".to_string(),
            date_opened: "2020-03-15".to_string(),
            pan: "ABCPN1234D".to_string(),
            aadhar: "****-****-5678".to_string(),
            credit_limit: 200000.00,
            loan_balance: 180000.00,
            interest_rate: 7.5,
            cards: vec![
                card("Debit Card", "****-****-****-1234", "12/2026"),
                credit_card(
                    "Credit Card - Next Gen SimplyCLICK",
                    "****-****-****-5678",
                    "08/2027",
                    200000.0,
                    15000.0,
                ),
            ],
        },
        AccountProfile {
            user_id: "niyati".to_string(),
            password: "niyati123".to_string(),
            name: "Niyati Patel".to_string(),
            account_number: "NGB009876543210".to_string(),
            balance: 87500.00,
            voice_signature: "verified".to_string(),
            phone: "+91-9123456789".to_string(),
            email: "niyati.patel@email.com".to_string(),
            address: "204, Sunrise Heights, Satellite Road, Ahmedabad - 380015".to_string(),
            account_type: "Savings Account".to_string(),
            ifsc_code: "NXGB0009876".to_string(),
            branch: "Satellite Branch, Ahmedabad".to_string(),
            date_opened: "2019-07-22".to_string(),
            pan: "DEFPN5678K".to_string(),
            aadhar: "****-****-9012".to_string(),
            credit_limit: 150000.00,
            loan_balance: 4120000.00,
            interest_rate: 8.25,
            cards: vec![
                card("Debit Card", "****-****-****-9012", "06/2027"),
                credit_card(
                    "Credit Card - Next Gen Card PRIME",
                    "****-****-****-3456",
                    "03/2028",
                    150000.0,
                    8500.0,
                ),
            ],
        },
    ]
}

fn record(
    date: &str,
    kind: TransactionKind,
    amount: f64,
    description: &str,
    balance: f64,
) -> TransactionRecord {
    TransactionRecord {
        date: date.to_string(),
        kind,
        amount,
        description: description.to_string(),
        balance,
    }
}

fn seed_transactions(user_id: &str) -> Vec<TransactionRecord> {
    use TransactionKind::{Credit, Debit};

    match user_id {
        "neha" => vec![
            record("2025-11-22", Credit, 75000.00, "Salary Credit - Tech Corp", 125000.00),
            record("2025-11-20", Debit, 12500.00, "Personal Loan EMI", 50000.00),
            record("2025-11-18", Debit, 3500.00, "Amazon - Electronics", 62500.00),
            record("2025-11-15", Credit, 5000.00, "IMPS Transfer from Mother", 66000.00),
            record("2025-11-12", Debit, 15000.00, "Credit Card Payment", 61000.00),
            record("2025-11-10", Debit, 8000.00, "Big Bazaar - Groceries", 76000.00),
            record("2025-11-08", Debit, 2500.00, "BESCOM Electricity Bill", 84000.00),
            record("2025-11-05", Debit, 4500.00, "Truffles Restaurant", 86500.00),
            record("2025-11-03", Credit, 12000.00, "Freelance Project Payment", 91000.00),
            record("2025-11-01", Debit, 18000.00, "Monthly Rent", 79000.00),
        ],
        "niyati" => vec![
            record("2025-11-22", Credit, 95000.00, "Salary Credit - InfoTech Ltd", 87500.00),
            record("2025-11-21", Debit, 35000.00, "Home Loan EMI", -7500.00),
            record("2025-11-20", Debit, 18000.00, "Car Loan EMI", 27500.00),
            record("2025-11-18", Debit, 6500.00, "Delhi Public School Fees", 63500.00),
            record("2025-11-16", Debit, 8500.00, "Credit Card Payment", 70000.00),
            record("2025-11-14", Debit, 12000.00, "Reliance Fresh - Monthly Grocery", 78500.00),
            record("2025-11-12", Credit, 15000.00, "Mutual Fund Dividend", 90500.00),
            record("2025-11-10", Debit, 3500.00, "Adani Gas Bill", 75500.00),
            record("2025-11-08", Debit, 5000.00, "Apollo Pharmacy", 79000.00),
            record("2025-11-05", Debit, 25000.00, "LIC Premium Payment", 84000.00),
        ],
        _ => Vec::new(),
    }
}
