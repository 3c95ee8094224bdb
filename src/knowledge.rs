//! Knowledge snippet store for context augmentation
//!
//! A fixed topic-to-text table. Retrieval is a pure lookup keyed by the
//! detected intent; most intents need no snippets at all.

use serde::{Deserialize, Serialize};

use crate::models::Intent;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    InterestRates,
    CreditCards,
    TransferLimits,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snippet {
    pub topic: Topic,
    pub content: String,
}

pub struct KnowledgeBase {
    snippets: Vec<Snippet>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        let snippets = vec![
            Snippet {
                topic: Topic::InterestRates,
                content: "Current savings account interest rate is 2.5% per annum. Home loan \
                          rates start at 7.25% for qualified borrowers with flexible repayment \
                          options."
                    .to_string(),
            },
            Snippet {
                topic: Topic::CreditCards,
                content: "We offer credit cards with 0% introductory interest for 12 months, \
                          rewards programs, cashback benefits, and no annual fees for the first \
                          year."
                    .to_string(),
            },
            Snippet {
                topic: Topic::TransferLimits,
                content: "Daily NEFT/RTGS transfer limit is ₹5,00,000 for verified accounts. \
                          IMPS transfers have a limit of ₹2,00,000. International transfers may \
                          take 2-5 business days."
                    .to_string(),
            },
        ];

        Self { snippets }
    }

    /// Topics relevant to an intent. Everything else retrieves nothing.
    pub fn topics_for(intent: Intent) -> &'static [Topic] {
        match intent {
            Intent::LoanInquiry => &[Topic::InterestRates],
            Intent::CreditInquiry => &[Topic::CreditCards],
            Intent::TransferFunds => &[Topic::TransferLimits],
            _ => &[],
        }
    }

    /// Snippet bodies for an intent, in store order.
    pub fn retrieve(&self, intent: Intent) -> Vec<String> {
        let topics = Self::topics_for(intent);
        self.snippets
            .iter()
            .filter(|snippet| topics.contains(&snippet.topic))
            .map(|snippet| snippet.content.clone())
            .collect()
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_topic_mapping() {
        let kb = KnowledgeBase::new();

        let loan = kb.retrieve(Intent::LoanInquiry);
        assert_eq!(loan.len(), 1);
        assert!(loan[0].contains("7.25%"));

        let credit = kb.retrieve(Intent::CreditInquiry);
        assert_eq!(credit.len(), 1);
        assert!(credit[0].contains("0% introductory interest"));

        let transfer = kb.retrieve(Intent::TransferFunds);
        assert_eq!(transfer.len(), 1);
        assert!(transfer[0].contains("NEFT/RTGS"));
    }

    #[test]
    fn test_other_intents_retrieve_nothing() {
        let kb = KnowledgeBase::new();
        assert!(kb.retrieve(Intent::CheckBalance).is_empty());
        assert!(kb.retrieve(Intent::ViewTransactions).is_empty());
        assert!(kb.retrieve(Intent::GeneralQuestion).is_empty());
        assert!(kb.retrieve(Intent::MakePayment).is_empty());
    }
}
