//! Multilingual Voice Banking Assistant
//!
//! A production-grade conversational banking assistant that:
//! - Accepts typed text or spoken audio in English, Hindi, and Gujarati
//! - Classifies banking intent with an LLM, falling back to keywords
//! - Grounds replies in account data and product knowledge snippets
//! - Executes balance, transaction, loan, credit, and transfer requests
//! - Degrades gracefully when the LLM, ASR, or database is unavailable
//!
//! TURN PIPELINE:
//! INPUT → SPEECH → INTENT → RETRIEVAL → BANKING → DIALOG → REPLY

pub mod accounts;
pub mod api;
pub mod asr;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod session;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use pipeline::{Pipeline, TurnInput};
