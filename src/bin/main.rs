use std::sync::Arc;
use tracing::info;
use voice_banking_assistant::{
    accounts::{AccountStore, InMemoryAccountStore},
    models::Language,
    pipeline::{Pipeline, TurnInput},
    session::SessionStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("Voice Banking Assistant starting");

    // No transcriber and no generator: keyword classification plus
    // template replies, fully deterministic for a local walkthrough.
    let accounts = Arc::new(InMemoryAccountStore::new()) as Arc<dyn AccountStore>;
    let pipeline = Pipeline::new(None, None, accounts.clone(), SessionStore::in_memory());

    let turns = [
        ("neha", "What is my balance?", Language::En),
        ("neha", "Show my recent transactions", Language::En),
        ("neha", "Transfer ₹5000 to Niyati", Language::En),
        ("niyati", "मेरा लोन बैलेंस बताओ", Language::Hi),
    ];

    for (user, text, language) in turns {
        let input = TurnInput {
            user_id: Some(user.to_string()),
            text: Some(text.to_string()),
            language: Some(language),
            ..Default::default()
        };

        info!(user_id = user, text = text, "Running turn");

        match pipeline.run_turn(input).await {
            Ok(reply) => {
                println!("\n=== TURN: {} ===", text);
                println!(
                    "Intent: {} (confidence {:.2})",
                    reply.intent.map(|i| i.as_str()).unwrap_or("none"),
                    reply.confidence
                );
                println!("Reply: {}", reply.response);
            }
            Err(e) => {
                eprintln!("Turn failed: {}", e);
                return Err(Box::new(e) as Box<dyn std::error::Error>);
            }
        }
    }

    println!("\n=== FINAL BALANCES ===");
    for user in ["neha", "niyati"] {
        if let Some(profile) = accounts.get(user).await {
            println!("{}: ₹{:.2}", profile.name, profile.balance);
        }
    }

    Ok(())
}
