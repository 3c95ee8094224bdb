//! Signal router
//!
//! Maps each stage's control signal to the next stage. Routing is
//! signal-based, not positional: a stage never names its successor
//! directly, it only announces what should happen next.

use crate::pipeline::state::{NextAction, Stage};

/// Resolve the next stage for a signal; `None` terminates the turn.
pub fn route(action: NextAction) -> Option<Stage> {
    match action {
        NextAction::UnderstandIntent => Some(Stage::Intent),
        NextAction::RetrieveContext => Some(Stage::Retrieval),
        NextAction::ExecuteBanking => Some(Stage::Banking),
        NextAction::GenerateResponse => Some(Stage::Dialog),
        NextAction::Respond => Some(Stage::Dialog),
        NextAction::End => None,
    }
}
