pub mod entity;
pub mod feedback;
pub mod knowledge;

pub use entity::{Entity, EntityError, EntityId};
pub use feedback::{Feedback, FeedbackCode, MAX_CLOSENESS};
pub use knowledge::Knowledge;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RankedGuess {
    pub id: EntityId,
    pub entropy: f64,
}

impl RankedGuess {
    pub fn new(id: EntityId, entropy: f64) -> Self {
        RankedGuess { id, entropy }
    }
}
