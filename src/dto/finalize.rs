use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dto::sumula::PlayerScoreDto;

/// Body of the `PUT /api/sumula/{classificatoria|imortal}/` finalize call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizeRequest {
    /// Súmula identifier.
    pub id: i64,
    /// Súmula name, echoed back.
    pub name: String,
    /// Súmula description, echoed back.
    pub description: Option<String>,
    /// Referee reference, echoed back.
    pub referee: Value,
    /// Every roster entry with its computed points.
    pub players_score: Vec<PlayerScoreDto>,
    /// Players that do not advance. The backend names this field after the
    /// immortal stage; for immortal súmulas it always lists the whole roster.
    pub imortal_players: Vec<PlayerRefDto>,
}

/// Bare player reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRefDto {
    /// Player identifier.
    pub id: i64,
}
