use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::dto::validation::{validate_rounds, validate_unique_roster};

/// Súmula exactly as the backend lists it, before the client tags its kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SumulaListingDto {
    /// Backend identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Free text; may be missing from the listing.
    #[serde(default)]
    pub description: Option<String>,
    /// Referee reference; opaque to the client.
    #[serde(default)]
    pub referee: Value,
    /// Roster with the points stored so far.
    pub players_score: Vec<PlayerScoreDto>,
    /// Pairs of every round, in order.
    pub rounds: Vec<Vec<PairDto>>,
}

/// Súmula blob held in the `current_sumula` slot.
///
/// Same shape as [`SumulaListingDto`] plus the `is_imortal` flag the client
/// attaches depending on which list the súmula came from.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SumulaDto {
    /// Backend identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Required key; `null` is accepted.
    #[serde(deserialize_with = "nullable")]
    pub description: Option<String>,
    /// Referee reference; opaque to the client.
    pub referee: Value,
    /// Listed among the immortal súmulas.
    pub is_imortal: bool,
    /// Roster; player ids are unique.
    #[validate(length(min = 1), custom(function = "validate_unique_roster"))]
    pub players_score: Vec<PlayerScoreDto>,
    /// Pairs of every round; no pair is empty.
    #[validate(length(min = 1), custom(function = "validate_rounds"))]
    pub rounds: Vec<Vec<PairDto>>,
}

impl SumulaDto {
    /// Tag a listed súmula with the kind of list it was found in.
    pub fn from_listing(listing: SumulaListingDto, is_imortal: bool) -> Self {
        let SumulaListingDto {
            id,
            name,
            description,
            referee,
            players_score,
            rounds,
        } = listing;

        Self {
            id,
            name,
            description,
            referee,
            is_imortal,
            players_score,
            rounds,
        }
    }
}

/// Deserialize a key that must be present but may be `null`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::deserialize(deserializer)
}

/// Player reference as sent by the backend. Unknown attributes are kept so they
/// can be echoed back untouched on finalize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDto {
    /// Backend identifier.
    pub id: i64,
    /// Registry name. Not every payload carries it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Attributes the client does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of the súmula roster (`players_score`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerScoreDto {
    /// Player of this roster entry.
    pub player: PlayerDto,
    /// Points stored by the backend.
    #[serde(default)]
    pub points: i64,
    /// Roster attributes the client does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A pair slot inside a round; `None` on the pair means a bye.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSlotDto {
    /// Player in this slot.
    pub player: PlayerDto,
    /// Slot attributes the client does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Two slots of a pairing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairDto {
    /// First slot.
    #[serde(default)]
    pub player1: Option<PairSlotDto>,
    /// Second slot.
    #[serde(default)]
    pub player2: Option<PairSlotDto>,
}
