use serde_json::{Map, Value};

use crate::dto::sumula::{PairDto, PairSlotDto, PlayerDto, PlayerScoreDto, SumulaDto};

/// Backend identifier of a player.
pub type PlayerId = i64;

/// Which stage a súmula belongs to. Resolved once when the session is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SumulaKind {
    /// Qualifying súmula: the referee picks who advances.
    Qualifying,
    /// Immortal súmula: every scored player is kept.
    Immortal,
}

/// How the finalize payload reports players that do not advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionPolicy {
    /// Report every roster player the referee did not select.
    Selected,
    /// Ignore the selection and report the whole roster.
    KeepAll,
}

impl SumulaKind {
    /// Kind from the backend `is_imortal` flag.
    pub fn from_flag(is_imortal: bool) -> Self {
        if is_imortal {
            SumulaKind::Immortal
        } else {
            SumulaKind::Qualifying
        }
    }

    /// Whether this is an immortal súmula.
    pub fn is_immortal(self) -> bool {
        matches!(self, SumulaKind::Immortal)
    }

    /// Path segment of the finalize endpoint for this kind.
    pub fn endpoint_segment(self) -> &'static str {
        match self {
            SumulaKind::Qualifying => "classificatoria",
            SumulaKind::Immortal => "imortal",
        }
    }

    /// Who is reported as not advancing.
    pub fn promotion_policy(self) -> PromotionPolicy {
        match self {
            SumulaKind::Qualifying => PromotionPolicy::Selected,
            SumulaKind::Immortal => PromotionPolicy::KeepAll,
        }
    }
}

/// Player as known by the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// Backend identifier.
    pub id: PlayerId,
    /// Full name, usually upper-cased by the university registry. Absent when
    /// the backend did not send one.
    pub full_name: Option<String>,
    /// Every other attribute the backend sent, echoed back on finalize.
    pub attributes: Map<String, Value>,
}

impl Player {
    /// Full name with each word capitalized, empty when unknown.
    pub fn display_name(&self) -> String {
        self.full_name
            .as_deref()
            .unwrap_or_default()
            .split(' ')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first
                        .to_uppercase()
                        .chain(chars.flat_map(char::to_lowercase))
                        .collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One player of the súmula roster.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    /// Player of the entry.
    pub player: Player,
    /// Roster-level attributes other than `points`.
    pub attributes: Map<String, Value>,
}

/// A scoring pair. Either slot may be empty (bye), never both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pair {
    /// First slot.
    pub player1: Option<Player>,
    /// Second slot.
    pub player2: Option<Player>,
}

impl Pair {
    /// Identifiers of the occupied slots.
    pub fn player_ids(&self) -> (Option<PlayerId>, Option<PlayerId>) {
        (
            self.player1.as_ref().map(|player| player.id),
            self.player2.as_ref().map(|player| player.id),
        )
    }

    /// Both slots empty.
    pub fn is_empty(&self) -> bool {
        self.player1.is_none() && self.player2.is_none()
    }

    /// Exactly one slot filled.
    pub fn is_bye(&self) -> bool {
        self.player1.is_some() != self.player2.is_some()
    }
}

/// Ordered pairs of one round.
pub type Round = Vec<Pair>;

/// Hydrated súmula. Immutable for the lifetime of a scoring session.
#[derive(Debug, Clone, PartialEq)]
pub struct Sumula {
    /// Backend identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Free text, echoed back on finalize.
    pub description: Option<String>,
    /// Referee reference as sent by the backend; opaque to the client.
    pub referee: Value,
    /// Stage, fixed at load time.
    pub kind: SumulaKind,
    /// Roster in backend order.
    pub roster: Vec<RosterEntry>,
    /// Pairs of every round.
    pub rounds: Vec<Round>,
}

impl Sumula {
    /// Pairs of round `index`.
    pub fn round(&self, index: usize) -> Option<&Round> {
        self.rounds.get(index)
    }

    /// Roster identifiers, in roster order.
    pub fn roster_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.roster.iter().map(|entry| entry.player.id)
    }
}

impl From<PlayerDto> for Player {
    fn from(value: PlayerDto) -> Self {
        Self {
            id: value.id,
            full_name: value.full_name,
            attributes: value.extra,
        }
    }
}

impl From<Player> for PlayerDto {
    fn from(value: Player) -> Self {
        Self {
            id: value.id,
            full_name: value.full_name,
            extra: value.attributes,
        }
    }
}

impl From<PlayerScoreDto> for RosterEntry {
    fn from(value: PlayerScoreDto) -> Self {
        Self {
            player: value.player.into(),
            attributes: value.extra,
        }
    }
}

impl RosterEntry {
    /// Wire representation of this entry carrying `points`.
    pub fn to_dto(&self, points: i64) -> PlayerScoreDto {
        PlayerScoreDto {
            player: self.player.clone().into(),
            points,
            extra: self.attributes.clone(),
        }
    }
}

impl From<PairSlotDto> for Player {
    fn from(value: PairSlotDto) -> Self {
        value.player.into()
    }
}

impl From<PairDto> for Pair {
    fn from(value: PairDto) -> Self {
        Self {
            player1: value.player1.map(Into::into),
            player2: value.player2.map(Into::into),
        }
    }
}

impl From<SumulaDto> for Sumula {
    fn from(value: SumulaDto) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            referee: value.referee,
            kind: SumulaKind::from_flag(value.is_imortal),
            roster: value.players_score.into_iter().map(Into::into).collect(),
            rounds: value
                .rounds
                .into_iter()
                .map(|round| round.into_iter().map(Into::into).collect())
                .collect(),
        }
    }
}
