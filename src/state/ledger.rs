//! Per-round point assignments and the round cursor.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::state::sumula::{Pair, PlayerId};

/// Amount a pair may be awarded in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PointValue {
    /// One point.
    One,
    /// Three points.
    Three,
}

impl PointValue {
    /// Numeric value.
    pub fn points(self) -> i64 {
        match self {
            PointValue::One => 1,
            PointValue::Three => 3,
        }
    }
}

impl TryFrom<i64> for PointValue {
    type Error = LedgerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PointValue::One),
            3 => Ok(PointValue::Three),
            other => Err(LedgerError::InvalidPointValue(other)),
        }
    }
}

/// One recorded award.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointEntry {
    /// Round the award belongs to.
    pub round: usize,
    /// First slot of the pair at award time.
    pub player1: Option<PlayerId>,
    /// Second slot of the pair at award time.
    pub player2: Option<PlayerId>,
    /// Awarded value.
    pub value: PointValue,
}

impl PointEntry {
    /// Whether this award counts towards `player`.
    pub fn references(&self, player: PlayerId) -> bool {
        self.player1 == Some(player) || self.player2 == Some(player)
    }

    /// Numeric value of the award.
    pub fn points(&self) -> i64 {
        self.value.points()
    }
}

/// Reasons a ledger mutation is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Mutation targeted a past or future round.
    #[error("round {requested} is not the current round ({current})")]
    RoundNotCurrent {
        /// Round the caller targeted.
        requested: usize,
        /// Round being scored.
        current: usize,
    },
    /// Pair index beyond the round.
    #[error("round {round} has no pair {pair_index}")]
    PairOutOfRange {
        /// Round targeted.
        round: usize,
        /// Requested pair.
        pair_index: usize,
    },
    /// Both slots of the pair are empty.
    #[error("pair {pair_index} of round {round} has no players")]
    EmptyPair {
        /// Round targeted.
        round: usize,
        /// Requested pair.
        pair_index: usize,
    },
    /// The pair already received this value in the round.
    #[error("pair {pair_index} already received {} point(s) in round {round}", .value.points())]
    AlreadyScored {
        /// Round targeted.
        round: usize,
        /// Requested pair.
        pair_index: usize,
        /// Value already used.
        value: PointValue,
    },
    /// Neither 1 nor 3.
    #[error("{0} is not a valid point value (expected 1 or 3)")]
    InvalidPointValue(i64),
    /// No round follows the current one.
    #[error("already on the last round")]
    LastRound,
}

/// Authoritative score history plus the cursor of the current round.
#[derive(Debug, Clone)]
pub struct RoundLedger {
    entries: Vec<PointEntry>,
    scored: HashMap<(usize, usize), BTreeSet<PointValue>>,
    current_round: usize,
    total_rounds: usize,
}

impl RoundLedger {
    /// Ledger for a súmula of `total_rounds` rounds, positioned on the first.
    pub fn new(total_rounds: usize) -> Self {
        Self {
            entries: Vec::new(),
            scored: HashMap::new(),
            current_round: 0,
            total_rounds,
        }
    }

    /// Every award, in insertion order.
    pub fn entries(&self) -> &[PointEntry] {
        &self.entries
    }

    /// Zero-based index of the round being scored.
    pub fn current_round(&self) -> usize {
        self.current_round
    }

    /// Number of rounds of the súmula.
    pub fn total_rounds(&self) -> usize {
        self.total_rounds
    }

    /// Whether the cursor is on the last round.
    pub fn is_last_round(&self) -> bool {
        self.current_round + 1 >= self.total_rounds
    }

    /// Append an award for `pair`, located at `pair_index` in `pairs_in_round`.
    ///
    /// Each value may be recorded once per pair per round until the round is
    /// cleared.
    pub fn record(
        &mut self,
        round: usize,
        value: PointValue,
        pairs_in_round: &[Pair],
        pair_index: usize,
    ) -> Result<PointEntry, LedgerError> {
        if round != self.current_round {
            return Err(LedgerError::RoundNotCurrent {
                requested: round,
                current: self.current_round,
            });
        }

        let pair = pairs_in_round
            .get(pair_index)
            .ok_or(LedgerError::PairOutOfRange { round, pair_index })?;
        if pair.is_empty() {
            return Err(LedgerError::EmptyPair { round, pair_index });
        }

        if self.is_scored(round, pair_index, value) {
            return Err(LedgerError::AlreadyScored {
                round,
                pair_index,
                value,
            });
        }

        let (player1, player2) = pair.player_ids();
        let entry = PointEntry {
            round,
            player1,
            player2,
            value,
        };
        self.entries.push(entry);
        self.scored
            .entry((round, pair_index))
            .or_default()
            .insert(value);

        Ok(entry)
    }

    /// Whether `value` was awarded to the pair in `round`.
    pub fn is_scored(&self, round: usize, pair_index: usize, value: PointValue) -> bool {
        self.scored
            .get(&(round, pair_index))
            .is_some_and(|values| values.contains(&value))
    }

    /// Sum of the values already awarded to a pair in a round.
    pub fn pair_total(&self, round: usize, pair_index: usize) -> i64 {
        self.scored
            .get(&(round, pair_index))
            .map(|values| values.iter().map(|value| value.points()).sum())
            .unwrap_or(0)
    }

    /// Drop every award of `round` and its already-scored markers.
    /// Returns the number of entries removed.
    pub fn clear_round(&mut self, round: usize) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.round != round);
        self.clear_markers(round);
        before - self.entries.len()
    }

    /// Move the cursor to the next round, which starts with no markers.
    pub fn advance(&mut self) -> Result<usize, LedgerError> {
        if self.is_last_round() {
            return Err(LedgerError::LastRound);
        }
        self.current_round += 1;
        self.clear_markers(self.current_round);
        Ok(self.current_round)
    }

    fn clear_markers(&mut self, round: usize) {
        self.scored.retain(|(marked_round, _), _| *marked_round != round);
    }
}
