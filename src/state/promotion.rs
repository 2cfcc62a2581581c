use indexmap::IndexSet;
use thiserror::Error;

use crate::state::sumula::{PlayerId, PromotionPolicy};

/// Refused promotion change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromotionError {
    /// The player is not on the roster.
    #[error("player {0} is not part of this súmula")]
    UnknownPlayer(PlayerId),
}

/// Players the referee marked to advance, tracked against the roster.
///
/// Starts with nobody selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionSet {
    roster: IndexSet<PlayerId>,
    selected: IndexSet<PlayerId>,
}

impl PromotionSet {
    /// Empty selection over `roster`.
    pub fn open(roster: impl IntoIterator<Item = PlayerId>) -> Self {
        Self {
            roster: roster.into_iter().collect(),
            selected: IndexSet::new(),
        }
    }

    /// Mark or unmark one player.
    pub fn set(&mut self, player: PlayerId, promoted: bool) -> Result<(), PromotionError> {
        if !self.roster.contains(&player) {
            return Err(PromotionError::UnknownPlayer(player));
        }

        if promoted {
            self.selected.insert(player);
        } else {
            self.selected.shift_remove(&player);
        }
        Ok(())
    }

    /// Whether `player` is selected.
    pub fn is_promoted(&self, player: PlayerId) -> bool {
        self.selected.contains(&player)
    }

    /// Selected players, in selection order.
    pub fn promoted(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.selected.iter().copied()
    }

    /// Roster players reported as not advancing, in roster order.
    pub fn removed(&self, policy: PromotionPolicy) -> Vec<PlayerId> {
        match policy {
            PromotionPolicy::Selected => self
                .roster
                .iter()
                .filter(|player| !self.selected.contains(*player))
                .copied()
                .collect(),
            PromotionPolicy::KeepAll => self.roster.iter().copied().collect(),
        }
    }
}
