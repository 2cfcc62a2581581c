//! Validation helpers for súmula blobs.

use std::collections::HashSet;

use validator::ValidationError;

use crate::dto::sumula::{PairDto, PlayerScoreDto};

/// Validates that every pair of every round references at least one player.
///
/// A pair may be a bye (one empty slot) but never fully empty, since scoring
/// it would produce a point entry attributed to nobody.
pub fn validate_rounds(rounds: &[Vec<PairDto>]) -> Result<(), ValidationError> {
    for (round, pairs) in rounds.iter().enumerate() {
        if let Some(pair_index) = pairs
            .iter()
            .position(|pair| pair.player1.is_none() && pair.player2.is_none())
        {
            let mut err = ValidationError::new("empty_pair");
            err.message = Some(
                format!(
                    "Pair {} of round {} has no players",
                    pair_index + 1,
                    round + 1
                )
                .into(),
            );
            return Err(err);
        }
    }

    Ok(())
}

/// Validates that no player appears twice in the súmula roster.
pub fn validate_unique_roster(roster: &[PlayerScoreDto]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for entry in roster {
        if !seen.insert(entry.player.id) {
            let mut err = ValidationError::new("duplicate_player");
            err.message = Some(format!("Player {} is listed twice", entry.player.id).into());
            return Err(err);
        }
    }

    Ok(())
}
