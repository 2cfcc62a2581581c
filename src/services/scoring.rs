//! Score aggregation over the point ledger.

use crate::state::{
    ledger::PointEntry,
    sumula::{PlayerId, RosterEntry},
};

/// Cumulative points of one roster player. Always derived, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerScore {
    /// Roster entry the points belong to.
    pub entry: RosterEntry,
    /// Sum of every award referencing the player.
    pub points: i64,
}

impl PlayerScore {
    /// Identifier of the scored player.
    pub fn player_id(&self) -> PlayerId {
        self.entry.player.id
    }
}

/// Top three finishing positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medal {
    /// First place.
    Gold,
    /// Second place.
    Silver,
    /// Third place.
    Bronze,
}

/// A score placed in the final ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    /// 1-based position.
    pub position: usize,
    /// Score at this position.
    pub score: PlayerScore,
}

impl Standing {
    /// Podium medal, if any.
    pub fn medal(&self) -> Option<Medal> {
        match self.position {
            1 => Some(Medal::Gold),
            2 => Some(Medal::Silver),
            3 => Some(Medal::Bronze),
            _ => None,
        }
    }
}

/// One snapshot per roster player, in roster order, summing every entry that
/// references the player in either slot.
pub fn compute_scores(entries: &[PointEntry], roster: &[RosterEntry]) -> Vec<PlayerScore> {
    sum_scores(entries.iter(), roster)
}

/// Same as [`compute_scores`] restricted to the entries of one round.
pub fn round_scores(
    entries: &[PointEntry],
    roster: &[RosterEntry],
    round: usize,
) -> Vec<PlayerScore> {
    sum_scores(entries.iter().filter(|entry| entry.round == round), roster)
}

fn sum_scores<'a>(
    entries: impl Iterator<Item = &'a PointEntry> + Clone,
    roster: &[RosterEntry],
) -> Vec<PlayerScore> {
    roster
        .iter()
        .map(|entry| {
            let id = entry.player.id;
            let points = entries
                .clone()
                .filter(|point| point.references(id))
                .map(PointEntry::points)
                .sum();
            PlayerScore {
                entry: entry.clone(),
                points,
            }
        })
        .collect()
}

/// Sort by descending points; ties keep roster order.
pub fn rank(mut scores: Vec<PlayerScore>) -> Vec<Standing> {
    scores.sort_by(|a, b| b.points.cmp(&a.points));
    scores
        .into_iter()
        .enumerate()
        .map(|(index, score)| Standing {
            position: index + 1,
            score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use super::*;
    use crate::state::{ledger::PointValue, sumula::Player};

    fn roster(ids: &[PlayerId]) -> Vec<RosterEntry> {
        ids.iter()
            .map(|&id| RosterEntry {
                player: Player {
                    id,
                    full_name: Some(format!("PLAYER {id}")),
                    attributes: Map::new(),
                },
                attributes: Map::new(),
            })
            .collect()
    }

    fn entry(
        round: usize,
        p1: Option<PlayerId>,
        p2: Option<PlayerId>,
        value: PointValue,
    ) -> PointEntry {
        PointEntry {
            round,
            player1: p1,
            player2: p2,
            value,
        }
    }

    fn points(scores: &[PlayerScore]) -> Vec<(PlayerId, i64)> {
        scores.iter().map(|s| (s.player_id(), s.points)).collect()
    }

    fn ledger() -> Vec<PointEntry> {
        vec![
            entry(0, Some(1), Some(2), PointValue::One),
            entry(0, Some(3), None, PointValue::Three),
            entry(1, Some(1), Some(3), PointValue::Three),
            entry(1, None, Some(2), PointValue::One),
            entry(1, Some(1), Some(3), PointValue::One),
        ]
    }

    #[test]
    fn sums_both_slots_across_rounds() {
        let scores = compute_scores(&ledger(), &roster(&[1, 2, 3, 4]));
        assert_eq!(points(&scores), vec![(1, 5), (2, 2), (3, 7), (4, 0)]);
    }

    #[test]
    fn idempotent_and_order_independent() {
        let roster = roster(&[1, 2, 3]);
        let entries = ledger();
        let first = compute_scores(&entries, &roster);
        let second = compute_scores(&entries, &roster);
        assert_eq!(first, second);

        let mut reversed = entries.clone();
        reversed.reverse();
        assert_eq!(compute_scores(&reversed, &roster), first);

        let mut rotated = entries;
        rotated.rotate_left(2);
        assert_eq!(compute_scores(&rotated, &roster), first);
    }

    #[test]
    fn round_scores_only_count_that_round() {
        let scores = round_scores(&ledger(), &roster(&[1, 2, 3]), 0);
        assert_eq!(points(&scores), vec![(1, 1), (2, 1), (3, 3)]);
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let scores = compute_scores(&ledger(), &roster(&[4, 2, 1, 3, 5]));
        let standings = rank(scores);

        let order: Vec<_> = standings.iter().map(|s| s.score.player_id()).collect();
        assert_eq!(order, vec![3, 1, 2, 4, 5]);
        assert_eq!(standings[0].medal(), Some(Medal::Gold));
        assert_eq!(standings[2].medal(), Some(Medal::Bronze));
        assert_eq!(standings[3].medal(), None);
        assert_eq!(standings[4].position, 5);
    }
}
