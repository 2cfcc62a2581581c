use tracing::{error, info, warn};

use crate::{
    dao::{
        api::SumulaApi,
        local_store::{CURRENT_SUMULA_SLOT, LocalStore},
    },
    dto::finalize::{FinalizeRequest, PlayerRefDto},
    error::SessionError,
    services::scoring::PlayerScore,
    state::{SumulaSession, promotion::PromotionSet, sumula::Sumula},
};

/// Where the client goes once a súmula is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Back to the list of active súmulas.
    SumulaList,
}

/// Assemble the finalize payload from the súmula, its freshly computed scores
/// and the referee's promotion selection.
pub fn build_finalize_request(
    sumula: &Sumula,
    scores: &[PlayerScore],
    promotion: &PromotionSet,
) -> FinalizeRequest {
    let players_score = scores
        .iter()
        .map(|score| score.entry.to_dto(score.points))
        .collect();
    let imortal_players = promotion
        .removed(sumula.kind.promotion_policy())
        .into_iter()
        .map(|id| PlayerRefDto { id })
        .collect();

    FinalizeRequest {
        id: sumula.id,
        name: sumula.name.clone(),
        description: sumula.description.clone(),
        referee: sumula.referee.clone(),
        players_score,
        imortal_players,
    }
}

/// Send the tally of `session` to the backend.
///
/// On success the session is terminal and the persisted slot is cleared. On any
/// failure the session returns to its review untouched so the referee can retry.
pub async fn submit_session(
    session: &mut SumulaSession,
    api: &dyn SumulaApi,
    store: &dyn LocalStore,
    event_id: i64,
) -> Result<Navigation, SessionError> {
    let pending = session.begin_submission()?;
    let sumula_id = pending.request.id;

    if let Err(err) = api.finalize(event_id, pending.kind, pending.request).await {
        error!(sumula_id, error = %err, "failed to finalize súmula");
        session.abort_submission(pending.plan_id)?;
        return Err(SessionError::Submission(err));
    }

    session.complete_submission(pending.plan_id)?;
    if let Err(err) = store.remove(CURRENT_SUMULA_SLOT) {
        warn!(sumula_id, error = %err, "failed to clear the current súmula slot");
    }

    info!(sumula_id, "súmula submitted");
    Ok(Navigation::SumulaList)
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value, json};

    use super::*;
    use crate::{
        services::scoring::compute_scores,
        state::{
            ledger::{PointEntry, PointValue},
            sumula::{Player, RosterEntry, SumulaKind},
        },
    };

    fn sumula(kind: SumulaKind) -> Sumula {
        let roster = [(10, "ANA"), (20, "BRUNO"), (30, "CARLA")]
            .into_iter()
            .map(|(id, name)| {
                let mut attributes = Map::new();
                attributes.insert("seed".into(), json!(id / 10));
                RosterEntry {
                    player: Player {
                        id,
                        full_name: Some(name.into()),
                        attributes: Map::new(),
                    },
                    attributes,
                }
            })
            .collect();

        Sumula {
            id: 4,
            name: "Final A".into(),
            description: Some("turma 1".into()),
            referee: json!([{ "id": 2 }]),
            kind,
            roster,
            rounds: Vec::new(),
        }
    }

    fn entries() -> Vec<PointEntry> {
        vec![
            PointEntry {
                round: 0,
                player1: Some(10),
                player2: Some(20),
                value: PointValue::Three,
            },
            PointEntry {
                round: 1,
                player1: None,
                player2: Some(30),
                value: PointValue::One,
            },
        ]
    }

    #[test]
    fn qualifying_payload_lists_unselected_players() {
        let sumula = sumula(SumulaKind::Qualifying);
        let scores = compute_scores(&entries(), &sumula.roster);
        let mut promotion = PromotionSet::open(sumula.roster_ids());
        promotion.set(20, true).unwrap();

        let request = build_finalize_request(&sumula, &scores, &promotion);

        let points: Vec<_> = request
            .players_score
            .iter()
            .map(|entry| (entry.player.id, entry.points))
            .collect();
        assert_eq!(points, vec![(10, 3), (20, 3), (30, 1)]);
        assert_eq!(
            request.imortal_players,
            vec![PlayerRefDto { id: 10 }, PlayerRefDto { id: 30 }]
        );
        assert_eq!(request.players_score[2].extra.get("seed"), Some(&json!(3)));
        assert_eq!(request.referee, json!([{ "id": 2 }]));
    }

    #[test]
    fn immortal_payload_lists_whole_roster() {
        let sumula = sumula(SumulaKind::Immortal);
        let scores = compute_scores(&entries(), &sumula.roster);
        let mut promotion = PromotionSet::open(sumula.roster_ids());
        promotion.set(10, true).unwrap();

        let request = build_finalize_request(&sumula, &scores, &promotion);
        let removed: Vec<_> = request.imortal_players.iter().map(|p| p.id).collect();
        assert_eq!(removed, vec![10, 20, 30]);
    }

    #[test]
    fn payload_serializes_wire_names() {
        let sumula = sumula(SumulaKind::Qualifying);
        let scores = compute_scores(&[], &sumula.roster);
        let promotion = PromotionSet::open(sumula.roster_ids());

        let value = serde_json::to_value(build_finalize_request(&sumula, &scores, &promotion))
            .unwrap();
        assert_eq!(value["id"], json!(4));
        assert_eq!(value["description"], json!("turma 1"));
        assert_eq!(value["players_score"][0]["points"], json!(0));
        assert_eq!(value["players_score"][0]["player"]["id"], json!(10));
        assert_eq!(value["imortal_players"].as_array().map(Vec::len), Some(3));
        assert!(matches!(value["referee"], Value::Array(_)));
    }
}
