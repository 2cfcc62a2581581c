use tracing::{info, warn};
use validator::Validate;

use crate::{
    dao::local_store::{CURRENT_SUMULA_SLOT, LocalStore},
    dto::sumula::SumulaDto,
    state::{SumulaSession, sumula::Sumula},
};

/// Why the client must go back to the súmula list instead of scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectReason {
    /// Nothing was claimed.
    Missing,
    /// The slot exists but could not be read.
    Unreadable(String),
    /// The slot is not a súmula document.
    Malformed(String),
    /// The súmula has no rounds, no roster or an empty pair.
    Invalid(String),
    /// The slot holds another súmula than the one requested.
    IdMismatch {
        /// Súmula found in the slot.
        stored: i64,
        /// Súmula the caller asked for.
        requested: i64,
    },
}

/// Result of hydrating a session from the local slot.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Session may start on this súmula.
    Hydrated(Sumula),
    /// Go back to the súmula list.
    Redirect(RedirectReason),
}

/// Read the claimed súmula for `requested_id` from the local slot.
///
/// Never hydrates partially: any problem turns into a redirect.
pub fn load_sumula(store: &dyn LocalStore, requested_id: i64) -> LoadOutcome {
    let raw = match store.get(CURRENT_SUMULA_SLOT) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            info!(requested_id, "no claimed súmula; redirecting to list");
            return LoadOutcome::Redirect(RedirectReason::Missing);
        }
        Err(err) => {
            warn!(requested_id, error = %err, "claimed súmula unreadable");
            return LoadOutcome::Redirect(RedirectReason::Unreadable(err.to_string()));
        }
    };

    let dto: SumulaDto = match serde_json::from_str(&raw) {
        Ok(dto) => dto,
        Err(err) => {
            warn!(requested_id, error = %err, "claimed súmula is malformed");
            return LoadOutcome::Redirect(RedirectReason::Malformed(err.to_string()));
        }
    };

    if dto.id != requested_id {
        warn!(
            stored_id = dto.id,
            requested_id, "claimed súmula does not match the requested one"
        );
        return LoadOutcome::Redirect(RedirectReason::IdMismatch {
            stored: dto.id,
            requested: requested_id,
        });
    }

    if let Err(err) = dto.validate() {
        warn!(sumula_id = dto.id, error = %err, "claimed súmula failed validation");
        return LoadOutcome::Redirect(RedirectReason::Invalid(err.to_string()));
    }

    info!(sumula_id = dto.id, is_imortal = dto.is_imortal, "súmula hydrated");
    LoadOutcome::Hydrated(dto.into())
}

/// Hydrate and open a scoring session, or explain why not.
pub fn open_session(
    store: &dyn LocalStore,
    requested_id: i64,
) -> Result<SumulaSession, RedirectReason> {
    match load_sumula(store, requested_id) {
        LoadOutcome::Hydrated(sumula) => Ok(SumulaSession::new(sumula)),
        LoadOutcome::Redirect(reason) => Err(reason),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::{
        dao::local_store::MemoryStore,
        state::sumula::SumulaKind,
    };

    fn blob(id: i64) -> Value {
        json!({
            "id": id,
            "name": "Súmula A",
            "description": "",
            "referee": [],
            "is_imortal": true,
            "players_score": [
                { "player": { "id": 1, "full_name": "ANA" }, "points": 0 },
                { "player": { "id": 2, "full_name": "BIA" }, "points": 0 }
            ],
            "rounds": [
                [ { "player1": { "player": { "id": 1, "full_name": "ANA" } },
                    "player2": { "player": { "id": 2, "full_name": "BIA" } } } ]
            ]
        })
    }

    fn store_with(value: &str) -> MemoryStore {
        let store = MemoryStore::new();
        store.set(CURRENT_SUMULA_SLOT, value).unwrap();
        store
    }

    #[test]
    fn hydrates_matching_sumula() {
        let store = store_with(&blob(7).to_string());
        match load_sumula(&store, 7) {
            LoadOutcome::Hydrated(sumula) => {
                assert_eq!(sumula.id, 7);
                assert_eq!(sumula.kind, SumulaKind::Immortal);
                assert_eq!(sumula.rounds.len(), 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn stored_id_differs_from_requested() {
        let store = store_with(&blob(5).to_string());
        assert_eq!(
            load_sumula(&store, 7),
            LoadOutcome::Redirect(RedirectReason::IdMismatch {
                stored: 5,
                requested: 7
            })
        );
    }

    #[test]
    fn missing_slot_redirects() {
        let store = MemoryStore::new();
        assert_eq!(
            load_sumula(&store, 1),
            LoadOutcome::Redirect(RedirectReason::Missing)
        );
        assert!(matches!(open_session(&store, 1), Err(RedirectReason::Missing)));
    }

    #[test]
    fn malformed_slot_redirects() {
        let store = store_with("{ not json");
        assert!(matches!(
            load_sumula(&store, 1),
            LoadOutcome::Redirect(RedirectReason::Malformed(_))
        ));

        let store = store_with(r#"{"id": 1, "name": "x"}"#);
        assert!(matches!(
            load_sumula(&store, 1),
            LoadOutcome::Redirect(RedirectReason::Malformed(_))
        ));
    }

    #[test]
    fn blob_without_referee_or_description_redirects() {
        for key in ["referee", "description"] {
            let mut partial = blob(4);
            partial.as_object_mut().unwrap().remove(key);
            let store = store_with(&partial.to_string());
            assert!(
                matches!(
                    load_sumula(&store, 4),
                    LoadOutcome::Redirect(RedirectReason::Malformed(_))
                ),
                "missing {key} should not hydrate"
            );
        }
    }

    #[test]
    fn null_description_still_hydrates() {
        let mut value = blob(4);
        value["description"] = Value::Null;
        let store = store_with(&value.to_string());
        assert!(matches!(
            load_sumula(&store, 4),
            LoadOutcome::Hydrated(_)
        ));
    }

    #[test]
    fn invalid_sumula_redirects() {
        let mut no_rounds = blob(3);
        no_rounds["rounds"] = json!([]);
        let store = store_with(&no_rounds.to_string());
        assert!(matches!(
            load_sumula(&store, 3),
            LoadOutcome::Redirect(RedirectReason::Invalid(_))
        ));

        let mut empty_pair = blob(3);
        empty_pair["rounds"] = json!([[{ "player1": null, "player2": null }]]);
        let store = store_with(&empty_pair.to_string());
        assert!(matches!(
            load_sumula(&store, 3),
            LoadOutcome::Redirect(RedirectReason::Invalid(_))
        ));
    }
}
