use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use futures::future::BoxFuture;
use reqwest::StatusCode;
use serde_json::json;
use sumula_referee::{
    dao::{
        api::{
            SumulaApi,
            error::{ApiError, ApiResult},
        },
        local_store::{CURRENT_SUMULA_SLOT, LocalStore, MemoryStore},
    },
    dto::{
        finalize::{FinalizeRequest, PlayerRefDto},
        listing::{ActiveSumulasResponse, AddRefereeRequest},
    },
    error::{ServiceError, SessionError},
    services::{
        loader::{RedirectReason, open_session},
        submission::{Navigation, submit_session},
        sumula_service::{claim_by_id, ensure_no_active_session, leave_session},
    },
    state::{
        SumulaSession, ledger::PointValue, state_machine::SessionPhase, sumula::SumulaKind,
    },
};

const EVENT_ID: i64 = 3;

#[derive(Default)]
struct Calls {
    claims: Vec<(i64, AddRefereeRequest)>,
    finalized: Vec<(i64, SumulaKind, FinalizeRequest)>,
}

/// In-memory backend answering finalize calls with a scripted list of statuses.
#[derive(Clone, Default)]
struct FakeApi {
    listing: Arc<Mutex<ActiveSumulasResponse>>,
    finalize_statuses: Arc<Mutex<VecDeque<StatusCode>>>,
    calls: Arc<Mutex<Calls>>,
}

impl FakeApi {
    fn with_listing(listing: serde_json::Value) -> Self {
        let api = Self::default();
        *api.listing.lock().unwrap() = serde_json::from_value(listing).unwrap();
        api
    }

    fn script_finalize(&self, statuses: impl IntoIterator<Item = StatusCode>) {
        self.finalize_statuses.lock().unwrap().extend(statuses);
    }
}

impl SumulaApi for FakeApi {
    fn list_active(&self, _event_id: i64) -> BoxFuture<'static, ApiResult<ActiveSumulasResponse>> {
        let listing = self.listing.lock().unwrap().clone();
        Box::pin(async move { Ok(listing) })
    }

    fn add_referee(
        &self,
        event_id: i64,
        request: AddRefereeRequest,
    ) -> BoxFuture<'static, ApiResult<()>> {
        self.calls.lock().unwrap().claims.push((event_id, request));
        Box::pin(async { Ok(()) })
    }

    fn finalize(
        &self,
        event_id: i64,
        kind: SumulaKind,
        request: FinalizeRequest,
    ) -> BoxFuture<'static, ApiResult<()>> {
        let path = format!("api/sumula/{}/", kind.endpoint_segment());
        self.calls
            .lock()
            .unwrap()
            .finalized
            .push((event_id, kind, request));
        let status = self
            .finalize_statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(StatusCode::OK);
        Box::pin(async move {
            if status == StatusCode::OK {
                Ok(())
            } else {
                Err(ApiError::RequestStatus { path, status })
            }
        })
    }
}

fn player(id: i64, name: &str) -> serde_json::Value {
    json!({ "id": id, "full_name": name })
}

fn listing() -> serde_json::Value {
    let (ana, bia, caio) = (player(1, "ANA"), player(2, "BIA"), player(3, "CAIO"));
    json!({
        "sumulas_classificatoria": [{
            "id": 11,
            "name": "Classificatória 1",
            "description": "",
            "referee": [],
            "players_score": [
                { "player": ana, "points": 0, "sumula_classificatoria": 11 },
                { "player": bia, "points": 0 },
                { "player": caio, "points": 0 }
            ],
            "rounds": [
                [ { "player1": { "player": ana }, "player2": { "player": bia } },
                  { "player1": { "player": caio }, "player2": null } ],
                [ { "player1": { "player": ana }, "player2": { "player": caio } },
                  { "player1": null, "player2": { "player": bia } } ]
            ]
        }, {
            "id": 13,
            "name": "Classificatória 2",
            "players_score": [
                { "player": ana, "points": 0 },
                { "player": bia, "points": 0 },
                { "player": caio, "points": 0 }
            ],
            "rounds": [
                [ { "player1": { "player": ana }, "player2": { "player": bia } },
                  { "player1": { "player": caio }, "player2": null } ]
            ]
        }],
        "sumulas_imortal": [{
            "id": 12,
            "name": "Imortal 1",
            "players_score": [
                { "player": ana, "points": 0 },
                { "player": bia, "points": 0 }
            ],
            "rounds": [
                [ { "player1": { "player": ana }, "player2": { "player": bia } } ]
            ]
        }]
    })
}

async fn claimed_session(api: &FakeApi, store: &MemoryStore, id: i64) -> SumulaSession {
    claim_by_id(api, store, EVENT_ID, id).await.unwrap();
    open_session(store, id).unwrap()
}

async fn run_out_timer(session: &mut SumulaSession) {
    session.start_timer().unwrap();
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert!(session.timer().is_completed());
}

#[tokio::test(start_paused = true)]
async fn qualifying_session_end_to_end() {
    let api = FakeApi::with_listing(listing());
    let store = MemoryStore::new();
    let mut session = claimed_session(&api, &store, 11).await;

    assert_eq!(
        api.calls.lock().unwrap().claims,
        vec![(
            EVENT_ID,
            AddRefereeRequest {
                sumula_id: 11,
                is_imortal: false
            }
        )]
    );
    assert_eq!(session.sumula().kind, SumulaKind::Qualifying);

    run_out_timer(&mut session).await;
    session.add_point(0, PointValue::One, 0).unwrap();
    session.add_point(0, PointValue::Three, 1).unwrap();
    assert!(matches!(
        session.add_point(0, PointValue::One, 0),
        Err(SessionError::Ledger(_))
    ));

    session.advance_round().unwrap();
    session.open_review().unwrap();

    let order: Vec<_> = session
        .review()
        .unwrap()
        .standings()
        .iter()
        .map(|standing| (standing.score.player_id(), standing.score.points))
        .collect();
    assert_eq!(order, vec![(3, 3), (1, 1), (2, 1)]);

    session.set_promoted(1, true).unwrap();
    session.confirm(true).unwrap();

    let navigation = submit_session(&mut session, &api, &store, EVENT_ID)
        .await
        .unwrap();
    assert_eq!(navigation, Navigation::SumulaList);
    assert_eq!(session.phase(), SessionPhase::Done);
    assert_eq!(store.get(CURRENT_SUMULA_SLOT).unwrap(), None);

    let calls = api.calls.lock().unwrap();
    let (event_id, kind, request) = &calls.finalized[0];
    assert_eq!((*event_id, *kind), (EVENT_ID, SumulaKind::Qualifying));
    assert_eq!(
        request.imortal_players,
        vec![PlayerRefDto { id: 2 }, PlayerRefDto { id: 3 }]
    );
    let points: Vec<_> = request
        .players_score
        .iter()
        .map(|entry| (entry.player.id, entry.points))
        .collect();
    assert_eq!(points, vec![(1, 1), (2, 1), (3, 3)]);
    assert_eq!(
        request.players_score[0].extra.get("sumula_classificatoria"),
        Some(&json!(11))
    );
}

#[tokio::test(start_paused = true)]
async fn single_round_promotion_reports_the_others() {
    let api = FakeApi::with_listing(listing());
    let store = MemoryStore::new();
    let mut session = claimed_session(&api, &store, 13).await;

    run_out_timer(&mut session).await;
    session.add_point(0, PointValue::One, 0).unwrap();
    session.add_point(0, PointValue::Three, 1).unwrap();

    let scores: Vec<_> = session
        .scores()
        .iter()
        .map(|score| (score.player_id(), score.points))
        .collect();
    assert_eq!(scores, vec![(1, 1), (2, 1), (3, 3)]);

    session.open_review().unwrap();
    session.set_promoted(1, true).unwrap();
    session.confirm(true).unwrap();
    submit_session(&mut session, &api, &store, EVENT_ID)
        .await
        .unwrap();

    let calls = api.calls.lock().unwrap();
    let removed: Vec<_> = calls.finalized[0]
        .2
        .imortal_players
        .iter()
        .map(|player| player.id)
        .collect();
    assert_eq!(removed, vec![2, 3]);
}

#[tokio::test(start_paused = true)]
async fn immortal_session_reports_whole_roster() {
    let api = FakeApi::with_listing(listing());
    let store = MemoryStore::new();
    let mut session = claimed_session(&api, &store, 12).await;
    assert_eq!(session.sumula().kind, SumulaKind::Immortal);

    run_out_timer(&mut session).await;
    session.add_point(0, PointValue::Three, 0).unwrap();
    session.open_review().unwrap();
    session.confirm(true).unwrap();
    submit_session(&mut session, &api, &store, EVENT_ID)
        .await
        .unwrap();

    let calls = api.calls.lock().unwrap();
    let (_, kind, request) = &calls.finalized[0];
    assert_eq!(*kind, SumulaKind::Immortal);
    let removed: Vec<_> = request.imortal_players.iter().map(|p| p.id).collect();
    assert_eq!(removed, vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn failed_submission_keeps_everything() {
    let api = FakeApi::with_listing(listing());
    api.script_finalize([StatusCode::INTERNAL_SERVER_ERROR, StatusCode::CREATED]);
    let store = MemoryStore::new();
    let mut session = claimed_session(&api, &store, 12).await;

    run_out_timer(&mut session).await;
    session.add_point(0, PointValue::One, 0).unwrap();
    session.open_review().unwrap();
    session.confirm(true).unwrap();

    for _ in 0..2 {
        let err = submit_session(&mut session, &api, &store, EVENT_ID)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Submission(_)));
        assert_eq!(session.phase(), SessionPhase::Review);
        assert!(!session.snapshot().is_submitting());
        assert!(store.get(CURRENT_SUMULA_SLOT).unwrap().is_some());
        assert!(session.review().unwrap().is_confirmed());
        assert_eq!(session.scores()[0].points, 1);
    }

    submit_session(&mut session, &api, &store, EVENT_ID)
        .await
        .unwrap();
    assert_eq!(api.calls.lock().unwrap().finalized.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn second_submission_is_rejected_while_pending() {
    let api = FakeApi::with_listing(listing());
    let store = MemoryStore::new();
    let mut session = claimed_session(&api, &store, 11).await;

    session.advance_round().unwrap();
    session.open_review().unwrap();
    session.confirm(true).unwrap();

    let pending = session.begin_submission().unwrap();
    let err = submit_session(&mut session, &api, &store, EVENT_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::SubmissionInFlight));
    assert!(api.calls.lock().unwrap().finalized.is_empty());

    session.complete_submission(pending.plan_id).unwrap();
    assert_eq!(session.phase(), SessionPhase::Done);
}

#[tokio::test(start_paused = true)]
async fn leaving_clears_slot_and_stops_timer() {
    let api = FakeApi::with_listing(listing());
    let store = MemoryStore::new();
    let mut session = claimed_session(&api, &store, 11).await;

    session.start_timer().unwrap();
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    leave_session(&mut session, &store).unwrap();

    assert_eq!(session.phase(), SessionPhase::Left);
    assert_eq!(store.get(CURRENT_SUMULA_SLOT).unwrap(), None);
    assert_eq!(session.timer().snapshot().remaining_secs, 60);
    assert!(matches!(
        open_session(&store, 11),
        Err(RedirectReason::Missing)
    ));
    assert!(api.calls.lock().unwrap().finalized.is_empty());
}

#[tokio::test]
async fn claiming_another_sumula_replaces_the_slot() {
    let api = FakeApi::with_listing(listing());
    let store = MemoryStore::new();

    claim_by_id(&api, &store, EVENT_ID, 11).await.unwrap();
    claim_by_id(&api, &store, EVENT_ID, 12).await.unwrap();

    assert!(matches!(
        open_session(&store, 11),
        Err(RedirectReason::IdMismatch {
            stored: 12,
            requested: 11
        })
    ));
    assert!(claim_by_id(&api, &store, EVENT_ID, 99).await.is_err());
    assert!(open_session(&store, 12).is_ok());
    assert_eq!(api.calls.lock().unwrap().claims.len(), 2);
}

#[tokio::test]
async fn open_session_blocks_claiming_another() {
    let api = FakeApi::with_listing(listing());
    let store = MemoryStore::new();
    let mut session = claimed_session(&api, &store, 11).await;

    assert!(matches!(
        ensure_no_active_session(Some(&session)),
        Err(ServiceError::SessionActive(11))
    ));
    assert!(open_session(&store, 11).is_ok());
    assert_eq!(api.calls.lock().unwrap().claims.len(), 1);

    leave_session(&mut session, &store).unwrap();
    assert!(ensure_no_active_session(Some(&session)).is_ok());
    assert!(ensure_no_active_session(None).is_ok());
}
