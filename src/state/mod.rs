/// Points awarded per round.
pub mod ledger;
/// Players selected to advance.
pub mod promotion;
/// Session phases and transition planning.
pub mod state_machine;
/// Hydrated súmula model.
pub mod sumula;
/// Round countdown.
pub mod timer;

use tracing::{info, warn};

use crate::{
    dto::finalize::FinalizeRequest,
    error::SessionError,
    services::{
        scoring::{PlayerScore, Standing, compute_scores, rank, round_scores},
        submission::build_finalize_request,
    },
};

pub use self::state_machine::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};
use self::{
    ledger::{LedgerError, PointEntry, PointValue, RoundLedger},
    promotion::PromotionSet,
    state_machine::{SessionEvent, SessionPhase, SessionStateMachine},
    sumula::{Pair, PlayerId, Sumula, SumulaKind},
    timer::RoundTimer,
};

/// Data collected while the referee reviews the final scores.
#[derive(Debug, Clone)]
pub struct ReviewState {
    standings: Vec<Standing>,
    promotion: PromotionSet,
    confirmed: bool,
}

impl ReviewState {
    /// Final ranking, computed when the review was opened.
    pub fn standings(&self) -> &[Standing] {
        &self.standings
    }

    /// Players selected to advance.
    pub fn promotion(&self) -> &PromotionSet {
        &self.promotion
    }

    /// Whether the referee confirmed the final scores.
    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }
}

/// Submission that has been planned and must now be sent, then completed or aborted.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    /// Plan to apply or abort once the backend answers.
    pub plan_id: PlanId,
    /// Selects the finalize endpoint.
    pub kind: SumulaKind,
    /// Body to send.
    pub request: FinalizeRequest,
}

/// Live scoring session of one súmula.
///
/// Owns every piece of mutable session state: the phase machine, the round
/// timer, the point ledger and the review selection.
#[derive(Debug)]
pub struct SumulaSession {
    sumula: Sumula,
    machine: SessionStateMachine,
    timer: RoundTimer,
    ledger: RoundLedger,
    review: Option<ReviewState>,
}

impl SumulaSession {
    /// Session in `Scoring` on the first round, timer idle.
    pub fn new(sumula: Sumula) -> Self {
        info!(
            sumula_id = sumula.id,
            kind = ?sumula.kind,
            rounds = sumula.rounds.len(),
            players = sumula.roster.len(),
            "scoring session ready"
        );
        let ledger = RoundLedger::new(sumula.rounds.len());
        Self {
            sumula,
            machine: SessionStateMachine::new(),
            timer: RoundTimer::new(),
            ledger,
            review: None,
        }
    }

    /// Súmula being scored.
    pub fn sumula(&self) -> &Sumula {
        &self.sumula
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.machine.phase()
    }

    /// Phase plus pending transition, if any.
    pub fn snapshot(&self) -> Snapshot {
        self.machine.snapshot()
    }

    /// Round countdown.
    pub fn timer(&self) -> &RoundTimer {
        &self.timer
    }

    /// Recorded awards.
    pub fn ledger(&self) -> &RoundLedger {
        &self.ledger
    }

    /// Zero-based index of the current round.
    pub fn current_round(&self) -> usize {
        self.ledger.current_round()
    }

    /// Whether the current round is the last.
    pub fn is_last_round(&self) -> bool {
        self.ledger.is_last_round()
    }

    /// Pairs scoreable right now.
    pub fn current_pairs(&self) -> &[Pair] {
        self.sumula
            .round(self.ledger.current_round())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Share of rounds reached, rounded to the nearest percent.
    pub fn round_progress(&self) -> u8 {
        let total = self.ledger.total_rounds().max(1);
        let reached = self.ledger.current_round() + 1;
        ((reached * 200 + total) / (2 * total)).min(100) as u8
    }

    /// Start the countdown. `false` when running or finished.
    pub fn start_timer(&mut self) -> Result<bool, SessionError> {
        self.ensure_phase(SessionPhase::Scoring, "start the timer")?;
        Ok(self.timer.start())
    }

    /// Pause the countdown. `false` when not running.
    pub fn pause_timer(&mut self) -> Result<bool, SessionError> {
        self.ensure_phase(SessionPhase::Scoring, "pause the timer")?;
        Ok(self.timer.pause())
    }

    /// Back to a full idle round.
    pub fn reset_timer(&mut self) -> Result<(), SessionError> {
        self.ensure_phase(SessionPhase::Scoring, "reset the timer")?;
        self.timer.reset();
        Ok(())
    }

    /// Award `value` to the pair at `pair_index` of `round`.
    ///
    /// Only valid once the round timer has completed, for the current round, and
    /// once per value per pair until the round is cleared.
    pub fn add_point(
        &mut self,
        round: usize,
        value: PointValue,
        pair_index: usize,
    ) -> Result<PointEntry, SessionError> {
        self.ensure_phase(SessionPhase::Scoring, "assign points")?;

        if !self.timer.is_completed() {
            warn!(
                sumula_id = self.sumula.id,
                round,
                pair_index,
                "points rejected: round timer still pending"
            );
            return Err(SessionError::TimerNotCompleted);
        }

        let pairs = self
            .sumula
            .round(round)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let entry = self.ledger.record(round, value, pairs, pair_index)?;

        info!(
            sumula_id = self.sumula.id,
            round,
            pair_index,
            points = value.points(),
            "points assigned"
        );
        Ok(entry)
    }

    /// Points already awarded to a pair of the current round.
    pub fn pair_total(&self, pair_index: usize) -> i64 {
        self.ledger.pair_total(self.ledger.current_round(), pair_index)
    }

    /// Whether `value` was awarded to a pair of the current round.
    pub fn is_scored(&self, pair_index: usize, value: PointValue) -> bool {
        self.ledger
            .is_scored(self.ledger.current_round(), pair_index, value)
    }

    /// Drop every award of the current round and restart its timer.
    pub fn clear_round(&mut self) -> Result<usize, SessionError> {
        self.ensure_phase(SessionPhase::Scoring, "clear points")?;
        let round = self.ledger.current_round();
        let removed = self.ledger.clear_round(round);
        self.timer.reset();
        info!(sumula_id = self.sumula.id, round, removed, "round points cleared");
        Ok(removed)
    }

    /// Move to the next round with a fresh timer. Previous awards are kept.
    pub fn advance_round(&mut self) -> Result<usize, SessionError> {
        self.ensure_phase(SessionPhase::Scoring, "advance the round")?;
        if self.ledger.is_last_round() {
            return Err(LedgerError::LastRound.into());
        }

        self.machine.transition(SessionEvent::AdvanceRound)?;
        let round = self.ledger.advance()?;
        self.timer.reset();
        info!(sumula_id = self.sumula.id, round, "advanced to next round");
        Ok(round)
    }

    /// Cumulative scores of every roster player.
    pub fn scores(&self) -> Vec<PlayerScore> {
        compute_scores(self.ledger.entries(), &self.sumula.roster)
    }

    /// Scores earned in the current round only.
    pub fn current_round_scores(&self) -> Vec<PlayerScore> {
        round_scores(
            self.ledger.entries(),
            &self.sumula.roster,
            self.ledger.current_round(),
        )
    }

    /// Open the final review from the last round.
    pub fn open_review(&mut self) -> Result<&ReviewState, SessionError> {
        self.ensure_phase(SessionPhase::Scoring, "finalize")?;
        if !self.ledger.is_last_round() {
            return Err(SessionError::InvalidState(
                "the súmula can only be finalized from its last round".into(),
            ));
        }

        self.machine.transition(SessionEvent::OpenReview)?;
        let review = ReviewState {
            standings: rank(self.scores()),
            promotion: PromotionSet::open(self.sumula.roster_ids()),
            confirmed: false,
        };
        info!(sumula_id = self.sumula.id, "final review opened");
        Ok(&*self.review.insert(review))
    }

    /// Open review, if any.
    pub fn review(&self) -> Option<&ReviewState> {
        self.review.as_ref()
    }

    /// Mark whether a player advances. Only meaningful for qualifying súmulas.
    pub fn set_promoted(&mut self, player: PlayerId, promoted: bool) -> Result<(), SessionError> {
        if self.sumula.kind.is_immortal() {
            return Err(SessionError::InvalidState(
                "immortal súmulas keep every player".into(),
            ));
        }
        self.review_mut("select players")?
            .promotion
            .set(player, promoted)?;
        Ok(())
    }

    /// Record the referee's confirmation that the scores are correct.
    pub fn confirm(&mut self, confirmed: bool) -> Result<(), SessionError> {
        self.review_mut("confirm scores")?.confirmed = confirmed;
        Ok(())
    }

    /// Dismiss the review, discarding selection and confirmation.
    pub fn close_review(&mut self) -> Result<(), SessionError> {
        self.machine.transition(SessionEvent::CloseReview)?;
        self.review = None;
        Ok(())
    }

    /// Plan the submission and build its request.
    ///
    /// Until [`complete_submission`](Self::complete_submission) or
    /// [`abort_submission`](Self::abort_submission) runs, any further attempt
    /// fails with [`SessionError::SubmissionInFlight`].
    pub fn begin_submission(&mut self) -> Result<PendingSubmission, SessionError> {
        let snapshot = self.machine.snapshot();
        if snapshot.is_submitting() {
            return Err(SessionError::SubmissionInFlight);
        }
        self.ensure_phase(SessionPhase::Review, "submit")?;

        let review = self
            .review
            .as_ref()
            .ok_or_else(|| SessionError::InvalidState("review is not open".into()))?;
        if !review.confirmed {
            return Err(SessionError::NotConfirmed);
        }

        let request = build_finalize_request(&self.sumula, &self.scores(), &review.promotion);
        let plan = self.machine.plan(SessionEvent::Submit)?;
        info!(
            sumula_id = self.sumula.id,
            removed = request.imortal_players.len(),
            "submitting súmula"
        );

        Ok(PendingSubmission {
            plan_id: plan.id,
            kind: self.sumula.kind,
            request,
        })
    }

    /// The backend accepted the tally: the session becomes terminal.
    pub fn complete_submission(&mut self, plan_id: PlanId) -> Result<(), SessionError> {
        self.machine.apply(plan_id)?;
        self.timer.reset();
        info!(sumula_id = self.sumula.id, "súmula finalized");
        Ok(())
    }

    /// The submission failed: go back to the review with everything intact.
    pub fn abort_submission(&mut self, plan_id: PlanId) -> Result<(), SessionError> {
        self.machine.abort(plan_id)?;
        Ok(())
    }

    /// Abandon the session without submitting anything.
    pub fn leave(&mut self) -> Result<(), SessionError> {
        self.machine.transition(SessionEvent::Leave)?;
        self.timer.reset();
        self.review = None;
        info!(sumula_id = self.sumula.id, "left scoring session");
        Ok(())
    }

    fn ensure_phase(&self, expected: SessionPhase, action: &str) -> Result<(), SessionError> {
        let phase = self.machine.phase();
        if phase != expected {
            return Err(SessionError::wrong_phase(action, phase));
        }
        Ok(())
    }

    fn review_mut(&mut self, action: &str) -> Result<&mut ReviewState, SessionError> {
        if self.machine.snapshot().is_submitting() {
            return Err(SessionError::SubmissionInFlight);
        }
        self.ensure_phase(SessionPhase::Review, action)?;
        self.review
            .as_mut()
            .ok_or_else(|| SessionError::InvalidState("review is not open".into()))
    }
}
