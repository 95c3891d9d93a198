use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use remote::{ResponseStore, SessionLifecycle, TastingApi};
use tasting_core::model::{AnswerValue, ParticipantId, SessionId, Slide, SlideId, Wine, WineId};
use tasting_core::sequence::SlideSequence;
use tasting_core::time::Clock;
use tasting_core::tracker::AnswerTracker;

use super::averages::{normalize, AveragesOutcome};
use super::completion::WineCompletion;
use super::navigation::{decide_next, NavDecision, TransitionKind};
use super::progress::section_progress;
use super::view::{CompletionView, EngineSnapshot, Farewell};
use crate::error::EngineError;

//
// ─── TIMINGS ───────────────────────────────────────────────────────────────────
//

/// Every delay and budget the engine uses, so tests can compress them.
#[derive(Debug, Clone)]
pub struct EngineTimings {
    /// Settle delay for an ordinary forward or backward move.
    pub slide_transition: Duration,
    /// Settle delay for a direct jump.
    pub jump_settle: Duration,
    /// Settle delay when entering a different wine.
    pub wine_transition: Duration,
    /// Settle delay when crossing a section boundary.
    pub section_transition: Duration,
    /// Quiet period after entering the group wait before auto-triggering.
    pub finished_debounce: Duration,
    /// Interval between group completion-status polls while waiting.
    pub status_poll: Duration,
    /// Interval between countdown decrements.
    pub countdown_tick: Duration,
    /// Seconds on the blocking countdown before skip becomes available.
    pub countdown_budget: u32,
    /// Pause between dispatching sentiment analysis and averaging.
    pub averaging_stagger: Duration,
}

impl Default for EngineTimings {
    fn default() -> Self {
        Self {
            slide_transition: Duration::from_millis(300),
            jump_settle: Duration::from_millis(200),
            wine_transition: Duration::from_millis(2500),
            section_transition: Duration::from_millis(2000),
            finished_debounce: Duration::from_millis(1000),
            status_poll: Duration::from_secs(15),
            countdown_tick: Duration::from_secs(1),
            countdown_budget: 120,
            averaging_stagger: Duration::from_millis(500),
        }
    }
}

impl EngineTimings {
    fn settle_for(&self, kind: &TransitionKind) -> Duration {
        match kind {
            TransitionKind::Slide => self.slide_transition,
            TransitionKind::Jump => self.jump_settle,
            TransitionKind::Section { .. } => self.section_transition,
            TransitionKind::Wine { .. } => self.wine_transition,
        }
    }
}

//
// ─── WAIT TASKS ────────────────────────────────────────────────────────────────
//

/// Handles of the timers racing during a group wait. Aborting is always
/// safe: every task re-checks the completion generation under the lock
/// before acting.
#[derive(Debug, Default)]
struct WaitTasks {
    handles: Vec<JoinHandle<()>>,
}

impl WaitTasks {
    fn push(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    fn abort_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for WaitTasks {
    fn drop(&mut self) {
        self.abort_all();
    }
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

struct EngineState {
    index: usize,
    completed: HashSet<usize>,
    navigating: Option<TransitionKind>,
    completion: WineCompletion,
    wait_tasks: WaitTasks,
    pending_saves: usize,
    tracker: AnswerTracker,
    finished: Option<Farewell>,
    finished_at: Option<DateTime<Utc>>,
}

struct EngineInner {
    sequence: SlideSequence,
    session_id: SessionId,
    /// `None` for preview runs: answers are tracked but never persisted,
    /// and finalizing leads back to the landing page.
    participant_id: Option<ParticipantId>,
    api: Arc<dyn TastingApi>,
    responses: Arc<dyn ResponseStore>,
    lifecycle: Arc<dyn SessionLifecycle>,
    timings: EngineTimings,
    clock: Clock,
    started_at: DateTime<Utc>,
    state: Mutex<EngineState>,
}

impl EngineInner {
    /// The lock is only ever held for short synchronous sections and never
    /// across an await point.
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Drives one participant's run through a tasting session: sequencing,
/// answer tracking, navigation settling, and the wine completion flow.
///
/// Cheap to clone; clones share one state.
#[derive(Clone)]
pub struct SessionEngine {
    inner: Arc<EngineInner>,
}

impl SessionEngine {
    /// Assemble the sequence and start at the first slide.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::EmptySequence` when wines and slides produce
    /// no presentable sequence.
    pub fn new(
        session_id: SessionId,
        participant_id: Option<ParticipantId>,
        wines: Vec<Wine>,
        slides: Vec<Slide>,
        api: Arc<dyn TastingApi>,
        responses: Arc<dyn ResponseStore>,
        lifecycle: Arc<dyn SessionLifecycle>,
        timings: EngineTimings,
        clock: Clock,
    ) -> Result<Self, EngineError> {
        let sequence = SlideSequence::build(wines, slides)?;
        let started_at = clock.now();
        let mut completion = WineCompletion::new();
        completion.reset_for(sequence.wine_of(0).map(Wine::id));

        Ok(Self {
            inner: Arc::new(EngineInner {
                sequence,
                session_id,
                participant_id,
                api,
                responses,
                lifecycle,
                timings,
                clock,
                started_at,
                state: Mutex::new(EngineState {
                    index: 0,
                    completed: HashSet::new(),
                    navigating: None,
                    completion,
                    wait_tasks: WaitTasks::default(),
                    pending_saves: 0,
                    tracker: AnswerTracker::new(),
                    finished: None,
                    finished_at: None,
                }),
            }),
        })
    }

    #[must_use]
    pub fn sequence(&self) -> &SlideSequence {
        &self.inner.sequence
    }

    /// When this run started, stamped by the engine's clock.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }

    /// When this run finished, once it has.
    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().finished_at
    }

    /// One consistent observation of the whole engine.
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        let state = self.inner.lock();
        // The sequence is never empty and navigation keeps the index in
        // bounds, but clamp rather than index directly.
        let slide_index = state.index.min(self.inner.sequence.len() - 1);
        let slide = self.inner.sequence.slides()[slide_index].clone();
        EngineSnapshot {
            index: state.index,
            total: self.inner.sequence.len(),
            slide,
            wine: self.inner.sequence.wine_of(slide_index).cloned(),
            transitioning: state.navigating.clone(),
            completion: CompletionView::from(&state.completion),
            sections: section_progress(&self.inner.sequence, state.index, &state.completed),
            pending_saves: state.pending_saves,
            finished: state.finished.clone(),
        }
    }

    //
    // ─── ANSWERS ───────────────────────────────────────────────────────────────
    //

    /// Record an answer. Scale values are repaired against the owning
    /// question's configured range first. The tracker is updated
    /// synchronously so a boundary check issued right after sees it;
    /// persistence runs in the background and a failed save never blocks
    /// progression.
    pub fn set_answer(&self, slide_id: SlideId, value: AnswerValue) {
        let value = self.clamp_to_question(slide_id, value);
        let participant = {
            let mut state = self.inner.lock();
            state.tracker.set(slide_id, value.clone());
            let Some(participant) = self.inner.participant_id else {
                return;
            };
            state.pending_saves += 1;
            participant
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = inner.responses.save_response(participant, slide_id, &value).await;
            if let Err(error) = result {
                warn!(%slide_id, %error, "answer save failed; keeping local copy");
            }
            let mut state = inner.lock();
            state.pending_saves = state.pending_saves.saturating_sub(1);
        });
    }

    /// Out-of-range scale values are clamped into the slide's configured
    /// range before they are tracked or persisted.
    fn clamp_to_question(&self, slide_id: SlideId, value: AnswerValue) -> AnswerValue {
        let config = self
            .inner
            .sequence
            .slides()
            .iter()
            .find(|s| s.id() == slide_id)
            .and_then(|s| s.content().question.as_ref());
        match config {
            Some(config) => value
                .clamped_scale(config.scale_min(), config.scale_max())
                .map_or(value, AnswerValue::Scale),
            None => value,
        }
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Advance to the next slide, or run the completion flow at a wine
    /// boundary. Ignored while a settle delay or the completion flow has
    /// navigation gated.
    pub async fn next(&self) {
        let decision = {
            let state = self.inner.lock();
            if state.navigating.is_some() || state.finished.is_some() {
                return;
            }
            decide_next(
                &self.inner.sequence,
                &state.tracker,
                state.index,
                &state.completion,
            )
        };

        match decision {
            NavDecision::Ignore => {}
            NavDecision::Advance(kind) => self.advance(kind).await,
            NavDecision::CompletionCheck { wine_id } => self.run_completion_check(wine_id).await,
            NavDecision::Finalize => self.finalize().await,
        }
    }

    /// Step back one slide. The slide being left loses its completed mark
    /// so its section progress reflects the revisit.
    pub async fn previous(&self) {
        {
            let mut state = self.inner.lock();
            if state.navigating.is_some() || state.finished.is_some() || state.index == 0 {
                return;
            }
            let index = state.index;
            state.completed.remove(&index);
            state.navigating = Some(TransitionKind::Slide);
        }

        tokio::time::sleep(self.inner.timings.slide_transition).await;

        let mut state = self.inner.lock();
        state.navigating = None;
        state.index -= 1;
        let index = state.index;
        self.settle_wine_context(&mut state, index);
    }

    /// Jump straight to an index, with a short settle delay. Out-of-range
    /// targets are ignored.
    pub async fn jump_to(&self, target: usize) {
        {
            let mut state = self.inner.lock();
            if state.navigating.is_some()
                || state.finished.is_some()
                || target >= self.inner.sequence.len()
                || target == state.index
            {
                return;
            }
            state.navigating = Some(TransitionKind::Jump);
        }

        tokio::time::sleep(self.inner.timings.jump_settle).await;

        let mut state = self.inner.lock();
        state.navigating = None;
        state.index = target;
        self.settle_wine_context(&mut state, target);
    }

    async fn advance(&self, kind: TransitionKind) {
        {
            let mut state = self.inner.lock();
            let index = state.index;
            state.completed.insert(index);
            state.navigating = Some(kind.clone());
        }

        tokio::time::sleep(self.inner.timings.settle_for(&kind)).await;

        let mut state = self.inner.lock();
        state.navigating = None;
        state.index += 1;
        let index = state.index;
        self.settle_wine_context(&mut state, index);
    }

    /// Re-point the completion machine at the wine owning `index`,
    /// invalidating any in-flight work for the previous wine. Results
    /// already being processed or shown are left to run their course.
    fn settle_wine_context(&self, state: &mut EngineState, index: usize) {
        let wine_id = self.inner.sequence.wine_of(index).map(Wine::id);
        if state.completion.wine_id() == wine_id
            || state.completion.is_loading_averages()
            || state.completion.is_showing_averages()
        {
            return;
        }
        state.wait_tasks.abort_all();
        state.completion.reset_for(wine_id);
    }

    //
    // ─── COMPLETION FLOW ───────────────────────────────────────────────────────
    //

    async fn run_completion_check(&self, wine_id: WineId) {
        let generation = {
            let mut state = self.inner.lock();
            let index = state.index;
            state.completed.insert(index);
            state.completion.begin_check(wine_id)
        };

        // Fail open: a broken comparable-questions check behaves as if the
        // wine has no group content, so progression is never held up on it.
        let has_comparable = match self
            .inner
            .api
            .comparable_questions(self.inner.session_id, wine_id)
            .await
        {
            Ok(questions) => !questions.is_empty(),
            Err(error) => {
                warn!(%wine_id, %error, "comparable-questions check failed; skipping group flow");
                false
            }
        };

        if !has_comparable {
            {
                let mut state = self.inner.lock();
                if !state.completion.is_current(generation) {
                    return;
                }
                state.completion.reset_for(Some(wine_id));
            }
            self.advance_past_boundary().await;
            return;
        }

        {
            let mut state = self.inner.lock();
            if !state.completion.is_current(generation) {
                return;
            }
            state.completion.begin_group_check();
        }

        // Fail safe: with the status endpoint broken we cannot prove the
        // group is done, so enter the bounded wait; its triggers still
        // guarantee forward progress.
        let group_done = match self
            .inner
            .api
            .completion_status(self.inner.session_id, wine_id)
            .await
        {
            Ok(status) => status.group_done(),
            Err(error) => {
                warn!(%wine_id, %error, "completion-status check failed; entering wait");
                false
            }
        };

        let mut state = self.inner.lock();
        if !state.completion.is_current(generation) {
            return;
        }
        if group_done {
            if state.completion.begin_processing(generation) {
                drop(state);
                self.spawn_processing(generation, wine_id);
            }
        } else {
            state.completion.begin_waiting(self.inner.timings.countdown_budget);
            self.spawn_wait_tasks(&mut state, generation, wine_id);
        }
    }

    /// Start the three timers racing while the group wait holds: the
    /// finished debounce, the status poll, and the countdown ticker. All
    /// funnel through `begin_processing`, so exactly one trigger wins.
    fn spawn_wait_tasks(&self, state: &mut EngineState, generation: u64, wine_id: WineId) {
        state.wait_tasks.abort_all();

        let engine = self.clone();
        state.wait_tasks.push(tokio::spawn(async move {
            tokio::time::sleep(engine.inner.timings.finished_debounce).await;
            engine.try_trigger_processing(generation, wine_id, "finished debounce");
        }));

        let engine = self.clone();
        state.wait_tasks.push(tokio::spawn(async move {
            loop {
                tokio::time::sleep(engine.inner.timings.status_poll).await;
                // A transient poll failure never ends the wait; keep polling.
                let done = match engine
                    .inner
                    .api
                    .completion_status(engine.inner.session_id, wine_id)
                    .await
                {
                    Ok(status) => status.group_done(),
                    Err(error) => {
                        warn!(%wine_id, %error, "status poll failed; will retry");
                        continue;
                    }
                };
                if done {
                    engine.try_trigger_processing(generation, wine_id, "status poll");
                    return;
                }
            }
        }));

        let engine = self.clone();
        state.wait_tasks.push(tokio::spawn(async move {
            loop {
                tokio::time::sleep(engine.inner.timings.countdown_tick).await;
                let remaining = engine.inner.lock().completion.tick_countdown(generation);
                match remaining {
                    // The countdown hitting zero only unlocks the skip
                    // control; it never triggers processing itself.
                    Some(0) | None => return,
                    Some(_) => {}
                }
            }
        }));
    }

    fn try_trigger_processing(&self, generation: u64, wine_id: WineId, source: &str) {
        let won = {
            let mut state = self.inner.lock();
            let won = state.completion.begin_processing(generation);
            if won {
                state.wait_tasks.abort_all();
            }
            won
        };
        if won {
            debug!(%wine_id, source, "processing triggered");
            self.spawn_processing(generation, wine_id);
        }
    }

    /// Dispatch sentiment analysis and averaging for the wine. Sentiment
    /// is best-effort; the averaging result, or its failure marker, always
    /// reaches the screen.
    fn spawn_processing(&self, generation: u64, wine_id: WineId) {
        let engine = self.clone();
        tokio::spawn(async move {
            let sentiment = Arc::clone(&engine.inner.api);
            let session_id = engine.inner.session_id;
            tokio::spawn(async move {
                if let Err(error) = sentiment.sentiment_analysis(session_id, wine_id).await {
                    debug!(%wine_id, %error, "sentiment analysis failed");
                }
            });

            tokio::time::sleep(engine.inner.timings.averaging_stagger).await;

            let outcome = match engine
                .inner
                .api
                .calculate_averages(engine.inner.session_id, wine_id)
                .await
            {
                Ok(raw) => AveragesOutcome::Ready(normalize(&raw)),
                Err(error) => {
                    warn!(%wine_id, %error, "averaging failed");
                    AveragesOutcome::Failed
                }
            };

            engine.inner.lock().completion.show_averages(generation, outcome);
        });
    }

    /// Skip the remainder of the group wait. Available only once the
    /// countdown has run out.
    pub fn skip(&self) {
        let (generation, wine_id) = {
            let state = self.inner.lock();
            if !state.completion.skip_available() {
                return;
            }
            match state.completion.wine_id() {
                Some(wine_id) => (state.completion.generation(), wine_id),
                None => return,
            }
        };
        self.try_trigger_processing(generation, wine_id, "skip");
    }

    /// The participant confirmed the averages screen. Move past the wine
    /// boundary, or wind the session down when this was the final slide.
    pub async fn continue_after_averages(&self) {
        {
            let mut state = self.inner.lock();
            if !state.completion.complete() {
                return;
            }
        }
        self.advance_past_boundary().await;
    }

    /// Leave a completion-checked wine boundary: advance into the next
    /// slide with the appropriate visual weight, or finalize at the end.
    async fn advance_past_boundary(&self) {
        let decision = {
            let state = self.inner.lock();
            if state.navigating.is_some() || state.finished.is_some() {
                return;
            }
            if state.index + 1 >= self.inner.sequence.len() {
                None
            } else {
                Some(transition_out_of(&self.inner.sequence, state.index))
            }
        };

        match decision {
            None => self.finalize().await,
            Some(kind) => self.advance(kind).await,
        }
    }

    //
    // ─── FINALIZATION ──────────────────────────────────────────────────────────
    //

    /// End the session exactly once: stop every timer, notify the backend
    /// for real sessions, and record the farewell destination. A failed
    /// end-of-session notification is logged, never surfaced.
    pub async fn finalize(&self) {
        let now = self.inner.clock.now();
        let notify = {
            let mut state = self.inner.lock();
            if state.finished.is_some() {
                return;
            }
            state.wait_tasks.abort_all();
            state.completion.reset_for(None);
            state.finished_at = Some(now);
            state.finished = Some(match self.inner.participant_id {
                Some(participant_id) => Farewell::Completion {
                    session_id: self.inner.session_id,
                    participant_id,
                },
                None => Farewell::Landing,
            });
            self.inner.participant_id.is_some()
        };

        info!(
            session_id = %self.inner.session_id,
            elapsed_seconds = (now - self.inner.started_at).num_seconds(),
            "session finished"
        );

        if notify {
            if let Err(error) = self.inner.lifecycle.end_session(self.inner.session_id).await {
                warn!(session_id = %self.inner.session_id, %error, "end-of-session notification failed");
            }
        }
    }
}

/// Visual weight when stepping out of a checked wine boundary at `index`.
fn transition_out_of(sequence: &SlideSequence, index: usize) -> TransitionKind {
    if sequence.next_wine_differs(index) {
        if let Some(wine) = sequence.wine_of(index + 1) {
            return TransitionKind::Wine {
                wine_id: wine.id(),
                name: wine.name().to_string(),
            };
        }
    }
    TransitionKind::Slide
}
