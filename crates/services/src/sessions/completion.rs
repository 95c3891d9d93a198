use tasting_core::model::WineId;

use super::averages::AveragesOutcome;

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

/// Where the current wine stands in the completion flow.
///
/// One tagged state instead of a pile of booleans: at most one of
/// blocking / loading / showing-averages can hold because they are
/// distinct variants.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionPhase {
    /// Nothing in flight for the current wine.
    Idle,
    /// Asking whether the wine has any group-scored questions.
    CheckingComparable,
    /// Asking whether the rest of the group has finished.
    CheckingGroupStatus,
    /// Navigation is gated behind the group; countdown runs once per second.
    Waiting { countdown_seconds: u32 },
    /// Analysis and averaging have been dispatched; waiting on the result.
    Processing,
    /// Group results (or their error marker) are on screen.
    ShowingAverages(AveragesOutcome),
}

//
// ─── STATE MACHINE ─────────────────────────────────────────────────────────────
//

/// Completion state for the wine currently on screen.
///
/// `generation` is bumped on every reset; async completions and timer
/// ticks carry the generation they were started under and are discarded
/// when it no longer matches, so a result arriving after the wine changed
/// can never be mis-applied.
#[derive(Debug, Clone, PartialEq)]
pub struct WineCompletion {
    wine_id: Option<WineId>,
    participant_finished: bool,
    triggered: bool,
    generation: u64,
    phase: CompletionPhase,
}

impl Default for WineCompletion {
    fn default() -> Self {
        Self::new()
    }
}

impl WineCompletion {
    #[must_use]
    pub fn new() -> Self {
        Self {
            wine_id: None,
            participant_finished: false,
            triggered: false,
            generation: 0,
            phase: CompletionPhase::Idle,
        }
    }

    #[must_use]
    pub fn wine_id(&self) -> Option<WineId> {
        self.wine_id
    }

    #[must_use]
    pub fn phase(&self) -> &CompletionPhase {
        &self.phase
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    #[must_use]
    pub fn participant_finished(&self) -> bool {
        self.participant_finished
    }

    /// True once a processing trigger has been dispatched for this wine.
    /// Never goes false → true more than once per generation.
    #[must_use]
    pub fn has_triggered(&self) -> bool {
        self.triggered
    }

    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self.phase, CompletionPhase::Waiting { .. })
    }

    /// True while one of the two boundary queries is in flight.
    #[must_use]
    pub fn is_checking(&self) -> bool {
        matches!(
            self.phase,
            CompletionPhase::CheckingComparable | CompletionPhase::CheckingGroupStatus
        )
    }

    #[must_use]
    pub fn is_loading_averages(&self) -> bool {
        matches!(self.phase, CompletionPhase::Processing)
    }

    #[must_use]
    pub fn is_showing_averages(&self) -> bool {
        matches!(self.phase, CompletionPhase::ShowingAverages(_))
    }

    /// Remaining blocking countdown, while waiting.
    #[must_use]
    pub fn countdown_seconds(&self) -> Option<u32> {
        match self.phase {
            CompletionPhase::Waiting { countdown_seconds } => Some(countdown_seconds),
            _ => None,
        }
    }

    /// The skip control appears only once the countdown has run out.
    #[must_use]
    pub fn skip_available(&self) -> bool {
        self.countdown_seconds() == Some(0)
    }

    #[must_use]
    pub fn averages(&self) -> Option<&AveragesOutcome> {
        match &self.phase {
            CompletionPhase::ShowingAverages(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Reset to the initial shape for a (possibly different) wine,
    /// invalidating every outstanding async result and timer tick.
    pub fn reset_for(&mut self, wine_id: Option<WineId>) {
        self.generation += 1;
        self.wine_id = wine_id;
        self.participant_finished = false;
        self.triggered = false;
        self.phase = CompletionPhase::Idle;
    }

    /// Enter the comparable-questions check for a completed wine.
    /// Returns the generation the caller must carry through its async work.
    pub fn begin_check(&mut self, wine_id: WineId) -> u64 {
        self.wine_id = Some(wine_id);
        self.phase = CompletionPhase::CheckingComparable;
        self.generation
    }

    /// Comparable questions exist; move on to the group status query.
    pub fn begin_group_check(&mut self) {
        self.phase = CompletionPhase::CheckingGroupStatus;
    }

    /// Enter the bounded blocking wait with a fresh countdown budget.
    pub fn begin_waiting(&mut self, countdown_budget: u32) {
        self.participant_finished = true;
        self.phase = CompletionPhase::Waiting {
            countdown_seconds: countdown_budget,
        };
    }

    /// The single gate into `Processing`. All triggers (debounce, poll,
    /// skip, straight-through group check) call this; only the first
    /// caller for the current generation proceeds.
    pub fn begin_processing(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.triggered {
            return false;
        }
        if !matches!(
            self.phase,
            CompletionPhase::Waiting { .. } | CompletionPhase::CheckingGroupStatus
        ) {
            return false;
        }
        self.triggered = true;
        self.participant_finished = true;
        self.phase = CompletionPhase::Processing;
        true
    }

    /// One countdown second elapsed. At zero the skip control becomes
    /// available but nothing is triggered; returns the remaining seconds
    /// while still waiting.
    pub fn tick_countdown(&mut self, generation: u64) -> Option<u32> {
        if generation != self.generation {
            return None;
        }
        match &mut self.phase {
            CompletionPhase::Waiting { countdown_seconds } => {
                *countdown_seconds = countdown_seconds.saturating_sub(1);
                Some(*countdown_seconds)
            }
            _ => None,
        }
    }

    /// Surface the averaging outcome. Stale generations are discarded.
    pub fn show_averages(&mut self, generation: u64, outcome: AveragesOutcome) -> bool {
        if generation != self.generation || !matches!(self.phase, CompletionPhase::Processing) {
            return false;
        }
        self.phase = CompletionPhase::ShowingAverages(outcome);
        true
    }

    /// The participant confirmed the results. Resets to the initial shape
    /// and reports whether there was anything to confirm, so a repeated
    /// call is a pure no-op.
    pub fn complete(&mut self) -> bool {
        if !self.is_showing_averages() {
            return false;
        }
        self.reset_for(None);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::averages::WineAverages;

    fn machine_in_waiting(budget: u32) -> (WineCompletion, u64) {
        let mut machine = WineCompletion::new();
        let generation = machine.begin_check(WineId::random());
        machine.begin_group_check();
        machine.begin_waiting(budget);
        (machine, generation)
    }

    #[test]
    fn only_first_trigger_wins() {
        let (mut machine, generation) = machine_in_waiting(120);

        assert!(machine.begin_processing(generation));
        assert!(!machine.begin_processing(generation));
        assert!(!machine.begin_processing(generation));
        assert!(machine.has_triggered());
        assert!(machine.is_loading_averages());
        assert!(!machine.is_blocking());
    }

    #[test]
    fn stale_generation_cannot_trigger() {
        let (mut machine, generation) = machine_in_waiting(120);
        machine.reset_for(Some(WineId::random()));

        assert!(!machine.begin_processing(generation));
        assert!(!machine.has_triggered());
    }

    #[test]
    fn countdown_reaches_zero_without_triggering() {
        let (mut machine, generation) = machine_in_waiting(2);

        assert_eq!(machine.tick_countdown(generation), Some(1));
        assert_eq!(machine.tick_countdown(generation), Some(0));
        assert!(machine.skip_available());
        assert!(machine.is_blocking());
        assert!(!machine.has_triggered());
        // Further ticks stay at zero.
        assert_eq!(machine.tick_countdown(generation), Some(0));
    }

    #[test]
    fn stale_ticks_are_discarded() {
        let (mut machine, generation) = machine_in_waiting(120);
        machine.reset_for(None);
        assert_eq!(machine.tick_countdown(generation), None);
    }

    #[test]
    fn straight_through_processing_from_group_check() {
        let mut machine = WineCompletion::new();
        let generation = machine.begin_check(WineId::random());
        machine.begin_group_check();

        assert!(machine.begin_processing(generation));
        assert!(machine.is_loading_averages());
        assert!(!machine.is_blocking());
    }

    #[test]
    fn averages_resolve_and_complete_is_idempotent() {
        let (mut machine, generation) = machine_in_waiting(120);
        assert!(machine.begin_processing(generation));
        assert!(machine.show_averages(generation, AveragesOutcome::Ready(WineAverages::empty(None))));
        assert!(machine.is_showing_averages());

        assert!(machine.complete());
        assert_eq!(*machine.phase(), CompletionPhase::Idle);
        assert!(!machine.has_triggered());
        assert!(!machine.complete());
    }

    #[test]
    fn stale_averages_are_discarded() {
        let (mut machine, generation) = machine_in_waiting(120);
        assert!(machine.begin_processing(generation));
        machine.reset_for(Some(WineId::random()));

        assert!(!machine.show_averages(generation, AveragesOutcome::Failed));
        assert!(!machine.is_showing_averages());
    }

    #[test]
    fn flags_are_mutually_exclusive_in_every_phase() {
        let (mut machine, generation) = machine_in_waiting(120);
        let exclusive = |m: &WineCompletion| {
            usize::from(m.is_blocking())
                + usize::from(m.is_showing_averages())
                + usize::from(m.is_loading_averages())
                <= 1
        };
        assert!(exclusive(&machine));
        machine.begin_processing(generation);
        assert!(exclusive(&machine));
        machine.show_averages(generation, AveragesOutcome::Failed);
        assert!(exclusive(&machine));
        machine.complete();
        assert!(exclusive(&machine));
    }
}
