use std::collections::HashSet;

use tasting_core::model::SectionTag;
use tasting_core::sequence::SlideSequence;

/// Progress of one section of the current wine, for the section indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionProgress {
    pub section: SectionTag,
    pub name: &'static str,
    /// 0–100. Capped at 95 while the section is still in progress; a
    /// section only reads 100 once its last slide has been completed.
    pub progress: f64,
    pub is_active: bool,
    pub is_completed: bool,
}

/// Per-section progress for the slide at `index`, measured against its
/// context run (the owning wine's slides, or the package-level run).
#[must_use]
pub fn section_progress(
    sequence: &SlideSequence,
    index: usize,
    completed: &HashSet<usize>,
) -> Vec<SectionProgress> {
    let context = sequence.context_slides(index);
    let context_start = sequence.context_start(index);
    let position = index.saturating_sub(context_start);

    SectionTag::ordered()
        .into_iter()
        .map(|section| {
            let span = sequence.section_span_in(context, section);
            let is_active = span.contains(position);
            let last_slide_done = span.len() > 0
                && position == span.end - 1
                && completed.contains(&(context_start + span.end - 1));
            let is_completed = position >= span.end || last_slide_done;

            let progress = if is_completed {
                100.0
            } else if is_active && span.len() > 0 {
                let through = (position - span.start) as f64 / span.len() as f64 * 100.0;
                through.min(95.0)
            } else {
                0.0
            };

            SectionProgress {
                section,
                name: section.display_name(),
                progress: progress.clamp(0.0, 100.0),
                is_active,
                is_completed,
            }
        })
        .collect()
}
