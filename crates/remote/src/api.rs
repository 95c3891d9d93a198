use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tasting_core::model::{AnswerValue, ParticipantId, SessionId, SlideId, WineId};

/// Errors surfaced by remote collaborators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

/// One question whose answers are aggregated across participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableQuestion {
    pub slide_id: SlideId,
    pub title: Option<String>,
}

/// Group completion state for one wine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStatus {
    pub all_participants_completed: bool,
    pub all_non_host_participants_completed: bool,
}

impl CompletionStatus {
    /// The group is done when everyone, or everyone except the host, has
    /// answered.
    #[must_use]
    pub fn group_done(&self) -> bool {
        self.all_participants_completed || self.all_non_host_participants_completed
    }
}

/// Read-side collaborators of the completion orchestrator.
///
/// All calls are opaque remote computations; the engine only depends on
/// the shapes below. `calculate_averages` deliberately returns raw JSON:
/// the payload shape varies by server version and is normalized by the
/// orchestrator.
#[async_trait]
pub trait TastingApi: Send + Sync {
    /// Questions of this wine whose answers are aggregated group-wide.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or decode failure.
    async fn comparable_questions(
        &self,
        session: SessionId,
        wine: WineId,
    ) -> Result<Vec<ComparableQuestion>, ApiError>;

    /// Whether the rest of the group has finished this wine.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or decode failure.
    async fn completion_status(
        &self,
        session: SessionId,
        wine: WineId,
    ) -> Result<CompletionStatus, ApiError>;

    /// Kick off sentiment analysis over the wine's text answers.
    /// Best-effort; the result is not consumed by the engine.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure.
    async fn sentiment_analysis(&self, session: SessionId, wine: WineId) -> Result<(), ApiError>;

    /// Compute group averages for the wine's comparable questions.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or decode failure.
    async fn calculate_averages(
        &self,
        session: SessionId,
        wine: WineId,
    ) -> Result<serde_json::Value, ApiError>;
}

/// Durable answer persistence. Fire-and-forget from the engine's side.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Persist one answer.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure; the engine logs and
    /// swallows it.
    async fn save_response(
        &self,
        participant: ParticipantId,
        slide: SlideId,
        value: &AnswerValue,
    ) -> Result<(), ApiError>;
}

/// Session lifecycle collaborator.
#[async_trait]
pub trait SessionLifecycle: Send + Sync {
    /// Notify the backend that this participant's session has ended.
    /// Idempotent on the server side.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure.
    async fn end_session(&self, session: SessionId) -> Result<(), ApiError>;
}

//
// ─── IN-MEMORY FAKE ────────────────────────────────────────────────────────────
//

/// Scripted behavior for one wine in the in-memory fake.
#[derive(Debug, Clone, Default)]
pub struct WineScript {
    pub comparable: Vec<ComparableQuestion>,
    pub comparable_fails: bool,
    /// Statuses returned by successive `completion_status` calls; the last
    /// entry repeats once the list is exhausted.
    pub statuses: Vec<Result<CompletionStatus, ()>>,
    pub averages: Option<serde_json::Value>,
    pub averages_fails: bool,
}

#[derive(Default)]
struct InMemoryInner {
    scripts: HashMap<WineId, WineScript>,
    status_cursor: HashMap<WineId, usize>,
    saved: Vec<(ParticipantId, SlideId, AnswerValue)>,
}

/// In-memory collaborator fake with scripted responses and call counters,
/// for exercising the engine without a server.
#[derive(Default)]
pub struct InMemoryApi {
    inner: Mutex<InMemoryInner>,
    pub comparable_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub sentiment_calls: AtomicUsize,
    pub averages_calls: AtomicUsize,
    pub end_session_calls: AtomicUsize,
}

impl InMemoryApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_wine(&self, wine: WineId, script: WineScript) {
        let mut inner = self.inner.lock().expect("fake lock poisoned");
        inner.scripts.insert(wine, script);
        inner.status_cursor.insert(wine, 0);
    }

    #[must_use]
    pub fn saved_responses(&self) -> Vec<(ParticipantId, SlideId, AnswerValue)> {
        self.inner.lock().expect("fake lock poisoned").saved.clone()
    }

    fn script(&self, wine: WineId) -> WineScript {
        self.inner
            .lock()
            .expect("fake lock poisoned")
            .scripts
            .get(&wine)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl TastingApi for InMemoryApi {
    async fn comparable_questions(
        &self,
        _session: SessionId,
        wine: WineId,
    ) -> Result<Vec<ComparableQuestion>, ApiError> {
        self.comparable_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script(wine);
        if script.comparable_fails {
            return Err(ApiError::Unavailable("comparable-questions".into()));
        }
        Ok(script.comparable)
    }

    async fn completion_status(
        &self,
        _session: SessionId,
        wine: WineId,
    ) -> Result<CompletionStatus, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.lock().expect("fake lock poisoned");
        let script = inner.scripts.get(&wine).cloned().unwrap_or_default();
        if script.statuses.is_empty() {
            return Ok(CompletionStatus::default());
        }
        let cursor = inner.status_cursor.entry(wine).or_insert(0);
        let index = (*cursor).min(script.statuses.len() - 1);
        *cursor += 1;
        script.statuses[index]
            .map_err(|()| ApiError::Unavailable("completion-status".into()))
    }

    async fn sentiment_analysis(
        &self,
        _session: SessionId,
        _wine: WineId,
    ) -> Result<(), ApiError> {
        self.sentiment_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn calculate_averages(
        &self,
        _session: SessionId,
        wine: WineId,
    ) -> Result<serde_json::Value, ApiError> {
        self.averages_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script(wine);
        if script.averages_fails {
            return Err(ApiError::Unavailable("calculate-averages".into()));
        }
        Ok(script
            .averages
            .unwrap_or_else(|| serde_json::json!({ "questions": {} })))
    }
}

#[async_trait]
impl ResponseStore for InMemoryApi {
    async fn save_response(
        &self,
        participant: ParticipantId,
        slide: SlideId,
        value: &AnswerValue,
    ) -> Result<(), ApiError> {
        let mut inner = self.inner.lock().expect("fake lock poisoned");
        inner.saved.push((participant, slide, value.clone()));
        Ok(())
    }
}

#[async_trait]
impl SessionLifecycle for InMemoryApi {
    async fn end_session(&self, _session: SessionId) -> Result<(), ApiError> {
        self.end_session_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_statuses_advance_and_repeat() {
        let api = InMemoryApi::new();
        let wine = WineId::random();
        let session = SessionId::random();
        let done = CompletionStatus {
            all_participants_completed: true,
            all_non_host_participants_completed: true,
        };
        api.script_wine(
            wine,
            WineScript {
                statuses: vec![Ok(CompletionStatus::default()), Ok(done)],
                ..WineScript::default()
            },
        );

        let first = api.completion_status(session, wine).await.unwrap();
        assert!(!first.group_done());
        let second = api.completion_status(session, wine).await.unwrap();
        assert!(second.group_done());
        let third = api.completion_status(session, wine).await.unwrap();
        assert!(third.group_done());
        assert_eq!(api.status_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn unscripted_wine_has_no_comparable_questions() {
        let api = InMemoryApi::new();
        let questions = api
            .comparable_questions(SessionId::random(), WineId::random())
            .await
            .unwrap();
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn saves_are_recorded() {
        let api = InMemoryApi::new();
        let participant = ParticipantId::random();
        let slide = SlideId::random();
        api.save_response(participant, slide, &AnswerValue::Bool(true))
            .await
            .unwrap();
        assert_eq!(api.saved_responses().len(), 1);
    }
}
