use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use tasting_core::model::{AnswerValue, ParticipantId, SessionId, SlideId, WineId};

use crate::api::{
    ApiError, ComparableQuestion, CompletionStatus, ResponseStore, SessionLifecycle, TastingApi,
};

/// Connection settings for the tasting backend.
#[derive(Clone, Debug)]
pub struct HttpApiConfig {
    pub base_url: String,
}

impl HttpApiConfig {
    /// Read the backend base URL from `TASTING_API_BASE_URL`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("TASTING_API_BASE_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        Some(Self { base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// HTTP implementation of the collaborator contracts.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    config: HttpApiConfig,
}

impl HttpApi {
    #[must_use]
    pub fn new(config: HttpApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.config.url(path);
        debug!(%url, "remote query");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.config.url(path);
        debug!(%url, "remote command");
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }
}

#[derive(Debug, Deserialize)]
struct ComparableQuestionsBody {
    #[serde(default)]
    questions: Vec<ComparableQuestionBody>,
}

#[derive(Debug, Deserialize)]
struct ComparableQuestionBody {
    #[serde(alias = "slideId", alias = "id")]
    slide_id: SlideId,
    #[serde(default, alias = "questionTitle")]
    title: Option<String>,
}

#[async_trait]
impl TastingApi for HttpApi {
    async fn comparable_questions(
        &self,
        session: SessionId,
        wine: WineId,
    ) -> Result<Vec<ComparableQuestion>, ApiError> {
        let body: ComparableQuestionsBody = self
            .get_json(&format!(
                "api/sessions/{session}/wines/{wine}/comparable-questions"
            ))
            .await?;
        Ok(body
            .questions
            .into_iter()
            .map(|q| ComparableQuestion {
                slide_id: q.slide_id,
                title: q.title,
            })
            .collect())
    }

    async fn completion_status(
        &self,
        session: SessionId,
        wine: WineId,
    ) -> Result<CompletionStatus, ApiError> {
        self.get_json(&format!(
            "api/sessions/{session}/wines/{wine}/completion-status"
        ))
        .await
    }

    async fn sentiment_analysis(&self, session: SessionId, wine: WineId) -> Result<(), ApiError> {
        let url = self
            .config
            .url(&format!("api/sessions/{session}/wines/{wine}/sentiment-analysis"));
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(())
    }

    async fn calculate_averages(
        &self,
        session: SessionId,
        wine: WineId,
    ) -> Result<serde_json::Value, ApiError> {
        self.post_json(&format!(
            "api/sessions/{session}/wines/{wine}/calculate-averages"
        ))
        .await
    }
}

#[async_trait]
impl ResponseStore for HttpApi {
    async fn save_response(
        &self,
        participant: ParticipantId,
        slide: SlideId,
        value: &AnswerValue,
    ) -> Result<(), ApiError> {
        let url = self
            .config
            .url(&format!("api/participants/{participant}/responses"));
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "slideId": slide, "answerJson": value }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionLifecycle for HttpApi {
    async fn end_session(&self, session: SessionId) -> Result<(), ApiError> {
        let url = self.config.url(&format!("api/sessions/{session}/end"));
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(())
    }
}
