#![forbid(unsafe_code)]

pub mod api;
pub mod http;

pub use api::{
    ApiError, ComparableQuestion, CompletionStatus, InMemoryApi, ResponseStore, SessionLifecycle,
    TastingApi, WineScript,
};
pub use http::{HttpApi, HttpApiConfig};
