use serde::{Deserialize, Serialize};
use url::Url;

use crate::model::ids::WineId;

/// One tasting item in the package, grouping a contiguous run of slides.
/// Immutable for the session's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wine {
    id: WineId,
    name: String,
    description: Option<String>,
    image_url: Option<Url>,
    position: u32,
}

impl Wine {
    #[must_use]
    pub fn new(
        id: WineId,
        name: impl Into<String>,
        description: Option<String>,
        image_url: Option<Url>,
        position: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description,
            image_url,
            position,
        }
    }

    #[must_use]
    pub fn id(&self) -> WineId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&Url> {
        self.image_url.as_ref()
    }

    /// 1-based ordinal among the package's wines.
    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }
}
