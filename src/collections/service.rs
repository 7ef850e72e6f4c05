//! Service details: a fixed form rather than a record list.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::collections::{string_or_empty, SyncCollection};
use crate::core::{Result, SyncError};
use crate::document::MemorialDocument;
use crate::editor::CollectionEditor;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub venue: String,

    #[serde(default, deserialize_with = "string_or_empty")]
    pub address: String,

    #[serde(default)]
    pub service_date: Option<NaiveDate>,

    /// Local start time as entered, e.g. "14:30".
    #[serde(default, deserialize_with = "string_or_empty")]
    pub start_time: String,

    #[serde(default, deserialize_with = "string_or_empty")]
    pub officiant: String,

    #[serde(default, deserialize_with = "string_or_empty")]
    pub livestream_url: String,

    #[serde(default, deserialize_with = "string_or_empty")]
    pub notes: String,
}

impl ServiceInfo {
    pub fn validate(&self) -> Result<()> {
        let url = self.livestream_url.trim();
        if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(SyncError::Validation(format!(
                "Livestream link '{url}' is not an http(s) URL"
            )));
        }
        Ok(())
    }

    fn filled_fields(&self) -> usize {
        let strings = [
            &self.venue,
            &self.address,
            &self.start_time,
            &self.officiant,
            &self.livestream_url,
            &self.notes,
        ];
        strings.iter().filter(|s| !s.trim().is_empty()).count()
            + usize::from(self.service_date.is_some())
    }
}

/// Derived completion statistics for the service form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    pub filled_fields: usize,
    pub total_fields: usize,
}

impl ServiceStats {
    pub fn completion(&self) -> f32 {
        if self.total_fields == 0 {
            return 0.0;
        }
        self.filled_fields as f32 / self.total_fields as f32
    }
}

/// Service-details plugin for the sync engine.
pub struct ServiceSync;

impl SyncCollection for ServiceSync {
    type State = ServiceInfo;
    type Stats = ServiceStats;

    const SLUG: &'static str = "service";

    fn extract(document: &MemorialDocument) -> Self::State {
        document.service.clone()
    }

    fn store(document: &mut MemorialDocument, state: &Self::State) {
        document.service = state.clone();
    }

    fn stats(state: &Self::State) -> Self::Stats {
        ServiceStats {
            filled_fields: state.filled_fields(),
            total_fields: 7,
        }
    }
}

/// Editor for the service details form.
pub type ServiceEditor = CollectionEditor<ServiceSync>;

impl CollectionEditor<ServiceSync> {
    /// Edits the service form. The edited form is re-validated; a failing
    /// edit leaves the working copy untouched.
    pub async fn edit_service(&self, apply: impl FnOnce(&mut ServiceInfo) + Send) -> Result<()> {
        self.mutate(move |service| {
            apply(service);
            service.validate()
        })
        .await
    }
}
