//! Due-item selection.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{QueryFilter, QuerySelect, prelude::*};

use crate::{ResultEngine, definitions};

use super::Engine;

impl Engine {
    /// Identifiers of definitions that are active and due at `as_of`.
    ///
    /// Returns ids only; the materializer re-fetches each row under its
    /// exclusive hold, so nothing read here is trusted past selection.
    /// Every call re-queries current state.
    pub async fn select_due(&self, as_of: DateTime<Utc>) -> ResultEngine<Vec<Uuid>> {
        let raw_ids: Vec<String> = definitions::Entity::find()
            .select_only()
            .column(definitions::Column::Id)
            .filter(definitions::Column::Active.eq(true))
            .filter(definitions::Column::NextExecutionAt.lte(as_of))
            .into_tuple()
            .all(&self.database)
            .await?;

        // A malformed row must not starve the rest of the tick; it is
        // logged and left for administrative repair.
        let mut ids = Vec::with_capacity(raw_ids.len());
        for raw in raw_ids {
            match Uuid::parse_str(&raw) {
                Ok(id) => ids.push(id),
                Err(_) => {
                    tracing::error!("skipping definition with unparseable id {raw:?}");
                }
            }
        }
        Ok(ids)
    }
}
