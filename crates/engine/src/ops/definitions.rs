//! Boundary API for recurring definitions.
//!
//! The wallet-facing layer creates definitions and can pause or resume
//! them; the materializer is the only other writer. Deleting a definition
//! is an administrative action directly against the store and is not
//! offered here.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{EngineError, Frequency, RecurringDefinition, ResultEngine, TransactionKind, definitions};

use super::{Engine, with_tx};

impl Engine {
    /// Register a new recurring definition, active and due at
    /// `next_execution_at`.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_definition(
        &self,
        title: &str,
        category_id: Uuid,
        wallet_id: Uuid,
        amount_minor: i64,
        kind: TransactionKind,
        note: Option<&str>,
        next_execution_at: DateTime<Utc>,
        frequency: Frequency,
        created_by: &str,
    ) -> ResultEngine<Uuid> {
        let title = title.trim();
        if title.is_empty() {
            return Err(EngineError::InvalidAmount(
                "definition title must not be empty".to_string(),
            ));
        }

        let definition = RecurringDefinition::new(
            title.to_string(),
            category_id,
            wallet_id,
            created_by.to_string(),
            amount_minor,
            kind,
            note.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string),
            next_execution_at,
            frequency,
        )?;
        let id = definition.id;

        with_tx!(self, |db_tx| {
            definitions::ActiveModel::from(&definition)
                .insert(&db_tx)
                .await?;
            Ok(id)
        })
    }

    /// Return a definition snapshot from DB.
    pub async fn definition(&self, definition_id: Uuid) -> ResultEngine<RecurringDefinition> {
        let model = definitions::Entity::find_by_id(definition_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("definition not exists".to_string()))?;
        RecurringDefinition::try_from(model)
    }

    /// Pause or resume a definition (a manual edit concurrent with the
    /// scheduler; the materializer re-validates under its lock).
    pub async fn set_definition_active(&self, definition_id: Uuid, active: bool) -> ResultEngine<()> {
        let lock = self.definition_lock(definition_id);
        let guard = lock.lock().await;

        let result = self.set_active_locked(definition_id, active).await;

        drop(guard);
        drop(lock);
        self.release_definition_lock(definition_id);
        result
    }

    async fn set_active_locked(&self, definition_id: Uuid, active: bool) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = definitions::Entity::find_by_id(definition_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("definition not exists".to_string()))?;

            if model.active != active {
                let update = definitions::ActiveModel {
                    id: ActiveValue::Set(model.id),
                    active: ActiveValue::Set(active),
                    ..Default::default()
                };
                update.update(&db_tx).await?;
            }
            Ok(())
        })
    }

    /// Lists definitions attached to a wallet, most urgent first.
    pub async fn list_definitions_for_wallet(
        &self,
        wallet_id: Uuid,
    ) -> ResultEngine<Vec<RecurringDefinition>> {
        let models = definitions::Entity::find()
            .filter(definitions::Column::WalletId.eq(wallet_id.to_string()))
            .order_by_asc(definitions::Column::NextExecutionAt)
            .all(&self.database)
            .await?;

        let mut out = Vec::with_capacity(models.len());
        for model in models {
            out.push(RecurringDefinition::try_from(model)?);
        }
        Ok(out)
    }
}
