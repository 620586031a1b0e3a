//! Materialization of one recurring definition.
//!
//! The sequence runs under an exclusive per-definition hold: re-fetch,
//! re-validate due-ness, append the concrete transaction, adjust the
//! wallet balance, then advance or deactivate the definition. Transaction
//! creation and definition update share one database transaction; a
//! failure anywhere rolls the whole unit back and leaves the definition
//! due for the next tick.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{
    EngineError, Frequency, RecurringDefinition, ResultEngine, Transaction, definitions,
    next_occurrence, transactions, wallets,
};

use super::{Engine, with_tx};

/// Result of one materialization attempt. Failures surface as `Err`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterializationOutcome {
    /// A transaction was created and the definition advanced (or was
    /// deactivated, for one-shot definitions).
    Applied { transaction_id: Uuid },
    /// The definition's next execution moved past `as_of` since
    /// selection; an overlapping tick already applied it.
    SkippedNotDue,
    /// The definition was deactivated since selection.
    SkippedInactive,
}

impl Engine {
    /// Materialize a single definition that was selected as due at `as_of`.
    ///
    /// Transient persistence failures retry the whole atomic unit per the
    /// engine's [`crate::RetryPolicy`]; permanent failures surface
    /// immediately with the definition left active and due.
    pub async fn materialize_one(
        &self,
        definition_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> ResultEngine<MaterializationOutcome> {
        let lock = self.definition_lock(definition_id);
        let guard = lock.lock().await;

        let retry = self.config.retry.clone();
        let result = retry
            .run(|| self.materialize_locked(definition_id, as_of))
            .await;

        drop(guard);
        drop(lock);
        self.release_definition_lock(definition_id);
        result
    }

    /// One attempt of the atomic unit. Caller holds the definition lock.
    async fn materialize_locked(
        &self,
        definition_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> ResultEngine<MaterializationOutcome> {
        with_tx!(self, |db_tx| {
            let model = definitions::Entity::find_by_id(definition_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("definition not exists".to_string()))?;
            let definition = RecurringDefinition::try_from(model)?;

            if !definition.active {
                Ok(MaterializationOutcome::SkippedInactive)
            } else if definition.next_execution_at > as_of {
                Ok(MaterializationOutcome::SkippedNotDue)
            } else {
                let transaction_id = self.apply_definition(&db_tx, &definition).await?;
                tracing::debug!(
                    "materialized definition {definition_id} into transaction {transaction_id}"
                );
                Ok(MaterializationOutcome::Applied { transaction_id })
            }
        })
    }

    /// Appends the transaction, adjusts the wallet balance and advances
    /// the definition, all on the given database transaction.
    async fn apply_definition(
        &self,
        db_tx: &sea_orm::DatabaseTransaction,
        definition: &RecurringDefinition,
    ) -> ResultEngine<Uuid> {
        // occurred_at is the scheduled instant, not wall-clock now.
        let transaction = Transaction::new(
            definition.title.clone(),
            definition.category_id,
            definition.wallet_id,
            definition.created_by.clone(),
            definition.amount_minor,
            definition.kind,
            definition.note.clone(),
            definition.next_execution_at,
            Some(definition.id),
        )?;
        let transaction_id = transaction.id;
        transactions::ActiveModel::from(&transaction)
            .insert(db_tx)
            .await?;

        let wallet_model = wallets::Entity::find_by_id(definition.wallet_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
        let new_balance = wallet_model
            .balance_minor
            .checked_add(definition.kind.signed(definition.amount_minor))
            .ok_or_else(|| EngineError::InvalidAmount("wallet balance overflow".to_string()))?;
        let wallet_update = wallets::ActiveModel {
            id: ActiveValue::Set(wallet_model.id),
            balance_minor: ActiveValue::Set(new_balance),
            ..Default::default()
        };
        wallet_update.update(db_tx).await?;

        // Advance from the previous scheduled instant to avoid drift.
        let advanced = match (
            definition.frequency,
            next_occurrence(definition.next_execution_at, definition.frequency),
        ) {
            (Frequency::Once, _) => definitions::ActiveModel {
                id: ActiveValue::Set(definition.id.to_string()),
                active: ActiveValue::Set(false),
                ..Default::default()
            },
            (_, Some(next)) => definitions::ActiveModel {
                id: ActiveValue::Set(definition.id.to_string()),
                next_execution_at: ActiveValue::Set(next),
                ..Default::default()
            },
            (frequency, None) => {
                // Only `Once` may end a schedule; anything else is a data
                // error and the definition stays due.
                return Err(EngineError::Recurrence(format!(
                    "no successor of {} for frequency {}",
                    definition.next_execution_at,
                    frequency.as_str()
                )));
            }
        };
        advanced.update(db_tx).await?;

        Ok(transaction_id)
    }
}
