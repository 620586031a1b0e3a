use uuid::Uuid;

use sea_orm::{QueryFilter, QueryOrder, prelude::*};

use crate::{ResultEngine, Transaction, transactions};

use super::Engine;

impl Engine {
    /// Lists the transactions a definition has produced, oldest first.
    ///
    /// This is the audit trail: every materialized row carries the id of
    /// the definition it came from.
    pub async fn transactions_for_definition(
        &self,
        definition_id: Uuid,
    ) -> ResultEngine<Vec<Transaction>> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::DefinitionId.eq(definition_id.to_string()))
            .order_by_asc(transactions::Column::OccurredAt)
            .all(&self.database)
            .await?;

        let mut out = Vec::with_capacity(models.len());
        for model in models {
            out.push(Transaction::try_from(model)?);
        }
        Ok(out)
    }
}
