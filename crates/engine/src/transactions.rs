//! Transaction primitives.
//!
//! A `Transaction` is an immutable, append-only financial record. When it
//! was produced by the materializer, `definition_id` points back at the
//! recurring definition it came from and `occurred_at` carries the
//! *scheduled* execution instant, not the wall-clock time the job ran.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Amount signed with the direction of the balance change.
    pub fn signed(self, amount_minor: i64) -> i64 {
        match self {
            Self::Income => amount_minor,
            Self::Expense => -amount_minor,
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub title: String,
    pub category_id: Uuid,
    pub wallet_id: Uuid,
    pub created_by: String,
    pub amount_minor: i64,
    pub kind: TransactionKind,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub definition_id: Option<Uuid>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: String,
        category_id: Uuid,
        wallet_id: Uuid,
        created_by: String,
        amount_minor: i64,
        kind: TransactionKind,
        note: Option<String>,
        occurred_at: DateTime<Utc>,
        definition_id: Option<Uuid>,
    ) -> ResultEngine<Self> {
        if amount_minor < 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be >= 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            title,
            category_id,
            wallet_id,
            created_by,
            amount_minor,
            kind,
            note,
            occurred_at,
            definition_id,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub category_id: String,
    pub wallet_id: String,
    pub created_by: String,
    pub amount_minor: i64,
    pub kind: String,
    pub note: Option<String>,
    pub occurred_at: DateTimeUtc,
    pub definition_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            title: ActiveValue::Set(tx.title.clone()),
            category_id: ActiveValue::Set(tx.category_id.to_string()),
            wallet_id: ActiveValue::Set(tx.wallet_id.to_string()),
            created_by: ActiveValue::Set(tx.created_by.clone()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            note: ActiveValue::Set(tx.note.clone()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            definition_id: ActiveValue::Set(tx.definition_id.map(|id| id.to_string())),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            title: model.title,
            category_id: Uuid::parse_str(&model.category_id)
                .map_err(|_| EngineError::KeyNotFound("category not exists".to_string()))?,
            wallet_id: Uuid::parse_str(&model.wallet_id)
                .map_err(|_| EngineError::KeyNotFound("wallet not exists".to_string()))?,
            created_by: model.created_by,
            amount_minor: model.amount_minor,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            note: model.note,
            occurred_at: model.occurred_at,
            definition_id: model.definition_id.and_then(|s| Uuid::parse_str(&s).ok()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_amount_follows_direction() {
        assert_eq!(TransactionKind::Income.signed(1040), 1040);
        assert_eq!(TransactionKind::Expense.signed(1040), -1040);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(TransactionKind::try_from("transfer").is_err());
    }
}
