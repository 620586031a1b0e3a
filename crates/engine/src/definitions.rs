//! Recurring-definition primitives.
//!
//! A `RecurringDefinition` is a template for a transaction that should be
//! instantiated repeatedly: what to create (title, category, wallet, user,
//! amount, direction) and when (next execution instant plus a frequency).
//! The materializer is the only writer of `next_execution_at` and `active`
//! after creation.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, TransactionKind};

/// How often a definition fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Once,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl TryFrom<&str> for Frequency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "once" => Ok(Self::Once),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(EngineError::InvalidFrequency(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringDefinition {
    pub id: Uuid,
    pub title: String,
    pub category_id: Uuid,
    pub wallet_id: Uuid,
    pub created_by: String,
    pub amount_minor: i64,
    pub kind: TransactionKind,
    pub note: Option<String>,
    pub next_execution_at: DateTime<Utc>,
    pub frequency: Frequency,
    pub active: bool,
}

impl RecurringDefinition {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: String,
        category_id: Uuid,
        wallet_id: Uuid,
        created_by: String,
        amount_minor: i64,
        kind: TransactionKind,
        note: Option<String>,
        next_execution_at: DateTime<Utc>,
        frequency: Frequency,
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
            next_execution_at,
            frequency,
            active: true,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recurring_definitions")]
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
    pub next_execution_at: DateTimeUtc,
    pub frequency: String,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RecurringDefinition> for ActiveModel {
    fn from(def: &RecurringDefinition) -> Self {
        Self {
            id: ActiveValue::Set(def.id.to_string()),
            title: ActiveValue::Set(def.title.clone()),
            category_id: ActiveValue::Set(def.category_id.to_string()),
            wallet_id: ActiveValue::Set(def.wallet_id.to_string()),
            created_by: ActiveValue::Set(def.created_by.clone()),
            amount_minor: ActiveValue::Set(def.amount_minor),
            kind: ActiveValue::Set(def.kind.as_str().to_string()),
            note: ActiveValue::Set(def.note.clone()),
            next_execution_at: ActiveValue::Set(def.next_execution_at),
            frequency: ActiveValue::Set(def.frequency.as_str().to_string()),
            active: ActiveValue::Set(def.active),
        }
    }
}

impl TryFrom<Model> for RecurringDefinition {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("definition not exists".to_string()))?,
            title: model.title,
            category_id: Uuid::parse_str(&model.category_id)
                .map_err(|_| EngineError::KeyNotFound("category not exists".to_string()))?,
            wallet_id: Uuid::parse_str(&model.wallet_id)
                .map_err(|_| EngineError::KeyNotFound("wallet not exists".to_string()))?,
            created_by: model.created_by,
            amount_minor: model.amount_minor,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            note: model.note,
            next_execution_at: model.next_execution_at,
            frequency: Frequency::try_from(model.frequency.as_str())?,
            active: model.active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_round_trips() {
        for freq in [
            Frequency::Once,
            Frequency::Daily,
            Frequency::Weekly,
            Frequency::Monthly,
            Frequency::Yearly,
        ] {
            assert_eq!(Frequency::try_from(freq.as_str()).unwrap(), freq);
        }
    }

    #[test]
    fn unknown_frequency_is_rejected() {
        let err = Frequency::try_from("hourly").unwrap_err();
        assert_eq!(err, EngineError::InvalidFrequency("hourly".to_string()));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let err = RecurringDefinition::new(
            "Rent".to_string(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "alice".to_string(),
            -1,
            TransactionKind::Expense,
            None,
            Utc::now(),
            Frequency::Monthly,
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidAmount("amount_minor must be >= 0".to_string())
        );
    }
}
