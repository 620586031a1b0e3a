use uuid::Uuid;

use sea_orm::prelude::*;

use crate::{EngineError, ResultEngine, Wallet, wallets};

use super::Engine;

impl Engine {
    /// Return a wallet snapshot from DB.
    pub async fn wallet(&self, wallet_id: Uuid) -> ResultEngine<Wallet> {
        let model = wallets::Entity::find_by_id(wallet_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
        Wallet::try_from(model)
    }
}
