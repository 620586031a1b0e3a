pub use sea_orm_migration::prelude::*;

mod m20250609_090000_users;
mod m20250609_091000_categories;
mod m20250609_092000_wallets;
mod m20250615_100000_transactions;
mod m20250615_110000_recurring_definitions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250609_090000_users::Migration),
            Box::new(m20250609_091000_categories::Migration),
            Box::new(m20250609_092000_wallets::Migration),
            Box::new(m20250615_100000_transactions::Migration),
            Box::new(m20250615_110000_recurring_definitions::Migration),
        ]
    }
}
