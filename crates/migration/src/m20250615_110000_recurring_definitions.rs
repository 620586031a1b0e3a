use sea_orm_migration::prelude::*;

use crate::m20250609_090000_users::Users;
use crate::m20250609_091000_categories::Categories;
use crate::m20250609_092000_wallets::Wallets;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum RecurringDefinitions {
    Table,
    Id,
    Title,
    CategoryId,
    WalletId,
    CreatedBy,
    AmountMinor,
    Kind,
    Note,
    NextExecutionAt,
    Frequency,
    Active,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RecurringDefinitions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RecurringDefinitions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RecurringDefinitions::Title)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringDefinitions::CategoryId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringDefinitions::WalletId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringDefinitions::CreatedBy)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringDefinitions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringDefinitions::Kind)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RecurringDefinitions::Note).string())
                    .col(
                        ColumnDef::new(RecurringDefinitions::NextExecutionAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringDefinitions::Frequency)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringDefinitions::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-recurring_definitions-category_id")
                            .from(
                                RecurringDefinitions::Table,
                                RecurringDefinitions::CategoryId,
                            )
                            .to(Categories::Table, Categories::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-recurring_definitions-wallet_id")
                            .from(RecurringDefinitions::Table, RecurringDefinitions::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-recurring_definitions-created_by")
                            .from(
                                RecurringDefinitions::Table,
                                RecurringDefinitions::CreatedBy,
                            )
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        // The due-item selector queries on (active, next_execution_at).
        manager
            .create_index(
                Index::create()
                    .name("idx-recurring_definitions-active-next_execution_at")
                    .table(RecurringDefinitions::Table)
                    .col(RecurringDefinitions::Active)
                    .col(RecurringDefinitions::NextExecutionAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecurringDefinitions::Table).to_owned())
            .await
    }
}
