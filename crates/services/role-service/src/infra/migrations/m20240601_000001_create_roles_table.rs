//! Migration: Create the role catalog and seed the fixed codes.

use domain::{ROLE_ADMIN, ROLE_SUPER_ADMIN, ROLE_USER};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Roles::Id).integer().not_null().primary_key())
                    .col(
                        ColumnDef::new(Roles::Code)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        // Seed the fixed catalog. super_admin is never assigned by the
        // services; it exists so operators can grant it out of band.
        let seed = Query::insert()
            .into_table(Roles::Table)
            .columns([Roles::Id, Roles::Code])
            .values_panic([1.into(), ROLE_SUPER_ADMIN.into()])
            .values_panic([2.into(), ROLE_USER.into()])
            .values_panic([3.into(), ROLE_ADMIN.into()])
            .to_owned();

        manager.exec_stmt(seed).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Roles {
    Table,
    Id,
    Code,
}
