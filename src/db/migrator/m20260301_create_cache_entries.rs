use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CacheEntries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CacheEntries::CacheKey).string().not_null())
                    .col(ColumnDef::new(CacheEntries::Source).string().not_null())
                    .col(ColumnDef::new(CacheEntries::Payload).text().not_null())
                    .col(ColumnDef::new(CacheEntries::FetchedAt).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(CacheEntries::CacheKey)
                            .col(CacheEntries::Source),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cache_entries_source")
                    .table(CacheEntries::Table)
                    .col(CacheEntries::Source)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CacheEntries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CacheEntries {
    Table,
    CacheKey,
    Source,
    Payload,
    FetchedAt,
}
