use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(User::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(User::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(User::CreatedAt).string().not_null())
                    .col(ColumnDef::new(User::LastSeen).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Provider::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Provider::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Provider::Owner).string().not_null())
                    .col(ColumnDef::new(Provider::ProviderType).string().not_null())
                    .col(
                        ColumnDef::new(Provider::Comment)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Provider::Payload)
                            .text()
                            .not_null()
                            .default("{}"),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Domain::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Domain::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Domain::Owner).string().not_null())
                    .col(ColumnDef::new(Domain::Name).string().not_null())
                    .col(ColumnDef::new(Domain::ProviderId).string().not_null())
                    .col(
                        ColumnDef::new(Domain::ZoneHistory)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(Domain::GroupName).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Zone::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Zone::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Zone::Author).string().not_null())
                    .col(ColumnDef::new(Zone::DefaultTtl).big_integer().not_null())
                    .col(ColumnDef::new(Zone::LastModified).string().not_null())
                    .col(ColumnDef::new(Zone::CommitMsg).string().null())
                    .col(ColumnDef::new(Zone::CommitDate).string().null())
                    .col(ColumnDef::new(Zone::Published).string().null())
                    .col(
                        ColumnDef::new(Zone::Services)
                            .text()
                            .not_null()
                            .default("{}"),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DomainLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DomainLog::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DomainLog::DomainId).string().not_null())
                    .col(ColumnDef::new(DomainLog::Author).string().not_null())
                    .col(ColumnDef::new(DomainLog::Date).string().not_null())
                    .col(ColumnDef::new(DomainLog::Level).string().not_null())
                    .col(ColumnDef::new(DomainLog::Content).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_providers_owner")
                    .table(Provider::Table)
                    .col(Provider::Owner)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_domains_owner")
                    .table(Domain::Table)
                    .col(Domain::Owner)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_domain_logs_domain_date")
                    .table(DomainLog::Table)
                    .col(DomainLog::DomainId)
                    .col(DomainLog::Date)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DomainLog::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Zone::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Domain::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Provider::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Email,
    CreatedAt,
    LastSeen,
}

#[derive(DeriveIden)]
enum Provider {
    #[sea_orm(iden = "providers")]
    Table,
    Id,
    Owner,
    ProviderType,
    Comment,
    Payload,
}

#[derive(DeriveIden)]
enum Domain {
    #[sea_orm(iden = "domains")]
    Table,
    Id,
    Owner,
    Name,
    ProviderId,
    ZoneHistory,
    GroupName,
}

#[derive(DeriveIden)]
enum Zone {
    #[sea_orm(iden = "zones")]
    Table,
    Id,
    Author,
    DefaultTtl,
    LastModified,
    CommitMsg,
    CommitDate,
    Published,
    Services,
}

#[derive(DeriveIden)]
enum DomainLog {
    #[sea_orm(iden = "domain_logs")]
    Table,
    Id,
    DomainId,
    Author,
    Date,
    Level,
    Content,
}
