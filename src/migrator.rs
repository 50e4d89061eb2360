use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_users_table::Migration),
            Box::new(m20260101_000002_create_beats_table::Migration),
            Box::new(m20260101_000003_create_payments_table::Migration),
            Box::new(m20260101_000004_create_purchased_beats_table::Migration),
            Box::new(m20260101_000005_create_favorites_table::Migration),
            Box::new(m20260101_000006_create_subscriptions_table::Migration),
        ]
    }
}

// Migration implementations

mod m20260101_000001_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000001_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null())
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::Role).string_len(16).not_null())
                        .col(ColumnDef::new(Users::FirstName).string().null())
                        .col(ColumnDef::new(Users::LastName).string().null())
                        .col(ColumnDef::new(Users::City).string().null())
                        .col(ColumnDef::new(Users::State).string().null())
                        .col(ColumnDef::new(Users::Country).string().null())
                        .col(ColumnDef::new(Users::Age).integer().null())
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_email")
                        .table(Users::Table)
                        .col(Users::Email)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        Email,
        PasswordHash,
        Role,
        FirstName,
        LastName,
        City,
        State,
        Country,
        Age,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260101_000002_create_beats_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000002_create_beats_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Beats::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Beats::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Beats::Title).string().not_null())
                        .col(ColumnDef::new(Beats::Artist).string().not_null())
                        .col(ColumnDef::new(Beats::Genre).string().not_null())
                        .col(ColumnDef::new(Beats::Price).decimal().not_null())
                        .col(ColumnDef::new(Beats::AudioFile).string().not_null())
                        .col(ColumnDef::new(Beats::Image).string().null())
                        .col(
                            ColumnDef::new(Beats::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Beats::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_beats_genre")
                        .table(Beats::Table)
                        .col(Beats::Genre)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Beats::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Beats {
        Table,
        Id,
        Title,
        Artist,
        Genre,
        Price,
        AudioFile,
        Image,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260101_000003_create_payments_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000003_create_payments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Payments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Payments::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Payments::UserId).uuid().not_null())
                        .col(ColumnDef::new(Payments::PaymentIntentId).string().not_null())
                        .col(ColumnDef::new(Payments::Amount).decimal().not_null())
                        .col(ColumnDef::new(Payments::Status).string_len(16).not_null())
                        .col(ColumnDef::new(Payments::BeatIds).json().not_null())
                        .col(
                            ColumnDef::new(Payments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Payments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // The ledger's idempotency key: one row per gateway payment intent.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payments_payment_intent_id")
                        .table(Payments::Table)
                        .col(Payments::PaymentIntentId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payments_user_id")
                        .table(Payments::Table)
                        .col(Payments::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Payments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Payments {
        Table,
        Id,
        UserId,
        PaymentIntentId,
        Amount,
        Status,
        BeatIds,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260101_000004_create_purchased_beats_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000004_create_purchased_beats_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchasedBeats::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchasedBeats::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchasedBeats::UserId).uuid().not_null())
                        .col(ColumnDef::new(PurchasedBeats::BeatId).uuid().not_null())
                        .col(ColumnDef::new(PurchasedBeats::PaymentId).uuid().not_null())
                        .col(
                            ColumnDef::new(PurchasedBeats::GrantedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One entitlement per (user, beat); the conditional-insert target.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchased_beats_user_beat")
                        .table(PurchasedBeats::Table)
                        .col(PurchasedBeats::UserId)
                        .col(PurchasedBeats::BeatId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchasedBeats::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PurchasedBeats {
        Table,
        Id,
        UserId,
        BeatId,
        PaymentId,
        GrantedAt,
    }
}

mod m20260101_000005_create_favorites_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000005_create_favorites_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Favorites::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Favorites::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Favorites::UserId).uuid().not_null())
                        .col(ColumnDef::new(Favorites::BeatId).uuid().not_null())
                        .col(
                            ColumnDef::new(Favorites::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_favorites_user_beat")
                        .table(Favorites::Table)
                        .col(Favorites::UserId)
                        .col(Favorites::BeatId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Favorites::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Favorites {
        Table,
        Id,
        UserId,
        BeatId,
        CreatedAt,
    }
}

mod m20260101_000006_create_subscriptions_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000006_create_subscriptions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Subscriptions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Subscriptions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Subscriptions::UserId).uuid().not_null())
                        .col(ColumnDef::new(Subscriptions::Tier).string_len(16).not_null())
                        .col(
                            ColumnDef::new(Subscriptions::Status)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Subscriptions::ExpiresAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Subscriptions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Subscriptions::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_subscriptions_user_id")
                        .table(Subscriptions::Table)
                        .col(Subscriptions::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Subscriptions {
        Table,
        Id,
        UserId,
        Tier,
        Status,
        ExpiresAt,
        CreatedAt,
        UpdatedAt,
    }
}
