use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240801_000001_create_establishments_table::Migration),
            Box::new(m20240801_000002_create_inventory_items_table::Migration),
            Box::new(m20240801_000003_create_container_requests_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240801_000001_create_establishments_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240801_000001_create_establishments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Establishments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Establishments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Establishments::Name).string().not_null())
                        .col(
                            ColumnDef::new(Establishments::CreatedAt)
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
                        .name("idx_establishments_name")
                        .table(Establishments::Table)
                        .col(Establishments::Name)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Establishments::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Establishments {
        Table,
        Id,
        Name,
        CreatedAt,
    }
}

mod m20240801_000002_create_inventory_items_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240801_000002_create_inventory_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryItems::Table)
                        .if_not_exists()
                        // Id is the composite storage key "{fraction_id}-{capacity}"
                        .col(
                            ColumnDef::new(InventoryItems::Id)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::FractionId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::Capacity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::LastUpdated)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::CreatedAt)
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
                        .name("idx_inventory_items_fraction_capacity")
                        .table(InventoryItems::Table)
                        .col(InventoryItems::FractionId)
                        .col(InventoryItems::Capacity)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryItems::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum InventoryItems {
        Table,
        Id,
        FractionId,
        Capacity,
        Quantity,
        LastUpdated,
        CreatedAt,
    }
}

mod m20240801_000003_create_container_requests_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240801_000003_create_container_requests_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ContainerRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ContainerRequests::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ContainerRequests::Establishment)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ContainerRequests::Items).json().not_null())
                        .col(ColumnDef::new(ContainerRequests::Status).string().not_null())
                        .col(ColumnDef::new(ContainerRequests::StatusDetail).string().null())
                        .col(
                            ColumnDef::new(ContainerRequests::RequestedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ContainerRequests::Observations).string().null())
                        .col(
                            ColumnDef::new(ContainerRequests::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ContainerRequests::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_container_requests_status")
                        .table(ContainerRequests::Table)
                        .col(ContainerRequests::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_container_requests_establishment")
                        .table(ContainerRequests::Table)
                        .col(ContainerRequests::Establishment)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_container_requests_requested_at")
                        .table(ContainerRequests::Table)
                        .col(ContainerRequests::RequestedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ContainerRequests::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum ContainerRequests {
        Table,
        Id,
        Establishment,
        Items,
        Status,
        StatusDetail,
        RequestedAt,
        Observations,
        CreatedAt,
        UpdatedAt,
    }
}
