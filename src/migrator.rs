use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_catalog_tables::Migration),
            Box::new(m20240301_000002_create_procurement_tables::Migration),
            Box::new(m20240301_000003_create_orders_tables::Migration),
            Box::new(m20240301_000004_create_logistics_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::Sku).string().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Reference).string().null())
                        .col(ColumnDef::new(Products::Kind).string().not_null())
                        .col(
                            ColumnDef::new(Products::StockSnapshotLineId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_products_sku")
                        .table(Products::Table)
                        .col(Products::Sku)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductBundleItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductBundleItems::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductBundleItems::BundleId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductBundleItems::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductBundleItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(EmployeeGroups::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(EmployeeGroups::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(EmployeeGroups::Name).string().not_null())
                        .col(
                            ColumnDef::new(EmployeeGroups::DeliveryLocation)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(EmployeeGroups::OfficeStreet).string().null())
                        .col(
                            ColumnDef::new(EmployeeGroups::OfficeStreetNumber)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(EmployeeGroups::OfficeApartmentNumber)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(EmployeeGroups::OfficeCity).string().null())
                        .col(
                            ColumnDef::new(EmployeeGroups::OrganizationName)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(EmployeeGroups::ManagerFullName)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(EmployeeGroups::ManagerPhoneNumber)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(EmployeeGroups::ManagerEmail).string().null())
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(EmployeeGroups::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductBundleItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        Sku,
        Name,
        Reference,
        Kind,
        StockSnapshotLineId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ProductBundleItems {
        Table,
        Id,
        BundleId,
        ProductId,
        Quantity,
    }

    #[derive(DeriveIden)]
    enum EmployeeGroups {
        Table,
        Id,
        Name,
        DeliveryLocation,
        OfficeStreet,
        OfficeStreetNumber,
        OfficeApartmentNumber,
        OfficeCity,
        OrganizationName,
        ManagerFullName,
        ManagerPhoneNumber,
        ManagerEmail,
    }
}

mod m20240301_000002_create_procurement_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_procurement_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrders::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::SupplierName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::Status).string().not_null())
                        .col(ColumnDef::new(PurchaseOrders::Notes).text().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::LogisticsCenterId)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::LogisticsCenterStatus)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::SentToLogisticsCenterAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_purchase_orders_logistics_center_id")
                        .table(PurchaseOrders::Table)
                        .col(PurchaseOrders::LogisticsCenterId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderLines::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::PurchaseOrderId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::ProductSku)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::QuantityOrdered)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::QuantitySentToLogisticsCenter)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_purchase_order_lines_po_sku")
                        .table(PurchaseOrderLines::Table)
                        .col(PurchaseOrderLines::PurchaseOrderId)
                        .col(PurchaseOrderLines::ProductSku)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderSentLog::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderSentLog::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderSentLog::PurchaseOrderId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderSentLog::SentAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchaseOrderSentLog::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseOrderLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum PurchaseOrders {
        Table,
        Id,
        SupplierName,
        Status,
        Notes,
        LogisticsCenterId,
        LogisticsCenterStatus,
        SentToLogisticsCenterAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum PurchaseOrderLines {
        Table,
        Id,
        PurchaseOrderId,
        ProductSku,
        QuantityOrdered,
        QuantitySentToLogisticsCenter,
    }

    #[derive(DeriveIden)]
    enum PurchaseOrderSentLog {
        Table,
        Id,
        PurchaseOrderId,
        SentAt,
    }
}

mod m20240301_000003_create_orders_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_orders_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Orders::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::OrderNumber).string().not_null())
                        .col(
                            ColumnDef::new(Orders::EmployeeGroupId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::Status).string().not_null())
                        .col(ColumnDef::new(Orders::FullName).string().not_null())
                        .col(ColumnDef::new(Orders::PhoneNumber).string().null())
                        .col(
                            ColumnDef::new(Orders::AdditionalPhoneNumber)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(Orders::Email).string().null())
                        .col(ColumnDef::new(Orders::DeliveryStreet).string().null())
                        .col(
                            ColumnDef::new(Orders::DeliveryStreetNumber)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::DeliveryApartmentNumber)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(Orders::DeliveryCity).string().null())
                        .col(
                            ColumnDef::new(Orders::DeliveryAdditionalDetails)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(Orders::LogisticsCenterId).string().null())
                        .col(
                            ColumnDef::new(Orders::LogisticsCenterStatus)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::LogisticsCenterShippingNumber)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_orders_order_number")
                        .table(Orders::Table)
                        .col(Orders::OrderNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_orders_logistics_center_id")
                        .table(Orders::Table)
                        .col(Orders::LogisticsCenterId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderLines::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderLines::OrderId).big_integer().not_null())
                        .col(
                            ColumnDef::new(OrderLines::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderLines::Quantity).integer().not_null())
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        OrderNumber,
        EmployeeGroupId,
        Status,
        FullName,
        PhoneNumber,
        AdditionalPhoneNumber,
        Email,
        DeliveryStreet,
        DeliveryStreetNumber,
        DeliveryApartmentNumber,
        DeliveryCity,
        DeliveryAdditionalDetails,
        LogisticsCenterId,
        LogisticsCenterStatus,
        LogisticsCenterShippingNumber,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum OrderLines {
        Table,
        Id,
        OrderId,
        ProductId,
        Quantity,
    }
}

mod m20240301_000004_create_logistics_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_logistics_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(RawMessages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RawMessages::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RawMessages::Center).string().not_null())
                        .col(ColumnDef::new(RawMessages::MessageType).string().not_null())
                        .col(ColumnDef::new(RawMessages::RawBody).text().not_null())
                        .col(
                            ColumnDef::new(RawMessages::ReceivedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InboundStatusEvents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InboundStatusEvents::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InboundStatusEvents::SubjectType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InboundStatusEvents::SubjectId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InboundStatusEvents::Status)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InboundStatusEvents::StatusEventTime)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InboundStatusEvents::SourceMessageId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InboundStatusEvents::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_inbound_status_events_dedup")
                        .table(InboundStatusEvents::Table)
                        .col(InboundStatusEvents::SubjectType)
                        .col(InboundStatusEvents::SubjectId)
                        .col(InboundStatusEvents::Status)
                        .col(InboundStatusEvents::StatusEventTime)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InboundReceipts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InboundReceipts::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InboundReceipts::ReceiptCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InboundReceipts::PurchaseOrderId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InboundReceipts::ReceiptStartAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InboundReceipts::ReceiptCloseAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InboundReceipts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InboundReceipts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_inbound_receipts_code")
                        .table(InboundReceipts::Table)
                        .col(InboundReceipts::ReceiptCode)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InboundReceiptLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InboundReceiptLines::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InboundReceiptLines::ReceiptId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InboundReceiptLines::LineNumber)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InboundReceiptLines::PurchaseOrderLineId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InboundReceiptLines::QuantityReceived)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InboundReceiptLines::SourceMessageId)
                                .big_integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_inbound_receipt_lines_receipt_line")
                        .table(InboundReceiptLines::Table)
                        .col(InboundReceiptLines::ReceiptId)
                        .col(InboundReceiptLines::LineNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockSnapshots::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockSnapshots::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockSnapshots::SnapshotAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockSnapshots::ProcessedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockSnapshotLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockSnapshotLines::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockSnapshotLines::StockSnapshotId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockSnapshotLines::Sku).string().not_null())
                        .col(
                            ColumnDef::new(StockSnapshotLines::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_snapshot_lines_snapshot_sku")
                        .table(StockSnapshotLines::Table)
                        .col(StockSnapshotLines::StockSnapshotId)
                        .col(StockSnapshotLines::Sku)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockSnapshotLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockSnapshots::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(InboundReceiptLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(InboundReceipts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(InboundStatusEvents::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(RawMessages::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum RawMessages {
        Table,
        Id,
        Center,
        MessageType,
        RawBody,
        ReceivedAt,
    }

    #[derive(DeriveIden)]
    enum InboundStatusEvents {
        Table,
        Id,
        SubjectType,
        SubjectId,
        Status,
        StatusEventTime,
        SourceMessageId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum InboundReceipts {
        Table,
        Id,
        ReceiptCode,
        PurchaseOrderId,
        ReceiptStartAt,
        ReceiptCloseAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum InboundReceiptLines {
        Table,
        Id,
        ReceiptId,
        LineNumber,
        PurchaseOrderLineId,
        QuantityReceived,
        SourceMessageId,
    }

    #[derive(DeriveIden)]
    enum StockSnapshots {
        Table,
        Id,
        SnapshotAt,
        ProcessedAt,
    }

    #[derive(DeriveIden)]
    enum StockSnapshotLines {
        Table,
        Id,
        StockSnapshotId,
        Sku,
        Quantity,
    }
}
