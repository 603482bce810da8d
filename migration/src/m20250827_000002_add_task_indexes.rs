use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Composite equality-prefix indexes so every per-owner listing is a range
/// scan instead of a table scan.
const INDEXES: &[(&str, &[Tasks])] = &[
    ("idx_tasks_owner_id", &[Tasks::OwnerId]),
    ("idx_tasks_owner_id_status", &[Tasks::OwnerId, Tasks::Status]),
    (
        "idx_tasks_owner_id_priority",
        &[Tasks::OwnerId, Tasks::Priority],
    ),
    (
        "idx_tasks_owner_id_due_date",
        &[Tasks::OwnerId, Tasks::DueDate],
    ),
    (
        "idx_tasks_owner_id_created_at",
        &[Tasks::OwnerId, Tasks::CreatedAt],
    ),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, columns) in INDEXES {
            let mut index = Index::create();
            index.name(*name).table(Tasks::Table);
            for column in *columns {
                index.col(*column);
            }
            manager.create_index(index.to_owned()).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, _) in INDEXES {
            manager
                .drop_index(Index::drop().name(*name).table(Tasks::Table).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum Tasks {
    Table,
    OwnerId,
    DueDate,
    Priority,
    Status,
    CreatedAt,
}
