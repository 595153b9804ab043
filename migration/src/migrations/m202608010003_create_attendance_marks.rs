// migration: attendance_marks (the presence ledger)
use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202608010003_create_attendance_marks"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("attendance_marks"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("kind"))
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("principal_type"))
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("principal_id"))
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("exam_id")).big_integer().null())
                    .col(
                        ColumnDef::new(Alias::new("subject_id"))
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("lecture_id"))
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("correlation_key"))
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("direction"))
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("recorded_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::cust("CURRENT_TIMESTAMP")),
                    )
                    .col(ColumnDef::new(Alias::new("local_day")).date().null())
                    .col(ColumnDef::new(Alias::new("claimed_lat")).double().null())
                    .col(ColumnDef::new(Alias::new("claimed_lng")).double().null())
                    .col(
                        ColumnDef::new(Alias::new("resolved_zone"))
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("device_fingerprint"))
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("verified"))
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Alias::new("marked_by"))
                            .big_integer()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // The single write-path guard: one mark per (principal, correlated
        // entity) for exam/lecture scans, and one per (principal, day, seq)
        // slot for self-check-in. Both upsert paths target this index.
        manager
            .create_index(
                Index::create()
                    .name("uq_attendance_marks_principal_correlation")
                    .table(Alias::new("attendance_marks"))
                    .col(Alias::new("principal_type"))
                    .col(Alias::new("principal_id"))
                    .col(Alias::new("correlation_key"))
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Day-scoped reads (status counts, history) hit this one.
        manager
            .create_index(
                Index::create()
                    .name("ix_attendance_marks_principal_day")
                    .table(Alias::new("attendance_marks"))
                    .col(Alias::new("principal_type"))
                    .col(Alias::new("principal_id"))
                    .col(Alias::new("local_day"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(Alias::new("attendance_marks"))
                    .to_owned(),
            )
            .await
    }
}
