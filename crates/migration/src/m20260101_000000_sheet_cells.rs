//! Schema for the SQLite row store.
//!
//! - `sheet_cells`: one row per non-empty spreadsheet cell, keyed by sheet
//!   name and zero-based row/column.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum SheetCells {
    Table,
    Sheet,
    RowIdx,
    ColIdx,
    Value,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SheetCells::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SheetCells::Sheet).string().not_null())
                    .col(ColumnDef::new(SheetCells::RowIdx).big_integer().not_null())
                    .col(ColumnDef::new(SheetCells::ColIdx).big_integer().not_null())
                    .col(ColumnDef::new(SheetCells::Value).string().not_null())
                    .primary_key(
                        Index::create()
                            .name("pk-sheet_cells")
                            .col(SheetCells::Sheet)
                            .col(SheetCells::RowIdx)
                            .col(SheetCells::ColIdx),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sheet_cells-sheet-col")
                    .table(SheetCells::Table)
                    .col(SheetCells::Sheet)
                    .col(SheetCells::ColIdx)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SheetCells::Table).to_owned())
            .await
    }
}
