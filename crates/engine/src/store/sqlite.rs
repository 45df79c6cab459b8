use sea_orm::{
    ActiveValue, DatabaseConnection, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::OnConflict,
};
use tokio::sync::Mutex;

use super::{A1Range, Grid, Row, RowStore, Span, collect_rows, next_append_row, row_cells};
use crate::{BoxFuture, StoreError};

/// Sheet emulation on SQLite: every non-empty cell is one `sheet_cells` row.
///
/// The schema is created by the `migration` crate.
#[derive(Debug)]
pub struct SqliteStore {
    database: DatabaseConnection,
    // Appends read the last row then insert below it.
    append_lock: Mutex<()>,
}

impl SqliteStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self {
            database,
            append_lock: Mutex::new(()),
        }
    }

    async fn load_columns<C: ConnectionTrait>(
        conn: &C,
        range: &A1Range,
    ) -> Result<Grid, StoreError> {
        let models = cells::Entity::find()
            .filter(cells::Column::Sheet.eq(range.sheet.as_str()))
            .filter(cells::Column::ColIdx.between(
                i64::from(range.first_col()),
                i64::from(range.last_col()),
            ))
            .order_by_asc(cells::Column::RowIdx)
            .order_by_asc(cells::Column::ColIdx)
            .all(conn)
            .await?;

        Ok(models
            .into_iter()
            .filter_map(|m| {
                let row = u32::try_from(m.row_idx).ok()?;
                let col = u32::try_from(m.col_idx).ok()?;
                Some(((row, col), m.value))
            })
            .collect())
    }
}

impl RowStore for SqliteStore {
    fn append_row<'a>(&'a self, range: &'a A1Range, row: Row) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let _guard = self.append_lock.lock().await;
            let db_tx = self.database.begin().await?;

            let grid = Self::load_columns(&db_tx, range).await?;
            let row_index = next_append_row(&grid, range)?;
            for ((row_idx, col_idx), value) in row_cells(range, row_index, row) {
                cells::ActiveModel {
                    sheet: ActiveValue::Set(range.sheet.clone()),
                    row_idx: ActiveValue::Set(i64::from(row_idx)),
                    col_idx: ActiveValue::Set(i64::from(col_idx)),
                    value: ActiveValue::Set(value),
                }
                .insert(&db_tx)
                .await?;
            }

            db_tx.commit().await?;
            Ok(())
        })
    }

    fn read_range<'a>(&'a self, range: &'a A1Range) -> BoxFuture<'a, Result<Vec<Row>, StoreError>> {
        Box::pin(async move {
            if let Span::Cell { col, row } = range.span {
                let model = cells::Entity::find_by_id((
                    range.sheet.clone(),
                    i64::from(row),
                    i64::from(col),
                ))
                .one(&self.database)
                .await?;
                return Ok(model.map(|m| vec![vec![m.value]]).unwrap_or_default());
            }

            let grid = Self::load_columns(&self.database, range).await?;
            Ok(collect_rows(&grid, range))
        })
    }

    fn write_cell<'a>(&'a self, cell: &'a A1Range, value: String) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let (row, col) = cell.cell()?;
            let key = (cell.sheet.clone(), i64::from(row), i64::from(col));

            if value.is_empty() {
                cells::Entity::delete_by_id(key).exec(&self.database).await?;
                return Ok(());
            }

            let model = cells::ActiveModel {
                sheet: ActiveValue::Set(key.0),
                row_idx: ActiveValue::Set(key.1),
                col_idx: ActiveValue::Set(key.2),
                value: ActiveValue::Set(value),
            };
            cells::Entity::insert(model)
                .on_conflict(
                    OnConflict::columns([
                        cells::Column::Sheet,
                        cells::Column::RowIdx,
                        cells::Column::ColIdx,
                    ])
                    .update_column(cells::Column::Value)
                    .to_owned(),
                )
                .exec(&self.database)
                .await?;
            Ok(())
        })
    }
}

mod cells {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "sheet_cells")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub sheet: String,
        #[sea_orm(primary_key, auto_increment = false)]
        pub row_idx: i64,
        #[sea_orm(primary_key, auto_increment = false)]
        pub col_idx: i64,
        pub value: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
