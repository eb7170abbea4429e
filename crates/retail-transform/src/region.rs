//! Units sold per state/city

use retail_ir::contract::{col, SALES_BY_REGION};
use retail_ir::{Column, ColumnType, Table};

use crate::aggregate::group_sum;
use crate::join::inner_join;
use crate::{require_columns, TransformError};

fn key_columns() -> Vec<Column> {
    vec![
        Column::nullable(col::STATE, ColumnType::Text(2)),
        Column::nullable(col::CITY, ColumnType::Text(255)),
    ]
}

/// `(state, city, total_units_sold)`: sales joined to stores on `store_id`,
/// units summed per state/city pair.
///
/// Sales for unknown stores are dropped. An empty input on either side gives
/// an empty result.
pub fn sales_by_region(sales: &Table, store: &Table) -> Result<Table, TransformError> {
    if sales.is_empty() || store.is_empty() {
        let empty = Table::new(Vec::new())?;
        return group_sum(&empty, &[], key_columns(), SALES_BY_REGION, col::TOTAL_UNITS_SOLD, |_| None);
    }

    require_columns(sales, "sales", &[col::STORE_ID, col::UNITS_SOLD])?;
    require_columns(store, "store", &[col::STORE_ID, col::STATE, col::CITY])?;

    let joined = inner_join(sales, store, &[col::STORE_ID])?;
    let keys = [
        joined.require_column(col::STATE)?,
        joined.require_column(col::CITY)?,
    ];
    let units = joined.require_column(col::UNITS_SOLD)?;

    let table = group_sum(
        &joined,
        &keys,
        key_columns(),
        SALES_BY_REGION,
        col::TOTAL_UNITS_SOLD,
        |row| row[units].as_i64().map(i128::from),
    )?;

    tracing::debug!(
        joined = joined.len(),
        regions = table.len(),
        "Computed sales by region"
    );
    Ok(table)
}
