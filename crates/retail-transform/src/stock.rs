//! Available stock per product/color

use retail_ir::contract::{col, AVAILABLE_STOCK};
use retail_ir::{Column, ColumnType, Table};

use crate::aggregate::group_sum;
use crate::{require_columns, TransformError};

fn key_columns() -> Vec<Column> {
    vec![
        Column::nullable(col::PRODUCT, ColumnType::Text(255)),
        Column::nullable(col::COLOR, ColumnType::Text(255)),
    ]
}

/// `(product, color, available_quantity)` where available quantity is
/// `total_on_hand - in_transit` summed over every stock row of the pair.
///
/// Negative quantities are kept as-is. A pair whose total leaves the `BIGINT`
/// range fails with [`TransformError::Overflow`].
pub fn available_stock(stock: &Table) -> Result<Table, TransformError> {
    let idx = require_columns(
        stock,
        "stock",
        &[col::PRODUCT, col::COLOR, col::TOTAL_ON_HAND, col::IN_TRANSIT],
    )?;
    let (total, transit) = (idx[2], idx[3]);

    // i128 holds any difference of two i64 values
    let table = group_sum(
        stock,
        &idx[..2],
        key_columns(),
        AVAILABLE_STOCK,
        col::AVAILABLE_QUANTITY,
        |row| Some(i128::from(row[total].as_i64()?) - i128::from(row[transit].as_i64()?)),
    )?;

    tracing::debug!(
        input_rows = stock.len(),
        groups = table.len(),
        "Computed available stock"
    );
    Ok(table)
}
