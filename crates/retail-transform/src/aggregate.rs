//! Group-by with an integer sum

use std::collections::BTreeMap;

use retail_ir::{Column, ColumnType, Row, Table, Value};

use crate::TransformError;

/// Group `table` by the columns at `key_idx` and sum `measure(row)` per group.
///
/// - rows with a null key cell are not grouped
/// - rows whose measure is `None` still open their group but add nothing
/// - output rows are ordered by key ascending
///
/// Sums are accumulated as `i128`; a group total outside the `BIGINT` range
/// fails with [`TransformError::Overflow`] naming `table_name` and `output`.
/// Output columns are `key_columns` followed by `output` (typed `BIGINT`).
pub(crate) fn group_sum<F>(
    table: &Table,
    key_idx: &[usize],
    key_columns: Vec<Column>,
    table_name: &str,
    output: &str,
    measure: F,
) -> Result<Table, TransformError>
where
    F: Fn(&Row) -> Option<i128>,
{
    let overflow = || TransformError::Overflow {
        table: table_name.to_string(),
        column: output.to_string(),
    };

    let mut groups: BTreeMap<Vec<Value>, i128> = BTreeMap::new();

    for row in table.rows() {
        let key: Vec<Value> = key_idx.iter().map(|&i| row[i].clone()).collect();
        if key.iter().any(Value::is_null) {
            continue;
        }

        let total = groups.entry(key).or_insert(0);
        if let Some(v) = measure(row) {
            *total = total.checked_add(v).ok_or_else(overflow)?;
        }
    }

    let mut columns = key_columns;
    columns.push(Column::nullable(output, ColumnType::BigInt));

    let rows = groups
        .into_iter()
        .map(|(mut key, total)| {
            let total = i64::try_from(total).map_err(|_| overflow())?;
            key.push(Value::Integer(total));
            Ok(key)
        })
        .collect::<Result<Vec<_>, TransformError>>()?;

    Ok(Table::from_rows(columns, rows)?)
}
