//! Inner equi-join on named key columns

use std::collections::HashMap;

use retail_ir::{Column, Table, Value};

use crate::TransformError;

/// Inner join `left` and `right` on `on` (same column names on both sides).
///
/// Output columns are every left column followed by the right non-key
/// columns; a right column whose name already exists on the left gets a
/// `_right` suffix. Rows come out in left order, and for each left row in
/// right order. Null keys never match.
pub(crate) fn inner_join(left: &Table, right: &Table, on: &[&str]) -> Result<Table, TransformError> {
    let left_keys = on
        .iter()
        .map(|c| left.require_column(c))
        .collect::<Result<Vec<_>, _>>()?;
    let right_keys = on
        .iter()
        .map(|c| right.require_column(c))
        .collect::<Result<Vec<_>, _>>()?;

    let right_payload: Vec<usize> = (0..right.columns().len())
        .filter(|i| !right_keys.contains(i))
        .collect();

    let mut columns: Vec<Column> = left.columns().to_vec();
    for &i in &right_payload {
        let mut column = right.columns()[i].clone();
        if left.column_index(&column.name).is_some() {
            column.name = format!("{}_right", column.name);
        }
        columns.push(column);
    }

    // Build side: right key -> row positions
    let mut index: HashMap<Vec<&Value>, Vec<usize>> = HashMap::new();
    for (pos, row) in right.rows().iter().enumerate() {
        let key: Vec<&Value> = right_keys.iter().map(|&i| &row[i]).collect();
        if key.iter().any(|v| v.is_null()) {
            continue;
        }
        index.entry(key).or_default().push(pos);
    }

    let mut out = Table::new(columns)?;
    for row in left.rows() {
        let key: Vec<&Value> = left_keys.iter().map(|&i| &row[i]).collect();
        let Some(matches) = index.get(&key) else {
            continue;
        };

        for &pos in matches {
            let other = &right.rows()[pos];
            let mut joined = row.clone();
            joined.extend(right_payload.iter().map(|&i| other[i].clone()));
            out.push_row(joined)?;
        }
    }

    Ok(out)
}
