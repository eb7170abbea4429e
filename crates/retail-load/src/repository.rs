use retail_ir::{Table, TableDefinition};

/// Storage capabilities the load and report stages rely on.
///
/// Implementations own their connection; dropping the repository releases it.
pub trait Repository {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create the table if it does not exist yet. Must be safe to repeat.
    fn ensure_table(&mut self, definition: &TableDefinition) -> Result<(), Self::Error>;

    /// Append every row of `table` to `table_name`, returning the rows written.
    ///
    /// Columns are matched by name, so `table` may list them in any order.
    fn insert_rows(&mut self, table_name: &str, table: &Table) -> Result<usize, Self::Error>;

    /// Run a read-only query and return its result set
    fn query(&mut self, sql: &str) -> Result<Table, Self::Error>;
}

impl<R: Repository + ?Sized> Repository for &mut R {
    type Error = R::Error;

    fn ensure_table(&mut self, definition: &TableDefinition) -> Result<(), Self::Error> {
        (**self).ensure_table(definition)
    }

    fn insert_rows(&mut self, table_name: &str, table: &Table) -> Result<usize, Self::Error> {
        (**self).insert_rows(table_name, table)
    }

    fn query(&mut self, sql: &str) -> Result<Table, Self::Error> {
        (**self).query(sql)
    }
}
