//! Destination schema
//!
//! The seven destination tables are static. Raw tables keep the layout of the
//! source extracts (the extractor shapes its output with the same
//! definitions); derived tables follow the transform outputs.

use retail_ir::contract::{AVAILABLE_STOCK, PRODUCTS, SALES, SALES_BY_REGION, SALES_VELOCITY, STOCK, STORE};
use retail_ir::{Column, ColumnType, TableDefinition, BUNDLE_TABLES};

use crate::{LoadError, Repository};

/// Version of the definition set below. Bump on any column change.
pub const SCHEMA_VERSION: u32 = 1;

const fn varchar(len: u32) -> ColumnType {
    ColumnType::Text(len)
}

const fn fixed(width: u32) -> ColumnType {
    ColumnType::Code(width)
}

const MONEY: ColumnType = ColumnType::Decimal {
    precision: 10,
    scale: 2,
};

pub fn stock_definition() -> TableDefinition {
    TableDefinition::new(
        STOCK,
        vec![
            Column::required("snapshot_date", ColumnType::Date),
            Column::required("store_id", ColumnType::Integer),
            Column::required("product", varchar(50)),
            Column::required("color", varchar(50)),
            Column::required("size", fixed(50)),
            Column::required("total_on_hand", ColumnType::Integer),
            Column::required("in_transit", ColumnType::Integer),
        ],
    )
}

pub fn store_definition() -> TableDefinition {
    TableDefinition::new(
        STORE,
        vec![
            Column::required("store_id", ColumnType::Integer),
            Column::required("store_name", varchar(100)),
            Column::required("point_of_sale_code", ColumnType::Integer),
            Column::required("point_of_sale", varchar(200)),
            Column::required("audience", fixed(50)),
            Column::required("channel", varchar(50)),
            Column::required("city", varchar(100)),
            Column::required("floor_area_m2", ColumnType::Integer),
            Column::required("country", fixed(2)),
            Column::required("state", fixed(2)),
            Column::required("climate", varchar(50)),
            Column::required("status", varchar(20)),
        ],
    )
}

pub fn products_definition() -> TableDefinition {
    TableDefinition::new(
        PRODUCTS,
        vec![
            Column::required("article_color", varchar(50)),
            Column::required("article", varchar(50)),
            Column::required("description", varchar(200)),
            Column::nullable("color_code", varchar(50)),
            Column::nullable("color_description", varchar(200)),
            Column::nullable("business", varchar(100)),
            Column::nullable("part", varchar(100)),
            Column::nullable("product_group", varchar(100)),
            Column::nullable("gender", varchar(50)),
            Column::nullable("quota_code", ColumnType::Integer),
            Column::nullable("collection", varchar(50)),
            Column::nullable("pyramid", varchar(50)),
        ],
    )
}

fn sales_columns() -> Vec<Column> {
    vec![
        Column::required("sale_date", ColumnType::Date),
        Column::required("store_id", ColumnType::Integer),
        Column::required("product", varchar(50)),
        Column::nullable("color", varchar(50)),
        Column::nullable("size", varchar(10)),
        Column::nullable("units_sold", ColumnType::Integer),
        Column::nullable("net_revenue", MONEY),
        Column::nullable("gross_revenue", MONEY),
    ]
}

pub fn sales_definition() -> TableDefinition {
    TableDefinition::new(SALES, sales_columns())
}

pub fn available_stock_definition() -> TableDefinition {
    TableDefinition::new(
        AVAILABLE_STOCK,
        vec![
            Column::nullable("product", varchar(255)),
            Column::nullable("color", varchar(255)),
            Column::nullable("available_quantity", ColumnType::BigInt),
        ],
    )
}

pub fn sales_velocity_definition() -> TableDefinition {
    let mut columns: Vec<Column> = sales_columns()
        .into_iter()
        .map(|c| Column::nullable(c.name, c.data_type))
        .collect();
    columns.push(Column::nullable("available_quantity", ColumnType::BigInt));
    columns.push(Column::nullable(
        "velocity",
        ColumnType::Decimal {
            precision: 18,
            scale: 6,
        },
    ));
    TableDefinition::new(SALES_VELOCITY, columns)
}

pub fn sales_by_region_definition() -> TableDefinition {
    TableDefinition::new(
        SALES_BY_REGION,
        vec![
            Column::nullable("state", varchar(2)),
            Column::nullable("city", varchar(255)),
            Column::nullable("total_units_sold", ColumnType::BigInt),
        ],
    )
}

/// Definition of a destination table by name
pub fn definition_for(name: &str) -> Option<TableDefinition> {
    match name {
        STOCK => Some(stock_definition()),
        STORE => Some(store_definition()),
        PRODUCTS => Some(products_definition()),
        SALES => Some(sales_definition()),
        AVAILABLE_STOCK => Some(available_stock_definition()),
        SALES_VELOCITY => Some(sales_velocity_definition()),
        SALES_BY_REGION => Some(sales_by_region_definition()),
        _ => None,
    }
}

/// All seven destination definitions in bundle order
pub fn destination_definitions() -> Vec<TableDefinition> {
    BUNDLE_TABLES.iter().filter_map(|name| definition_for(name)).collect()
}

/// Owns the destination definitions and creates them on demand
#[derive(Debug, Clone)]
pub struct SchemaManager {
    definitions: Vec<TableDefinition>,
}

impl Default for SchemaManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaManager {
    pub fn new() -> Self {
        Self {
            definitions: destination_definitions(),
        }
    }

    pub fn definitions(&self) -> &[TableDefinition] {
        &self.definitions
    }

    pub fn definition(&self, name: &str) -> Option<&TableDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Create every destination table that does not exist yet.
    ///
    /// Stops at the first failure; tables created before it are kept.
    pub fn ensure_schema<R: Repository>(&self, repository: &mut R) -> Result<(), LoadError> {
        for definition in &self.definitions {
            tracing::debug!(table = %definition.name, "Ensuring table");
            repository
                .ensure_table(definition)
                .map_err(|e| LoadError::schema(&definition.name, e))?;
        }

        tracing::info!(
            tables = self.definitions.len(),
            version = SCHEMA_VERSION,
            "Schema ready"
        );
        Ok(())
    }
}
