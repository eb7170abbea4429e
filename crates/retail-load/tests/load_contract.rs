//! Load orchestration against a recording repository with failure injection

use retail_ir::{Column, ColumnType, Table, TableDefinition, TransformedBundle, Value, BUNDLE_TABLES};
use retail_load::{LoadError, LoadOrchestrator, LoadPhase, Repository, ValidationError, SCHEMA_VERSION};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    EnsureTable(String),
    Insert(String, usize),
    Query(String),
}

#[derive(Debug, thiserror::Error)]
#[error("injected failure on {0}")]
struct Injected(String);

#[derive(Default)]
struct RecordingRepository {
    calls: Vec<Call>,
    fail_schema_on: Option<&'static str>,
    fail_insert_on: Option<&'static str>,
}

impl Repository for RecordingRepository {
    type Error = Injected;

    fn ensure_table(&mut self, definition: &TableDefinition) -> Result<(), Injected> {
        self.calls.push(Call::EnsureTable(definition.name.clone()));
        if self.fail_schema_on == Some(definition.name.as_str()) {
            return Err(Injected(definition.name.clone()));
        }
        Ok(())
    }

    fn insert_rows(&mut self, table_name: &str, table: &Table) -> Result<usize, Injected> {
        self.calls.push(Call::Insert(table_name.to_string(), table.len()));
        if self.fail_insert_on == Some(table_name) {
            return Err(Injected(table_name.to_string()));
        }
        Ok(table.len())
    }

    fn query(&mut self, sql: &str) -> Result<Table, Injected> {
        self.calls.push(Call::Query(sql.to_string()));
        Ok(Table::new(Vec::new()).unwrap())
    }
}

fn rows(n: i64) -> Table {
    Table::from_rows(
        vec![Column::nullable("n", ColumnType::BigInt)],
        (0..n).map(|i| vec![Value::Integer(i)]).collect(),
    )
    .unwrap()
}

fn bundle() -> TransformedBundle {
    BUNDLE_TABLES
        .iter()
        .enumerate()
        .fold(TransformedBundle::new(), |b, (i, name)| b.with_table(*name, rows(i as i64 + 1)))
}

fn inserts(calls: &[Call]) -> Vec<&str> {
    calls
        .iter()
        .filter_map(|c| match c {
            Call::Insert(t, _) => Some(t.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn load_writes_every_table_after_schema() {
    let mut repo = RecordingRepository::default();
    let report = LoadOrchestrator::new(&mut repo).load(bundle()).unwrap();

    assert_eq!(report.schema_version, SCHEMA_VERSION);
    assert_eq!(report.tables.len(), 7);
    assert_eq!(report.total_rows(), (1..=7).sum::<usize>());

    // all DDL precedes the first insert
    let first_insert = repo
        .calls
        .iter()
        .position(|c| matches!(c, Call::Insert(..)))
        .unwrap();
    assert_eq!(first_insert, 7);
    assert_eq!(inserts(&repo.calls), BUNDLE_TABLES.to_vec());
    assert_eq!(repo.calls[7], Call::Insert("sales".into(), 1));
}

#[test]
fn validation_failure_touches_nothing() {
    let cases = [
        (
            TransformedBundle::new().with_table("sales", rows(1)),
            ValidationError::MissingTable("stock".into()),
        ),
        (
            {
                let mut b = bundle();
                b.insert("sales_by_region", rows(0));
                b
            },
            ValidationError::EmptyTable("sales_by_region".into()),
        ),
        (
            bundle().with_table("extra", rows(1)),
            ValidationError::UnexpectedTable("extra".into()),
        ),
    ];

    for (bundle, expected) in cases {
        let mut repo = RecordingRepository::default();
        let err = LoadOrchestrator::new(&mut repo).load(bundle).unwrap_err();

        assert_eq!(err.phase(), LoadPhase::Validation);
        assert!(matches!(err, LoadError::Validation(ref v) if *v == expected));
        assert!(repo.calls.is_empty(), "unexpected calls: {:?}", repo.calls);
    }
}

#[test]
fn schema_failure_prevents_inserts() {
    let mut repo = RecordingRepository {
        fail_schema_on: Some("products"),
        ..Default::default()
    };
    let err = LoadOrchestrator::new(&mut repo).load(bundle()).unwrap_err();

    assert_eq!(err.phase(), LoadPhase::Schema);
    assert_eq!(err.table(), "products");
    assert!(err.to_string().contains("injected failure on products"));
    assert!(inserts(&repo.calls).is_empty());
    // sales, stock, store attempted before products
    assert_eq!(repo.calls.len(), 4);
}

#[test]
fn insert_failure_stops_remaining_inserts() {
    let mut repo = RecordingRepository {
        fail_insert_on: Some("available_stock"),
        ..Default::default()
    };
    let err = LoadOrchestrator::new(&mut repo).load(bundle()).unwrap_err();

    assert_eq!(err.phase(), LoadPhase::Insert);
    assert_eq!(err.table(), "available_stock");
    assert_eq!(
        inserts(&repo.calls),
        vec!["sales", "stock", "store", "products", "available_stock"]
    );
}

#[test]
fn load_report_serializes() {
    let mut orchestrator = LoadOrchestrator::new(RecordingRepository::default());
    let report = orchestrator.load(bundle()).unwrap();
    assert!(orchestrator.repository().calls.iter().all(|c| !matches!(c, Call::Query(_))));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["schema_version"], SCHEMA_VERSION);
    assert_eq!(json["tables"][0]["table"], "sales");
    assert_eq!(json["tables"][6]["rows"], 7);
}
