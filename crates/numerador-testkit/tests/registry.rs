//! End-to-end registry behavior against file-backed SQLite stores.

use std::collections::HashSet;
use std::time::Duration;

use chrono::Datelike;
use numerador::backup;
use numerador::core::NewDocument;
use numerador::store::SqliteOptions;
use numerador::{
    AppConfig, MemoryStore, NumberFormat, Registry, RegistryConfig, RegistryError,
    SequenceCounter, Snapshot, Store, ValidationError,
};
use numerador_testkit::{date, numbered_rows, SqliteFixture};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Two rows sharing `(Oficio, 010/2024)`: the schema must refuse it.
fn clashing_snapshot() -> Snapshot {
    let d = date(2024, 4, 4);
    Snapshot::new(
        vec![
            NewDocument::new("Oficio", "010/2024", "A", d).into_record(1),
            NewDocument::new("Protocolo", "001/2024", "B", d).into_record(2),
            NewDocument::new("Oficio", "010/2024", "C", d).into_record(3),
        ],
        vec![SequenceCounter::new("Oficio", 10)],
    )
}

async fn assert_rejected_restore<S: Store>(registry: &Registry<S>) {
    registry.issue("Oficio", "Fórum", None).await.unwrap();
    let before = registry.backup_all().await.unwrap();

    let err = registry.restore(&clashing_snapshot()).await.unwrap_err();
    assert!(matches!(err, RegistryError::Store(_)), "got {:?}", err);
    assert!(!err.is_recoverable(), "bad snapshot reported retryable: {}", err);
    assert_eq!(registry.backup_all().await.unwrap(), before);
}

#[tokio::test]
async fn empty_store_scenario() {
    init_tracing();
    let fixture = SqliteFixture::new();
    let registry = fixture.registry();
    let year = chrono::Local::now().year();

    let first = registry.issue("Oficio", "Delegacia X", None).await.unwrap();
    let second = registry.issue("Oficio", "Delegacia X", None).await.unwrap();
    let protocol = registry.issue("Protocolo", "Delegacia X", None).await.unwrap();

    assert!(first.number.ends_with(&format!("001/{}", year)));
    assert!(second.number.ends_with(&format!("002/{}", year)));
    assert!(protocol.number.ends_with(&format!("001/{}", year)));
}

#[tokio::test]
async fn empty_destination_leaves_store_untouched() {
    init_tracing();
    let fixture = SqliteFixture::new();
    let registry = fixture.registry();

    let err = registry.issue("Oficio", "", None).await.unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Validation(ValidationError::EmptyDestination)
    ));
    assert!(!err.is_recoverable());
    assert_eq!(registry.last_value("Oficio").await.unwrap(), None);
    assert_eq!(registry.status().await.unwrap().documents, 0);
}

#[tokio::test]
async fn sequential_numbers_strictly_increase() {
    init_tracing();
    let fixture = SqliteFixture::new();
    let registry = fixture.registry();

    let mut previous = 0;
    for _ in 0..30 {
        let record = registry
            .issue("Despacho", "Cartório", Some(date(2025, 9, 1)))
            .await
            .unwrap();
        let (value, year) = NumberFormat::parse_sequence(&record.number).unwrap();
        assert!(value > previous);
        assert_eq!(year, 2025);
        previous = value;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_issuance_never_duplicates() {
    init_tracing();
    let fixture = SqliteFixture::new();

    // Independent handles model separate sessions or processes.
    let mut tasks = Vec::new();
    for worker in 0..4 {
        let registry = fixture.registry();
        tasks.push(tokio::spawn(async move {
            let mut numbers = Vec::new();
            for i in 0..10 {
                let record = registry
                    .issue("Oficio", &format!("destino {}-{}", worker, i), Some(date(2025, 6, 6)))
                    .await
                    .unwrap();
                numbers.push(record.number);
            }
            numbers
        }));
    }

    let mut numbers = Vec::new();
    for task in tasks {
        numbers.extend(task.await.unwrap());
    }

    let unique: HashSet<&String> = numbers.iter().collect();
    assert_eq!(unique.len(), 40);

    let registry = fixture.registry();
    assert_eq!(registry.query(Some("Oficio")).await.unwrap().len(), 40);
    assert_eq!(registry.last_value("Oficio").await.unwrap(), Some(40));
}

#[tokio::test]
async fn locked_database_aborts_issuance_without_writing() {
    init_tracing();
    let fixture = SqliteFixture::new();
    let registry = fixture.registry_with(&SqliteOptions {
        busy_timeout: Duration::ZERO,
    });

    // Another process holding the write lock.
    let holder = rusqlite::Connection::open(&fixture.path).unwrap();
    holder.execute_batch("BEGIN EXCLUSIVE").unwrap();

    let err = registry
        .issue("Oficio", "Fórum", Some(date(2025, 2, 2)))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Store(_)), "got {:?}", err);
    assert!(err.is_recoverable(), "busy database not retryable: {}", err);

    holder.execute_batch("ROLLBACK").unwrap();
    drop(holder);

    assert_eq!(registry.last_value("Oficio").await.unwrap(), None);
    assert_eq!(registry.status().await.unwrap().documents, 0);

    // Once the lock is gone the same call goes through.
    let record = registry
        .issue("Oficio", "Fórum", Some(date(2025, 2, 2)))
        .await
        .unwrap();
    assert_eq!(record.number, "001/2025");
}

#[tokio::test]
async fn backup_then_restore_is_identity() {
    init_tracing();
    let fixture = SqliteFixture::new();
    let registry = fixture.registry();

    for (t, dest) in [("Oficio", "Fórum"), ("Intimação", "Rua B, 12"), ("Oficio", "MP")] {
        registry.issue(t, dest, Some(date(2025, 2, 2))).await.unwrap();
    }

    // Through the CSV files, as an operator would.
    let backup_dir = tempfile::tempdir().unwrap();
    let before = registry.backup_to_dir(backup_dir.path()).await.unwrap();
    assert_eq!(backup::read_dir(backup_dir.path()).unwrap(), before);

    registry.restore_from_dir(backup_dir.path()).await.unwrap();
    assert_eq!(registry.backup_all().await.unwrap(), before);
}

#[tokio::test]
async fn restore_installs_counters_verbatim() {
    init_tracing();
    let fixture = SqliteFixture::new();
    let registry = fixture.registry();
    registry.issue("Oficio", "Descartado", None).await.unwrap();

    let documents = "id,type,number,destination,issue_date,year\n\
        1,Oficio,001/2023,Fórum,2023-01-10,2023\n\
        2,Oficio,002/2023,Fórum,2023-02-10,2023\n\
        3,Oficio,003/2023,MP,2023-03-10,2023\n\
        4,Oficio,004/2023,MP,2023-04-10,2023\n\
        5,Protocolo,001/2023,Cartório,2023-05-10,2023\n";
    let counters = "type,last_value\nOficio,2\nProtocolo,0\n";
    let snapshot = backup::from_csv_strings(documents, counters).unwrap();

    registry.restore(&snapshot).await.unwrap();

    let history = registry.query(None).await.unwrap();
    assert_eq!(history.len(), 5);
    let ids: Vec<i64> = history.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![5, 4, 3, 2, 1]);

    // Continues from the restored counter, not from the highest stored row.
    let next = registry
        .issue("Oficio", "Fórum", Some(date(2025, 1, 5)))
        .await
        .unwrap();
    assert_eq!(next.number, "003/2025");
    assert_eq!(registry.last_value("Oficio").await.unwrap(), Some(3));
}

#[tokio::test]
async fn lagging_counter_skips_taken_numbers() {
    init_tracing();
    let fixture = SqliteFixture::new();
    let registry = fixture.registry();

    let rows = numbered_rows("Protocolo", 2025, 1, 4);
    registry
        .restore(&Snapshot::new(rows, vec![SequenceCounter::new("Protocolo", 1)]))
        .await
        .unwrap();

    let record = registry
        .issue("Protocolo", "Fórum", Some(date(2025, 8, 8)))
        .await
        .unwrap();
    assert_eq!(record.number, "005/2025");
    assert_eq!(registry.query(Some("Protocolo")).await.unwrap().len(), 5);
}

#[tokio::test]
async fn rejected_restore_is_not_retryable_on_sqlite() {
    init_tracing();
    let fixture = SqliteFixture::new();
    assert_rejected_restore(&fixture.registry()).await;
}

#[tokio::test]
async fn rejected_restore_is_not_retryable_in_memory() {
    init_tracing();
    let registry = Registry::new(MemoryStore::new(), RegistryConfig::default());
    assert_rejected_restore(&registry).await;
}

#[tokio::test]
async fn registry_from_config_file() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("numerador.json");
    let db_path = dir.path().join("registro.db");
    std::fs::write(
        &config_path,
        format!(
            r#"{{"database": {{"path": {:?}}}, "registry": {{"number_format": {{"prefix": "466"}}}}}}"#,
            db_path.display().to_string()
        ),
    )
    .unwrap();

    let config = AppConfig::load(&config_path).unwrap();
    let registry = Registry::new(config.database.open().unwrap(), config.registry);

    let record = registry
        .issue("Oficio", "Fórum", Some(date(2025, 10, 1)))
        .await
        .unwrap();
    assert_eq!(record.number, "466-001/2025");
    assert!(db_path.exists());
}
