mod common;

use std::fs;

use common::{TestWorkspace, num, row, text};
use salesboard::{
    data::RawRecord,
    dataset::{AccountId, Dataset, DeleteCriteria},
    error::{IngestError, StoreError, WorkspaceError},
    mapping::{CanonicalField, ColumnMapping},
    store::{DatasetStore, FsStore, MemoryStore},
    workspace::{AccountWorkspace, ViewSelection},
};

fn myntra_mapping() -> ColumnMapping {
    ColumnMapping::new()
        .with(CanonicalField::OrderId, "seller order id")
        .with(CanonicalField::Sku, "seller sku code")
        .with(CanonicalField::Revenue, "final amount")
        .with(CanonicalField::Date, "created on")
        .with(CanonicalField::Brand, "brand")
}

fn myntra_line(order: &str, sku: &str, amount: &str, created: &str) -> RawRecord {
    row([
        ("seller order id", text(order)),
        ("seller sku code", text(sku)),
        ("size", text("M")),
        ("final amount", text(amount)),
        ("created on", text(created)),
        ("brand", text("Libas")),
    ])
}

fn ajio_mapping() -> ColumnMapping {
    ColumnMapping::new()
        .with(CanonicalField::Price, "Selling Price")
        .with(CanonicalField::Quantity, "quantity")
        .with(CanonicalField::Date, "Order Date as dd/mm/yyyy hh:MM:ss")
}

fn ajio_line(order: &str, item: &str, price: f64, quantity: f64, date: &str) -> RawRecord {
    row([
        ("Sale Order Code", text(order)),
        ("Item Code", text(item)),
        ("Selling Price", num(price)),
        ("quantity", num(quantity)),
        ("Order Date as dd/mm/yyyy hh:MM:ss", text(date)),
    ])
}

fn account() -> AccountId {
    AccountId::new("acme")
}

#[test]
fn ingest_merges_and_skips_natural_key_duplicates() {
    let store = MemoryStore::new();
    let mut workspace = AccountWorkspace::open(&store, account()).expect("open");

    let first = workspace
        .ingest(
            "myntra",
            vec![
                myntra_line("SO-1", "SKU-A", "₹100", "2024-01-05"),
                myntra_line("SO-1", "SKU-B", "₹200", "2024-01-05"),
                myntra_line("SO-1", "SKU-B", "₹200", "2024-01-05"),
            ],
            myntra_mapping(),
        )
        .expect("first upload");
    assert_eq!(first.domain, "Myntra");
    assert_eq!(first.added, 2);
    assert_eq!(first.duplicates, 1);

    // A corrected amount on an already stored order line is still the same line.
    let second = workspace
        .ingest(
            "Myntra",
            vec![
                myntra_line("SO-1", "SKU-A", "₹150", "2024-01-05"),
                myntra_line("SO-2", "SKU-A", "₹300", "2024-02-01"),
            ],
            myntra_mapping(),
        )
        .expect("second upload");
    assert_eq!(second.received, 2);
    assert_eq!(second.added, 1);
    assert_eq!(second.duplicates, 1);
    assert_eq!(second.total, 3);

    let stored = &workspace.datasets()["Myntra"];
    assert_eq!(stored.rows[0]["final amount"], num(100.0));
    assert_eq!(store.load_all(&account()).expect("load")["Myntra"], *stored);
}

#[test]
fn unlisted_marketplace_keys_lines_by_the_mapped_order_id() {
    let store = MemoryStore::new();
    let mut workspace = AccountWorkspace::open(&store, account()).expect("open");
    let mapping = ColumnMapping::new()
        .with(CanonicalField::OrderId, "Order ID")
        .with(CanonicalField::Revenue, "amount");
    let batch = || {
        vec![
            row([("Order ID", text("A1")), ("amount", num(100.0))]),
            row([("Order ID", text("A2")), ("amount", num(200.0))]),
            row([("Order ID", text("A3")), ("amount", num(300.0))]),
        ]
    };

    let first = workspace
        .ingest("Meesho", batch(), mapping.clone())
        .expect("first upload");
    assert_eq!(first.domain, "Meesho");
    assert_eq!((first.added, first.duplicates, first.total), (3, 0, 3));

    let again = workspace
        .ingest("meesho", batch(), mapping.clone())
        .expect("repeat upload");
    assert_eq!((again.added, again.duplicates, again.total), (0, 3, 3));
}

#[test]
fn lines_without_any_order_id_are_all_kept() {
    let store = MemoryStore::new();
    let mut workspace = AccountWorkspace::open(&store, account()).expect("open");
    let mapping = ColumnMapping::new()
        .with(CanonicalField::Date, "date")
        .with(CanonicalField::Item, "item")
        .with(CanonicalField::Revenue, "amount");
    let line = |amount: f64| {
        row([
            ("date", text("2024-03-01")),
            ("item", text("Kurta")),
            ("amount", num(amount)),
        ])
    };

    let outcome = workspace
        .ingest("AJIO", vec![line(10.0), line(10.0), line(25.0)], mapping)
        .expect("upload");
    assert_eq!((outcome.added, outcome.duplicates, outcome.total), (3, 0, 3));
}

#[test]
fn new_mapping_replaces_the_old_one() {
    let store = MemoryStore::new();
    let mut workspace = AccountWorkspace::open(&store, account()).expect("open");
    workspace
        .ingest("AJIO", vec![ajio_line("A-1", "I-1", 10.0, 1.0, "01/01/2024")], ajio_mapping())
        .expect("first");
    let remapped = ajio_mapping().with(CanonicalField::Brand, "Item Type Brand");
    workspace
        .ingest("AJIO", vec![ajio_line("A-2", "I-1", 10.0, 1.0, "02/01/2024")], remapped.clone())
        .expect("second");
    assert_eq!(workspace.datasets()["AJIO"].mapping, remapped);
    assert_eq!(workspace.datasets()["AJIO"].len(), 2);
}

#[test]
fn rejected_batch_leaves_workspace_untouched() {
    let store = MemoryStore::new();
    let mut workspace = AccountWorkspace::open(&store, account()).expect("open");
    let err = workspace
        .ingest(
            "Myntra",
            vec![myntra_line("SO-1", "SKU-A", "₹100", "2024-01-05")],
            ColumnMapping::new().with(CanonicalField::City, "city"),
        )
        .unwrap_err();
    assert!(matches!(err, WorkspaceError::Ingest(IngestError::NoRevenueSignal)));
    assert!(workspace.datasets().is_empty());
    assert!(store.load_all(&account()).expect("load").is_empty());
}

#[test]
fn failed_save_keeps_the_previous_dataset() {
    let store = MemoryStore::new();
    let mut workspace = AccountWorkspace::open(&store, account()).expect("open");
    workspace
        .ingest(
            "Myntra",
            vec![myntra_line("SO-1", "SKU-A", "₹100", "2024-01-05")],
            myntra_mapping(),
        )
        .expect("first upload");
    let before = workspace.datasets().clone();

    store.set_fail_writes(true);
    let err = workspace
        .ingest(
            "Myntra",
            vec![myntra_line("SO-2", "SKU-A", "₹300", "2024-02-01")],
            myntra_mapping(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        WorkspaceError::Store(StoreError::WriteRejected(_))
    ));
    assert_eq!(workspace.datasets(), &before);

    let err = workspace
        .delete(None, DeleteCriteria::everything())
        .unwrap_err();
    assert!(matches!(err, WorkspaceError::Store(_)));
    assert_eq!(workspace.datasets(), &before);
    assert_eq!(store.load_all(&account()).expect("load"), before);
}

#[test]
fn delete_by_month_keeps_unparseable_dates() {
    let store = MemoryStore::new();
    let mut workspace = AccountWorkspace::open(&store, account()).expect("open");
    workspace
        .ingest(
            "Myntra",
            vec![
                myntra_line("SO-1", "SKU-A", "100", "2024-01-05"),
                myntra_line("SO-2", "SKU-A", "100", "2024-01-28 10:00:00"),
                myntra_line("SO-3", "SKU-A", "100", "2024-02-01"),
                myntra_line("SO-4", "SKU-A", "100", "not recorded"),
            ],
            myntra_mapping(),
        )
        .expect("upload");

    let removed = workspace
        .delete(Some("myntra"), DeleteCriteria::month(2024, 1))
        .expect("delete");
    assert_eq!(removed, 2);
    let left = workspace.datasets()["Myntra"]
        .rows
        .iter()
        .map(|row| row["seller order id"].to_string())
        .collect::<Vec<_>>();
    assert_eq!(left, vec!["SO-3", "SO-4"]);
}

#[test]
fn delete_by_year_across_domains_drops_emptied_domains() {
    let store = MemoryStore::new();
    let mut workspace = AccountWorkspace::open(&store, account()).expect("open");
    workspace
        .ingest(
            "Myntra",
            vec![myntra_line("SO-1", "SKU-A", "100", "2024-01-05")],
            myntra_mapping(),
        )
        .expect("myntra");
    workspace
        .ingest(
            "AJIO",
            vec![
                ajio_line("A-1", "I-1", 10.0, 2.0, "03/01/2023"),
                ajio_line("A-2", "I-1", 10.0, 2.0, "03/01/2024"),
            ],
            ajio_mapping(),
        )
        .expect("ajio");

    assert_eq!(workspace.delete(None, DeleteCriteria::year(2024)).expect("delete"), 2);
    assert_eq!(workspace.domains(), vec!["AJIO"]);
    assert_eq!(
        store.list_domains_with_data(&account()).expect("list"),
        vec!["AJIO".to_string()]
    );
}

#[test]
fn deleting_an_unknown_domain_is_an_error() {
    let store = MemoryStore::new();
    let mut workspace = AccountWorkspace::open(&store, account()).expect("open");
    let err = workspace
        .delete(Some("Flipkart"), DeleteCriteria::everything())
        .unwrap_err();
    assert!(matches!(err, WorkspaceError::UnknownDomain(domain) if domain == "Flipkart"));
}

#[test]
fn all_domains_view_is_consolidated() {
    let store = MemoryStore::new();
    let mut workspace = AccountWorkspace::open(&store, account()).expect("open");
    let empty = workspace.view(&ViewSelection::AllDomains).expect("empty view");
    assert!(empty.is_empty());
    assert_eq!(empty.mapping, ColumnMapping::identity());

    workspace
        .ingest(
            "Myntra",
            vec![
                myntra_line("SO-1", "SKU-A", "100", "2024-01-05"),
                myntra_line("SO-2", "SKU-A", "200", "2024-01-06"),
            ],
            myntra_mapping(),
        )
        .expect("myntra");
    workspace
        .ingest(
            "AJIO",
            vec![
                ajio_line("A-1", "I-1", 10.0, 2.0, "03/01/2024"),
                ajio_line("A-2", "I-1", 5.0, 1.0, "04/01/2024"),
                ajio_line("A-3", "I-1", 1.0, 1.0, "05/01/2024"),
            ],
            ajio_mapping(),
        )
        .expect("ajio");

    let all = workspace.view(&ViewSelection::AllDomains).expect("all");
    assert_eq!(all.len(), 5);
    assert_eq!(all.rows[0]["revenue"], num(20.0));

    let single = workspace
        .view(&ViewSelection::Domain("ajio".into()))
        .expect("ajio view");
    assert_eq!(single.len(), 3);
    assert!(matches!(
        workspace.view(&ViewSelection::Domain("Nykaa".into())),
        Err(WorkspaceError::UnknownDomain(_))
    ));
}

#[test]
fn fs_store_round_trips_and_reopens() {
    let temp = TestWorkspace::new();
    let store = FsStore::new(temp.store());
    {
        let mut workspace = AccountWorkspace::open(&store, account()).expect("open");
        workspace
            .ingest(
                "Myntra",
                vec![myntra_line("SO-1", "SKU-A", "₹1,200", "2024-01-05")],
                myntra_mapping(),
            )
            .expect("upload");
    }
    let path = temp.store().join("acme").join("Myntra.json");
    assert!(path.exists());

    let reopened = AccountWorkspace::open(&store, account()).expect("reopen");
    let dataset = &reopened.datasets()["Myntra"];
    assert_eq!(dataset.rows[0]["final amount"], num(1200.0));
    assert_eq!(dataset.mapping, myntra_mapping());

    let leftovers = fs::read_dir(temp.store().join("acme"))
        .expect("account dir")
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn fs_store_delete_removes_emptied_files() {
    let temp = TestWorkspace::new();
    let store = FsStore::new(temp.store());
    let dataset = Dataset::new(
        vec![
            row([("d", text("2023-03-01")), ("r", num(1.0))]),
            row([("d", text("2023-04-01")), ("r", num(1.0))]),
        ],
        ColumnMapping::new()
            .with(CanonicalField::Date, "d")
            .with(CanonicalField::Revenue, "r"),
    );
    store.save(&account(), "Nykaa", &dataset).expect("save");

    let remaining = store
        .delete(&account(), "Nykaa", DeleteCriteria::month(2023, 3))
        .expect("delete month")
        .expect("rows left");
    assert_eq!(remaining.len(), 1);
    assert_eq!(store.load_all(&account()).expect("load")["Nykaa"], remaining);

    let gone = store
        .delete(&account(), "Nykaa", DeleteCriteria::year(2023))
        .expect("delete year");
    assert!(gone.is_none());
    assert!(!temp.store().join("acme").join("Nykaa.json").exists());
    assert!(store.list_domains_with_data(&account()).expect("list").is_empty());
}

#[test]
fn fs_store_rejects_unsafe_keys() {
    let temp = TestWorkspace::new();
    let store = FsStore::new(temp.store());
    let err = store
        .save(&account(), "../escape", &Dataset::default())
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidKey(_)));
    let err = store.load_all(&AccountId::new("a/b")).unwrap_err();
    assert!(matches!(err, StoreError::InvalidKey(_)));
}

#[test]
fn fs_store_reports_corrupt_documents() {
    let temp = TestWorkspace::new();
    let dir = temp.store().join("acme");
    fs::create_dir_all(&dir).expect("account dir");
    fs::write(dir.join("Myntra.json"), "{ not json").expect("write corrupt file");
    fs::write(dir.join("notes.txt"), "ignored").expect("write stray file");
    let store = FsStore::new(temp.store());
    assert!(matches!(
        store.load_all(&account()),
        Err(StoreError::Serialization { .. })
    ));
}
