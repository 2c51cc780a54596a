use tracing::{debug, error, info};

use crate::classify::Classifier;
use crate::error::FetchFailure;
use crate::report::{self, ReportSink, ScanSummary};
use crate::store::DocumentStore;

#[derive(Debug)]
pub enum ScanOutcome {
    Completed(ScanSummary),
    /// Already reported to the sink by the time the caller sees it.
    Failed(FetchFailure),
}

/// Fetches `collection` once and reports every record in store order.
/// A fetch failure produces a single failure line and ends the scan.
pub fn scan(
    store: &dyn DocumentStore,
    collection: &str,
    classifier: &Classifier,
    sink: &mut dyn ReportSink,
) -> ScanOutcome {
    sink.report(&report::header_line(collection));

    let records = match store.fetch_all(collection) {
        Ok(records) => records,
        Err(e) => {
            error!(collection, "fetch failed: {}", e);
            sink.report(&report::failure_line(&e.to_string()));
            return ScanOutcome::Failed(e);
        }
    };
    info!(collection, records = records.len(), "fetched collection");
    sink.report(&report::count_line(records.len()));

    let mut summary = ScanSummary::default();
    for record in &records {
        let class = classifier.classify(record.image_ref.as_deref());
        debug!(id = %record.id, %class, "classified");
        summary.add(class);

        sink.report(&report::record_line(record));
        if let Some(url) = record.image_ref.as_deref().filter(|u| !u.is_empty()) {
            sink.report(&report::url_line(url));
        }
        sink.report(&report::verdict_line(classifier, class));
        sink.report("");
    }

    sink.report(&report::completion_line(&summary));
    ScanOutcome::Completed(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemorySink;
    use crate::store::{parse_export, FieldNames, Record, SqliteReader, SqliteStore};
    use pretty_assertions::assert_eq;
    use rusqlite::Connection;

    fn classifier() -> Classifier {
        Classifier::new("localhost:6708", "localhost:8085")
    }

    fn fixture_store() -> SqliteStore {
        let store = SqliteStore::with_connection(
            Connection::open_in_memory().unwrap(),
            FieldNames::default(),
        )
        .unwrap();
        let text = std::fs::read_to_string("tests/fixtures/recipes.json").unwrap();
        store.import("recipes", &parse_export(&text).unwrap()).unwrap();
        store
    }

    struct FailingStore;

    impl DocumentStore for FailingStore {
        fn fetch_all(&self, _collection: &str) -> Result<Vec<Record>, FetchFailure> {
            Err(FetchFailure::Store(rusqlite::Error::InvalidQuery))
        }
    }

    #[test]
    fn four_record_scenario() {
        let store = fixture_store();
        let mut sink = MemorySink::default();
        let outcome = scan(&store, "recipes", &classifier(), &mut sink);

        let expected = vec![
            "Checking image URLs in collection 'recipes'...",
            "Found 4 records",
            "Pasta Carbonara (carbonara)",
            "   URL: http://localhost:6708/uploads/recipes/1756085267645_recipe_image.jpg",
            "   NEEDS_MIGRATION (deprecated host localhost:6708)",
            "",
            "Paella Valenciana (paella)",
            "   URL: http://localhost:8085/uploads/recipes/1756085404935_recipe_image.jpg",
            "   CORRECT (current host localhost:8085)",
            "",
            "Gazpacho (gazpacho)",
            "   URL: https://cdn.example.com/x.jpg",
            "   EXTERNAL (unknown host)",
            "",
            "Tortilla de patatas (tortilla)",
            "   MISSING (no image)",
            "",
            "Check completed: 4 records (1 needs migration, 1 correct, 1 external, 1 missing)",
        ];
        assert_eq!(sink.lines, expected);

        match outcome {
            ScanOutcome::Completed(s) => assert_eq!(
                s,
                ScanSummary {
                    total: 4,
                    missing: 1,
                    needs_migration: 1,
                    correct: 1,
                    external: 1,
                }
            ),
            ScanOutcome::Failed(e) => panic!("unexpected failure: {}", e),
        }
    }

    #[test]
    fn failure_reports_once_and_stops() {
        let mut sink = MemorySink::default();
        let outcome = scan(&FailingStore, "recipes", &classifier(), &mut sink);

        assert!(matches!(outcome, ScanOutcome::Failed(_)));
        let failures: Vec<_> = sink.lines.iter().filter(|l| l.starts_with("Error: ")).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(sink.lines.len(), 2);
        assert!(!sink.lines.iter().any(|l| l.starts_with("Found ")));
    }

    #[test]
    fn rescan_is_identical() {
        let store = fixture_store();
        let mut first = MemorySink::default();
        let mut second = MemorySink::default();
        scan(&store, "recipes", &classifier(), &mut first);
        scan(&store, "recipes", &classifier(), &mut second);
        assert_eq!(first.lines, second.lines);
    }

    #[test]
    fn empty_collection() {
        let store = fixture_store();
        let mut sink = MemorySink::default();
        scan(&store, "desserts", &classifier(), &mut sink);
        assert_eq!(
            sink.lines,
            vec![
                "Checking image URLs in collection 'desserts'...",
                "Found 0 records",
                "Check completed: 0 records (0 needs migration, 0 correct, 0 external, 0 missing)",
            ]
        );
    }

    #[test]
    fn empty_url_has_no_url_line() {
        let store = fixture_store();
        store
            .import("recipes", &[("blank".into(), serde_json::json!({"imageUrl": ""}))])
            .unwrap();
        let mut sink = MemorySink::default();
        scan(&store, "recipes", &classifier(), &mut sink);

        let pos = sink.lines.iter().position(|l| l == "Untitled (blank)").unwrap();
        assert_eq!(sink.lines[pos + 1], "   MISSING (no image)");
    }

    #[test]
    fn missing_store_reports_one_error_and_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo").join("catalog.sqlite");
        let reader = SqliteReader::new(&path, FieldNames::default());
        let mut sink = MemorySink::default();

        let outcome = scan(&reader, "recipes", &classifier(), &mut sink);

        assert!(matches!(outcome, ScanOutcome::Failed(_)));
        assert_eq!(sink.lines.len(), 2);
        assert_eq!(sink.lines[0], "Checking image URLs in collection 'recipes'...");
        assert!(sink.lines[1].starts_with("Error: "));
        assert!(!path.exists());
        assert!(!dir.path().join("typo").exists());
    }

    #[test]
    fn malformed_document_is_reported_as_missing() {
        let store = SqliteStore::with_connection(
            Connection::open_in_memory().unwrap(),
            FieldNames::default(),
        )
        .unwrap();
        store
            .import(
                "recipes",
                &[(
                    "good".into(),
                    serde_json::json!({"title": "Paella", "imageUrl": "http://localhost:8085/p.jpg"}),
                )],
            )
            .unwrap();
        store
            .connection()
            .execute(
                "INSERT INTO documents (collection, doc_id, data) VALUES ('recipes', 'bad', '\"just a string\"')",
                [],
            )
            .unwrap();
        let mut sink = MemorySink::default();

        let outcome = scan(&store, "recipes", &classifier(), &mut sink);

        assert_eq!(
            sink.lines,
            vec![
                "Checking image URLs in collection 'recipes'...",
                "Found 2 records",
                "Paella (good)",
                "   URL: http://localhost:8085/p.jpg",
                "   CORRECT (current host localhost:8085)",
                "",
                "Untitled (bad)",
                "   MISSING (no image)",
                "",
                "Check completed: 2 records (0 needs migration, 1 correct, 0 external, 1 missing)",
            ]
        );
        assert!(matches!(outcome, ScanOutcome::Completed(_)));
    }
}
