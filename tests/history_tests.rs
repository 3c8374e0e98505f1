#[cfg(test)]
mod history_proptests {
    use std::collections::HashSet;

    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    use qrism_studio::history::{History, HistoryEntry, MAX_ENTRIES};
    use qrism_studio::{Category, Origin};

    pub fn origin_strategy() -> BoxedStrategy<Origin> {
        prop_oneof![Just(Origin::Generated), Just(Origin::Scanned)].boxed()
    }

    // Small alphabet so duplicate payloads come up often
    pub fn record_strategy() -> impl Strategy<Value = (String, Origin, i64)> {
        ("[ab ]{0,3}", origin_strategy(), 0i64..5_000)
    }

    pub fn entry_strategy() -> impl Strategy<Value = HistoryEntry> {
        ("[0-9]{1,4}", "[a-c]{1,3}", origin_strategy(), 0i64..1_000_000).prop_map(|(id, content, origin, ms)| {
            HistoryEntry { id, content, origin, timestamp: at(ms), category: Category::Text }
        })
    }

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn assert_invariants(history: &History) -> Result<(), TestCaseError> {
        prop_assert!(history.len() <= MAX_ENTRIES);

        let pairs: HashSet<_> = history.entries().iter().map(|e| (e.content.clone(), e.origin)).collect();
        prop_assert_eq!(pairs.len(), history.len());

        let ids: HashSet<_> = history.entries().iter().map(|e| e.id.clone()).collect();
        prop_assert_eq!(ids.len(), history.len());
        Ok(())
    }

    proptest! {
        #[test]
        fn proptest_record(records in prop::collection::vec(record_strategy(), 0..300)) {
            let mut history = History::new();
            for (content, origin, ms) in records {
                let before = history.len();
                let added = history.record(&content, origin, at(ms)).is_some();
                if added {
                    prop_assert_eq!(&history.entries()[0].content, &content);
                    prop_assert_eq!(history.len(), (before + 1).min(MAX_ENTRIES));
                } else {
                    prop_assert_eq!(history.len(), before);
                }
                assert_invariants(&history)?;
            }
        }

        #[test]
        fn proptest_import(
            records in prop::collection::vec(record_strategy(), 0..150),
            imported in prop::collection::vec(entry_strategy(), 0..250),
        ) {
            let mut history = History::new();
            for (content, origin, ms) in records {
                history.record(&content, origin, at(ms));
            }

            let json = serde_json::to_string(&imported).unwrap();
            let added = history.import_json(&json).unwrap();
            prop_assert!(added <= imported.len());
            assert_invariants(&history)?;

            let ts: Vec<_> = history.entries().iter().map(|e| e.timestamp).collect();
            prop_assert!(ts.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}

#[cfg(test)]
mod history_tests {
    use chrono::{TimeZone, Utc};
    use test_case::test_case;

    use qrism_studio::history::{History, Query, SortOrder, MAX_ENTRIES};
    use qrism_studio::{Category, Origin, StudioError};

    fn sample() -> History {
        let mut history = History::new();
        let items = [
            ("https://rust-lang.org", Origin::Generated),
            ("mailto:team@example.com", Origin::Scanned),
            ("+44 20 7946 0958", Origin::Scanned),
            ("Plain note", Origin::Generated),
            ("https://docs.rs", Origin::Scanned),
        ];
        for (i, (content, origin)) in items.into_iter().enumerate() {
            history.record(content, origin, Utc.timestamp_millis_opt(1_000 * (i as i64 + 1)).unwrap());
        }
        history
    }

    #[test_case("", None, None, 5; "everything")]
    #[test_case("HTTPS", None, None, 2; "case insensitive search")]
    #[test_case("", Some(Origin::Scanned), None, 3; "origin filter")]
    #[test_case("", None, Some(Category::Url), 2; "category filter")]
    #[test_case("docs", Some(Origin::Generated), None, 0; "search and origin")]
    #[test_case("", Some(Origin::Scanned), Some(Category::Phone), 1; "origin and category")]
    fn test_query(search: &str, origin: Option<Origin>, category: Option<Category>, exp: usize) {
        let history = sample();
        let query = Query { search: search.to_string(), origin, category, order: SortOrder::Newest };
        assert_eq!(history.query(&query).len(), exp);
    }

    #[test]
    fn test_query_order() {
        let history = sample();
        let newest = history.query(&Query::default());
        let oldest = history.query(&Query { order: SortOrder::Oldest, ..Default::default() });
        assert_eq!(newest[0].content, "https://docs.rs");
        assert_eq!(oldest[0].content, "https://rust-lang.org");
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut history = History::new();
        for i in 0..(MAX_ENTRIES as i64 + 20) {
            history.record(&format!("item {i}"), Origin::Generated, Utc.timestamp_millis_opt(i).unwrap());
        }
        assert_eq!(history.len(), MAX_ENTRIES);
        assert_eq!(history.entries()[0].content, "item 119");
        assert_eq!(history.entries()[MAX_ENTRIES - 1].content, "item 20");
    }

    #[test_case("{}"; "object")]
    #[test_case("not json"; "garbage")]
    #[test_case(r#"[{"id":"1"}]"#; "missing fields")]
    #[test_case(r#"[{"id":"1","content":"x","type":"printed","timestamp":"2024-01-01T00:00:00Z","category":"text"}]"#; "unknown origin")]
    fn test_import_invalid_leaves_history(text: &str) {
        let mut history = sample();
        let before = history.clone();
        assert!(matches!(history.import_json(text), Err(StudioError::InvalidFileFormat(_))));
        assert_eq!(history, before);
    }

    #[test]
    fn test_export_import_into_empty() {
        let source = sample();
        let mut target = History::new();
        assert_eq!(target.import_json(&source.export_json().unwrap()).unwrap(), 5);
        assert_eq!(target, source);

        // A second import adds nothing
        assert_eq!(target.import_json(&source.export_json().unwrap()).unwrap(), 0);
    }
}
