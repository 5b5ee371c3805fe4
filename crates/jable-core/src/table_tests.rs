//! Tests for table storage, mutation, index resolution and iteration

#[cfg(test)]
mod tests {
    use crate::error::TableError;
    use crate::table::*;
    use indexmap::IndexMap;
    use serde_json::{json, Value};

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn columns(pairs: &[(&str, Vec<Value>)]) -> IndexMap<String, Vec<Value>> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    /// 3 rows: constant `source`, raw `id`, encoded `status`.
    fn sample() -> Table {
        Table::from_columns(
            row(&[("source", json!("survey"))]),
            columns(&[
                ("id", vec![json!(1), json!(2), json!(3)]),
                ("status", vec![json!("open"), json!("closed"), json!("open")]),
            ]),
            &["status"],
        )
        .unwrap()
    }

    /// 3 rows, columns `id` and `name`.
    fn people() -> Table {
        Table::from_raw_columns(columns(&[
            ("id", vec![json!(10), json!(11), json!(12)]),
            ("name", vec![json!("ann"), json!("bob"), json!("cy")]),
        ]))
        .unwrap()
    }

    fn assert_consistent(table: &Table) {
        for name in table.per_row_names() {
            let column = table.column(name).unwrap();
            assert_eq!(column.len(), table.len(), "column {name} length");
            if let Column::Encoded { codes, dictionary } = column {
                assert!(dictionary.validate_codes(codes).is_ok());
                assert!(crate::Dictionary::from_values(dictionary.to_vec()).is_ok());
            }
        }
        for name in table.constant_names() {
            assert!(table.column(name).is_none(), "{name} is both constant and per-row");
        }
    }

    // ========================================================================
    // Construction
    // ========================================================================

    #[test]
    fn test_new_table_is_empty() {
        let table = Table::new();

        assert!(table.is_empty());
        assert_eq!(table.shape(), (0, 0));
        assert!(table.column_names().is_empty());
    }

    #[test]
    fn test_column_names_constants_first() {
        // Arrange
        let mut table = Table::with_headers(row(&[("kind", json!("x"))]), &["b", "a"], &["c"]).unwrap();

        // Act
        table.set_constant("late", json!(1)).unwrap();

        // Assert
        assert_eq!(table.column_names(), vec!["kind", "late", "b", "a", "c"]);
        assert!(table.is_encoded("c"));
        assert_eq!(table.storage_mode("a").unwrap(), StorageMode::Raw);
        assert_eq!(table.storage_mode("kind").unwrap(), StorageMode::Constant);
    }

    #[test]
    fn test_with_headers_rejects_duplicate_names() {
        let result = Table::with_headers(row(&[("a", json!(1))]), &["a"], &[]);

        assert!(matches!(result, Err(TableError::DuplicateColumn(name)) if name == "a"));
    }

    #[test]
    fn test_from_raw_columns_length_mismatch() {
        let result = Table::from_raw_columns(columns(&[
            ("a", vec![json!(1), json!(2)]),
            ("b", vec![json!(1)]),
        ]));

        assert!(matches!(
            result,
            Err(TableError::LengthMismatch { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn test_from_columns_unknown_encoded_name() {
        let result = Table::from_columns(Row::new(), columns(&[("a", vec![])]), &["zzz"]);

        assert!(matches!(result, Err(TableError::UnknownColumn(_))));
    }

    #[test]
    fn test_from_parts_rejects_bad_code() {
        // Arrange
        let mut cols = IndexMap::new();
        let dictionary = crate::Dictionary::from_values(vec![json!("a")]).unwrap();
        cols.insert(
            "x".to_string(),
            Column::Encoded {
                codes: vec![Some(0), Some(3)],
                dictionary,
            },
        );

        // Act
        let result = Table::from_parts(Row::new(), cols, IndexMap::new(), serde_json::Map::new());

        // Assert
        assert!(matches!(result, Err(TableError::InvalidLayout(_))));
    }

    #[test]
    fn test_from_parts_rejects_name_in_both_modes() {
        let mut cols = IndexMap::new();
        cols.insert("x".to_string(), Column::Raw(vec![json!(1)]));

        let result = Table::from_parts(
            row(&[("x", json!(1))]),
            cols,
            IndexMap::new(),
            serde_json::Map::new(),
        );

        assert!(matches!(result, Err(TableError::InvalidLayout(_))));
    }

    #[test]
    fn test_empty_like_keeps_header_and_modes() {
        let table = sample();

        let empty = table.empty_like();

        assert_eq!(empty.len(), 0);
        assert_eq!(empty.column_names(), table.column_names());
        assert!(empty.is_encoded("status"));
        assert!(empty.dictionary("status").unwrap().is_empty());
        assert_eq!(empty.constant("source"), Some(&json!("survey")));
    }

    // ========================================================================
    // Reads
    // ========================================================================

    #[test]
    fn test_get_cell_all_modes() {
        let table = sample();

        assert_eq!(table.get_cell(1, "source").unwrap(), &json!("survey"));
        assert_eq!(table.get_cell(1, "id").unwrap(), &json!(2));
        assert_eq!(table.get_cell(1, "status").unwrap(), &json!("closed"));
    }

    #[test]
    fn test_get_cell_errors() {
        let table = sample();

        assert!(matches!(
            table.get_cell(0, "nope"),
            Err(TableError::UnknownColumn(_))
        ));
        assert!(matches!(
            table.get_cell(3, "id"),
            Err(TableError::RowOutOfRange { row: 3, len: 3 })
        ));
        assert!(matches!(
            table.get_cell(3, "source"),
            Err(TableError::RowOutOfRange { .. })
        ));
    }

    #[test]
    fn test_get_row_merges_modes() {
        let table = sample();

        let r = table.get_row(2).unwrap();

        assert_eq!(
            r,
            row(&[("source", json!("survey")), ("id", json!(3)), ("status", json!("open"))])
        );
        assert_eq!(r.keys().next().map(String::as_str), Some("source"));
    }

    #[test]
    fn test_get_column_decodes_and_rejects_constants() {
        let table = sample();

        assert_eq!(
            table.get_column("status").unwrap(),
            vec![json!("open"), json!("closed"), json!("open")]
        );
        assert!(matches!(
            table.get_column("source"),
            Err(TableError::ConstantColumn(_))
        ));
    }

    #[test]
    fn test_constant_defaults() {
        let table = sample();

        assert_eq!(table.constant_or("source", json!("x")), json!("survey"));
        assert_eq!(table.constant_or("missing", json!("x")), json!("x"));
        let merged = table.constants_with_defaults(&row(&[
            ("source", json!(null)),
            ("version", json!(2)),
        ]));
        assert_eq!(merged, row(&[("source", json!("survey")), ("version", json!(2))]));
    }

    // ========================================================================
    // set_cell / set_row
    // ========================================================================

    #[test]
    fn test_set_cell_constant_rewrites_every_row() {
        let mut table = sample();

        table.set_cell(0, "source", json!("census")).unwrap();

        for r in 0..table.len() {
            assert_eq!(table.get_cell(r, "source").unwrap(), &json!("census"));
        }
    }

    #[test]
    fn test_set_cell_encoded_reuses_dictionary_entry() {
        let mut table = sample();

        table.set_cell(1, "status", json!("open")).unwrap();

        assert_eq!(table.dictionary("status").unwrap().len(), 2);
        assert_eq!(table.get_cell(1, "status").unwrap(), &json!("open"));
    }

    #[test]
    fn test_set_cell_encoded_appends_new_value_and_stores_null() {
        let mut table = sample();

        table.set_cell(0, "status", json!("stale")).unwrap();
        table.set_cell(2, "status", json!(null)).unwrap();

        let dictionary = table.dictionary("status").unwrap();
        assert_eq!(dictionary.to_vec(), vec![json!("open"), json!("closed"), json!("stale")]);
        assert_eq!(table.get_cell(2, "status").unwrap(), &json!(null));
        assert_consistent(&table);
    }

    #[test]
    fn test_set_cell_at_len_grows_table() {
        let mut table = sample();

        table.set_cell(3, "id", json!(4)).unwrap();

        assert_eq!(table.len(), 4);
        assert_eq!(table.get_cell(3, "id").unwrap(), &json!(4));
        assert_eq!(table.get_cell(3, "status").unwrap(), &json!(null));
        assert_consistent(&table);
    }

    #[test]
    fn test_set_cell_out_of_range() {
        let mut table = sample();

        assert!(matches!(
            table.set_cell(5, "id", json!(0)),
            Err(TableError::RowOutOfRange { row: 5, len: 3 })
        ));
        assert!(matches!(
            table.set_cell(3, "source", json!("x")),
            Err(TableError::RowOutOfRange { .. })
        ));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_set_row_is_atomic() {
        // Arrange
        let mut table = sample();
        let before = table.clone();

        // Act - second key is unknown
        let result = table.set_row(0, &row(&[("id", json!(99)), ("nope", json!(1))]));

        // Assert
        assert!(matches!(result, Err(TableError::UnknownColumn(_))));
        assert_eq!(table, before);
    }

    #[test]
    fn test_set_row_at_len_appends() {
        let mut table = sample();

        table.set_row(3, &row(&[("status", json!("new"))])).unwrap();

        assert_eq!(table.len(), 4);
        assert_eq!(table.get_cell(3, "id").unwrap(), &json!(null));
        assert_eq!(table.get_cell(3, "status").unwrap(), &json!("new"));
    }

    #[test]
    fn test_set_row_at_len_with_only_constants_fails() {
        let mut table = sample();

        let result = table.set_row(3, &row(&[("source", json!("x"))]));

        assert!(matches!(result, Err(TableError::RowOutOfRange { .. })));
        assert_eq!(table.constant("source"), Some(&json!("survey")));
    }

    // ========================================================================
    // append / insert / delete
    // ========================================================================

    #[test]
    fn test_append_strict_requires_full_row() {
        let mut table = sample();

        let result = table.append_row(&row(&[("id", json!(4))]), true);

        assert!(matches!(result, Err(TableError::MissingColumn(name)) if name == "status"));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_append_strict_constant_conflict() {
        let mut table = sample();

        let result = table.append_row(
            &row(&[("source", json!("other")), ("id", json!(4)), ("status", json!("open"))]),
            true,
        );

        assert!(matches!(
            result,
            Err(TableError::FixedValueConflict { ref column, .. }) if column == "source"
        ));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_append_strict_unknown_key() {
        let mut table = sample();

        let result = table.append_row(
            &row(&[("id", json!(4)), ("status", json!("open")), ("extra", json!(1))]),
            true,
        );

        assert!(matches!(result, Err(TableError::UnknownColumn(_))));
    }

    #[test]
    fn test_append_strict_omitting_constant_is_allowed() {
        let mut table = sample();

        table
            .append_row(&row(&[("id", json!(4)), ("status", json!("held"))]), true)
            .unwrap();

        assert_eq!(table.len(), 4);
        assert_eq!(table.get_cell(3, "status").unwrap(), &json!("held"));
        assert_consistent(&table);
    }

    #[test]
    fn test_append_non_strict_fills_nulls_and_updates_constants() {
        let mut table = sample();

        table
            .append_row(&row(&[("source", json!("census")), ("extra", json!(1))]), false)
            .unwrap();

        assert_eq!(table.len(), 4);
        assert_eq!(table.get_cell(3, "id").unwrap(), &json!(null));
        assert_eq!(table.get_cell(3, "status").unwrap(), &json!(null));
        assert_eq!(table.constant("source"), Some(&json!("census")));
        assert!(!table.contains_column("extra"));
    }

    #[test]
    fn test_append_to_constant_only_table_counts_rows() {
        let mut table = Table::with_headers(row(&[("k", json!(1))]), &[], &[]).unwrap();

        table.append_row(&row(&[("k", json!(1))]), true).unwrap();
        table.append_row(&Row::new(), true).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows().count(), 2);
    }

    #[test]
    fn test_extend_appends_in_order() {
        let mut table = people();

        let appended = table
            .extend(
                vec![
                    row(&[("id", json!(13)), ("name", json!("di"))]),
                    row(&[("id", json!(14)), ("name", json!("ed"))]),
                ],
                true,
            )
            .unwrap();

        assert_eq!(appended, 2);
        assert_eq!(table.get_column("name").unwrap()[4], json!("ed"));
    }

    #[test]
    fn test_insert_row_shifts_later_rows() {
        let mut table = sample();

        table
            .insert_row(1, &row(&[("id", json!(15)), ("status", json!("new"))]))
            .unwrap();

        assert_eq!(
            table.get_column("id").unwrap(),
            vec![json!(1), json!(15), json!(2), json!(3)]
        );
        assert_eq!(table.get_cell(1, "status").unwrap(), &json!("new"));
        assert_eq!(table.get_cell(2, "status").unwrap(), &json!("closed"));
        assert_consistent(&table);
    }

    #[test]
    fn test_insert_row_partial_leaves_nulls() {
        let mut table = sample();

        table.insert_row(3, &row(&[("id", json!(4))])).unwrap();

        assert_eq!(table.get_cell(3, "status").unwrap(), &json!(null));
    }

    #[test]
    fn test_insert_row_validates_before_writing() {
        let mut table = sample();
        let before = table.clone();

        assert!(matches!(
            table.insert_row(4, &Row::new()),
            Err(TableError::RowOutOfRange { .. })
        ));
        assert!(matches!(
            table.insert_row(0, &row(&[("nope", json!(1))])),
            Err(TableError::UnknownColumn(_))
        ));
        assert_eq!(table, before);
    }

    #[test]
    fn test_delete_rows_uses_original_indices() {
        // Arrange - 5 rows
        let mut table = Table::from_raw_columns(columns(&[(
            "n",
            (0..5).map(|i| json!(i)).collect(),
        )]))
        .unwrap();

        // Act
        table.delete_rows(&[1, 3]).unwrap();

        // Assert
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.get_column("n").unwrap(),
            vec![json!(0), json!(2), json!(4)]
        );
    }

    #[test]
    fn test_delete_rows_unsorted_with_duplicates() {
        let mut table = Table::from_raw_columns(columns(&[(
            "n",
            (0..6).map(|i| json!(i)).collect(),
        )]))
        .unwrap();

        table.delete_rows(&[4, 0, 4, 2]).unwrap();

        assert_eq!(
            table.get_column("n").unwrap(),
            vec![json!(1), json!(3), json!(5)]
        );
    }

    #[test]
    fn test_delete_rows_is_atomic() {
        let mut table = sample();
        let before = table.clone();

        let result = table.delete_rows(&[0, 7]);

        assert!(matches!(result, Err(TableError::RowOutOfRange { row: 7, .. })));
        assert_eq!(table, before);
    }

    #[test]
    fn test_delete_row_keeps_constants_and_encoding() {
        let mut table = sample();

        table.delete_row(0).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.constant("source"), Some(&json!("survey")));
        assert!(table.is_encoded("status"));
        assert_eq!(
            table.get_column("status").unwrap(),
            vec![json!("closed"), json!("open")]
        );
        assert_consistent(&table);
    }

    // ========================================================================
    // Column-level operations
    // ========================================================================

    #[test]
    fn test_add_column() {
        let mut table = people();

        table
            .add_column("age", vec![json!(30), json!(40), json!(50)], Some("int"))
            .unwrap();

        assert_eq!(table.get_cell(2, "age").unwrap(), &json!(50));
        assert_eq!(table.schema().get("age").map(String::as_str), Some("int"));
    }

    #[test]
    fn test_add_column_errors() {
        let mut table = people();

        assert!(matches!(
            table.add_column("id", vec![json!(1), json!(2), json!(3)], None),
            Err(TableError::DuplicateColumn(_))
        ));
        assert!(matches!(
            table.add_column("age", vec![json!(1)], None),
            Err(TableError::LengthMismatch { expected: 3, actual: 1, .. })
        ));
    }

    #[test]
    fn test_set_column_keeps_mode_and_checks_length() {
        let mut table = sample();

        table
            .set_column("status", vec![json!("a"), json!("a"), json!("b")])
            .unwrap();

        assert!(table.is_encoded("status"));
        assert_eq!(
            table.dictionary("status").unwrap().to_vec(),
            vec![json!("a"), json!("b")]
        );
        assert!(matches!(
            table.set_column("id", vec![]),
            Err(TableError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_set_column_on_constant_makes_it_raw() {
        let mut table = sample();

        table
            .set_column("source", vec![json!("a"), json!("b"), json!("c")])
            .unwrap();

        assert_eq!(table.storage_mode("source").unwrap(), StorageMode::Raw);
        assert_eq!(table.get_cell(1, "source").unwrap(), &json!("b"));
        assert_consistent(&table);
    }

    #[test]
    fn test_set_cells_sparse() {
        let mut table = sample();

        table
            .set_cells("status", &[(0, json!("x")), (2, json!("y"))])
            .unwrap();

        assert_eq!(
            table.get_column("status").unwrap(),
            vec![json!("x"), json!("closed"), json!("y")]
        );
        assert!(matches!(
            table.set_cells("source", &[(0, json!(1))]),
            Err(TableError::ConstantColumn(_))
        ));
        assert!(matches!(
            table.set_cells("id", &[(0, json!(1)), (9, json!(1))]),
            Err(TableError::RowOutOfRange { .. })
        ));
        assert_eq!(table.get_cell(0, "id").unwrap(), &json!(1));
    }

    #[test]
    fn test_make_column_raw_repeats_constant() {
        let mut table = sample();

        table.make_column_raw("source").unwrap();
        table.make_column_raw("status").unwrap();

        assert_eq!(
            table.get_column("source").unwrap(),
            vec![json!("survey"); 3]
        );
        assert!(table.is_encoded("status"));
        assert!(matches!(
            table.make_column_raw("nope"),
            Err(TableError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_set_constant_rejects_per_row_name() {
        let mut table = sample();

        assert!(matches!(
            table.set_constant("id", json!(1)),
            Err(TableError::DuplicateColumn(_))
        ));
    }

    // ========================================================================
    // Index resolution
    // ========================================================================

    #[test]
    fn test_select_four_shapes() {
        let table = people();

        let cell = table.select(RowSelector::Single(1), "name").unwrap();
        let values = table.select(vec![0usize, 2], "name").unwrap();
        let one_row = table.select_rows(RowSelector::Single(1)).unwrap();
        let sub = table.select(vec![0usize, 2], vec!["id", "name"]).unwrap();

        assert_eq!(cell, Selection::Cell(json!("bob")));
        assert_eq!(values, Selection::Values(vec![json!("ann"), json!("cy")]));
        assert_eq!(
            one_row.into_row().unwrap(),
            row(&[("id", json!(11)), ("name", json!("bob"))])
        );
        let sub = sub.into_table().unwrap();
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.get_column("id").unwrap(), vec![json!(10), json!(12)]);
    }

    #[test]
    fn test_select_row_restricted_to_columns() {
        let table = sample();

        let r = table
            .select(RowSelector::Single(0), vec!["status", "source"])
            .unwrap()
            .into_row()
            .unwrap();

        assert_eq!(r.len(), 2);
        assert_eq!(r["status"], json!("open"));
        assert_eq!(r["source"], json!("survey"));
    }

    #[test]
    fn test_select_single_element_list_is_multiple() {
        let table = people();

        let selection = table.select(vec![1usize], "id").unwrap();

        assert_eq!(selection, Selection::Values(vec![json!(11)]));
    }

    #[test]
    fn test_select_column_only_is_all_rows() {
        let table = people();

        let selection = table.select_columns("id").unwrap();

        assert_eq!(
            selection.into_values().unwrap(),
            vec![json!(10), json!(11), json!(12)]
        );
    }

    #[test]
    fn test_select_range_and_negative_step() {
        let table = people();

        let forward = table.select(0usize..2, "id").unwrap();
        let backward = table
            .select(RowRange::new(None, None, -1), "id")
            .unwrap();
        let tail = table
            .select(RowRange::new(Some(-2), None, 1), "id")
            .unwrap();

        assert_eq!(forward, Selection::Values(vec![json!(10), json!(11)]));
        assert_eq!(
            backward,
            Selection::Values(vec![json!(12), json!(11), json!(10)])
        );
        assert_eq!(tail, Selection::Values(vec![json!(11), json!(12)]));
    }

    #[test]
    fn test_select_errors() {
        let table = sample();

        assert!(matches!(
            table.select(Vec::<usize>::new(), "id"),
            Err(TableError::EmptySelection(_))
        ));
        assert!(matches!(
            table.select(RowSelector::All, Vec::<String>::new()),
            Err(TableError::EmptySelection(_))
        ));
        assert!(matches!(
            table.select(2usize..2, ColumnSelector::All),
            Err(TableError::EmptySelection(_))
        ));
        assert!(matches!(
            table.select(RowRange::new(None, None, 0), "id"),
            Err(TableError::InvalidRange(_))
        ));
        assert!(matches!(
            table.select(RowSelector::Single(0), vec!["id", "nope"]),
            Err(TableError::UnknownColumn(_))
        ));
        assert!(matches!(
            table.select(vec![0usize, 5], "id"),
            Err(TableError::RowOutOfRange { row: 5, .. })
        ));
        assert!(matches!(
            table.select(RowSelector::All, "source"),
            Err(TableError::ConstantColumn(_))
        ));
    }

    #[test]
    fn test_sub_table_keeps_dictionary_schema_and_meta() {
        // Arrange
        let mut table = sample();
        table.set_type("id", "int");
        table.set_type("status", "str");
        table.meta_mut().insert("owner".into(), json!("ops"));

        // Act
        let sub = table
            .select(vec![1usize], vec!["source", "status"])
            .unwrap()
            .into_table()
            .unwrap();

        // Assert
        assert_eq!(sub.column_names(), vec!["source", "status"]);
        assert_eq!(
            sub.dictionary("status").unwrap(),
            table.dictionary("status").unwrap()
        );
        assert_eq!(sub.get_cell(0, "status").unwrap(), &json!("closed"));
        assert_eq!(sub.schema().len(), 1);
        assert_eq!(sub.meta().get("owner"), Some(&json!("ops")));
        assert_consistent(&sub);
    }

    #[test]
    fn test_row_range_resolve_clamps() {
        assert_eq!(
            RowRange::new(Some(-10), Some(10), 2).resolve(5).unwrap(),
            vec![0, 2, 4]
        );
        assert_eq!(
            RowRange::new(Some(10), None, -2).resolve(5).unwrap(),
            vec![4, 2, 0]
        );
        assert!(RowRange::new(Some(3), Some(1), 1).resolve(5).unwrap().is_empty());
        assert!(RowRange::new(None, None, 1).resolve(0).unwrap().is_empty());
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    #[test]
    fn test_rows_is_restartable() {
        let table = sample();

        let first: Vec<Row> = table.rows().collect();
        let second: Vec<Row> = table.rows().collect();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert_eq!(first[1]["status"], json!("closed"));
    }

    #[test]
    fn test_rows_exact_size_and_reverse() {
        let table = people();

        let mut rows = table.rows();
        assert_eq!(rows.len(), 3);
        let last = rows.next_back().unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(last["name"], json!("cy"));
        let names: Vec<Value> = (&table).into_iter().map(|r| r["name"].clone()).collect();
        assert_eq!(names, vec![json!("ann"), json!("bob"), json!("cy")]);
    }

    #[test]
    fn test_column_values_repeats_constant() {
        let table = sample();

        let values: Vec<&Value> = table.column_values("source").unwrap().collect();

        assert_eq!(values, vec![&json!("survey"); 3]);
        assert_eq!(table.column_values("status").unwrap().len(), 3);
        assert!(table.column_values("nope").is_err());
    }

    #[test]
    fn test_frame_source_covers_every_column() {
        let mut table = sample();
        table.set_type("id", "int");

        let source = table.frame_source();

        assert_eq!(source.len, 3);
        let names: Vec<&str> = source.columns.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, table.column_names());
        for (_, values) in source.columns {
            assert_eq!(values.count(), 3);
        }
        assert_eq!(source.schema.get("id").map(String::as_str), Some("int"));
    }

    // ========================================================================
    // Property tests
    // ========================================================================

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Append(Option<u8>, Option<u8>),
            Set(usize, Option<u8>),
            Insert(usize, Option<u8>),
            Delete(Vec<usize>),
        }

        fn cell(v: Option<u8>) -> Value {
            v.map_or(Value::Null, |n| json!(format!("v{}", n % 4)))
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (any::<Option<u8>>(), any::<Option<u8>>()).prop_map(|(a, b)| Op::Append(a, b)),
                (0usize..12, any::<Option<u8>>()).prop_map(|(r, v)| Op::Set(r, v)),
                (0usize..12, any::<Option<u8>>()).prop_map(|(r, v)| Op::Insert(r, v)),
                prop::collection::vec(0usize..12, 0..3).prop_map(Op::Delete),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(50))]

            #[test]
            fn prop_layout_invariants_hold(ops in prop::collection::vec(op(), 0..30)) {
                let mut table = Table::with_headers(row(&[("k", json!(0))]), &["raw"], &["enc"]).unwrap();
                let mut model: Vec<(Value, Value)> = Vec::new();

                for op in ops {
                    match op {
                        Op::Append(a, b) => {
                            table.append_row(&row(&[("raw", cell(a)), ("enc", cell(b))]), true).unwrap();
                            model.push((cell(a), cell(b)));
                        }
                        Op::Set(r, v) => {
                            let result = table.set_cell(r, "enc", cell(v));
                            if r < model.len() {
                                prop_assert!(result.is_ok());
                                model[r].1 = cell(v);
                            } else if r == model.len() {
                                prop_assert!(result.is_ok());
                                model.push((Value::Null, cell(v)));
                            } else {
                                prop_assert!(result.is_err());
                            }
                        }
                        Op::Insert(r, v) => {
                            let result = table.insert_row(r, &row(&[("enc", cell(v))]));
                            if r <= model.len() {
                                prop_assert!(result.is_ok());
                                model.insert(r, (Value::Null, cell(v)));
                            } else {
                                prop_assert!(result.is_err());
                            }
                        }
                        Op::Delete(mut rows) => {
                            let result = table.delete_rows(&rows);
                            rows.sort_unstable();
                            rows.dedup();
                            if rows.iter().all(|&r| r < model.len()) {
                                prop_assert!(result.is_ok());
                                for r in rows.into_iter().rev() {
                                    model.remove(r);
                                }
                            } else {
                                prop_assert!(result.is_err());
                            }
                        }
                    }

                    prop_assert_eq!(table.len(), model.len());
                    assert_consistent(&table);
                }

                let raw: Vec<Value> = model.iter().map(|(a, _)| a.clone()).collect();
                let enc: Vec<Value> = model.iter().map(|(_, b)| b.clone()).collect();
                prop_assert_eq!(table.get_column("raw").unwrap(), raw);
                prop_assert_eq!(table.get_column("enc").unwrap(), enc);
            }
        }
    }
}
