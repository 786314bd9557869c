//! Vector store behaviour through the public API

use image_similarity::compute::squared_euclidean;
use image_similarity::index::{Deadline, VectorStore, SCAN_BATCH_ROWS};
use image_similarity::IndexError;
use std::time::Duration;

#[test]
fn test_rows_and_ids_stay_parallel() {
    let mut store = VectorStore::new(3);
    for i in 0..10 {
        store.add(format!("img-{i}"), &[i as f32, 0.0, 1.0]).unwrap();
    }
    assert_eq!(store.size(), store.ids().len());
    for row in 0..store.size() {
        assert_eq!(store.vector(row).unwrap().len(), 3);
        assert_eq!(store.row_of(store.id_of(row).unwrap()), Some(row));
    }
    assert!(store.vector(10).is_none());
}

#[test]
fn test_failed_add_leaves_store_unchanged() {
    let mut store = VectorStore::new(2);
    store.add("a", &[0.0, 0.0]).unwrap();

    assert!(matches!(store.add("b", &[0.0]), Err(IndexError::DimensionMismatch { .. })));
    assert!(matches!(store.add("a", &[5.0, 5.0]), Err(IndexError::DuplicateId(_))));

    assert_eq!(store.size(), 1);
    assert_eq!(store.vector_bytes(), 8);
    assert_eq!(store.search(&[5.0, 5.0], 10).unwrap()[0].distance, 50.0);
}

#[test]
fn test_distances_come_from_the_kernel() {
    let mut store = VectorStore::new(5);
    let rows = [
        [0.5, -1.0, 2.0, 3.5, 0.25],
        [1.0, 1.0, 1.0, 1.0, 1.0],
        [-2.0, 0.0, 0.0, 4.0, 9.0],
    ];
    for (i, row) in rows.iter().enumerate() {
        store.add(i.to_string(), row).unwrap();
    }
    let query = [0.0, 0.5, 1.5, 2.0, -1.0];
    for hit in store.search(&query, 3).unwrap() {
        assert_eq!(hit.distance, squared_euclidean(&query, &rows[hit.row]));
    }
}

#[test]
fn test_large_store_search_spans_batches() {
    let rows = SCAN_BATCH_ROWS + 10;
    let mut store = VectorStore::with_capacity(1, rows);
    for i in 0..rows {
        store.add(format!("img-{i}"), &[i as f32]).unwrap();
    }
    let hits = store.search(&[(rows - 1) as f32], 2).unwrap();
    assert_eq!(hits[0].row, rows - 1);
    assert_eq!(hits[1].row, rows - 2);
}

#[test]
fn test_unbounded_and_expired_deadlines() {
    let mut store = VectorStore::new(1);
    store.add("a", &[1.0]).unwrap();
    assert_eq!(store.search_with_deadline(&[1.0], 1, &Deadline::none()).unwrap().len(), 1);
    assert_eq!(
        store
            .search_with_deadline(&[1.0], 1, &Deadline::after(Duration::ZERO))
            .unwrap_err(),
        IndexError::DeadlineExceeded("vector scan")
    );
}
