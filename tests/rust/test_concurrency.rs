//! Concurrent build / search behaviour on a single tenant

use std::sync::Arc;
use std::time::Duration;

use image_similarity::{Deadline, ErrorKind, IndexConfig, IndexCoordinator, SearchParams};

use super::common::tenant;

const GENERATIONS: usize = 40;

/// Ids of generation `g`: `g` + 1 rows tagged with the generation number
fn generation(g: usize) -> (Vec<String>, Vec<Vec<f32>>) {
    let ids = (0..=g).map(|i| format!("gen{g}-{i}")).collect();
    let vectors = (0..=g).map(|i| vec![i as f32 * 0.01, 0.0]).collect();
    (ids, vectors)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_searches_observe_whole_stores_only() {
    let coordinator = Arc::new(IndexCoordinator::in_memory(IndexConfig {
        embedding_dim: 2,
        max_tenant_size: 1_000,
        max_concurrent_searches: 8,
    }));
    let user = tenant(1);
    let (ids, vectors) = generation(0);
    coordinator.build(&user, ids, vectors, Deadline::none()).await.unwrap();

    let builder = {
        let coordinator = Arc::clone(&coordinator);
        let user = user.clone();
        tokio::spawn(async move {
            for g in 1..GENERATIONS {
                let (ids, vectors) = generation(g);
                coordinator.build(&user, ids, vectors, Deadline::none()).await.unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    let searchers: Vec<_> = (0..4)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            let user = user.clone();
            tokio::spawn(async move {
                let mut seen = Vec::new();
                for _ in 0..100 {
                    let result = coordinator
                        .search(&user, vec![0.0, 0.0], SearchParams::new(1_000, 27.0), Deadline::none())
                        .await
                        .unwrap();
                    seen.push(result);
                    tokio::task::yield_now().await;
                }
                seen
            })
        })
        .collect();

    builder.await.unwrap();
    for searcher in futures::future::join_all(searchers).await {
        for result in searcher.unwrap() {
            let prefix = result[0].split('-').next().unwrap().to_string();
            let g: usize = prefix.trim_start_matches("gen").parse().unwrap();
            // Every row of exactly one generation, nearest first
            let (expected, _) = generation(g);
            assert_eq!(result, expected);
        }
    }
}

#[tokio::test]
async fn test_search_waits_for_a_permit() {
    let coordinator = Arc::new(IndexCoordinator::in_memory(IndexConfig {
        embedding_dim: 1,
        max_tenant_size: 10,
        max_concurrent_searches: 1,
    }));
    let user = tenant(1);
    coordinator
        .build(&user, vec!["a".to_string()], vec![vec![0.0]], Deadline::none())
        .await
        .unwrap();

    let slot = coordinator.registry().get(&user).unwrap();
    let held = slot.search_permits().acquire_owned().await.unwrap();

    let waiting = {
        let coordinator = Arc::clone(&coordinator);
        let user = user.clone();
        tokio::spawn(async move {
            coordinator
                .search(&user, vec![0.0], SearchParams::default(), Deadline::none())
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiting.is_finished());

    drop(held);
    assert_eq!(waiting.await.unwrap().unwrap(), vec!["a".to_string()]);
}

#[tokio::test]
async fn test_queued_search_times_out() {
    let coordinator = IndexCoordinator::in_memory(IndexConfig {
        embedding_dim: 1,
        max_tenant_size: 10,
        max_concurrent_searches: 1,
    });
    let user = tenant(1);
    coordinator
        .build(&user, vec!["a".to_string()], vec![vec![0.0]], Deadline::none())
        .await
        .unwrap();

    let slot = coordinator.registry().get(&user).unwrap();
    let _held = slot.search_permits().acquire_owned().await.unwrap();

    let err = coordinator
        .search(
            &user,
            vec![0.0],
            SearchParams::default(),
            Deadline::after(Duration::from_millis(30)),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_other_tenants_are_not_blocked() {
    let coordinator = Arc::new(IndexCoordinator::in_memory(IndexConfig {
        embedding_dim: 1,
        max_tenant_size: 10,
        max_concurrent_searches: 1,
    }));
    for user in [tenant(1), tenant(2)] {
        coordinator
            .build(&user, vec!["a".to_string()], vec![vec![0.0]], Deadline::none())
            .await
            .unwrap();
    }

    let slot = coordinator.registry().get(&tenant(1)).unwrap();
    let _held = slot.search_permits().acquire_owned().await.unwrap();

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        coordinator.search(&tenant(2), vec![0.0], SearchParams::default(), Deadline::none()),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(result, vec!["a".to_string()]);
}
