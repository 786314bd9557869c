/*
 * Copyright 2025 Vijaykumar Singh
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Flat (exact) vector store
//!
//! Embeddings are kept row-major in one contiguous buffer, with the image id
//! for row `i` at position `i` of a parallel id list. Rows are only ever
//! appended, so a row index handed out by [`VectorStore::search`] stays
//! valid for the lifetime of the store.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use super::deadline::Deadline;
use crate::compute::squared_euclidean;
use crate::core::{ImageId, IndexError, IndexResult};

/// Rows scanned between deadline checks
pub const SCAN_BATCH_ROWS: usize = 4096;

/// One search hit: row index plus squared L2 distance to the query
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub row: usize,
    pub distance: f32,
}

/// Heap entry ordered by (distance, row) so that the heap top is the worst
/// candidate kept so far.
#[derive(Debug, Clone, Copy)]
struct Candidate(Neighbor);

impl Candidate {
    fn key_cmp(&self, other: &Self) -> Ordering {
        self.0
            .distance
            .total_cmp(&other.0.distance)
            .then_with(|| self.0.row.cmp(&other.0.row))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.key_cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.key_cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key_cmp(other)
    }
}

/// Fixed-dimension container answering exact k-NN queries
#[derive(Debug, Clone)]
pub struct VectorStore {
    dimension: usize,
    data: Vec<f32>,
    ids: Vec<ImageId>,
    rows_by_id: HashMap<ImageId, usize>,
}

impl VectorStore {
    pub fn new(dimension: usize) -> Self {
        Self::with_capacity(dimension, 0)
    }

    pub fn with_capacity(dimension: usize, rows: usize) -> Self {
        Self {
            dimension,
            data: Vec::with_capacity(dimension.saturating_mul(rows)),
            ids: Vec::with_capacity(rows),
            rows_by_id: HashMap::with_capacity(rows),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Append `vector` under `id`, returning its row index
    pub fn add(&mut self, id: impl Into<ImageId>, vector: &[f32]) -> IndexResult<usize> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let id = id.into();
        if self.rows_by_id.contains_key(&id) {
            return Err(IndexError::DuplicateId(id));
        }

        let row = self.ids.len();
        self.data.extend_from_slice(vector);
        self.rows_by_id.insert(id.clone(), row);
        self.ids.push(id);
        Ok(row)
    }

    pub fn size(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn row_of(&self, id: &str) -> Option<usize> {
        self.rows_by_id.get(id).copied()
    }

    pub fn id_of(&self, row: usize) -> IndexResult<&str> {
        self.ids
            .get(row)
            .map(String::as_str)
            .ok_or(IndexError::OutOfRange { row, size: self.size() })
    }

    pub fn vector(&self, row: usize) -> Option<&[f32]> {
        if row >= self.size() {
            return None;
        }
        let start = row * self.dimension;
        Some(&self.data[start..start + self.dimension])
    }

    pub fn ids(&self) -> &[ImageId] {
        &self.ids
    }

    /// Bytes held by the embedding buffer
    pub fn vector_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }

    /// Up to `k` nearest rows by squared L2 distance, ascending, ties broken
    /// by ascending row index.
    pub fn search(&self, query: &[f32], k: usize) -> IndexResult<Vec<Neighbor>> {
        self.search_with_deadline(query, k, &Deadline::none())
    }

    /// Same as [`search`](Self::search), checking `deadline` between batches
    /// of [`SCAN_BATCH_ROWS`] rows.
    pub fn search_with_deadline(
        &self,
        query: &[f32],
        k: usize,
        deadline: &Deadline,
    ) -> IndexResult<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 || self.is_empty() || self.dimension == 0 {
            return Ok(Vec::new());
        }

        let keep = k.min(self.size());
        let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(keep + 1);
        let batch_len = SCAN_BATCH_ROWS * self.dimension;

        for (batch_index, batch) in self.data.chunks(batch_len).enumerate() {
            deadline.check("vector scan")?;

            let first_row = batch_index * SCAN_BATCH_ROWS;
            for (offset, row_vector) in batch.chunks_exact(self.dimension).enumerate() {
                let candidate = Candidate(Neighbor {
                    row: first_row + offset,
                    distance: squared_euclidean(query, row_vector),
                });

                if heap.len() < keep {
                    heap.push(candidate);
                } else if let Some(worst) = heap.peek() {
                    if candidate < *worst {
                        heap.pop();
                        heap.push(candidate);
                    }
                }
            }
        }

        Ok(heap.into_sorted_vec().into_iter().map(|c| c.0).collect())
    }
}
