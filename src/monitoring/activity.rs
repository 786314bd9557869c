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

//! Last-request bookkeeping used by callers for idle-shutdown decisions

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct ActivityTracker {
    last_request: RwLock<Option<DateTime<Utc>>>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch(&self) {
        self.touch_at(Utc::now());
    }

    /// Timestamps only move forward
    pub fn touch_at(&self, at: DateTime<Utc>) {
        let mut last = self.last_request.write();
        if last.map_or(true, |prev| at > prev) {
            *last = Some(at);
        }
    }

    pub fn last_request(&self) -> Option<DateTime<Utc>> {
        *self.last_request.read()
    }
}
