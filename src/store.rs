// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Thread-safe reviewable store with deduplication.
//!
//! Combines a [`DashMap`] for O(1) duplicate checking and lookup with a
//! [`SegQueue`] preserving submission order for FIFO review worklists.
//! Reviewables are never deleted through the public API; decided entities
//! remain as an audit trail. The engine may remove entries only to roll
//! back a failed batch insert.

use crate::base::{AccountId, ReviewableId};
use crate::error::EngineError;
use crate::reviewable::{ReviewKind, Reviewable};
use crossbeam::queue::SegQueue;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Query filter for store listings.
///
/// `subject` and `grade` refer to a question's academic subject and grade
/// band; a filter with either set matches only question payloads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewFilter {
    pub kind: Option<ReviewKind>,
    pub subject: Option<String>,
    pub grade: Option<String>,
    pub author: Option<AccountId>,
}

impl ReviewFilter {
    /// Filter for approved/pending questions of one subject and grade.
    pub fn questions(subject: &str, grade: &str) -> Self {
        Self {
            kind: Some(ReviewKind::Question),
            subject: Some(subject.to_string()),
            grade: Some(grade.to_string()),
            author: None,
        }
    }

    fn matches(&self, reviewable: &Reviewable) -> bool {
        if let Some(kind) = self.kind {
            if reviewable.kind() != kind {
                return false;
            }
        }
        if let Some(author) = self.author {
            if reviewable.author != author {
                return false;
            }
        }
        if self.subject.is_some() || self.grade.is_some() {
            let Some((subject, grade)) = reviewable.question_filter_keys() else {
                return false;
            };
            if let Some(want) = &self.subject {
                if subject != want {
                    return false;
                }
            }
            if let Some(want) = &self.grade {
                if grade != want {
                    return false;
                }
            }
        }
        true
    }
}

/// A thread-safe collection of reviewables with duplicate detection.
#[derive(Debug, Default)]
pub struct ReviewableStore {
    /// Reviewables indexed by ID for O(1) duplicate detection and lookup.
    reviewables: DashMap<ReviewableId, Reviewable>,

    /// Submission order, for FIFO review worklists.
    submission_order: SegQueue<ReviewableId>,
}

impl ReviewableStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            reviewables: DashMap::new(),
            submission_order: SegQueue::new(),
        }
    }

    /// Inserts a reviewable.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateReviewable`] if a reviewable with the
    /// same ID already exists.
    pub fn insert(&self, reviewable: Reviewable) -> Result<(), EngineError> {
        let id = reviewable.id;

        // Entry API for atomic check-and-insert to prevent race conditions
        match self.reviewables.entry(id) {
            Entry::Occupied(_) => Err(EngineError::DuplicateReviewable),
            Entry::Vacant(entry) => {
                entry.insert(reviewable);
                self.submission_order.push(id);
                Ok(())
            }
        }
    }

    /// Retrieves a reviewable by ID.
    pub fn get(
        &self,
        id: &ReviewableId,
    ) -> Option<dashmap::mapref::one::Ref<'_, ReviewableId, Reviewable>> {
        self.reviewables.get(id)
    }

    /// Exclusive access to a reviewable's entry.
    ///
    /// The returned guard holds the entry's shard lock. The engine relies on
    /// this as its compare-and-swap: checking `Pending` and writing the
    /// terminal state under one guard means a racing reviewer observes
    /// either `Pending` (and wins) or a terminal state (and loses).
    pub(crate) fn get_mut(
        &self,
        id: &ReviewableId,
    ) -> Option<dashmap::mapref::one::RefMut<'_, ReviewableId, Reviewable>> {
        self.reviewables.get_mut(id)
    }

    /// Removes a reviewable, undoing a batch insert that failed partway.
    ///
    /// The ID stays in the submission queue; [`Self::pop_next_pending`]
    /// drops stale entries when it encounters them.
    pub(crate) fn remove(&self, id: &ReviewableId) {
        self.reviewables.remove(id);
    }

    /// Pops the oldest still-pending reviewable ID off the submission queue.
    ///
    /// Already-decided entries encountered on the way are dropped from the
    /// queue (they remain in the store). Each ID is surfaced at most once.
    pub fn pop_next_pending(&self) -> Option<ReviewableId> {
        while let Some(id) = self.submission_order.pop() {
            if self.reviewables.get(&id).is_some_and(|r| r.is_pending()) {
                return Some(id);
            }
        }
        None
    }

    /// Lists pending reviewables matching the filter, for review UIs.
    pub fn list_pending(&self, filter: &ReviewFilter) -> Vec<Reviewable> {
        self.list_where(filter, Reviewable::is_pending)
    }

    /// Lists approved reviewables matching the filter, for the sampler.
    pub fn list_approved(&self, filter: &ReviewFilter) -> Vec<Reviewable> {
        self.list_where(filter, Reviewable::is_approved)
    }

    fn list_where(
        &self,
        filter: &ReviewFilter,
        status_check: impl Fn(&Reviewable) -> bool,
    ) -> Vec<Reviewable> {
        self.reviewables
            .iter()
            .filter(|entry| status_check(entry.value()) && filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of reviewables ever submitted.
    pub fn len(&self) -> usize {
        self.reviewables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviewables.is_empty()
    }
}
