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

//! Competition question sampling.
//!
//! The sampler draws a fixed-size, duplicate-free question set from the
//! approved pool, or fails with `InsufficientPool` when the pool is too
//! small. A competition is never partially filled.

use crate::base::{AccountId, CompetitionId, ReviewableId};
use crate::error::EngineError;
use crate::reviewable::{Reviewable, Reward};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Draws question samples for competitions.
///
/// The randomness source is injectable: construct with [`with_seed`] for a
/// deterministic draw in tests, or [`new`] for an entropy-seeded one.
///
/// [`new`]: CompetitionSampler::new
/// [`with_seed`]: CompetitionSampler::with_seed
pub struct CompetitionSampler {
    rng: Mutex<StdRng>,
}

impl CompetitionSampler {
    /// Creates a sampler seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a sampler with a fixed seed, for reproducible draws.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Draws `count` distinct question IDs from the pool.
    ///
    /// The pool is filtered to approved questions matching `subject` and
    /// `grade` at call time; the draw is an unbiased permutation of the
    /// filtered set, truncated to `count`, so no question repeats.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InsufficientPool`] if the filtered pool holds
    /// fewer than `count` questions. The result is never silently truncated.
    pub fn sample(
        &self,
        pool: &[Reviewable],
        subject: &str,
        grade: &str,
        count: usize,
    ) -> Result<Vec<ReviewableId>, EngineError> {
        let mut ids: Vec<ReviewableId> = pool
            .iter()
            .filter(|r| r.is_approved())
            .filter(|r| r.question_filter_keys() == Some((subject, grade)))
            .map(|r| r.id)
            .collect();

        if ids.len() < count {
            return Err(EngineError::InsufficientPool {
                available: ids.len(),
                requested: count,
            });
        }

        // Fisher-Yates shuffle, then take the head.
        let mut rng = self.rng.lock();
        for i in (1..ids.len()).rev() {
            let j = rng.gen_range(0..=i);
            ids.swap(i, j);
        }
        ids.truncate(count);
        Ok(ids)
    }
}

impl Default for CompetitionSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// A participant's result in a competition. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantScore {
    pub account: AccountId,
    pub score: u32,
    pub recorded_at: DateTime<Utc>,
}

/// A competition over a fixed, immutable question set.
///
/// The question-id set is selected once at creation and never mutates
/// afterward; only participant scores may be appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competition {
    pub id: CompetitionId,
    pub subject: String,
    pub grade: String,
    pub reward: Reward,
    question_ids: Vec<ReviewableId>,
    scores: Vec<ParticipantScore>,
}

impl Competition {
    pub(crate) fn new(
        id: CompetitionId,
        subject: String,
        grade: String,
        reward: Reward,
        question_ids: Vec<ReviewableId>,
    ) -> Self {
        Self {
            id,
            subject,
            grade,
            reward,
            question_ids,
            scores: Vec::new(),
        }
    }

    /// The selected question IDs, fixed at creation.
    pub fn question_ids(&self) -> &[ReviewableId] {
        &self.question_ids
    }

    pub fn required_count(&self) -> usize {
        self.question_ids.len()
    }

    pub fn scores(&self) -> &[ParticipantScore] {
        &self.scores
    }

    pub(crate) fn record_score(&mut self, account: AccountId, score: u32) {
        self.scores.push(ParticipantScore {
            account,
            score,
            recorded_at: Utc::now(),
        });
    }
}
