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

//! The approval engine.
//!
//! The [`ApprovalEngine`] is the only writer of review status and the only
//! caller of ledger credit/debit as a review side effect. It executes the
//! pending → approved/rejected transition and applies the reward exactly
//! once per reviewable.
//!
//! # Review Processing
//!
//! - **Submit**: Insert a contribution in `Pending` state.
//! - **Self-approved submit**: Insert administrator-authored content already
//!   approved, with a self-approval audit mark and no ledger effect.
//! - **Approve**: Terminal transition; credits the subject's account, or
//!   debits it for negative-sign behavior records.
//! - **Reject**: Terminal transition; no ledger effect.
//!
//! # Thread Safety
//!
//! The pending check and the terminal write happen under the store's
//! exclusive entry guard, so two reviewers racing to decide the same entity
//! resolve to exactly one ledger mutation; the loser observes
//! [`EngineError::AlreadyReviewed`].

use crate::account::CreditOutcome;
use crate::base::{AccountId, CompetitionId, ReviewableId};
use crate::error::EngineError;
use crate::ledger::Ledger;
use crate::reviewable::{BehaviorSign, ReviewPayload, Reviewable, Reward};
use crate::sampler::{Competition, CompetitionSampler};
use crate::store::{ReviewFilter, ReviewableStore};
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// A reviewer's verdict on a pending reviewable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

/// The ledger mutation applied by an approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEffect {
    /// Reward credited to the subject account.
    Credited(CreditOutcome),
    /// Currency debited from the subject account (negative behavior record).
    Debited { remaining: i64 },
}

/// Result of a successful `decide` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    Approved(LedgerEffect),
    Rejected,
}

/// A brand-new question written for one specific competition.
///
/// Subject and grade are taken from the competition itself, so an authored
/// question can never mismatch the competition's filter.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthoredQuestion {
    pub id: ReviewableId,
    pub text: String,
    pub reward: Reward,
}

/// Approval and rewards engine over a reviewable store and a ledger.
///
/// # Invariants
///
/// - Review status transitions only `Pending` → `Approved` or `Pending` →
///   `Rejected`; terminal states are immutable.
/// - A reward is applied to the ledger at most once per reviewable,
///   enforced by terminal-state immutability, not by idempotent math.
/// - The payload's sign selects the ledger operation: negative behavior
///   records debit currency, everything else credits.
/// - A competition's question set is fixed at creation.
pub struct ApprovalEngine {
    store: ReviewableStore,
    ledger: Ledger,
    competitions: DashMap<CompetitionId, Competition>,
}

impl ApprovalEngine {
    /// Creates an engine with an empty store and a default-curve ledger.
    pub fn new() -> Self {
        Self::with_ledger(Ledger::new())
    }

    /// Creates an engine over a pre-configured ledger.
    pub fn with_ledger(ledger: Ledger) -> Self {
        ApprovalEngine {
            store: ReviewableStore::new(),
            ledger,
            competitions: DashMap::new(),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn store(&self) -> &ReviewableStore {
        &self.store
    }

    /// Submits a contribution for review.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidAmount`] - Reward descriptor has a negative
    ///   amount. Rewards are validated here and re-checked at approval.
    /// - [`EngineError::AccountNotFound`] - Subject account does not exist.
    /// - [`EngineError::DuplicateReviewable`] - Reviewable ID already used.
    pub fn submit(&self, reviewable: Reviewable) -> Result<(), EngineError> {
        if !reviewable.reward.is_valid() {
            return Err(EngineError::InvalidAmount);
        }
        if self.ledger.get_account(&reviewable.subject).is_none() {
            return Err(EngineError::AccountNotFound);
        }
        self.store.insert(reviewable)
    }

    /// Inserts administrator-authored reviewables, already approved.
    ///
    /// Each entity carries a self-approval audit mark instead of a reviewer
    /// decision, and no ledger effect is applied. This is a distinct path
    /// from peer review; it exists for content the submitting authority
    /// vouches for itself (e.g. questions written for a competition).
    ///
    /// The batch lands in full or not at all. Rewards are validated before
    /// the first insert; if an ID turns out to be taken partway through
    /// (including by a concurrent submission), the batch's earlier inserts
    /// are removed again before the error is returned.
    pub fn submit_self_approved(
        &self,
        reviewables: Vec<Reviewable>,
    ) -> Result<Vec<ReviewableId>, EngineError> {
        for reviewable in &reviewables {
            if !reviewable.reward.is_valid() {
                return Err(EngineError::InvalidAmount);
            }
        }

        let now = Utc::now();
        let mut ids = Vec::with_capacity(reviewables.len());
        for mut reviewable in reviewables {
            reviewable.mark_self_approved(now);
            let id = reviewable.id;
            if let Err(e) = self.store.insert(reviewable) {
                for inserted in &ids {
                    self.store.remove(inserted);
                }
                return Err(e);
            }
            ids.push(id);
        }
        Ok(ids)
    }

    /// Applies a reviewer's decision to a pending reviewable.
    ///
    /// On approval the reward descriptor is applied to the subject's
    /// account: a credit of currency and experience, except for
    /// negative-sign behavior records, whose currency amount is applied as
    /// a clamped debit. Rejection has no ledger effect.
    ///
    /// The whole transition is atomic: the pending check, the ledger
    /// effect, and the terminal write happen under the entry's exclusive
    /// guard, and every failure path leaves both store and ledger untouched.
    ///
    /// # Errors
    ///
    /// - [`EngineError::ReviewableNotFound`] - Unknown reviewable ID.
    /// - [`EngineError::AlreadyReviewed`] - The entity is no longer pending.
    ///   Callers should treat this as a benign race and re-fetch.
    /// - [`EngineError::InvalidAmount`] - The stored reward has a negative
    ///   amount (possible for reviewables inserted directly into the store).
    /// - [`EngineError::AccountNotFound`] - The subject account is gone.
    ///
    /// On any error the entity stays pending and the ledger is untouched.
    pub fn decide(
        &self,
        id: ReviewableId,
        decision: Decision,
        reviewer: AccountId,
    ) -> Result<ReviewOutcome, EngineError> {
        let mut entry = self
            .store
            .get_mut(&id)
            .ok_or(EngineError::ReviewableNotFound)?;
        if !entry.is_pending() {
            return Err(EngineError::AlreadyReviewed);
        }

        let now = Utc::now();
        match decision {
            Decision::Reject => {
                entry.mark_rejected(reviewer, now);
                Ok(ReviewOutcome::Rejected)
            }
            Decision::Approve => {
                let subject = entry.subject;
                let reward = entry.reward;
                let negative = matches!(
                    entry.payload,
                    ReviewPayload::BehaviorRecord {
                        sign: BehaviorSign::Negative,
                        ..
                    }
                );

                // Reward validity is normally enforced at submission, but
                // the store accepts direct inserts, so it is re-checked
                // here; a ledger-side rejection must not follow the status
                // write.
                if !reward.is_valid() {
                    return Err(EngineError::InvalidAmount);
                }
                if self.ledger.get_account(&subject).is_none() {
                    return Err(EngineError::AccountNotFound);
                }

                // The ledger effect precedes the terminal write so that a
                // failed credit (e.g. balance overflow) leaves the entity
                // pending. The entry guard is held throughout, so a racing
                // decide cannot interleave between the two.
                let effect = if negative {
                    let remaining = self.ledger.debit(subject, reward.currency)?;
                    LedgerEffect::Debited { remaining }
                } else {
                    let outcome =
                        self.ledger
                            .credit(subject, reward.currency, reward.experience)?;
                    LedgerEffect::Credited(outcome)
                };
                entry.mark_approved(reviewer, now);
                Ok(ReviewOutcome::Approved(effect))
            }
        }
    }

    /// Creates a competition by sampling the approved question bank.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InsufficientPool`] - Fewer approved questions match
    ///   the subject/grade filter than `count`. No competition is created.
    /// - [`EngineError::DuplicateCompetition`] - Competition ID already used.
    pub fn create_competition(
        &self,
        id: CompetitionId,
        subject: &str,
        grade: &str,
        count: usize,
        reward: Reward,
        sampler: &CompetitionSampler,
    ) -> Result<Competition, EngineError> {
        let pool = self
            .store
            .list_approved(&ReviewFilter::questions(subject, grade));
        let question_ids = sampler.sample(&pool, subject, grade, count)?;
        self.insert_competition(Competition::new(
            id,
            subject.to_string(),
            grade.to_string(),
            reward,
            question_ids,
        ))
    }

    /// Creates a competition from brand-new questions written by `author`.
    ///
    /// Each authored question is inserted through the self-approval path
    /// synchronously, then the draw is restricted to exactly that
    /// just-inserted set with `count = authored.len()`. Unrelated bank
    /// questions are never pulled in, and insufficiency cannot occur.
    pub fn author_competition(
        &self,
        id: CompetitionId,
        subject: &str,
        grade: &str,
        reward: Reward,
        author: AccountId,
        authored: Vec<AuthoredQuestion>,
        sampler: &CompetitionSampler,
    ) -> Result<Competition, EngineError> {
        if self.competitions.contains_key(&id) {
            return Err(EngineError::DuplicateCompetition);
        }

        let drafts: Vec<Reviewable> = authored
            .into_iter()
            .map(|q| {
                Reviewable::new(
                    q.id,
                    author,
                    author,
                    q.reward,
                    ReviewPayload::Question {
                        subject: subject.to_string(),
                        grade: grade.to_string(),
                        text: q.text,
                    },
                )
            })
            .collect();
        let count = drafts.len();

        let inserted = self.submit_self_approved(drafts)?;

        // Draw from exactly the just-inserted set, not the whole bank.
        let pool: Vec<Reviewable> = inserted
            .iter()
            .filter_map(|qid| self.store.get(qid).map(|r| r.value().clone()))
            .collect();
        let question_ids = sampler.sample(&pool, subject, grade, count)?;

        self.insert_competition(Competition::new(
            id,
            subject.to_string(),
            grade.to_string(),
            reward,
            question_ids,
        ))
    }

    fn insert_competition(&self, competition: Competition) -> Result<Competition, EngineError> {
        match self.competitions.entry(competition.id) {
            Entry::Occupied(_) => Err(EngineError::DuplicateCompetition),
            Entry::Vacant(entry) => {
                entry.insert(competition.clone());
                Ok(competition)
            }
        }
    }

    /// Retrieves a competition by ID.
    pub fn get_competition(
        &self,
        id: &CompetitionId,
    ) -> Option<dashmap::mapref::one::Ref<'_, CompetitionId, Competition>> {
        self.competitions.get(id)
    }

    /// Appends a participant's result to a competition.
    ///
    /// The question set never changes; scores are the only mutation a
    /// competition accepts after creation.
    ///
    /// # Errors
    ///
    /// - [`EngineError::CompetitionNotFound`] - Unknown competition ID.
    /// - [`EngineError::AccountNotFound`] - Unknown participant account.
    pub fn record_score(
        &self,
        id: CompetitionId,
        account: AccountId,
        score: u32,
    ) -> Result<(), EngineError> {
        if self.ledger.get_account(&account).is_none() {
            return Err(EngineError::AccountNotFound);
        }
        let mut competition = self
            .competitions
            .get_mut(&id)
            .ok_or(EngineError::CompetitionNotFound)?;
        competition.record_score(account, score);
        Ok(())
    }
}

impl Default for ApprovalEngine {
    fn default() -> Self {
        Self::new()
    }
}
