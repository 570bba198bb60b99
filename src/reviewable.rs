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

//! Reviewable entities and the review state machine.
//!
//! All three contribution kinds share one envelope and one state machine:
//! - [`Pending`] → [`Approved`] (via an approve decision or self-approval)
//! - [`Pending`] → [`Rejected`] (via a reject decision)
//!
//! Both terminal states are immutable; a reviewable is decided at most once
//! and is never deleted, so the store doubles as an audit trail.
//!
//! [`Pending`]: ReviewStatus::Pending
//! [`Approved`]: ReviewStatus::Approved
//! [`Rejected`]: ReviewStatus::Rejected

use crate::base::{AccountId, ReviewableId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reward descriptor attached to a reviewable, applied on approval.
///
/// For a negative-sign behavior record the currency amount is applied as a
/// debit rather than a credit; experience is never debited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub currency: i64,
    pub experience: i64,
}

impl Reward {
    pub const ZERO: Reward = Reward {
        currency: 0,
        experience: 0,
    };

    pub fn new(currency: i64, experience: i64) -> Self {
        Self {
            currency,
            experience,
        }
    }

    /// True when both amounts are non-negative. Rewards are validated at
    /// submission and re-checked at approval, before any status write.
    pub fn is_valid(&self) -> bool {
        self.currency >= 0 && self.experience >= 0
    }
}

/// Whether a behavior record commends or disciplines the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorSign {
    Positive,
    Negative,
}

/// Kind-specific payload of a reviewable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReviewPayload {
    /// A student's submission of a completed quest/task.
    QuestSubmission { quest_id: u32, note: String },
    /// A teacher's observation of student behavior.
    ///
    /// The sign decides the ledger operation on approval: positive records
    /// credit the subject, negative records debit currency.
    BehaviorRecord { sign: BehaviorSign, note: String },
    /// A contributed question for the question bank.
    Question {
        subject: String,
        grade: String,
        text: String,
    },
}

impl ReviewPayload {
    pub fn kind(&self) -> ReviewKind {
        match self {
            Self::QuestSubmission { .. } => ReviewKind::QuestSubmission,
            Self::BehaviorRecord { .. } => ReviewKind::BehaviorRecord,
            Self::Question { .. } => ReviewKind::Question,
        }
    }
}

/// Discriminant of [`ReviewPayload`], used in store queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewKind {
    QuestSubmission,
    BehaviorRecord,
    Question,
}

/// How a reviewable came to be approved.
///
/// Reviewer decisions and self-approvals carry separate audit fields: a
/// self-approved entity (administrator-authored content) never names a
/// reviewer, and the two paths must not be conflated in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Approval {
    /// A reviewer with authority approved a peer contribution.
    Decision {
        reviewer: AccountId,
        decided_at: DateTime<Utc>,
    },
    /// Administrator-authored content, approved at insertion.
    SelfApproved { decided_at: DateTime<Utc> },
}

/// Review status envelope. Terminal states are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewStatus {
    Pending,
    Approved(Approval),
    Rejected {
        reviewer: AccountId,
        decided_at: DateTime<Utc>,
    },
}

/// A reviewable entity: shared envelope plus a kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reviewable {
    pub id: ReviewableId,
    /// Account that benefits from (or is evaluated by) this entity.
    pub subject: AccountId,
    /// Account that created this entity.
    pub author: AccountId,
    pub reward: Reward,
    pub submitted_at: DateTime<Utc>,
    pub payload: ReviewPayload,
    status: ReviewStatus,
}

impl Reviewable {
    /// Creates a new reviewable in the `Pending` state, stamped now.
    pub fn new(
        id: ReviewableId,
        subject: AccountId,
        author: AccountId,
        reward: Reward,
        payload: ReviewPayload,
    ) -> Self {
        Self {
            id,
            subject,
            author,
            reward,
            submitted_at: Utc::now(),
            payload,
            status: ReviewStatus::Pending,
        }
    }

    pub fn status(&self) -> ReviewStatus {
        self.status
    }

    pub fn kind(&self) -> ReviewKind {
        self.payload.kind()
    }

    pub fn is_pending(&self) -> bool {
        self.status == ReviewStatus::Pending
    }

    pub fn is_approved(&self) -> bool {
        matches!(self.status, ReviewStatus::Approved(_))
    }

    /// Subject and grade of a question payload, if this is a question.
    pub fn question_filter_keys(&self) -> Option<(&str, &str)> {
        match &self.payload {
            ReviewPayload::Question { subject, grade, .. } => Some((subject, grade)),
            _ => None,
        }
    }

    // Status mutators are crate-private: the approval engine is the only
    // writer of review status, and it only calls these while holding the
    // store's exclusive entry guard with a verified `Pending` state.

    pub(crate) fn mark_approved(&mut self, reviewer: AccountId, decided_at: DateTime<Utc>) {
        debug_assert!(self.is_pending(), "approving a non-pending reviewable");
        self.status = ReviewStatus::Approved(Approval::Decision {
            reviewer,
            decided_at,
        });
    }

    pub(crate) fn mark_rejected(&mut self, reviewer: AccountId, decided_at: DateTime<Utc>) {
        debug_assert!(self.is_pending(), "rejecting a non-pending reviewable");
        self.status = ReviewStatus::Rejected {
            reviewer,
            decided_at,
        };
    }

    pub(crate) fn mark_self_approved(&mut self, decided_at: DateTime<Utc>) {
        debug_assert!(self.is_pending(), "self-approving a non-pending reviewable");
        self.status = ReviewStatus::Approved(Approval::SelfApproved { decided_at });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: u32) -> Reviewable {
        Reviewable::new(
            ReviewableId(id),
            AccountId(1),
            AccountId(1),
            Reward::new(10, 50),
            ReviewPayload::Question {
                subject: "Math".into(),
                grade: "Grade9".into(),
                text: "2 + 2 = ?".into(),
            },
        )
    }

    #[test]
    fn new_reviewable_is_pending() {
        let r = question(1);
        assert!(r.is_pending());
        assert!(!r.is_approved());
        assert_eq!(r.kind(), ReviewKind::Question);
    }

    #[test]
    fn approval_records_reviewer() {
        let mut r = question(1);
        let now = Utc::now();
        r.mark_approved(AccountId(9), now);
        assert_eq!(
            r.status(),
            ReviewStatus::Approved(Approval::Decision {
                reviewer: AccountId(9),
                decided_at: now
            })
        );
    }

    #[test]
    fn self_approval_carries_no_reviewer() {
        let mut r = question(1);
        let now = Utc::now();
        r.mark_self_approved(now);
        assert_eq!(
            r.status(),
            ReviewStatus::Approved(Approval::SelfApproved { decided_at: now })
        );
    }

    #[test]
    fn rejection_records_reviewer() {
        let mut r = question(1);
        let now = Utc::now();
        r.mark_rejected(AccountId(9), now);
        assert_eq!(
            r.status(),
            ReviewStatus::Rejected {
                reviewer: AccountId(9),
                decided_at: now
            }
        );
    }

    #[test]
    fn question_filter_keys_only_for_questions() {
        let q = question(1);
        assert_eq!(q.question_filter_keys(), Some(("Math", "Grade9")));

        let b = Reviewable::new(
            ReviewableId(2),
            AccountId(1),
            AccountId(2),
            Reward::ZERO,
            ReviewPayload::BehaviorRecord {
                sign: BehaviorSign::Positive,
                note: "helped a classmate".into(),
            },
        );
        assert_eq!(b.question_filter_keys(), None);
    }

    #[test]
    fn reward_validity() {
        assert!(Reward::new(0, 0).is_valid());
        assert!(Reward::new(10, 20).is_valid());
        assert!(!Reward::new(-1, 0).is_valid());
        assert!(!Reward::new(0, -1).is_valid());
    }
}
