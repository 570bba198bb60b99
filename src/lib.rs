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

//! # ClassPoints
//!
//! This library provides the approval and rewards engine behind a gamified
//! school-management application: the review workflow that turns submitted
//! work (quest submissions, behavior observations, question-bank
//! contributions) into accepted or rejected outcomes and atomically credits
//! a currency/experience ledger on acceptance, plus the two supporting
//! algorithms sharing its data model: a schedule conflict detector and a
//! competition question sampler.
//!
//! ## Core Components
//!
//! - [`ApprovalEngine`]: Review state machine with at-most-once rewards
//! - [`Ledger`] / [`Account`]: Currency and experience balances, derived levels
//! - [`ReviewableStore`]: Ordered, deduplicated collection of reviewables
//! - [`check_conflict`]: Timetable double-booking pre-check
//! - [`CompetitionSampler`]: Duplicate-free draws from the approved pool
//! - [`EngineError`]: Error kinds for all engine operations
//!
//! ## Example
//!
//! ```
//! use classpoints_rs::{
//!     AccountId, ApprovalEngine, Decision, ReviewPayload, Reviewable, ReviewableId, Reward,
//! };
//!
//! let engine = ApprovalEngine::new();
//! engine.ledger().open_account(AccountId(1)).unwrap();
//! engine.ledger().open_account(AccountId(2)).unwrap();
//!
//! // A student submits a completed quest.
//! engine
//!     .submit(Reviewable::new(
//!         ReviewableId(1),
//!         AccountId(1),
//!         AccountId(1),
//!         Reward::new(10, 100),
//!         ReviewPayload::QuestSubmission {
//!             quest_id: 7,
//!             note: "chapter 3 exercises".into(),
//!         },
//!     ))
//!     .unwrap();
//!
//! // A teacher approves it; the reward is credited exactly once.
//! engine
//!     .decide(ReviewableId(1), Decision::Approve, AccountId(2))
//!     .unwrap();
//!
//! let account = engine.ledger().get_account(&AccountId(1)).unwrap();
//! assert_eq!(account.currency(), 10);
//! assert_eq!(account.experience(), 100);
//! ```
//!
//! ## Thread Safety
//!
//! All engine operations take `&self` and are safe to call concurrently.
//! Racing decisions on the same reviewable resolve to exactly one ledger
//! mutation; operations on the same account serialize on a per-account lock.

pub mod account;
mod base;
mod engine;
pub mod error;
mod ledger;
mod reviewable;
pub mod sampler;
pub mod schedule;
mod store;

pub use account::{Account, CreditOutcome, LevelCurve};
pub use base::{AccountId, ClassId, CompetitionId, ReviewableId, ScheduleItemId};
pub use engine::{ApprovalEngine, AuthoredQuestion, Decision, LedgerEffect, ReviewOutcome};
pub use error::EngineError;
pub use ledger::Ledger;
pub use reviewable::{
    Approval, BehaviorSign, ReviewKind, ReviewPayload, ReviewStatus, Reviewable, Reward,
};
pub use sampler::{Competition, CompetitionSampler, ParticipantScore};
pub use schedule::{DeliveryMode, ScheduleItem, Weekday, check_conflict};
pub use store::{ReviewFilter, ReviewableStore};
