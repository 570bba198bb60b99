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

//! Error types for the approval and rewards engine.

use crate::base::ClassId;
use thiserror::Error;

/// Engine operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Credit or debit amount is negative
    #[error("invalid amount (must be non-negative)")]
    InvalidAmount,

    /// Crediting the amount would overflow a balance
    #[error("balance overflow")]
    BalanceOverflow,

    /// A decision was attempted on a non-pending reviewable.
    ///
    /// Callers should treat this as a benign race and re-fetch the current
    /// state rather than surfacing a hard failure.
    #[error("reviewable has already been reviewed")]
    AlreadyReviewed,

    /// Referenced reviewable does not exist
    #[error("reviewable not found")]
    ReviewableNotFound,

    /// Referenced account does not exist
    #[error("account not found")]
    AccountNotFound,

    /// Duplicate reviewable ID
    #[error("duplicate reviewable ID")]
    DuplicateReviewable,

    /// Duplicate account ID
    #[error("duplicate account ID")]
    DuplicateAccount,

    /// The candidate slot's teacher already teaches at this day and time
    #[error("teacher is already booked at this time (class {class})")]
    TeacherDoubleBooked {
        /// Class taught in the conflicting slot, for the user-facing message.
        class: ClassId,
    },

    /// The candidate slot's class already has a lesson at this day and time
    #[error("class {class} already has a lesson at this time")]
    ClassDoubleBooked {
        /// The double-booked class.
        class: ClassId,
    },

    /// The approved question pool is smaller than the requested sample
    #[error("insufficient question pool: {available} available, {requested} requested")]
    InsufficientPool {
        /// Approved questions matching the filter at call time.
        available: usize,
        /// Questions the competition requires.
        requested: usize,
    },

    /// Referenced competition does not exist
    #[error("competition not found")]
    CompetitionNotFound,

    /// Duplicate competition ID
    #[error("duplicate competition ID")]
    DuplicateCompetition,
}
