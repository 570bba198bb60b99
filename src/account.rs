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

//! Account balances and the leveling rule.
//!
//! An [`Account`] holds a currency balance and an experience balance. Level is
//! never stored; it is derived from experience through a [`LevelCurve`] on
//! every read, so it can never drift out of sync with experience.
//!
//! # Example
//!
//! ```
//! use classpoints_rs::{Account, AccountId, LevelCurve};
//!
//! let account = Account::new(AccountId(1), LevelCurve::default());
//! assert_eq!(account.currency(), 0);
//! assert_eq!(account.level(), 1);
//! ```

use crate::base::AccountId;
use crate::error::EngineError;
use parking_lot::Mutex;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Pure leveling rule: `level = 1 + experience / threshold`.
///
/// The level is a derived value and must be recomputed from experience on
/// every read; storing it separately would allow drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelCurve {
    threshold: i64,
}

impl LevelCurve {
    /// Experience required per level under the default curve.
    pub const DEFAULT_THRESHOLD: i64 = 1000;

    /// Creates a curve with a custom experience-per-level threshold.
    ///
    /// Thresholds below 1 are clamped to 1.
    pub fn new(threshold: i64) -> Self {
        Self {
            threshold: threshold.max(1),
        }
    }

    /// Level for a given experience balance. Monotonic in experience.
    pub fn level_for(&self, experience: i64) -> i64 {
        1 + experience.max(0) / self.threshold
    }
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

/// Result of a successful credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditOutcome {
    /// Currency balance after the credit.
    pub currency: i64,
    /// Experience balance after the credit.
    pub experience: i64,
    /// Level after the credit.
    pub level: i64,
    /// Whether the credit pushed the account over a level boundary.
    pub leveled_up: bool,
}

#[derive(Debug)]
struct AccountData {
    account_id: AccountId,
    currency: i64,
    experience: i64,
    curve: LevelCurve,
}

impl AccountData {
    fn new(account_id: AccountId, curve: LevelCurve) -> Self {
        Self {
            account_id,
            currency: 0,
            experience: 0,
            curve,
        }
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.currency >= 0,
            "Invariant violated: currency balance went negative: {}",
            self.currency
        );
        debug_assert!(
            self.experience >= 0,
            "Invariant violated: experience balance went negative: {}",
            self.experience
        );
    }

    fn level(&self) -> i64 {
        self.curve.level_for(self.experience)
    }

    /// Increases both balances and recomputes the level.
    ///
    /// Both additions are overflow-checked before either balance is
    /// written, so a failed credit mutates nothing.
    fn credit(&mut self, currency: i64, experience: i64) -> Result<CreditOutcome, EngineError> {
        if currency < 0 || experience < 0 {
            return Err(EngineError::InvalidAmount);
        }
        let currency_after = self
            .currency
            .checked_add(currency)
            .ok_or(EngineError::BalanceOverflow)?;
        let experience_after = self
            .experience
            .checked_add(experience)
            .ok_or(EngineError::BalanceOverflow)?;
        let level_before = self.level();
        self.currency = currency_after;
        self.experience = experience_after;
        self.assert_invariants();
        let level = self.level();
        Ok(CreditOutcome {
            currency: self.currency,
            experience: self.experience,
            level,
            leveled_up: level > level_before,
        })
    }

    /// Decreases the currency balance, clamped at zero.
    ///
    /// Currency is a gamified reward, not a financial instrument, so a
    /// deduction larger than the balance empties the account rather than
    /// failing. Experience is never debited.
    fn debit(&mut self, currency: i64) -> Result<i64, EngineError> {
        if currency < 0 {
            return Err(EngineError::InvalidAmount);
        }
        self.currency = (self.currency - currency).max(0);
        self.assert_invariants();
        Ok(self.currency)
    }
}

/// Ledger account for a student or teacher.
#[derive(Debug)]
pub struct Account {
    inner: Mutex<AccountData>,
}

impl Account {
    pub fn new(account_id: AccountId, curve: LevelCurve) -> Self {
        Self {
            inner: Mutex::new(AccountData::new(account_id, curve)),
        }
    }

    pub fn currency(&self) -> i64 {
        self.inner.lock().currency
    }

    pub fn experience(&self) -> i64 {
        self.inner.lock().experience
    }

    /// Derived level, recomputed from experience on every call.
    pub fn level(&self) -> i64 {
        self.inner.lock().level()
    }

    /// Credits both balances atomically.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidAmount`] if either amount is negative,
    /// or [`EngineError::BalanceOverflow`] if a balance would overflow;
    /// nothing is mutated in either case.
    pub fn credit(&self, currency: i64, experience: i64) -> Result<CreditOutcome, EngineError> {
        self.inner.lock().credit(currency, experience)
    }

    /// Debits the currency balance, clamped at zero, and returns the
    /// remaining balance.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidAmount`] if the amount is negative.
    pub fn debit(&self, currency: i64) -> Result<i64, EngineError> {
        self.inner.lock().debit(currency)
    }
}

impl Serialize for Account {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self.inner.lock();
        let mut state = serializer.serialize_struct("Account", 4)?;
        state.serialize_field("account", &data.account_id)?;
        state.serialize_field("currency", &data.currency)?;
        state.serialize_field("experience", &data.experience)?;
        state.serialize_field("level", &data.level())?;
        state.end()
    }
}
