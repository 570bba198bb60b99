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

//! The reward ledger: account balances indexed by account ID.
//!
//! The [`Ledger`] exclusively owns all [`Account`] balances. Concurrent
//! operations on different accounts proceed in parallel via [`DashMap`];
//! operations on the same account serialize on the account's inner mutex, so
//! lost updates cannot occur.

use crate::account::{Account, CreditOutcome, LevelCurve};
use crate::base::AccountId;
use crate::error::EngineError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Owns all accounts and applies credit/debit operations.
pub struct Ledger {
    /// Accounts indexed by account ID.
    accounts: DashMap<AccountId, Account>,
    /// Leveling rule applied to every account opened on this ledger.
    curve: LevelCurve,
}

impl Ledger {
    /// Creates an empty ledger with the default leveling curve.
    pub fn new() -> Self {
        Self::with_curve(LevelCurve::default())
    }

    /// Creates an empty ledger with a custom leveling curve.
    pub fn with_curve(curve: LevelCurve) -> Self {
        Ledger {
            accounts: DashMap::new(),
            curve,
        }
    }

    /// Opens a new account with zero balances.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateAccount`] if the ID is already in use.
    pub fn open_account(&self, account_id: AccountId) -> Result<(), EngineError> {
        // Entry API for atomic check-and-insert; two concurrent opens of the
        // same ID must not both succeed.
        match self.accounts.entry(account_id) {
            Entry::Occupied(_) => Err(EngineError::DuplicateAccount),
            Entry::Vacant(entry) => {
                entry.insert(Account::new(account_id, self.curve));
                Ok(())
            }
        }
    }

    /// Credits currency and experience to an account and recomputes its level.
    ///
    /// # Errors
    ///
    /// - [`EngineError::AccountNotFound`] - No account with the given ID.
    /// - [`EngineError::InvalidAmount`] - Either amount is negative.
    /// - [`EngineError::BalanceOverflow`] - A balance would overflow.
    pub fn credit(
        &self,
        account_id: AccountId,
        currency: i64,
        experience: i64,
    ) -> Result<CreditOutcome, EngineError> {
        let account = self
            .accounts
            .get(&account_id)
            .ok_or(EngineError::AccountNotFound)?;
        account.credit(currency, experience)
    }

    /// Debits currency from an account, clamped at zero, and returns the
    /// remaining balance. Experience is never debited.
    ///
    /// # Errors
    ///
    /// - [`EngineError::AccountNotFound`] - No account with the given ID.
    /// - [`EngineError::InvalidAmount`] - The amount is negative.
    pub fn debit(&self, account_id: AccountId, currency: i64) -> Result<i64, EngineError> {
        let account = self
            .accounts
            .get(&account_id)
            .ok_or(EngineError::AccountNotFound)?;
        account.debit(currency)
    }

    /// Retrieves an account by ID.
    ///
    /// Returns `None` if no account exists for the given ID.
    pub fn get_account(
        &self,
        account_id: &AccountId,
    ) -> Option<dashmap::mapref::one::Ref<'_, AccountId, Account>> {
        self.accounts.get(account_id)
    }

    /// Returns an iterator over all accounts.
    ///
    /// Useful for generating output reports of account states.
    pub fn accounts(
        &self,
    ) -> impl Iterator<Item = dashmap::mapref::multiple::RefMulti<'_, AccountId, Account>> {
        self.accounts.iter()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
