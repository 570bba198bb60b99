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

//! Ledger and account public API integration tests.

use classpoints_rs::{AccountId, EngineError, Ledger, LevelCurve};

// === Basic Ledger Tests ===

#[test]
fn new_account_has_zero_balances_and_level_one() {
    let ledger = Ledger::new();
    ledger.open_account(AccountId(1)).unwrap();

    let account = ledger.get_account(&AccountId(1)).unwrap();
    assert_eq!(account.currency(), 0);
    assert_eq!(account.experience(), 0);
    assert_eq!(account.level(), 1);
}

#[test]
fn credit_increases_both_balances() {
    let ledger = Ledger::new();
    ledger.open_account(AccountId(1)).unwrap();

    let outcome = ledger.credit(AccountId(1), 50, 200).unwrap();
    assert_eq!(outcome.currency, 50);
    assert_eq!(outcome.experience, 200);
    assert!(!outcome.leveled_up);
}

#[test]
fn multiple_credits_accumulate() {
    let ledger = Ledger::new();
    ledger.open_account(AccountId(1)).unwrap();

    ledger.credit(AccountId(1), 100, 100).unwrap();
    ledger.credit(AccountId(1), 50, 50).unwrap();

    let account = ledger.get_account(&AccountId(1)).unwrap();
    assert_eq!(account.currency(), 150);
    assert_eq!(account.experience(), 150);
}

#[test]
fn multiple_accounts_are_independent() {
    let ledger = Ledger::new();
    ledger.open_account(AccountId(1)).unwrap();
    ledger.open_account(AccountId(2)).unwrap();

    ledger.credit(AccountId(1), 100, 0).unwrap();
    ledger.credit(AccountId(2), 200, 0).unwrap();

    assert_eq!(ledger.get_account(&AccountId(1)).unwrap().currency(), 100);
    assert_eq!(ledger.get_account(&AccountId(2)).unwrap().currency(), 200);
}

#[test]
fn negative_credit_rejected_before_mutation() {
    let ledger = Ledger::new();
    ledger.open_account(AccountId(1)).unwrap();
    ledger.credit(AccountId(1), 10, 10).unwrap();

    assert_eq!(
        ledger.credit(AccountId(1), -5, 0),
        Err(EngineError::InvalidAmount)
    );
    assert_eq!(
        ledger.credit(AccountId(1), 0, -5),
        Err(EngineError::InvalidAmount)
    );

    let account = ledger.get_account(&AccountId(1)).unwrap();
    assert_eq!(account.currency(), 10);
    assert_eq!(account.experience(), 10);
}

// === Clamped Debit ===

/// Debiting more currency than an account holds empties it to exactly zero.
///
/// Scenario: account starts at currency=5; `debit(account, 20)` yields
/// currency=0, not -15. Currency is a best-effort gamified deduction, not a
/// balance that may go negative.
#[test]
fn debit_clamps_at_zero() {
    let ledger = Ledger::new();
    ledger.open_account(AccountId(1)).unwrap();
    ledger.credit(AccountId(1), 5, 0).unwrap();

    let remaining = ledger.debit(AccountId(1), 20).unwrap();
    assert_eq!(remaining, 0);
    assert_eq!(ledger.get_account(&AccountId(1)).unwrap().currency(), 0);
}

#[test]
fn exact_debit_empties_the_account() {
    let ledger = Ledger::new();
    ledger.open_account(AccountId(1)).unwrap();
    ledger.credit(AccountId(1), 20, 0).unwrap();

    assert_eq!(ledger.debit(AccountId(1), 20), Ok(0));
}

#[test]
fn partial_debit_leaves_remainder() {
    let ledger = Ledger::new();
    ledger.open_account(AccountId(1)).unwrap();
    ledger.credit(AccountId(1), 100, 0).unwrap();

    assert_eq!(ledger.debit(AccountId(1), 30), Ok(70));
}

#[test]
fn debit_never_touches_experience() {
    let ledger = Ledger::new();
    ledger.open_account(AccountId(1)).unwrap();
    ledger.credit(AccountId(1), 50, 3000).unwrap();

    ledger.debit(AccountId(1), 50).unwrap();

    let account = ledger.get_account(&AccountId(1)).unwrap();
    assert_eq!(account.experience(), 3000);
    assert_eq!(account.level(), 4);
}

// === Leveling ===

#[test]
fn level_is_derived_from_experience() {
    let ledger = Ledger::new();
    ledger.open_account(AccountId(1)).unwrap();

    ledger.credit(AccountId(1), 0, 999).unwrap();
    assert_eq!(ledger.get_account(&AccountId(1)).unwrap().level(), 1);

    ledger.credit(AccountId(1), 0, 1).unwrap();
    assert_eq!(ledger.get_account(&AccountId(1)).unwrap().level(), 2);
}

#[test]
fn level_up_reported_exactly_at_boundary() {
    let ledger = Ledger::new();
    ledger.open_account(AccountId(1)).unwrap();

    let outcome = ledger.credit(AccountId(1), 0, 999).unwrap();
    assert!(!outcome.leveled_up);

    let outcome = ledger.credit(AccountId(1), 0, 1).unwrap();
    assert!(outcome.leveled_up);
    assert_eq!(outcome.level, 2);

    let outcome = ledger.credit(AccountId(1), 0, 500).unwrap();
    assert!(!outcome.leveled_up);
}

#[test]
fn multi_level_jump_in_one_credit() {
    let ledger = Ledger::new();
    ledger.open_account(AccountId(1)).unwrap();

    let outcome = ledger.credit(AccountId(1), 0, 3500).unwrap();
    assert!(outcome.leveled_up);
    assert_eq!(outcome.level, 4);
}

#[test]
fn custom_curve_changes_thresholds() {
    let ledger = Ledger::with_curve(LevelCurve::new(250));
    ledger.open_account(AccountId(1)).unwrap();

    let outcome = ledger.credit(AccountId(1), 0, 500).unwrap();
    assert_eq!(outcome.level, 3);
}

// === Error Paths ===

#[test]
fn operations_on_unknown_account_fail() {
    let ledger = Ledger::new();
    assert_eq!(
        ledger.credit(AccountId(1), 10, 10),
        Err(EngineError::AccountNotFound)
    );
    assert_eq!(ledger.debit(AccountId(1), 10), Err(EngineError::AccountNotFound));
    assert!(ledger.get_account(&AccountId(1)).is_none());
}

#[test]
fn duplicate_account_open_fails() {
    let ledger = Ledger::new();
    ledger.open_account(AccountId(1)).unwrap();
    assert_eq!(
        ledger.open_account(AccountId(1)),
        Err(EngineError::DuplicateAccount)
    );
}

#[test]
fn accounts_iterator_sees_all_accounts() {
    let ledger = Ledger::new();
    for id in 1..=5 {
        ledger.open_account(AccountId(id)).unwrap();
    }
    assert_eq!(ledger.accounts().count(), 5);
}
