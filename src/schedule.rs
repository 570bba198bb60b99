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

//! Timetable slots and the schedule conflict detector.
//!
//! The detector is an advisory pre-check producing precise error messages;
//! the storage layer backing the timetable is expected to enforce uniqueness
//! on (day, time, teacher) and (day, time, class) as the final backstop.
//!
//! It must run on every create and every edit (an edit re-validates against
//! all slots except itself); it is not run on delete.

use crate::base::{AccountId, ClassId, ScheduleItemId};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Day of the timetable grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// How a lesson is delivered.
///
/// The meeting locator is required exactly when the lesson is remote, so it
/// lives inside the `Remote` variant rather than as an optional field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMode {
    InPerson,
    Remote { meeting_url: String },
}

/// A single timetabled slot.
///
/// `time` is an opaque slot key (e.g. `"08:00"`); the detector compares keys
/// for equality and never parses or orders them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub id: ScheduleItemId,
    pub day: Weekday,
    pub time: String,
    pub duration_minutes: u32,
    pub class: ClassId,
    pub teacher: Option<AccountId>,
    pub mode: DeliveryMode,
}

impl ScheduleItem {
    fn occupies_same_cell(&self, other: &ScheduleItem) -> bool {
        self.day == other.day && self.time == other.time
    }
}

/// Checks a candidate slot against the existing timetable.
///
/// `exclude` is the candidate's own ID when re-validating an edit, so a slot
/// never conflicts with itself.
///
/// Teacher conflicts are reported before class conflicts: a teacher cannot
/// split into two rooms, so that axis is the operationally severe one and
/// wins the tie-break when both would match.
///
/// # Errors
///
/// - [`EngineError::TeacherDoubleBooked`] - An existing slot at the same
///   (day, time) has the same teacher. Carries the conflicting slot's class.
/// - [`EngineError::ClassDoubleBooked`] - An existing slot at the same
///   (day, time) has the same class.
pub fn check_conflict(
    candidate: &ScheduleItem,
    existing: &[ScheduleItem],
    exclude: Option<ScheduleItemId>,
) -> Result<(), EngineError> {
    let others = existing
        .iter()
        .filter(|slot| Some(slot.id) != exclude)
        .filter(|slot| slot.occupies_same_cell(candidate));

    // Two passes so the teacher axis wins even when different slots conflict
    // on different axes.
    for slot in others.clone() {
        if let (Some(existing_teacher), Some(candidate_teacher)) = (slot.teacher, candidate.teacher)
        {
            if existing_teacher == candidate_teacher {
                return Err(EngineError::TeacherDoubleBooked { class: slot.class });
            }
        }
    }
    for slot in others {
        if slot.class == candidate.class {
            return Err(EngineError::ClassDoubleBooked { class: slot.class });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(id: u32, day: Weekday, time: &str, class: u32, teacher: Option<u32>) -> ScheduleItem {
        ScheduleItem {
            id: ScheduleItemId(id),
            day,
            time: time.to_string(),
            duration_minutes: 45,
            class: ClassId(class),
            teacher: teacher.map(AccountId),
            mode: DeliveryMode::InPerson,
        }
    }

    #[test]
    fn empty_timetable_has_no_conflict() {
        let candidate = slot(1, Weekday::Monday, "08:00", 1, Some(10));
        assert_eq!(check_conflict(&candidate, &[], None), Ok(()));
    }

    #[test]
    fn same_teacher_same_cell_conflicts() {
        let existing = vec![slot(1, Weekday::Monday, "08:00", 1, Some(10))];
        let candidate = slot(2, Weekday::Monday, "08:00", 2, Some(10));
        assert_eq!(
            check_conflict(&candidate, &existing, None),
            Err(EngineError::TeacherDoubleBooked { class: ClassId(1) })
        );
    }

    #[test]
    fn same_class_same_cell_conflicts() {
        let existing = vec![slot(1, Weekday::Monday, "08:00", 1, Some(10))];
        let candidate = slot(2, Weekday::Monday, "08:00", 1, Some(11));
        assert_eq!(
            check_conflict(&candidate, &existing, None),
            Err(EngineError::ClassDoubleBooked { class: ClassId(1) })
        );
    }

    #[test]
    fn teacher_conflict_wins_over_class_conflict() {
        // Same cell, same teacher AND same class: the teacher axis reports.
        let existing = vec![slot(1, Weekday::Monday, "08:00", 1, Some(10))];
        let candidate = slot(2, Weekday::Monday, "08:00", 1, Some(10));
        assert_eq!(
            check_conflict(&candidate, &existing, None),
            Err(EngineError::TeacherDoubleBooked { class: ClassId(1) })
        );
    }

    #[test]
    fn teacher_conflict_wins_across_different_slots() {
        // The class conflict sits earlier in the scan than the teacher
        // conflict; the teacher axis must still be the one reported.
        let existing = vec![
            slot(1, Weekday::Monday, "08:00", 1, Some(11)),
            slot(2, Weekday::Monday, "08:00", 2, Some(10)),
        ];
        let candidate = slot(3, Weekday::Monday, "08:00", 1, Some(10));
        assert_eq!(
            check_conflict(&candidate, &existing, None),
            Err(EngineError::TeacherDoubleBooked { class: ClassId(2) })
        );
    }

    #[test]
    fn different_cell_never_conflicts() {
        let existing = vec![
            slot(1, Weekday::Monday, "08:00", 1, Some(10)),
            slot(2, Weekday::Tuesday, "08:00", 1, Some(10)),
        ];
        let candidate = slot(3, Weekday::Monday, "09:00", 1, Some(10));
        assert_eq!(check_conflict(&candidate, &existing, None), Ok(()));
    }

    #[test]
    fn unset_teacher_never_conflicts_on_teacher_axis() {
        let existing = vec![slot(1, Weekday::Monday, "08:00", 1, None)];
        let candidate = slot(2, Weekday::Monday, "08:00", 2, None);
        assert_eq!(check_conflict(&candidate, &existing, None), Ok(()));
    }

    #[test]
    fn edit_excludes_itself() {
        let existing = vec![slot(1, Weekday::Monday, "08:00", 1, Some(10))];
        // Re-validating slot 1 itself, unchanged day/time.
        let candidate = slot(1, Weekday::Monday, "08:00", 1, Some(10));
        assert_eq!(
            check_conflict(&candidate, &existing, Some(ScheduleItemId(1))),
            Ok(())
        );
    }

    #[test]
    fn edit_still_conflicts_with_other_slots() {
        let existing = vec![
            slot(1, Weekday::Monday, "08:00", 1, Some(10)),
            slot(2, Weekday::Monday, "09:00", 2, Some(10)),
        ];
        // Moving slot 1 onto slot 2's cell.
        let candidate = slot(1, Weekday::Monday, "09:00", 1, Some(10));
        assert_eq!(
            check_conflict(&candidate, &existing, Some(ScheduleItemId(1))),
            Err(EngineError::TeacherDoubleBooked { class: ClassId(2) })
        );
    }

    #[test]
    fn conflict_is_insertion_order_independent() {
        let a = slot(1, Weekday::Friday, "13:00", 1, Some(20));
        let b = slot(2, Weekday::Friday, "13:00", 2, Some(20));

        assert_eq!(
            check_conflict(&b, &[a.clone()], None),
            Err(EngineError::TeacherDoubleBooked { class: ClassId(1) })
        );
        assert_eq!(
            check_conflict(&a, &[b], None),
            Err(EngineError::TeacherDoubleBooked { class: ClassId(2) })
        );
    }

    #[test]
    fn remote_mode_carries_meeting_url() {
        let mut candidate = slot(1, Weekday::Monday, "08:00", 1, Some(10));
        candidate.mode = DeliveryMode::Remote {
            meeting_url: "https://meet.example/abc".into(),
        };
        assert_eq!(check_conflict(&candidate, &[], None), Ok(()));
    }
}
