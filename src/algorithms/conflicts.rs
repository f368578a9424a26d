//! Time-conflict detection over a selection of concerts.

use serde::{Deserialize, Serialize};

use crate::models::{ConcertId, ConcertRecord};

/// An overlapping pair in a selection. Unordered: `first < second` by id, so
/// each pair is reported exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Conflict {
    pub first: ConcertId,
    pub second: ConcertId,
}

impl Conflict {
    pub fn between(a: ConcertId, b: ConcertId) -> Self {
        if a < b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }
}

/// Find every overlapping pair in the selection.
///
/// Two concerts conflict iff they fall on the same date and their half-open
/// `[start, end)` intervals overlap; a concert ending exactly when another
/// starts is not a conflict. The end is the printed range end when there is
/// one, otherwise start plus `assumed_minutes`. Concerts without a printed
/// clock time never conflict. The result is advisory; the selection is left
/// untouched.
pub fn find_conflicts(records: &[&ConcertRecord], assumed_minutes: i64) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for (i, a) in records.iter().enumerate() {
        for b in &records[i + 1..] {
            if a.id == b.id || a.date != b.date {
                continue;
            }
            let (Some(a_start), Some(b_start)) = (a.start_datetime(), b.start_datetime())
            else {
                continue;
            };
            let (Some(a_end), Some(b_end)) = (
                a.end_datetime(assumed_minutes),
                b.end_datetime(assumed_minutes),
            ) else {
                continue;
            };
            if a_start < b_end && b_start < a_end {
                let conflict = Conflict::between(a.id, b.id);
                if !conflicts.contains(&conflict) {
                    conflicts.push(conflict);
                }
            }
        }
    }
    conflicts
}
