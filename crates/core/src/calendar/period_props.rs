//! Property-based tests for period resolution.
//!
//! - Walking `next_after` from the first period visits every period once
//! - Each step strictly increases the calendar position

use bursary_shared::types::{AcademicSessionId, TermId};
use proptest::prelude::*;

use super::error::CalendarError;
use super::period::{AcademicCalendar, SessionSlot, TermSlot};

/// Strategy for a calendar: up to 6 sessions with 0..4 terms each, ordinals
/// shuffled with gaps.
fn calendar_strategy() -> impl Strategy<Value = AcademicCalendar> {
    prop::collection::vec((0usize..4, 1i32..5), 1..6).prop_map(|shape| {
        let mut ordinal = 0;
        let sessions = shape
            .into_iter()
            .rev()
            .map(|(term_count, gap)| {
                ordinal += gap;
                let mut term_ordinal = 0;
                SessionSlot {
                    session_id: AcademicSessionId::new(),
                    ordinal,
                    terms: (0..term_count)
                        .map(|_| {
                            term_ordinal += gap;
                            TermSlot {
                                term_id: TermId::new(),
                                ordinal: term_ordinal,
                            }
                        })
                        .rev()
                        .collect(),
                }
            })
            .collect();
        AcademicCalendar::new(sessions)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_successor_walk_is_strictly_increasing(calendar in calendar_strategy()) {
        let total = calendar.periods().count();
        prop_assume!(total > 0);

        let mut current = calendar.first_period().unwrap();
        let mut visited = 1;
        loop {
            match calendar.next_after(current) {
                Ok(next) => {
                    let before = calendar.position(current).unwrap();
                    let after = calendar.position(next).unwrap();
                    prop_assert!(after > before);
                    current = next;
                    visited += 1;
                }
                Err(err) => {
                    prop_assert_eq!(err, CalendarError::NoFurtherPeriod);
                    break;
                }
            }
        }

        prop_assert_eq!(visited, total);
    }

    #[test]
    fn prop_successor_matches_ordered_listing(calendar in calendar_strategy()) {
        let periods: Vec<_> = calendar.periods().collect();
        for pair in periods.windows(2) {
            prop_assert_eq!(calendar.next_after(pair[0]).unwrap(), pair[1]);
        }
    }
}
