//! Fuzz target: planner operation sequences
//!
//! Interprets the input as a stream of add/delete/lookup operations and
//! checks after each step that every bucket is strictly ascending and
//! that lookups only ever return stored times.
//!
//! cargo fuzz run fuzz_planner

#![no_main]

use libfuzzer_sys::fuzz_target;
use petfeeder::planner::{Planner, PlannerEntry, Weekday, MAX_ENTRIES_PER_BUCKET};

fuzz_target!(|data: &[u8]| {
    let mut planner = if data.first().is_some_and(|b| b & 1 == 1) {
        Planner::daily()
    } else {
        Planner::weekly()
    };

    for op in data.chunks_exact(4) {
        let Some(day) = Weekday::from_index(op[0] % 7) else {
            continue;
        };
        // Deliberately allows times past midnight to exercise rejection.
        let time = u32::from(u16::from_le_bytes([op[2], op[3]])) * 2;
        let entry = PlannerEntry::new(day, time);

        match op[1] % 4 {
            0 => {
                let was_set = planner.is_entry_set(entry);
                let added = planner.add_entry(entry);
                assert!(!(was_set && added), "duplicate accepted");
                if added {
                    assert!(planner.is_entry_set(entry));
                }
            }
            1 => {
                let was_set = planner.is_entry_set(entry);
                assert_eq!(planner.delete_entry(entry), was_set);
                assert!(!planner.is_entry_set(entry));
            }
            2 => {
                if let Some(found) = planner.get_next_entry(entry) {
                    assert!(planner.is_entry_set(found));
                }
            }
            _ => planner.delete_all_entries(),
        }

        for day in Weekday::ALL {
            let bucket = planner.entries(day);
            assert!(bucket.len() <= MAX_ENTRIES_PER_BUCKET);
            assert!(bucket.windows(2).all(|w| w[0] < w[1]));
        }
    }
});
