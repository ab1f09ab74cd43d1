//! Feed record → planner integration.
//!
//! Edits go through `FeederService::update_feed`; the planner and the
//! next-feeding arithmetic are checked against the resulting schedule.

use crate::mock_storage::{MockStorage, RecordingSink};
use petfeeder::app::events::{AppEvent, UpcomingFeed};
use petfeeder::app::service::FeederService;
use petfeeder::config::SystemConfig;
use petfeeder::planner::{PlannerEntry, PlannerMode, Weekday};
use petfeeder::record::{FeedFeatures, FeedSlot};

fn booted(config: &SystemConfig) -> (FeederService, MockStorage, RecordingSink) {
    let mut store = MockStorage::new();
    let mut sink = RecordingSink::new();
    let mut feeder = FeederService::new(config).unwrap();
    feeder.boot(&mut store, &mut sink);
    store.clear_log();
    sink.events.clear();
    (feeder, store, sink)
}

fn at(day: Weekday, h: u8, m: u8) -> PlannerEntry {
    PlannerEntry::at(day, h, m, 0).unwrap()
}

/// Replace the slot table with three weekday-only feedings.
fn weekday_breakfast_lunch_dinner(
    feeder: &mut FeederService,
    store: &mut MockStorage,
    sink: &mut RecordingSink,
) {
    feeder
        .update_feed(store, sink, |feed| {
            for i in 0..8 {
                feed.clear_slot(i).unwrap();
            }
            feed.set_slot(0, FeedSlot::at(FeedSlot::WEEKDAYS, 8, 0).unwrap())
                .unwrap();
            feed.set_slot(1, FeedSlot::at(FeedSlot::WEEKDAYS, 12, 0).unwrap())
                .unwrap();
            feed.set_slot(2, FeedSlot::at(FeedSlot::WEEKDAYS, 18, 0).unwrap())
                .unwrap();
        })
        .unwrap();
}

// ── Rebuild ───────────────────────────────────────────────────

#[test]
fn editing_slots_rebuilds_planner_and_autosaves() {
    let (mut feeder, mut store, mut sink) = booted(&SystemConfig::default());

    weekday_breakfast_lunch_dinner(&mut feeder, &mut store, &mut sink);

    assert_eq!(feeder.planner().len(), 15);
    assert_eq!(
        feeder.planner().entries(Weekday::Wednesday),
        &[8 * 3600u32, 12 * 3600, 18 * 3600]
    );
    assert!(feeder.planner().entries(Weekday::Sunday).is_empty());
    assert!(sink.events.contains(&AppEvent::ScheduleChanged { entries: 15 }));
    assert_eq!(store.writes, vec!["feed"]);
    assert!(!feeder.has_unsaved_changes());
}

#[test]
fn edit_that_changes_nothing_is_silent() {
    let (mut feeder, mut store, mut sink) = booted(&SystemConfig::default());

    feeder
        .update_feed(&mut store, &mut sink, |feed| {
            let p = feed.portions();
            feed.set_portions(p);
        })
        .unwrap();

    assert!(sink.events.is_empty());
    assert!(store.writes.is_empty());
}

#[test]
fn without_autosave_edits_wait_for_persist() {
    let config = SystemConfig {
        autosave: false,
        ..SystemConfig::default()
    };
    let (mut feeder, mut store, mut sink) = booted(&config);

    feeder
        .update_feed(&mut store, &mut sink, |feed| feed.set_portions(3))
        .unwrap();
    assert!(store.writes.is_empty());
    assert!(feeder.has_unsaved_changes());

    assert_eq!(feeder.persist(&mut store, &mut sink).unwrap(), 1);
    assert_eq!(store.writes, vec!["feed"]);
}

#[test]
fn disabling_schedule_feature_empties_planner() {
    let (mut feeder, mut store, mut sink) = booted(&SystemConfig::default());
    assert_eq!(feeder.planner().len(), 14);

    feeder
        .update_feed(&mut store, &mut sink, |feed| {
            let f = feed.features().without(FeedFeatures::SCHEDULE);
            feed.set_features(f);
        })
        .unwrap();

    assert!(feeder.planner().is_empty());
    assert_eq!(feeder.next_feed_after(at(Weekday::Monday, 6, 0)), None);
    assert_eq!(sink.last(), Some(&AppEvent::RecordsPersisted(1)));
}

#[test]
fn daily_mode_collapses_weekday_masks() {
    let config = SystemConfig {
        planner_mode: PlannerMode::Daily,
        ..SystemConfig::default()
    };
    let (mut feeder, mut store, mut sink) = booted(&config);
    assert_eq!(feeder.planner().len(), 2);

    weekday_breakfast_lunch_dinner(&mut feeder, &mut store, &mut sink);

    assert_eq!(feeder.planner().len(), 3);
    // Weekend lookups share the single bucket.
    assert_eq!(
        feeder.next_feed_after(at(Weekday::Sunday, 13, 0)),
        Some(UpcomingFeed {
            entry: at(Weekday::Sunday, 18, 0),
            secs_until: 5 * 3600,
        })
    );
}

// ── Lookups ───────────────────────────────────────────────────

#[test]
fn controlling_entry_tracks_most_recent_feeding() {
    let (mut feeder, mut store, mut sink) = booted(&SystemConfig::default());
    weekday_breakfast_lunch_dinner(&mut feeder, &mut store, &mut sink);

    let day = Weekday::Tuesday;
    assert_eq!(feeder.controlling_entry(at(day, 10, 0)), Some(at(day, 8, 0)));
    assert_eq!(feeder.controlling_entry(at(day, 7, 0)), Some(at(day, 8, 0)));
    assert_eq!(feeder.controlling_entry(at(day, 19, 0)), Some(at(day, 18, 0)));
    assert_eq!(feeder.controlling_entry(at(Weekday::Saturday, 12, 0)), None);
}

#[test]
fn next_feed_rolls_over_weekend() {
    let (mut feeder, mut store, mut sink) = booted(&SystemConfig::default());
    weekday_breakfast_lunch_dinner(&mut feeder, &mut store, &mut sink);

    // Friday 19:00 → Monday 08:00 is 2 days 13 hours away.
    let next = feeder.next_feed_after(at(Weekday::Friday, 19, 0)).unwrap();
    assert_eq!(next.entry, at(Weekday::Monday, 8, 0));
    assert_eq!(next.secs_until, 2 * 86_400 + 13 * 3600);

    // Exactly on a slot looks past it.
    let next = feeder.next_feed_after(at(Weekday::Monday, 8, 0)).unwrap();
    assert_eq!(next.entry, at(Weekday::Monday, 12, 0));
}

#[test]
fn single_weekly_slot_wraps_a_full_week() {
    let (mut feeder, mut store, mut sink) = booted(&SystemConfig::default());
    feeder
        .update_feed(&mut store, &mut sink, |feed| {
            for i in 0..8 {
                feed.clear_slot(i).unwrap();
            }
            let wed = Weekday::Wednesday.bit();
            feed.set_slot(0, FeedSlot::at(wed, 9, 0).unwrap()).unwrap();
        })
        .unwrap();

    let next = feeder.next_feed_after(at(Weekday::Wednesday, 10, 0)).unwrap();
    assert_eq!(next.entry, at(Weekday::Wednesday, 9, 0));
    assert_eq!(next.secs_until, 7 * 86_400 - 3600);
}

#[test]
fn single_weekly_slot_is_due_every_time_it_passes() {
    let (mut feeder, mut store, mut sink) = booted(&SystemConfig::default());
    feeder
        .update_feed(&mut store, &mut sink, |feed| {
            for i in 0..8 {
                feed.clear_slot(i).unwrap();
            }
            let wed = Weekday::Wednesday.bit();
            feed.set_slot(0, FeedSlot::at(wed, 9, 0).unwrap()).unwrap();
        })
        .unwrap();

    let just_before = PlannerEntry::at(Weekday::Wednesday, 8, 59, 59).unwrap();
    let just_after = PlannerEntry::at(Weekday::Wednesday, 9, 0, 1).unwrap();

    // The upcoming entry is the same slot on both sides of the crossing.
    assert_eq!(
        feeder.next_feed_after(just_before).map(|n| n.entry),
        feeder.next_feed_after(just_after).map(|n| n.entry)
    );
    assert_eq!(
        feeder.feed_due(just_before, just_after),
        Some(at(Weekday::Wednesday, 9, 0))
    );
    assert_eq!(
        feeder.feed_due(just_after, PlannerEntry::at(Weekday::Wednesday, 9, 0, 2).unwrap()),
        None
    );
}

#[test]
fn feed_due_across_the_week_boundary() {
    let (mut feeder, mut store, mut sink) = booted(&SystemConfig::default());
    feeder
        .update_feed(&mut store, &mut sink, |feed| {
            for i in 0..8 {
                feed.clear_slot(i).unwrap();
            }
            let mon = Weekday::Monday.bit();
            feed.set_slot(0, FeedSlot::at(mon, 0, 0).unwrap()).unwrap();
        })
        .unwrap();

    let sunday_night = PlannerEntry::at(Weekday::Sunday, 23, 59, 50).unwrap();
    let monday_morning = PlannerEntry::at(Weekday::Monday, 0, 0, 5).unwrap();
    assert_eq!(
        feeder.feed_due(sunday_night, monday_morning),
        Some(at(Weekday::Monday, 0, 0))
    );
}

#[test]
fn clock_set_does_not_trigger_feeding() {
    let (feeder, _, _) = booted(&SystemConfig::default());
    // Default slots are 07:00 and 18:00; a jump from 06:00 to 19:00 is a
    // clock adjustment, not elapsed time.
    assert_eq!(
        feeder.feed_due(at(Weekday::Friday, 6, 0), at(Weekday::Friday, 19, 0)),
        None
    );
}

// ── Periodic and manual feeding ───────────────────────────────

#[test]
fn periodic_feeding_requires_feature_and_elapsed_period() {
    let (mut feeder, mut store, mut sink) = booted(&SystemConfig::default());
    assert!(!feeder.periodic_feed_due(u32::MAX));

    feeder
        .update_feed(&mut store, &mut sink, |feed| {
            feed.set_features(FeedFeatures::PERIODIC);
            feed.set_period_secs(3600);
        })
        .unwrap();

    assert!(!feeder.periodic_feed_due(3599));
    assert!(feeder.periodic_feed_due(3600));
    assert!(feeder.planner().is_empty());
}

#[test]
fn manual_button_honours_lockout() {
    let (mut feeder, mut store, mut sink) = booted(&SystemConfig::default());

    assert!(feeder.manual_feed_allowed(None));
    assert!(!feeder.manual_feed_allowed(Some(599)));
    assert!(feeder.manual_feed_allowed(Some(600)));

    feeder
        .update_feed(&mut store, &mut sink, |feed| {
            feed.set_features(FeedFeatures::SCHEDULE);
        })
        .unwrap();
    assert!(!feeder.manual_feed_allowed(None));
}
