//! Boot and recovery flow against mock storage.
//!
//! Covers first boot on blank flash, clean reboot, corrupted and truncated
//! images, and the write-back behaviour when the partition refuses writes.

use crate::mock_storage::{MockStorage, RecordingSink};
use petfeeder::app::events::AppEvent;
use petfeeder::app::service::FeederService;
use petfeeder::config::SystemConfig;
use petfeeder::record::feed::FEED_RECORD_SIZE;
use petfeeder::record::network::NET_RECORD_SIZE;
use petfeeder::record::{FeedRecord, LoadOutcome, NetworkRecord, Record};
use std::net::Ipv4Addr;

const NS: &str = "records";

fn fresh() -> FeederService {
    FeederService::new(&SystemConfig::default()).unwrap()
}

/// Boot once on blank storage so every record image exists.
fn provisioned() -> MockStorage {
    let mut store = MockStorage::new();
    fresh().boot(&mut store, &mut RecordingSink::new());
    store.clear_log();
    store
}

// ── First boot ────────────────────────────────────────────────

#[test]
fn blank_storage_resets_and_persists_every_record() {
    let mut store = MockStorage::new();
    let mut sink = RecordingSink::new();
    let mut feeder = fresh();

    let report = feeder.boot(&mut store, &mut sink);

    assert_eq!(report.outcome("net"), Some(LoadOutcome::Missing));
    assert_eq!(report.outcome("feed"), Some(LoadOutcome::Missing));
    assert_eq!(report.reset_count(), 2);
    assert_eq!(store.writes, vec!["net", "feed"]);
    assert!(!feeder.has_unsaved_changes());

    let net = store.image(NS, "net").unwrap();
    assert_eq!(net.len(), NET_RECORD_SIZE);
    assert_eq!(&net[..4], b"NETX");
    assert_eq!(store.image(NS, "feed").unwrap().len(), FEED_RECORD_SIZE);

    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::RecordReset { .. })),
        2
    );
    assert_eq!(sink.last(), Some(&AppEvent::Booted { loaded: 0, reset: 2 }));
}

#[test]
fn defaults_are_visible_after_first_boot() {
    let mut feeder = fresh();
    feeder.boot(&mut MockStorage::new(), &mut RecordingSink::new());

    let net = feeder.network().unwrap();
    assert!(net.dhcp_enabled());
    assert_eq!(net.ip_addr(), Ipv4Addr::UNSPECIFIED);

    let feed = feeder.feed().unwrap();
    assert_eq!(feed.period_secs(), 43_200);
    assert_eq!(feed.portions(), 1);
    assert_eq!(feed.slots().count(), 2);
    // 07:00 and 18:00 on all seven days.
    assert_eq!(feeder.planner().len(), 14);
}

// ── Reboot ────────────────────────────────────────────────────

#[test]
fn clean_reboot_loads_everything_without_writing() {
    let mut store = provisioned();
    let mut sink = RecordingSink::new();
    let mut feeder = fresh();

    let report = feeder.boot(&mut store, &mut sink);

    assert_eq!(report.loaded_count(), 2);
    assert_eq!(report.reset_count(), 0);
    assert!(store.writes.is_empty());
    assert_eq!(store.reads.get(), 2);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::RecordsPersisted(_))), 0);
}

#[test]
fn edits_survive_a_reboot() {
    let mut store = provisioned();
    let mut sink = RecordingSink::new();

    let mut feeder = fresh();
    feeder.boot(&mut store, &mut sink);
    feeder
        .update_network(&mut store, &mut sink, |net| {
            net.set_dhcp_enabled(false);
            net.set_ip_addr(Ipv4Addr::new(192, 168, 1, 50));
            net.set_subnet_mask(Ipv4Addr::new(255, 255, 255, 0));
            net.set_gateway(Ipv4Addr::new(192, 168, 1, 1));
        })
        .unwrap();
    assert_eq!(store.writes, vec!["net"]);

    let mut rebooted = fresh();
    let report = rebooted.boot(&mut store, &mut sink);
    assert_eq!(report.reset_count(), 0);

    let net = rebooted.network().unwrap();
    assert!(!net.dhcp_enabled());
    assert_eq!(net.ip_addr(), Ipv4Addr::new(192, 168, 1, 50));
    assert_eq!(net.gateway(), Ipv4Addr::new(192, 168, 1, 1));
}

// ── Damaged images ────────────────────────────────────────────

#[test]
fn corrupt_feed_record_is_reset_and_rewritten() {
    let mut store = provisioned();
    // Byte 9 is the portion count.
    store.corrupt(NS, "feed", 9);

    let mut feeder = fresh();
    let report = feeder.boot(&mut store, &mut RecordingSink::new());

    assert_eq!(report.outcome("net"), Some(LoadOutcome::Loaded));
    assert_eq!(report.outcome("feed"), Some(LoadOutcome::Corrupt));
    assert_eq!(store.writes, vec!["feed"]);

    let mut check = FeedRecord::new();
    check.deserialize(store.image(NS, "feed").unwrap()).unwrap();
    assert!(check.is_sane());
}

#[test]
fn wrong_magic_with_valid_checksum_is_still_reset() {
    let mut store = provisioned();
    let mut image = store.image(NS, "net").unwrap().to_vec();
    image[..4].copy_from_slice(b"FEED");
    petfeeder::record::checksum::seal(&mut image);
    store.seed(NS, "net", &image);

    let report = fresh().boot(&mut store, &mut RecordingSink::new());
    assert_eq!(report.outcome("net"), Some(LoadOutcome::Corrupt));
}

#[test]
fn truncated_image_is_reported_with_its_length() {
    let mut store = provisioned();
    store.truncate(NS, "net", 7);

    let report = fresh().boot(&mut store, &mut RecordingSink::new());
    assert_eq!(report.outcome("net"), Some(LoadOutcome::Truncated(7)));
    assert_eq!(store.image(NS, "net").unwrap().len(), NET_RECORD_SIZE);
}

#[test]
fn unreadable_storage_falls_back_to_defaults() {
    let mut store = provisioned();
    store.fail_reads = true;

    let mut feeder = fresh();
    let report = feeder.boot(&mut store, &mut RecordingSink::new());

    assert_eq!(report.reset_count(), 2);
    assert_eq!(report.outcome("feed"), Some(LoadOutcome::ReadFailed));
    assert!(feeder.network().unwrap().is_sane());
    assert!(feeder.feed().unwrap().is_sane());
}

// ── Write-back failures ───────────────────────────────────────

#[test]
fn failed_write_back_keeps_records_dirty_until_retry() {
    let mut store = MockStorage::new();
    store.fail_writes = true;
    let mut sink = RecordingSink::new();
    let mut feeder = fresh();

    feeder.boot(&mut store, &mut sink);
    assert!(feeder.has_unsaved_changes());
    assert_eq!(sink.count(|e| *e == AppEvent::PersistFailed), 1);
    assert!(store.image(NS, "net").is_none());

    store.fail_writes = false;
    assert_eq!(feeder.persist(&mut store, &mut sink).unwrap(), 2);
    assert!(!feeder.has_unsaved_changes());
    assert_eq!(sink.last(), Some(&AppEvent::RecordsPersisted(2)));
}

#[test]
fn persist_with_nothing_dirty_writes_nothing() {
    let mut store = provisioned();
    let mut sink = RecordingSink::new();
    let mut feeder = fresh();
    feeder.boot(&mut store, &mut sink);

    assert_eq!(feeder.persist(&mut store, &mut sink).unwrap(), 0);
    assert!(store.writes.is_empty());
}

#[test]
fn factory_reset_overwrites_customised_records() {
    let mut store = provisioned();
    let mut sink = RecordingSink::new();
    let mut feeder = fresh();
    feeder.boot(&mut store, &mut sink);
    feeder
        .update_feed(&mut store, &mut sink, |feed| feed.set_portions(4))
        .unwrap();
    store.clear_log();

    assert_eq!(feeder.factory_reset(&mut store, &mut sink).unwrap(), 2);
    assert_eq!(feeder.portions(), 1);
    assert_eq!(store.writes, vec!["net", "feed"]);
    assert!(sink.events.contains(&AppEvent::FactoryReset));

    let defaults = NetworkRecord::with_defaults();
    assert_eq!(store.image(NS, "net").unwrap(), defaults.as_bytes());
}
