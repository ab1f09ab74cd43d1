//! Fuzz target: record images read back from storage
//!
//! Feeds arbitrary bytes to every record kind as if they had been read
//! from flash.  Whatever the bytes, deserialization must not panic, and a
//! record that is not sane must become sane after a reset.
//!
//! cargo fuzz run fuzz_record_image

#![no_main]

use libfuzzer_sys::fuzz_target;
use petfeeder::record::{FeedRecord, NetworkRecord, Record, MAX_RECORD_SIZE};

fn check(rec: &mut dyn Record, data: &[u8]) {
    match rec.deserialize(data) {
        Ok(()) => {
            if rec.is_sane() {
                // A sane image must survive a round trip unchanged.
                let mut out = [0u8; MAX_RECORD_SIZE];
                let n = rec.serialize(&mut out).expect("serialize sane record");
                assert_eq!(&out[..n], &data[..n]);
            } else {
                rec.reset_dflt();
                assert!(rec.is_sane(), "{} not sane after reset", rec.name());
                assert!(rec.is_dirty());
            }
        }
        Err(_) => assert!(data.len() < rec.rec_size()),
    }
}

fuzz_target!(|data: &[u8]| {
    check(&mut NetworkRecord::new(), data);
    check(&mut FeedRecord::new(), data);
});
