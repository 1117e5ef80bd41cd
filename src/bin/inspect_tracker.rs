use std::env;

use eddystone_eid_core::clock::SystemClock;
use eddystone_eid_core::{AdvertisingFrame, BeaconTracker};

// Small CLI to help debug a beacon's EID/ETLM handling in the field.
// Usage:
//   inspect_tracker <identity_key_hex> <K> <counter> <window_size> <address> <rssi> <frame_hex>
//
// <frame_hex> is the raw Eddystone service-data bytes (type byte included),
// e.g. "3000b1dc360a2dd3df22" for an EID frame.
fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() != 7 {
        eprintln!(
            "Usage: inspect_tracker <identity_key_hex> <K> <counter> <window_size> <address> <rssi> <frame_hex>"
        );
        std::process::exit(2);
    }

    let identity_key_hex = &args[0];
    let exponent: u8 = args[1].parse().expect("K must be an integer 0..=15");
    let counter: u32 = args[2].parse().expect("counter must be a u32");
    let window_size: usize = args[3].parse().expect("window_size must be a positive integer");
    let address = &args[4];
    let rssi: i16 = args[5].parse().expect("rssi must be an integer");
    let frame_hex = &args[6];

    let identity_key = match hex::decode(identity_key_hex) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("bad identity key hex: {e}");
            std::process::exit(1);
        }
    };

    let mut tracker = match BeaconTracker::new(
        "cli-device",
        &identity_key,
        exponent,
        counter,
        window_size,
        None,
        SystemClock,
    ) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("construction error: {e}");
            std::process::exit(1);
        }
    };

    let data = match hex::decode(frame_hex) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("bad frame hex: {e}");
            std::process::exit(1);
        }
    };

    let frame = AdvertisingFrame::new(address.clone(), rssi).with_service_data(
        eddystone_eid_core::frame::EDDYSTONE_SERVICE_UUID,
        data,
    );
    tracker.process_packet(&frame);

    let snapshot = tracker.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot).unwrap());
}
