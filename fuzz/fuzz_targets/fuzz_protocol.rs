#![no_main]

//! Protocol stream fuzzer.
//!
//! Feeds arbitrary bytes to the driver after a valid setup block. Malformed
//! input must surface as a protocol error, never as a panic, and the driver
//! must keep answering every complete update block with `go`.

use std::io::Cursor;

use formic::bot::BotConfig;
use formic::protocol::Driver;
use libfuzzer_sys::fuzz_target;

const SETUP: &str = "loadtime 3000\nturntime 1000\nrows 24\ncols 24\nturns 100\nviewradius2 55\nattackradius2 5\nspawnradius2 1\nready\n";

fuzz_target!(|data: &[u8]| {
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };
    // Cap the stream so degenerate inputs cannot stall the fuzzer.
    let body: String = body.lines().take(200).collect::<Vec<_>>().join("\n");

    let reader = Cursor::new(format!("{SETUP}{body}\n"));
    let mut output = Vec::new();
    let Ok(mut driver) = Driver::setup(reader, &mut output, BotConfig::default()) else {
        return;
    };
    // Errors are expected on garbage; panics are not.
    let _ = driver.run(&mut |_| {});
});
