//! Example: periodic environmental readings on a Raspberry Pi.
//!
//! Reads the sensor on `/dev/i2c-1` at address 0x77 every three seconds.
//! Set `RUST_LOG=trace` to watch the register traffic.

use std::thread;
use std::time::Duration;

use bme680_tph::linux::StdDelay;
use bme680_tph::{Bme680, DEFAULT_ADDRESS};

fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let sensor = Bme680::open_linux(1, DEFAULT_ADDRESS).expect("Failed to open /dev/i2c-1");
    let mut sensor = sensor.init().expect("Failed to read calibration data");
    let mut delay = StdDelay;

    loop {
        match sensor.measure(&mut delay) {
            Ok(m) => {
                println!("temp: {:.2} °C", m.temperature);
                println!("press: {:.2} hPa", m.pressure_hpa());
                println!("hum: {:.2} %", m.humidity);
            }
            Err(e) => log::error!("measurement failed: {e}"),
        }

        thread::sleep(Duration::from_secs(3));
    }
}
