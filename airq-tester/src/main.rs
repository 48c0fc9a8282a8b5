use std::time::{Duration, Instant};

use ccs811::{Ccs811, Ccs811Builder, DriveMode, SlaveAddress};
use clap::Parser;
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};
use linux_embedded_hal::{Delay, I2cdev};

/// Continuously report air quality from a CCS811 sensor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to I2C bus (e.g., /dev/i2c-1)
    #[arg(short, long)]
    path: String,
    /// Use the alternate address 0x5B (ADDR pin wired high)
    #[arg(short, long)]
    alternate: bool,
    /// Drive mode ordinal (0 = idle, 1 = 1 s, 2 = 10 s, 3 = 60 s, 4 = raw)
    #[arg(short, long, default_value_t = 1)]
    mode: u8,
    /// Ambient relative humidity in percent, for compensation
    #[arg(long, requires = "temperature")]
    humidity: Option<f32>,
    /// Ambient temperature in degrees Celsius, for compensation
    #[arg(long, requires = "humidity")]
    temperature: Option<f32>,
}

fn main() {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();
    run(args);
}

fn run(args: Args) {
    let mode = DriveMode::from(args.mode);
    println!("[AIR] Opening bus: {}", args.path);
    // Open the I2C bus
    let i2c = I2cdev::new(&args.path).expect("Failed to open I2C device");
    let mut delay = Delay;
    let address = if args.alternate {
        SlaveAddress::default().with_addr_pin(true)
    } else {
        SlaveAddress::default()
    };
    let mut ccs = Ccs811Builder::default().with_address(address).build(i2c);
    'root: loop {
        if let Err(e) = ccs.init(&mut delay) {
            log::error!(
                "[AIR] Address 0x{:02x} not responding: {e:?}",
                ccs.get_address()
            );
            std::thread::sleep(Duration::from_secs(1));
            continue 'root;
        }
        println!("[AIR] Device found at address 0x{:02x}", ccs.get_address());
        if let (Some(humidity), Some(temperature)) = (args.humidity, args.temperature) {
            if let Err(e) = ccs.set_environment(humidity, temperature) {
                log::warn!("[AIR] Could not set compensation: {e:?}");
            }
        }
        if let Err(e) = ccs.configure(mode) {
            log::error!("[AIR] Could not set drive mode: {e:?}");
            recover(&mut ccs, &mut delay);
            continue 'root;
        }
        loop {
            // Timekeeping
            let start = Instant::now();
            match ccs.data_available() {
                Ok(true) => match ccs.read_data() {
                    Ok(r) => log::info!(
                        "[AIR] Sensor 0x{:02x}: CO2 {} ppm, TVOC {} ppb",
                        ccs.get_address(),
                        r.co2_ppm(),
                        r.tvoc_ppb()
                    ),
                    Err(e) => {
                        log::warn!(
                            "[AIR] Sensor 0x{:02x}: Error reading: {e:?}",
                            ccs.get_address()
                        );
                        recover(&mut ccs, &mut delay);
                        continue 'root;
                    }
                },
                Ok(false) => {
                    log::debug!("[AIR] Sensor 0x{:02x}: No data ready", ccs.get_address())
                }
                Err(e) => {
                    log::warn!(
                        "[AIR] Sensor 0x{:02x}: Error polling: {e:?}",
                        ccs.get_address()
                    );
                    recover(&mut ccs, &mut delay);
                    continue 'root;
                }
            }
            // wait so that there is 1 second interval between polls
            std::thread::sleep(Duration::from_secs(1).saturating_sub(start.elapsed()));
        }
    }
}

fn recover<T: I2c<SevenBitAddress>, D: DelayNs>(ccs: &mut Ccs811<T>, delay: &mut D) {
    if let Err(e) = ccs.software_reset(delay) {
        log::warn!(
            "[AIR] Sensor 0x{:02x}: Could not reset: {e:?}",
            ccs.get_address()
        );
    }
    std::thread::sleep(Duration::from_secs(1));
}
