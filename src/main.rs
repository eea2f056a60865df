mod config;
mod dump;

use std::thread;
use std::time::Duration;

use clap::Parser;
use isdv4_pad::{SerialPortLink, Session};

use config::{Cli, Command, Config};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn main() -> Result<(), BoxError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load(&cli);
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    log::info!(
        "isdv4-pad starting (device={}, baud={}, touch={})",
        config.device.display(),
        config.baud_rate,
        if config.touch_enabled { "on" } else { "off" }
    );

    match cli.command {
        Some(Command::Query) => query(&config),
        Some(Command::Dump) => run(&config, true),
        None => run(&config, false),
    }
}

/// Open the line and run the whole query phase.
fn bring_up(config: &Config) -> Result<Session<SerialPortLink>, BoxError> {
    let options = config.session_options()?;
    let path = config.device.to_string_lossy();
    let link = SerialPortLink::open(&path, options.baud_rate)?;
    let mut session = Session::new(link, options);

    if !session.detect() {
        log::warn!("{} does not look like a serial line", path);
    }
    let probed = session.probe_capability_bits(&config.name, &config.device);
    log::debug!("probed {:?}", probed);

    let (kind, _) = session.init()?;
    session.get_ranges()?;
    log::info!(
        "{} tablet 0x{:x} at {} baud, firmware 0x{:x}",
        kind,
        session.tablet_id(),
        session.baud_rate(),
        session.version()
    );
    Ok(session)
}

fn query(config: &Config) -> Result<(), BoxError> {
    let mut session = bring_up(config)?;
    let ranges = *session.ranges();

    println!("tablet id:   0x{:02x}", session.tablet_id());
    println!("baud rate:   {}", session.baud_rate());
    println!("version:     0x{:x}", session.version());
    println!("pen:         x 0..{} y 0..{} pressure 0..{}", ranges.x_max, ranges.y_max, ranges.pressure_max);
    println!("resolution:  {}x{}", ranges.resolution_x, ranges.resolution_y);
    if session.tilt_enabled() {
        println!("tilt:        x 0..{} y 0..{}", ranges.tilt_x_max, ranges.tilt_y_max);
    }
    if session.touch_supported() {
        println!("touch:       x 0..{} y 0..{}", ranges.touch_x_max, ranges.touch_y_max);
        println!("touch res:   {}x{}", ranges.touch_resolution_x, ranges.touch_resolution_y);
    }

    session.stop()?;
    Ok(())
}

fn run(config: &Config, raw: bool) -> Result<(), BoxError> {
    loop {
        log::info!("opening {}…", config.device.display());
        if let Err(e) = stream(config, raw) {
            log::error!("{}", e);
        }
        log::warn!("tablet disconnected, reconnecting in 2s…");
        thread::sleep(Duration::from_secs(2));
    }
}

fn stream(config: &Config, raw: bool) -> Result<(), BoxError> {
    let mut session = bring_up(config)?;
    session.start()?;
    if raw {
        dump::run_dump(&mut session)?;
    } else {
        dump::run_events(&mut session)?;
    }
    Ok(())
}
