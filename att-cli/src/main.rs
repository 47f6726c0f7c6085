//! Attenuator Control CLI
//!
//! Command-line front end for mechanical RF attenuator units attached via
//! USB-ACM serial. Discovers units on startup, addresses them by logical
//! name (`att0`, `att1`, ...) and prints one outcome triple per operation.

use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use att_ctl::{AttControl, AttRegistry, SessionConfig};
use att_detect::{PortScanner, ScannerConfig};

/// Pause between attempts of the `test` sweep
const SWEEP_PAUSE: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "rfatt")]
#[command(about = "Control mechanical RF attenuator units over USB-ACM serial", version)]
struct Cli {
    /// Response timeout per command, in milliseconds
    #[arg(long, global = true, default_value_t = 1000)]
    timeout_ms: u64,

    /// Line terminator on the serial channel
    #[arg(long, global = true, value_enum, default_value = "crlf")]
    terminator: Terminator,

    /// Substring marking target devices among enumerated port names
    #[arg(long, global = true, default_value = "ACM")]
    pattern: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Terminator {
    /// Carriage return + line feed
    Crlf,
    /// Line feed only
    Lf,
}

impl Terminator {
    fn bytes(self) -> Vec<u8> {
        match self {
            Terminator::Crlf => b"\r\n".to_vec(),
            Terminator::Lf => b"\n".to_vec(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List every serial port visible to the system
    Scan,
    /// Print logical instrument names
    Names,
    /// Query the current attenuation of one instrument
    #[command(visible_alias = "get_val")]
    Get {
        /// Logical instrument name
        name: String,
    },
    /// Print the allowed attenuation values per instrument
    Allow,
    /// Set the attenuation of one instrument
    Set {
        /// Logical instrument name
        name: String,
        /// Attenuation value, exactly as listed by `allow`
        value: String,
    },
    /// Step the attenuation up one table entry
    Up {
        /// Logical instrument name
        name: String,
    },
    /// Step the attenuation down one table entry
    Down {
        /// Logical instrument name
        name: String,
    },
    /// Sweep through every allowed value of one instrument
    Test {
        /// Logical instrument name
        name: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rfatt=info,att_ctl=info,att_detect=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Cli {
        timeout_ms,
        terminator,
        pattern,
        command,
    } = Cli::parse();
    tracing::info!("Starting rfatt");

    let scanner = PortScanner::with_config(ScannerConfig {
        match_pattern: pattern.clone(),
    });

    if matches!(command, Command::Scan) {
        return scan(&scanner);
    }

    let config = SessionConfig {
        timeout: Duration::from_millis(timeout_ms),
        terminator: terminator.bytes(),
        ..Default::default()
    };
    run(command, &config, &pattern, &scanner)
}

/// Discover the attached units and dispatch one control operation
fn run(
    command: Command,
    config: &SessionConfig,
    pattern: &str,
    scanner: &PortScanner,
) -> Result<()> {
    let ports = scanner
        .matching_ports()
        .context("serial port enumeration failed")?;
    let addresses: Vec<String> = ports.into_iter().map(|p| p.port).collect();
    if addresses.is_empty() {
        bail!("no {pattern} resources found, please check your devices connection");
    }

    let registry =
        AttRegistry::open(&addresses, config).context("attenuator discovery failed")?;
    let mut ctl = AttControl::new(registry);

    match command {
        Command::Scan => {}
        Command::Names => {
            for name in ctl.names() {
                println!("{name}");
            }
        }
        Command::Get { name } => println!("{}", ctl.get_value(&name)),
        Command::Allow => {
            for (name, values) in ctl.allowed_values() {
                println!("{name}: {}", values.join(","));
            }
        }
        Command::Set { name, value } => println!("{}", ctl.set_value(&name, &value)),
        Command::Up { name } => println!("{}", ctl.step_up(&name)),
        Command::Down { name } => println!("{}", ctl.step_down(&name)),
        Command::Test { name } => sweep(&mut ctl, &name)?,
    }

    ctl.shutdown();
    Ok(())
}

/// Print every enumerated serial port with its USB metadata
fn scan(scanner: &PortScanner) -> Result<()> {
    let ports = scanner
        .enumerate_ports()
        .context("serial port enumeration failed")?;

    if ports.is_empty() {
        println!("no serial ports found");
        return Ok(());
    }

    for port in ports {
        let product = port.product.as_deref().unwrap_or("-");
        match (port.vid, port.pid) {
            (Some(vid), Some(pid)) => {
                println!("{}  {:04x}:{:04x}  {}", port.port, vid, pid, product)
            }
            _ => println!("{}  -  {}", port.port, product),
        }
    }
    Ok(())
}

/// Try every allowed value of one instrument, pausing between attempts
///
/// Manual diagnostic: exercises the full mechanical range and prints one
/// outcome triple per value.
fn sweep<T: std::io::Read + std::io::Write>(ctl: &mut AttControl<T>, name: &str) -> Result<()> {
    let values = match ctl.allowed_values().get(name) {
        Some(v) => v.clone(),
        None => bail!("unknown instrument name: {name}"),
    };

    for (i, value) in values.iter().enumerate() {
        println!("{}", ctl.set_value(name, value));
        if i + 1 < values.len() {
            thread::sleep(SWEEP_PAUSE);
        }
    }
    Ok(())
}
