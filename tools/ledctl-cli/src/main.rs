use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use hal::chardev::ChannelRegistry;
use hal::gpio::GpioController;
use hal_linux::{FsRegistry, SysfsGpio};
use hal_sim::{SimGpio, SimRegistry};
use ledctl::{DriverConfig, LedController, Session, LED_OFF, LED_ON};

mod shell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// In-memory simulation, no hardware access
    Sim,
    /// Linux sysfs GPIO
    Sysfs,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Drive GPIO LEDs through an exclusive control channel")]
struct Opts {
    /// Start-up parameters
    #[arg(long, default_value = "led_gpios=23,24", value_name = "PARAMS")]
    params: String,

    /// JSON configuration file, used instead of --params
    #[arg(long, value_name = "FILE", conflicts_with = "params")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Backend::Sim)]
    backend: Backend,

    /// Root of the sysfs GPIO tree
    #[arg(long, default_value = SysfsGpio::DEFAULT_ROOT, value_name = "DIR")]
    sysfs_root: PathBuf,

    /// Directory under which the control channel is published
    #[arg(long, default_value = "/run/ledctl", value_name = "DIR")]
    run_dir: PathBuf,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Show managed LEDs and their levels
    Status,
    /// Read one LED
    Read { pin: u32 },
    /// Set one LED for a while
    ///
    /// Momentary: every LED is switched off again when ledctl unloads the
    /// controller on exit.
    Write {
        pin: u32,
        value: i32,
        /// How long to keep the level before exiting
        #[arg(long, default_value_t = 0, value_name = "MS")]
        hold_ms: u64,
    },
    /// Flash one LED on and off
    Blink {
        pin: u32,
        #[arg(long, default_value_t = 1)]
        count: u32,
        #[arg(long, default_value_t = 500, value_name = "MS")]
        interval_ms: u64,
    },
    /// Issue commands read from stdin within one session
    Shell,
}

fn load_config(opts: &Opts) -> anyhow::Result<DriverConfig> {
    match &opts.config {
        Some(path) => read_config_file(path),
        None => DriverConfig::from_params(&opts.params)
            .with_context(|| format!("invalid parameters `{}`", opts.params)),
    }
}

fn read_config_file(path: &Path) -> anyhow::Result<DriverConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn run<G, R>(mut controller: LedController<G, R>, command: &Cmd) -> anyhow::Result<()>
where
    G: GpioController,
    R: ChannelRegistry,
{
    let result = execute(&controller, command);
    controller.unload();
    result
}

fn print_status<G, R>(controller: &LedController<G, R>)
where
    G: GpioController,
    R: ChannelRegistry,
{
    let status = controller.status();
    match status.major {
        Some(major) => println!("{} major {major}", controller.config().device_name),
        None => println!("{} not published", controller.config().device_name),
    }
    for pin in status.pins {
        let level = pin
            .level
            .map_or_else(|| "-".to_string(), |level| level.as_raw().to_string());
        println!(
            "{:<8} {:<11} {level}",
            pin.descriptor.id().to_string(),
            format!("{:?}", pin.descriptor.state())
        );
    }
}

fn open<G, R>(controller: &LedController<G, R>) -> anyhow::Result<Session<'_, G, R>>
where
    G: GpioController,
    R: ChannelRegistry,
{
    controller.open().context("failed to open control channel")
}

fn execute<G, R>(controller: &LedController<G, R>, command: &Cmd) -> anyhow::Result<()>
where
    G: GpioController,
    R: ChannelRegistry,
{
    match *command {
        Cmd::Status => print_status(controller),
        Cmd::Read { pin } => {
            let record = open(controller)?.read_pin(pin)?;
            println!("GPIO{} = {}", record.pin, record.value);
        }
        Cmd::Write { pin, value, hold_ms } => {
            open(controller)?.write_pin(pin, value)?;
            println!("GPIO{pin} <- {value}");
            thread::sleep(Duration::from_millis(hold_ms));
        }
        Cmd::Blink {
            pin,
            count,
            interval_ms,
        } => {
            let session = open(controller)?;
            let interval = Duration::from_millis(interval_ms);
            for _ in 0..count {
                session.write_pin(pin, LED_ON.as_raw())?;
                thread::sleep(interval);
                session.write_pin(pin, LED_OFF.as_raw())?;
                thread::sleep(interval);
            }
        }
        Cmd::Shell => {
            let session = open(controller)?;
            shell::run(&session, io::stdin().lock(), io::stdout().lock())?;
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = Opts::parse();
    let config = load_config(&opts)?;
    log::debug!("configuration: {config:?}");

    match opts.backend {
        Backend::Sim => {
            let controller = LedController::load(config, SimGpio::new(), SimRegistry::new())
                .context("failed to load controller")?;
            run(controller, &opts.command)
        }
        Backend::Sysfs => {
            let controller = LedController::load(
                config,
                SysfsGpio::with_root(&opts.sysfs_root),
                FsRegistry::new(&opts.run_dir),
            )
            .context("failed to load controller")?;
            run(controller, &opts.command)
        }
    }
}
