use clap::Parser;
use core::cell::RefCell;
use embassy_executor::{Executor, Spawner};
use embassy_net::{Config, Ipv4Address, Ipv4Cidr, Runner, StackResources};
use embassy_net_tuntap::TunTapDevice;
use embedded_hal::i2c::{ErrorType, I2c, Operation};
use heapless::Vec;
use rand_core::{OsRng, TryRngCore};
use rdc_core::mk_static;
use rdc_core::utils::controllers::{
    Drivetrain, LifecycleCommand, Scaled, StickAxis, CONTROL_CHANNEL,
};
use rdc_core::utils::{RobotConfig, SystemController, wss};
use static_cell::StaticCell;
use std::convert::Infallible;
use std::path::PathBuf;
use std::process;
use tracing::{error, info, trace};

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts
{
    /// TAP device name
    #[clap(long, default_value = "tap0")]
    tap: String,
    /// use a static IP instead of DHCP
    #[clap(long)]
    static_ip: bool,
    /// JSON robot configuration; defaults are used for missing fields
    #[clap(long)]
    config: Option<PathBuf>,
    /// WebSocket port for the operator endpoint
    #[clap(long, default_value_t = 8000)]
    port: u16,
    /// enable the drive command at boot instead of waiting for the operator
    #[clap(long)]
    enable: bool,
}

/// I2C bus that accepts every transfer and logs it.
struct SimI2c;

impl ErrorType for SimI2c {
    type Error = Infallible;
}

impl I2c for SimI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                Operation::Write(bytes) => trace!(address, ?bytes, "i2c write"),
                Operation::Read(buf) => {
                    buf.fill(0);
                    trace!(address, len = buf.len(), "i2c read");
                }
            }
        }
        Ok(())
    }
}

type SimController =
    SystemController<Drivetrain<'static, SimI2c>, Scaled<StickAxis>, Scaled<StickAxis>>;

/// Log and terminate. Used for anything that must not be run past.
fn fatal(msg: &str) -> ! {
    error!("{msg}");
    process::exit(1);
}

fn load_config(path: Option<&PathBuf>) -> RobotConfig {
    let Some(path) = path else {
        return RobotConfig::default();
    };
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| fatal(&format!("cannot read {}: {e}", path.display())));
    serde_json::from_str(&text)
        .unwrap_or_else(|e| fatal(&format!("invalid config {}: {e}", path.display())))
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, TunTapDevice>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn drive_task(mut ctrl: SimController) -> ! {
    ctrl.run().await
}

#[embassy_executor::task]
async fn main_task(spawner: Spawner) {
    let opts: Opts = Opts::parse();

    let config = load_config(opts.config.as_ref());
    if let Err(e) = config.validate() {
        fatal(&format!("invalid configuration: {e:?}"));
    }
    info!(?config, "configuration loaded");

    // Drivetrain bring-up; the robot never runs with unconfigured motors
    let i2c_bus: &'static RefCell<SimI2c> = mk_static!(RefCell<SimI2c>, RefCell::new(SimI2c));
    let mut drivetrain = Drivetrain::new(i2c_bus, &config.drivetrain)
        .unwrap_or_else(|e| fatal(&format!("drivetrain config rejected: {e:?}")));
    if let Err(e) = drivetrain.init_devices().and_then(|_| drivetrain.configure()) {
        drivetrain.scan_bus();
        fatal(&format!("failed to configure drivetrain: {e:?}"));
    }

    let drive = config.drive;
    let ctrl = SystemController::new(
        drivetrain,
        Scaled::new(StickAxis::First, drive.first_multiplier),
        Scaled::new(StickAxis::Second, drive.second_multiplier),
        &drive,
    );
    if opts.enable {
        CONTROL_CHANNEL.send(LifecycleCommand::Enable).await;
    }
    if spawner.spawn(drive_task(ctrl)).is_err() {
        fatal("failed to spawn drive task");
    }

    // Network
    let device = TunTapDevice::new(&opts.tap)
        .unwrap_or_else(|e| fatal(&format!("cannot open {}: {e}", opts.tap)));
    let net_config = if opts.static_ip {
        Config::ipv4_static(embassy_net::StaticConfigV4 {
            address: Ipv4Cidr::new(Ipv4Address::new(192, 168, 69, 2), 24),
            dns_servers: Vec::new(),
            gateway: Some(Ipv4Address::new(192, 168, 69, 1)),
        })
    } else {
        Config::dhcpv4(Default::default())
    };
    let mut seed_buf = [0; 8];
    if let Err(e) = OsRng.try_fill_bytes(&mut seed_buf) {
        fatal(&format!("no entropy for network seed: {e}"));
    }
    let seed = u64::from_le_bytes(seed_buf);

    static RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        device,
        net_config,
        RESOURCES.init(StackResources::<3>::new()),
        seed,
    );
    if spawner.spawn(net_task(runner)).is_err() {
        fatal("failed to spawn network task");
    }

    info!("Starting operator WebSocket server on port {}", opts.port);
    wss(0, opts.port, stack, None).await;
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        if spawner.spawn(main_task(spawner)).is_err() {
            fatal("failed to spawn main task");
        }
    });
}
