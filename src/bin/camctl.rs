use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use camctl::backend::{Backend, CommandBackend, NativeBackend, DEFAULT_PROGRAM};
use camctl::{settings, CameraControl, Control, Widget};

#[derive(Parser)]
#[command(name = "camctl", about = "Handle camera controls via v4l2-ctl", version)]
struct Cli {
    /// v4l2 device to use, see `v4l2-ctl --list-devices`
    #[arg(short, long, default_value = "")]
    device: String,

    #[arg(long, value_enum, default_value_t = BackendKind::Command)]
    backend: BackendKind,

    /// Program used by the command backend
    #[arg(long, default_value = DEFAULT_PROGRAM)]
    ctl_path: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendKind {
    /// Run v4l2-ctl
    Command,
    /// Talk to the device node directly
    Native,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the control panel (default)
    Gui,
    /// Print all controls
    List,
    /// Print the value of a control
    Get { name: String },
    /// Set controls, e.g. `brightness=10 gain=3`
    Set {
        #[arg(required = true, value_parser = parse_assignment)]
        assignments: Vec<(String, i64)>,
    },
    /// Apply the driver defaults
    Reset,
    /// Save the current controls to a profile
    Save { file: PathBuf },
    /// Apply a saved profile
    Load { file: PathBuf },
}

fn parse_assignment(s: &str) -> Result<(String, i64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <name>=<value>, got `{}`", s))?;
    let value = camctl::parse::parse_int(value.trim())
        .ok_or_else(|| format!("`{}` is not an integer", value))?;
    Ok((name.trim().to_owned(), value))
}

fn describe(name: &str, ctrl: &Control) -> String {
    let mut line = format!("{:>32} ({:<7})", name, ctrl.kind);

    if let Widget::Slider { min, max, step } = ctrl.widget() {
        line += &format!(" min={} max={} step={}", min, max, step);
    }
    if let Some(default) = ctrl.default {
        line += &format!(" default={}", default);
    }
    if let Some(value) = ctrl.value {
        line += &format!(" value={}", value);
    }
    if let Some(item) = ctrl.selected_item() {
        line += &format!(" ({})", item.name);
    }
    if !ctrl.flags.is_empty() {
        line += &format!(" flags={}", ctrl.flags);
    }

    line
}

fn open(cli: &Cli) -> Result<CameraControl<Box<dyn Backend>>> {
    let backend: Box<dyn Backend> = match cli.backend {
        BackendKind::Command => {
            Box::new(CommandBackend::new(&cli.device).with_program(&cli.ctl_path))
        }
        BackendKind::Native => Box::new(
            NativeBackend::new(&cli.device)
                .with_context(|| format!("cannot open device `{}`", cli.device))?,
        ),
    };

    CameraControl::new(backend).context("cannot list camera controls")
}

#[cfg(feature = "gui")]
fn gui(camera: CameraControl<Box<dyn Backend>>) -> Result<()> {
    let dir = settings::config_dir()?;
    camctl::gui::run(camctl::gui::Window::new(camera, dir))
        .map_err(|err| anyhow!("control panel failed: {}", err))
}

#[cfg(not(feature = "gui"))]
fn gui(_camera: CameraControl<Box<dyn Backend>>) -> Result<()> {
    Err(anyhow!("built without the `gui` feature"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut camera = open(&cli)?;

    match cli.command.unwrap_or(Commands::Gui) {
        Commands::Gui => gui(camera)?,
        Commands::List => {
            for (name, ctrl) in camera.controls() {
                println!("{}", describe(name, ctrl));
            }
        }
        Commands::Get { name } => println!("{}: {}", name, camera.get_value(&name)?),
        Commands::Set { assignments } => {
            for (name, value) in assignments {
                camera
                    .set_value(&name, value)
                    .with_context(|| format!("cannot set {}={}", name, value))?;
            }
        }
        Commands::Reset => {
            let report = camera.update(true);
            if !report.is_clean() {
                bail!("rejected: {}", report.failed.join(", "));
            }
        }
        Commands::Save { file } => {
            let path = settings::save(&file, camera.controls())?;
            println!("{}", path.display());
        }
        Commands::Load { file } => {
            let profile = settings::load(&file)?;
            let report = camera.apply_profile(&profile);
            if !report.is_clean() {
                bail!("rejected: {}", report.failed.join(", "));
            }
        }
    }

    Ok(())
}
