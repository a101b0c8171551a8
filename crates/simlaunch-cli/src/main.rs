//! CLI for describing iOS Simulator actions with a propagated child environment.
//!
//! Variables in the calling shell prefixed with `FBSIMCTL_CHILD_` are stripped
//! of the prefix and added to the environment of the launched app, the app
//! hosting an XCTest run, or the booting simulator. The resulting action is
//! printed, either as the `xcrun simctl` command that performs it or as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Launch an app with API_URL set in its environment
//! FBSIMCTL_CHILD_API_URL=http://localhost:8080 simlaunch launch-app com.example.MyApp
//!
//! # Pass arguments and a base environment
//! simlaunch launch-app com.example.MyApp -e LOG_LEVEL=debug -- --reset-state
//!
//! # Boot a specific simulator with a boot environment
//! FBSIMCTL_CHILD_TZ=UTC simlaunch -d A1B2C3D4 boot --scale 50
//!
//! # Describe an XCTest run as JSON
//! simlaunch --format json launch-xctest --test-bundle MyTests.xctest --app com.example.MyApp
//!
//! # Remember a default device
//! simlaunch set-device A1B2C3D4
//! ```

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use simlaunch_core::action::Action;
use simlaunch_core::config::SimlaunchConfig;
use simlaunch_core::configuration::{
    ApplicationLaunchConfiguration, BootConfiguration, OutputConfiguration, OutputTarget, Scale,
    TestLaunchConfiguration,
};
use simlaunch_core::environment::{read_environment, Environment, EnvironmentError, CHILD_ENV_PREFIX};
use simlaunch_core::simctl::{SimctlError, SimctlInvocation};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Describe iOS Simulator actions, propagating FBSIMCTL_CHILD_ variables.
#[derive(Parser)]
#[command(name = "simlaunch")]
#[command(about = "Describe simulator actions with FBSIMCTL_CHILD_ environment propagation")]
#[command(version)]
struct Cli {
    /// Target device UDID (defaults to the configured device, then "booted")
    #[arg(short, long, env = "SIMLAUNCH_DEVICE")]
    device: Option<String>,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Launch an application
    LaunchApp {
        /// Bundle identifier (e.g., com.example.MyApp)
        bundle_id: String,
        /// Arguments passed to the application
        #[arg(last = true)]
        arguments: Vec<String>,
        /// Base environment entry (KEY=VALUE); child variables override it
        #[arg(short = 'e', long = "env", value_parser = parse_key_val)]
        env: Vec<(String, String)>,
        /// Suspend the app at launch until a debugger attaches
        #[arg(short, long)]
        wait_for_debugger: bool,
        /// Write stdout to this file instead of /dev/null
        #[arg(long)]
        stdout: Option<PathBuf>,
        /// Write stderr to this file instead of /dev/null
        #[arg(long)]
        stderr: Option<PathBuf>,
    },

    /// Run an XCTest bundle
    LaunchXctest {
        /// Path to the .xctest bundle
        #[arg(long)]
        test_bundle: PathBuf,
        /// Bundle identifier of the host application
        #[arg(long)]
        app: Option<String>,
        /// Path to the test host application
        #[arg(long)]
        test_host: Option<PathBuf>,
        /// Timeout in seconds
        #[arg(short = 'o', long)]
        timeout: Option<u64>,
        /// Only run these tests (Class/method)
        #[arg(long = "run")]
        tests_to_run: Vec<String>,
        /// Skip these tests (Class/method)
        #[arg(long = "skip")]
        tests_to_skip: Vec<String>,
        /// Base environment entry for the host app (KEY=VALUE); needs --app
        #[arg(short = 'e', long = "env", value_parser = parse_key_val, requires = "app")]
        env: Vec<(String, String)>,
    },

    /// Boot the simulator
    Boot {
        /// Locale override (e.g., en_GB)
        #[arg(long)]
        locale: Option<String>,
        /// Window scale: 25, 50, 75 or 100
        #[arg(long)]
        scale: Option<Scale>,
    },

    /// Shut the simulator down
    Shutdown,

    /// Erase all content and settings
    Erase,

    /// Install an application bundle
    Install {
        /// Path to the .app bundle
        app_path: PathBuf,
    },

    /// Uninstall an application
    Uninstall {
        /// Bundle identifier
        bundle_id: String,
    },

    /// Terminate a running application
    Terminate {
        /// Bundle identifier
        bundle_id: String,
    },

    /// Open a URL on the simulator
    OpenUrl {
        /// The URL to open
        url: String,
    },

    /// List available simulators
    List,

    /// Store the default target device (clears it when omitted or blank)
    SetDevice {
        /// Device UDID
        udid: Option<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

#[derive(Debug)]
enum CliError {
    Environment(EnvironmentError),
    Render(SimctlError),
    Output(String),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Environment(_) => ExitCode::from(1),
            CliError::Render(_) => ExitCode::from(2),
            CliError::Output(_) => ExitCode::from(3),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Environment(e) => write!(f, "Environment rejected: {}", e),
            CliError::Render(e) => write!(f, "Cannot render command: {}", e),
            CliError::Output(msg) => write!(f, "Output error: {}", msg),
        }
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

fn output_target(path: Option<PathBuf>) -> OutputTarget {
    path.map(OutputTarget::File).unwrap_or(OutputTarget::DevNull)
}

/// Translates a subcommand into the action it describes.
///
/// Returns `None` for commands that do not describe a simulator action.
fn build_action(command: Command) -> Option<Action> {
    let action = match command {
        Command::LaunchApp { bundle_id, arguments, env, wait_for_debugger, stdout, stderr } => {
            let output = OutputConfiguration::dev_null()
                .with_stdout(output_target(stdout))
                .with_stderr(output_target(stderr));
            Action::LaunchApp(ApplicationLaunchConfiguration::new(
                bundle_id,
                arguments,
                env.into_iter().collect(),
                wait_for_debugger,
                output,
            ))
        }
        Command::LaunchXctest { test_bundle, app, test_host, timeout, tests_to_run, tests_to_skip, env } => {
            let mut config = TestLaunchConfiguration::default()
                .with_test_bundle_path(test_bundle)
                .with_tests_to_run(tests_to_run.into_iter().collect::<BTreeSet<_>>())
                .with_tests_to_skip(tests_to_skip.into_iter().collect::<BTreeSet<_>>());
            if let Some(path) = test_host {
                config = config.with_test_host_path(path);
            }
            if let Some(secs) = timeout {
                config = config.with_timeout(Duration::from_secs(secs));
            }
            if let Some(bundle_id) = app {
                config = config.with_application_launch_configuration(ApplicationLaunchConfiguration::new(
                    bundle_id,
                    vec![],
                    env.into_iter().collect(),
                    false,
                    OutputConfiguration::dev_null(),
                ));
            }
            Action::LaunchXCTest(config)
        }
        Command::Boot { locale, scale } => {
            let mut config = BootConfiguration::default();
            if let Some(locale) = locale {
                config = config.with_locale(locale);
            }
            if let Some(scale) = scale {
                config = config.with_scale(scale);
            }
            Action::Boot(config)
        }
        Command::Shutdown => Action::Shutdown,
        Command::Erase => Action::Erase,
        Command::Install { app_path } => Action::Install { app_path },
        Command::Uninstall { bundle_id } => Action::Uninstall { bundle_id },
        Command::Terminate { bundle_id } => Action::Terminate { bundle_id },
        Command::OpenUrl { url } => Action::OpenUrl { url },
        Command::List => Action::List,
        Command::SetDevice { .. } => return None,
    };
    Some(action)
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = SimlaunchConfig::load();

    if let Command::SetDevice { udid } = &cli.command {
        config.set_default_device(udid.as_deref());
        config
            .save()
            .map_err(|e| CliError::Output(format!("Failed to save config: {}", e)))?;
        info!(device = ?config.default_device, "Saved default device");
        match &config.default_device {
            Some(device) => println!("Default device set to {}", device),
            None => println!("Default device cleared"),
        }
        return Ok(());
    }

    let device = config.resolve_device(cli.device.as_deref());
    let format = cli.format;
    let Some(action) = build_action(cli.command) else {
        return Ok(());
    };

    let host: Environment =
        read_environment(std::env::vars_os(), CHILD_ENV_PREFIX).map_err(CliError::Environment)?;
    let action = action.append_environment(&host);
    debug!(action = action.name(), device = %device, "Resolved action");

    match format {
        OutputFormat::Json => {
            let action = serde_json::to_value(&action).map_err(|e| CliError::Output(e.to_string()))?;
            let json = serde_json::json!({ "device": device, "action": action });
            let rendered = serde_json::to_string_pretty(&json)
                .map_err(|e| CliError::Output(e.to_string()))?;
            println!("{}", rendered);
        }
        OutputFormat::Text => {
            let invocation =
                SimctlInvocation::for_action(&action, &device).map_err(CliError::Render)?;
            println!("{}", invocation);
        }
    }
    Ok(())
}
