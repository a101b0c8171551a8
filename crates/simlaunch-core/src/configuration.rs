//! Configuration values describing how to launch processes and boot simulators.
//!
//! Every type here is an immutable value. Builders named `with_*` take `&self`
//! and return a modified copy, so a configuration can be shared freely and
//! specialised per action.
//!
//! # Example
//!
//! ```
//! use simlaunch_core::configuration::{ApplicationLaunchConfiguration, OutputConfiguration};
//! use simlaunch_core::environment::{Environment, EnvironmentAdditions};
//!
//! let launch = ApplicationLaunchConfiguration::new(
//!     "com.example.MyApp",
//!     vec![],
//!     Environment::new(),
//!     false,
//!     OutputConfiguration::dev_null(),
//! );
//!
//! let overlay: Environment = [("FOO".to_string(), "BAR".to_string())].into_iter().collect();
//! let updated = launch.with_environment_additions(&overlay);
//! assert!(launch.environment.is_empty());
//! assert_eq!(updated.environment.len(), 1);
//! ```

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::environment::{merge_environment, Environment, EnvironmentAdditions};

/// Where one output stream of a launched process goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputTarget {
    /// Discard the stream.
    #[default]
    DevNull,

    /// Write the stream to a file on the host.
    File(PathBuf),
}

/// Output routing for a launched process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OutputConfiguration {
    pub stdout: OutputTarget,
    pub stderr: OutputTarget,
}

impl OutputConfiguration {
    /// Routes both streams to `/dev/null`.
    pub fn dev_null() -> Self {
        Self {
            stdout: OutputTarget::DevNull,
            stderr: OutputTarget::DevNull,
        }
    }

    pub fn with_stdout(&self, target: OutputTarget) -> Self {
        Self {
            stdout: target,
            ..self.clone()
        }
    }

    pub fn with_stderr(&self, target: OutputTarget) -> Self {
        Self {
            stderr: target,
            ..self.clone()
        }
    }
}

/// Describes how to launch an application on a simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationLaunchConfiguration {
    /// Bundle identifier of the application (e.g., "com.example.MyApp").
    pub bundle_id: String,

    /// Arguments passed to the application's `main`.
    pub arguments: Vec<String>,

    /// Environment of the launched process.
    pub environment: Environment,

    /// Suspend the process at launch until a debugger attaches.
    pub wait_for_debugger: bool,

    /// Where stdout and stderr go.
    pub output: OutputConfiguration,
}

impl ApplicationLaunchConfiguration {
    pub fn new(
        bundle_id: impl Into<String>,
        arguments: Vec<String>,
        environment: Environment,
        wait_for_debugger: bool,
        output: OutputConfiguration,
    ) -> Self {
        Self {
            bundle_id: bundle_id.into(),
            arguments,
            environment,
            wait_for_debugger,
            output,
        }
    }

    /// Returns a copy with the arguments replaced.
    pub fn with_arguments(&self, arguments: Vec<String>) -> Self {
        Self {
            arguments,
            ..self.clone()
        }
    }

    /// Returns a copy with the output routing replaced.
    pub fn with_output(&self, output: OutputConfiguration) -> Self {
        Self {
            output,
            ..self.clone()
        }
    }
}

impl EnvironmentAdditions for ApplicationLaunchConfiguration {
    fn with_environment_additions(&self, overlay: &Environment) -> Self {
        Self {
            environment: merge_environment(&self.environment, overlay),
            ..self.clone()
        }
    }
}

/// Describes an XCTest run, optionally hosted by an application launch.
///
/// [`Default`] yields an empty configuration; the `with_*` builders fill it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TestLaunchConfiguration {
    /// Path to the `.xctest` bundle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_bundle_path: Option<PathBuf>,

    /// The application launch hosting the tests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_launch_configuration: Option<ApplicationLaunchConfiguration>,

    /// Path to the test host application, when distinct from the launched app.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_host_path: Option<PathBuf>,

    /// Upper bound on the test run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tests_to_run: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tests_to_skip: BTreeSet<String>,
}

impl TestLaunchConfiguration {
    pub fn with_application_launch_configuration(
        &self,
        launch: ApplicationLaunchConfiguration,
    ) -> Self {
        Self {
            application_launch_configuration: Some(launch),
            ..self.clone()
        }
    }

    pub fn with_test_bundle_path(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            test_bundle_path: Some(path.into()),
            ..self.clone()
        }
    }

    pub fn with_test_host_path(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            test_host_path: Some(path.into()),
            ..self.clone()
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self.clone()
        }
    }

    pub fn with_tests_to_run(&self, tests: BTreeSet<String>) -> Self {
        Self {
            tests_to_run: tests,
            ..self.clone()
        }
    }

    pub fn with_tests_to_skip(&self, tests: BTreeSet<String>) -> Self {
        Self {
            tests_to_skip: tests,
            ..self.clone()
        }
    }
}

impl EnvironmentAdditions for TestLaunchConfiguration {
    /// Applies the overlay to the hosted application launch only.
    ///
    /// Without a hosted launch there is nowhere to put the overlay, and an
    /// equal copy is returned.
    fn with_environment_additions(&self, overlay: &Environment) -> Self {
        match &self.application_launch_configuration {
            Some(launch) => {
                self.with_application_launch_configuration(launch.with_environment_additions(overlay))
            }
            None => self.clone(),
        }
    }
}

/// Display scale of a booted simulator window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    Percent25,
    Percent50,
    Percent75,
    Percent100,
}

impl Scale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scale::Percent25 => "25",
            Scale::Percent50 => "50",
            Scale::Percent75 => "75",
            Scale::Percent100 => "100",
        }
    }
}

impl std::str::FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_end_matches('%') {
            "25" => Ok(Scale::Percent25),
            "50" => Ok(Scale::Percent50),
            "75" => Ok(Scale::Percent75),
            "100" => Ok(Scale::Percent100),
            other => Err(format!("unsupported scale '{}', expected 25, 50, 75 or 100", other)),
        }
    }
}

/// Behaviour toggles applied while booting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootOption {
    /// Wait for the simulator's system services before reporting booted.
    AwaitServices,
    /// Boot without a Simulator.app window.
    Headless,
    /// Verify the device is usable after boot.
    VerifyUsable,
}

/// Describes how to boot a simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootConfiguration {
    /// Locale identifier override (e.g., "en_GB").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Scale>,

    pub options: BTreeSet<BootOption>,

    /// Environment handed to the simulator's launchd.
    pub boot_environment: Environment,
}

impl Default for BootConfiguration {
    fn default() -> Self {
        Self {
            locale: None,
            scale: None,
            options: BTreeSet::from([BootOption::AwaitServices]),
            boot_environment: Environment::new(),
        }
    }
}

impl BootConfiguration {
    /// Returns a copy whose boot environment is exactly `environment`.
    pub fn with_boot_environment(&self, environment: Environment) -> Self {
        Self {
            boot_environment: environment,
            ..self.clone()
        }
    }

    /// Returns a copy with `overlay` merged into the boot environment.
    pub fn with_boot_environment_additions(&self, overlay: &Environment) -> Self {
        self.with_boot_environment(merge_environment(&self.boot_environment, overlay))
    }

    pub fn with_locale(&self, locale: impl Into<String>) -> Self {
        Self {
            locale: Some(locale.into()),
            ..self.clone()
        }
    }

    pub fn with_scale(&self, scale: Scale) -> Self {
        Self {
            scale: Some(scale),
            ..self.clone()
        }
    }

    pub fn with_options(&self, options: BTreeSet<BootOption>) -> Self {
        Self {
            options,
            ..self.clone()
        }
    }
}

impl EnvironmentAdditions for BootConfiguration {
    fn with_environment_additions(&self, overlay: &Environment) -> Self {
        self.with_boot_environment_additions(overlay)
    }
}
