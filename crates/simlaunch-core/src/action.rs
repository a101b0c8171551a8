//! Actions that can be performed against a simulator.
//!
//! An [`Action`] wraps the configuration of exactly one operation. Only three
//! variants carry a child environment: [`Action::LaunchApp`],
//! [`Action::LaunchXCTest`] and [`Action::Boot`]. The rest pass through
//! [`Action::append_environment`] unchanged.
//!
//! # Example
//!
//! ```
//! use simlaunch_core::action::Action;
//! use simlaunch_core::configuration::BootConfiguration;
//! use simlaunch_core::environment::Environment;
//!
//! let host: Environment = [
//!     ("FBSIMCTL_CHILD_FOO".to_string(), "BAR".to_string()),
//!     ("PATH".to_string(), "IGNORE".to_string()),
//! ]
//! .into_iter()
//! .collect();
//!
//! let action = Action::Boot(BootConfiguration::default()).append_environment(&host);
//! if let Action::Boot(config) = action {
//!     assert_eq!(config.boot_environment.get("FOO").map(String::as_str), Some("BAR"));
//! }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::configuration::{ApplicationLaunchConfiguration, BootConfiguration, TestLaunchConfiguration};
use crate::environment::{derive_overlay, Environment, EnvironmentAdditions, CHILD_ENV_PREFIX};

/// Operations that can be performed on a simulator.
///
/// Serialized as JSON with a `type` tag discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Launch an application.
    LaunchApp(ApplicationLaunchConfiguration),

    /// Run an XCTest bundle, hosted by an application launch.
    #[serde(rename = "launch_xctest")]
    LaunchXCTest(TestLaunchConfiguration),

    /// Boot the simulator.
    Boot(BootConfiguration),

    /// Shut the simulator down.
    Shutdown,

    /// Erase all content and settings.
    Erase,

    /// Install an application bundle.
    Install {
        /// Path to the `.app` bundle on the host.
        app_path: PathBuf,
    },

    /// Uninstall an application.
    Uninstall {
        bundle_id: String,
    },

    /// Terminate a running application.
    Terminate {
        bundle_id: String,
    },

    /// Open a URL on the simulator.
    OpenUrl {
        url: String,
    },

    /// List available simulators.
    List,
}

impl Action {
    /// Returns a short, static name for this action, for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Action::LaunchApp(_) => "launch_app",
            Action::LaunchXCTest(_) => "launch_xctest",
            Action::Boot(_) => "boot",
            Action::Shutdown => "shutdown",
            Action::Erase => "erase",
            Action::Install { .. } => "install",
            Action::Uninstall { .. } => "uninstall",
            Action::Terminate { .. } => "terminate",
            Action::OpenUrl { .. } => "open_url",
            Action::List => "list",
        }
    }

    /// Propagates child-marked variables from a host environment into this action.
    ///
    /// Entries of `host` prefixed with [`CHILD_ENV_PREFIX`] are stripped of the
    /// prefix and merged into the environment of the wrapped configuration,
    /// overriding entries with the same name. For an XCTest launch the hosted
    /// application launch receives them. Variants without an environment are
    /// returned unchanged.
    pub fn append_environment(&self, host: &Environment) -> Action {
        let overlay = derive_overlay(host, CHILD_ENV_PREFIX);
        debug!(action = self.name(), keys = overlay.len(), "Appending child environment");

        match self {
            Action::LaunchApp(config) => Action::LaunchApp(config.with_environment_additions(&overlay)),
            Action::LaunchXCTest(config) => Action::LaunchXCTest(config.with_environment_additions(&overlay)),
            Action::Boot(config) => Action::Boot(config.with_boot_environment_additions(&overlay)),
            // No environment to extend; listed individually so a new variant
            // has to be classified here.
            Action::Shutdown
            | Action::Erase
            | Action::Install { .. }
            | Action::Uninstall { .. }
            | Action::Terminate { .. }
            | Action::OpenUrl { .. }
            | Action::List => self.clone(),
        }
    }
}
