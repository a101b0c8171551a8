//! Rendering of actions as `xcrun simctl` invocations.
//!
//! Nothing here executes a command. [`SimctlInvocation::for_action`] describes
//! the call that would perform an [`Action`], which callers can print, log, or
//! hand to a process runner of their own.
//!
//! simctl forwards variables prefixed with [`SIMCTL_CHILD_PREFIX`] into the
//! launched process, so environments are rendered with that prefix.
//!
//! # Example
//!
//! ```
//! use simlaunch_core::action::Action;
//! use simlaunch_core::simctl::SimctlInvocation;
//!
//! let invocation = SimctlInvocation::for_action(&Action::Shutdown, "booted").unwrap();
//! assert_eq!(invocation.to_shell_line(), "xcrun simctl shutdown booted");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::Action;
use crate::configuration::{ApplicationLaunchConfiguration, OutputTarget};
use crate::environment::Environment;

/// Prefix simctl strips before handing a variable to the launched process.
pub const SIMCTL_CHILD_PREFIX: &str = "SIMCTL_CHILD_";

/// Errors that can occur when rendering an action for simctl.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SimctlError {
    /// simctl has no subcommand for this action.
    #[error("simctl cannot perform '{0}'")]
    Unsupported(&'static str),

    /// A forwarded variable name is not a valid shell identifier.
    #[error("Invalid environment variable name: {0:?}")]
    InvalidVariableName(String),
}

/// A fully described `xcrun simctl` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimctlInvocation {
    /// Executable to run; always `xcrun`.
    pub program: String,

    /// Arguments, starting with `simctl`.
    pub args: Vec<String>,

    /// Variables to set on the simctl process itself.
    pub env: Environment,
}

impl SimctlInvocation {
    fn simctl<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut all = vec!["simctl".to_string()];
        all.extend(args.into_iter().map(Into::into));
        Self {
            program: "xcrun".to_string(),
            args: all,
            env: Environment::new(),
        }
    }

    fn with_child_environment(mut self, environment: &Environment) -> Result<Self, SimctlError> {
        self.env = environment
            .iter()
            .map(|(key, value)| {
                let name = format!("{}{}", SIMCTL_CHILD_PREFIX, key);
                if is_variable_name(&name) {
                    Ok((name, value.clone()))
                } else {
                    Err(SimctlError::InvalidVariableName(key.clone()))
                }
            })
            .collect::<Result<Environment, SimctlError>>()?;
        Ok(self)
    }

    /// Describes the simctl call performing `action` on `device`.
    ///
    /// `device` is a UDID or the literal `booted`.
    ///
    /// # Errors
    ///
    /// - [`SimctlError::Unsupported`] for XCTest runs, which simctl cannot drive
    /// - [`SimctlError::InvalidVariableName`] if a forwarded name is not `[A-Za-z_][A-Za-z0-9_]*`
    pub fn for_action(action: &Action, device: &str) -> Result<Self, SimctlError> {
        let invocation = match action {
            Action::LaunchApp(config) => Self::launch(config, device)?,
            Action::LaunchXCTest(_) => return Err(SimctlError::Unsupported(action.name())),
            Action::Boot(config) => {
                Self::simctl(["boot", device]).with_child_environment(&config.boot_environment)?
            }
            Action::Shutdown => Self::simctl(["shutdown", device]),
            Action::Erase => Self::simctl(["erase", device]),
            Action::Install { app_path } => Self::simctl([
                "install".to_string(),
                device.to_string(),
                app_path.display().to_string(),
            ]),
            Action::Uninstall { bundle_id } => Self::simctl(["uninstall", device, bundle_id.as_str()]),
            Action::Terminate { bundle_id } => Self::simctl(["terminate", device, bundle_id.as_str()]),
            Action::OpenUrl { url } => Self::simctl(["openurl", device, url.as_str()]),
            Action::List => Self::simctl(["list", "devices", "-j"]),
        };
        Ok(invocation)
    }

    fn launch(config: &ApplicationLaunchConfiguration, device: &str) -> Result<Self, SimctlError> {
        let mut args = vec!["launch".to_string()];
        if config.wait_for_debugger {
            args.push("--wait-for-debugger".to_string());
        }
        if let OutputTarget::File(path) = &config.output.stdout {
            args.push(format!("--stdout={}", path.display()));
        }
        if let OutputTarget::File(path) = &config.output.stderr {
            args.push(format!("--stderr={}", path.display()));
        }
        args.push(device.to_string());
        args.push(config.bundle_id.clone());
        args.extend(config.arguments.iter().cloned());

        Self::simctl(args).with_child_environment(&config.environment)
    }

    /// Renders the invocation as one shell command line.
    pub fn to_shell_line(&self) -> String {
        let mut parts: Vec<String> = self
            .env
            .iter()
            .map(|(key, value)| format!("{}={}", key, shell_escape(value)))
            .collect();
        parts.push(shell_escape(&self.program));
        parts.extend(self.args.iter().map(|a| shell_escape(a)));
        parts.join(" ")
    }
}

impl fmt::Display for SimctlInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_shell_line())
    }
}

fn is_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn shell_escape(s: &str) -> String {
    if !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '=' | ':' | ',')
        })
    {
        // Safe to use unquoted
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::{BootConfiguration, OutputConfiguration, TestLaunchConfiguration};
    use std::path::PathBuf;

    fn env(pairs: &[(&str, &str)]) -> Environment {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_launch_app_invocation() {
        let config = ApplicationLaunchConfiguration::new(
            "com.example.App",
            vec!["-AppleLanguages".to_string(), "(en)".to_string()],
            env(&[("FOO", "BAR")]),
            true,
            OutputConfiguration::dev_null().with_stdout(OutputTarget::File(PathBuf::from("/tmp/out.log"))),
        );
        let invocation = SimctlInvocation::for_action(&Action::LaunchApp(config), "booted").unwrap();

        assert_eq!(invocation.program, "xcrun");
        assert_eq!(
            invocation.args,
            vec![
                "simctl",
                "launch",
                "--wait-for-debugger",
                "--stdout=/tmp/out.log",
                "booted",
                "com.example.App",
                "-AppleLanguages",
                "(en)",
            ]
        );
        assert_eq!(invocation.env, env(&[("SIMCTL_CHILD_FOO", "BAR")]));
        assert_eq!(
            invocation.to_shell_line(),
            "SIMCTL_CHILD_FOO=BAR xcrun simctl launch --wait-for-debugger --stdout=/tmp/out.log booted com.example.App -AppleLanguages '(en)'"
        );
    }

    #[test]
    fn test_boot_invocation_forwards_boot_environment() {
        let config = BootConfiguration::default().with_boot_environment(env(&[("BING", "BONG")]));
        let invocation = SimctlInvocation::for_action(&Action::Boot(config), "A1B2").unwrap();
        assert_eq!(invocation.args, vec!["simctl", "boot", "A1B2"]);
        assert_eq!(invocation.env, env(&[("SIMCTL_CHILD_BING", "BONG")]));
    }

    #[test]
    fn test_xctest_is_unsupported() {
        let action = Action::LaunchXCTest(TestLaunchConfiguration::default());
        let err = SimctlInvocation::for_action(&action, "booted").unwrap_err();
        assert_eq!(err, SimctlError::Unsupported("launch_xctest"));
        assert!(err.to_string().contains("launch_xctest"));
    }

    #[test]
    fn test_simple_subcommands() {
        let cases = vec![
            (Action::Shutdown, "xcrun simctl shutdown booted"),
            (Action::Erase, "xcrun simctl erase booted"),
            (
                Action::Install { app_path: PathBuf::from("/tmp/My App.app") },
                "xcrun simctl install booted '/tmp/My App.app'",
            ),
            (
                Action::Uninstall { bundle_id: "com.example.App".to_string() },
                "xcrun simctl uninstall booted com.example.App",
            ),
            (
                Action::Terminate { bundle_id: "com.example.App".to_string() },
                "xcrun simctl terminate booted com.example.App",
            ),
            (
                Action::OpenUrl { url: "myapp://home?tab=1".to_string() },
                "xcrun simctl openurl booted 'myapp://home?tab=1'",
            ),
            (Action::List, "xcrun simctl list devices -j"),
        ];
        for (action, expected) in cases {
            let invocation = SimctlInvocation::for_action(&action, "booted").unwrap();
            assert_eq!(invocation.to_shell_line(), expected, "{}", action.name());
            assert!(invocation.env.is_empty());
        }
    }

    #[test]
    fn test_unsafe_variable_name_is_rejected() {
        let config = ApplicationLaunchConfiguration::new(
            "com.example.App",
            vec![],
            env(&[("X;touch /tmp/owned", "1")]),
            false,
            OutputConfiguration::dev_null(),
        );
        let err = SimctlInvocation::for_action(&Action::LaunchApp(config), "booted").unwrap_err();
        assert_eq!(err, SimctlError::InvalidVariableName("X;touch /tmp/owned".to_string()));

        let config = BootConfiguration::default().with_boot_environment(env(&[("HAS SPACE", "1")]));
        let err = SimctlInvocation::for_action(&Action::Boot(config), "booted").unwrap_err();
        assert_eq!(err, SimctlError::InvalidVariableName("HAS SPACE".to_string()));
    }

    #[test]
    fn test_variable_name_rules() {
        assert!(is_variable_name("SIMCTL_CHILD_FOO_1"));
        assert!(is_variable_name("_private"));
        assert!(!is_variable_name("1ABC"));
        assert!(!is_variable_name("A-B"));
        assert!(!is_variable_name("A=B"));
        assert!(!is_variable_name(""));
    }

    #[test]
    fn test_shell_escape() {
        assert_eq!(shell_escape("plain-value_1.0"), "plain-value_1.0");
        assert_eq!(shell_escape("hello world"), "'hello world'");
        assert_eq!(shell_escape("it's"), "'it'\\''s'");
        assert_eq!(shell_escape(""), "''");
    }

    #[test]
    fn test_display_matches_shell_line() {
        let invocation = SimctlInvocation::for_action(&Action::Erase, "booted").unwrap();
        assert_eq!(invocation.to_string(), invocation.to_shell_line());
    }
}
