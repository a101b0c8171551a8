//! # simlaunch-core
//!
//! Core library for describing iOS Simulator actions and the environment
//! their child processes receive.
//!
//! The host process marks variables meant for the launched process with the
//! `FBSIMCTL_CHILD_` prefix. This crate filters those variables, strips the
//! prefix, and merges them into whichever configuration an [`action::Action`]
//! carries. Nothing here talks to a simulator; [`simctl`] only renders the
//! command a caller would run.
//!
//! ## Modules
//!
//! - [`environment`] - Child environment filtering and merging
//! - [`configuration`] - Launch, test-launch and boot configuration values
//! - [`action`] - The [`action::Action`] union and environment propagation
//! - [`simctl`] - Rendering actions as `xcrun simctl` invocations
//! - [`config`] - Persistent user configuration
//!
//! ## Example
//!
//! ```
//! use simlaunch_core::action::Action;
//! use simlaunch_core::configuration::{ApplicationLaunchConfiguration, OutputConfiguration};
//! use simlaunch_core::environment::Environment;
//! use simlaunch_core::simctl::SimctlInvocation;
//!
//! let host: Environment = [("FBSIMCTL_CHILD_API_URL".to_string(), "http://localhost".to_string())]
//!     .into_iter()
//!     .collect();
//!
//! let launch = ApplicationLaunchConfiguration::new(
//!     "com.example.MyApp",
//!     vec![],
//!     Environment::new(),
//!     false,
//!     OutputConfiguration::dev_null(),
//! );
//!
//! let action = Action::LaunchApp(launch).append_environment(&host);
//! let invocation = SimctlInvocation::for_action(&action, "booted").unwrap();
//! assert_eq!(
//!     invocation.to_shell_line(),
//!     "SIMCTL_CHILD_API_URL=http://localhost xcrun simctl launch booted com.example.MyApp"
//! );
//! ```

pub mod action;
pub mod config;
pub mod configuration;
pub mod environment;
pub mod simctl;
