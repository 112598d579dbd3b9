//! Command-line surface

use clap::Parser;

/// ssh to an application container instance
#[derive(Debug, Parser)]
#[command(name = "cf-ssh", version)]
pub struct Options {
    /// Name of the target application
    pub app_name: String,

    /// Instance index of the target container
    #[arg(short = 'i', long = "instance", default_value_t = 0)]
    pub instance: u32,

    /// Accept the endpoint's host key without verifying it
    #[arg(
        long = "skip-host-validation",
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true",
        action = clap::ArgAction::Set
    )]
    pub skip_host_validation: bool,
}
