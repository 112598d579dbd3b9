use clap::Parser;

use cf_ssh::api::CfCli;
use cf_ssh::cli::Options;
use cf_ssh::{init_logging, run, Error};

#[tokio::main]
async fn main() {
    init_logging();

    let opts = Options::parse();
    let control_plane = CfCli::new();

    match run(&opts, &control_plane).await {
        Ok(status) => std::process::exit(status as i32),
        Err(err) => {
            eprintln!("FAILED\n{err}");
            if let Error::Ssh(ref ssh_err) = err {
                if ssh_err.is_host_key_failure() {
                    eprintln!(
                        "The endpoint's host key could not be verified. \
                         Re-run with --skip-host-validation only if you trust the network path."
                    );
                }
            }
            std::process::exit(1);
        }
    }
}
