// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thin CLI entry point. All of the actual work lives in the `rtpreplay`
//! library; see [`rtpreplay::run`].

use log::{error, info};
use structopt::StructOpt;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

#[tokio::main]
async fn main() {
    let opts = rtpreplay::cli::Opts::from_args();
    init_logging(opts.verbose);

    let exit_code = tokio::select! {
        result = rtpreplay::run(opts) => {
            match result {
                Ok(()) => {
                    info!("done");
                    0
                }
                Err(e) => {
                    error!("{e}");
                    match e.kind() {
                        rtpreplay::ErrorKind::Startup => 1,
                        rtpreplay::ErrorKind::Script => 2,
                    }
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received interrupt; exiting");
            0
        }
    };
    std::process::exit(exit_code);
}
