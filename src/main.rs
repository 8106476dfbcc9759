use clap::Parser;
use log::info;
use mcbench::{
    config::{Cli, Config},
    driver, supervise,
};
use std::env;

fn main() -> anyhow::Result<()> {
    if env::var("RUST_LOG").is_err() {
        unsafe { env::set_var("RUST_LOG", "info") };
    }
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
    let cfg = Config::load(Cli::parse())?;
    info!("benchmarking corpus {}", cfg.corpus.display());
    supervise::install_interrupt_handler();
    driver::run(&cfg)
}
