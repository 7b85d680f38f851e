use lentil::run_score::*;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let args = ScoreArgs::parse();

    if args.verbose {
        std::env::set_var("RUST_LOG", "info");
    } else if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "warn");
    }
    env_logger::init();

    run_network_score(&args)?;
    Ok(())
}
