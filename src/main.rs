//! Binary entry point for `update-stemcell`.

use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    if let Err(e) = update_stemcell::run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
