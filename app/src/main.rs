#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::Parser;
use gtk::{glib, prelude::ApplicationExtManual};

mod config;
mod core;
mod logging;
mod types;
mod ui;
mod utils;

fn main() -> glib::ExitCode {
    let args = config::Args::parse();
    logging::init(args.debug);

    let config = match config::Config::load(args) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("{err:#}");
            return glib::ExitCode::FAILURE;
        }
    };

    // options are ours, GTK only gets to see the program name
    let argv0: Vec<String> = std::env::args().take(1).collect();

    let app = ui::app::App::new(config);
    app.run_with_args(&argv0)
}
