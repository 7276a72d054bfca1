use anyhow::Context;
use clap::Parser;
use log::info;

use orbitscape::{Args, ViewerApp};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse()
        .resolve()
        .context("invalid command line options")?;
    info!(
        "Starting {:?} preset: {} toruses, {} cubes, text {}",
        config.preset,
        config.recipe.donuts,
        config.recipe.cubes,
        if config.recipe.text.is_some() { "on" } else { "off" }
    );

    let app = ViewerApp::new(config).context("failed to create the event loop")?;
    app.run().context("viewer exited with an error")
}
