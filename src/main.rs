mod app;
mod color;
mod config;
mod input;
mod motion;
mod noise;
mod projector;
mod render;
mod scene;
mod terrain;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = config::Cli::parse();
    app::run(cli)
}
