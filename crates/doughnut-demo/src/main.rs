use anyhow::Context;
use clap::Parser;
use doughnut_demo::config;
use doughnut_demo::gui::app::{AppInit, AppModel};
use doughnut_demo::sys::runtime;
use relm4::prelude::*;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Animated doughnut chart demo")]
struct Args {
    /// Config file to load and watch
    #[arg(long)]
    config: Option<PathBuf>,

    /// Segment values overriding the config, e.g. 10,20,30,40
    #[arg(long, value_delimiter = ',')]
    values: Option<Vec<f64>>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let path = match args.config {
        Some(path) => path,
        None => config::get_config_path()?,
    };

    let mut chart = config::load_or_default(&path).chart;
    if let Some(values) = args.values {
        chart = chart.with_values(values);
    }
    chart
        .validate()
        .with_context(|| format!("invalid chart config in {}", path.display()))?;

    let (tx, rx) = async_channel::bounded(32);

    // Start Background Services
    runtime::start_background_services(tx, path.clone());

    RelmApp::new("org.doughnut.demo")
        .with_args(Vec::new())
        .run::<AppModel>(AppInit {
            path,
            chart,
            events: rx,
        });

    Ok(())
}
