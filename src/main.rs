/*
 *  main.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  One render pass per invocation; schedule it with cron or a systemd timer
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{debug, info};

use dayboard::config::{self, Cli};
use dayboard::display::{sink, DisplayDriverFactory};
use dayboard::Dashboard;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load(&cli).context("loading configuration")?;

    let level = config.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("{} - the day at a glance", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);
    debug!("Timezone {}, locale {:?}", config.timezone(), config.locale());

    let mut driver = DisplayDriverFactory::create_from_config(&config).context("opening display")?;

    if cli.clear {
        sink::clear(driver.as_mut()).context("clearing display")?;
        return Ok(());
    }

    let dashboard = Dashboard::new(config).context("loading fonts and images")?;
    let report = dashboard
        .run(driver.as_mut())
        .await
        .context("render pass failed")?;

    for span in &report.regions {
        debug!("{:?}: {}..{}", span.region, span.top, span.bottom);
    }
    info!("Done");
    Ok(())
}
