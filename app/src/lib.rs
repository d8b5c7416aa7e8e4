use anyhow::Result;
use log::*;
use url::Url;

use infra::persistence::FileStorage;

pub mod calculator;
pub mod config;
pub mod display;
pub mod link;
pub mod presets;
pub mod recipe;
pub mod services;
pub mod snapshot;
pub mod units;

pub use calculator::Calculator;
pub use recipe::{Ingredient, Recipe};
pub use units::Unit;

/// Opens an editing session backed by the configured on-disk store.
pub fn open(
    config: &config::Config,
    link: Option<&Url>,
) -> Result<(Calculator<FileStorage>, snapshot::Origin)> {
    let docs = config.storage.build();
    let share_base = config.share.base_url()?;
    let (calc, origin) = Calculator::open(link, docs, &config.storage.key, share_base);
    info!("Opened {:?} ({:?})", calc.recipe().title, origin);
    Ok((calc, origin))
}
