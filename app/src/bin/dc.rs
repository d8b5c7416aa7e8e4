use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::*;
use serde::Deserialize;
use structopt::StructOpt;
use url::Url;

use doughcalc::calculator::*;
use doughcalc::config::{EnvLogger, EnvOverrides};
use doughcalc::presets::PresetId;
use doughcalc::services::{Commandable, Queryable};
use doughcalc::Unit;

#[derive(Debug, StructOpt)]
#[structopt(name = "dc", about = "Baker's percentage dough calculator")]
struct Opt {
    /// Config file
    #[structopt(short = "c", long = "config", parse(from_os_str))]
    config: Option<PathBuf>,
    #[structopt(subcommand)]
    command: Commands,
}

#[derive(Debug, StructOpt)]
enum Commands {
    #[structopt(name = "show", about = "Show the current recipe")]
    Show,
    #[structopt(name = "presets", about = "List factory presets")]
    Presets,
    #[structopt(name = "preset", about = "Replace the recipe with a factory preset")]
    Preset { id: PresetId },
    #[structopt(name = "total-mass", about = "Set the batch size")]
    TotalMass { value: String },
    #[structopt(name = "unit", about = "Express the batch size in g or oz")]
    Unit { unit: Unit },
    #[structopt(name = "grams", about = "Scale the batch so a row weighs this many grams")]
    Grams { row: usize, value: String },
    #[structopt(name = "ounces", about = "Scale the batch so a row weighs this many ounces")]
    Ounces { row: usize, value: String },
    #[structopt(name = "percent", about = "Set a row's baker's percentage")]
    Percent { row: usize, value: String },
    #[structopt(name = "name", about = "Rename a row (+ inserts, - removes)")]
    Name { row: usize, name: String },
    #[structopt(name = "insert", about = "Insert an empty row (default: at the end)")]
    Insert { row: Option<usize> },
    #[structopt(name = "remove", about = "Remove a row (default: the last)")]
    Remove { row: Option<usize> },
    #[structopt(name = "link", about = "Print a link that carries this recipe")]
    Link,
    #[structopt(name = "open", about = "Load the recipe carried by a link")]
    Open { url: Url },
}

#[derive(Deserialize, Debug, Default)]
struct Config {
    #[serde(flatten)]
    doughcalc: doughcalc::config::Config,
    #[serde(default)]
    env_logger: EnvLogger,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let path = match path {
        Some(path) => path,
        None => return Ok(Config::default()),
    };
    let mut config_buf = String::new();
    File::open(path)
        .with_context(|| format!("open {:?}", path))?
        .read_to_string(&mut config_buf)?;
    let config = toml::from_str(&config_buf).with_context(|| format!("parse {:?}", path))?;
    Ok(config)
}

fn report(outcome: Outcome) {
    match outcome {
        Outcome::Applied => {}
        Outcome::Unparseable(field, text) => eprintln!("Not a number for {:?}: {:?}", field, text),
        Outcome::Refused(e) => eprintln!("Ignored: {}", e),
    }
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    let mut config = load_config(opt.config.as_ref())?;
    config.env_logger.builder().init();
    config.doughcalc.apply(EnvOverrides::from_env()?);
    debug!("Options: {:?}; config: {:?}", opt, config);

    let (mut calc, _) = doughcalc::open(&config.doughcalc, None)?;

    match opt.command {
        Commands::Show => {}
        Commands::Presets => {
            for (id, title) in calc.query(ListPresets)? {
                println!("{}: {} ({})", id.index(), id, title);
            }
            return Ok(());
        }
        Commands::Preset { id } => report(calc.execute(SelectPreset(id))?),
        Commands::TotalMass { value } => report(calc.execute(SetTotalMass(value))?),
        Commands::Unit { unit } => report(calc.execute(ChangeUnit(unit))?),
        Commands::Grams { row, value } => report(calc.execute(EditMass {
            row,
            unit: Unit::Grams,
            text: value,
        })?),
        Commands::Ounces { row, value } => report(calc.execute(EditMass {
            row,
            unit: Unit::Ounces,
            text: value,
        })?),
        Commands::Percent { row, value } => {
            report(calc.execute(EditPercentage { row, text: value })?)
        }
        Commands::Name { row, name } => report(calc.execute(EditName { row, name })?),
        Commands::Insert { row } => report(calc.execute(InsertRow(row))?),
        Commands::Remove { row } => report(calc.execute(RemoveRow(row))?),
        Commands::Link => {
            println!("{}", calc.query(ShareLink)?);
            return Ok(());
        }
        Commands::Open { url } => {
            let origin = calc.execute(OpenLink(url))?;
            info!("Recipe now from {:?}", origin);
        }
    }

    print!("{}", calc.query(ShowRecipe)?);
    Ok(())
}
