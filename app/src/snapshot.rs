use anyhow::Result;
use err_derive::Error;
use log::*;
use serde::{Deserialize, Serialize};
use url::Url;

use infra::documents::Versioned;
use infra::persistence::{Documents, Storage};

use crate::link;
use crate::presets;
use crate::recipe::{Ingredient, Recipe};
use crate::units::Unit;

/// Bump whenever the snapshot layout changes incompatibly; older snapshots
/// are then replaced by the factory default.
pub const FORMAT_VERSION: u32 = 1;

/// The persisted and shared form of a recipe. Derived masses are never part
/// of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(alias = "version")]
    pub format_version: u32,
    #[serde(default)]
    pub title: String,
    #[serde(alias = "units")]
    pub unit: Unit,
    pub total_mass: f64,
    pub formula: Vec<FormulaEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaEntry {
    #[serde(default)]
    pub name: String,
    #[serde(alias = "pct")]
    pub percentage: f64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SnapshotError {
    #[error(display = "unusable total mass: {}", _0)]
    TotalMass(f64),
    #[error(display = "unusable percentage {} at row {}", _1, _0)]
    Percentage(usize, f64),
}

/// Where the recipe in use came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Link,
    Local,
    FactoryDefault,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Versioned for Snapshot {
    const FORMAT_VERSION: u32 = FORMAT_VERSION;

    fn format_version(&self) -> u32 {
        self.format_version
    }
}

impl From<&Recipe> for Snapshot {
    fn from(recipe: &Recipe) -> Self {
        let formula = recipe
            .ingredients()
            .iter()
            .map(|ing| FormulaEntry {
                name: ing.name.clone(),
                percentage: ing.percentage,
                locked: ing.locked,
            })
            .collect();
        Snapshot {
            format_version: FORMAT_VERSION,
            title: recipe.title.clone(),
            unit: recipe.unit(),
            total_mass: recipe.total_mass(),
            formula,
        }
    }
}

impl Snapshot {
    /// Builds a recipe from this snapshot, or refuses the whole thing.
    pub fn into_recipe(self) -> Result<Recipe, SnapshotError> {
        let total = self.total_mass;
        if !total.is_finite()
            || total < 0.0
            || !self.unit.to_grams(total).is_finite()
            || !self.unit.to_ounces(total).is_finite()
        {
            return Err(SnapshotError::TotalMass(total));
        }
        let ingredients = self
            .formula
            .into_iter()
            .enumerate()
            .map(|(row, entry)| {
                if !entry.percentage.is_finite() || entry.percentage < 0.0 {
                    return Err(SnapshotError::Percentage(row, entry.percentage));
                }
                Ok(Ingredient::new(&entry.name, entry.percentage).locked(entry.locked))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Recipe::new(
            &self.title,
            self.unit,
            self.total_mass,
            ingredients,
        ))
    }
}

/// Picks the starting recipe: the shared link if it decodes, else the locally
/// saved recipe, else the factory default. Failures are logged and skipped.
pub fn load_initial<S: Storage>(
    link: Option<&Url>,
    docs: &Documents<S>,
    key: &str,
) -> (Recipe, Origin) {
    if let Some(url) = link {
        match link::recipe_from_url(url) {
            Ok(recipe) => {
                info!("Loaded {:?} from link", recipe.title);
                return (recipe, Origin::Link);
            }
            Err(e) => debug!("Ignoring link settings: {:#}", e),
        }
    }

    match load_local(docs, key) {
        Ok(Some(recipe)) => {
            info!("Loaded {:?} from {}", recipe.title, key);
            return (recipe, Origin::Local);
        }
        Ok(None) => debug!("No saved recipe under {}", key),
        Err(e) => warn!("Ignoring saved recipe under {}: {:#}", key, e),
    }

    (presets::factory_default(), Origin::FactoryDefault)
}

pub fn load_local<S: Storage>(docs: &Documents<S>, key: &str) -> Result<Option<Recipe>> {
    match docs.load::<Snapshot>(key)? {
        Some(snapshot) => Ok(Some(snapshot.into_recipe()?)),
        None => Ok(None),
    }
}

pub fn save_local<S: Storage>(docs: &Documents<S>, key: &str, recipe: &Recipe) -> Result<()> {
    docs.save(key, &Snapshot::from(recipe))
}
