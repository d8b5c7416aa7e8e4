use std::fmt;

use err_derive::Error;
use lazy_static::lazy_static;

use crate::recipe::{Ingredient, Recipe};
use crate::units::Unit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresetId {
    Straight,
    WholeGrain,
    PateFermentee,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(display = "no such preset: {:?}", _0)]
pub struct UnknownPreset(pub String);

pub struct Preset {
    pub id: PresetId,
    recipe: Recipe,
}

lazy_static! {
    static ref PRESETS: Vec<Preset> = vec![
        Preset {
            id: PresetId::Straight,
            recipe: Recipe::new(
                "Straight Bread Dough",
                Unit::Grams,
                1000.0,
                vec![
                    Ingredient::new("Flour", 100.0),
                    Ingredient::new("Salt", 2.0),
                    Ingredient::new("Yeast", 0.65),
                    Ingredient::new("Water", 68.0),
                ],
            ),
        },
        Preset {
            id: PresetId::WholeGrain,
            recipe: Recipe::new(
                "Whole Grain",
                Unit::Grams,
                1000.0,
                vec![
                    Ingredient::new("Bread Flour", 90.0),
                    Ingredient::new("Wheat/Rye/Etc", 10.0),
                    Ingredient::new("Salt", 2.0),
                    Ingredient::new("Yeast", 0.70),
                    Ingredient::new("Water", 72.0),
                ],
            ),
        },
        Preset {
            id: PresetId::PateFermentee,
            recipe: Recipe::new(
                "P\u{e2}te Ferment\u{e9}e Mix",
                Unit::Grams,
                1000.0,
                vec![
                    Ingredient::new("Flour", 100.0),
                    Ingredient::new("Salt", 3.0),
                    Ingredient::new("Yeast", 0.60),
                    Ingredient::new("Water", 68.0),
                    Ingredient::new("P\u{e2}te Ferment\u{e9}e", 100.0),
                ],
            ),
        },
    ];
}

impl PresetId {
    pub const ALL: [PresetId; 3] = [
        PresetId::Straight,
        PresetId::WholeGrain,
        PresetId::PateFermentee,
    ];

    pub fn index(self) -> usize {
        match self {
            PresetId::Straight => 0,
            PresetId::WholeGrain => 1,
            PresetId::PateFermentee => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PresetId::Straight => "straight",
            PresetId::WholeGrain => "whole-grain",
            PresetId::PateFermentee => "pate-fermentee",
        }
    }
}

impl Default for PresetId {
    fn default() -> Self {
        PresetId::Straight
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.name())
    }
}

impl std::str::FromStr for PresetId {
    type Err = UnknownPreset;
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let src = src.trim();
        if let Ok(idx) = src.parse::<usize>() {
            return PresetId::ALL
                .get(idx)
                .copied()
                .ok_or_else(|| UnknownPreset(src.to_string()));
        }
        PresetId::ALL
            .iter()
            .copied()
            .find(|id| id.name().eq_ignore_ascii_case(src))
            .ok_or_else(|| UnknownPreset(src.to_string()))
    }
}

/// Every factory preset, in display order.
pub fn presets() -> &'static [Preset] {
    &PRESETS
}

impl Preset {
    pub fn title(&self) -> &str {
        &self.recipe.title
    }
}

/// A fresh, independent copy of a factory formula.
pub fn load_preset(id: PresetId) -> Recipe {
    PRESETS[id.index()].recipe.clone()
}

pub fn factory_default() -> Recipe {
    load_preset(PresetId::default())
}
