//! A single editing session over one recipe.
//!
//! Every command runs to completion before the next: parse the input, apply
//! it to the recipe, then save a snapshot. Saving is best-effort; a failure
//! is logged and the in-memory edit stands.

use anyhow::Result;
use log::*;
use url::Url;

use infra::persistence::{Documents, Storage};

use crate::display::{Field, FieldFlags, RecipeView};
use crate::link;
use crate::presets::{self, PresetId};
use crate::recipe::{EditError, Recipe};
use crate::services::{Commandable, Queryable, Request};
use crate::snapshot::{self, Origin};
use crate::units::Unit;

pub struct Calculator<S> {
    recipe: Recipe,
    flags: FieldFlags,
    docs: Documents<S>,
    key: String,
    share_base: Url,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied,
    /// The text typed into `Field` was not a usable number.
    Unparseable(Field, String),
    Refused(EditError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetTotalMass(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeUnit(pub Unit);

#[derive(Debug, Clone, PartialEq)]
pub struct EditMass {
    pub row: usize,
    pub unit: Unit,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditPercentage {
    pub row: usize,
    pub text: String,
}

/// Renames a row. A lone `+` inserts a new row here instead, and a lone `-`
/// removes this row.
#[derive(Debug, Clone, PartialEq)]
pub struct EditName {
    pub row: usize,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertRow(pub Option<usize>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveRow(pub Option<usize>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectPreset(pub PresetId);

/// Replaces the recipe from a shared link, falling back to the saved recipe
/// and then the factory default.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenLink(pub Url);

#[derive(Debug, Clone, Copy)]
pub struct ShowRecipe;

#[derive(Debug, Clone, Copy)]
pub struct ShareLink;

#[derive(Debug, Clone, Copy)]
pub struct ListPresets;

impl<S: Storage> Calculator<S> {
    pub fn new(recipe: Recipe, docs: Documents<S>, key: &str, share_base: Url) -> Self {
        Calculator {
            recipe,
            flags: FieldFlags::new(),
            docs,
            key: key.to_string(),
            share_base,
        }
    }

    /// Starts a session from `link`, the saved recipe, or the factory
    /// default, in that order of preference.
    pub fn open(
        link: Option<&Url>,
        docs: Documents<S>,
        key: &str,
        share_base: Url,
    ) -> (Self, Origin) {
        let (recipe, origin) = snapshot::load_initial(link, &docs, key);
        (Self::new(recipe, docs, key, share_base), origin)
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn flags(&self) -> &FieldFlags {
        &self.flags
    }

    pub fn documents(&self) -> &Documents<S> {
        &self.docs
    }

    fn persist(&self) {
        match snapshot::save_local(&self.docs, &self.key, &self.recipe) {
            Ok(()) => trace!("Saved {:?} as {}", self.recipe.title, self.key),
            Err(e) => warn!("Could not save {:?}: {:#}", self.recipe.title, e),
        }
    }

    fn parse_number(&mut self, field: Field, text: &str) -> Option<f64> {
        match text.trim().parse::<f64>() {
            Ok(val) if val.is_finite() => {
                self.flags.mark(field, false);
                Some(val)
            }
            _ => {
                debug!("Unparseable input for {:?}: {:?}", field, text);
                self.flags.mark(field, true);
                None
            }
        }
    }

    // Every field is re-rendered from the recipe after an accepted edit, so
    // earlier complaints no longer apply.
    fn applied(&mut self) -> Outcome {
        self.flags.clear();
        self.persist();
        Outcome::Applied
    }

    fn numeric_edit<F>(&mut self, field: Field, text: &str, flag_refusal: bool, edit: F) -> Outcome
    where
        F: FnOnce(&mut Recipe, f64) -> Result<(), EditError>,
    {
        let val = match self.parse_number(field, text) {
            Some(val) => val,
            None => return Outcome::Unparseable(field, text.to_string()),
        };
        match edit(&mut self.recipe, val) {
            Ok(()) => self.applied(),
            Err(e) => {
                debug!("Refused {:?} = {}: {}", field, val, e);
                if flag_refusal {
                    self.flags.mark(field, true);
                }
                Outcome::Refused(e)
            }
        }
    }

    fn structural(&mut self) -> Outcome {
        self.flags.clear_rows();
        self.applied()
    }

    fn replace(&mut self, recipe: Recipe) {
        info!("Replacing {:?} with {:?}", self.recipe.title, recipe.title);
        self.recipe = recipe;
        self.flags.clear();
    }
}

impl Request for SetTotalMass {
    type Resp = Outcome;
}

impl<S: Storage> Commandable<SetTotalMass> for Calculator<S> {
    fn execute(&mut self, req: SetTotalMass) -> Result<Outcome> {
        let SetTotalMass(text) = req;
        Ok(self.numeric_edit(Field::TotalMass, &text, true, |r, v| {
            r.set_total_mass(v)
        }))
    }
}

impl Request for ChangeUnit {
    type Resp = Outcome;
}

impl<S: Storage> Commandable<ChangeUnit> for Calculator<S> {
    fn execute(&mut self, req: ChangeUnit) -> Result<Outcome> {
        let ChangeUnit(unit) = req;
        match self.recipe.set_unit(unit) {
            Ok(()) => Ok(self.applied()),
            Err(e) => {
                debug!("Refused unit {}: {}", unit, e);
                Ok(Outcome::Refused(e))
            }
        }
    }
}

impl Request for EditMass {
    type Resp = Outcome;
}

impl<S: Storage> Commandable<EditMass> for Calculator<S> {
    fn execute(&mut self, req: EditMass) -> Result<Outcome> {
        let EditMass { row, unit, text } = req;
        // A mass that cannot be reached by scaling the batch is dropped
        // without flagging the cell.
        Ok(self.numeric_edit(Field::mass(unit, row), &text, false, |r, v| {
            r.adjust_by_mass_edit(row, unit, v)
        }))
    }
}

impl Request for EditPercentage {
    type Resp = Outcome;
}

impl<S: Storage> Commandable<EditPercentage> for Calculator<S> {
    fn execute(&mut self, req: EditPercentage) -> Result<Outcome> {
        let EditPercentage { row, text } = req;
        Ok(self.numeric_edit(Field::Percentage(row), &text, true, |r, v| {
            r.set_ingredient_percentage(row, v)
        }))
    }
}

impl Request for EditName {
    type Resp = Outcome;
}

impl<S: Storage> Commandable<EditName> for Calculator<S> {
    fn execute(&mut self, req: EditName) -> Result<Outcome> {
        let EditName { row, name } = req;
        match name.as_str() {
            "+" => self.execute(InsertRow(Some(row))),
            "-" => self.execute(RemoveRow(Some(row))),
            _ => match self.recipe.set_ingredient_name(row, &name) {
                Ok(()) => {
                    self.persist();
                    Ok(Outcome::Applied)
                }
                Err(e) => Ok(Outcome::Refused(e)),
            },
        }
    }
}

impl Request for InsertRow {
    type Resp = Outcome;
}

impl<S: Storage> Commandable<InsertRow> for Calculator<S> {
    fn execute(&mut self, req: InsertRow) -> Result<Outcome> {
        let InsertRow(at) = req;
        let row = self.recipe.insert_ingredient_row(at);
        debug!("Inserted row {} (asked for {:?})", row, at);
        Ok(self.structural())
    }
}

impl Request for RemoveRow {
    type Resp = Outcome;
}

impl<S: Storage> Commandable<RemoveRow> for Calculator<S> {
    fn execute(&mut self, req: RemoveRow) -> Result<Outcome> {
        let RemoveRow(at) = req;
        let removed = self.recipe.remove_ingredient_row(at);
        debug!("Removed {:?} (asked for {:?})", removed.map(|i| i.name), at);
        Ok(self.structural())
    }
}

impl Request for SelectPreset {
    type Resp = Outcome;
}

impl<S: Storage> Commandable<SelectPreset> for Calculator<S> {
    fn execute(&mut self, req: SelectPreset) -> Result<Outcome> {
        let SelectPreset(id) = req;
        self.replace(presets::load_preset(id));
        Ok(self.applied())
    }
}

impl Request for OpenLink {
    type Resp = Origin;
}

impl<S: Storage> Commandable<OpenLink> for Calculator<S> {
    fn execute(&mut self, req: OpenLink) -> Result<Origin> {
        let OpenLink(url) = req;
        let (recipe, origin) = snapshot::load_initial(Some(&url), &self.docs, &self.key);
        self.replace(recipe);
        self.persist();
        Ok(origin)
    }
}

impl Request for ShowRecipe {
    type Resp = RecipeView;
}

impl<S: Storage> Queryable<ShowRecipe> for Calculator<S> {
    fn query(&self, _: ShowRecipe) -> Result<RecipeView> {
        Ok(RecipeView::render(&self.recipe, &self.flags))
    }
}

impl Request for ShareLink {
    type Resp = Url;
}

impl<S: Storage> Queryable<ShareLink> for Calculator<S> {
    fn query(&self, _: ShareLink) -> Result<Url> {
        link::share_url(&self.share_base, &self.recipe)
    }
}

impl Request for ListPresets {
    type Resp = Vec<(PresetId, String)>;
}

impl<S: Storage> Queryable<ListPresets> for Calculator<S> {
    fn query(&self, _: ListPresets) -> Result<Vec<(PresetId, String)>> {
        Ok(presets::presets()
            .iter()
            .map(|p| (p.id, p.title().to_string()))
            .collect())
    }
}
