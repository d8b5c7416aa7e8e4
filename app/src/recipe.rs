//! The recipe model.
//!
//! Percentages are the only source of truth for an ingredient. Masses in
//! grams and ounces are derived from the percentage, the recipe's total mass
//! and the sum of all percentages, and are recomputed after every edit.

use err_derive::Error;
use log::*;

use crate::units::Unit;

#[derive(Debug, Clone, PartialEq)]
pub struct Ingredient {
    pub name: String,
    pub percentage: f64,
    pub locked: bool,
    mass_grams: f64,
    mass_ounces: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub title: String,
    unit: Unit,
    total_mass: f64,
    ingredients: Vec<Ingredient>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EditError {
    #[error(display = "not a finite number: {}", _0)]
    NotFinite(f64),
    #[error(display = "must not be negative: {}", _0)]
    Negative(f64),
    #[error(display = "no ingredient at row {}", _0)]
    NoSuchRow(usize),
    #[error(display = "ingredient at row {} is locked", _0)]
    Locked(usize),
    #[error(display = "batch size must be positive: {}", _0)]
    NotPositive(f64),
    #[error(display = "batch size out of range: {}", _0)]
    OutOfRange(f64),
    #[error(display = "cannot scale batch by {}", _0)]
    UnscalableRatio(f64),
}

/// Sum of the percentage column; the denominator for every derived mass.
///
/// Zero for an empty list, or one where every percentage is zero.
pub fn total_percentage(ingredients: &[Ingredient]) -> f64 {
    ingredients.iter().map(|ing| ing.percentage).sum()
}

fn check_quantity(value: f64) -> Result<f64, EditError> {
    if !value.is_finite() {
        return Err(EditError::NotFinite(value));
    }
    if value < 0.0 {
        return Err(EditError::Negative(value));
    }
    Ok(value)
}

/// A total mass has to stay finite in grams and in ounces, so that switching
/// units later cannot overflow.
fn check_total(unit: Unit, value: f64) -> Result<f64, EditError> {
    let value = check_quantity(value)?;
    if !unit.to_grams(value).is_finite() || !unit.to_ounces(value).is_finite() {
        return Err(EditError::OutOfRange(value));
    }
    Ok(value)
}

impl Ingredient {
    pub fn new(name: &str, percentage: f64) -> Self {
        Ingredient {
            name: name.to_string(),
            percentage,
            locked: false,
            mass_grams: f64::NAN,
            mass_ounces: f64::NAN,
        }
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn mass_grams(&self) -> f64 {
        self.mass_grams
    }

    pub fn mass_ounces(&self) -> f64 {
        self.mass_ounces
    }

    pub fn mass_in(&self, unit: Unit) -> f64 {
        match unit {
            Unit::Grams => self.mass_grams,
            Unit::Ounces => self.mass_ounces,
        }
    }
}

impl Recipe {
    pub fn new(title: &str, unit: Unit, total_mass: f64, ingredients: Vec<Ingredient>) -> Self {
        let mut recipe = Recipe {
            title: title.to_string(),
            unit,
            total_mass,
            ingredients,
        };
        recipe.recompute_masses();
        recipe
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// The batch size, expressed in [`Recipe::unit`].
    pub fn total_mass(&self) -> f64 {
        self.total_mass
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    pub fn total_percentage(&self) -> f64 {
        total_percentage(&self.ingredients)
    }

    pub fn is_degenerate(&self) -> bool {
        self.total_percentage() <= 0.0
    }

    pub fn total_mass_in_grams(&self) -> f64 {
        self.unit.to_grams(self.total_mass)
    }

    pub fn total_mass_in_ounces(&self) -> f64 {
        self.unit.to_ounces(self.total_mass)
    }

    /// Recomputes every ingredient's derived masses. With a zero percentage
    /// sum every mass becomes NaN.
    pub fn recompute_masses(&mut self) {
        let total_g = self.total_mass_in_grams();
        let total_oz = self.total_mass_in_ounces();
        let total_pct = self.total_percentage();
        if total_pct == 0.0 {
            debug!("Degenerate recipe {:?}: percentages sum to zero", self.title);
        }

        for ing in self.ingredients.iter_mut() {
            ing.mass_grams = total_g * ing.percentage / total_pct;
            ing.mass_ounces = total_oz * ing.percentage / total_pct;
        }
    }

    pub fn set_total_mass(&mut self, value: f64) -> Result<(), EditError> {
        let value = check_total(self.unit, value)?;
        if value == 0.0 {
            return Err(EditError::NotPositive(value));
        }
        debug!("Total mass {} -> {}{}", self.total_mass, value, self.unit);
        self.total_mass = value;
        self.recompute_masses();
        Ok(())
    }

    /// Switches the unit the total mass is expressed in, keeping the
    /// physical batch size.
    pub fn set_unit(&mut self, unit: Unit) -> Result<(), EditError> {
        if self.unit != unit {
            let converted = check_total(unit, self.unit.convert(self.total_mass, unit))
                .map_err(|_| EditError::OutOfRange(self.total_mass))?;
            debug!(
                "Unit {} -> {}: total mass {} -> {}",
                self.unit, unit, self.total_mass, converted
            );
            self.total_mass = converted;
            self.unit = unit;
        }
        self.recompute_masses();
        Ok(())
    }

    /// Handles a direct edit of one ingredient's derived mass by scaling the
    /// whole batch so that ingredient ends up weighing `value`. Every
    /// percentage is left alone.
    ///
    /// The ratio is taken against the row's mass in the edited unit, and is
    /// dimensionless, so the total is scaled in whatever unit it is held in.
    pub fn adjust_by_mass_edit(
        &mut self,
        row: usize,
        unit: Unit,
        value: f64,
    ) -> Result<(), EditError> {
        let ing = self.ingredients.get(row).ok_or(EditError::NoSuchRow(row))?;
        if ing.locked {
            return Err(EditError::Locked(row));
        }
        if !value.is_finite() {
            return Err(EditError::NotFinite(value));
        }

        let ratio = value / ing.mass_in(unit);
        if !ratio.is_finite() || ratio < 0.0 {
            return Err(EditError::UnscalableRatio(ratio));
        }
        let scaled = check_total(self.unit, self.total_mass * ratio)
            .map_err(|_| EditError::UnscalableRatio(ratio))?;

        debug!(
            "Row {} set to {}{}: scaling batch by {}",
            row, value, unit, ratio
        );
        self.total_mass = scaled;
        self.recompute_masses();
        Ok(())
    }

    /// Changes one ingredient's share of the (unchanged) total mass.
    pub fn set_ingredient_percentage(&mut self, row: usize, value: f64) -> Result<(), EditError> {
        let value = check_quantity(value)?;
        let ing = self
            .ingredients
            .get_mut(row)
            .ok_or(EditError::NoSuchRow(row))?;
        ing.percentage = value;
        self.recompute_masses();
        Ok(())
    }

    pub fn set_ingredient_name(&mut self, row: usize, name: &str) -> Result<(), EditError> {
        let ing = self
            .ingredients
            .get_mut(row)
            .ok_or(EditError::NoSuchRow(row))?;
        ing.name = name.to_string();
        Ok(())
    }

    /// Inserts an empty 0% row before `at`. `None` or an index past the end
    /// appends. Returns where the row ended up.
    pub fn insert_ingredient_row(&mut self, at: Option<usize>) -> usize {
        let len = self.ingredients.len();
        let row = at.filter(|&row| row <= len).unwrap_or(len);
        self.ingredients.insert(row, Ingredient::new("", 0.0));
        self.recompute_masses();
        row
    }

    /// Removes the row at `at`; `None` or an index past the end removes the
    /// last row. Does nothing to an empty recipe.
    pub fn remove_ingredient_row(&mut self, at: Option<usize>) -> Option<Ingredient> {
        let len = self.ingredients.len();
        if len == 0 {
            debug!("Nothing to remove from {:?}", self.title);
            return None;
        }
        let row = at.filter(|&row| row < len).unwrap_or(len - 1);
        let removed = self.ingredients.remove(row);
        self.recompute_masses();
        Some(removed)
    }
}
