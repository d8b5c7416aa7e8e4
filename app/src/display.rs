use std::collections::HashSet;
use std::fmt;

use crate::recipe::Recipe;
use crate::units::Unit;

pub const PRECISION_LO: usize = 1;
pub const PRECISION_HI: usize = 2;

/// An input cell on the calculator's form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    TotalMass,
    Grams(usize),
    Ounces(usize),
    Percentage(usize),
}

/// Cells whose last entry failed to parse. Owned by whoever renders the
/// recipe; the recipe itself never knows about them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFlags {
    invalid: HashSet<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericField {
    pub text: String,
    pub invalid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientRow {
    pub name: String,
    pub grams: NumericField,
    pub ounces: NumericField,
    pub percentage: NumericField,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeView {
    pub title: String,
    pub total_mass: NumericField,
    pub unit: Unit,
    pub rows: Vec<IngredientRow>,
}

impl Field {
    pub fn row(self) -> Option<usize> {
        match self {
            Field::TotalMass => None,
            Field::Grams(row) | Field::Ounces(row) | Field::Percentage(row) => Some(row),
        }
    }

    pub fn mass(unit: Unit, row: usize) -> Self {
        match unit {
            Unit::Grams => Field::Grams(row),
            Unit::Ounces => Field::Ounces(row),
        }
    }
}

impl FieldFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, field: Field, invalid: bool) {
        if invalid {
            self.invalid.insert(field);
        } else {
            self.invalid.remove(&field);
        }
    }

    pub fn is_invalid(&self, field: Field) -> bool {
        self.invalid.contains(&field)
    }

    /// Forgets every per-row flag, for when rows are inserted or removed and
    /// indices shift.
    pub fn clear_rows(&mut self) {
        self.invalid.retain(|f| f.row().is_none());
    }

    pub fn clear(&mut self) {
        self.invalid.clear();
    }
}

impl NumericField {
    /// Non-finite values render blank and are always flagged.
    pub fn new(value: f64, precision: usize, flagged: bool) -> Self {
        if value.is_finite() {
            NumericField {
                text: format!("{:.*}", precision, value),
                invalid: flagged,
            }
        } else {
            NumericField {
                text: String::new(),
                invalid: true,
            }
        }
    }
}

impl RecipeView {
    pub fn render(recipe: &Recipe, flags: &FieldFlags) -> Self {
        let rows = recipe
            .ingredients()
            .iter()
            .enumerate()
            .map(|(row, ing)| IngredientRow {
                name: ing.name.clone(),
                grams: NumericField::new(
                    ing.mass_grams(),
                    PRECISION_HI,
                    flags.is_invalid(Field::Grams(row)),
                ),
                ounces: NumericField::new(
                    ing.mass_ounces(),
                    PRECISION_HI,
                    flags.is_invalid(Field::Ounces(row)),
                ),
                percentage: NumericField::new(
                    ing.percentage,
                    PRECISION_LO,
                    flags.is_invalid(Field::Percentage(row)),
                ),
                locked: ing.locked,
            })
            .collect();

        RecipeView {
            title: recipe.title.clone(),
            total_mass: NumericField::new(
                recipe.total_mass(),
                PRECISION_LO,
                flags.is_invalid(Field::TotalMass),
            ),
            unit: recipe.unit(),
            rows,
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        if self.invalid {
            write!(fmt, "{}!", self.text)
        } else {
            write!(fmt, "{}", self.text)
        }
    }
}

impl fmt::Display for RecipeView {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        writeln!(fmt, "{}", self.title)?;
        writeln!(fmt, "Total mass: {} {}", self.total_mass, self.unit)?;
        writeln!(
            fmt,
            "{:>3}  {:<24} {:>10} {:>10} {:>8}",
            "#", "Ingredient", "Mass (g)", "Wt (oz)", "Percent"
        )?;
        for (idx, row) in self.rows.iter().enumerate() {
            writeln!(
                fmt,
                "{:>3}{} {:<24} {:>10} {:>10} {:>8}",
                idx,
                if row.locked { "*" } else { " " },
                row.name,
                row.grams.to_string(),
                row.ounces.to_string(),
                row.percentage.to_string(),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::presets;
    use crate::recipe::Ingredient;

    #[test]
    fn formats_with_fixed_precision() {
        let view = RecipeView::render(&presets::factory_default(), &FieldFlags::new());

        assert_eq!(view.total_mass.text, "1000.0");
        let flour = &view.rows[0];
        assert_eq!(flour.name, "Flour");
        assert_eq!(flour.grams.text, "585.99");
        assert_eq!(flour.ounces.text, "20.67");
        assert_eq!(flour.percentage.text, "100.0");
        assert_eq!(view.rows[2].percentage.text, "0.7");
        assert!(!flour.grams.invalid);
    }

    #[test]
    fn degenerate_recipe_renders_blank_invalid_masses() {
        let recipe = Recipe::new(
            "zeros",
            Unit::Grams,
            1000.0,
            vec![Ingredient::new("a", 0.0), Ingredient::new("b", 0.0)],
        );

        let view = RecipeView::render(&recipe, &FieldFlags::new());

        for row in view.rows.iter() {
            assert_eq!(row.grams, NumericField { text: String::new(), invalid: true });
            assert!(row.ounces.invalid);
            assert!(!row.percentage.invalid);
        }
        assert!(!view.total_mass.invalid);
    }

    #[test]
    fn flags_mark_individual_fields() {
        let mut flags = FieldFlags::new();
        flags.mark(Field::TotalMass, true);
        flags.mark(Field::Ounces(1), true);

        let view = RecipeView::render(&presets::factory_default(), &flags);

        assert!(view.total_mass.invalid);
        assert!(view.rows[1].ounces.invalid);
        assert!(!view.rows[1].grams.invalid);
        assert!(!view.rows[0].ounces.invalid);

        flags.mark(Field::TotalMass, false);
        assert!(!flags.is_invalid(Field::TotalMass));
    }

    #[test]
    fn clearing_rows_keeps_total_mass_flag() {
        let mut flags = FieldFlags::new();
        flags.mark(Field::TotalMass, true);
        flags.mark(Field::Percentage(3), true);

        flags.clear_rows();

        assert!(flags.is_invalid(Field::TotalMass));
        assert!(!flags.is_invalid(Field::Percentage(3)));
    }

    #[test]
    fn table_lists_every_row() {
        let view = RecipeView::render(&presets::factory_default(), &FieldFlags::new());
        let table = view.to_string();

        assert!(table.starts_with("Straight Bread Dough\n"));
        assert!(table.contains("Total mass: 1000.0 g"));
        assert_eq!(table.lines().count(), 3 + 4);
    }
}
