use anyhow::Result;
use tempfile::TempDir;
use url::Url;

use doughcalc::calculator::*;
use doughcalc::config::Config;
use doughcalc::presets::{self, PresetId};
use doughcalc::services::{Commandable, Queryable};
use doughcalc::snapshot::Origin;
use doughcalc::Unit;
use infra::persistence::{FileStorage, Storage};

struct KitchenScenario {
    dir: TempDir,
}

struct Baker {
    calc: Calculator<FileStorage>,
    origin: Origin,
}

impl KitchenScenario {
    fn new() -> Result<Self> {
        env_logger::try_init().unwrap_or_default();
        let dir = tempfile::tempdir()?;
        Ok(KitchenScenario { dir })
    }

    fn config(&self) -> Config {
        let mut config = Config::default();
        config.storage.path = self.dir.path().to_path_buf();
        config
    }

    fn baker_arrives(&self) -> Result<Baker> {
        let (calc, origin) = doughcalc::open(&self.config(), None)?;
        Ok(Baker { calc, origin })
    }

    fn baker_follows(&self, link: &Url) -> Result<Baker> {
        let (calc, origin) = doughcalc::open(&self.config(), Some(link))?;
        Ok(Baker { calc, origin })
    }

    fn scribble_on_saved_recipe(&self, body: &str) -> Result<()> {
        let config = self.config();
        FileStorage::new(&config.storage.path).save_raw(&config.storage.key, body)
    }
}

impl Baker {
    fn masses(&self) -> Vec<f64> {
        self.calc
            .recipe()
            .ingredients()
            .iter()
            .map(|i| i.mass_grams())
            .collect()
    }

    fn percentages(&self) -> Vec<f64> {
        self.calc
            .recipe()
            .ingredients()
            .iter()
            .map(|i| i.percentage)
            .collect()
    }
}

fn assert_close(expected: f64, actual: f64) {
    assert!(
        (expected - actual).abs() <= 1e-9 * expected.abs().max(1.0),
        "expected {} ~= {}",
        expected,
        actual
    );
}

#[test]
fn first_visit_gets_straight_dough() -> Result<()> {
    let scenario = KitchenScenario::new()?;

    let baker = scenario.baker_arrives()?;

    assert_eq!(baker.origin, Origin::FactoryDefault);
    assert_eq!(baker.calc.recipe(), &presets::factory_default());
    Ok(())
}

#[test]
fn doubling_the_flour_doubles_the_batch() -> Result<()> {
    let scenario = KitchenScenario::new()?;
    let mut baker = scenario.baker_arrives()?;
    let before = baker.masses();

    let outcome = baker.calc.execute(EditMass {
        row: 0,
        unit: Unit::Grams,
        text: format!("{}", before[0] * 2.0),
    })?;

    assert_eq!(outcome, Outcome::Applied);
    assert_close(2000.0, baker.calc.recipe().total_mass());
    assert_eq!(baker.percentages(), vec![100.0, 2.0, 0.65, 68.0]);
    for (old, new) in before.iter().zip(baker.masses()) {
        assert_close(old * 2.0, new);
    }
    Ok(())
}

#[test]
fn edits_survive_the_next_visit() -> Result<()> {
    let scenario = KitchenScenario::new()?;
    let mut baker = scenario.baker_arrives()?;
    baker.calc.execute(SelectPreset(PresetId::WholeGrain))?;
    baker.calc.execute(ChangeUnit(Unit::Ounces))?;
    baker.calc.execute(EditPercentage {
        row: 4,
        text: "75".into(),
    })?;
    let expected = baker.calc.recipe().clone();

    let next = scenario.baker_arrives()?;

    assert_eq!(next.origin, Origin::Local);
    assert_eq!(next.calc.recipe(), &expected);
    Ok(())
}

#[test]
fn shared_link_beats_saved_recipe() -> Result<()> {
    let scenario = KitchenScenario::new()?;
    let mut friend = scenario.baker_arrives()?;
    friend.calc.execute(SelectPreset(PresetId::PateFermentee))?;
    friend.calc.execute(SetTotalMass("1800".into()))?;
    let link = friend.calc.query(ShareLink)?;
    friend.calc.execute(SelectPreset(PresetId::Straight))?;

    let baker = scenario.baker_follows(&link)?;

    assert_eq!(baker.origin, Origin::Link);
    assert_eq!(baker.calc.recipe().title, "Pâte Fermentée Mix");
    assert_eq!(baker.calc.recipe().total_mass(), 1800.0);
    Ok(())
}

#[test]
fn broken_link_falls_back_to_saved_recipe() -> Result<()> {
    let scenario = KitchenScenario::new()?;
    let mut baker = scenario.baker_arrives()?;
    baker.calc.execute(SelectPreset(PresetId::WholeGrain))?;
    let link = Url::parse("https://localhost/dough-calc.html?settings=%7Bnope")?;

    let baker = scenario.baker_follows(&link)?;

    assert_eq!(baker.origin, Origin::Local);
    assert_eq!(baker.calc.recipe().title, "Whole Grain");
    Ok(())
}

#[test]
fn stale_saved_recipe_is_replaced_by_factory_default() -> Result<()> {
    let scenario = KitchenScenario::new()?;
    scenario.scribble_on_saved_recipe(
        r#"{"formatVersion": 0, "title": "Old", "unit": 0, "totalMass": 5,
            "formula": [{"name": "Flour", "percentage": 100}]}"#,
    )?;

    let baker = scenario.baker_arrives()?;

    assert_eq!(baker.origin, Origin::FactoryDefault);
    assert_eq!(baker.calc.recipe(), &presets::factory_default());
    Ok(())
}

#[test]
fn emptying_the_recipe_never_panics() -> Result<()> {
    let scenario = KitchenScenario::new()?;
    let mut baker = scenario.baker_arrives()?;

    for _ in 0..6 {
        baker.calc.execute(RemoveRow(None))?;
    }
    assert!(baker.calc.recipe().ingredients().is_empty());

    baker.calc.execute(InsertRow(Some(99)))?;
    let view = baker.calc.query(ShowRecipe)?;
    assert_eq!(view.rows.len(), 1);
    assert!(view.rows[0].grams.invalid);
    assert_eq!(view.rows[0].grams.text, "");

    baker.calc.execute(EditPercentage {
        row: 0,
        text: "100".into(),
    })?;
    assert_eq!(baker.masses(), vec![1000.0]);
    Ok(())
}
