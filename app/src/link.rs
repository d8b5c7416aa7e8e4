//! Shareable links carry a whole recipe snapshot as the percent-encoded JSON
//! value of the `settings` query parameter.

use anyhow::Result;
use err_derive::Error;
use log::*;
use url::Url;

use infra::documents;

use crate::recipe::Recipe;
use crate::snapshot::Snapshot;

pub const SETTINGS_PARAM: &str = "settings";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(display = "no {} parameter in {}", SETTINGS_PARAM, _0)]
pub struct MissingSettings(pub String);

/// `base` with its `settings` parameter replaced by a snapshot of `recipe`.
/// Other query parameters are kept.
pub fn share_url(base: &Url, recipe: &Recipe) -> Result<Url> {
    let json = documents::encode(&Snapshot::from(recipe))?;
    let others = base
        .query_pairs()
        .filter(|(k, _)| k != SETTINGS_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect::<Vec<(String, String)>>();

    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(others)
        .append_pair(SETTINGS_PARAM, &json);
    trace!("Share url: {}", url);
    Ok(url)
}

pub fn settings_param(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == SETTINGS_PARAM)
        .map(|(_, v)| v.into_owned())
}

pub fn recipe_from_url(url: &Url) -> Result<Recipe> {
    let json = settings_param(url).ok_or_else(|| MissingSettings(url.to_string()))?;
    let snapshot: Snapshot = documents::decode(&json)?;
    let recipe = snapshot.into_recipe()?;
    Ok(recipe)
}
