//! Interactive questions asked when a flag is missing.

use dialoguer::{Input, MultiSelect, Select};
use swaggen_core::Lang;

use crate::source::validate_source;

/// Ask for the document source, offering the stored one.
pub fn prompt_source(default: &str) -> Result<String, String> {
    Input::<String>::new()
        .with_prompt("Where is the swagger document? (URL or file path)")
        .default(default.to_string())
        .validate_with(|input: &String| validate_source(input.trim()))
        .interact_text()
        .map(|source| source.trim().to_string())
        .map_err(|err| format!("Failed to read source: {err}"))
}

/// Ask for the output language.
pub fn prompt_lang(default: Lang) -> Result<Lang, String> {
    let choices = [Lang::Ts, Lang::Js];
    let default_idx = choices.iter().position(|lang| *lang == default).unwrap_or(0);
    let selection = Select::new()
        .with_prompt("Which language should be generated?")
        .items(&["ts", "js"])
        .default(default_idx)
        .interact()
        .map_err(|err| format!("Failed to select language: {err}"))?;
    Ok(choices[selection])
}

/// Ask which tags to generate, pre-checking the stored choices. Picking
/// nothing means every operation.
pub fn prompt_api_choices(tags: &[String], chosen: &[String]) -> Result<Vec<String>, String> {
    let defaults: Vec<bool> = tags.iter().map(|tag| chosen.contains(tag)).collect();
    let picked = MultiSelect::new()
        .with_prompt("Which APIs should be generated? (space to toggle, none for all)")
        .items(tags)
        .defaults(&defaults)
        .interact()
        .map_err(|err| format!("Failed to select APIs: {err}"))?;
    Ok(picked.into_iter().map(|idx| tags[idx].clone()).collect())
}
