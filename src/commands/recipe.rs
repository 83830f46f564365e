use crate::{
    Result,
    config::{Config, LlmConfig},
    invocation::Command,
    llm::{GenerateRequest, GenerationClient, OllamaClient},
    recipe::{build_prompt, parse_ingredients},
};
use async_trait::async_trait;
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const NO_RECIPE: &str = "No recipe generated";

#[derive(Debug, Parser)]
#[command(name = "recipe", disable_help_flag = true, disable_version_flag = true)]
pub struct RecipeArgs {
    /// JSON array, bracketed list or comma-separated ingredients.
    #[arg(allow_hyphen_values = true)]
    pub ingredients: String,

    /// Free-text context, usually the image caption.
    #[arg(allow_hyphen_values = true)]
    pub caption: Option<String>,

    #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub extra: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeOutput {
    pub recipe: String,
}

pub struct RecipeCommand;

#[async_trait]
impl Command for RecipeCommand {
    type Args = RecipeArgs;
    type Output = RecipeOutput;

    const NAME: &'static str = "recipe";
    const USAGE: &'static str = "Usage: recipe <ingredients_json> [caption]";

    async fn execute(&self, args: RecipeArgs, config: &Config) -> Result<RecipeOutput> {
        if !args.extra.is_empty() {
            debug!("Ignoring {} extra argument(s)", args.extra.len());
        }

        let client = OllamaClient::new(&config.llm);
        generate_recipe(
            &client,
            &config.llm,
            &args.ingredients,
            args.caption.as_deref().unwrap_or(""),
        )
        .await
    }
}

/// Parses the ingredients, builds the prompt and asks `client` for a recipe.
pub async fn generate_recipe(
    client: &dyn GenerationClient,
    config: &LlmConfig,
    ingredients: &str,
    caption: &str,
) -> Result<RecipeOutput> {
    let ingredients = parse_ingredients(ingredients);
    if ingredients.is_empty() {
        warn!("No ingredients parsed, generating from the caption alone");
    }

    info!("Generating recipe for {} ingredient(s)", ingredients.len());

    let prompt = build_prompt(&ingredients, caption);
    let response = client.generate(GenerateRequest::new(config, prompt)).await?;

    Ok(RecipeOutput {
        recipe: response.response.unwrap_or_else(|| NO_RECIPE.to_string()),
    })
}
