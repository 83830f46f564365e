/// Builds the chef prompt for the generation service.
pub fn build_prompt(ingredients: &[String], caption: &str) -> String {
    let ingredients_text = ingredients.join(", ");

    format!(
        "You are a professional chef. Create a recipe using these ingredients: {ingredients_text}

Additional context: {caption}

Provide:
1. Recipe name
2. Cooking time
3. Ingredients list
4. Step-by-step instructions
5. Serving suggestions

Recipe:"
    )
}
