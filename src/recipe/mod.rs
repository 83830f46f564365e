mod ingredients;
mod prompt;

pub use ingredients::parse_ingredients;
pub use prompt::build_prompt;
