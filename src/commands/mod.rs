mod analyze;
mod caption;
mod detect;
mod recipe;

pub use analyze::{AnalyzeArgs, AnalyzeCommand, AnalyzeOutput};
pub use caption::{CaptionArgs, CaptionCommand, CaptionOutput};
pub use detect::{DetectArgs, DetectCommand, DetectOutput};
pub use recipe::{RecipeArgs, RecipeCommand, RecipeOutput, generate_recipe};
