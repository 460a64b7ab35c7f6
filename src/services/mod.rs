pub mod blender;
pub mod collaborative;
pub mod fallback;
pub mod frequency;
pub mod predictor;
pub mod recommendations;
pub mod similarity;
pub mod trends;

pub use predictor::{HttpPredictor, RecommendationPredictor};
pub use recommendations::RecommendationService;
