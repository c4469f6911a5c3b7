pub mod multimodal;
pub mod utils;

pub use multimodal::model::MultimodalSolver;
