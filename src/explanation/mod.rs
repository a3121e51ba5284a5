pub mod types;
pub mod generator;
pub mod formatters;

pub use types::{Assessment, ComponentImpacts, Factor, RiskType};

pub use generator::ExplanationGenerator;
pub use formatters::{JsonFormatter, MarkdownFormatter};
