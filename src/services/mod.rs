pub mod form_builder;
pub mod sampler;

pub use form_builder::{clean_html, FormStrategy, FormStrategyRegistry, McqFormStrategy};
pub use sampler::RandomSampler;
