pub mod form_flow;
pub mod run_ctx;

pub use form_flow::FormFlow;
pub use run_ctx::RunCtx;
