pub mod cancellation;
pub mod concurrency;
pub mod context;
pub mod fetch;
pub mod node;
pub mod plan;
pub mod representations;
