pub mod error_normalization;
pub mod graphql_error;
pub mod merge;
pub mod output;
pub mod tree;
