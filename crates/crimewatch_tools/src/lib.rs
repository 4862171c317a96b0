#![forbid(unsafe_code)]

pub mod model_cli;
pub mod store_cli;
