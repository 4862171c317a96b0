#![forbid(unsafe_code)]

pub mod artifacts;
pub mod encoder;
pub mod estimator;
pub mod fit;
pub mod predict;
