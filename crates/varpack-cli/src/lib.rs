//! Command-line front end for `varpack`.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
