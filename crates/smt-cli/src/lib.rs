//! SMT CLI - command line front end
//!
//! `smt-forms` renders templates, validates and exports value files,
//! imports and checks documents, and talks to remote repositories.

#![warn(unreachable_pub)]

pub mod commands;
pub mod config;

pub use config::CliConfig;
