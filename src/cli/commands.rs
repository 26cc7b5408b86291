//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "taglib")]
#[command(about = "Inspect the custom tags visible to a template", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Discovery configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every tag visible to a template
    List {
        /// Template file (relative paths resolve against the current directory)
        template: PathBuf,
    },

    /// Show one tag definition as JSON
    Show {
        template: PathBuf,

        /// Tag name, e.g. ui-tabs or ui-tabs.tab
        tag: String,
    },

    /// Check attribute names against a tag's schema
    Check {
        template: PathBuf,

        tag: String,

        /// Attributes as NAME or NAME=VALUE
        #[arg(value_name = "ATTR")]
        attributes: Vec<String>,
    },
}
