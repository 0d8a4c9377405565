use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "portmatch",
    about = "Portmatch: match an AFU's top-level interface requirements against a platform",
    version
)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve an AFU interface request against one platform
    Resolve {
        /// Platform name, or path to a platform JSON file
        platform: String,

        /// Top-level interface class, or path to an interface JSON file
        #[arg(short, long, conflicts_with = "src", required_unless_present = "src")]
        ifc: Option<String>,

        /// AFU sources: a JSON descriptor, or a directory holding exactly one
        #[arg(short, long)]
        src: Option<PathBuf>,

        /// Interface class to use when the AFU descriptor names none
        #[arg(long)]
        default_ifc: Option<String>,

        /// Directory that receives generated files
        #[arg(short, long, default_value = ".")]
        tgt: PathBuf,

        /// Dump the loaded databases and the resolved port list into --tgt
        #[arg(long)]
        debug: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the platform search path and the platforms found on it
    Platforms {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the interface search path and the base interfaces found on it
    Interfaces {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
