use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};

/// Query the Errata Tool and LightBlue the way freshmaker does
#[derive(Parser)]
#[command(name = "freshmaker", version)]
pub struct Cli {
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List advisories a signed build is attached to
    Advisories {
        #[command(flatten)]
        errata: ErrataArgs,

        /// Build NVR (name-version-release)
        #[arg(long)]
        nvr: String,
    },
    /// Check whether every build of an advisory has signed RPMs
    BuildsSigned {
        #[command(flatten)]
        errata: ErrataArgs,

        errata_id: u64,
    },
    /// List Pulp repositories an advisory ships to
    RepoIds {
        #[command(flatten)]
        errata: ErrataArgs,

        errata_id: u64,
    },
    /// Run a find query against containerImage
    FindImages {
        #[command(flatten)]
        lightblue: LightBlueArgs,

        /// JSON file holding the find request body
        #[arg(long)]
        request: PathBuf,
    },
    /// Run a find query against containerRepository
    FindRepositories {
        #[command(flatten)]
        lightblue: LightBlueArgs,

        /// JSON file holding the find request body
        #[arg(long)]
        request: PathBuf,
    },
}

#[derive(Args)]
pub struct ErrataArgs {
    /// Errata Tool server URL
    #[arg(long, env = "FRESHMAKER_ERRATA_URL")]
    pub errata_url: String,

    /// Maximum concurrent build lookups
    #[arg(long, default_value_t = 10)]
    pub max_concurrency: usize,
}

#[derive(Args)]
pub struct LightBlueArgs {
    /// LightBlue server URL
    #[arg(long, env = "FRESHMAKER_LIGHTBLUE_URL")]
    pub lightblue_url: String,

    /// Client certificate (PEM)
    #[arg(long, env = "FRESHMAKER_LIGHTBLUE_CERT")]
    pub cert: PathBuf,

    /// Client private key (PEM)
    #[arg(long, env = "FRESHMAKER_LIGHTBLUE_KEY")]
    pub private_key: PathBuf,

    /// Skip server certificate verification
    #[arg(long)]
    pub insecure: bool,
}
