mod cli;

use std::path::Path;
use std::process;

use anyhow::Context;
use clap::Parser;
use freshmaker::{Errata, Event, LightBlue, LightBlueConfig};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, ErrataArgs, LightBlueArgs};

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(args.verbosity.tracing_level_filter().into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

async fn run(args: Cli) -> anyhow::Result<()> {
    let json = args.json;

    match args.command {
        Command::Advisories { errata, nvr } => {
            let event = Event::brew_sign_rpm("cli", nvr);
            let advisories = errata_client(&errata)?.advisories_from_event(&event).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&advisories)?);
            } else {
                for adv in &advisories {
                    println!("{}\t{}\t{}", adv.errata_id, adv.name, adv.status);
                }
            }
        }
        Command::BuildsSigned { errata, errata_id } => {
            let signed = errata_client(&errata)?.builds_signed(errata_id).await?;
            if json {
                println!("{}", serde_json::json!({ "errata_id": errata_id, "signed": signed }));
            } else {
                println!("{}", if signed { "signed" } else { "unsigned" });
            }
        }
        Command::RepoIds { errata, errata_id } => {
            let repo_ids = errata_client(&errata)?.get_pulp_repository_ids(errata_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&repo_ids)?);
            } else {
                for repo_id in &repo_ids {
                    println!("{repo_id}");
                }
            }
        }
        Command::FindImages { lightblue, request } => {
            let request = read_request(&request)?;
            let images = lightblue_client(lightblue)?.find_container_images(&request).await?;
            print_documents(&images, json)?;
        }
        Command::FindRepositories { lightblue, request } => {
            let request = read_request(&request)?;
            let repos = lightblue_client(lightblue)?
                .find_container_repositories(&request)
                .await?;
            print_documents(&repos, json)?;
        }
    }

    Ok(())
}

fn errata_client(args: &ErrataArgs) -> anyhow::Result<Errata> {
    debug!(url = %args.errata_url, "using Errata Tool");
    Ok(Errata::new(&args.errata_url)?.with_max_concurrency(args.max_concurrency))
}

fn lightblue_client(args: LightBlueArgs) -> anyhow::Result<LightBlue> {
    debug!(url = %args.lightblue_url, "using LightBlue");
    let config = LightBlueConfig::new(args.lightblue_url, args.cert, args.private_key)
        .verify_ssl(!args.insecure);
    Ok(LightBlue::new(config)?)
}

fn read_request(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn print_documents<T: serde::Serialize>(docs: &[T], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(docs)?);
    } else {
        for doc in docs {
            println!("{}", serde_json::to_string(doc)?);
        }
    }
    Ok(())
}
