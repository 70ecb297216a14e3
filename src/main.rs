// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Error};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pipemut::{load_script, AliasTable, DirectoryFiles, DocumentSet, PropertyQuery, SelectorParser};

#[derive(Parser, Debug)]
#[command(name = "pipemut")]
#[command(about = "Apply structural edits to a CI pipeline and its templates")]
struct Cli {
    #[command(flatten)]
    repo: RepoArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct RepoArgs {
    /// Repository root. Pipeline and template paths are relative to it
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Maps a repository alias used in `template: path@alias` to a directory below the
    /// root. Can be specified multiple times
    #[arg(short, long = "alias", value_name = "NAME=PATH", value_parser = parse_alias)]
    aliases: Vec<(String, PathBuf)>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Runs an action script against the pipeline and writes every document back
    Apply {
        /// Main pipeline file
        pipeline: PathBuf,

        /// Action script (YAML list of actions)
        #[arg(short, long)]
        actions: PathBuf,

        /// Directory to write the edited documents to (defaults to the root)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Prints every value of a property across the pipeline and its templates
    Read {
        /// Main pipeline file
        pipeline: PathBuf,

        /// Section to search, e.g. `stages` or `stage=deploy`
        #[arg(short, long)]
        scope: String,

        /// Key an element must carry, e.g. `job`
        #[arg(short = 't', long = "type")]
        section_type: String,

        /// Key whose value is printed
        #[arg(short, long)]
        property: String,
    },
    /// Lists the documents a pipeline pulls in
    Resolve {
        /// Main pipeline file
        pipeline: PathBuf,
    },
}

fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "pipemut=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let source = DirectoryFiles::new(&cli.repo.root);
    let mut aliases = AliasTable::new();
    for (alias, base) in &cli.repo.aliases {
        aliases.insert(alias.clone(), base.clone());
    }

    match cli.command {
        Command::Apply {
            pipeline,
            actions,
            output,
        } => {
            let script_files = DirectoryFiles::new(".");
            let actions = load_script(&script_files, &actions)
                .with_context(|| format!("failed to load action script {}", actions.display()))?;

            let mut set = load(&pipeline, &source, &aliases)?;
            for action in &actions {
                let applied = set
                    .execute(action)
                    .with_context(|| format!("failed to apply `{}`", action))?;
                println!("{}\t{}", if applied { "applied" } else { "unmatched" }, action);
            }

            let mut sink = DirectoryFiles::new(output.unwrap_or(cli.repo.root));
            set.save(&mut sink).context("failed to write documents")?;
        }
        Command::Read {
            pipeline,
            scope,
            section_type,
            property,
        } => {
            let selector = SelectorParser::new().parse(&scope)?;
            if selector.matcher.is_some() {
                bail!("scope `{}` must not name an element", scope);
            }

            let set = load(&pipeline, &source, &aliases)?;
            let query = PropertyQuery::new(selector.scope, section_type, property);
            for value in set.read_property(&query) {
                println!("{}", value);
            }
        }
        Command::Resolve { pipeline } => {
            let set = load(&pipeline, &source, &aliases)?;
            for doc in set.documents() {
                println!("{}", doc.path().display());
            }
            for warning in set.warnings() {
                eprintln!("warning: {}", warning);
            }
        }
    }

    Ok(())
}

fn load(pipeline: &Path, source: &DirectoryFiles, aliases: &AliasTable) -> Result<DocumentSet, Error> {
    DocumentSet::load(pipeline, source, aliases)
        .with_context(|| format!("failed to load pipeline {}", pipeline.display()))
}

fn parse_alias(arg: &str) -> Result<(String, PathBuf), Error> {
    let (name, path) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=PATH, found `{}`", arg))?;
    if name.is_empty() {
        bail!("alias name must not be empty");
    }
    Ok((name.to_string(), PathBuf::from(path)))
}
