use clap::Parser;
use std::path::{Path, PathBuf};
use taglib_engine::application::{TagBindingService, TaglibDiscoveryWalker};
use taglib_engine::cli::{format_tag_json, format_tag_list, Cli, Commands};
use taglib_engine::domain::{SourceLocation, TagOccurrence, TagRegistry};
use taglib_engine::error::{ConfigError, Result, ValidationError};
use taglib_engine::infrastructure::DiscoveryConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taglib_engine=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(_) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e.display_with_suggestions());
            std::process::exit(e.exit_code());
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => DiscoveryConfig::load_from_file(path)?,
        None => DiscoveryConfig::default(),
    };
    let walker = TaglibDiscoveryWalker::new(config);

    match cli.command {
        Commands::List { template } => {
            let registry = discover(&walker, &template)?;
            print!("{}", format_tag_list(&registry));
            Ok(())
        }
        Commands::Show { template, tag } => {
            let registry = discover(&walker, &template)?;
            let def = registry.get(&tag).ok_or_else(|| ValidationError::UnknownTag {
                tag: tag.clone(),
                location: SourceLocation::new(&template, 1, 1),
            })?;
            println!("{}", format_tag_json(def)?);
            Ok(())
        }
        Commands::Check {
            template,
            tag,
            attributes,
        } => {
            let registry = discover(&walker, &template)?;
            let mut occurrence = TagOccurrence::new(tag, SourceLocation::new(&template, 1, 1));
            for attribute in &attributes {
                let (name, value) = attribute.split_once('=').unwrap_or((attribute.as_str(), "true"));
                occurrence = occurrence.with_attribute(name, value);
            }

            TagBindingService::bind(&registry, &occurrence)?;
            println!("ok");
            Ok(())
        }
    }
}

fn discover(walker: &TaglibDiscoveryWalker, template: &Path) -> Result<TagRegistry> {
    walker.discover(&absolute(template)?)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(cwd.join(path))
}
