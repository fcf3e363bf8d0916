use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use smt_cli::{commands, CliConfig};
use smt_backend::{JsonPackager, Packager};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let path_arg = |name: &'static str, help: &'static str| {
        Arg::new(name)
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help(help)
    };
    let output_arg = || {
        Arg::new("output")
            .long("output")
            .short('o')
            .value_parser(value_parser!(PathBuf))
            .help("Write to this file instead of stdout")
    };

    Command::new("smt-forms")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Submodel Template forms: render, validate, export and import")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("render")
                .about("Print the UI tree of a template")
                .arg(path_arg("template", "Template JSON (submodel or environment)"))
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate a value file against a template")
                .arg(path_arg("template", "Template JSON"))
                .arg(path_arg("values", "Flat value map JSON")),
        )
        .subcommand(
            Command::new("export")
                .about("Export a value file into a submodel document")
                .arg(path_arg("template", "Template JSON"))
                .arg(path_arg("values", "Flat value map JSON"))
                .arg(
                    Arg::new("include-empty")
                        .long("include-empty")
                        .action(ArgAction::SetTrue)
                        .help("Emit optional elements without a value"),
                )
                .arg(
                    Arg::new("new-id")
                        .long("new-id")
                        .action(ArgAction::SetTrue)
                        .help("Mint a fresh urn:uuid document id"),
                )
                .arg(
                    Arg::new("force")
                        .long("force")
                        .action(ArgAction::SetTrue)
                        .help("Export even if validation fails"),
                )
                .arg(
                    Arg::new("package")
                        .long("package")
                        .action(ArgAction::SetTrue)
                        .help("Wrap the document in an environment file"),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("import")
                .about("Flatten a document into a value file")
                .arg(path_arg("document", "Submodel or environment JSON"))
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("check")
                .about("Check a document against the submodel schema")
                .arg(path_arg("document", "Submodel or environment JSON")),
        )
        .subcommand(
            Command::new("fetch")
                .about("Download a template from the template repository")
                .arg(Arg::new("id").required(true).help("Template id"))
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("push")
                .about("Create or update a document in the submodel repository")
                .arg(path_arg("document", "Submodel or environment JSON")),
        )
}

fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn path<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a Path> {
    args.get_one::<PathBuf>(name)
        .map(PathBuf::as_path)
        .ok_or_else(|| anyhow::anyhow!("missing argument <{name}>"))
}

fn emit(args: &ArgMatches, bytes: &[u8]) -> anyhow::Result<()> {
    match args.try_get_one::<PathBuf>("output").ok().flatten() {
        Some(target) => {
            std::fs::write(target, bytes)?;
            tracing::info!("Wrote {}", target.display());
        }
        None => println!("{}", String::from_utf8_lossy(bytes)),
    }
    Ok(())
}

fn emit_json(args: &ArgMatches, value: &impl serde::Serialize) -> anyhow::Result<()> {
    emit(args, &serde_json::to_vec_pretty(value)?)
}

/// Runs one subcommand; `Ok(false)` means a reported failure (exit 1)
async fn run(matches: &ArgMatches, config: CliConfig) -> anyhow::Result<bool> {
    match matches.subcommand() {
        Some(("render", args)) => {
            let ui = commands::render(path(args, "template")?)?;
            emit_json(args, &ui)?;
            Ok(true)
        }
        Some(("validate", args)) => {
            let report = commands::validate(path(args, "template")?, path(args, "values")?)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(report.valid)
        }
        Some(("export", args)) => {
            let config = config
                .clone()
                .with_include_empty_optional(config.include_empty_optional || args.get_flag("include-empty"))
                .with_generate_new_id(config.generate_new_id || args.get_flag("new-id"));
            let result = commands::export(
                path(args, "template")?,
                path(args, "values")?,
                &config,
                args.get_flag("force"),
            )?;
            for warning in &result.warnings {
                eprintln!("warning: {}: {}", warning.path, warning.message);
            }
            for violation in &result.violations {
                eprintln!("schema: {}: {}", violation.path, violation.message);
            }
            if args.get_flag("package") {
                emit(args, &JsonPackager::new().pack(&result.submodel)?)?;
            } else {
                emit_json(args, &result.submodel)?;
            }
            Ok(result.is_conformant())
        }
        Some(("import", args)) => {
            let values = commands::import(path(args, "document")?)?;
            emit_json(args, &values)?;
            Ok(true)
        }
        Some(("check", args)) => {
            let violations = commands::check(path(args, "document")?)?;
            if violations.is_empty() {
                println!("conformant");
            }
            for violation in &violations {
                println!("{}: {}", violation.path, violation.message);
            }
            Ok(violations.is_empty())
        }
        Some(("fetch", args)) => {
            let id = args
                .get_one::<String>("id")
                .ok_or_else(|| anyhow::anyhow!("missing argument <id>"))?;
            let template = commands::fetch(id, &config).await?;
            emit_json(args, &template)?;
            Ok(true)
        }
        Some(("push", args)) => {
            let outcome = commands::push(path(args, "document")?, &config).await?;
            println!("{}", serde_json::to_string(&outcome)?);
            Ok(true)
        }
        _ => Ok(false),
    }
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();

    let config = match CliConfig::load_or_default(matches.get_one::<PathBuf>("config").map(PathBuf::as_path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(2);
        }
    };
    init_tracing(&config);

    match run(&matches, config).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!("{e:#}");
            std::process::exit(2);
        }
    }
}
