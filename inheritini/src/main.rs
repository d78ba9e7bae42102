use std::path::PathBuf;

use anyhow::Context;
use clap::ArgMatches;
use itertools::Itertools;
use tracing_subscriber::EnvFilter;

use inheritini::{Config, SectionView};
use inheritini_api::{ErrorReport, QueryResult, SectionDump, ValueKind};

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    // parse command line arguments
    let file_arg = clap::arg!(<FILE> "path to the ini file").value_parser(clap::value_parser!(PathBuf));
    let section_arg = clap::arg!(<SECTION> "section to resolve");

    let cli_args = clap::Command::new("inheritini")
        .about("query ini files with section inheritance")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(clap::arg!(-v --verbose "print parser diagnostics").global(true))
        .subcommand_required(true)
        .subcommand(
            clap::Command::new("sections")
                .about("list declared sections")
                .arg(file_arg.clone()),
        )
        .subcommand(
            clap::Command::new("show")
                .about("print a section after inheritance")
                .arg(file_arg.clone())
                .arg(section_arg.clone())
                .arg(clap::arg!(--json "print as json")),
        )
        .subcommand(
            clap::Command::new("get")
                .about("print a single value")
                .arg(file_arg)
                .arg(section_arg)
                .arg(clap::arg!(<KEY> "key to read"))
                .arg(
                    clap::arg!(-k --kind <KIND> "type of the value")
                        .value_parser(ValueKind::ALL.map(|k| k.as_str()))
                        .default_value(ValueKind::String.as_str()),
                )
                .arg(clap::arg!(--json "print as json")),
        )
        .get_matches();

    init_logging(cli_args.get_flag("verbose"));

    match cli_args.subcommand() {
        Some(("sections", args)) => {
            let config = load(args).await?;

            for name in config.section_list().into_iter().sorted() {
                println!("{}", name);
            }
        }
        Some(("show", args)) => {
            let config = load(args).await?;
            let name = required(args, "SECTION")?;

            let view = config.section(name);

            if args.get_flag("json") {
                let dump = section_dump(&config, name, &view);
                println!("{}", serde_json::to_string_pretty(&dump)?);
            } else {
                for (key, value) in view.iter().sorted() {
                    // indent continuation lines so the output reads back the same
                    println!("{} = {}", key, value.split('\n').join("\n  "));
                }
            }
        }
        Some(("get", args)) => {
            let config = load(args).await?;
            let name = required(args, "SECTION")?;
            let key = required(args, "KEY")?;
            let kind: ValueKind = required(args, "kind")?
                .parse()
                .map_err(anyhow::Error::msg)?;

            let view = config.section(name);
            let re = get_value(&view, key, kind);

            if args.get_flag("json") {
                let result = match re {
                    Ok(value) => QueryResult::ok(value),
                    Err(e) => QueryResult::err(ErrorReport::from(&e)),
                };
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                let value = re.with_context(|| format!("section '{}'", name))?;
                println!("{}", value_to_string(&value));
            }
        }
        _ => unreachable!(),
    }

    return Ok(());
}

/// log records from the library are forwarded to tracing
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn load(args: &ArgMatches) -> anyhow::Result<Config> {
    let path = args
        .get_one::<PathBuf>("FILE")
        .context("missing file argument")?;

    let config = Config::load_async(path)
        .await
        .with_context(|| format!("cannot load '{}'", path.display()))?;

    return Ok(config);
}

fn required<'a>(args: &'a ArgMatches, id: &str) -> anyhow::Result<&'a str> {
    args.get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("missing argument {}", id))
}

fn section_dump(config: &Config, name: &str, view: &SectionView) -> SectionDump {
    SectionDump {
        name: name.to_string(),
        parent: config.parent(name).map(str::to_string),
        values: view
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

fn get_value(view: &SectionView, key: &str, kind: ValueKind) -> inheritini::Result<serde_json::Value> {
    let value = match kind {
        ValueKind::String => serde_json::Value::from(view.get_string(key)?),
        ValueKind::Bool => serde_json::Value::from(view.get_bool(key)?),
        ValueKind::Int => serde_json::Value::from(view.get_int(key)?),
        ValueKind::Float => serde_json::Value::from(view.get_float(key)?),
    };

    return Ok(value);
}

fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        v => v.to_string(),
    }
}
