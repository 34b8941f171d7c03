//! CLI entry point for the element locator.
//!
//! Inspects and edits a locator directory, and runs detection over dumped
//! accessibility trees.
//!
//! # Usage
//!
//! ```bash
//! # Count cached elements, in total or for one window
//! locator-cli --count
//! locator-cli --count notepad
//!
//! # Resolve the element at (120, 48) in a tree dump and remember it
//! locator-cli --locate window.json 120 48 notepad
//! ```

use std::path::PathBuf;
use std::process;

use element_locator::{
    Config, ElementLocator, LocatorError, LocatorStore, Point, Result, SnapshotNode,
};

/// CLI command to execute
#[derive(Debug, Clone, PartialEq)]
enum Command {
    /// Count entities, optionally in one group
    Count(Option<String>),
    /// Print entities as JSON, optionally of one group
    List(Option<String>),
    /// Check whether an id is cached
    Contains(String, Option<String>),
    /// Remove an id and save
    Remove(String, Option<String>),
    /// Delete locator files with no group in the store
    Prune,
    /// Print a tree dump as an outline
    Tree(PathBuf),
    /// Resolve the element at a point in a tree dump
    Locate {
        snapshot: PathBuf,
        point: Point,
        file_name: Option<String>,
    },
    /// Show help message
    Help,
}

/// Global options followed by the command
#[derive(Debug, Clone, PartialEq)]
struct Invocation {
    root: Option<PathBuf>,
    config: Option<PathBuf>,
    command: Command,
}

fn parse_coordinate(value: &str, axis: &str) -> std::result::Result<i32, String> {
    value
        .parse()
        .map_err(|_| format!("invalid {} coordinate: {}", axis, value))
}

/// Parse command line arguments (without the program name)
fn parse_args(args: &[String]) -> std::result::Result<Invocation, String> {
    let mut root = None;
    let mut config = None;
    let mut rest = args;

    loop {
        match rest.first().map(String::as_str) {
            Some("--root") | Some("-r") => {
                let dir = rest.get(1).ok_or("--root requires a directory argument")?;
                root = Some(PathBuf::from(dir));
                rest = &rest[2..];
            }
            Some("--config") => {
                let path = rest.get(1).ok_or("--config requires a file argument")?;
                config = Some(PathBuf::from(path));
                rest = &rest[2..];
            }
            _ => break,
        }
    }

    let Some(first) = rest.first() else {
        return Ok(Invocation {
            root,
            config,
            command: Command::Help,
        });
    };

    let optional = |idx: usize| rest.get(idx).cloned();
    let command = match first.as_str() {
        "--count" | "-n" => Command::Count(optional(1)),
        "--list" | "-l" => Command::List(optional(1)),
        "--contains" => {
            let id = rest.get(1).ok_or("--contains requires an id argument")?;
            Command::Contains(id.clone(), optional(2))
        }
        "--remove" => {
            let id = rest.get(1).ok_or("--remove requires an id argument")?;
            Command::Remove(id.clone(), optional(2))
        }
        "--prune" => Command::Prune,
        "--tree" | "-t" => {
            let path = rest.get(1).ok_or("--tree requires a snapshot file argument")?;
            Command::Tree(PathBuf::from(path))
        }
        "--locate" => {
            if rest.len() < 4 {
                return Err(
                    "--locate requires a snapshot file and a point (e.g., --locate tree.json 120 48)"
                        .into(),
                );
            }
            Command::Locate {
                snapshot: PathBuf::from(&rest[1]),
                point: Point::new(parse_coordinate(&rest[2], "x")?, parse_coordinate(&rest[3], "y")?),
                file_name: optional(4),
            }
        }
        "--help" | "-h" => Command::Help,
        arg => return Err(format!("Unknown argument: {}", arg)),
    };

    Ok(Invocation {
        root,
        config,
        command,
    })
}

/// Print help message to stdout
fn print_help() {
    println!("locator-cli - Locate UI elements and manage the locator cache");
    println!();
    println!("USAGE:");
    println!("    locator-cli [--root <DIR>] [--config <FILE>] <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("    -n, --count [FILE]              Count cached elements");
    println!("    -l, --list [FILE]               Print cached elements as JSON");
    println!("        --contains <ID> [FILE]      Check whether an element is cached");
    println!("        --remove <ID> [FILE]        Remove a cached element and save");
    println!("        --prune                     Delete locator files with no cached group");
    println!("    -t, --tree <SNAPSHOT>           Print a tree dump as an outline");
    println!("        --locate <SNAPSHOT> <X> <Y> [FILE]");
    println!("                                    Resolve the element at a point; with FILE, remember it");
    println!("    -h, --help                      Print this help message");
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_store(config: &Config, root: Option<PathBuf>) -> Result<LocatorStore> {
    let store = match root {
        Some(root) => LocatorStore::new(root).with_extension(config.storage.extension.clone()),
        None => config.open_store(),
    };
    if !store.load()? {
        let root = store
            .root()
            .map(|root| root.display().to_string())
            .unwrap_or_default();
        return Err(LocatorError::Conflict(format!(
            "{} stores the same group in more than one file; refusing to continue",
            root
        )));
    }
    Ok(store)
}

fn run(invocation: Invocation, config: &Config) -> Result<i32> {
    let root = invocation.root;
    match invocation.command {
        Command::Help => {
            print_help();
            Ok(0)
        }
        Command::Count(file_name) => {
            let store = open_store(config, root)?;
            println!("{}", store.count(file_name.as_deref()));
            Ok(0)
        }
        Command::List(file_name) => {
            let store = open_store(config, root)?;
            let entities: Vec<_> = match file_name {
                Some(file_name) => store.entities(&file_name),
                None => store
                    .file_names()
                    .iter()
                    .flat_map(|name| store.entities(name))
                    .collect(),
            };
            print_json(&entities)?;
            Ok(0)
        }
        Command::Contains(id, file_name) => {
            let store = open_store(config, root)?;
            let found = store.contains(&id, file_name.as_deref())?;
            println!("{}", found);
            Ok(if found { 0 } else { 1 })
        }
        Command::Remove(id, file_name) => {
            let store = open_store(config, root)?;
            let removed = store.remove(&id, file_name.as_deref())?;
            if removed.is_some() {
                store.save()?;
            }
            print_json(&removed)?;
            Ok(0)
        }
        Command::Prune => {
            let store = open_store(config, root)?;
            println!("{}", store.prune_stale_files()?);
            Ok(0)
        }
        Command::Tree(path) => {
            let tree = SnapshotNode::from_file(&path)?;
            print!("{}", tree.render_tree());
            Ok(0)
        }
        Command::Locate {
            snapshot,
            point,
            file_name,
        } => {
            let tree = SnapshotNode::from_file(&snapshot)?;
            let store = open_store(config, root)?;
            let locator = ElementLocator::new(config.detector(), store.into());
            let entity = match file_name {
                Some(file_name) => {
                    let entity = locator.capture(&&tree, point, &file_name)?;
                    if entity.is_some() {
                        locator.store().save()?;
                    }
                    entity
                }
                None => {
                    let stem = snapshot
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("snapshot")
                        .to_string();
                    locator.resolve(&&tree, point, &stem)?
                }
            };
            print_json(&entity)?;
            Ok(if entity.is_some() { 0 } else { 1 })
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parse command line arguments
    let invocation = match parse_args(&args) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information.");
            process::exit(1);
        }
    };

    let config = match &invocation.config {
        Some(path) => match Config::load_strict(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        None => Config::load(),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.general.log_level.as_str()),
    )
    .init();

    log::debug!("Executing command: {:?}", invocation.command);

    let exit_code = match run(invocation, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            2
        }
    };

    log::debug!("Exiting with code: {}", exit_code);

    process::exit(exit_code);
}
