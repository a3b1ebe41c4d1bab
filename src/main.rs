//! stashkv - Namespaced, Expiring Key-Value Storage
//!
//! Command-line front end over a file-backed `localStorage`. Each invocation
//! opens the store, runs one command, prints the result as JSON and exits.

use anyhow::{bail, Context};
use serde_json::{json, Value};
use stashkv::backend::{FileBackend, MemoryHost, LOCAL_STORAGE};
use stashkv::{NamespacedStore, StoreConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// CLI configuration
struct Config {
    /// Storage file backing localStorage
    file: PathBuf,
    /// Namespace to operate in
    namespace: String,
    /// Refuse to open a namespace that already has keys
    strict: bool,
    /// TTL for `set`, in seconds
    ttl: Option<u64>,
    /// Replace live values on `set`
    overwrite: bool,
    /// Enable debug logging
    verbose: bool,
    /// Command and its positional arguments
    command: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file: PathBuf::from("stashkv.json"),
            namespace: stashkv::config::DEFAULT_NAMESPACE.to_string(),
            strict: false,
            ttl: None,
            overwrite: false,
            verbose: false,
            command: Vec::new(),
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Self> {
        let mut config = Config::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--file" | "-f" => {
                    let value = args.next().context("--file requires a value")?;
                    config.file = PathBuf::from(value);
                }
                "--namespace" | "-n" => {
                    config.namespace = args.next().context("--namespace requires a value")?;
                }
                "--ttl" | "-t" => {
                    let value = args.next().context("--ttl requires a value")?;
                    config.ttl = Some(value.parse().context("invalid TTL")?);
                }
                "--overwrite" | "-o" => config.overwrite = true,
                "--strict" => config.strict = true,
                "--verbose" => config.verbose = true,
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("stashkv version {}", stashkv::VERSION);
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => bail!("unknown argument: {}", flag),
                _ => config.command.push(arg),
            }
        }

        if config.command.is_empty() {
            print_help();
            bail!("no command given");
        }

        Ok(config)
    }
}

fn print_help() {
    println!(
        r#"
stashkv - Namespaced, Expiring Key-Value Storage

USAGE:
    stashkv [OPTIONS] <COMMAND> [ARGS]

OPTIONS:
    -f, --file <PATH>         Storage file (default: stashkv.json)
    -n, --namespace <NAME>    Namespace to operate in (default: stash)
    -t, --ttl <SECONDS>       Expire values written by `set`
    -o, --overwrite           Let `set` replace live values
        --strict              Fail if the namespace already has keys
        --verbose             Enable debug logging
    -v, --version             Print version information
    -h, --help                Print this help message

COMMANDS:
    get <KEY>                 Print a value (null if absent)
    set <KEY> <JSON>          Store a JSON value
    remove <KEY>              Delete a key, printing its value
    remove-value <JSON>       Delete every key holding this value
    keys                      List live keys
    all                       Print every live entry
    size                      Count live keys
    has <KEY>                 Print whether a key is live
    cleanup                   Evict expired entries
    clear                     Delete every key in the namespace
    clear-all                 Delete every key in the file

EXAMPLES:
    stashkv -n auth --ttl 900 set token '"abc123"'
    stashkv -n auth get token
    stashkv -n cart all
"#
    );
}

/// Parses a JSON argument, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn arg<'a>(command: &'a [String], index: usize, name: &str) -> anyhow::Result<&'a str> {
    command
        .get(index)
        .map(String::as_str)
        .with_context(|| format!("{} requires <{}>", command[0], name))
}

/// Runs one command against the store and returns its JSON result.
fn run(store: &NamespacedStore, config: &Config) -> anyhow::Result<Value> {
    let command = &config.command;
    debug!(command = %command[0], namespace = store.namespace(), "Running command");

    let result = match command[0].as_str() {
        "get" => store.get(arg(command, 1, "KEY")?).unwrap_or(Value::Null),
        "set" => {
            let key = arg(command, 1, "KEY")?;
            let value = parse_value(arg(command, 2, "JSON")?);
            let ttl = config.ttl.map(Duration::from_secs);
            json!({ "written": store.set([(key, value)], config.overwrite, ttl) })
        }
        "remove" => store.remove_key(arg(command, 1, "KEY")?).unwrap_or(Value::Null),
        "remove-value" => json!(store.remove_value(&parse_value(arg(command, 1, "JSON")?))),
        "keys" => json!(store.keys()),
        "all" => Value::Object(store.get_all()),
        "size" => json!(store.size()),
        "has" => json!(store.has(arg(command, 1, "KEY")?)),
        "cleanup" => json!({ "evicted": store.cleanup() }),
        "clear" => json!({ "removed": store.clear() }),
        "clear-all" => {
            store.clear_all();
            json!({ "cleared": true })
        }
        other => bail!("unknown command: {}", other),
    };

    Ok(result)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args(std::env::args().skip(1))?;

    // Set up logging (RUST_LOG overrides the default level)
    let default_level = if config.verbose { "debug" } else { "warn" };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let host = MemoryHost::new().with_storage(
        LOCAL_STORAGE,
        Arc::new(FileBackend::open(&config.file)),
    );

    let store_config = StoreConfig::default()
        .with_store(LOCAL_STORAGE)
        .with_namespace(config.namespace.clone())
        .with_allow_duplicate_namespaces(!config.strict);

    let store = NamespacedStore::open(&host, store_config)
        .with_context(|| format!("failed to open {}", config.file.display()))?;

    let result = run(&store, &config)?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stashkv::MemoryBackend;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn store() -> NamespacedStore {
        NamespacedStore::with_backend(Arc::new(MemoryBackend::new()), StoreConfig::default())
            .unwrap()
    }

    #[test]
    fn test_parse_args() {
        let config =
            Config::from_args(args(&["-n", "auth", "--ttl", "60", "-o", "set", "k", "1"])).unwrap();

        assert_eq!(config.namespace, "auth");
        assert_eq!(config.ttl, Some(60));
        assert!(config.overwrite);
        assert_eq!(config.command, vec!["set", "k", "1"]);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(Config::from_args(args(&["--ttl", "soon", "keys"])).is_err());
        assert!(Config::from_args(args(&["--bogus", "keys"])).is_err());
        assert!(Config::from_args(args(&["--namespace"])).is_err());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value(r#"{"a":true}"#), json!({"a": true}));
        assert_eq!(parse_value("plain text"), json!("plain text"));
    }

    #[test]
    fn test_run_commands() {
        let store = store();
        let config = |list: &[&str]| Config::from_args(args(list)).unwrap();

        assert_eq!(
            run(&store, &config(&["set", "k", "1"])).unwrap(),
            json!({"written": 1})
        );
        assert_eq!(run(&store, &config(&["get", "k"])).unwrap(), json!(1));
        assert_eq!(run(&store, &config(&["has", "k"])).unwrap(), json!(true));
        assert_eq!(run(&store, &config(&["keys"])).unwrap(), json!(["k"]));
        assert_eq!(run(&store, &config(&["all"])).unwrap(), json!({"k": 1}));
        assert_eq!(run(&store, &config(&["remove-value", "1"])).unwrap(), json!(["k"]));
        assert_eq!(run(&store, &config(&["size"])).unwrap(), json!(0));
        assert_eq!(run(&store, &config(&["get", "k"])).unwrap(), Value::Null);

        assert!(run(&store, &config(&["get"])).is_err());
        assert!(run(&store, &config(&["frobnicate"])).is_err());
    }
}
