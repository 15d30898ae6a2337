use std::env;
use anyhow::Context;
use js_obfuscator::{obfuscate, Options};
use tracing::info;
use tracing_subscriber::EnvFilter;

// Obfuscates the given JavaScript file and prints the result.
// Options are read from an optional JSON file, e.g. `{"seed": 1, "splitStrings": true}`.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let path = match args.get(1) {
        Some(v) => v,
        None => {
            println!("Usage: obfuscator <file.js> [options.json]");
            return Ok(());
        }
    };

    let code = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path))?;
    let options = match args.get(2) {
        Some(v) => {
            let json = std::fs::read_to_string(v)
                .with_context(|| format!("failed to read {}", v))?;
            Options::from_json(&json).context("invalid options")?
        },
        None => Options::default()
    };

    let result = obfuscate(&code, &options)?;
    info!(seed = result.seed, "obfuscated {}", path);

    println!("{}", result.code);
    Ok(())
}
