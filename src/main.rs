use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use typed_data_encoder::utils::logging;
use typed_data_encoder::{log_error, log_info, TypedData};

/// Compute the EIP-712 domain separator, struct hash and signing hash of a
/// typed-data JSON document.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Typed-data JSON file ({types, primaryType?, domain, message}); stdin if omitted
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Print a single JSON object instead of text
    #[arg(long)]
    json: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Output {
    domain_separator: String,
    hash_struct: String,
    signing_hash: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.verbose {
        logging::enable_debug();
    }

    let payload = match &args.file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            buffer
        }
    };

    let typed_data = TypedData::from_json(&payload)?;
    let encoded = match typed_data.encode() {
        Ok(encoded) => encoded,
        Err(e) => {
            log_error!("cli", "Encoding failed", error = e);
            return Err(e).context("failed to encode typed data");
        }
    };

    let output = Output {
        domain_separator: format!("0x{}", hex::encode(encoded.header)),
        hash_struct: format!("0x{}", hex::encode(encoded.body)),
        signing_hash: format!("0x{}", hex::encode(encoded.signing_hash())),
    };

    if args.json {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("domainSeparator: {}", output.domain_separator);
        println!("hashStruct(message): {}", output.hash_struct);
        println!("signingHash: {}", output.signing_hash);
    }

    if args.verbose {
        log_info!("cli", "Done", signing_hash = output.signing_hash);
    }

    Ok(())
}
