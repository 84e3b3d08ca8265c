//! CLI tool for issuing icepeak bearer tokens.
//!
//! Generates HS256 JWTs carrying a path-prefix whitelist for the server's
//! `--jwt-secret`.
//!
//! # Usage
//!
//! ```bash
//! # Full access to the whole document for one hour
//! icepeak-token --secret hunter2 --grant "=read,write"
//!
//! # Read-only access under so/deep, write access under scratch, one week
//! icepeak-token --secret hunter2 --grant so/deep=read --grant scratch=write --expires-in 7d
//!
//! # Ready-to-use curl command
//! icepeak-token --secret hunter2 --grant "=read" --output curl
//! ```

use clap::{Parser, ValueEnum};
use icepeak_server::auth::{AccessMode, Claims, CLAIMS_VERSION};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Generate bearer tokens for the icepeak server
#[derive(Parser, Debug)]
#[command(name = "icepeak-token")]
#[command(about = "Generate bearer tokens for icepeak authentication")]
struct Args {
    /// Shared secret, matching the server's --jwt-secret
    #[arg(long, env = "ICEPEAK_JWT_SECRET", hide_env_values = true)]
    secret: String,

    /// Grant in the form "path/prefix=mode[,mode]"; an empty prefix grants
    /// the whole document (repeatable)
    #[arg(long = "grant", required = true)]
    grants: Vec<String>,

    /// Token lifetime (e.g. "1h", "30m", "7d", "1w"); "none" for no expiry
    #[arg(long, default_value = "1h")]
    expires_in: String,

    /// Output format
    #[arg(long, default_value = "token", value_enum)]
    output: OutputFormat,

    /// Server base URL used in curl output
    #[arg(long, default_value = "http://localhost:3000")]
    server_url: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Just the JWT string
    Token,
    /// JSON object with token and decoded claims
    Json,
    /// Ready-to-use curl command
    Curl,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut whitelist: HashMap<String, Vec<AccessMode>> = HashMap::new();
    for grant in &args.grants {
        let (prefix, modes) = parse_grant(grant)?;
        whitelist.entry(prefix).or_default().extend(modes);
    }

    let exp = match args.expires_in.as_str() {
        "none" => None,
        spec => {
            let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
            Some(now + parse_duration(spec)?)
        }
    };

    let claims = Claims {
        version: CLAIMS_VERSION,
        whitelist,
        exp,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(args.secret.as_bytes()),
    )?;

    match args.output {
        OutputFormat::Token => println!("{}", token),
        OutputFormat::Json => {
            let out = serde_json::json!({
                "token": token,
                "claims": claims,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Curl => {
            println!(
                "curl -H 'Authorization: Bearer {}' {}/",
                token, args.server_url
            );
        }
    }

    Ok(())
}

/// Parse `"path/prefix=read,write"` into a whitelist entry.
fn parse_grant(grant: &str) -> Result<(String, Vec<AccessMode>), String> {
    let (prefix, modes_spec) = grant
        .split_once('=')
        .ok_or_else(|| format!("grant must look like 'path/prefix=mode[,mode]': {grant}"))?;

    let modes = modes_spec
        .split(',')
        .map(|mode| match mode.trim() {
            "read" => Ok(AccessMode::Read),
            "write" => Ok(AccessMode::Write),
            other => Err(format!("unknown mode '{other}' (expected read or write)")),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((prefix.trim_matches('/').to_string(), modes))
}

/// Parse durations like "90s", "30m", "1h", "7d", "1w"; a bare number is
/// seconds.
fn parse_duration(spec: &str) -> Result<u64, String> {
    let spec = spec.trim();
    let (number, unit) = match spec.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => spec.split_at(idx),
        None => (spec, "s"),
    };
    let number: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration: {spec}"))?;
    let seconds = match unit {
        "s" => number,
        "m" => number * 60,
        "h" => number * 3600,
        "d" => number * 86400,
        "w" => number * 7 * 86400,
        _ => return Err(format!("invalid duration unit '{unit}' in {spec}")),
    };
    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("90").unwrap(), 90);
        assert_eq!(parse_duration("90s").unwrap(), 90);
        assert_eq!(parse_duration("30m").unwrap(), 1800);
        assert_eq!(parse_duration("1h").unwrap(), 3600);
        assert_eq!(parse_duration("7d").unwrap(), 604800);
        assert_eq!(parse_duration("1w").unwrap(), 604800);
        assert!(parse_duration("5 parsecs").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn parse_grant_forms() {
        let (prefix, modes) = parse_grant("a/b=read,write").unwrap();
        assert_eq!(prefix, "a/b");
        assert_eq!(modes, vec![AccessMode::Read, AccessMode::Write]);

        let (prefix, modes) = parse_grant("=read").unwrap();
        assert_eq!(prefix, "");
        assert_eq!(modes, vec![AccessMode::Read]);

        // Surrounding slashes are normalized away.
        let (prefix, _) = parse_grant("/a/b/=write").unwrap();
        assert_eq!(prefix, "a/b");

        assert!(parse_grant("no-modes").is_err());
        assert!(parse_grant("a=fly").is_err());
    }
}
