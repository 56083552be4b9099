//! Checks a real identity token against the provider's live key set.
//!
//! ```text
//! RUST_LOG=siwa=debug cargo run --example verify_token -- \
//!     --example-jwt-file token.jwt --audience com.example.app [--check-expiry] [--key-set-url URL]
//! ```
//!
//! Archived tokens are long expired, so the expiry check is skipped unless
//! `--check-expiry` is given. Signature and audience are always checked.

use clap::Parser;
use siwa::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Sign in with Apple identity token checks
#[derive(Parser, Debug)]
#[command(name = "verify_token", version, about)]
struct Cli {
    /// File holding one compact identity token
    #[arg(long)]
    example_jwt_file: PathBuf,

    /// Expected `aud` claim, usually the app's bundle identifier
    #[arg(long)]
    audience: String,

    /// Reject the token if its `exp` claim has passed
    #[arg(long)]
    check_expiry: bool,

    /// Key set endpoint, defaults to Apple's
    #[arg(long)]
    key_set_url: Option<String>,
}

fn report(number: usize, name: &str, started: Instant, outcome: &Result<(), String>) {
    let elapsed = started.elapsed().as_millis();
    match outcome {
        Ok(()) => println!("[{:03}] [PASS] {} ({}ms)", number, name, elapsed),
        Err(reason) => println!("[{:03}] [FAIL] {} ({}ms)\n       {}", number, name, elapsed, reason),
    }
}

async fn retrieve_public_keys(client: &KeySetClient) -> Result<(), String> {
    let keys = client.retrieve_all(None).await.map_err(|e| e.to_string())?;
    let first = keys.first().ok_or("the key set is empty")?;
    let specific = client
        .retrieve_by_id(first.identifier(), None)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("a listed key could not be retrieved by id")?;
    if specific.identifier() != first.identifier() {
        return Err("retrieved key has a different identifier".to_string());
    }
    Ok(())
}

async fn verify_signature(
    verifier: &Verifier,
    token: &str,
    audience: &str,
    ignore_expiry: bool,
) -> Result<(), String> {
    let valid = verifier
        .is_validly_signed(token, audience, ignore_expiry)
        .await
        .map_err(|e| e.to_string())?;
    if !valid {
        return Err("the example token was not validly signed".to_string());
    }

    // Insert one character before the last three so the signature no longer matches.
    let cut = token.len() - 3;
    let bad_token = format!("{}j{}", &token[..cut], &token[cut..]);
    let valid = verifier
        .is_validly_signed(&bad_token, audience, ignore_expiry)
        .await
        .map_err(|e| e.to_string())?;
    if valid {
        return Err("a corrupted signature was accepted".to_string());
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<bool, String> {
    let ignore_expiry = !cli.check_expiry;

    let token = fs::read_to_string(&cli.example_jwt_file)
        .map_err(|e| format!("Failed to read {}: {}", cli.example_jwt_file.display(), e))?;
    let token = token.trim();

    let mut builder = ConfigBuilder::new();
    if let Some(url) = &cli.key_set_url {
        builder = builder.key_set_url(url).map_err(|e| e.to_string())?;
    }
    let config = builder.build().map_err(|e| e.to_string())?;
    let verifier = Verifier::new(config).map_err(|e| e.to_string())?;

    println!("Executing Sign in with Apple checks");

    let started = Instant::now();
    let outcome = retrieve_public_keys(verifier.client()).await;
    report(1, "Retrieve the provider's public keys", started, &outcome);
    if outcome.is_err() {
        return Ok(false);
    }

    let started = Instant::now();
    let outcome = IdentityToken::parse(token).map(|_| ()).map_err(|e| e.to_string());
    report(2, "Parse an identity token", started, &outcome);
    if outcome.is_err() {
        return Ok(false);
    }

    let started = Instant::now();
    let outcome = verify_signature(&verifier, token, &cli.audience, ignore_expiry).await;
    report(3, "Verify an identity token's signature", started, &outcome);

    println!("Check sequence complete.");
    Ok(outcome.is_ok())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match run(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn accepts_separate_and_inline_values() {
        let cli = Cli::try_parse_from([
            "verify_token",
            "--example-jwt-file=token.jwt",
            "--audience",
            "com.example.app",
        ])
        .unwrap();
        assert_eq!(cli.example_jwt_file, PathBuf::from("token.jwt"));
        assert_eq!(cli.audience, "com.example.app");
        assert!(cli.key_set_url.is_none());
    }

    #[test]
    fn expiry_is_skipped_unless_requested() {
        let base = ["verify_token", "--example-jwt-file", "t.jwt", "--audience", "a"];
        assert!(!Cli::try_parse_from(base).unwrap().check_expiry);

        let cli = Cli::try_parse_from(base.into_iter().chain(["--check-expiry"])).unwrap();
        assert!(cli.check_expiry);
    }

    #[test]
    fn rejects_unknown_flag() {
        let err = Cli::try_parse_from([
            "verify_token",
            "--example-jwt-file",
            "t.jwt",
            "--audence",
            "com.example.app",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn requires_audience() {
        let err = Cli::try_parse_from(["verify_token", "--example-jwt-file", "t.jwt"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }
}
