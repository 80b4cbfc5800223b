//! verify command - Check svn credentials
//!
//! Runs a non-interactive `svn info` against the URL without caching the
//! credentials. The password is prompted for (masked) or read from stdin.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context as _, Result};

use super::{print_json, runtime};
use crate::backend::svn::SvnBackend;
use crate::cli::Context;
use crate::core::config::Config;

/// Run the verify command.
pub fn verify(ctx: &Context, url: &str, username: &str, password_stdin: bool) -> Result<()> {
    let password = read_password(ctx, url, password_stdin)?;
    let config = Config::load(None)
        .context("Failed to load configuration")?
        .config;
    let backend = SvnBackend::new(config.svn());

    let rt = runtime()?;
    let accepted = rt
        .block_on(backend.verify_credentials(url, username, &password))
        .context("Failed to run svn")?;

    if ctx.json {
        print_json(&serde_json::json!({ "url": url, "accepted": accepted }))?;
    } else if accepted && !ctx.quiet {
        println!("Credentials accepted for {}.", url);
    }

    if !accepted {
        bail!("Credentials rejected for {}", url);
    }
    Ok(())
}

fn read_password(ctx: &Context, url: &str, from_stdin: bool) -> Result<String> {
    let password = if from_stdin {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read password from stdin")?;
        line.trim_end_matches(['\r', '\n']).to_string()
    } else {
        if ctx.quiet {
            bail!("Password required. Use --password-stdin or run without --quiet.");
        }
        print!("Password for {}: ", url);
        io::stdout().flush()?;
        rpassword::read_password().context("Failed to read password")?
    };

    if password.is_empty() {
        bail!("Password cannot be empty.");
    }
    Ok(password)
}
