//! FolioVault CLI - Command line interface for vault operations.
//!
//! This tool locks and unlocks the portfolio tree, manages the master
//! password record, and exports individual files without unlocking the
//! whole vault.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use zeroize::Zeroizing;

use foliovault_cache::DecryptionCache;
use foliovault_vault::config::{DATA_DIR_ENV, PORTFOLIOS_ENV};
use foliovault_vault::{PasswordAuthority, VaultDirs, VaultManager, VaultReader};

#[derive(Parser)]
#[command(name = "foliovault")]
#[command(about = "FolioVault - Encryption at rest for portfolio media")]
#[command(version)]
struct Cli {
    /// Application data directory holding the password and state records.
    #[arg(long, env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Root of the portfolio tree to lock and unlock.
    #[arg(long, env = PORTFOLIOS_ENV)]
    portfolios: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show lock state, password status, and file counts.
    Status {
        /// Emit machine-readable JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Encrypt every portfolio file and mark the vault locked.
    Lock {
        /// Master password (prompted when omitted).
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Decrypt every portfolio file and mark the vault unlocked.
    Unlock {
        /// Master password (prompted when omitted).
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Bootstrap the default master password if none is set.
    Init,

    /// Set the master password on a vault that has none.
    SetPassword,

    /// Rotate the master password.
    ChangePassword,

    /// Check a password against the stored record.
    Verify {
        /// Password to check (prompted when omitted).
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Replace the password record with the default password.
    ResetPassword {
        /// Confirm the reset. Files already encrypted keep their old
        /// password.
        #[arg(long)]
        yes: bool,
    },

    /// Decrypt one vault file to a destination file or stdout.
    Export {
        /// Vault file, by either its plaintext or encrypted path.
        file: PathBuf,

        /// Destination path (stdout when omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Master password (prompted when omitted).
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let dirs = VaultDirs::resolve(cli.data_dir, cli.portfolios);

    match cli.command {
        Commands::Status { json } => cmd_status(&dirs, json).await,

        Commands::Lock { password } => cmd_lock(&dirs, password).await,

        Commands::Unlock { password } => cmd_unlock(&dirs, password).await,

        Commands::Init => cmd_init(&dirs).await,

        Commands::SetPassword => cmd_set_password(&dirs).await,

        Commands::ChangePassword => cmd_change_password(&dirs).await,

        Commands::Verify { password } => cmd_verify(&dirs, password).await,

        Commands::ResetPassword { yes } => cmd_reset_password(&dirs, yes).await,

        Commands::Export {
            file,
            output,
            password,
        } => cmd_export(&dirs, &file, output, password).await,
    }
}

/// Prompt for password securely.
fn prompt_password(prompt: &str) -> Result<Zeroizing<String>> {
    let password = rpassword::prompt_password(prompt).context("Failed to read password")?;
    Ok(Zeroizing::new(password))
}

/// Use the password from the command line, or prompt for one.
fn password_or_prompt(supplied: Option<String>, prompt: &str) -> Result<Zeroizing<String>> {
    match supplied {
        Some(password) => Ok(Zeroizing::new(password)),
        None => prompt_password(prompt),
    }
}

/// Verify the supplied password against the stored record, refusing to
/// continue when none is configured.
async fn checked_password(
    dirs: &VaultDirs,
    supplied: Option<String>,
) -> Result<Zeroizing<String>> {
    let authority = PasswordAuthority::new(dirs);
    if !authority.has_password().await {
        anyhow::bail!(
            "No master password is set; run `foliovault init` or `foliovault set-password` first"
        );
    }

    let password = password_or_prompt(supplied, "Master password: ")?;
    if !authority.verify_password(&password).await {
        anyhow::bail!("Incorrect password");
    }
    Ok(password)
}

/// Show lock state and file counts.
async fn cmd_status(dirs: &VaultDirs, json: bool) -> Result<()> {
    let manager = VaultManager::new(dirs.clone());
    let authority = PasswordAuthority::new(dirs);

    let stats = manager.stats().await?;
    let password_set = authority.has_password().await;

    if json {
        let mut payload = serde_json::to_value(&stats)?;
        payload["password_set"] = serde_json::Value::Bool(password_set);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Vault status:");
    println!("  Portfolios: {}", dirs.portfolios_root.display());
    println!("  Locked:     {}", if stats.locked { "yes" } else { "no" });
    println!(
        "  Password:   {}",
        if password_set { "set" } else { "not set" }
    );
    println!("  Files:      {} total", stats.total_files);
    println!("    encrypted: {}", stats.encrypted_files);
    println!("    plaintext: {}", stats.unencrypted_files);

    Ok(())
}

/// Lock the vault.
async fn cmd_lock(dirs: &VaultDirs, password: Option<String>) -> Result<()> {
    info!("Locking vault at: {}", dirs.portfolios_root.display());

    let password = checked_password(dirs, password).await?;
    let manager = VaultManager::new(dirs.clone());
    let report = manager.lock(&password).await?;

    if !report.success {
        for error in &report.errors {
            println!("  error: {}", error);
        }
        anyhow::bail!("Lock finished with {} error(s)", report.errors.len());
    }

    println!("Vault locked: {} file(s) encrypted.", report.files_encrypted);
    Ok(())
}

/// Unlock the vault.
async fn cmd_unlock(dirs: &VaultDirs, password: Option<String>) -> Result<()> {
    info!("Unlocking vault at: {}", dirs.portfolios_root.display());

    let password = checked_password(dirs, password).await?;
    let manager = VaultManager::new(dirs.clone());
    let report = manager.unlock(&password).await?;

    if !report.success {
        for error in &report.errors {
            println!("  error: {}", error);
        }
        anyhow::bail!(
            "Unlock finished with {} error(s); vault stays locked",
            report.errors.len()
        );
    }

    println!(
        "Vault unlocked: {} file(s) decrypted.",
        report.files_decrypted
    );
    Ok(())
}

/// Bootstrap the default password record.
async fn cmd_init(dirs: &VaultDirs) -> Result<()> {
    let authority = PasswordAuthority::new(dirs);

    if authority.initialize_default().await?.applied() {
        println!("Default master password configured.");
        println!("Change it with `foliovault change-password` before locking anything.");
    } else {
        println!("A master password is already configured; nothing to do.");
    }
    Ok(())
}

/// Set the master password for the first time.
async fn cmd_set_password(dirs: &VaultDirs) -> Result<()> {
    let password = prompt_password("New master password: ")?;
    let confirm = prompt_password("Confirm master password: ")?;

    if *password != *confirm {
        anyhow::bail!("Passwords do not match");
    }
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    let authority = PasswordAuthority::new(dirs);
    if !authority.set_password(&password).await?.applied() {
        anyhow::bail!("A master password is already set; use `foliovault change-password`");
    }

    println!("Master password set.");
    Ok(())
}

/// Rotate the master password.
async fn cmd_change_password(dirs: &VaultDirs) -> Result<()> {
    let current = prompt_password("Current master password: ")?;
    let new_password = prompt_password("New master password: ")?;
    let confirm = prompt_password("Confirm new password: ")?;

    if *new_password != *confirm {
        anyhow::bail!("New passwords do not match");
    }
    if new_password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    let authority = PasswordAuthority::new(dirs);
    if !authority
        .change_password(&current, &new_password)
        .await?
        .applied()
    {
        anyhow::bail!("Current password is incorrect");
    }

    println!("Password changed successfully.");
    println!("Note: files locked under the old password must be unlocked with it first.");
    Ok(())
}

/// Check a password against the record.
async fn cmd_verify(dirs: &VaultDirs, password: Option<String>) -> Result<()> {
    let authority = PasswordAuthority::new(dirs);
    let password = password_or_prompt(password, "Master password: ")?;

    if authority.verify_password(&password).await {
        println!("Password is correct.");
        Ok(())
    } else {
        anyhow::bail!("Incorrect password");
    }
}

/// Replace the password record with the default one.
async fn cmd_reset_password(dirs: &VaultDirs, yes: bool) -> Result<()> {
    if !yes {
        anyhow::bail!(
            "Refusing to reset without --yes. Files already encrypted keep their old password."
        );
    }

    let authority = PasswordAuthority::new(dirs);
    authority.reset_to_default().await?;

    println!("Password record reset to the default password.");
    println!("Files encrypted under the previous password still require it to unlock.");
    Ok(())
}

/// Decrypt one file to a destination or stdout.
async fn cmd_export(
    dirs: &VaultDirs,
    file: &PathBuf,
    output: Option<PathBuf>,
    password: Option<String>,
) -> Result<()> {
    let password = checked_password(dirs, password).await?;
    let reader = VaultReader::new(Arc::new(DecryptionCache::default()));

    let data = reader
        .read(file, &password)
        .await
        .with_context(|| format!("Failed to export {}", file.display()))?;

    match output {
        Some(dest) => {
            tokio::fs::write(&dest, &data)
                .await
                .context("Failed to write output file")?;
            println!("Exported {} byte(s) to {}", data.len(), dest.display());
        }
        None => {
            use std::io::Write;
            std::io::stdout()
                .write_all(&data)
                .context("Failed to write to stdout")?;
        }
    }

    Ok(())
}
