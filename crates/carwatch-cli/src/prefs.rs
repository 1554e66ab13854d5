//! # Prefs Subcommand
//!
//! Show or change notification preferences kept in a JSON file.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use carwatch_portal::{JsonFilePreferencesStore, NotificationPreferences, PreferencesService};

/// Arguments for the `carwatch prefs` subcommand.
#[derive(Args, Debug)]
pub struct PrefsArgs {
    /// Preferences file. Overrides the configured location.
    #[arg(long)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: PrefsCommand,
}

/// Preference subcommands.
#[derive(Subcommand, Debug)]
pub enum PrefsCommand {
    /// Print the current preferences.
    Show {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Change one preference, e.g. `set notificationFrequency daily`.
    Set { key: String, value: String },
}

/// Execute the prefs subcommand. `default_path` is used when `--file` is absent.
pub fn run_prefs(args: &PrefsArgs, default_path: &Path, out: &mut impl Write) -> Result<u8> {
    let path = args.file.as_deref().unwrap_or(default_path);
    let service = PreferencesService::new(Arc::new(JsonFilePreferencesStore::new(path)));

    match &args.command {
        PrefsCommand::Show { json } => {
            let prefs = service
                .current()
                .with_context(|| format!("failed to read {}", path.display()))?;
            if *json {
                writeln!(out, "{}", serde_json::to_string_pretty(&prefs)?)?;
            } else {
                print_table(&prefs, out)?;
            }
        }
        PrefsCommand::Set { key, value } => {
            let prefs = service
                .set(key, value)
                .with_context(|| format!("failed to update {}", path.display()))?;
            tracing::info!(%key, %value, path = %path.display(), "preference updated");
            print_table(&prefs, out)?;
        }
    }
    Ok(0)
}

fn print_table(prefs: &NotificationPreferences, out: &mut impl Write) -> Result<()> {
    writeln!(out, "emailOnStatusChange    {}", prefs.email_on_status_change)?;
    writeln!(out, "emailOnNewReport       {}", prefs.email_on_new_report)?;
    writeln!(out, "emailOnUpdate          {}", prefs.email_on_update)?;
    writeln!(out, "notificationFrequency  {}", prefs.notification_frequency)?;
    Ok(())
}
