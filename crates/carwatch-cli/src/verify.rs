//! # Verify Subcommand
//!
//! Walks an owner through the ownership verification wizard on the
//! terminal: email, code, then the two documents.
//!
//! Every prompt can be answered again after an error; the wizard keeps its
//! step. End of input or `q` abandons the session with exit code 2.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use carwatch_core::{CarId, Clock};
use carwatch_state::{DocumentFile, DocumentSlot, DocumentSource};
use carwatch_store::DataStore;
use carwatch_verification::{OwnershipVerificationWizard, WizardConfig, WizardError};

/// Exit code for a session the user left before finishing.
pub const EXIT_ABANDONED: u8 = 2;

/// Arguments for the `carwatch verify` subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Car whose ownership is being verified.
    #[arg(long)]
    pub car_id: CarId,

    /// Driving license image. Prompted for when omitted.
    #[arg(long)]
    pub license: Option<PathBuf>,

    /// Ownership certificate image. Prompted for when omitted.
    #[arg(long)]
    pub ownership: Option<PathBuf>,

    /// Fixed seed for the verification code (testing only).
    #[arg(long, hide = true)]
    pub code_seed: Option<u64>,
}

/// Run an interactive verification session.
pub async fn run_verify(
    args: &VerifyArgs,
    store: Arc<dyn DataStore>,
    clock: Arc<dyn Clock>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<u8> {
    let config = WizardConfig {
        code_seed: args.code_seed,
        ..WizardConfig::default()
    };
    let mut wizard = match OwnershipVerificationWizard::open(store, clock, args.car_id, config).await
    {
        Ok(wizard) => wizard,
        Err(WizardError::UnknownCar(id)) => anyhow::bail!("no car with id {id}"),
        Err(e) => return Err(e).context("failed to open verification"),
    };

    if let Some(car) = wizard.car() {
        writeln!(out, "Verifying ownership of {}", car.label())?;
    }

    // Email
    loop {
        let prefill = wizard.email_input().to_string();
        let label = if prefill.is_empty() {
            "Email".to_string()
        } else {
            format!("Email [{prefill}]")
        };
        let Some(answer) = prompt(input, out, &label)? else {
            return abandon(out);
        };
        if is_quit(&answer) {
            return abandon(out);
        }
        let email = if answer.is_empty() { prefill } else { answer };
        match wizard.submit_email(&email).await {
            Ok(_) => break,
            Err(e) => writeln!(out, "error: {e}")?,
        }
    }
    print_notice(&wizard, out)?;

    // Code
    loop {
        let Some(code) = prompt(input, out, "Code")? else {
            return abandon(out);
        };
        if is_quit(&code) {
            return abandon(out);
        }
        match wizard.submit_code(&code).await {
            Ok(()) => break,
            Err(e) => writeln!(out, "error: {e}")?,
        }
    }
    print_notice(&wizard, out)?;

    // Documents
    let slots = [
        (DocumentSlot::License, "Driving license", args.license.as_deref()),
        (DocumentSlot::Ownership, "Ownership certificate", args.ownership.as_deref()),
    ];
    for (slot, label, preset) in slots {
        let Some(file) = choose_document(input, out, label, preset)? else {
            return abandon(out);
        };
        match slot {
            DocumentSlot::License => wizard.attach_license(file, DocumentSource::Picker)?,
            DocumentSlot::Ownership => wizard.attach_ownership(file, DocumentSource::Picker)?,
        }
    }
    loop {
        match wizard.submit_documents().await {
            Ok(urls) => {
                writeln!(out, "license: {}", urls.license)?;
                writeln!(out, "ownership: {}", urls.ownership)?;
                break;
            }
            Err(e) => {
                writeln!(out, "error: {e}")?;
                let Some(answer) = prompt(input, out, "Press enter to retry or q to quit")? else {
                    return abandon(out);
                };
                if is_quit(&answer) {
                    return abandon(out);
                }
            }
        }
    }
    print_notice(&wizard, out)?;

    if let Some(redirect) = wizard.redirect() {
        writeln!(
            out,
            "Done. Returning to {} in {}s.",
            redirect.target,
            redirect.delay.as_secs()
        )?;
    }
    Ok(0)
}

/// Load a document from `preset`, or prompt until a readable file is given.
fn choose_document(
    input: &mut impl BufRead,
    out: &mut impl Write,
    label: &str,
    preset: Option<&Path>,
) -> Result<Option<DocumentFile>> {
    let mut candidate = preset.map(Path::to_path_buf);
    loop {
        let path = match candidate.take() {
            Some(path) => path,
            None => match prompt(input, out, &format!("{label} file"))? {
                Some(answer) if is_quit(&answer) => return Ok(None),
                Some(answer) => PathBuf::from(answer),
                None => return Ok(None),
            },
        };
        match load_document(&path) {
            Ok(file) => return Ok(Some(file)),
            Err(e) => writeln!(out, "error: {e:#}")?,
        }
    }
}

/// Read a document from disk, inferring its content type from the name.
pub fn load_document(path: &Path) -> Result<DocumentFile> {
    let bytes =
        std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(DocumentFile::new(name, None, bytes))
}

/// Print `label: ` and read one trimmed line. `None` at end of input.
fn prompt(input: &mut impl BufRead, out: &mut impl Write, label: &str) -> Result<Option<String>> {
    write!(out, "{label}: ")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// `q` at any prompt leaves the session. Never a valid email, code or path
/// worth keeping.
fn is_quit(answer: &str) -> bool {
    answer.eq_ignore_ascii_case("q")
}

fn print_notice(wizard: &OwnershipVerificationWizard, out: &mut impl Write) -> Result<()> {
    if let Some(notice) = wizard.notice() {
        writeln!(out, "{notice}")?;
    }
    Ok(())
}

fn abandon(out: &mut impl Write) -> Result<u8> {
    writeln!(out)?;
    writeln!(out, "Verification not finished.")?;
    Ok(EXIT_ABANDONED)
}
