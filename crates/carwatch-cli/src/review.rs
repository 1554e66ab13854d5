//! # Review Subcommand
//!
//! Administrator queue for ownership verification requests.
//!
//! ## Subcommands
//!
//! - `list`: Requests newest first, pending only unless `--status` says otherwise.
//! - `show`: One request with its car.
//! - `approve` / `reject` / `expire`: Move a pending request to a final status.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use carwatch_core::VerificationId;
use carwatch_state::VerificationRequest;
use carwatch_store::DataStore;
use carwatch_verification::{StatusFilter, VerificationReview};

/// Arguments for the `carwatch review` subcommand.
#[derive(Args, Debug)]
pub struct ReviewArgs {
    #[command(subcommand)]
    pub command: ReviewCommand,
}

/// Review subcommands.
#[derive(Subcommand, Debug)]
pub enum ReviewCommand {
    /// List verification requests, newest first.
    List {
        /// `all`, `pending`, `verified`, `rejected` or `expired`.
        #[arg(long, default_value = "pending")]
        status: StatusFilter,
        /// Print rows as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show one request and the car it belongs to.
    Show {
        #[arg(long)]
        id: VerificationId,
    },

    /// Approve a pending request (pending → verified).
    Approve {
        #[arg(long)]
        id: VerificationId,
    },

    /// Reject a pending request (pending → rejected).
    Reject {
        #[arg(long)]
        id: VerificationId,
    },

    /// Mark a pending request expired (pending → expired).
    Expire {
        #[arg(long)]
        id: VerificationId,
    },
}

/// Execute the review subcommand.
pub async fn run_review(
    args: &ReviewArgs,
    store: Arc<dyn DataStore>,
    out: &mut impl Write,
) -> Result<u8> {
    let review = VerificationReview::new(store);

    match &args.command {
        ReviewCommand::List { status, json } => {
            let requests = review
                .list(*status)
                .await
                .context("failed to list verification requests")?;
            if *json {
                writeln!(out, "{}", serde_json::to_string_pretty(&requests)?)?;
            } else if requests.is_empty() {
                writeln!(out, "No verification requests.")?;
            } else {
                for request in &requests {
                    writeln!(out, "{}", summary_line(request))?;
                }
            }
            Ok(0)
        }
        ReviewCommand::Show { id } => {
            let (request, car) = review
                .detail(*id)
                .await
                .with_context(|| format!("failed to load request {id}"))?;
            writeln!(out, "id:         {}", request.id)?;
            match car {
                Some(car) => writeln!(out, "car:        {} ({})", car.label(), car.id)?,
                None => writeln!(out, "car:        {} (not found)", request.car_id)?,
            }
            writeln!(out, "email:      {}", request.owner_email)?;
            writeln!(out, "status:     {}", request.status)?;
            writeln!(out, "created:    {}", request.created_at)?;
            writeln!(out, "expires:    {}", request.code_expires_at)?;
            writeln!(
                out,
                "license:    {}",
                request.license_document_url.as_deref().unwrap_or("-")
            )?;
            writeln!(
                out,
                "ownership:  {}",
                request.ownership_document_url.as_deref().unwrap_or("-")
            )?;
            if let Some(at) = request.verified_at {
                writeln!(out, "uploaded:   {at}")?;
            }
            Ok(0)
        }
        ReviewCommand::Approve { id } => {
            let request = review
                .approve(*id)
                .await
                .with_context(|| format!("cannot approve {id}"))?;
            writeln!(out, "{id}: {}", request.status)?;
            Ok(0)
        }
        ReviewCommand::Reject { id } => {
            let request = review
                .reject(*id)
                .await
                .with_context(|| format!("cannot reject {id}"))?;
            writeln!(out, "{id}: {}", request.status)?;
            Ok(0)
        }
        ReviewCommand::Expire { id } => {
            let request = review
                .expire(*id)
                .await
                .with_context(|| format!("cannot expire {id}"))?;
            writeln!(out, "{id}: {}", request.status)?;
            Ok(0)
        }
    }
}

fn summary_line(request: &VerificationRequest) -> String {
    let documents = if request.has_documents() { "documents" } else { "-" };
    format!(
        "{}  {:<8}  {}  {}  {}",
        request.id,
        request.status.as_str(),
        request.created_at,
        request.owner_email,
        documents
    )
}
