//! # Ownership Verification Wizard
//!
//! Drives one owner through `email → code → documents → success` for a
//! single car.
//!
//! Each submit method performs its step's validation and store round trips
//! and either advances the wizard or returns a [`WizardError`]. On error the
//! wizard stays on the same step and remembers the message in
//! [`last_error`](OwnershipVerificationWizard::last_error), so the step can
//! simply be resubmitted. Submit methods take `&mut self`; a second
//! submission cannot begin while one is in flight.
//!
//! Nothing is retried automatically.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use carwatch_core::{CarId, Clock, EmailAddress, Timestamp};
use carwatch_state::{
    CodeForm, DocumentFile, DocumentSlot, DocumentSource, DocumentUrls, DocumentsForm, EmailForm,
    VerificationCode, VerificationRequest, WizardProgress, WizardStep, WizardTransitionError,
    CODE_TTL_HOURS,
};
use carwatch_store::DataStore;

use crate::error::WizardError;
use crate::repository::{CarSummary, VerificationRepository, DOCUMENT_BUCKET};

/// Tunables for the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardConfig {
    /// Storage bucket for uploaded documents.
    pub bucket: String,
    /// How long an issued code stays valid.
    pub code_ttl: chrono::Duration,
    /// Where the front-end navigates after success.
    pub redirect_target: String,
    /// How long the success screen stays up.
    pub redirect_delay: Duration,
    /// Fixed seed for code generation. `None` seeds from the OS.
    pub code_seed: Option<u64>,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            bucket: DOCUMENT_BUCKET.to_string(),
            code_ttl: chrono::Duration::hours(CODE_TTL_HOURS),
            redirect_target: "/".to_string(),
            redirect_delay: Duration::from_secs(3),
            code_seed: None,
        }
    }
}

/// Navigation the front-end performs once the wizard succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: String,
    pub delay: Duration,
}

/// One verification session for one car.
pub struct OwnershipVerificationWizard {
    repo: VerificationRepository,
    clock: Arc<dyn Clock>,
    config: WizardConfig,
    rng: StdRng,
    car_id: CarId,
    car: Option<CarSummary>,
    progress: WizardProgress,
    email_form: EmailForm,
    documents: DocumentsForm,
    owner_email: Option<EmailAddress>,
    active: Option<VerificationRequest>,
    last_upload_stamp: Option<i64>,
    notice: Option<String>,
    last_error: Option<String>,
}

impl std::fmt::Debug for OwnershipVerificationWizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnershipVerificationWizard")
            .field("car_id", &self.car_id)
            .field("step", &self.progress.step())
            .field("owner_email", &self.owner_email)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl OwnershipVerificationWizard {
    /// A wizard for `car_id` without looking the car up.
    pub fn new(store: Arc<dyn DataStore>, clock: Arc<dyn Clock>, car_id: CarId) -> Self {
        Self::with_config(store, clock, car_id, WizardConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn DataStore>,
        clock: Arc<dyn Clock>,
        car_id: CarId,
        config: WizardConfig,
    ) -> Self {
        let rng = match config.code_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            repo: VerificationRepository::with_bucket(store, config.bucket.clone()),
            clock,
            config,
            rng,
            car_id,
            car: None,
            progress: WizardProgress::new(),
            email_form: EmailForm::default(),
            documents: DocumentsForm::new(),
            owner_email: None,
            active: None,
            last_upload_stamp: None,
            notice: None,
            last_error: None,
        }
    }

    /// Look the car up and pre-fill the email field from its owner email.
    pub async fn open(
        store: Arc<dyn DataStore>,
        clock: Arc<dyn Clock>,
        car_id: CarId,
        config: WizardConfig,
    ) -> Result<Self, WizardError> {
        let mut wizard = Self::with_config(store, clock, car_id, config);
        let car = wizard.repo.car(car_id).await.map_err(|e| {
            if e.is_not_found() {
                WizardError::UnknownCar(car_id)
            } else {
                WizardError::Store(e)
            }
        })?;
        if let Some(email) = car.owner_email.as_deref() {
            wizard.email_form = EmailForm::new(email.trim());
        }
        tracing::debug!(%car_id, car = %car.label(), "verification wizard opened");
        wizard.car = Some(car);
        Ok(wizard)
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn car_id(&self) -> CarId {
        self.car_id
    }

    pub fn car(&self) -> Option<&CarSummary> {
        self.car.as_ref()
    }

    pub fn step(&self) -> WizardStep {
        self.progress.step()
    }

    pub fn progress(&self) -> &WizardProgress {
        &self.progress
    }

    /// Current contents of the email field.
    pub fn email_input(&self) -> &str {
        &self.email_form.email
    }

    /// The email the code was issued to, once past the email step.
    pub fn owner_email(&self) -> Option<&EmailAddress> {
        self.owner_email.as_ref()
    }

    /// The request the entered code matched, once past the code step.
    pub fn active_request(&self) -> Option<&VerificationRequest> {
        self.active.as_ref()
    }

    pub fn documents(&self) -> &DocumentsForm {
        &self.documents
    }

    /// Informational message from the last successful step.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Message from the last failed step, cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Navigation to perform, once the wizard has succeeded.
    pub fn redirect(&self) -> Option<Redirect> {
        self.progress.is_complete().then(|| Redirect {
            target: self.config.redirect_target.clone(),
            delay: self.config.redirect_delay,
        })
    }

    // ── Email step ──────────────────────────────────────────────────

    /// Issue a code for `email` and move to the code step.
    pub async fn submit_email(&mut self, email: &str) -> Result<VerificationCode, WizardError> {
        let result = self.try_submit_email(email).await;
        self.finish(WizardStep::Email, result)
    }

    async fn try_submit_email(&mut self, email: &str) -> Result<VerificationCode, WizardError> {
        self.progress.require(WizardStep::Email)?;
        self.email_form = EmailForm::new(email);
        let owner_email = self.email_form.validate()?;

        let code = VerificationCode::generate_with(&mut self.rng);
        let now = self.clock.now();
        let request = VerificationRequest::issue(
            self.car_id,
            owner_email.clone(),
            code.clone(),
            now,
            self.config.code_ttl,
        );
        self.repo.insert_request(&request).await?;

        self.notice = Some(format!(
            "Verification code sent to {owner_email}. Check your inbox; your code is {code}."
        ));
        self.owner_email = Some(owner_email);
        self.progress.advance_from(WizardStep::Email, now)?;
        Ok(code)
    }

    // ── Code step ───────────────────────────────────────────────────

    /// Check the entered code against the latest request and move to the
    /// documents step.
    pub async fn submit_code(&mut self, input: &str) -> Result<(), WizardError> {
        let result = self.try_submit_code(input).await;
        self.finish(WizardStep::Code, result)
    }

    async fn try_submit_code(&mut self, input: &str) -> Result<(), WizardError> {
        self.progress.require(WizardStep::Code)?;
        let candidate = CodeForm::new(input).validate()?;
        let owner_email = self.owner_email.clone().ok_or_else(|| self.out_of_step(WizardStep::Email))?;

        let request = self
            .repo
            .latest_request(self.car_id, &owner_email)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    WizardError::NotFound
                } else {
                    WizardError::Store(e)
                }
            })?;

        let now = self.clock.now();
        request.check_code(&candidate, now)?;

        self.notice = Some("Code verified. Please upload your documents.".to_string());
        self.active = Some(request);
        self.progress.advance_from(WizardStep::Code, now)?;
        Ok(())
    }

    // ── Documents step ──────────────────────────────────────────────

    /// Fill the license slot.
    pub fn attach_license(
        &mut self,
        file: DocumentFile,
        source: DocumentSource,
    ) -> Result<(), WizardError> {
        self.attach(DocumentSlot::License, file, source)
    }

    /// Fill the ownership-certificate slot.
    pub fn attach_ownership(
        &mut self,
        file: DocumentFile,
        source: DocumentSource,
    ) -> Result<(), WizardError> {
        self.attach(DocumentSlot::Ownership, file, source)
    }

    fn attach(
        &mut self,
        slot: DocumentSlot,
        file: DocumentFile,
        source: DocumentSource,
    ) -> Result<(), WizardError> {
        self.progress.require(WizardStep::Documents)?;
        tracing::debug!(%slot, name = %file.name, size = file.len(), ?source, "document attached");
        self.documents.attach(slot, file, source);
        Ok(())
    }

    /// Upload both documents, record their URLs and finish.
    pub async fn submit_documents(&mut self) -> Result<DocumentUrls, WizardError> {
        let result = self.try_submit_documents().await;
        self.finish(WizardStep::Documents, result)
    }

    async fn try_submit_documents(&mut self) -> Result<DocumentUrls, WizardError> {
        self.progress.require(WizardStep::Documents)?;
        let pair = self.documents.validate()?;
        if self.active.is_none() {
            return Err(self.out_of_step(WizardStep::Code));
        }

        let now = self.clock.now();
        let stamp = self.next_upload_stamp(now);
        let request = self.active.as_ref().ok_or_else(|| self.out_of_step(WizardStep::Code))?;
        let request_id = request.id;
        let license_path = DocumentSlot::License.object_path(self.car_id, stamp, &pair.license);
        let ownership_path =
            DocumentSlot::Ownership.object_path(self.car_id, stamp, &pair.ownership);

        let (license, ownership) = tokio::join!(
            self.repo.upload_document(
                &license_path,
                &pair.license.content_type,
                pair.license.bytes
            ),
            self.repo.upload_document(
                &ownership_path,
                &pair.ownership.content_type,
                pair.ownership.bytes
            ),
        );
        if let (Err(l), Err(o)) = (&license, &ownership) {
            tracing::warn!(license = %l, ownership = %o, "both document uploads failed");
        }
        license?;
        ownership?;

        let urls = DocumentUrls {
            license: self.repo.public_url(&license_path),
            ownership: self.repo.public_url(&ownership_path),
        };
        let attachment = request.preview_attachment(urls.clone(), now)?;
        self.repo.attach_documents(request_id, &attachment).await?;

        if let Some(active) = self.active.as_mut() {
            active.attach_documents(urls.clone(), now)?;
        }
        self.notice = Some(
            "Documents uploaded. Our team will review your request shortly.".to_string(),
        );
        self.progress.advance_from(WizardStep::Documents, now)?;
        Ok(urls)
    }

    // ── Step bookkeeping ────────────────────────────────────────────

    /// Epoch-millis stamp for this upload attempt, strictly after the
    /// previous attempt's so a retry never reuses an object path.
    fn next_upload_stamp(&mut self, now: Timestamp) -> i64 {
        let stamp = match self.last_upload_stamp {
            Some(last) => now.epoch_millis().max(last + 1),
            None => now.epoch_millis(),
        };
        self.last_upload_stamp = Some(stamp);
        stamp
    }

    fn out_of_step(&self, expected: WizardStep) -> WizardError {
        WizardError::OutOfStep(WizardTransitionError::WrongStep {
            current: self.progress.step(),
            expected,
        })
    }

    fn finish<T>(
        &mut self,
        step: WizardStep,
        result: Result<T, WizardError>,
    ) -> Result<T, WizardError> {
        match &result {
            Ok(_) => {
                self.last_error = None;
                tracing::info!(
                    car_id = %self.car_id,
                    from = %step,
                    to = %self.progress.step(),
                    "verification wizard advanced"
                );
                metrics::counter!(
                    "carwatch_wizard_steps_total",
                    "step" => step.as_str(),
                    "outcome" => "ok"
                )
                .increment(1);
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                tracing::warn!(
                    car_id = %self.car_id,
                    %step,
                    kind = e.kind(),
                    error = %e,
                    "verification wizard step failed"
                );
                metrics::counter!(
                    "carwatch_wizard_steps_total",
                    "step" => step.as_str(),
                    "outcome" => e.kind()
                )
                .increment(1);
            }
        }
        result
    }
}
