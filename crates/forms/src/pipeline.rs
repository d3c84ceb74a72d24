//! Draft/submit pipeline: full-form validation, asynchronous submission,
//! persistence and user feedback.

use std::sync::Arc;

use chrono::Utc;
use store::LocalStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::errors::FormError;
use crate::notify::{NotificationKind, Notifier};
use crate::record::{build_attributes, stamp_submission, DraftRecord, EntityRecord};
use crate::state::{FormSession, StagedImage};
use crate::submit::{SimulatedSubmitter, Submitter};
use crate::validate::{validate_value, ValidationReport, ValidationResult};

pub const MSG_FIX_ERRORS: &str = "Please fix all validation errors before submitting.";
pub const MSG_DRAFT_SAVED: &str = "Draft saved successfully!";
pub const MSG_FORM_RESET: &str = "Form reset successfully!";
pub const MSG_AGENT_ADDED: &str = "New agent added successfully!";
pub const MSG_AGENT_REMOVED: &str = "Agent removed successfully!";
pub const MSG_IMAGES_ONLY: &str = "Please select only image files.";
pub const MSG_PREVIEW: &str = "Preview functionality would open here";

/// How a `submit` call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Record appended; the form has been reset.
    Submitted(EntityRecord),
    /// Validation failed; nothing was written.
    Rejected(ValidationReport),
    /// Cancelled before the store write; the form is untouched.
    Cancelled,
}

impl SubmitOutcome {
    pub fn record(&self) -> Option<&EntityRecord> {
        match self {
            SubmitOutcome::Submitted(record) => Some(record),
            _ => None,
        }
    }
}

/// Result of staging a batch of files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StagingSummary {
    pub accepted: usize,
    /// Files that were not `image/*`.
    pub rejected_type: usize,
    /// Images dropped because the limit was reached.
    pub over_limit: usize,
}

/// Holds a session in the pending state; leaving it (normally or by the
/// submit future being dropped) clears the flag.
struct PendingGuard<'a> {
    session: &'a mut FormSession,
}

impl<'a> PendingGuard<'a> {
    fn enter(session: &'a mut FormSession) -> Self {
        session.set_pending(true);
        Self { session }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.session.set_pending(false);
    }
}

pub struct Pipeline {
    store: LocalStore,
    notifier: Arc<dyn Notifier>,
    submitter: Option<Arc<dyn Submitter>>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(store: LocalStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            submitter: None,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default [`SimulatedSubmitter`].
    pub fn with_submitter(mut self, submitter: Arc<dyn Submitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    fn submitter(&self) -> Arc<dyn Submitter> {
        match &self.submitter {
            Some(submitter) => submitter.clone(),
            None => Arc::new(SimulatedSubmitter::new(self.config.submit_latency())),
        }
    }

    /// Single-field (blur) validation of a scalar field.
    pub fn validate_field(
        &self,
        session: &mut FormSession,
        name: &str,
    ) -> Result<ValidationResult, FormError> {
        let field = session
            .schema()
            .field_by_name(name)
            .cloned()
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        // versteckte Felder behalten ihren Marker
        if !session.is_visible(name) {
            return Ok(ValidationResult::ok(name));
        }
        let result = validate_value(
            &field,
            name,
            session.value(name),
            session.is_required(name),
            &session.snapshot(),
        );
        session.apply_result(name, &result);
        Ok(result)
    }

    /// Single-field validation of one agent-row sub-field.
    pub fn validate_row_field(
        &self,
        session: &mut FormSession,
        row: usize,
        name: &str,
    ) -> Result<ValidationResult, FormError> {
        let group = session
            .schema()
            .repeating
            .clone()
            .ok_or(FormError::NoRepeatingGroup(session.kind().as_str()))?;
        let field = group
            .field_by_name(name)
            .ok_or_else(|| FormError::UnknownField(group.field_path(row, name)))?;
        if row >= session.row_count() {
            return Err(FormError::RowOutOfRange {
                index: row,
                len: session.row_count(),
            });
        }
        let result = validate_value(
            field,
            &group.field_path(row, name),
            session.row_value(row, name),
            field.required,
            &session.snapshot(),
        );
        session.apply_row_result(row, name, &result);
        Ok(result)
    }

    /// Validate every required field and every non-empty field with format
    /// rules, agent rows included. Hidden dependents are skipped. Every
    /// candidate is evaluated so all markers are populated in one pass.
    pub fn validate_all(&self, session: &mut FormSession) -> ValidationReport {
        let schema = session.schema().clone();
        let snapshot = session.snapshot();
        let mut report = ValidationReport::default();

        for field in &schema.fields {
            if !session.is_visible(&field.name) {
                continue;
            }
            let value = session.value(&field.name);
            let required = session.is_required(&field.name);
            if !required && (value.trim().is_empty() || !field.has_format_rules()) {
                continue;
            }
            let result = validate_value(field, &field.name, value, required, &snapshot);
            session.apply_result(&field.name, &result);
            report.results.push(result);
        }

        if let Some(group) = &schema.repeating {
            for row in 0..session.row_count() {
                for field in &group.fields {
                    let value = session.row_value(row, &field.name);
                    if !field.required && (value.trim().is_empty() || !field.has_format_rules()) {
                        continue;
                    }
                    let path = group.field_path(row, &field.name);
                    let result = validate_value(field, &path, value, field.required, &snapshot);
                    session.apply_row_result(row, &field.name, &result);
                    report.results.push(result);
                }
            }
        }

        debug!(
            form = %schema.kind,
            checked = report.results.len(),
            failed = report.failures().count(),
            "validated form"
        );
        report
    }

    /// Validate, hand the record to the submitter, append it to the
    /// collection, then reset the form after the reset delay.
    ///
    /// Cancelling `cancel` while the submitter is running leaves the form
    /// and the store untouched. Cancelling during the reset delay resets
    /// immediately.
    pub async fn submit(
        &self,
        session: &mut FormSession,
        cancel: &CancellationToken,
    ) -> Result<SubmitOutcome, FormError> {
        let kind = session.kind();

        let report = self.validate_all(session);
        if !report.is_valid() {
            self.notifier.notify(MSG_FIX_ERRORS, NotificationKind::Error);
            return Ok(SubmitOutcome::Rejected(report));
        }

        let mut attributes = build_attributes(session);
        stamp_submission(kind, &mut attributes, Utc::now());

        let submitter = self.submitter();
        let submitted = {
            let _pending = PendingGuard::enter(session);
            info!(%kind, label = kind.pending_label(), "submission pending");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = submitter.submit(kind, &attributes) => Some(result),
            }
        };

        match submitted {
            None => {
                info!(%kind, "submission cancelled before store write");
                return Ok(SubmitOutcome::Cancelled);
            }
            Some(Err(err)) => {
                warn!(%kind, error = %err, "submission failed");
                self.notifier.notify(&err.to_string(), NotificationKind::Error);
                return Err(err.into());
            }
            Some(Ok(())) => {}
        }

        let receipt = match self
            .store
            .append_entity(kind.collection_key(), attributes.clone())
        {
            Ok(receipt) => receipt,
            Err(err) => {
                warn!(%kind, error = %err, "failed to persist record");
                self.notifier
                    .notify(&format!("Could not save {kind}: {err}"), NotificationKind::Error);
                return Err(err.into());
            }
        };
        info!(%kind, id = receipt.id, total = receipt.len, "record appended");
        self.notifier
            .notify(kind.success_message(), NotificationKind::Success);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => debug!(%kind, "reset delay skipped"),
            _ = tokio::time::sleep(self.config.reset_delay()) => {}
        }
        self.reset_form(session);

        Ok(SubmitOutcome::Submitted(EntityRecord::from_receipt(
            kind, receipt, attributes,
        )))
    }

    /// Overwrite the form's draft slot with its current values. Never
    /// validates and never touches the collection.
    pub fn save_draft(&self, session: &FormSession) -> Result<DraftRecord, FormError> {
        let kind = session.kind();
        let draft = DraftRecord::new(build_attributes(session), Utc::now());
        if let Err(err) = self.store.save_draft(kind.draft_key(), &draft.to_json()) {
            warn!(%kind, error = %err, "failed to save draft");
            self.notifier
                .notify(&format!("Could not save draft: {err}"), NotificationKind::Error);
            return Err(err.into());
        }
        info!(%kind, key = kind.draft_key(), "draft saved");
        self.notifier.notify(MSG_DRAFT_SAVED, NotificationKind::Success);
        Ok(draft)
    }

    /// Clear values and markers, collapse conditional sections, keep one
    /// agent row and drop staged images.
    pub fn reset_form(&self, session: &mut FormSession) {
        session.reset();
        debug!(form = %session.kind(), "form reset");
        self.notifier.notify(MSG_FORM_RESET, NotificationKind::Info);
    }

    pub fn add_agent_row(&self, session: &mut FormSession) -> Result<usize, FormError> {
        let index = session.add_row()?;
        self.notifier.notify(MSG_AGENT_ADDED, NotificationKind::Success);
        Ok(index)
    }

    pub fn remove_agent_row(&self, session: &mut FormSession, index: usize) -> Result<(), FormError> {
        session.remove_row(index)?;
        self.notifier.notify(MSG_AGENT_REMOVED, NotificationKind::Info);
        Ok(())
    }

    /// Stage `files` for preview. Only `image/*` is accepted and the staged
    /// set never grows beyond `max_images`.
    pub fn stage_images(
        &self,
        session: &mut FormSession,
        files: impl IntoIterator<Item = StagedImage>,
    ) -> StagingSummary {
        let mut summary = StagingSummary::default();
        let (images, others): (Vec<_>, Vec<_>) = files.into_iter().partition(StagedImage::is_image);
        summary.rejected_type = others.len();

        if images.is_empty() {
            self.notifier.notify(MSG_IMAGES_ONLY, NotificationKind::Error);
            return summary;
        }

        let max = self.config.max_images;
        let staged = session.images_mut();
        for image in images {
            if staged.len() >= max {
                summary.over_limit += 1;
                continue;
            }
            staged.push(image);
            summary.accepted += 1;
        }
        if summary.over_limit > 0 {
            self.notifier.notify(
                &format!("Maximum {max} images allowed."),
                NotificationKind::Warning,
            );
        }
        debug!(?summary, "staged images");
        summary
    }

    /// Drop a staged image by name. Returns whether anything was removed.
    pub fn remove_image(&self, session: &mut FormSession, name: &str) -> bool {
        let staged = session.images_mut();
        let before = staged.len();
        staged.retain(|image| image.name != name);
        before != staged.len()
    }

    /// Build the record the form would submit, without persisting it.
    pub fn preview(&self, session: &FormSession) -> store::JsonObject {
        let attributes = build_attributes(session);
        debug!(form = %session.kind(), fields = attributes.len(), "preview built");
        self.notifier.notify(MSG_PREVIEW, NotificationKind::Info);
        attributes
    }
}
