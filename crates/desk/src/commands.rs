use std::path::Path;
use std::sync::Arc;

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use forms::{
    catalog, ChannelNotifier, EntityKind, FormInput, FormSession, Notification, Pipeline,
    PipelineConfig, SubmitOutcome, ValidationReport,
};
use store::LocalStore;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::{Cli, Cmd};
use crate::config::Config;

pub async fn run(cli: Cli, config: &Config) -> Result<()> {
    match cli.cmd {
        Cmd::Validate { form, input } => validate(form.into(), &input, config),
        Cmd::Submit {
            form,
            input,
            no_delay,
        } => {
            let mut pipeline_config = config.pipeline();
            if no_delay {
                pipeline_config = PipelineConfig {
                    submit_latency_ms: 0,
                    reset_delay_ms: 0,
                    ..pipeline_config
                };
            }
            submit(form.into(), &input, config, pipeline_config).await
        }
        Cmd::Draft { form, input } => draft(form.into(), &input, config),
        Cmd::Fields { form, json } => fields(form.into(), json),
    }
}

struct Desk {
    pipeline: Pipeline,
    notifications: UnboundedReceiver<Notification>,
    session: FormSession,
}

impl Desk {
    fn open(
        kind: EntityKind,
        input: &Path,
        store: LocalStore,
        pipeline_config: PipelineConfig,
    ) -> Result<Self> {
        let (notifier, notifications) = ChannelNotifier::new(pipeline_config.toast_ttl());
        let pipeline = Pipeline::new(store, Arc::new(notifier)).with_config(pipeline_config);

        let raw = std::fs::read_to_string(input)
            .wrap_err_with(|| format!("reading input file {}", input.display()))?;
        let form_input = FormInput::from_json_str(&raw)
            .wrap_err_with(|| format!("parsing input file {}", input.display()))?;

        let mut session = FormSession::new(Arc::new(catalog::form_for(kind)));
        let images = form_input.apply_to(&mut session)?;
        if !images.is_empty() {
            pipeline.stage_images(&mut session, images);
        }

        Ok(Self {
            pipeline,
            notifications,
            session,
        })
    }

    fn flush_notifications(&mut self) {
        while let Ok(notification) = self.notifications.try_recv() {
            println!("[{}] {}", notification.kind.as_str(), notification.message);
        }
    }
}

fn print_report(report: &ValidationReport) {
    for result in &report.results {
        match &result.message {
            None => println!("  ok       {}", result.field_name),
            Some(message) => println!("  invalid  {}: {message}", result.field_name),
        }
    }
}

fn validate(kind: EntityKind, input: &Path, config: &Config) -> Result<()> {
    let mut desk = Desk::open(kind, input, LocalStore::in_memory(), config.pipeline())?;
    let report = desk.pipeline.validate_all(&mut desk.session);
    print_report(&report);
    desk.flush_notifications();

    let failed = report.failures().count();
    if failed > 0 {
        return Err(eyre!("{failed} field(s) failed validation"));
    }
    println!("{kind} form is valid");
    Ok(())
}

async fn submit(
    kind: EntityKind,
    input: &Path,
    config: &Config,
    pipeline_config: PipelineConfig,
) -> Result<()> {
    let store = LocalStore::open_dir(&config.data_dir)?;
    let mut desk = Desk::open(kind, input, store, pipeline_config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling submission");
            on_interrupt.cancel();
        }
    });

    let outcome = desk.pipeline.submit(&mut desk.session, &cancel).await;
    interrupt.abort();
    desk.flush_notifications();

    match outcome? {
        SubmitOutcome::Submitted(record) => {
            info!(%kind, id = record.id, "submitted");
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        SubmitOutcome::Rejected(report) => {
            let failures = ValidationReport {
                results: report.failures().cloned().collect(),
            };
            print_report(&failures);
            Err(eyre!("{} field(s) failed validation", failures.results.len()))
        }
        SubmitOutcome::Cancelled => {
            println!("submission cancelled; nothing was saved");
            Ok(())
        }
    }
}

fn draft(kind: EntityKind, input: &Path, config: &Config) -> Result<()> {
    let store = LocalStore::open_dir(&config.data_dir)?;
    let mut desk = Desk::open(kind, input, store, config.pipeline())?;
    let draft = desk.pipeline.save_draft(&desk.session);
    desk.flush_notifications();
    let draft = draft?;
    println!(
        "draft saved to `{}` at {}",
        kind.draft_key(),
        draft.saved_at.to_rfc3339()
    );
    Ok(())
}

fn fields(kind: EntityKind, json: bool) -> Result<()> {
    let schema = catalog::form_for(kind);
    if json {
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    println!("{}", schema.title);
    for field in &schema.fields {
        let required = if field.required { "*" } else { " " };
        let condition = schema
            .conditionals
            .iter()
            .find(|g| g.dependent == field.name)
            .map(|g| format!("  (when {} = {})", g.trigger, g.sentinel))
            .unwrap_or_default();
        println!(
            "  {required} {:<26} {:<7} {}{condition}",
            field.name,
            field.kind.as_str(),
            field.label
        );
    }
    if let Some(group) = &schema.repeating {
        println!("  {} (repeating, at least one row)", group.label);
        for field in &group.fields {
            let required = if field.required { "*" } else { " " };
            println!(
                "    {required} {:<24} {:<7} {}",
                field.name,
                field.kind.as_str(),
                field.label
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use paths::PathContext;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn test_config(base: &Path) -> Config {
        let paths = PathContext::with_base_path(base.to_path_buf());
        Config {
            data_dir: paths.data_dir(),
            config_dir: paths.config_dir(),
            logs_dir: paths.logs_dir(),
            log_level: "info".into(),
            submit_latency_ms: 0,
            reset_delay_ms: 0,
            toast_ttl_ms: 3000,
            max_images: 10,
        }
    }

    fn write_input(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("input.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    const BUYER: &str = r#"{
        "buyerName": "Tan Ah Kow",
        "preferredLocations": "Bukit Timah",
        "minBudget": 2000000,
        "maxBudget": 3500000,
        "purpose": "Investment"
    }"#;

    #[test]
    fn validate_fails_on_invalid_input() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let input = write_input(tmp.path(), r#"{"buyerName": "A"}"#);
        assert!(validate(EntityKind::Buyer, &input, &config).is_err());
        assert!(validate(EntityKind::Buyer, &write_input(tmp.path(), BUYER), &config).is_ok());
    }

    #[tokio::test]
    async fn submit_writes_to_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        config.ensure_directories().unwrap();
        let input = write_input(tmp.path(), BUYER);

        submit(EntityKind::Buyer, &input, &config, config.pipeline())
            .await
            .unwrap();

        let raw = std::fs::read_to_string(config.data_dir.join("buyers.json")).unwrap();
        let buyers: Vec<Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(buyers.len(), 1);
        assert_eq!(buyers[0]["maxBudget"], "3500000");
        assert_eq!(buyers[0]["status"], "Active");
    }

    #[test]
    fn draft_writes_draft_file_only() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let input = write_input(tmp.path(), r#"{"fullAddress": "12 Orchard Road"}"#);

        draft(EntityKind::Property, &input, &config).unwrap();

        assert!(config.data_dir.join("propertyDraft.json").exists());
        assert!(!config.data_dir.join("properties.json").exists());
    }

    #[test]
    fn missing_input_file_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let err = validate(EntityKind::Buyer, &tmp.path().join("nope.json"), &config).unwrap_err();
        assert!(format!("{err:#}").contains("reading input file"));
    }
}
