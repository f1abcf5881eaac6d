use crate::cli::Commands;
use anyhow::{Context, bail};
use casefile::{DirectoryManifestSource, Workbench};
use std::io::Write;
use std::path::Path;

pub(crate) async fn run(workbench: &Workbench, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Import { archive, name } => import(workbench, &archive, name.as_deref()).await,
        Commands::List { json } => list(workbench, json).await,
        Commands::Activate { key } => {
            let active = workbench.activate(&key).await?;
            report_conflicts(active.conflicts.len())
        },
        Commands::Deactivate { key } => {
            workbench.deactivate(&key).await?;
            Ok(())
        },
        Commands::Delete { key } => {
            if !workbench.delete_domain(&key).await {
                bail!("No deletable domain named '{key}'");
            }
            Ok(())
        },
        Commands::Show { name } => show(workbench, name.as_deref()),
        Commands::Sync { directory, force } => sync(workbench, &directory, force).await,
    }
}

async fn import(workbench: &Workbench, archive: &Path, name: Option<&str>) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(archive)
        .await
        .with_context(|| format!("Failed to read {}", archive.display()))?;
    let outcome = match name {
        Some(name) => workbench.import_package_named(&bytes, name).await,
        None => workbench.import_package(&bytes).await,
    };

    let mut out = std::io::stdout().lock();
    match outcome {
        Ok(outcome) => {
            writeln!(out, "imported {} ({})", outcome.domain_key, outcome.display_name)?;
            for warning in &outcome.warnings {
                writeln!(out, "  warning: {warning}")?;
            }
            if !outcome.persisted {
                writeln!(out, "  note: cache unavailable, domain kept for this session only")?;
            }
            Ok(())
        },
        Err(err) => {
            for warning in err.warnings() {
                writeln!(out, "  warning: {warning}")?;
            }
            Err(err.into())
        },
    }
}

async fn list(workbench: &Workbench, json: bool) -> anyhow::Result<()> {
    let domains = workbench.domains().await;
    let mut out = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &domains)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "{:<24} {:<8} {:>5}  NAME", "KEY", "STATE", "TYPES")?;
    for domain in domains {
        let marker = if domain.is_virtual { "*" } else { "" };
        writeln!(
            out,
            "{:<24} {:<8} {:>5}  {}{marker}",
            domain.key,
            domain.state.to_string(),
            domain.type_count,
            domain.display_name
        )?;
    }
    Ok(())
}

fn show(workbench: &Workbench, name: Option<&str>) -> anyhow::Result<()> {
    let active = workbench.active_configuration();
    let mut out = std::io::stdout().lock();
    match name {
        Some(name) => {
            let definition = active
                .resolve(name)
                .with_context(|| format!("Type '{name}' is not in the active configuration"))?;
            serde_json::to_writer_pretty(&mut out, definition)?;
        },
        None => serde_json::to_writer_pretty(&mut out, active.as_ref())?,
    }
    writeln!(out)?;
    Ok(())
}

async fn sync(workbench: &Workbench, directory: &Path, force: bool) -> anyhow::Result<()> {
    let source = DirectoryManifestSource::new(directory);
    let report = workbench.sync_manifest(&source, force).await?;

    let mut out = std::io::stdout().lock();
    writeln!(out, "refreshed: {}", report.refreshed.join(", "))?;
    writeln!(out, "skipped:   {}", report.skipped.join(", "))?;
    if force {
        writeln!(out, "changed types: {}", report.changed_types)?;
    }
    for warning in &report.warnings {
        writeln!(out, "  warning: {warning}")?;
    }
    Ok(())
}

fn report_conflicts(count: usize) -> anyhow::Result<()> {
    if count > 0 {
        writeln!(std::io::stdout().lock(), "{count} type conflict(s), run `show` for details")?;
    }
    Ok(())
}
