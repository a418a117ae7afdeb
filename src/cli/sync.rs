use anyhow::{bail, Result};
use chrono::{TimeZone, Utc};
use std::io::Write;

use super::App;
use crate::library::ListOptions;

fn format_ms(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}

pub fn status(app: &App) -> Result<()> {
    let settings = app.sync.settings();
    println!("Enabled:     {}", settings.enabled);
    println!(
        "Remote:      {}",
        app.config.sync.url.as_deref().unwrap_or("(not configured)")
    );
    println!("Can enable:  {}", app.sync.can_enable());
    if let Some(user) = &settings.active_user_id {
        println!("Active user: {}", user);
    }
    if let Some(at) = settings.migrated_at {
        println!("Migrated at: {}", format_ms(at));
    }
    if let Some(err) = &settings.last_error {
        println!("Last error:  {}", err);
    }
    println!("Mirroring:   {}", app.store.cloud_runtime().is_some());
    Ok(())
}

pub async fn enable(app: &App, dry_run: bool) -> Result<()> {
    if dry_run {
        let count = app
            .store
            .list_items(&ListOptions {
                include_archived: true,
                ..ListOptions::default()
            })
            .len();
        if !app.sync.can_enable() {
            bail!("Cloud sync cannot be enabled: sign in and set [sync] url first");
        }
        println!("Would push {} item(s) and merge the remote library", count);
        return Ok(());
    }

    let report = app
        .sync
        .migrate_and_hydrate(|done, total| {
            eprint!("\rPushing {}/{}", done, total);
            let _ = std::io::stderr().flush();
        })
        .await?;
    if report.total > 0 {
        eprintln!();
    }
    println!(
        "Cloud sync enabled: {} pushed, {} failed, {} total",
        report.completed, report.failed, report.total
    );
    Ok(())
}

pub fn disable(app: &App) -> Result<()> {
    app.sync.disable()?;
    println!("Cloud sync disabled. Local library is unchanged.");
    Ok(())
}

pub async fn pull(app: &App) -> Result<()> {
    let count = app.sync.pull().await?;
    println!("Library now holds {} item(s)", count);
    Ok(())
}
