use anyhow::Result;
use colored::Colorize;
use proofing_core::notification::OutboxStatus;

use crate::context::AppContext;

pub async fn drain(ctx: &AppContext) -> Result<()> {
    let report = ctx.outbox_worker()?.run_once().await?;
    if report.is_empty() {
        println!("{}", "Nothing to send.".bright_black());
        return Ok(());
    }
    println!(
        "delivered {}, will retry {}, gave up {}",
        report.delivered.to_string().green(),
        report.retried.to_string().yellow(),
        report.failed.to_string().red()
    );
    Ok(())
}

pub async fn list(ctx: &AppContext) -> Result<()> {
    let events = ctx.outbox.list_all().await?;
    if events.is_empty() {
        println!("{}", "Outbox is empty.".bright_black());
    }
    for event in events {
        let status = match event.status {
            OutboxStatus::Pending => event.status.to_string().yellow(),
            OutboxStatus::Delivered => event.status.to_string().green(),
            OutboxStatus::Failed => event.status.to_string().red(),
        };
        println!(
            "{}  {}  {}  session {}  attempts {}",
            event.created_at.bright_black(),
            status,
            event.kind,
            event.notice.session_id,
            event.attempts
        );
        if let Some(error) = &event.last_error {
            println!("    {}", error.bright_black());
        }
    }
    Ok(())
}
