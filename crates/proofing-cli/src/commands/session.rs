use anyhow::{Context, Result, bail};
use colored::Colorize;
use proofing_core::selection::{SelectionSession, SelectionSettings, SessionStatus, extra_count};

use crate::PackageArgs;
use crate::context::AppContext;

/// Parses `ID:LABEL:LIMIT`. The label may itself contain colons.
fn parse_extra(raw: &str) -> Result<(String, String, u32)> {
    let (id, rest) = raw
        .split_once(':')
        .with_context(|| format!("extra '{}' must look like ID:LABEL:LIMIT", raw))?;
    let (label, limit) = rest
        .rsplit_once(':')
        .with_context(|| format!("extra '{}' must look like ID:LABEL:LIMIT", raw))?;
    let limit = limit
        .trim()
        .parse::<u32>()
        .with_context(|| format!("extra '{}' has an invalid limit", raw))?;
    let label = if label.trim().is_empty() { id } else { label };
    Ok((id.trim().to_string(), label.trim().to_string(), limit))
}

pub fn parse_settings(package: &PackageArgs) -> Result<SelectionSettings> {
    let mut settings = SelectionSettings::with_total(package.total);
    for raw in &package.extras {
        let (id, label, limit) = parse_extra(raw)?;
        settings = settings.extra(id, label, limit);
    }
    settings.expiration_date = package.expires;
    settings.validate()?;
    Ok(settings)
}

fn status_label(status: SessionStatus) -> colored::ColoredString {
    let text = status.to_string();
    match status {
        SessionStatus::Waiting => text.bright_black(),
        SessionStatus::Viewed => text.cyan(),
        SessionStatus::Selecting => text.yellow(),
        SessionStatus::Completed => text.green(),
    }
}

fn print_summary(session: &SelectionSession) {
    let selected = session.selection_data.values().filter(|p| p.selected).count();
    println!(
        "{}  {}  {}  {}/{}  token {}",
        session.id.bright_white(),
        session.project_id,
        status_label(session.status),
        selected,
        session.settings.total_limit,
        session.access_token.bright_cyan()
    );
}

pub async fn create(
    ctx: &AppContext,
    project: &str,
    folder: &str,
    settings: SelectionSettings,
) -> Result<()> {
    let session = ctx
        .operator()
        .create_session(project, folder, settings)
        .await?;
    println!("{}", "Selection session created".bright_green());
    print_summary(&session);
    Ok(())
}

pub async fn list(ctx: &AppContext) -> Result<()> {
    let sessions = ctx.operator().list_sessions().await?;
    if sessions.is_empty() {
        println!("{}", "No selection sessions yet.".bright_black());
        return Ok(());
    }
    for session in &sessions {
        print_summary(session);
    }
    Ok(())
}

pub async fn show(ctx: &AppContext, id: &str) -> Result<()> {
    let session = ctx.operator().get_session(id).await?;
    print_summary(&session);
    println!("  folder:  {}", session.folder_reference);
    if let Some(date) = session.settings.expiration_date {
        println!("  expires: {}", date);
    }
    for extra in &session.settings.extra_limits {
        let used = extra_count(&session.selection_data, &extra.id);
        println!("  {} ({}): {}/{}", extra.label, extra.id, used, extra.limit);
    }
    for photo in session.selection_data.values() {
        let mark = if photo.selected { "[x]" } else { "[ ]" };
        let star = if photo.is_starred { "*".yellow() } else { " ".normal() };
        let extras: Vec<&str> = photo
            .extra_selections
            .iter()
            .filter(|(_, set)| **set)
            .map(|(id, _)| id.as_str())
            .collect();
        print!("  {} {}{}", mark, star, photo.id);
        if !extras.is_empty() {
            print!("  +{}", extras.join(",").magenta());
        }
        if !photo.comment.is_empty() {
            print!("  \"{}\"", photo.comment.bright_black());
        }
        println!();
    }
    Ok(())
}

pub async fn update_settings(ctx: &AppContext, id: &str, settings: SelectionSettings) -> Result<()> {
    let session = ctx.operator().update_settings(id, settings).await?;
    println!("{}", "Settings updated".bright_green());
    print_summary(&session);
    Ok(())
}

pub async fn unlock(ctx: &AppContext, id: &str) -> Result<()> {
    let session = ctx.operator().unlock(id).await?;
    println!("{}", "Session unlocked".bright_green());
    print_summary(&session);
    Ok(())
}

pub async fn regenerate_token(ctx: &AppContext, id: &str) -> Result<()> {
    let token = ctx.operator().regenerate_token(id).await?;
    println!("New access token: {}", token.bright_cyan());
    Ok(())
}

pub async fn set_folder(ctx: &AppContext, id: &str, folder: &str) -> Result<()> {
    if folder.trim().is_empty() {
        bail!("folder reference must not be empty");
    }
    ctx.operator().set_folder(id, folder).await?;
    println!("{}", "Folder updated".bright_green());
    Ok(())
}

pub async fn star(ctx: &AppContext, id: &str, photo: &str, starred: bool) -> Result<()> {
    ctx.operator().set_starred(id, photo, starred).await?;
    let verb = if starred { "Starred" } else { "Unstarred" };
    println!("{} {}", verb.bright_green(), photo);
    Ok(())
}

pub async fn delete(ctx: &AppContext, id: &str) -> Result<()> {
    ctx.operator().delete_session(id).await?;
    println!("{}", "Session deleted".bright_green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extra_keeps_colons_in_label() {
        let (id, label, limit) = parse_extra("cover:Cover: front:2").unwrap();
        assert_eq!(id, "cover");
        assert_eq!(label, "Cover: front");
        assert_eq!(limit, 2);
    }

    #[test]
    fn test_parse_extra_rejects_bad_limit() {
        assert!(parse_extra("cover:Cover:many").is_err());
        assert!(parse_extra("cover").is_err());
    }

    #[test]
    fn test_parse_settings_validates() {
        let package = PackageArgs {
            total: 10,
            extras: vec!["cover:Cover:0".to_string()],
            expires: None,
        };
        assert!(parse_settings(&package).is_err());
    }
}
