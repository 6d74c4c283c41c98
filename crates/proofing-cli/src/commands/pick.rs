//! Interactive client selection.
//!
//! The lightbox is driven by typed key names (`left`, `right`, `esc`) that
//! go through the same keyboard contract a graphical client binds.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::{Result, bail};
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use proofing_application::{GalleryLoader, SelectionUseCase};
use proofing_core::error::ProofingError;
use proofing_core::gallery::{CandidatePhoto, GalleryState};
use proofing_core::lightbox::{KeyBindingRegistry, LightboxCommand, LightboxKey, LightboxNavigator};
use proofing_core::selection::{ConsentAffirmation, SelectionEvent, SelectionStateMachine};

use crate::context::AppContext;

const COMMANDS: &[&str] = &[
    "left", "right", "esc", "open", "select", "extra", "comment", "list", "status", "retry",
    "complete", "help", "quit",
];

/// One parsed REPL line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Key(LightboxKey),
    /// 1-based photo number.
    Open(usize),
    /// Toggle the focused photo, or photo N.
    Select(Option<usize>),
    Extra(String),
    Comment(String),
    List,
    Status,
    Retry,
    Complete,
    Help,
    Quit,
}

fn parse_input(line: &str) -> std::result::Result<Input, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    if let Ok(key) = word.parse::<LightboxKey>() {
        return Ok(Input::Key(key));
    }

    let number = |rest: &str| {
        rest.parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("'{}' is not a photo number", rest))
    };

    match word {
        "open" => number(rest).map(Input::Open),
        "select" if rest.is_empty() => Ok(Input::Select(None)),
        "select" => number(rest).map(|n| Input::Select(Some(n))),
        "extra" if rest.is_empty() => Err("usage: extra ID".to_string()),
        "extra" => Ok(Input::Extra(rest.to_string())),
        // An empty comment clears it.
        "comment" => Ok(Input::Comment(rest.to_string())),
        "list" | "ls" => Ok(Input::List),
        "status" => Ok(Input::Status),
        "retry" => Ok(Input::Retry),
        "complete" | "done" => Ok(Input::Complete),
        "help" | "?" => Ok(Input::Help),
        "quit" | "exit" => Ok(Input::Quit),
        other => Err(format!("Unknown command '{}'. Type 'help'.", other)),
    }
}

#[derive(Clone)]
struct PickHelper;

impl Helper for PickHelper {}

impl Completer for PickHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if line.contains(' ') {
            return Ok((0, vec![]));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for PickHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.parse::<LightboxKey>().is_ok() {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for PickHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.is_empty() || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Validator for PickHelper {}

/// REPL state for one opened session.
struct Picker {
    selection: SelectionUseCase,
    gallery: GalleryLoader,
    photos: Vec<CandidatePhoto>,
    navigator: LightboxNavigator,
    keys: KeyBindingRegistry,
}

impl Picker {
    fn prompt(&self) -> String {
        match self.navigator.focused_photo(&self.photos) {
            Some(photo) => format!(
                "[{}/{} {}] > ",
                self.navigator.current().map_or(0, |i| i + 1),
                self.photos.len(),
                photo.name
            ),
            None => "> ".to_string(),
        }
    }

    fn apply_gallery(&mut self, state: GalleryState) {
        match &state {
            GalleryState::Ready { photos } => {
                println!("{}", format!("{} photo(s) to choose from.", photos.len()).bright_black());
            }
            GalleryState::Empty => {
                println!(
                    "{}",
                    "There are no photos in this gallery yet. Please contact the studio.".yellow()
                );
            }
            GalleryState::Failed { message } => {
                println!("{}", format!("Could not load the photos: {}", message).red());
                println!("{}", "Type 'retry' to try again.".bright_black());
            }
            GalleryState::Loading => {}
        }
        self.photos = state.photos().to_vec();
        self.navigator.set_len(self.photos.len(), &mut self.keys);
    }

    /// Photo id for `number` (1-based) or the focused photo.
    fn target(&self, number: Option<usize>) -> std::result::Result<String, String> {
        let photo = match number {
            Some(n) => self.photos.get(n - 1),
            None => self.navigator.focused_photo(&self.photos),
        };
        photo
            .map(|p| p.id.clone())
            .ok_or_else(|| "Open a photo first, or give its number.".to_string())
    }

    async fn show_focused(&self) {
        let Some(photo) = self.navigator.focused_photo(&self.photos) else {
            return;
        };
        let state = self.selection.state().await.ok();
        let entry = state.as_ref().and_then(|s| s.photo(&photo.id));
        let mark = if entry.is_some_and(|e| e.selected) {
            "selected".green()
        } else {
            "not selected".bright_black()
        };
        println!("{}  {}", photo.name.bright_white(), mark);
        if let Some(entry) = entry {
            let extras: Vec<&str> = entry
                .extra_selections
                .iter()
                .filter(|(_, set)| **set)
                .map(|(id, _)| id.as_str())
                .collect();
            if !extras.is_empty() {
                println!("  extras: {}", extras.join(", ").magenta());
            }
            if !entry.comment.is_empty() {
                println!("  comment: {}", entry.comment);
            }
        }
        println!("  {}", photo.full_res_url.bright_black());
    }

    async fn list(&self) {
        let state = self.selection.state().await.ok();
        for (i, photo) in self.photos.iter().enumerate() {
            let selected = state.as_ref().is_some_and(|s| s.is_selected(&photo.id));
            let mark = if selected { "[x]".green() } else { "[ ]".normal() };
            println!("{:>4} {} {}", i + 1, mark, photo.name);
        }
    }

    async fn status(&self) -> Result<()> {
        let state = self.selection.state().await?;
        print_counts(&state);
        let readiness = self.selection.validate_for_completion().await?;
        if readiness.is_ready() {
            println!("{}", "Ready to complete.".green());
        }
        for message in readiness.messages() {
            println!("  {}", message.yellow());
        }
        Ok(())
    }
}

fn print_counts(state: &SelectionStateMachine) {
    let settings = state.settings();
    println!(
        "Status: {}  Selected {}/{}",
        state.status(),
        state.selected_count(),
        settings.total_limit
    );
    for extra in &settings.extra_limits {
        println!(
            "  {}: {}/{}",
            extra.label,
            state.extra_count(&extra.id),
            extra.limit
        );
    }
}

fn print_help() {
    println!("{}", "Lightbox:".bright_magenta());
    println!("  open N          open photo N");
    println!("  left / right    previous / next photo (wraps around)");
    println!("  esc             close the lightbox");
    println!("{}", "Selection:".bright_magenta());
    println!("  select [N]      select or deselect the open photo (or photo N)");
    println!("  extra ID        toggle an extra on the open photo");
    println!("  comment TEXT    set the comment of the open photo");
    println!("  list            list photos");
    println!("  status          show counts and what is missing");
    println!("  complete        confirm the selection");
    println!("  retry           reload the photos");
    println!("  quit            save and leave");
}

fn error_lines(err: &ProofingError) -> Vec<String> {
    match err {
        ProofingError::CompletionNotReady(mismatches) => {
            let mut lines = vec!["The selection does not match the package yet:".to_string()];
            lines.extend(mismatches.iter().map(|m| format!("  {}", m)));
            lines
        }
        other => vec![other.to_string()],
    }
}

/// Problems the client can fix by changing the selection print in yellow;
/// storage and service failures in red.
fn report_error(err: &ProofingError) {
    let recoverable = err.is_user_recoverable();
    for line in error_lines(err) {
        if recoverable {
            println!("{}", line.yellow());
        } else {
            println!("{}", line.red());
        }
    }
}

/// Prints save failures as they happen; everything else stays in the log.
fn spawn_save_watcher(
    mut events: broadcast::Receiver<SelectionEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Ok(SelectionEvent::SaveFailed { error, .. }) => {
                        println!("{}", format!("Your changes are not saved yet ({}). Retrying.", error).yellow());
                    }
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    })
}

pub async fn run(ctx: &AppContext, token: &str) -> Result<()> {
    let selection = ctx.selection();
    let session = match selection.open(token).await {
        Ok(session) => session,
        Err(e) if e.is_not_found() => {
            bail!("This link is not valid. Please ask the studio for a new one.")
        }
        Err(ProofingError::Expired { expired_on, .. }) => {
            bail!("This link expired on {}. Please contact the studio.", expired_on)
        }
        Err(e) => return Err(e.into()),
    };

    let cancel = CancellationToken::new();
    let watcher = spawn_save_watcher(ctx.events.subscribe(), cancel.clone());
    let worker = if ctx.config.email.is_configured() {
        let worker = Arc::new(ctx.outbox_worker()?);
        Some(worker.spawn(cancel.clone(), Some(ctx.events.subscribe())))
    } else {
        tracing::info!("Email is not configured; completion notices stay in the outbox");
        None
    };

    let mut picker = Picker {
        selection,
        gallery: ctx.gallery()?,
        photos: Vec::new(),
        navigator: LightboxNavigator::new(0),
        keys: KeyBindingRegistry::new(),
    };

    println!("{}", "=== Photo selection ===".bright_magenta().bold());
    {
        let state = picker.selection.state().await?;
        print_counts(&state);
        if state.is_locked() {
            println!(
                "{}",
                "This selection is already confirmed. Contact the studio to change it.".yellow()
            );
        }
    }
    let loaded = picker.gallery.load(&session.folder_reference).await;
    picker.apply_gallery(loaded);
    println!("{}", "Type 'help' for commands.".bright_black());

    let mut rl = Editor::new()?;
    rl.set_helper(Some(PickHelper));

    loop {
        let line = match rl.readline(&picker.prompt()) {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to leave.".yellow());
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(&line);

        let input = match parse_input(&line) {
            Ok(input) => input,
            Err(message) => {
                println!("{}", message.bright_black());
                continue;
            }
        };

        match input {
            Input::Key(key) => match picker.navigator.handle_key(key, &mut picker.keys) {
                Some(LightboxCommand::Close) => println!("{}", "Lightbox closed.".bright_black()),
                Some(_) => picker.show_focused().await,
                None => println!("{}", "No photo is open. Use 'open N'.".bright_black()),
            },
            Input::Open(n) => {
                if n > picker.photos.len() {
                    println!("{}", format!("There are {} photo(s).", picker.photos.len()).bright_black());
                } else if picker.navigator.open(n - 1, &mut picker.keys).is_some() {
                    picker.show_focused().await;
                }
            }
            Input::Select(number) => match picker.target(number) {
                Ok(photo_id) => match picker.selection.toggle_select(&photo_id).await {
                    Ok(change) => println!("{}", format!("{:?}", change).green()),
                    Err(e) => report_error(&e),
                },
                Err(message) => println!("{}", message.bright_black()),
            },
            Input::Extra(extra_id) => match picker.target(None) {
                Ok(photo_id) => match picker.selection.toggle_extra(&photo_id, &extra_id).await {
                    Ok(change) => println!("{}", format!("{:?}", change).green()),
                    Err(e) => report_error(&e),
                },
                Err(message) => println!("{}", message.bright_black()),
            },
            Input::Comment(text) => match picker.target(None) {
                Ok(photo_id) => match picker.selection.update_comment(&photo_id, &text).await {
                    Ok(_) => println!("{}", "Comment saved.".green()),
                    Err(e) => report_error(&e),
                },
                Err(message) => println!("{}", message.bright_black()),
            },
            Input::List => picker.list().await,
            Input::Status => picker.status().await?,
            Input::Retry => match picker.gallery.retry().await {
                Some(state) => picker.apply_gallery(state),
                None => println!("{}", "Nothing to reload.".bright_black()),
            },
            Input::Complete => {
                let readiness = picker.selection.validate_for_completion().await?;
                if !readiness.is_ready() {
                    for message in readiness.messages() {
                        println!("  {}", message.yellow());
                    }
                    continue;
                }
                println!(
                    "{}",
                    "After confirming, the selection can no longer be changed.".bright_yellow()
                );
                let answer = rl.readline("Confirm your selection? (yes/no) ")?;
                let consent = if answer.trim().eq_ignore_ascii_case("yes") {
                    ConsentAffirmation::affirmed()
                } else {
                    ConsentAffirmation::declined()
                };
                match picker.selection.complete(consent).await {
                    Ok(_) => println!(
                        "{}",
                        "Thank you! Your selection was sent to the studio.".bright_green()
                    ),
                    Err(ProofingError::ConsentRequired) => {
                        println!("{}", "Not confirmed.".bright_black())
                    }
                    Err(e) => report_error(&e),
                }
            }
            Input::Help => print_help(),
            Input::Quit => break,
        }
    }

    picker.selection.close().await;
    cancel.cancel();
    let _ = watcher.await;
    if let Some(worker) = worker {
        let _ = worker.await;
    }
    println!("{}", "Your selection is saved. Goodbye!".bright_green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lightbox_keys() {
        assert_eq!(parse_input("left"), Ok(Input::Key(LightboxKey::ArrowLeft)));
        assert_eq!(parse_input(" right "), Ok(Input::Key(LightboxKey::ArrowRight)));
        assert_eq!(parse_input("esc"), Ok(Input::Key(LightboxKey::Escape)));
    }

    #[test]
    fn test_parse_numbers_are_one_based() {
        assert_eq!(parse_input("open 3"), Ok(Input::Open(3)));
        assert!(parse_input("open 0").is_err());
        assert!(parse_input("open x").is_err());
        assert_eq!(parse_input("select"), Ok(Input::Select(None)));
        assert_eq!(parse_input("select 2"), Ok(Input::Select(Some(2))));
    }

    #[test]
    fn test_parse_comment_keeps_text() {
        assert_eq!(
            parse_input("comment  make it  warmer"),
            Ok(Input::Comment("make it  warmer".to_string()))
        );
        assert_eq!(parse_input("comment"), Ok(Input::Comment(String::new())));
        assert!(parse_input("extra").is_err());
        assert!(parse_input("dance").is_err());
    }

    #[test]
    fn test_error_lines_list_every_mismatch() {
        let selection = proofing_core::selection::SelectionMap::new();
        let settings = proofing_core::selection::SelectionSettings::with_total(2)
            .extra("cover", "Album cover", 1);
        let err = ProofingError::CompletionNotReady(
            proofing_core::selection::completion_mismatches(&selection, &settings),
        );

        let lines = error_lines(&err);

        assert!(err.is_user_recoverable());
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "  Selected photos: expected 2, got 0 (select 2 more)");
        assert_eq!(lines[2], "  Album cover: expected 1, got 0 (select 1 more)");
    }
}
