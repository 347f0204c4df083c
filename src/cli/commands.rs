use std::fmt::Write as _;
use std::io::{self, Read, Write};

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::app::state::{parse_tag_list, sort_newest_first};
use crate::app::views;
use crate::remote::{Note, NoteFields, NotesBackend};

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Search query forwarded to the remote service
    #[arg()]
    pub query: Vec<String>,
    /// Only show notes carrying this tag
    #[arg(long)]
    pub tag: Option<String>,
    /// Limit the number of results printed
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    /// Title for the note (prompted if omitted)
    #[arg()]
    pub title: Option<String>,
    /// Provide the note content inline. If omitted, reads from stdin.
    #[arg(long)]
    pub content: Option<String>,
    /// Comma-separated tags, e.g. "work, urgent"
    #[arg(long)]
    pub tags: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Note identifier
    pub id: i64,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Note identifier
    pub id: i64,
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

pub async fn list_notes<B: NotesBackend>(remote: &B, args: ListArgs) -> Result<()> {
    let query = args.query.join(" ");
    let query = query.trim();
    let mut notes = remote
        .list((!query.is_empty()).then_some(query))
        .await
        .context("listing notes")?;
    sort_newest_first(&mut notes);
    let visible = views::visible_notes(&notes, args.tag.as_deref());
    print!("{}", format_note_list(&visible, args.limit));
    Ok(())
}

pub async fn new_note<B: NotesBackend>(remote: &B, args: NewArgs) -> Result<()> {
    let title = match args.title {
        Some(title) => title,
        None => prompt("Title")?,
    };
    let content = match args.content {
        Some(content) => content,
        None => read_stdin()?.unwrap_or_default(),
    };
    let tags = args.tags.as_deref().map(parse_tag_list).unwrap_or_default();

    let created = remote
        .create(&NoteFields {
            title: title.trim().to_string(),
            content,
            tags,
        })
        .await
        .context("creating note")?;
    println!("Created note #{}", created.id);
    Ok(())
}

pub async fn show_note<B: NotesBackend>(remote: &B, args: ShowArgs) -> Result<()> {
    let note = remote
        .get(args.id)
        .await
        .with_context(|| format!("fetching note #{}", args.id))?;
    print!("{}", format_note(&note));
    Ok(())
}

pub async fn delete_note<B: NotesBackend>(remote: &B, args: DeleteArgs) -> Result<()> {
    if !args.yes && !confirm(&format!("Delete note #{}?", args.id))? {
        bail!("aborted");
    }
    remote
        .delete(args.id)
        .await
        .with_context(|| format!("deleting note #{}", args.id))?;
    println!("Deleted note #{}", args.id);
    Ok(())
}

fn format_note_list(notes: &[&Note], limit: usize) -> String {
    if notes.is_empty() {
        return "No notes found.\n".to_string();
    }
    let mut out = String::new();
    for note in notes.iter().take(limit) {
        let title = if note.title.trim().is_empty() {
            "(untitled)"
        } else {
            note.title.as_str()
        };
        let _ = writeln!(&mut out, "#{}  {}", note.id, title);
        let stamp = note.effective_timestamp();
        if !stamp.is_empty() {
            let _ = writeln!(&mut out, "    updated {stamp}");
        }
        if !note.tags.is_empty() {
            let _ = writeln!(&mut out, "    tags    {}", note.tags.join(", "));
        }
    }
    if notes.len() > limit {
        let _ = writeln!(&mut out, "… and {} more", notes.len() - limit);
    }
    out
}

fn format_note(note: &Note) -> String {
    let mut out = String::new();
    let title = if note.title.trim().is_empty() {
        "(untitled)"
    } else {
        note.title.as_str()
    };
    let _ = writeln!(&mut out, "#{}  {}", note.id, title);
    if let Some(created) = note.created_at.as_deref() {
        let _ = writeln!(&mut out, "created {created}");
    }
    if let Some(updated) = note.updated_at.as_deref() {
        let _ = writeln!(&mut out, "updated {updated}");
    }
    if !note.tags.is_empty() {
        let _ = writeln!(&mut out, "tags    {}", note.tags.join(", "));
    }
    if !note.content.is_empty() {
        let _ = writeln!(&mut out);
        let _ = writeln!(&mut out, "{}", note.content.trim_end());
    }
    out
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush().context("flushing prompt")?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("reading prompt response")?;
    Ok(line.trim().to_string())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N]: ");
    io::stdout().flush().context("flushing prompt")?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("reading confirmation")?;
    let answer = line.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("reading note content from stdin")?;
    Ok(Some(buffer))
}
