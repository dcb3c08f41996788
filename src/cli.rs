//! Terminal front end
//!
//! Line-oriented commands on stdin; the result panel is printed once the
//! selection settles, with the synthetic progress bar shown meanwhile.

use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::SageError;
use crate::presenter::Status;
use crate::render::{render_picker, render_progress_bar, render_view};
use crate::session::Session;
use crate::Result;

pub const HELP: &str = "\
Commands:
  list [query]   show stocks, optionally filtered by symbol or name
  pick SYMBOL    analyze a stock
  show           print the current result panel
  key TOKEN      store your Perplexity API key
  reset-key      forget the stored API key
  help           show this help
  quit           exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List(String),
    Pick(String),
    Show,
    Key(String),
    ResetKey,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        match head.to_lowercase().as_str() {
            "" => Command::Empty,
            "list" | "ls" | "search" => Command::List(rest.to_string()),
            "pick" | "select" if !rest.is_empty() => Command::Pick(rest.to_string()),
            "show" => Command::Show,
            "key" => Command::Key(rest.to_string()),
            "reset-key" => Command::ResetKey,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => Command::Unknown(line.to_string()),
        }
    }
}

/// Wait for the current selection to settle, redrawing the progress bar
pub async fn follow_selection<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    let presenter = session.presenter();
    let mut ticker = tokio::time::interval(presenter.progress_clock().tick());
    let mut shown = None;

    while presenter.is_loading() {
        let view = presenter.snapshot();
        if view.status == Status::Loading && shown != Some(view.progress) {
            write!(out, "\rAnalyzing... {}", render_progress_bar(view.progress))?;
            out.flush()?;
            shown = Some(view.progress);
        }
        ticker.tick().await;
    }

    if shown.is_some() {
        writeln!(out, "\r{}", render_progress_bar(100))?;
    }
    write!(out, "{}", render_view(&presenter.snapshot()))?;
    Ok(())
}

/// Run one command. Returns false when the user asked to quit.
pub async fn execute<W: Write>(session: &Session, command: Command, out: &mut W) -> Result<bool> {
    match command {
        Command::Empty => {}
        Command::Help => writeln!(out, "{}", HELP)?,
        Command::Quit => return Ok(false),
        Command::List(query) => {
            let results = session.search(&query);
            write!(out, "{}", render_picker(&results, session.selected().as_ref()))?;
        }
        Command::Show => write!(out, "{}", render_view(&session.view()))?,
        Command::Pick(symbol) => match session.select(&symbol) {
            Ok(_) => follow_selection(session, out).await?,
            Err(SageError::UnknownSymbol(s)) => {
                writeln!(out, "Unknown symbol '{}'. Try `list {}`.", s, s.to_lowercase())?
            }
            Err(e) => return Err(e),
        },
        Command::Key(raw) => match session.submit_credential(&raw).await {
            Ok(credential) => writeln!(out, "API key saved ({}).", credential)?,
            Err(SageError::Analysis(e)) => writeln!(out, "{}", e.user_message())?,
            Err(e) => writeln!(out, "Could not update stored API key: {}", e)?,
        },
        Command::ResetKey => match session.reset_credential().await {
            Ok(()) => writeln!(out, "API key removed.")?,
            Err(e) => writeln!(out, "Could not update stored API key: {}", e)?,
        },
        Command::Unknown(line) => writeln!(out, "Unknown command '{}'. Type `help`.", line)?,
    }

    Ok(true)
}

/// Read commands until EOF or `quit`
pub async fn run<R, W>(session: &Session, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        if !execute(session, Command::parse(&line), out).await? {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::MockAnalysisProvider;
    use crate::credential::{Credential, CredentialStore};
    use crate::presenter::ProgressClock;
    use std::sync::Arc;
    use std::time::Duration;

    fn session(dir: &tempfile::TempDir, key: Option<&str>) -> Arc<Session> {
        Session::new(
            Arc::new(MockAnalysisProvider),
            CredentialStore::new(dir.path().join("credentials.json")),
            key.map(|k| Credential::new(k).unwrap()),
            ProgressClock::with_tick(Duration::from_secs(20), Duration::from_millis(5)),
        )
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("  pick  aapl "), Command::Pick("aapl".into()));
        assert_eq!(Command::parse("list"), Command::List(String::new()));
        assert_eq!(Command::parse("LIST coca cola"), Command::List("coca cola".into()));
        assert_eq!(Command::parse("key   "), Command::Key(String::new()));
        assert_eq!(Command::parse("reset-key"), Command::ResetKey);
        assert_eq!(Command::parse(""), Command::Empty);
        assert_eq!(Command::parse("pick"), Command::Unknown("pick".into()));
        assert_eq!(Command::parse("exit"), Command::Quit);
    }

    #[tokio::test]
    async fn test_scripted_session() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir, None);

        let script = "pick AAPL\nkey   \nkey pplx-live\npick msft\nlist walt\npick ZZZ\nquit\npick KO\n";
        let mut out = Vec::new();
        run(&session, script.as_bytes(), &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Error fetching analysis"));
        assert!(text.contains("Missing API key"));
        assert!(text.contains("API key saved"));
        assert!(!text.contains("pplx-live"));
        assert!(text.contains("Microsoft Corporation (MSFT)"));
        assert!(text.contains("DIS    The Walt Disney Company"));
        assert!(text.contains("Unknown symbol 'ZZZ'"));
        // nothing after quit runs
        assert!(!text.contains("(KO)"));
    }

    #[tokio::test]
    async fn test_store_failure_keeps_session_running() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("credentials.json"), "not json").unwrap();
        let session = session(&dir, Some("pplx-env"));

        let script = "key abc\nreset-key\nlist apple\n";
        let mut out = Vec::new();
        run(&session, script.as_bytes(), &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.matches("Could not update stored API key").count(), 2);
        assert!(text.contains("AAPL   Apple Inc."));
        assert!(!text.contains("API key saved"));
        assert_eq!(session.credential().unwrap().expose(), "pplx-env");
    }
}
