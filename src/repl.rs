//! Line-oriented interactive front end.
//!
//! Reads one command per line, turns it into a [`Command`] and hands it to
//! the [`Session`]. Category changes go through a [`Debounced`] action so a
//! burst of `category` lines results in a single fetch for the last one.
//!
//! At end of input a pending category change is still applied before the
//! loop returns.

use crate::api::HttpTransport;
use crate::debounce::{Debounced, debounce};
use crate::feedback::FeedbackForm;
use crate::models::Category;
use crate::outputs::RenderSink;
use crate::session::{Command, Flow, Session};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "next" | "n" => Command::NextPage,
        "prev" | "previous" | "p" => Command::PreviousPage,
        "page" => {
            let page = rest
                .parse::<u32>()
                .map_err(|_| format!("Usage: page <n> (got {rest:?})"))?;
            Command::GoToPage(page)
        }
        "category" | "c" => {
            if rest.is_empty() {
                return Err("Usage: category <name>".to_string());
            }
            Command::SetCategory(rest.parse::<Category>()?)
        }
        "reload" | "r" => Command::Reload,
        "feedback" => {
            let (email, text) = rest
                .split_once(char::is_whitespace)
                .map(|(email, text)| (email, text.trim()))
                .unwrap_or((rest, ""));
            if email.is_empty() {
                return Err("Usage: feedback <email> <text>".to_string());
            }
            Command::Feedback(FeedbackForm::new(email, text))
        }
        "login" => Command::Login,
        "signup" | "sign-up" => Command::SignUp,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(format!("Unknown command {other:?}; type help for a list")),
    };
    Ok(Some(command))
}

/// Run the interactive loop until `quit` or end of input.
///
/// The first page is loaded before any input is read.
#[instrument(level = "info", skip_all, fields(debounce_ms = debounce_delay.as_millis() as u64))]
pub async fn run<T, R, S>(
    session: &mut Session<T>,
    input: R,
    mut sink: S,
    debounce_delay: Duration,
) -> Result<(), std::io::Error>
where
    T: HttpTransport,
    R: AsyncBufRead + Unpin,
    S: RenderSink,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Category>();
    let mut category_changes: Option<Debounced<Category>> = Some(debounce(
        move |category| {
            let _ = tx.send(category);
        },
        debounce_delay,
    ));

    session.initial_load(&mut sink).await;
    let mut lines = input.lines();

    loop {
        tokio::select! {
            line = lines.next_line(), if category_changes.is_some() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        debug!("End of input");
                        // Dropping the last handle closes the channel once any
                        // pending change has been delivered.
                        category_changes = None;
                        continue;
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to read input");
                        if let Some(pending) = category_changes.take() {
                            pending.cancel();
                        }
                        return Err(e);
                    }
                };
                match parse_command(&line) {
                    Ok(Some(Command::SetCategory(category))) => {
                        if let Some(debounced) = &category_changes {
                            debounced.call(category);
                        }
                    }
                    Ok(Some(command)) => {
                        if session.handle(command, &mut sink).await == Flow::Quit {
                            if let Some(pending) = category_changes.take() {
                                pending.cancel();
                            }
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(message) => sink.notify(&message),
                }
            }
            category = rx.recv() => match category {
                Some(category) => session.change_category(category, &mut sink).await,
                None => break,
            },
        }
    }

    info!(category = %session.category(), page = session.pagination().page(), "Leaving interactive mode");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{Reply, ScriptedTransport};
    use crate::config::NewsConfig;
    use crate::models::Credential;
    use crate::outputs::testing::RecordingSink;
    use serde_json::json;
    use tokio::io::{AsyncWriteExt, BufReader, duplex};
    use tokio::time::sleep;

    fn session() -> Session<ScriptedTransport> {
        let articles = || Reply::ok_json(json!({ "articles": [{ "title": "n" }] }));
        let transport = ScriptedTransport::new()
            .on("newsapi.org", [articles(), articles(), articles()])
            .on(
                "api.mediastack.com",
                (0..3).map(|_| Reply::ok_json(json!({ "data": [{ "title": "m" }] }))),
            );
        let mut config = NewsConfig::default();
        config.newsapi.keys = vec![Credential::new("k1")];
        config.mediastack.key = Some(Credential::new("m1"));
        config.loader_min_display_ms = 0;
        config.build_session(transport).unwrap()
    }

    #[test]
    fn test_parse_navigation_commands() {
        assert_eq!(parse_command("next").unwrap(), Some(Command::NextPage));
        assert_eq!(parse_command(" p ").unwrap(), Some(Command::PreviousPage));
        assert_eq!(parse_command("page 7").unwrap(), Some(Command::GoToPage(7)));
        assert_eq!(parse_command("R").unwrap(), Some(Command::Reload));
        assert_eq!(parse_command("").unwrap(), None);
    }

    #[test]
    fn test_parse_category() {
        assert_eq!(
            parse_command("category Science").unwrap(),
            Some(Command::SetCategory(Category::Science))
        );
        assert_eq!(parse_command("c all").unwrap(), Some(Command::SetCategory(Category::All)));
        assert!(parse_command("c").is_err());
        assert!(parse_command("c gossip").is_err());
    }

    #[test]
    fn test_parse_feedback_keeps_full_text() {
        assert_eq!(
            parse_command("feedback me@example.com Loving the  science section").unwrap(),
            Some(Command::Feedback(FeedbackForm::new(
                "me@example.com",
                "Loving the  science section"
            )))
        );
        assert_eq!(
            parse_command("feedback me@example.com").unwrap(),
            Some(Command::Feedback(FeedbackForm::new("me@example.com", "")))
        );
        assert!(parse_command("feedback").is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_and_bad_pages() {
        assert!(parse_command("dance").is_err());
        assert!(parse_command("page two").is_err());
        assert!(parse_command("page -1").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_category_changes_fetch_once() {
        let mut session = session();
        let mut sink = RecordingSink::default();
        let (mut client, server) = duplex(256);

        let typing = async move {
            client.write_all(b"c business\n").await.unwrap();
            sleep(Duration::from_millis(100)).await;
            client.write_all(b"c sports\n").await.unwrap();
            sleep(Duration::from_secs(1)).await;
            client.write_all(b"quit\n").await.unwrap();
            client
        };
        let (result, _client) = tokio::join!(
            run(&mut session, BufReader::new(server), &mut sink, Duration::from_millis(300)),
            typing
        );

        result.unwrap();
        let views = sink.views();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].query.category, Category::All);
        assert_eq!(views[1].query.category, Category::Sports);
        assert_eq!(session.category(), Category::Sports);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_category_applied_at_end_of_input() {
        let mut session = session();
        let mut sink = RecordingSink::default();
        let (mut client, server) = duplex(256);

        let typing = async move {
            client.write_all(b"c health\n").await.unwrap();
            drop(client);
        };
        let (result, ()) = tokio::join!(
            run(&mut session, BufReader::new(server), &mut sink, Duration::from_millis(300)),
            typing
        );

        result.unwrap();
        assert_eq!(sink.last_view().unwrap().query.category, Category::Health);
    }

    #[tokio::test]
    async fn test_bad_lines_are_reported_and_loop_continues() {
        let mut session = session();
        let mut sink = RecordingSink::default();
        let input: &[u8] = b"dance\nlogin\nq\n";

        run(&mut session, input, &mut sink, Duration::from_millis(300))
            .await
            .unwrap();

        let notices = sink.notices();
        assert_eq!(notices.len(), 2);
        assert!(notices[0].contains("dance"));
        assert_eq!(notices[1], "Login functionality coming soon!");
    }
}
