//! Interactive admin session. The dashboard lives for the whole session, so
//! the selection, filter and comment draft carry over between commands.

use anyhow::Result;
use std::io::{BufRead, Write};

use crate::client::ApiClient;
use crate::credential::CredentialStore;
use crate::dashboard::Dashboard;
use crate::models::{IssueStatus, StatusFilter};
use crate::render;
use crate::transport::Transport;

use super::show::print_selection;

const PROMPT: &str = "desk> ";

const HELP: &str = "\
Commands:
  login <secret>             check and remember the admin secret
  logout                     forget the admin secret
  list [status|all]          load issues, optionally filtered by status
  refresh                    reload with the current filter
  show <id>                  select an issue and load its attachments
  status <status> [comment]  set the selected issue's status (comment defaults to the draft)
  draft <text>               keep a comment draft for the selected issue
  comment [text]             send text, or the draft, as a comment
  export <from> <to>         print the export URL (YYYY-MM-DD)
  help                       show this help
  quit                       leave the shell
";

pub fn run<T: Transport, S: CredentialStore>(
    dash: &mut Dashboard<S>,
    client: &ApiClient<T>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    writeln!(out, "civic-desk admin shell. Type 'help' for commands.")?;
    if dash.gate().is_unlocked() {
        if report(dash.refresh(client), dash, out)? {
            write!(out, "{}", render::issue_table(dash.issues()))?;
        }
    } else if let Some(notice) = dash.notice() {
        writeln!(out, "{}", render::notice_line(notice))?;
    }

    let mut line = String::new();
    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }

        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "quit" | "exit" => break,
            "help" => write!(out, "{}", HELP)?,
            "login" => {
                let unlocked = dash.unlock(rest, client)?;
                if let Some(notice) = dash.gate().notice() {
                    writeln!(out, "{}", render::notice_line(notice))?;
                }
                if unlocked {
                    write!(out, "{}", render::issue_table(dash.issues()))?;
                }
            }
            "logout" => {
                dash.change_secret()?;
                writeln!(out, "Admin secret cleared.")?;
            }
            "list" => match rest.parse::<StatusFilter>() {
                Ok(filter) => {
                    let result = dash.set_filter(filter, client);
                    if report(result, dash, out)? {
                        write!(out, "{}", render::issue_table(dash.issues()))?;
                    }
                }
                Err(e) => writeln!(out, "error: {}", e)?,
            },
            "refresh" => {
                let result = dash.refresh(client);
                if report(result, dash, out)? {
                    write!(out, "{}", render::issue_table(dash.issues()))?;
                }
            }
            "show" => match rest.parse::<i64>() {
                Ok(id) => {
                    let result = dash.select(id, client);
                    if report(result, dash, out)? {
                        // A 401 on the attachment fetch locks without failing.
                        if dash.gate().is_unlocked() {
                            print_selection(dash, client.base_url(), out)?;
                        } else {
                            print_notice(dash, out)?;
                        }
                    }
                }
                Err(_) => writeln!(out, "error: usage: show <id>")?,
            },
            "status" => {
                let (status, comment) = match rest.split_once(char::is_whitespace) {
                    Some((status, comment)) => (status, Some(comment.trim())),
                    None => (rest, None),
                };
                match status.parse::<IssueStatus>() {
                    Ok(status) => {
                        let result = dash.change_status(status, comment, client);
                        if report(result, dash, out)? {
                            print_selection(dash, client.base_url(), out)?;
                        }
                    }
                    Err(e) => writeln!(out, "error: {}", e)?,
                }
            }
            "draft" => {
                dash.set_comment_draft(rest);
                writeln!(out, "Draft saved.")?;
            }
            "comment" => {
                let text = if rest.is_empty() {
                    dash.selection().map(|s| s.comment_draft.clone()).unwrap_or_default()
                } else {
                    rest.to_string()
                };
                let result = dash.send_comment(&text, client);
                if report(result, dash, out)? {
                    writeln!(out, "Comment sent.")?;
                }
            }
            "export" => {
                let mut dates = rest.split_whitespace();
                let from = dates.next().unwrap_or("");
                let to = dates.next().unwrap_or("");
                let result = dash.export_url(from, to, client);
                if let Ok(url) = &result {
                    writeln!(out, "{}", url)?;
                }
                report(result, dash, out)?;
            }
            other => writeln!(out, "error: unknown command '{}'. Type 'help'.", other)?,
        }
    }
    Ok(())
}

/// Print an action's failure. Returns whether it succeeded.
fn report<T, S: CredentialStore>(
    result: Result<T, crate::ApiError>,
    dash: &Dashboard<S>,
    out: &mut impl Write,
) -> Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(err) => {
            if dash.gate().is_unlocked() {
                writeln!(out, "error: {}", err)?;
            } else {
                print_notice(dash, out)?;
            }
            Ok(false)
        }
    }
}

fn print_notice<S: CredentialStore>(dash: &Dashboard<S>, out: &mut impl Write) -> Result<()> {
    if let Some(notice) = dash.notice() {
        writeln!(out, "{}", render::notice_line(notice))?;
    }
    Ok(())
}
