//! Interactive stdin menu: add, delete and display users until `4` or EOF.

use std::future::Future;
use std::io::Write;

use fanout_core::{NewUser, RequestId};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::commands::{print_lines, render_users, App};

const MENU: &str = "1) Add user\n2) Delete user\n3) Display users\n4) Exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Add,
    Delete,
    Display,
    Exit,
}

impl Choice {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "1" => Some(Choice::Add),
            "2" => Some(Choice::Delete),
            "3" => Some(Choice::Display),
            "4" => Some(Choice::Exit),
            _ => None,
        }
    }
}

/// Split a comma-separated id list, dropping blanks.
fn parse_ids(line: &str) -> Vec<RequestId> {
    line.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(RequestId::from)
        .collect()
}

pub async fn run(app: &App) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        println!("{MENU}");
        let Some(line) = prompt(&mut lines, "").await? else {
            return Ok(());
        };
        match Choice::parse(&line) {
            Some(Choice::Add) => {
                let Some(name) = prompt(&mut lines, "name: ").await? else { return Ok(()) };
                let Some(username) = prompt(&mut lines, "username: ").await? else { return Ok(()) };
                let Some(email) = prompt(&mut lines, "email: ").await? else { return Ok(()) };
                let input = NewUser {
                    name,
                    username,
                    email,
                };
                let Some(outcome) = interruptible(app.add_user(&input)).await else { return Ok(()) };
                println!("{outcome}");
            }
            Some(Choice::Delete) => {
                let Some(id) = prompt(&mut lines, "id: ").await? else { return Ok(()) };
                let id = RequestId::from(id.trim());
                let Some(outcome) = interruptible(app.delete_user(&id)).await else { return Ok(()) };
                println!("{outcome}");
            }
            Some(Choice::Display) => {
                let Some(raw) = prompt(&mut lines, "id's: ").await? else { return Ok(()) };
                let ids = parse_ids(&raw);
                if ids.is_empty() {
                    println!("no ids given");
                    continue;
                }
                let results = app.fetch_users(&ids).await;
                print_lines(render_users(&ids, &results));
                println!();
            }
            Some(Choice::Exit) => return Ok(()),
            None => tracing::debug!(input = %line.trim(), "unrecognised menu choice"),
        }
    }
}

/// Await `request` unless Ctrl-C arrives first.
///
/// Once a signal listener exists the default SIGINT exit is gone for the
/// rest of the process, so every await in the menu races the signal.
async fn interruptible<F: Future>(request: F) -> Option<F::Output> {
    tokio::select! {
        outcome = request => Some(outcome),
        _ = tokio::signal::ctrl_c() => None,
    }
}

/// Print `label`, then wait for a line. `None` on EOF or Ctrl-C.
async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> anyhow::Result<Option<String>> {
    if !label.is_empty() {
        print!("{label}");
        std::io::stdout().flush()?;
    }
    tokio::select! {
        line = lines.next_line() => Ok(line?),
        _ = tokio::signal::ctrl_c() => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ids_trims_and_drops_blanks() {
        let ids = parse_ids(" 1, 2 ,,3 ,");
        assert_eq!(
            ids,
            vec![RequestId::from("1"), RequestId::from("2"), RequestId::from("3")]
        );
    }

    #[test]
    fn parse_ids_of_blank_line_is_empty() {
        assert!(parse_ids("   ").is_empty());
    }

    #[tokio::test]
    async fn interruptible_passes_through_completed_request() {
        let outcome = interruptible(async { "User DELETE successful" }).await;
        assert_eq!(outcome, Some("User DELETE successful"));
    }

    #[test]
    fn choice_accepts_surrounding_whitespace() {
        assert_eq!(Choice::parse(" 3\n"), Some(Choice::Display));
        assert_eq!(Choice::parse("4"), Some(Choice::Exit));
        assert_eq!(Choice::parse("5"), None);
    }
}
