use std::path::PathBuf;

use anyhow::Result;
use console::style;
use scriptcast_core::{PipelineState, UserAction, format_script_readable};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use crate::app::App;

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    New(String),
    Regenerate,
    Edit,
    Audio(Option<PathBuf>),
    Show,
    Reset,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "new" if !rest.is_empty() => Command::New(rest.to_string()),
        "regenerate" | "regen" => Command::Regenerate,
        "edit" => Command::Edit,
        "audio" if rest.is_empty() => Command::Audio(None),
        "audio" => Command::Audio(Some(PathBuf::from(rest))),
        "show" => Command::Show,
        "reset" => Command::Reset,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    };
    Some(command)
}

/// Lines typed after `edit`, up to a line holding a single `.`.
pub fn collect_edit<I>(lines: I) -> String
where
    I: IntoIterator<Item = String>,
{
    lines
        .into_iter()
        .take_while(|line| line.trim_end() != ".")
        .collect::<Vec<_>>()
        .join("\n")
}

fn print_help() {
    println!("{}", style("Commands:").bold());
    println!("  new <TITLE>   research and write a script for another title");
    println!("  regenerate    write a fresh script for the current title");
    println!("  edit          replace the script; finish with a line holding '.'");
    println!("  audio [PATH]  synthesize the script and save the audio");
    println!("  show          print the current script");
    println!("  reset         discard the session");
    println!("  quit          reset and exit");
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("{} ", style(label).cyan().bold()).as_bytes())
        .await?;
    stdout.flush().await?;
    Ok(lines.next_line().await?)
}

pub async fn run(app: &mut App) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_help();

    loop {
        let label = format!("[{}] >", app.session().state.label());
        let Some(line) = prompt(&mut lines, &label).await? else {
            break;
        };
        let Some(command) = parse_command(&line) else {
            continue;
        };

        match command {
            Command::New(title) => {
                let request = app.request_for(title);
                app.dispatch(UserAction::Submit(request)).await;
            }
            Command::Regenerate => app.dispatch(UserAction::Regenerate).await,
            Command::Edit => {
                println!("{}", style("Enter the new script, then '.' on its own line:").dim());
                let mut typed = Vec::new();
                while let Some(line) = lines.next_line().await? {
                    let done = line.trim_end() == ".";
                    typed.push(line);
                    if done {
                        break;
                    }
                }
                app.dispatch(UserAction::Edit(collect_edit(typed))).await;
            }
            Command::Audio(path) => {
                app.dispatch(UserAction::Synthesize).await;
                if app.session().state == PipelineState::AudioReady {
                    if let Err(e) = app.save_audio(path.as_deref()).await {
                        eprintln!("{} {:#}", style("Error:").red().bold(), e);
                    }
                }
            }
            Command::Show => match &app.session().current_script {
                Some(script) => println!(
                    "{}",
                    format_script_readable(script.source_summary.query(), script)
                ),
                None => println!("{}", style("No script yet.").dim()),
            },
            Command::Reset => app.dispatch(UserAction::Reset).await,
            Command::Help => print_help(),
            Command::Quit => break,
            Command::Unknown(input) => {
                println!("{} {}", style("Unknown command:").yellow(), input);
                print_help();
            }
        }
    }

    app.dispatch(UserAction::Reset).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(parse_command("  "), None);
        assert_eq!(parse_command("regen"), Some(Command::Regenerate));
        assert_eq!(parse_command("Audio"), Some(Command::Audio(None)));
        assert_eq!(
            parse_command("audio /tmp/out file.wav"),
            Some(Command::Audio(Some(PathBuf::from("/tmp/out file.wav"))))
        );
        assert_eq!(
            parse_command("new The history of tea"),
            Some(Command::New("The history of tea".to_string()))
        );
        assert_eq!(
            parse_command("new"),
            Some(Command::Unknown("new".to_string()))
        );
        assert_eq!(parse_command("exit"), Some(Command::Quit));
    }

    #[test]
    fn edit_stops_at_a_lone_dot() {
        let typed = ["Line one.", "", "Line two.", ".", "ignored"].map(String::from);
        assert_eq!(collect_edit(typed), "Line one.\n\nLine two.");
    }
}
