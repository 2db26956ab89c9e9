use std::io::{self, BufRead, Write};
use std::path::Path;

use colored::Colorize;
use fabula_core::{Choice, StoryEvent};
use strsim::jaro_winkler;

/// Minimum similarity score for fuzzy option matching (0.0-1.0).
const FUZZY_THRESHOLD: f64 = 0.8;

pub fn run(dir: &Path, entry: &str, config: Option<&Path>, json: bool) -> Result<(), String> {
    let mut engine = super::engine_for(dir, config)?;

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line = String::new();

    let mut next = engine.eval_file(entry).map_err(super::describe)?;
    while let Some(event) = next {
        if json {
            let encoded = serde_json::to_string(&event).map_err(|e| e.to_string())?;
            println!("{encoded}");
        } else {
            print_event(&event);
        }

        let StoryEvent::Choice(choice) = event else {
            next = engine.resume().map_err(super::describe)?;
            continue;
        };

        next = loop {
            if !json {
                print!("> ");
                io::stdout().flush().map_err(|e| e.to_string())?;
            }

            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => {
                    engine.terminate();
                    return Ok(());
                }
                Err(e) => return Err(e.to_string()),
                _ => {}
            }

            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            let Some(option_id) = pick_option(&choice, input) else {
                println!("{}", format!("  No option matches '{input}'.").yellow());
                continue;
            };
            match engine.choose(&option_id) {
                Ok(next) => break next,
                Err(e) => println!("{}", format!("  {e}").yellow()),
            }
        };
    }

    if !json {
        println!();
        println!("  {}", "The End".bold());
    }
    Ok(())
}

fn print_event(event: &StoryEvent) {
    match event {
        StoryEvent::VoiceLine(line) => match &line.character {
            Some(speaker) if speaker.emotion.is_empty() => {
                println!("  {}: {}", speaker.id.bold(), line.text);
            }
            Some(speaker) => {
                println!(
                    "  {} {}: {}",
                    speaker.id.bold(),
                    format!("({})", speaker.emotion).dimmed(),
                    line.text
                );
            }
            None => println!("  {}", line.text.italic()),
        },
        StoryEvent::Character(character) => {
            println!(
                "  {} {} {}",
                "~".dimmed(),
                character.id.bold(),
                format!("[{}]", character.emotion).dimmed()
            );
        }
        StoryEvent::SceneChange { name } => {
            println!();
            println!("  {}", format!("== {name} ==").bold().underline());
        }
        StoryEvent::Choice(choice) => {
            println!();
            println!("  {}", choice.question.bold());
            for (index, option) in choice.options.iter().enumerate() {
                let label = format!("{}. {}", index + 1, option.text);
                if option.available {
                    println!("    {label}");
                } else {
                    println!("    {} {}", label.dimmed(), "(unavailable)".dimmed());
                }
            }
        }
    }
}

/// Match player input to an option id: a 1-based number, an exact id, or
/// the closest id or text above the fuzzy threshold.
fn pick_option(choice: &Choice, input: &str) -> Option<String> {
    if let Ok(number) = input.parse::<usize>() {
        return number
            .checked_sub(1)
            .and_then(|index| choice.options.get(index))
            .map(|option| option.id.clone());
    }

    if let Some(option) = choice.option(input) {
        return Some(option.id.clone());
    }

    let input_lower = input.to_lowercase();
    let mut matches: Vec<(&str, f64)> = choice
        .options
        .iter()
        .filter_map(|option| {
            let score = jaro_winkler(&input_lower, &option.id.to_lowercase())
                .max(jaro_winkler(&input_lower, &option.text.to_lowercase()));
            (score >= FUZZY_THRESHOLD).then_some((option.id.as_str(), score))
        })
        .collect();

    matches.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    matches.first().map(|(id, _)| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabula_core::StoryOption;

    fn door() -> Choice {
        Choice::new("door", "Open the door?")
            .with_option(StoryOption::new("open", "Push it open"))
            .with_option(StoryOption::new("knock", "Knock politely"))
    }

    #[test]
    fn picks_by_number() {
        assert_eq!(pick_option(&door(), "2").as_deref(), Some("knock"));
        assert_eq!(pick_option(&door(), "0"), None);
        assert_eq!(pick_option(&door(), "3"), None);
    }

    #[test]
    fn picks_by_exact_id() {
        assert_eq!(pick_option(&door(), "open").as_deref(), Some("open"));
    }

    #[test]
    fn picks_by_fuzzy_id_or_text() {
        assert_eq!(pick_option(&door(), "knok").as_deref(), Some("knock"));
        assert_eq!(pick_option(&door(), "push it opn").as_deref(), Some("open"));
        assert_eq!(pick_option(&door(), "zzz"), None);
    }
}
