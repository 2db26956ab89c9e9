use std::collections::BTreeMap;
use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

pub fn run(dir: &Path, entry: &str, config: Option<&Path>, max_steps: usize) -> Result<(), String> {
    let mut engine = super::engine_for(dir, config)?;

    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut steps = 0;
    let mut next = engine.eval_file(entry).map_err(super::describe)?;

    while let Some(event) = next {
        steps += 1;
        if steps > max_steps {
            engine.terminate();
            return Err(format!("story did not finish within {max_steps} events"));
        }
        *counts.entry(event.kind()).or_default() += 1;

        let result = match event.as_choice() {
            Some(choice) => {
                let Some(option) = choice.available_options().next() else {
                    engine.terminate();
                    return Err(format!("choice '{}' has no available option", choice.id));
                };
                let option_id = option.id.clone();
                engine.choose(&option_id)
            }
            None => engine.resume(),
        };
        next = result.map_err(super::describe)?;
    }

    let modules = engine.loaded_modules();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Loaded module"]);
    for module in &modules {
        table.add_row(vec![module]);
    }
    println!("{table}");

    if !counts.is_empty() {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Event", "Count"]);
        for (kind, count) in &counts {
            table.add_row(vec![kind.to_string(), count.to_string()]);
        }
        println!("{table}");
    }
    println!();

    let diagnostics = engine.diagnostics();
    if !diagnostics.is_empty() {
        for message in &diagnostics {
            eprintln!("  {} {message}", "ERROR".red().bold());
        }
        return Err(format!(
            "story reported {} error{}",
            diagnostics.len(),
            if diagnostics.len() == 1 { "" } else { "s" }
        ));
    }

    println!("  All checks passed for '{entry}'.");
    println!("  {steps} events, {} modules", modules.len());
    Ok(())
}
