use std::path::Path;

pub fn run(id: &str, from: Option<&str>, config: Option<&Path>) -> Result<(), String> {
    let config = super::load_config(config)?;
    let rules = &config.paths;

    let canonical = match from {
        Some(calling_file) => {
            let calling_file = rules
                .canonicalize(calling_file)
                .map_err(|e| format!("invalid calling file: {e}"))?;
            rules.resolve_relative(&calling_file, id)
        }
        None => rules.canonicalize(id),
    }
    .map_err(|e| e.to_string())?;

    println!("{canonical}");
    Ok(())
}
