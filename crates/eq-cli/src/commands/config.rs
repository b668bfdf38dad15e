use std::path::Path;

use colored::Colorize;
use eq_http::HttpConfig;

pub fn run(path: Option<&Path>) -> Result<(), String> {
    let rules = super::load_rules(path)?;
    let http = HttpConfig::default();

    let source = match path {
        Some(p) => p.display().to_string(),
        None => "built-in defaults".to_string(),
    };
    println!("  {} {}", "Game rules".bold(), format!("({source})").dimmed());
    let json = serde_json::to_string_pretty(&rules).map_err(|e| e.to_string())?;
    println!("{json}");
    println!();
    println!("  {}", "Question service".bold());
    println!("  base url: {}", http.base_url);
    println!("  timeout:  {}s", http.timeout.as_secs());
    Ok(())
}
