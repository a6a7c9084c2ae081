//! Diagnostic tool - Check scout configuration
//!
//! Run with: cargo run --bin diagnose

use std::env;

use liquidity_scout::config::{env_value_parses, Config};

fn main() {
    println!("🔍 LIQUIDITY SCOUT DIAGNOSTIC CHECK\n");

    // Load .env
    let env_file = dotenvy::dotenv().ok();

    println!("═══════════════════════════════════════════════════");
    println!("                  CONFIGURATION                     ");
    println!("═══════════════════════════════════════════════════\n");

    match &env_file {
        Some(path) => println!("  .env loaded from {}\n", path.display()),
        None => println!("  No .env file found - using process environment\n"),
    }

    let mut malformed = Vec::new();
    for (key, default) in Config::default().env_values() {
        let from_env = env::var(key).ok();
        let marker = if from_env.is_some() { "(from env)" } else { "(default)" };
        let value = from_env.unwrap_or(default);

        let shown = if value.chars().count() > 50 {
            let head: String = value.chars().take(30).collect();
            let tail: String = value.chars().skip(value.chars().count() - 15).collect();
            format!("{}...{}", head, tail)
        } else {
            value.clone()
        };
        println!("  {}: {} {}", key, shown, marker);

        if !env_value_parses(key, &value) {
            println!("    └─ ❌ does not parse");
            malformed.push(key);
        }
    }

    println!("\n═══════════════════════════════════════════════════");
    println!("                     STATUS                         ");
    println!("═══════════════════════════════════════════════════\n");

    if malformed.is_empty() {
        match Config::from_env().and_then(|config| config.validate()) {
            Ok(()) => println!("  ✅ All settings parse and validate"),
            Err(e) => println!("  ❌ Settings parse but fail validation: {}", e),
        }
    } else {
        println!("  ❌ Malformed settings: {}", malformed.join(", "));
        println!("     The scout will refuse to start until these are fixed.");
    }

    println!("\n✅ Diagnostic complete!\n");
}
