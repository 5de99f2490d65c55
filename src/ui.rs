// Terminal output helpers for command results

use colored::Colorize;

pub fn print_header(title: &str) {
    println!();
    println!("{}", title.bright_blue().bold());
    println!("{}", "=".repeat(60).bright_blue());
}

pub fn print_success(message: &str) {
    println!("{}", format!("✅ {}", message).bright_green().bold());
}

pub fn print_error(message: &str) {
    eprintln!("{}", format!("❌ {}", message).bright_red().bold());
}

pub fn print_info(message: &str) {
    println!("{}", format!("ℹ️  {}", message).bright_cyan());
}

pub fn print_warning(message: &str) {
    println!("{}", format!("⚠️  {}", message).bright_yellow());
}

/// One registry row: server, secret name and a default marker
pub fn print_registry_row(server: &str, name: &str, default: bool) {
    let marker = if default {
        "*".bright_green().bold().to_string()
    } else {
        " ".to_string()
    };
    println!("{} {:<45} {}", marker, server.cyan(), name.dimmed());
}
