use colored::{ColoredString, Colorize};
use lifecycle::Severity;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Severity name colored by how hard it constrains the solver
pub fn severity(severity: Severity) -> ColoredString {
    let name = severity.as_str();
    match severity {
        Severity::Passive => name.dimmed(),
        Severity::Present => name.normal(),
        Severity::EagerPresent | Severity::EagerPassive => name.cyan(),
        Severity::Mandatory => name.green().bold(),
        Severity::Excluded => name.red(),
    }
}

/// Comma-separated list, or a dimmed dash when empty
pub fn list<I, T>(items: I) -> String
where
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    let joined = items
        .into_iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        "-".dimmed().to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_joins() {
        colored::control::set_override(false);
        assert_eq!(list(["a", "b"]), "a, b");
        assert_eq!(list(Vec::<String>::new()), "-");
    }

    #[test]
    fn test_severity_keeps_name() {
        colored::control::set_override(false);
        assert_eq!(severity(Severity::EagerPassive).to_string(), "eager_passive");
    }
}
