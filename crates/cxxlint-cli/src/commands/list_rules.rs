//! List rules command implementation.

use cxxlint_rules::{all_rules, Preset, RuleId};

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!(
        "{:<8} {:<32} {:<9} {:<8} Description",
        "Code", "Name", "Severity", "Fixable"
    );
    println!("{}", "-".repeat(100));

    for rule in all_rules() {
        println!(
            "{:<8} {:<32} {:<9} {:<8} {}",
            rule.code(),
            rule.name(),
            rule.default_severity().to_string(),
            if rule.fixable() { "yes" } else { "no" },
            rule.description()
        );
    }

    println!("\nPresets:");
    for preset in Preset::ALL {
        let codes: Vec<&str> = RuleId::ALL
            .into_iter()
            .filter(|id| preset.includes(*id))
            .map(RuleId::code)
            .collect();
        let default = if preset == Preset::Recommended {
            " (default)"
        } else {
            ""
        };
        println!("  {:<12} - {}{}", preset.name(), codes.join(", "), default);
    }

    println!("\nUse --rules to filter specific rules, e.g.:");
    println!("  cxxlint check --rules naming-casing,unscoped-enum");
    println!("  cxxlint check --rules CX001,CX003");
}
