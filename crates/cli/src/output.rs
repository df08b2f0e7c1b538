// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Prints `value` as pretty JSON (`--format json`) or as a simple one
/// `label: value` line per top-level object key / array entry (the
/// default) — every tool response is already a JSON value, so this is the
/// one rendering path every subcommand shares.
pub fn print_value(format: OutputFormat, value: &serde_json::Value) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()));
        }
        OutputFormat::Text => print_text(value),
    }
}

fn print_text(value: &serde_json::Value) {
    match value {
        serde_json::Value::Array(items) => {
            if items.is_empty() {
                println!("(none)");
            }
            for item in items {
                print_text_entry(item);
            }
        }
        serde_json::Value::Object(_) => print_text_entry(value),
        other => println!("{other}"),
    }
}

fn print_text_entry(value: &serde_json::Value) {
    match value.as_object() {
        Some(map) => {
            let line = map.iter().map(|(k, v)| format!("{k}={}", compact(v))).collect::<Vec<_>>().join(" ");
            println!("{line}");
        }
        None => println!("{value}"),
    }
}

fn compact(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
