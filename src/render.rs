//! Plain-text rendering of the picker and the result panel
//!
//! Markdown in the analysis is passed through untouched; paragraphs are
//! separated by blank lines.

use crate::catalog::Stock;
use crate::models::paragraphs;
use crate::presenter::{PresenterView, Status};
use std::fmt::Write;

const BAR_WIDTH: usize = 30;

/// Picker listing with a check mark on the committed stock
pub fn render_picker(results: &[Stock], selected: Option<&Stock>) -> String {
    if results.is_empty() {
        return "No stocks found.\n".to_string();
    }

    let mut out = String::new();
    for stock in results {
        let mark = match selected {
            Some(s) if s.symbol == stock.symbol => '✓',
            _ => ' ',
        };
        let _ = write!(out, "{} {:<6} {}", mark, stock.symbol, stock.name);
        if let Some(sector) = &stock.sector {
            let _ = write!(out, " • {}", sector);
        }
        out.push('\n');
    }
    out
}

pub fn render_progress_bar(percent: u8) -> String {
    let filled = BAR_WIDTH * usize::from(percent.min(100)) / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent.min(100)
    )
}

/// Result panel for the current presenter state
pub fn render_view(view: &PresenterView) -> String {
    let Some(stock) = &view.stock else {
        return "Select a stock to view the analysis.\n".to_string();
    };

    let mut out = String::new();
    let _ = writeln!(out, "[{}]", stock.sector_label());
    let _ = writeln!(out, "{} ({})", stock.name, stock.symbol);
    let _ = writeln!(out, "{}", "-".repeat(40));

    match view.status {
        Status::Idle => {}
        Status::Loading => {
            let _ = writeln!(out, "Analyzing {}... {}", stock.symbol, render_progress_bar(view.progress));
            for width in [30, 40, 34, 26, 40] {
                let _ = writeln!(out, "{}", "░".repeat(width));
            }
        }
        Status::Failure => {
            let _ = writeln!(out, "Error fetching analysis");
            let _ = writeln!(out, "{}", view.error.as_deref().unwrap_or("An unknown error occurred"));
        }
        Status::Success => {
            let content = view.content.as_deref().unwrap_or_default();
            let blocks: Vec<&str> = paragraphs(content).collect();
            let _ = writeln!(out, "{}", blocks.join("\n\n"));

            if !view.references.is_empty() {
                let _ = writeln!(out, "\nReferences:");
                for (i, url) in view.references.iter().enumerate() {
                    let _ = writeln!(out, "  [{}] {}", i + 1, url);
                }
            }
        }
    }

    out
}
