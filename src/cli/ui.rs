use crate::core::currency::RateOrigin;
use crate::core::transaction::TransactionType;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    Positive,
    Negative,
    Warning,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::Positive => style(text).green().bold(),
        StyleType::Negative => style(text).red().bold(),
        StyleType::Warning => style(text).yellow(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Formats a signed amount, green when it is not negative.
pub fn style_balance(value: f64, currency: &str) -> String {
    let sign = if value >= 0.0 { "+" } else { "" };
    let text = format!("{sign}{value:.2} {currency}");
    if value >= 0.0 {
        style_text(&text, StyleType::Positive)
    } else {
        style_text(&text, StyleType::Negative)
    }
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Formats an `Option<T>` into a `Cell`. `None` is displayed as "N/A".
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or(
        Cell::new("N/A")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
        |v| Cell::new(format_fn(v)).set_alignment(CellAlignment::Right),
    )
}

/// Right-aligned money cell.
pub fn amount_cell(value: f64) -> Cell {
    Cell::new(format!("{value:.2}")).set_alignment(CellAlignment::Right)
}

/// Right-aligned cell with four decimals, for exchange rates.
pub fn amount_cell_precise(value: f64) -> Cell {
    Cell::new(format!("{value:.4}")).set_alignment(CellAlignment::Right)
}

/// Signed amount cell colored by transaction type.
pub fn transaction_amount_cell(kind: TransactionType, amount: f64) -> Cell {
    match kind {
        TransactionType::Income => Cell::new(format!("+{amount:.2}"))
            .fg(Color::Green)
            .set_alignment(CellAlignment::Right),
        TransactionType::Expense => Cell::new(format!("-{amount:.2}"))
            .fg(Color::Red)
            .set_alignment(CellAlignment::Right),
    }
}

/// Creates a cell for displaying percentage change with color coding.
///
/// `rise_is_good` picks the color of a positive change: income going up is
/// green, spending going up is red.
pub fn change_cell(change: Option<f64>, rise_is_good: bool) -> Cell {
    let Some(change) = change else {
        return format_optional_cell(None::<f64>, |_| String::new());
    };
    let sign = if change > 0.0 { "+" } else { "" };
    let color = if (change >= 0.0) == rise_is_good {
        Color::Green
    } else {
        Color::Red
    };
    Cell::new(format!("{sign}{change:.1}%"))
        .fg(color)
        .set_alignment(CellAlignment::Right)
}

/// Utilization cell; red once the budget is used up.
pub fn utilization_cell(pct: Option<f64>) -> Cell {
    let Some(pct) = pct else {
        return format_optional_cell(None::<f64>, |_| String::new());
    };
    let color = if pct >= 100.0 {
        Color::Red
    } else if pct >= 80.0 {
        Color::Yellow
    } else {
        Color::Green
    };
    Cell::new(format!("{pct:.0}%"))
        .fg(color)
        .set_alignment(CellAlignment::Right)
}

/// Short note on where displayed rates came from.
pub fn rate_origin_note(origin: RateOrigin) -> String {
    match origin {
        RateOrigin::Live => style_text("live", StyleType::Subtle),
        RateOrigin::Cached => style_text("cached", StyleType::Subtle),
        RateOrigin::Stale => style_text("stale, sources unavailable", StyleType::Warning),
        RateOrigin::Default => style_text("offline defaults", StyleType::Warning),
    }
}

/// Creates a spinner shown while waiting on the network.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let spinner_style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(spinner_style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Prints a separator line matching the terminal width.
pub fn print_separator() {
    let term_width = console::Term::stdout()
        .size_checked()
        .map(|(_, w)| w as usize)
        .unwrap_or(80);
    println!("\n{}", "─".repeat(term_width));
}
