//! Terminal rendering

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use episteme_api::{ArgumentPoint, StockSuggestion};
use episteme_flow::{FavoriteSummary, PollPhase, PollView, PromptState, Report, SentimentBand};
use serde_json::Value;

const TABLE_WIDTH: u16 = 110;

pub fn error(message: &str) -> String {
    format!("Error: {message}")
}

pub fn suggestions(results: &[StockSuggestion]) -> String {
    if results.is_empty() {
        return "No matching tickers.".to_string();
    }

    let mut table = new_table(&["Ticker", "Company"]);
    for suggestion in results {
        table.add_row(vec![
            Cell::new(&suggestion.ticker),
            Cell::new(&suggestion.title),
        ]);
    }
    table.to_string()
}

/// Prompt message followed by the numbered choices
pub fn prompt(state: &PromptState) -> String {
    let mut output = format!("{}\n", state.message);
    for (index, choice) in state.available_choices().iter().enumerate() {
        output.push_str(&format!("  [{}] {}\n", index + 1, state.label(*choice)));
    }
    output
}

/// `[####------]  40%  status`, prefixed with `\r` to redraw in place
pub fn progress_line(view: &PollView) -> String {
    let steps = usize::from(view.progress.min(10));
    let bar = format!("{}{}", "#".repeat(steps), "-".repeat(10 - steps));
    let text = match view.phase {
        PollPhase::Failed => view.error.as_deref().unwrap_or_default(),
        _ => view.status_text.as_str(),
    };
    format!("\r[{bar}] {:>3}%  {text:<60}", view.percent())
}

pub fn report(report: &Report, favorite: bool) -> String {
    let company = &report.company;
    let ticker = company.ticker.as_deref().unwrap_or_default().to_uppercase();
    let title = company.title.as_deref().unwrap_or("Unknown Company");

    let mut output = format!("{title} ({ticker}){}\n", if favorite { " ★" } else { "" });
    output.push_str(&format!(
        "Sentiment: {} ({})\n",
        company
            .sentiment_score
            .map_or_else(|| "N/A".to_string(), |s| format!("{s:.0} / 100")),
        report.sentiment()
    ));

    let facts = [
        company.price.map(|p| format!("Price: ${p:.2}")),
        company
            .exchange_short_name
            .as_ref()
            .map(|e| format!("Exchange: {e}")),
        company.industry.as_ref().map(|i| format!("Industry: {i}")),
        company
            .mkt_cap
            .map(|m| format!("Market cap: {}", market_cap(m))),
        company.forward_pe.map(|pe| format!("Forward P/E: {pe:.2}")),
        company.beta.map(|b| format!("Beta: {b:.2}")),
        company.dcf.map(|d| format!("DCF: ${d:.2}")),
        company
            .analyst_rating
            .as_ref()
            .and_then(rating)
            .map(|r| format!("Analyst rating: {r}")),
        company
            .earnings_call_date
            .as_ref()
            .map(|d| format!("Next earnings call: {d}")),
    ];
    let facts: Vec<String> = facts.into_iter().flatten().collect();
    if !facts.is_empty() {
        output.push_str(&facts.join(" | "));
        output.push('\n');
    }

    if let Some(description) = company.description.as_deref().filter(|d| !d.is_empty()) {
        output.push('\n');
        output.push_str(description);
        output.push('\n');
    }
    if let Some(website) = &company.website {
        output.push_str(&format!("{website}\n"));
    }

    output.push_str(&points_section("Bullish arguments", &report.bullish));
    output.push_str(&points_section("Bearish arguments", &report.bearish));
    output
}

pub fn favorites(summaries: &[FavoriteSummary]) -> String {
    let mut table = new_table(&["Ticker", "Company", "Sentiment", ""]);
    for summary in summaries {
        let band = summary.sentiment();
        table.add_row(vec![
            Cell::new(&summary.ticker),
            Cell::new(&summary.title),
            Cell::new(
                summary
                    .sentiment_score
                    .map_or_else(|| "N/A".to_string(), |s| format!("{s:.0}")),
            ),
            Cell::new(band).fg(band_color(band)),
        ]);
    }
    table.to_string()
}

fn points_section(heading: &str, points: &[ArgumentPoint]) -> String {
    let mut output = format!("\n{heading} ({})\n", points.len());
    if points.is_empty() {
        return output;
    }

    let mut table = new_table(&["Score", "Argument", "Source", "Criticisms"]);
    for point in points {
        let score = point
            .sentiment_score
            .map_or_else(|| "-".to_string(), |s| format!("{s:.0}"));
        let source = point
            .post_source
            .as_deref()
            .or(point.post_title.as_deref())
            .unwrap_or("-");
        table.add_row(vec![
            Cell::new(score).fg(band_color(SentimentBand::from_score(point.sentiment_score))),
            Cell::new(&point.content),
            Cell::new(source),
            Cell::new(point.criticisms.len()),
        ]);
    }
    output.push_str(&table.to_string());
    output.push('\n');
    output
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(TABLE_WIDTH)
        .set_header(header.to_vec());
    table
}

fn band_color(band: SentimentBand) -> Color {
    match band {
        SentimentBand::Bullish => Color::Green,
        SentimentBand::Neutral => Color::Yellow,
        SentimentBand::Bearish => Color::Red,
        SentimentBand::Unknown => Color::Grey,
    }
}

fn rating(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn market_cap(value: f64) -> String {
    const UNITS: [(f64, &str); 3] = [(1e12, "T"), (1e9, "B"), (1e6, "M")];
    UNITS
        .iter()
        .find(|(size, _)| value.abs() >= *size)
        .map_or_else(
            || format!("${value:.0}"),
            |(size, unit)| format!("${:.2}{unit}", value / size),
        )
}
