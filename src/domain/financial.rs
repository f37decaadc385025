//! Usage: Extract a structured stock snapshot from a finance agent's markdown reply.
//!
//! The agent answers in free-form markdown; these regexes mirror the shapes
//! it actually produces (bold dollar prices, `Market Cap ... $X B` lines,
//! `Company:`/`Sector:` labels, bulleted analyst recommendations).

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalystRecommendation {
    pub firm: String,
    pub rating: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialSnapshot {
    pub symbol: Option<String>,
    pub price: Option<f64>,
    pub market_cap: Option<String>,
    pub pe_ratio: Option<f64>,
    pub eps: Option<f64>,
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub recommendations: Vec<AnalystRecommendation>,
}

impl FinancialSnapshot {
    /// A snapshot is only worth rendering as a card when at least one of the
    /// headline fields came out of the text.
    pub(crate) fn is_meaningful(&self) -> bool {
        self.price.is_some() || self.market_cap.is_some() || self.symbol.is_some()
    }
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("hardcoded pattern compiles"))
}

macro_rules! static_regex {
    ($pattern:expr) => {{
        static CELL: OnceLock<Regex> = OnceLock::new();
        regex(&CELL, $pattern)
    }};
}

/// Cheap gate before running the extractors: does this look like a reply
/// about a stock at all?
pub(crate) fn has_financial_markers(text: &str) -> bool {
    let dollar_context = text.contains('$')
        && (text.contains("stock price")
            || text.contains("Stock Price")
            || text.contains("Current Price")
            || text.contains("price of")
            || static_regex!(r"\b[A-Z]{2,5}\b").is_match(text)
            || static_regex!(r"\*\*\$[0-9,]+\.?[0-9]*\*\*").is_match(text));

    dollar_context
        || text.contains("Market Cap")
        || text.contains("P/E Ratio")
        || text.contains("analyst")
        || text.contains("recommendations")
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

fn extract_symbol(text: &str) -> Option<String> {
    // `(AAPL)` is the most reliable shape, then a ticker near "stock"/"price".
    if let Some(caps) = static_regex!(r"\(([A-Z]{2,5})\)").captures(text) {
        return Some(caps[1].to_string());
    }
    let near_keyword = static_regex!(
        r"(?:[Ss]tock|[Pp]rice)[^\n]*?\b([A-Z]{2,5})\b|\b([A-Z]{2,5})\b[^\n]*?(?:[Ss]tock|[Pp]rice)"
    );
    let caps = near_keyword.captures(text)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().to_string())
}

fn extract_price(text: &str) -> Option<f64> {
    // Prefer a bold price, the way the agent highlights the quote.
    if let Some(caps) = static_regex!(r"\*\*\$([0-9,]+\.?[0-9]*)\*\*").captures(text) {
        return parse_number(&caps[1]);
    }
    let caps = static_regex!(r"\$([0-9,]+\.?[0-9]*)").captures(text)?;
    parse_number(&caps[1])
}

fn extract_market_cap(text: &str) -> Option<String> {
    let caps = static_regex!(r"(?i)Market Cap[^\n]*\$([0-9.,]+\s*[BMT]?)").captures(text)?;
    Some(caps[1].trim().to_string())
}

fn extract_pe_ratio(text: &str) -> Option<f64> {
    let caps = static_regex!(r"(?i)P/E Ratio[^\n]*?([0-9.]+)").captures(text)?;
    parse_number(&caps[1])
}

fn extract_eps(text: &str) -> Option<f64> {
    let caps = static_regex!(r"(?i)\bEPS\b[^\n]*?\$?([0-9.]+)").captures(text)?;
    parse_number(&caps[1])
}

fn extract_company_name(text: &str) -> Option<String> {
    if let Some(caps) = static_regex!(r"(?i)Company:\s*([^\n]+)").captures(text) {
        return Some(caps[1].trim().to_string());
    }
    if let Some(caps) =
        static_regex!(r"(?i)(?:stock price of|price of)\s+([^(\n]+?)(?:\s*\([A-Z]+\))?(?:\s+is\b|\n|$)")
            .captures(text)
    {
        return Some(caps[1].trim().to_string());
    }
    let caps = static_regex!(r"([A-Z][A-Za-z.& ]+?)\s*\([A-Z]{2,5}\)").captures(text)?;
    Some(caps[1].trim().to_string())
}

fn extract_labeled_line(text: &str, pattern: &'static Regex) -> Option<String> {
    let caps = pattern.captures(text)?;
    Some(caps[1].trim().to_string())
}

fn extract_recommendations(text: &str) -> Vec<AnalystRecommendation> {
    // Slice from the "analyst recommendations" heading to the next blank line.
    let lower = text.to_lowercase();
    let Some(start) = lower.find("analyst recommendation") else {
        return Vec::new();
    };
    let section = &text[start..];
    let section = section.split("\n\n").next().unwrap_or(section);

    static_regex!(r"(?m)^\s*[-•*]\s*([^:\n]+):\s*([^\n]+)$")
        .captures_iter(section)
        .map(|caps| AnalystRecommendation {
            firm: caps[1].trim().to_string(),
            rating: caps[2].trim().to_string(),
        })
        .filter(|rec| !rec.firm.is_empty() && !rec.rating.is_empty())
        .collect()
}

pub(crate) fn extract(text: &str) -> FinancialSnapshot {
    static SECTOR: OnceLock<Regex> = OnceLock::new();
    static INDUSTRY: OnceLock<Regex> = OnceLock::new();

    FinancialSnapshot {
        symbol: extract_symbol(text),
        price: extract_price(text),
        market_cap: extract_market_cap(text),
        pe_ratio: extract_pe_ratio(text),
        eps: extract_eps(text),
        company_name: extract_company_name(text),
        sector: extract_labeled_line(text, regex(&SECTOR, r"(?i)Sector:\s*([^\n]+)")),
        industry: extract_labeled_line(text, regex(&INDUSTRY, r"(?i)Industry:\s*([^\n]+)")),
        recommendations: extract_recommendations(text),
    }
}
