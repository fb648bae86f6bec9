//! Terminal rendering of chat items
//!
//! Each payload variant has its own card layout. The numeric and time
//! helpers are public so commands can reuse them for tables.

use crate::domain::{
    ChatItem, ChatPayload, ChatRole, CoinInfo, CoinPrice, CombinedReport, FearGreedIndex,
    FearGreedValue, MoonPhase, NewsItem, TrendOutlook,
};
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use std::fmt::Write;

/// Render an item as a multi-line block
pub fn render_item(item: &ChatItem) -> String {
    render_item_at(item, Utc::now())
}

/// Render an item using `now` for relative times
pub fn render_item_at(item: &ChatItem, now: DateTime<Utc>) -> String {
    let header = format!("{} {}", role_tag(item.role), item.ts.format("%H:%M:%S"));
    let body = match &item.payload {
        ChatPayload::Text { text } => render_text(item.role, text),
        ChatPayload::Prices { base, coins } => render_prices(base, coins),
        ChatPayload::FearGreed(index) => render_fear_greed(index),
        ChatPayload::News { items } => render_news(items, now),
        ChatPayload::Coin(coin) => render_coin(coin),
        ChatPayload::MoonPhase(moon_phase) => render_moon_phase(moon_phase),
        ChatPayload::CombinedReport(report) => render_combined_report(report),
    };
    format!("{}\n{}", header.dimmed(), body)
}

/// Print an item followed by a blank line
pub fn print_item(item: &ChatItem) {
    println!("{}\n", render_item(item));
}

fn role_tag(role: ChatRole) -> ColoredString {
    match role {
        ChatRole::User => "[you]".cyan().bold(),
        ChatRole::Assistant => "[bot]".green().bold(),
        ChatRole::System => "[system]".yellow().bold(),
        ChatRole::Tool => "[tool]".magenta().bold(),
    }
}

fn render_text(role: ChatRole, text: &str) -> String {
    match role {
        ChatRole::System => text.yellow().to_string(),
        _ => text.to_string(),
    }
}

fn render_prices(base: &str, coins: &[CoinPrice]) -> String {
    let mut out = format!("💰 {} ({})", "Prices".bold(), base);
    if coins.is_empty() {
        out.push_str("\n  no quotes");
        return out;
    }
    for coin in coins {
        let _ = write!(
            out,
            "\n  {:<8} {:<16} {:>16}",
            coin.display_symbol().bold(),
            coin.display_name(),
            format_price(coin.price)
        );
        if let Some(pct) = coin.change_1h_pct {
            let _ = write!(out, "  1h {}", colored_change(pct));
        }
        if let Some(abs) = coin.change_1h_abs {
            let _ = write!(out, " ({}{})", if abs >= 0.0 { "+" } else { "" }, format_price_signed(abs));
        }
    }
    out
}

fn render_fear_greed(index: &FearGreedIndex) -> String {
    let band = FearGreedBand::from_value(index.now.value);
    let mut out = format!(
        "😱 {}: {} {}",
        index.name.bold(),
        band.paint(&index.now.value.to_string()).bold(),
        band.paint(&index.now.value_classification)
    );
    let _ = write!(out, "\n  {}", gauge_bar(index.now.value));
    if let Some(yesterday) = &index.yesterday {
        let _ = write!(out, "\n  {}", history_line("Yesterday", &index.now, yesterday));
    }
    if let Some(last_week) = &index.last_week {
        let _ = write!(out, "\n  {}", history_line("Last week", &index.now, last_week));
    }
    if let Some(update_time) = &index.now.update_time {
        let _ = write!(out, "\n  updated {}", update_time.dimmed());
    }
    out
}

fn history_line(label: &str, now: &FearGreedValue, past: &FearGreedValue) -> String {
    let delta = now.value.saturating_sub(past.value);
    let delta_text = match delta {
        d if d > 0 => format!("+{}", d).green(),
        d if d < 0 => d.to_string().red(),
        _ => "±0".normal(),
    };
    format!(
        "{:<10} {:>3} {}  ({})",
        label,
        past.value,
        past.value_classification,
        delta_text
    )
}

fn gauge_bar(value: i32) -> String {
    let filled = (value.clamp(0, 100) / 5) as usize;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(20 - filled))
}

fn render_news(items: &[NewsItem], now: DateTime<Utc>) -> String {
    let mut out = format!("📰 {}", "News".bold());
    if items.is_empty() {
        out.push_str("\n  no headlines");
        return out;
    }
    for item in items {
        let _ = write!(out, "\n  • {}", item.title.bold());
        let mut meta = Vec::new();
        if let Some(source) = &item.source {
            meta.push(source.clone());
        }
        meta.push(format_time_ago(item.time, now));
        let _ = write!(out, "\n    {}", meta.join(" · ").dimmed());
        if let Some(url) = &item.url {
            let _ = write!(out, "\n    {}", url.blue().underline());
        }
    }
    out
}

fn render_coin(coin: &CoinInfo) -> String {
    let mut out = String::new();
    let rank = coin
        .rank
        .map(|r| format!("#{} ", r))
        .unwrap_or_default();
    let _ = write!(
        out,
        "🪙 {}{} ({})",
        rank,
        coin.display_name().bold(),
        coin.display_symbol()
    );

    if let Some(price) = coin.price {
        let _ = write!(out, "\n  Price:          ${}", format_price(price));
    }
    if let Some(price_btc) = coin.price_btc {
        let _ = write!(out, "\n  Price (BTC):    {:.8}", price_btc);
    }
    let changes: Vec<String> = [
        ("1h", coin.price_change_1h),
        ("24h", coin.headline_change()),
        ("7d", coin.price_change_1w),
    ]
    .iter()
    .filter_map(|(label, change)| change.map(|c| format!("{} {}", label, colored_change(c))))
    .collect();
    if !changes.is_empty() {
        let _ = write!(out, "\n  Change:         {}", changes.join("  "));
    }

    let figures = [
        ("Market cap", coin.market_cap),
        ("Volume", coin.volume),
        ("FDV", coin.fully_diluted_valuation),
    ];
    for (label, value) in figures {
        if let Some(value) = value {
            let _ = write!(out, "\n  {:<15} ${}", format!("{}:", label), format_large_number(value));
        }
    }
    let supplies = [
        ("Available", coin.available_supply),
        ("Total supply", coin.total_supply),
    ];
    for (label, value) in supplies {
        if let Some(value) = value {
            let _ = write!(out, "\n  {:<15} {}", format!("{}:", label), format_number(value));
        }
    }

    let scores: Vec<String> = [
        ("liquidity", coin.liquidity_score),
        ("volatility", coin.volatility_score),
        ("market cap", coin.market_cap_score),
        ("risk", coin.risk_score),
    ]
    .iter()
    .filter_map(|(label, score)| score.map(|s| format!("{} {:.1}", label, s)))
    .collect();
    if !scores.is_empty() {
        let _ = write!(out, "\n  Scores:         {}", scores.join(", "));
    }
    if let Some(avg) = coin.avg_change {
        let _ = write!(out, "\n  Avg change:     {}", colored_change(avg));
    }

    let links: Vec<&str> = [&coin.website_url, &coin.twitter_url, &coin.reddit_url]
        .into_iter()
        .filter_map(|link| link.as_deref())
        .collect();
    if !links.is_empty() {
        let _ = write!(out, "\n  Links:          {}", links.join("  "));
    }

    if let Some(contracts) = &coin.contract_addresses {
        for contract in contracts {
            let _ = write!(
                out,
                "\n  Contract:       {} {}",
                contract.blockchain,
                contract.contract_address.dimmed()
            );
        }
    } else if let Some(address) = &coin.contract_address {
        let _ = write!(out, "\n  Contract:       {}", address.dimmed());
    }
    if let Some(decimals) = coin.decimals {
        let _ = write!(out, "\n  Decimals:       {}", decimals);
    }
    if let Some(explorers) = &coin.explorers {
        if let Some(first) = explorers.first() {
            let _ = write!(out, "\n  Explorer:       {}", first);
        }
    }
    if let Some(description) = &coin.description {
        if !description.is_empty() {
            let _ = write!(out, "\n  {}", description);
        }
    }
    out
}

fn render_moon_phase(moon_phase: &MoonPhase) -> String {
    let mut out = format!(
        "{} {}  {}",
        moon_phase.phase_emoji,
        moon_phase.phase.bold(),
        moon_phase.direction_label().dimmed()
    );
    let _ = write!(
        out,
        "\n  Cycle:          {:.1}%  (age {:.1} days, lunation {})",
        moon_phase.lunar_age_percent, moon_phase.lunar_age, moon_phase.lunation_number
    );
    let _ = write!(
        out,
        "\n  Distance:       {} km",
        format_number(moon_phase.lunar_distance)
    );
    if let Some(next) = &moon_phase.next_full_moon {
        let _ = write!(out, "\n  Next full moon: {}", format_moon_date(next));
    }
    if let Some(last) = &moon_phase.last_full_moon {
        let _ = write!(out, "\n  Last full moon: {}", format_moon_date(last));
    }
    if let Some(prediction) = &moon_phase.crypto_prediction {
        let trend = match prediction.outlook() {
            TrendOutlook::Bullish => format!("📈 {}", prediction.trend).green(),
            TrendOutlook::Bearish => format!("📉 {}", prediction.trend).red(),
            TrendOutlook::Neutral => format!("➡️ {}", prediction.trend).normal(),
        };
        let _ = write!(
            out,
            "\n  Prediction:     {} (confidence {})",
            trend, prediction.confidence
        );
        let _ = write!(out, "\n  {}", prediction.reasoning);
        let _ = write!(out, "\n  {} {}", "→".bold(), prediction.recommendation);
    }
    out
}

fn render_combined_report(report: &CombinedReport) -> String {
    let mut out = render_moon_phase(&report.moon_phase);
    if !report.text.is_empty() {
        let _ = write!(out, "\n\n{}", report.text);
    }
    if report.moon_phase.crypto_prediction.is_none() {
        if let Some(prediction) = &report.prediction {
            let _ = write!(
                out,
                "\n  Prediction: {} (confidence {})",
                prediction.trend, prediction.confidence
            );
        }
    }
    out
}

fn colored_change(pct: f64) -> ColoredString {
    let text = format_signed_percent(pct);
    if pct > 0.0 {
        text.green()
    } else if pct < 0.0 {
        text.red()
    } else {
        text.normal()
    }
}

fn format_price_signed(value: f64) -> String {
    if value < 0.0 {
        format!("-{}", format_price(-value))
    } else {
        format_price(value)
    }
}

/// Price with precision scaled to magnitude
///
/// # Examples
///
/// ```
/// use cryptomoon::render::format_price;
///
/// assert_eq!(format_price(65432.1), "65,432.10");
/// assert_eq!(format_price(0.1234567), "0.1235");
/// ```
pub fn format_price(price: f64) -> String {
    if price >= 1000.0 {
        group_thousands(&format!("{:.2}", price))
    } else if price >= 1.0 {
        format!("{:.2}", price)
    } else if price >= 0.01 {
        format!("{:.4}", price)
    } else {
        format!("{:.6}", price)
    }
}

/// Large amounts with T/B/M/K suffixes
pub fn format_large_number(value: f64) -> String {
    if value >= 1e12 {
        format!("{:.2}T", value / 1e12)
    } else if value >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.2}K", value / 1e3)
    } else {
        format!("{:.2}", value)
    }
}

/// Amounts with B/M suffixes, grouping below a million
pub fn format_number(value: f64) -> String {
    if value >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if value >= 1e3 {
        group_thousands(&format!("{:.2}", value))
    } else {
        format!("{:.2}", value)
    }
}

/// Percentage change with an explicit sign
pub fn format_signed_percent(pct: f64) -> String {
    if pct >= 0.0 {
        format!("+{:.2}%", pct)
    } else {
        format!("{:.2}%", pct)
    }
}

fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Sentiment band of a fear-and-greed value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FearGreedBand {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl FearGreedBand {
    pub fn from_value(value: i32) -> Self {
        match value {
            v if v < 25 => Self::ExtremeFear,
            v if v < 45 => Self::Fear,
            v if v < 55 => Self::Neutral,
            v if v < 75 => Self::Greed,
            _ => Self::ExtremeGreed,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ExtremeFear => "Extreme Fear",
            Self::Fear => "Fear",
            Self::Neutral => "Neutral",
            Self::Greed => "Greed",
            Self::ExtremeGreed => "Extreme Greed",
        }
    }

    fn paint(&self, text: &str) -> ColoredString {
        match self {
            Self::ExtremeFear => text.bright_red(),
            Self::Fear => text.red(),
            Self::Neutral => text.yellow(),
            Self::Greed => text.green(),
            Self::ExtremeGreed => text.bright_green(),
        }
    }
}

/// `YYYY-MM-DDThh:mm...` as `DD.MM.YYYY`; other inputs are returned as is
pub fn format_moon_date(date: &str) -> String {
    let day_part = date.split('T').next().unwrap_or(date);
    let parts: Vec<&str> = day_part.split('-').collect();
    if parts.len() == 3 {
        format!("{}.{}.{}", parts[2], parts[1], parts[0])
    } else {
        date.to_string()
    }
}

/// Relative age of an epoch-millisecond timestamp
pub fn format_time_ago(time_ms: i64, now: DateTime<Utc>) -> String {
    let diff_ms = now.timestamp_millis().saturating_sub(time_ms);
    let minutes = diff_ms / 60_000;
    let hours = diff_ms / 3_600_000;
    let days = diff_ms / 86_400_000;

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{} min ago", minutes)
    } else if hours < 24 {
        format!("{} h ago", hours)
    } else if days < 7 {
        format!("{} d ago", days)
    } else {
        DateTime::<Utc>::from_timestamp_millis(time_ms)
            .map(|t| t.format("%d.%m.%Y").to_string())
            .unwrap_or_default()
    }
}
