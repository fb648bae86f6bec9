use crate::cli::HistoryCommand;
use crate::config::Config;
use crate::domain::{ChatItem, ChatPayload};
use crate::error::Result;
use crate::storage::CacheStore;
use colored::Colorize;
use prettytable::{format, Table};

const PREVIEW_WIDTH: usize = 60;

/// Handle transcript commands
pub fn handle_history(config: &Config, command: HistoryCommand) -> Result<()> {
    let store = CacheStore::new(&config.cache)?;

    match command {
        HistoryCommand::Show { limit } => {
            let record = store.load_transcript()?;

            if record.items.is_empty() {
                println!("{}", "No saved transcript found.".yellow());
                return Ok(());
            }

            let skip = limit
                .map(|n| record.items.len().saturating_sub(n))
                .unwrap_or(0);

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

            table.add_row(prettytable::row![
                "Time".bold(),
                "Role".bold(),
                "Kind".bold(),
                "Content".bold()
            ]);

            for item in record.items.iter().skip(skip) {
                table.add_row(prettytable::row![
                    item.ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                    item.role.to_string().cyan(),
                    item.payload.kind(),
                    preview(item)
                ]);
            }

            println!(
                "\nTranscript ({} items, saved {}):",
                record.items.len(),
                record.saved_at.format("%Y-%m-%d %H:%M")
            );
            table.printstd();
            println!();
        }
        HistoryCommand::Clear => {
            store.clear_transcript()?;
            println!("{}", "Transcript cleared".green());
        }
    }

    Ok(())
}

/// One-line summary of an item for the table
pub(crate) fn preview(item: &ChatItem) -> String {
    let text = match &item.payload {
        ChatPayload::Text { text } => text.replace('\n', " "),
        ChatPayload::Prices { coins, .. } => coins
            .iter()
            .map(|c| c.display_symbol())
            .collect::<Vec<_>>()
            .join(", "),
        ChatPayload::FearGreed(index) => format!(
            "{} {}",
            index.now.value, index.now.value_classification
        ),
        ChatPayload::News { items } => format!("news: {}", items.len()),
        ChatPayload::Coin(coin) => coin.display_name().to_string(),
        ChatPayload::MoonPhase(moon_phase) => {
            format!("{} {}", moon_phase.phase_emoji, moon_phase.phase)
        }
        ChatPayload::CombinedReport(report) => format!("report: {}", report.moon_phase.phase),
    };

    if text.chars().count() > PREVIEW_WIDTH {
        let cut: String = text.chars().take(PREVIEW_WIDTH - 3).collect();
        format!("{}...", cut)
    } else {
        text
    }
}
