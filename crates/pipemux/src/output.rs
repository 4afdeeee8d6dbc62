use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use pipemux_engine::RunSummary;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct SummaryOutput<'a> {
    #[serde(flatten)]
    summary: &'a RunSummary,
    log_path: String,
}

/// Print the run summary after the multiplexed stream has finished.
pub fn print_summary(summary: &RunSummary, log_path: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SummaryOutput {
                summary,
                log_path: log_path.to_string(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHANNELS", "MESSAGES", "BYTES", "READ ERRORS", "LOG"])
                .add_row(vec![
                    summary.channels.to_string(),
                    summary.messages_forwarded.to_string(),
                    summary.bytes_forwarded.to_string(),
                    summary.read_errors.to_string(),
                    log_path.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "channels={} messages={} bytes={} read_errors={} log={}",
                summary.channels,
                summary.messages_forwarded,
                summary.bytes_forwarded,
                summary.read_errors,
                log_path
            );
        }
    }
}
