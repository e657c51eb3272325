use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use keepsake::config::Config;

use crate::error::CliResult;
use crate::output::OutputFormat;

#[derive(Parser)]
pub struct ConfigCommand {}

impl ConfigCommand {
    pub fn execute(&self, config: &Config, format: OutputFormat) -> CliResult<()> {
        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "retention": {
                        "monthly_days": config.retention.monthly_days,
                        "weekly_days": config.retention.weekly_days,
                        "daily_days": config.retention.daily_days,
                        "intra_daily_days": config.retention.intra_daily_days,
                        "prefer": config.retention.prefer,
                    },
                    "cleanup": {
                        "pattern": config.cleanup.pattern,
                        "min_size_bytes": config.cleanup.min_size_bytes,
                        "destination": config.cleanup.destination
                            .as_ref()
                            .map(|d| d.display().to_string()),
                        "date_source": config.cleanup.date_source,
                    }
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                println!("Effective Configuration");
                println!("=======================\n");

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["Setting", "Value"]);

                table.add_row([
                    "retention.monthly_days".to_string(),
                    config.retention.monthly_days.to_string(),
                ]);
                table.add_row([
                    "retention.weekly_days".to_string(),
                    config.retention.weekly_days.to_string(),
                ]);
                table.add_row([
                    "retention.daily_days".to_string(),
                    config.retention.daily_days.to_string(),
                ]);
                table.add_row([
                    "retention.intra_daily_days".to_string(),
                    config.retention.intra_daily_days.to_string(),
                ]);
                table.add_row(["retention.prefer".to_string(), config.retention.prefer.clone()]);
                table.add_row(["cleanup.pattern".to_string(), config.cleanup.pattern.clone()]);
                table.add_row([
                    "cleanup.min_size_bytes".to_string(),
                    config.cleanup.min_size_bytes.to_string(),
                ]);
                table.add_row([
                    "cleanup.destination".to_string(),
                    config
                        .cleanup
                        .destination
                        .as_ref()
                        .map(|d| d.display().to_string())
                        .unwrap_or_else(|| "(delete)".to_string()),
                ]);
                table.add_row([
                    "cleanup.date_source".to_string(),
                    config.cleanup.date_source.clone(),
                ]);

                println!("{table}");
            }
        }

        Ok(())
    }
}
