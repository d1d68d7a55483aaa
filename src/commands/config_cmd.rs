use clap::{Args, Subcommand, ValueEnum};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigValue};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

const DEFAULT_CONFIG: &str = r#"# caljournal configuration
# Relative paths are resolved against this file's directory.

# Path to SQLite database (default: <data dir>/caljournal/caljournal.db)
# database_path: caljournal.db

# Table holding event rows
table_name: events

# Per-event documents: <events_dir>/<event_id>.md
# events_dir: vault/events

# Daily journals: <journals_dir>/<YYYY>/<YYYY-MM>/<YYYY-MM-DD>.md
# journals_dir: vault/journal

# Custom templates (built-in templates are used when unset)
# event_template: templates/event.md.j2
# activities_template: templates/activities.md.j2

# JSON export read by `caljournal sync` and `caljournal import`
# events_file: events.json

# Also append logs to this file
# log_file: caljournal.log
"#;

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        print_path("database_path", &config.database_path);
                        println!("table_name: {}", config.table_name.value);
                        println!("  source: {}", config.table_name.source);
                        println!();
                        print_path("events_dir", &config.events_dir);
                        print_path("journals_dir", &config.journals_dir);
                        print_optional("event_template", &config.event_template, "built-in");
                        print_optional(
                            "activities_template",
                            &config.activities_template,
                            "built-in",
                        );
                        print_optional("events_file", &config.events_file, "not set");
                        print_optional("log_file", &config.log_file, "stderr only");
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = Config::default_config_path();

                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'caljournal config show' to view current configuration.");
                    return Ok(());
                }

                write_default_config(&config_path)?;

                println!("Created config file: {}", config_path.display());
                println!("\nEdit this file to customize your settings.");
                Ok(())
            }
        }
    }
}

fn print_path(name: &str, value: &ConfigValue<PathBuf>) {
    println!("{}: {}", name, value.value.display());
    println!("  source: {}", value.source);
    println!();
}

fn print_optional(name: &str, value: &ConfigValue<Option<PathBuf>>, unset: &str) {
    match &value.value {
        Some(path) => println!("{}: {}", name, path.display()),
        None => println!("{}: ({})", name, unset),
    }
    println!("  source: {}", value.source);
    println!();
}

fn write_default_config(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)?;
    file.write_all(DEFAULT_CONFIG.as_bytes())
}
