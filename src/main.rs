use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser as ClapParser;
use clap::Subcommand;
use indexmap::IndexMap;
use serde::Serialize;
use sqlin::dialect::Dialect;
use sqlin::lineage::{LineageParser, LineageReport};
use std::time::Instant;

#[derive(clap::Parser)]
#[command(name = "sqlin")]
#[command(about = "SQL table and column-join lineage extractor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract lineage from one or more SQL files.
    Analyze(AnalyzeCommand),
}

#[derive(clap::Args)]
struct AnalyzeCommand {
    /// Path to the SQL file or directory containing SQL files.
    #[arg(value_name = "SQL_[FILE|DIR]")]
    sql: PathBuf,
    /// SQL dialect the files are written in.
    #[arg(short, long, value_enum, default_value_t = Dialect::Ansi)]
    dialect: Dialect,
    /// Pretty-print the output lineage.
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
#[serde(untagged)]
enum OutReport {
    Ok(LineageReport),
    ErrReport { error: String },
}

fn output_report(analyze_command: &AnalyzeCommand, sql_file_path: &PathBuf) -> anyhow::Result<OutReport> {
    let sql = std::fs::read_to_string(sql_file_path).map_err(|_| {
        anyhow!(
            "Failed to read sql file {}",
            sql_file_path.display().to_string()
        )
    })?;
    let out_report = match LineageParser::with_dialect(&sql, analyze_command.dialect) {
        Ok(lineage) => OutReport::Ok(lineage.report()),
        Err(err) => OutReport::ErrReport {
            error: format!(
                "Could not extract lineage from SQL in file {} due to error: {}",
                sql_file_path.display(),
                err
            ),
        },
    };
    Ok(out_report)
}

fn main() -> anyhow::Result<()> {
    let now = Instant::now();

    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Analyze(analyze_command) => {
            let sql_file_or_dir = &analyze_command.sql;
            let out_str = if sql_file_or_dir.is_dir() {
                let mut file_reports: IndexMap<String, OutReport> = IndexMap::new();
                let sql_in_dir: Vec<_> = std::fs::read_dir(sql_file_or_dir)?
                    .filter_map(|res| res.ok())
                    .map(|entry| entry.path())
                    .filter_map(|file| {
                        if file.extension().is_some_and(|ext| ext == "sql") {
                            Some(file)
                        } else {
                            None
                        }
                    })
                    .collect();

                for sql_file in sql_in_dir {
                    let output_report = output_report(analyze_command, &sql_file)?;
                    file_reports.insert(
                        std::path::absolute(sql_file)?.display().to_string(),
                        output_report,
                    );
                }

                if analyze_command.pretty {
                    serde_json::to_string_pretty(&file_reports)?
                } else {
                    serde_json::to_string(&file_reports)?
                }
            } else {
                let output_report = output_report(analyze_command, sql_file_or_dir)?;
                if analyze_command.pretty {
                    serde_json::to_string_pretty(&output_report)?
                } else {
                    serde_json::to_string(&output_report)?
                }
            };
            println!("{}", out_str);
        }
    }

    let elapsed = now.elapsed();
    log::info!("Elapsed: {:.2?}", elapsed);

    Ok(())
}
