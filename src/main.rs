//! Headless replay binary for native builds.
//!
//! Loads a recorded session script, replays it through an editing session
//! and writes the resulting export.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::{Path, PathBuf};
    use std::process::ExitCode;

    use canvas_annotator::config::{ConfigError, EditorConfig, LogLevel};
    use canvas_annotator::format::{ExportFormat, FormatError, FormatRegistry};
    use canvas_annotator::script::{ReplayScript, ScriptError};
    use canvas_annotator::session::EditorSession;
    use clap::{Parser, Subcommand, ValueEnum};
    use thiserror::Error;

    #[derive(Parser)]
    #[command(name = "canvas-annotator")]
    #[command(version, about)]
    #[command(propagate_version = true)]
    struct Cli {
        #[command(subcommand)]
        command: Commands,
    }

    #[derive(Subcommand)]
    enum Commands {
        /// Replay a session script and write the export.
        Replay(ReplayArgs),

        /// List the export formats and the annotation types they keep.
        Formats,
    }

    #[derive(clap::Args)]
    struct ReplayArgs {
        /// Session script (JSON).
        script: PathBuf,

        /// Export format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Output file, or directory for voc-xml. Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Editor configuration file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Log level (error, warn, info, debug, trace). Overrides the config file.
        #[arg(long)]
        log_level: Option<String>,
    }

    #[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
    enum OutputFormat {
        Json,
        Coco,
        Voc,
        VocXml,
    }

    #[derive(Error, Debug)]
    enum CliError {
        #[error(transparent)]
        Config(#[from] ConfigError),

        #[error(transparent)]
        Script(#[from] ScriptError),

        #[error(transparent)]
        Format(#[from] FormatError),

        #[error("I/O error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Unknown log level '{0}'")]
        LogLevel(String),
    }

    pub fn run() -> ExitCode {
        let cli = Cli::parse();
        let result = match cli.command {
            Commands::Replay(args) => replay(args),
            Commands::Formats => {
                list_formats();
                Ok(())
            }
        };

        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log::error!("{}", e);
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        }
    }

    fn list_formats() {
        let registry = FormatRegistry::new();
        println!("{:<6} {:<16} {:<10} {:<8} POINTS", "ID", "NAME", "EXTENSIONS", "POLYGONS");
        for format in registry.all() {
            println!(
                "{:<6} {:<16} {:<10} {:<8} {}",
                format.id(),
                format.display_name(),
                format.extensions().join(","),
                if format.supports_polygon() { "yes" } else { "no" },
                if format.supports_point() { "yes" } else { "no" },
            );
        }
    }

    fn replay(args: ReplayArgs) -> Result<(), CliError> {
        let config = match &args.config {
            Some(path) => EditorConfig::load(path)?,
            None => EditorConfig::default(),
        };

        let level = match &args.log_level {
            Some(name) => {
                LogLevel::from_name(name).ok_or_else(|| CliError::LogLevel(name.clone()))?
            }
            None => config.log_level,
        };
        env_logger::Builder::new()
            .filter_level(level.to_level_filter())
            .init();

        let script = ReplayScript::load(&args.script)?;
        log::info!(
            "Replaying {:?}: {} steps over {} images",
            args.script,
            script.steps.len(),
            script.images.len()
        );
        let session = script.run(config)?;

        match args.format {
            OutputFormat::Json => write_export(&session, ExportFormat::Json, args.output.as_deref()),
            OutputFormat::Coco => write_export(&session, ExportFormat::Coco, args.output.as_deref()),
            OutputFormat::Voc => write_export(&session, ExportFormat::Voc, args.output.as_deref()),
            OutputFormat::VocXml => write_voc_xml(&session, args.output.as_deref()),
        }
    }

    fn write_export(
        session: &EditorSession,
        format: ExportFormat,
        output: Option<&Path>,
    ) -> Result<(), CliError> {
        let content = session.export(format)?;
        match output {
            Some(path) => {
                std::fs::write(path, content)?;
                log::info!("Wrote {} export to {:?}", format, path);
            }
            None => println!("{}", content),
        }
        Ok(())
    }

    fn write_voc_xml(session: &EditorSession, output: Option<&Path>) -> Result<(), CliError> {
        let documents = session.export_voc_xml()?;
        match output {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                for doc in &documents {
                    std::fs::write(dir.join(&doc.file_name), &doc.xml)?;
                }
                log::info!("Wrote {} VOC XML documents to {:?}", documents.len(), dir);
            }
            None => {
                for doc in &documents {
                    println!("<!-- {} -->", doc.file_name);
                    println!("{}", doc.xml);
                }
            }
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    cli::run()
}

// The library is embedded directly on WASM; there is no binary entry point.
#[cfg(target_arch = "wasm32")]
fn main() {}
