//! Command-line configuration for the `wikichat` binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use engine_logging::{LogDestination, LogSettings};
use log::LevelFilter;
use wikichat_core::DEFAULT_TOP_K;
use wikichat_engine::BackendSettings;

#[derive(Debug, Clone, Parser)]
#[command(name = "wikichat", version, about = "Terminal chat client for a PDF wiki RAG server")]
pub struct Cli {
    /// Base URL of the RAG server.
    #[arg(long, default_value = "http://localhost:5000")]
    pub server: String,

    /// Initial number of passages retrieved per question.
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: u32,

    /// Directory where exported index archives are saved.
    #[arg(long, default_value = ".")]
    pub download_dir: PathBuf,

    #[arg(long, default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Whole-request timeout. Unset means requests run until the server answers.
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,

    /// file, terminal or both.
    #[arg(long, default_value = "file")]
    pub log_destination: LogDestination,

    #[arg(long, default_value = "./wikichat.log")]
    pub log_file: PathBuf,
}

impl Cli {
    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            base_url: self.server.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            download_dir: self.download_dir.clone(),
        }
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            level: self.log_level,
            destination: self.log_destination,
            file_path: self.log_file.clone(),
        }
    }
}
