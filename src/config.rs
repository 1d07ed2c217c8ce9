use std::fs::File;
use std::path::{Path, PathBuf};

use log::LevelFilter;

use serde::{Deserialize, Serialize};

use crate::lifecycle::Limits;
use crate::models::{Board, Registry, Store};
use crate::{Error, Result};

fn default_limit() -> u32 {
    20
}

fn default_recent_threads() -> u32 {
    3
}

fn default_log_level() -> LevelFilter {
    LevelFilter::Info
}

/// Configuration for an anonboard instance.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Address to bind to
    pub address: String,
    /// Port to bind to
    pub port: u16,
    /// Where the static files are.
    pub static_dir: PathBuf,
    /// Where the templates to be rendered are.
    pub template_dir: PathBuf,
    /// URL to connect to the database, or `memory` to keep everything in
    /// process memory.
    pub database_url: String,
    /// File to log to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// The most verbose level of log messages to show.
    #[serde(default = "default_log_level")]
    pub log_level: LevelFilter,
    /// How many threads a board holds before the oldest is deleted.
    #[serde(default = "default_limit")]
    pub thread_limit: u32,
    /// How many replies a thread holds before it's deleted.
    #[serde(default = "default_limit")]
    pub reply_limit: u32,
    /// How many threads to show on the home page.
    #[serde(default = "default_recent_threads")]
    pub recent_threads: u32,
    /// The boards to serve.
    #[serde(default = "Registry::default_boards")]
    pub boards: Vec<Board>,
}

impl Config {
    /// Open a config file at the given path.
    pub fn open<P>(path: P) -> Result<Config>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let msg = format!("Couldn't open config file at {}", path.display());

        let reader =
            File::open(path).map_err(|err| Error::from_io_error(err, msg))?;

        Ok(serde_yaml::from_reader(reader)?)
    }

    /// Generate a new config file from default values.
    pub fn generate<W>(mut out: W) -> Result<()>
    where
        W: std::io::Write,
    {
        writeln!(&mut out, "# Configuration for anonboard")?;
        serde_yaml::to_writer(&mut out, &Config::default())?;
        writeln!(&mut out)?;
        Ok(())
    }

    /// Get the default location of the config file.
    pub fn default_path() -> PathBuf {
        if cfg!(debug_assertions) {
            PathBuf::from("contrib/dev-config.yaml")
        } else {
            PathBuf::from("/etc/anonboard/config.yaml")
        }
    }

    /// A configuration for running against the in-memory store from the
    /// source tree.
    pub fn memory() -> Config {
        Config {
            database_url: Store::MEMORY_URL.into(),
            static_dir: PathBuf::from("res/static/"),
            template_dir: PathBuf::from("res/templates/"),
            ..Config::default()
        }
    }

    /// Build the board registry.
    pub fn registry(&self) -> Result<Registry> {
        Registry::new(self.boards.clone())
    }

    /// The capacity of boards and threads.
    pub fn limits(&self) -> Result<Limits> {
        Limits::new(self.thread_limit, self.reply_limit)
    }

    /// Dump configuration info to the log.
    pub fn debug_log(&self) {
        use log::debug;

        debug!("  address {}", self.address);
        debug!("  port {}", self.port);
        debug!("  database url {}", self.database_url);
        debug!("  static dir {}", self.static_dir.display());
        debug!("  template dir {}", self.template_dir.display());
        debug!("  log level {}", self.log_level);
        debug!("  thread limit {}", self.thread_limit);
        debug!("  reply limit {}", self.reply_limit);
        debug!("  recent threads {}", self.recent_threads);
        debug!("  boards:");
        for board in &self.boards {
            debug!("    board: #{} {} ({})", board.id, board.name, board.description);
        }
        if let Some(ref log_file) = self.log_file {
            debug!("  log file {}", log_file.display());
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        if cfg!(debug_assertions) {
            Config {
                static_dir: PathBuf::from("res/static/"),
                template_dir: PathBuf::from("res/templates/"),
                address: "0.0.0.0".into(),
                port: 3000,
                database_url: "postgres://anonboard:@localhost/anonboard".into(),
                log_file: None,
                log_level: LevelFilter::Debug,
                thread_limit: default_limit(),
                reply_limit: default_limit(),
                recent_threads: default_recent_threads(),
                boards: Registry::default_boards(),
            }
        } else {
            Config {
                static_dir: PathBuf::from("/usr/share/anonboard/static/"),
                template_dir: PathBuf::from("/usr/share/anonboard/templates/"),
                address: "0.0.0.0".into(),
                port: 3000,
                database_url: "postgres://anonboard:@localhost/anonboard".into(),
                log_file: Some(PathBuf::from("/var/log/anonboard/anonboard.log")),
                log_level: default_log_level(),
                thread_limit: default_limit(),
                reply_limit: default_limit(),
                recent_threads: default_recent_threads(),
                boards: Registry::default_boards(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_config_parses() {
        let mut out = Vec::new();
        Config::generate(&mut out).unwrap();

        let config: Config = serde_yaml::from_slice(&out).unwrap();

        assert_eq!(config.port, Config::default().port);
        assert_eq!(config.boards, Registry::default_boards());
    }

    #[test]
    fn missing_keys_use_defaults() {
        let yaml = "address: 127.0.0.1\n\
                    port: 8080\n\
                    static_dir: static\n\
                    template_dir: templates\n\
                    database_url: memory\n";

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.limits().unwrap(), Limits::default());
        assert_eq!(config.recent_threads, 3);
        assert_eq!(config.log_level, LevelFilter::Info);
        assert_eq!(config.registry().unwrap().resolve_board_id("tech"), 3);
    }

    #[test]
    fn custom_boards() {
        let yaml = "address: 127.0.0.1\n\
                    port: 8080\n\
                    static_dir: static\n\
                    template_dir: templates\n\
                    database_url: memory\n\
                    boards:\n  \
                      - id: 7\n    \
                        name: music\n";

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let registry = config.registry().unwrap();

        assert_eq!(registry.resolve_board_id("music"), 7);
        assert_eq!(registry.resolve_board_id("tech"), Registry::UNKNOWN);
    }

    #[test]
    fn zero_limits_are_rejected() {
        let mut config = Config::memory();
        config.thread_limit = 0;

        match config.limits() {
            Err(Error::ZeroLimit { name }) => assert_eq!(name, "thread_limit"),
            other => panic!("unexpected limits {:?}", other),
        }

        config.thread_limit = 20;
        config.reply_limit = 0;
        assert!(config.limits().is_err());

        config.reply_limit = 1;
        assert_eq!(config.limits().unwrap().max_replies, 1);
    }

    #[test]
    fn open_missing_file() {
        let err = Config::open("does/not/exist.yaml").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.yaml"));
    }
}
