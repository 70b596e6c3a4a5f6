//! Configuration loading and parsing.
//!
//! Parses `vellum.toml` (or an override path provided by the host) covering
//! `[history] capacity`, `[links] allowed_schemes`, and `[paste] max_chars`.
//! Loading is tolerant: a missing or unparseable file yields defaults so the
//! editor always starts. Raw parsed values are retained pre-clamp so a later
//! reload can re-apply limits; `Config::apply_limits` computes the effective
//! values and logs whenever a clamp rewrites what the file asked for.
//!
//! Unknown fields are ignored (TOML deserialization tolerance) to allow
//! forward evolution without immediate warnings.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "HistoryConfig::default_capacity")]
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: Self::default_capacity(),
        }
    }
}

impl HistoryConfig {
    const fn default_capacity() -> usize {
        50
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LinksConfig {
    #[serde(default = "LinksConfig::default_allowed_schemes")]
    pub allowed_schemes: Vec<String>,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            allowed_schemes: Self::default_allowed_schemes(),
        }
    }
}

impl LinksConfig {
    fn default_allowed_schemes() -> Vec<String> {
        vec!["https".to_string(), "http".to_string(), "mailto".to_string()]
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PasteConfig {
    #[serde(default = "PasteConfig::default_max_chars")]
    pub max_chars: usize,
}

impl Default for PasteConfig {
    fn default() -> Self {
        Self {
            max_chars: Self::default_max_chars(),
        }
    }
}

impl PasteConfig {
    const fn default_max_chars() -> usize {
        100_000
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub paste: PasteConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>,                 // original file string (optional)
    pub file: ConfigFile,                    // parsed (or default) data
    pub effective_history_capacity: usize,   // clamped undo depth
    pub effective_paste_max: usize,          // clamped paste char cap
    pub effective_allowed_schemes: Vec<String>, // normalized lowercase
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    // Prefer a local working directory `vellum.toml` before falling back to
    // the platform config dir.
    let local = PathBuf::from("vellum.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("vellum").join("vellum.toml");
    }
    // Final fallback relative filename.
    PathBuf::from("vellum.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => Ok(Config {
                raw: Some(content),
                file,
                ..Config::default() // effective values computed by apply_limits
            }),
            Err(_e) => {
                // On parse error fall back to defaults so the editor still starts.
                Ok(Config::default())
            }
        }
    } else {
        Ok(Config::default())
    }
}

impl Config {
    pub const CAPACITY_MIN: usize = 1;
    pub const CAPACITY_MAX: usize = 1000;
    pub const PASTE_MIN: usize = 1;

    /// Clamp raw file values into their supported ranges and normalize the
    /// scheme allowlist. Returns `(history_capacity, paste_max)`.
    pub fn apply_limits(&mut self) -> (usize, usize) {
        let raw = self.file.history.capacity;
        let clamped = raw.clamp(Self::CAPACITY_MIN, Self::CAPACITY_MAX);
        if clamped != raw {
            info!(
                target: "config",
                raw,
                clamped,
                min = Self::CAPACITY_MIN,
                max = Self::CAPACITY_MAX,
                "history_capacity_clamped"
            );
        }
        self.effective_history_capacity = clamped;

        let raw = self.file.paste.max_chars;
        let clamped = raw.max(Self::PASTE_MIN);
        if clamped != raw {
            info!(
                target: "config",
                raw,
                clamped,
                min = Self::PASTE_MIN,
                "paste_max_chars_clamped"
            );
        }
        self.effective_paste_max = clamped;

        let mut schemes: Vec<String> = self
            .file
            .links
            .allowed_schemes
            .iter()
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        if schemes.is_empty() {
            // An allowlist with nothing usable in it would reject every link.
            info!(target: "config", "link_schemes_defaulted");
            schemes = LinksConfig::default_allowed_schemes();
        }
        self.effective_allowed_schemes = schemes;

        (self.effective_history_capacity, self.effective_paste_max)
    }

    /// Scheme comparison is case-insensitive; the allowlist is stored lowercase.
    pub fn allows_scheme(&self, scheme: &str) -> bool {
        let scheme = scheme.to_ascii_lowercase();
        self.effective_allowed_schemes.iter().any(|s| *s == scheme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    #[test]
    fn default_config_when_missing_file() {
        let mut cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        cfg.apply_limits();
        assert_eq!(cfg.effective_history_capacity, 50);
        assert_eq!(cfg.effective_paste_max, 100_000);
        assert_eq!(cfg.effective_allowed_schemes, ["https", "http", "mailto"]);
    }

    #[test]
    fn default_config_when_file_is_garbage() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "history = [not toml").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert!(cfg.raw.is_none());
        assert_eq!(cfg.file.history.capacity, 50);
    }

    #[test]
    fn parses_history_capacity() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[history]\ncapacity = 200\n").unwrap();
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.history.capacity, 200);
        cfg.apply_limits();
        assert_eq!(cfg.effective_history_capacity, 200);
    }

    #[test]
    fn clamps_zero_capacity_to_minimum() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[history]\ncapacity = 0\n").unwrap();
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        let (capacity, _) = cfg.apply_limits();
        assert_eq!(capacity, 1);
    }

    #[test]
    fn clamps_oversized_capacity() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[history]\ncapacity = 999999\n").unwrap();
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        let (capacity, _) = cfg.apply_limits();
        assert_eq!(capacity, Config::CAPACITY_MAX);
        // The raw value survives for diagnostics.
        assert_eq!(cfg.file.history.capacity, 999999);
    }

    #[test]
    fn scheme_allowlist_is_normalized_to_lowercase() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[links]\nallowed_schemes = [\"HTTPS\", \" ftp \"]\n",
        )
        .unwrap();
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        cfg.apply_limits();
        assert_eq!(cfg.effective_allowed_schemes, ["https", "ftp"]);
        assert!(cfg.allows_scheme("https"));
        assert!(cfg.allows_scheme("FTP"));
        assert!(!cfg.allows_scheme("mailto"));
    }

    #[test]
    fn empty_allowlist_falls_back_to_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[links]\nallowed_schemes = []\n").unwrap();
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        cfg.apply_limits();
        assert_eq!(cfg.effective_allowed_schemes, ["https", "http", "mailto"]);
    }

    #[test]
    fn paste_cap_parses_and_clamps() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[paste]\nmax_chars = 0\n").unwrap();
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        let (_, paste_max) = cfg.apply_limits();
        assert_eq!(paste_max, 1);
    }

    #[test]
    fn parses_multiple_sections() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[history]\ncapacity = 10\n[paste]\nmax_chars = 4096\n[links]\nallowed_schemes = [\"https\"]\n",
        )
        .unwrap();
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        cfg.apply_limits();
        assert_eq!(cfg.effective_history_capacity, 10);
        assert_eq!(cfg.effective_paste_max, 4096);
        assert_eq!(cfg.effective_allowed_schemes, ["https"]);
    }

    #[test]
    fn clamp_logging_uses_config_target() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[history]\ncapacity = 0\n").unwrap();
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        with_default(subscriber, || {
            cfg.apply_limits();
        });

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("INFO config:"));
        assert!(log_output.contains("history_capacity_clamped"));
        assert_eq!(cfg.effective_history_capacity, 1);
    }
}
