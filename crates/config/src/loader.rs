//! Config file loading
//!
//! Configuration is read once at startup and never written back. A missing,
//! unreadable or invalid file is fatal: the caller reports the error and
//! exits non-zero rather than running with a guessed book list.

use crate::error::{ConfigError, ConfigResult};
use crate::Config;
use std::fs;
use std::path::Path;

/// Loads and validates the configuration at `path`
pub fn load(path: &Path) -> ConfigResult<Config> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    // An empty file is treated as corrupted, not as all-defaults.
    if contents.trim().is_empty() {
        return Err(ConfigError::ReadError {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "config file is empty or contains only whitespace",
            ),
        });
    }

    let config: Config = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    if let Err(errors) = config.validate() {
        let message = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::ValidationError(message));
    }

    log::info!(
        "Loaded config from {}: {} audiobooks, {} decoder",
        path.display(),
        config.audiobooks.len(),
        config.decoder.backend
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DecoderBackendKind, InputBackendKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
        [playback]
        state_file = "/var/lib/bookbox/state.json"
        seek_seconds = 30
        save_interval_seconds = 10
        sleep_timer_minutes = 20
        notification_sound = "/usr/share/bookbox/chime.mp3"
        announcements_dir = "/usr/share/bookbox/announcements"

        [decoder]
        backend = "remote"
        binary = "mpg123"
        args = ["-R"]
        clip_args = ["-q"]

        [input]
        backend = "keyboard"

        [[audiobooks]]
        name = "Dune"
        path = "/media/books/dune.mp3"

        [[audiobooks]]
        name = "Hyperion"
        path = "/media/books/hyperion.mp3"
    "#;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(SAMPLE);
        let config = load(file.path()).expect("should load");

        assert_eq!(config.playback.seek_seconds, 30);
        assert_eq!(config.decoder.backend, DecoderBackendKind::Remote);
        assert_eq!(config.decoder.args, vec!["-R".to_string()]);
        assert_eq!(config.input.backend, InputBackendKind::Keyboard);
        assert_eq!(config.audiobooks.len(), 2);
        assert_eq!(config.audiobooks[1].name, "Hyperion");
    }

    #[test]
    fn test_sections_default_when_omitted() {
        let file = write_config(
            r#"
            [[audiobooks]]
            name = "Dune"
            path = "/media/books/dune.mp3"
            "#,
        );
        let config = load(file.path()).expect("should load");

        assert_eq!(config.playback.seek_seconds, 60);
        assert_eq!(config.decoder.backend, DecoderBackendKind::Signal);
        assert_eq!(config.input.backend, InputBackendKind::Hardware);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = load(Path::new("/nonexistent/bookbox.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_empty_file_is_error() {
        let file = write_config("  \n\t\n");
        assert!(matches!(
            load(file.path()),
            Err(ConfigError::ReadError { .. })
        ));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let file = write_config("this is not valid TOML {{{");
        assert!(matches!(
            load(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_empty_book_list_fails_validation() {
        let file = write_config("[playback]\nseek_seconds = 60\n");
        assert!(matches!(
            load(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
