//! Runtime configuration, read from environment variables with defaults
//! suitable for a local database.

use std::path::PathBuf;

/// Where the database lives and who connects to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub server: String,
    pub port: u16,
    pub database: String,
    pub username: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            server: "127.0.0.1".to_string(),
            port: 3306,
            database: "plandb".to_string(),
            username: "root".to_string(),
        }
    }
}

impl DatabaseSettings {
    /// Secret-store service name under which this server's password is kept.
    pub fn secret_service(&self) -> String {
        format!("plandb_{}_login", self.server)
    }
}

/// Knobs for reading input files and reconciling schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// Lines starting with this byte are skipped when reading input files.
    pub comment_marker: u8,
    /// Fail instead of warn when a schema description and a live table
    /// disagree on their column sets.
    pub strict_schema: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            comment_marker: b'#',
            strict_schema: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub database: DatabaseSettings,
    pub ingest: IngestOptions,
    /// `CORGIETC_DATA_DIR`, home of `scripts/CGI_Noise.json`.
    pub simulation_data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            upload_dir: PathBuf::from("uploads"),
            database: DatabaseSettings::default(),
            ingest: IngestOptions::default(),
            simulation_data_dir: None,
        }
    }
}

impl Settings {
    /// Environment variables:
    /// - `CORGIDB_HOST`, `CORGIDB_PORT`: HTTP bind address (default 127.0.0.1:8080)
    /// - `CORGIDB_DB_SERVER`, `CORGIDB_DB_PORT`: database address (default 127.0.0.1:3306)
    /// - `CORGIDB_DB_NAME`: database name (default plandb)
    /// - `CORGIDB_DB_USER`: database user (default `$USER`, then root)
    /// - `CORGIDB_UPLOAD_DIR`: where accepted request files are stored (default uploads)
    /// - `CORGIDB_COMMENT_MARKER`: single ASCII character (default #)
    /// - `CORGIDB_STRICT_SCHEMA`: "true" to fail on schema mismatches (default false)
    /// - `CORGIETC_DATA_DIR`: simulation data directory
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Settings::default();

        let host = lookup("CORGIDB_HOST").unwrap_or(defaults.host);
        let port = lookup("CORGIDB_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);
        let upload_dir = lookup("CORGIDB_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.upload_dir);

        let database = DatabaseSettings {
            server: lookup("CORGIDB_DB_SERVER").unwrap_or(defaults.database.server),
            port: lookup("CORGIDB_DB_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.database.port),
            database: lookup("CORGIDB_DB_NAME").unwrap_or(defaults.database.database),
            username: lookup("CORGIDB_DB_USER")
                .or_else(|| lookup("USER"))
                .unwrap_or(defaults.database.username),
        };

        // Multi-byte or non-ASCII markers cannot be honoured by the CSV reader.
        let comment_marker = lookup("CORGIDB_COMMENT_MARKER")
            .and_then(|s| match s.as_bytes() {
                [b] if b.is_ascii() => Some(*b),
                _ => None,
            })
            .unwrap_or(defaults.ingest.comment_marker);

        let strict_schema = lookup("CORGIDB_STRICT_SCHEMA")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(defaults.ingest.strict_schema);

        Self {
            host,
            port,
            upload_dir,
            database,
            ingest: IngestOptions {
                comment_marker,
                strict_schema,
            },
            simulation_data_dir: lookup("CORGIETC_DATA_DIR").map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.database.database, "plandb");
        assert_eq!(settings.database.username, "root");
        assert_eq!(settings.ingest.comment_marker, b'#');
        assert!(!settings.ingest.strict_schema);
        assert!(settings.simulation_data_dir.is_none());
    }

    #[test]
    fn overrides_from_environment() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("CORGIDB_DB_SERVER", "db.example.org"),
            ("CORGIDB_DB_USER", "dsavransky"),
            ("USER", "ignored"),
            ("CORGIDB_COMMENT_MARKER", ";"),
            ("CORGIDB_STRICT_SCHEMA", "TRUE"),
            ("CORGIDB_PORT", "not-a-port"),
        ]));
        assert_eq!(settings.database.server, "db.example.org");
        assert_eq!(settings.database.username, "dsavransky");
        assert_eq!(settings.database.secret_service(), "plandb_db.example.org_login");
        assert_eq!(settings.ingest.comment_marker, b';');
        assert!(settings.ingest.strict_schema);
        assert_eq!(settings.port, 8080);
    }

    #[test]
    fn multi_character_comment_marker_falls_back() {
        let settings = Settings::from_lookup(lookup_from(&[("CORGIDB_COMMENT_MARKER", "//")]));
        assert_eq!(settings.ingest.comment_marker, b'#');
    }
}
