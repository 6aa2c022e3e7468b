// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display and platform directories)
pub const APP_NAME: &str = "Statline";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "statline";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".statline";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "statline.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "STATLINE_CONFIG";

/// Environment variable for debug mode
pub const ENV_DEBUG: &str = "STATLINE_DEBUG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "STATLINE_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "STATLINE_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "STATLINE_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5390;

/// API route prefix
pub const API_PREFIX: &str = "/api/v1";

/// Body limit for API requests (8 MB, ingestion payloads are line batches)
pub const DEFAULT_BODY_LIMIT: usize = 8 * 1024 * 1024;

// =============================================================================
// Environment Variables - Storage
// =============================================================================

/// Environment variable to override data directory
pub const ENV_DATA_DIR: &str = "STATLINE_DATA_DIR";

// =============================================================================
// SQLite Database
// =============================================================================

/// SQLite database filename
pub const SQLITE_DB_FILENAME: &str = "statline.db";

/// SQLite connection pool max connections
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// SQLite busy timeout in seconds
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

/// SQLite cache size (negative = KB, so -64000 = 64MB)
pub const SQLITE_CACHE_SIZE: &str = "-64000";

/// SQLite WAL auto-checkpoint threshold (pages, ~4MB at 1000)
pub const SQLITE_WAL_AUTOCHECKPOINT: &str = "1000";

/// WAL checkpoint interval in seconds (5 minutes)
pub const SQLITE_CHECKPOINT_INTERVAL_SECS: u64 = 300;

// =============================================================================
// Retention Metadata
// =============================================================================

/// Environment variable for the default maximum value age in days
pub const ENV_RETENTION_MAX_LIFETIME_DAYS: &str = "STATLINE_RETENTION_MAX_LIFETIME_DAYS";

/// Environment variable for the default maximum entry count
pub const ENV_RETENTION_MAX_NUM_ENTRIES: &str = "STATLINE_RETENTION_MAX_NUM_ENTRIES";

/// Default maximum value age in days (0 = unlimited)
pub const DEFAULT_MAX_LIFETIME_DAYS: i64 = 0;

/// Default maximum entries per parameter (300 MB at ~20 bytes per entry)
pub const DEFAULT_MAX_NUM_ENTRIES: i64 = 300 * 1_000_000 / 20;

// =============================================================================
// Series
// =============================================================================

/// Environment variable for the default series length
pub const ENV_SERIES_LIMIT: &str = "STATLINE_SERIES_LIMIT";

/// Default number of values returned by a series read
pub const DEFAULT_SERIES_LIMIT: usize = 1000;

// =============================================================================
// Shutdown
// =============================================================================

/// Graceful shutdown timeout in seconds
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;
