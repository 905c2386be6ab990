//! Application constants for the CAT processor
//!
//! Record-type tags, storage extensions and default values used
//! throughout the decoder and the conversion pipeline.

// =============================================================================
// Record Types
// =============================================================================

/// Number of leading characters holding the record-type tag on every line
pub const TAG_LENGTH: usize = 2;

/// Record-type tags defined by the CAT interchange format
pub mod record_tags {
    /// Header / file metadata
    pub const HEADER: &str = "01";

    /// Parcel (finca)
    pub const PARCEL: &str = "11";

    /// Construction unit (unidad constructiva)
    pub const CONSTRUCTION_UNIT: &str = "13";

    /// Construction (construcción)
    pub const CONSTRUCTION: &str = "14";

    /// Real-estate asset (bien inmueble)
    pub const REAL_ESTATE: &str = "15";

    /// Common-element apportionment (reparto de elementos comunes)
    pub const COMMON_ELEMENTS: &str = "16";

    /// Crops / land use (cultivos)
    pub const CROPS: &str = "17";

    /// All supported tags, in format order
    pub const ALL: &[&str] = &[
        HEADER,
        PARCEL,
        CONSTRUCTION_UNIT,
        CONSTRUCTION,
        REAL_ESTATE,
        COMMON_ELEMENTS,
        CROPS,
    ];
}

// =============================================================================
// Storage
// =============================================================================

/// Extension of the only supported compressed container
pub const GZIP_EXTENSION: &str = "gz";

/// Compressed containers recognised by extension but not implemented
pub const UNSUPPORTED_EXTENSIONS: &[&str] = &["bz2", "zip", "xz", "zst", "7z"];

/// Extension used by Catastro for interchange files
pub const CAT_EXTENSION: &str = "cat";

/// Read buffer size for line sources (bytes)
pub const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Input path that selects standard input
pub const STDIN_PATH: &str = "-";

/// Label reported for standard input in logs and errors
pub const STDIN_LABEL: &str = "<stdin>";

// =============================================================================
// Conversion Defaults
// =============================================================================

/// Default record types converted when none are requested
pub const DEFAULT_CONVERT_TAGS: &[&str] = &[record_tags::PARCEL, record_tags::REAL_ESTATE];

/// Default number of records printed by `inspect`
pub const DEFAULT_INSPECT_LIMIT: usize = 10;

/// Environment variable used to locate a configuration file
pub const CONFIG_ENV_VAR: &str = "CAT_PROCESSOR_CONFIG";

/// Decode failures kept verbatim in stream statistics
pub const MAX_RECORDED_ERRORS: usize = 100;
