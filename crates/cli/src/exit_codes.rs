//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                                  |
//! |---------|------------------|----------------------------------------------|
//! | 0       | Universal        | Success                                      |
//! | 1       | Universal        | General error (unspecified)                  |
//! | 2       | Universal        | Usage or configuration error                 |
//! | 3-9     | local            | Local files and data directory               |
//! | 50-59   | harvest          | Upstream sources (OAI-PMH, person graph)     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant error path

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - run completed, tables written (zero matches is still success).
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - no name source given, conflicting flags, invalid config.
/// Raised before any network or file I/O.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Local (3-9)
// =============================================================================

/// Cannot read or write a local file (data dir, snapshot, outputs, config).
pub const EXIT_IO: u8 = 3;

/// A source could not be parsed (N-Triples, OAI XML, name index, MARC).
pub const EXIT_PARSE: u8 = 4;

// =============================================================================
// Harvest (50-59)
// =============================================================================

/// Upstream or network failure that survived the retry budget, or an
/// HTTP 503 without a usable Retry-After header.
pub const EXIT_FETCH_UPSTREAM: u8 = 50;

/// The OAI-PMH endpoint answered with an `<error code="...">` payload.
pub const EXIT_FETCH_PROTOCOL: u8 = 51;
