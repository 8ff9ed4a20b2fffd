//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                              |
//! |---------|-----------|------------------------------------------|
//! | 0       | Universal | Success                                  |
//! | 1       | Universal | General error (unspecified)              |
//! | 2       | Universal | CLI usage error (bad args)               |
//! | 3       | gate      | Password rejected                        |
//! | 10-19   | library   | Index, tab and configuration failures    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure (e.g. stdout closed).
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Gate (3)
// =============================================================================

/// Password did not match the configured secret. Nothing was fetched.
pub const EXIT_GATE_DENIED: u8 = 3;

// =============================================================================
// Library (10-19)
// =============================================================================

/// Index tab could not be read or lists no tabs. The whole pass stops.
pub const EXIT_INDEX: u8 = 10;

/// A content tab could not be fetched or parsed.
/// For `render`, raised after all panels were printed.
pub const EXIT_TAB: u8 = 11;

/// Settings file unreadable, malformed, or missing required values.
pub const EXIT_CONFIG: u8 = 12;
