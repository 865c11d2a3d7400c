//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args)               |
//! | 3-9     | run              | Input, config, output and strict codes   |
//! | 10-19   | semantic         | Semantic matcher provider/credential     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, conflicting options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Run (3-9)
// =============================================================================

/// A roster file could not be read, decoded or parsed, or lacks its name column.
pub const EXIT_INPUT_READ: u8 = 3;

/// Config file unreadable, malformed, or failed validation.
pub const EXIT_INVALID_CONFIG: u8 = 4;

/// Report file could not be written.
pub const EXIT_OUTPUT_WRITE: u8 = 5;

/// `--strict` and at least one survey entry is unmatched.
pub const EXIT_STRICT_UNMATCHED: u8 = 6;

// =============================================================================
// Semantic (10-19)
// =============================================================================

/// Semantic matcher selected but its provider is misconfigured.
pub const EXIT_SEMANTIC_MISCONFIGURED: u8 = 10;

/// Semantic matcher selected but no API key was found.
pub const EXIT_SEMANTIC_MISSING_KEY: u8 = 11;
