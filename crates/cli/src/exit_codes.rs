//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Codes
//!
//! | Code | Description                                        |
//! |------|----------------------------------------------------|
//! | 0    | Success                                            |
//! | 1    | General error (unspecified)                        |
//! | 2    | CLI usage error (bad args, unknown key or token)   |
//! | 3    | I/O error (file missing, unwritable)               |
//! | 4    | Parse error (malformed XML, bad expression)        |
//! | 5    | Layer document has no elevation element            |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unparseable values.
pub const EXIT_USAGE: u8 = 2;

/// File could not be read or written.
pub const EXIT_IO: u8 = 3;

/// File was read but is not a well-formed layer document,
/// or an expression failed to parse.
pub const EXIT_PARSE: u8 = 4;

/// Layer document carries no `<elevation>` element.
pub const EXIT_NO_ELEVATION: u8 = 5;
