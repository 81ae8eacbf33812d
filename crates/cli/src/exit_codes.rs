//! CLI Exit Code Registry
//!
//! Single source of truth for `askgrid` exit codes. Scripts rely on them.
//!
//! | Range | Domain    | Description                                  |
//! |-------|-----------|----------------------------------------------|
//! | 0     | Universal | Success                                      |
//! | 1     | Universal | General error                                |
//! | 2     | Universal | Usage error (bad args, unknown dataset)      |
//! | 3-9   | upload    | File ingestion                               |
//! | 10-19 | ai        | AI provider, keychain and request failures   |

use askgrid_config::ai::AIConfigStatus;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown dataset name.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Upload (3-9)
// =============================================================================

/// A file was rejected (bad extension, unreadable, unparseable, unknown
/// sheet). The whole batch is discarded.
pub const EXIT_UPLOAD: u8 = 3;

// =============================================================================
// AI (10-19)
// =============================================================================

/// AI disabled (provider=none).
pub const EXIT_AI_DISABLED: u8 = 10;

/// Provider needs an API key and none was found.
pub const EXIT_AI_MISSING_KEY: u8 = 11;

/// Keychain error (cannot store credentials).
pub const EXIT_AI_KEYCHAIN_ERR: u8 = 12;

/// The completion request failed; the answer was absent.
pub const EXIT_AI_REQUEST: u8 = 13;

/// Exit code for `ai doctor` given the resolved status.
pub fn ai_status_exit_code(status: AIConfigStatus) -> u8 {
    match status {
        AIConfigStatus::Ready => EXIT_SUCCESS,
        AIConfigStatus::Disabled => EXIT_AI_DISABLED,
        AIConfigStatus::MissingKey => EXIT_AI_MISSING_KEY,
    }
}
