//! CLI command implementations
//!
//! Every command returns the process exit code:
//!
//! | Code | Meaning |
//! |---|---|
//! | 0 | Success |
//! | 1 | Run completed with seeder failures or record errors |
//! | 2 | Configuration error |
//! | 4 | Store unreachable or unhealthy |
//! | 5 | Fatal error |

pub mod health;
pub mod init;
pub mod seed;
pub mod status;
pub mod validate;

use crate::domain::SeedError;

/// Configuration error exit code
pub const EXIT_CONFIG: i32 = 2;

/// Store connection error exit code
pub const EXIT_CONNECTION: i32 = 4;

/// Fatal error exit code
pub const EXIT_FATAL: i32 = 5;

/// Exit code for an error that stopped a command
pub fn exit_code_for(error: &SeedError) -> i32 {
    match error {
        SeedError::Configuration(_) | SeedError::Validation(_) => EXIT_CONFIG,
        SeedError::Database(_) | SeedError::Store(_) => EXIT_CONNECTION,
        _ => EXIT_FATAL,
    }
}
