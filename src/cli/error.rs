// Error handling utilities for consistent error messages and exit codes

use crate::cli::parser::CommandError;
use crate::models::TaskError;

/// Exit code for invalid input: unknown item, duplicate id, bad command
pub const EXIT_USER_ERROR: i32 = 1;
/// Exit code for unexpected failures: I/O, database, corrupt state file
pub const EXIT_INTERNAL_ERROR: i32 = 2;

/// Whether the user can fix this error by changing what they typed
pub fn is_user_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<TaskError>().is_some() || err.downcast_ref::<CommandError>().is_some()
}

pub fn exit_code(err: &anyhow::Error) -> i32 {
    if is_user_error(err) {
        EXIT_USER_ERROR
    } else {
        EXIT_INTERNAL_ERROR
    }
}

/// Print an error (with its cause chain for internal errors) and return the exit code
pub fn report(err: &anyhow::Error) -> i32 {
    let code = exit_code(err);
    if code == EXIT_USER_ERROR {
        eprintln!("Error: {}", err);
    } else {
        eprintln!("Internal error: {}", err);
        let mut source = err.source();
        if source.is_some() {
            eprintln!("\nCaused by:");
            let mut indent = 1;
            while let Some(cause) = source {
                eprintln!("{:indent$}  {}", "", cause);
                source = cause.source();
                indent += 1;
            }
        }
    }
    code
}
