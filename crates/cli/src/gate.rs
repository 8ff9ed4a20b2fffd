//! Shared-secret gate.
//!
//! Runs before any settings validation or network access. With no secret
//! configured the gate stays open and a warning is logged.

use std::io::{self, BufRead, Write};

use subtle::ConstantTimeEq;

use crate::exit_codes::EXIT_GATE_DENIED;
use crate::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// No secret configured; proceeding unauthenticated.
    Unprotected,
    Granted,
}

/// Constant-time comparison of the attempt against the secret.
pub fn verify(secret: &str, attempt: &str) -> bool {
    secret.as_bytes().ct_eq(attempt.as_bytes()).into()
}

/// Check `attempt` against `secret`, asking `prompt` when no attempt was
/// supplied up front.
pub fn check(
    secret: Option<&str>,
    attempt: Option<String>,
    prompt: impl FnOnce() -> io::Result<String>,
) -> Result<GateOutcome, CliError> {
    let Some(secret) = secret else {
        log::warn!(
            "no password configured; set auth.password or APP_PASSWORD to require login"
        );
        return Ok(GateOutcome::Unprotected);
    };

    let attempt = match attempt {
        Some(a) => a,
        None => prompt().map_err(|e| CliError::io(format!("cannot read password: {}", e)))?,
    };

    if verify(secret, &attempt) {
        log::debug!("gate: password accepted");
        Ok(GateOutcome::Granted)
    } else {
        Err(CliError {
            code: EXIT_GATE_DENIED,
            message: "invalid password".into(),
            hint: Some("pass --password or set FUNCLIB_PASSWORD".into()),
        })
    }
}

/// Prompt on stderr and read one line from `input`. EOF yields an empty
/// attempt, which never matches a configured secret.
pub fn prompt_line(input: &mut impl BufRead) -> io::Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
