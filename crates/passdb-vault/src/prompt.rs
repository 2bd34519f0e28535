// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master secret acquisition via TTY prompt or PASSDB_MASTER_KEY, and plain
//! line prompts for credential fields.

use std::io::{BufRead, Write};

use passdb_core::PassdbError;
use zeroize::Zeroizing;

use crate::kdf::MasterSecret;

/// The environment variable name for providing the master secret.
pub const MASTER_KEY_ENV_VAR: &str = "PASSDB_MASTER_KEY";

/// Get the master secret from the environment or an interactive prompt.
///
/// Priority:
/// 1. `PASSDB_MASTER_KEY` environment variable (scripts, CI)
/// 2. No-echo TTY prompt via `rpassword`
///
/// Empty input is rejected.
pub fn prompt_secret() -> Result<MasterSecret, PassdbError> {
    if let Some(secret) = secret_from_env() {
        return Ok(secret);
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        let passphrase = rpassword::prompt_password("Master Pass: ")
            .map(Zeroizing::new)
            .map_err(|e| PassdbError::io("<stdin>", e))?;
        return secret_from_passphrase(&passphrase);
    }

    Err(PassdbError::SecretUnavailable(format!(
        "set {MASTER_KEY_ENV_VAR} or run interactively"
    )))
}

/// True when the master secret comes from the environment, so re-prompting
/// after a wrong secret is pointless.
pub fn secret_from_env_is_set() -> bool {
    std::env::var_os(MASTER_KEY_ENV_VAR).is_some_and(|v| !v.is_empty())
}

fn secret_from_env() -> Option<MasterSecret> {
    let key = Zeroizing::new(std::env::var(MASTER_KEY_ENV_VAR).ok()?);
    secret_from_passphrase(&key).ok()
}

/// Copy into an exact-size buffer; the caller's `Zeroizing` wipes the source.
fn secret_from_passphrase(passphrase: &Zeroizing<String>) -> Result<MasterSecret, PassdbError> {
    if passphrase.is_empty() {
        return Err(PassdbError::SecretUnavailable(
            "empty master secret not allowed".to_string(),
        ));
    }
    Ok(MasterSecret::from(passphrase.as_bytes().to_vec()))
}

/// Ask `question` on stderr and read one trimmed line from stdin.
///
/// Closed input is an error so callers that loop on an answer terminate.
pub fn prompt_line(question: &str) -> Result<String, PassdbError> {
    let stdin = std::io::stdin();
    read_answer(question, &mut stdin.lock(), &mut std::io::stderr())
}

fn read_answer<R: BufRead, W: Write>(
    question: &str,
    input: &mut R,
    output: &mut W,
) -> Result<String, PassdbError> {
    write!(output, "{question}: ")
        .and_then(|()| output.flush())
        .map_err(|e| PassdbError::io("<stderr>", e))?;

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(|e| PassdbError::io("<stdin>", e))?;
    if read == 0 {
        return Err(PassdbError::io(
            "<stdin>",
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "input closed"),
        ));
    }
    Ok(line.trim().to_string())
}
