// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand handlers.
//!
//! Each handler opens the vault (prompting for the master secret), performs
//! one store operation and prints the result to stdout. Prompts go to stderr.

use std::io::Write;
use std::path::Path;

use passdb_config::PassdbConfig;
use passdb_core::{Credential, PassdbError};
use passdb_vault::{
    MasterSecret, StoreOptions, VaultStore, generate_password, prompt, read_rows_from_path,
};
use secrecy::ExposeSecret;
use tracing::{debug, warn};

use crate::Commands;
use crate::output;

/// Attempts allowed for entering the master secret.
const MAX_SECRET_ATTEMPTS: usize = 3;

pub fn run(command: Commands, config: &PassdbConfig) -> Result<(), PassdbError> {
    let options = StoreOptions::from_config(config);
    let retries = if prompt::secret_from_env_is_set() {
        1
    } else {
        MAX_SECRET_ATTEMPTS
    };
    let (mut store, secret) = open_store(&options, retries, prompt::prompt_secret)?;
    debug!(command = ?command, dir = %store.dir().display(), "running command");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Find { query } => print_matches(&store, &query, &secret, &mut out),
        Commands::Export { .. } => print_matches(&store, "", &secret, &mut out),
        Commands::Get { name } => {
            let collection = store.get(&name, &secret)?;
            output::write_collection(&mut out, &collection).map_err(stdout_err)
        }
        Commands::Load { identifier } => {
            let collection = store.load(&identifier, &secret)?;
            output::write_collection(&mut out, &collection).map_err(stdout_err)
        }
        Commands::Add { name } => add(&mut store, &name, &secret, false, &mut out),
        Commands::Set { name } => add(&mut store, &name, &secret, true, &mut out),
        Commands::Generate { name } => generate(&mut store, &name, &secret, config, &mut out),
        Commands::Import { file } => import(&mut store, &file, &secret, &mut out),
        Commands::Verify => verify(&store, &mut out),
    }
}

/// Open the vault, asking for the master secret again when it does not
/// decrypt the lookup index.
pub(crate) fn open_store<F>(
    options: &StoreOptions,
    attempts: usize,
    mut next_secret: F,
) -> Result<(VaultStore, MasterSecret), PassdbError>
where
    F: FnMut() -> Result<MasterSecret, PassdbError>,
{
    let mut attempt = 1;
    loop {
        let secret = next_secret()?;
        match VaultStore::open(options, &secret) {
            Ok(store) => return Ok((store, secret)),
            Err(e) if e.is_invalid_master_secret() && attempt < attempts => {
                warn!(attempt, "master secret rejected");
                eprintln!("Invalid master secret, try again.");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn print_matches<W: Write>(
    store: &VaultStore,
    query: &str,
    secret: &MasterSecret,
    out: &mut W,
) -> Result<(), PassdbError> {
    for entry in store.find(query, secret) {
        let (name, collection) = entry?;
        output::write_header(out, &name).map_err(stdout_err)?;
        output::write_collection(out, &collection).map_err(stdout_err)?;
    }
    Ok(())
}

fn add<W: Write>(
    store: &mut VaultStore,
    name: &str,
    secret: &MasterSecret,
    overwrite: bool,
    out: &mut W,
) -> Result<(), PassdbError> {
    let user = prompt::prompt_line("user")?;
    let pass = prompt::prompt_line("pass")?;
    let meta = prompt::prompt_line("meta")?;

    let replaced = store.add(name, secret, Credential::new(user, pass, meta), overwrite)?;
    report_replaced(&replaced, out)
}

fn generate<W: Write>(
    store: &mut VaultStore,
    name: &str,
    secret: &MasterSecret,
    config: &PassdbConfig,
    out: &mut W,
) -> Result<(), PassdbError> {
    let password = loop {
        let candidate = generate_password(config.generate.length, &config.generate.alphabet)?;
        writeln!(out, "pass={}", candidate.expose_secret()).map_err(stdout_err)?;
        out.flush().map_err(stdout_err)?;
        if prompt::prompt_line("confirm to save (y)")? == "y" {
            break candidate;
        }
    };

    let user = prompt::prompt_line("user")?;
    let meta = prompt::prompt_line("meta")?;
    let credential = Credential::new(user, password.expose_secret(), meta);
    output::write_credential(out, &credential).map_err(stdout_err)?;

    store.add(name, secret, credential, false)?;
    Ok(())
}

fn import<W: Write>(
    store: &mut VaultStore,
    file: &Path,
    secret: &MasterSecret,
    out: &mut W,
) -> Result<(), PassdbError> {
    let rows = read_rows_from_path(file)?;
    let imported = store.import_rows(rows, secret)?;
    writeln!(out, "Imported {imported} credentials from {}", file.display()).map_err(stdout_err)
}

fn verify<W: Write>(store: &VaultStore, out: &mut W) -> Result<(), PassdbError> {
    let report = store.verify()?;
    if report.is_clean() {
        return writeln!(out, "vault is consistent").map_err(stdout_err);
    }
    for entry in &report.dangling {
        writeln!(out, "dangling: {} -> {} (record file missing)", entry.name, entry.identifier)
            .map_err(stdout_err)?;
    }
    for orphan in &report.orphans {
        writeln!(out, "orphan: {} (not in index)", orphan.identifier).map_err(stdout_err)?;
    }
    Ok(())
}

fn report_replaced<W: Write>(replaced: &[Credential], out: &mut W) -> Result<(), PassdbError> {
    for cred in replaced {
        writeln!(out, "Deleted user={} meta={} url={}", cred.user, cred.meta, cred.url)
            .map_err(stdout_err)?;
    }
    Ok(())
}

fn stdout_err(e: std::io::Error) -> PassdbError {
    PassdbError::io("<stdout>", e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use passdb_vault::KdfParams;

    fn options(dir: &Path) -> StoreOptions {
        StoreOptions::new(dir).with_kdf(KdfParams::new(4, 8, 1))
    }

    fn secret(s: &str) -> MasterSecret {
        MasterSecret::from(s.as_bytes().to_vec())
    }

    fn seed_vault(dir: &Path) {
        let master = secret("right");
        let mut store = VaultStore::open(&options(dir), &master).unwrap();
        store
            .add("github", &master, Credential::new("alice", "p1", "work"), false)
            .unwrap();
    }

    #[test]
    fn open_store_retries_wrong_secret() {
        let dir = tempfile::tempdir().unwrap();
        seed_vault(dir.path());

        let mut answers = vec!["right", "wrong"];
        let mut calls = 0;
        let (store, _) = open_store(&options(dir.path()), 3, || {
            calls += 1;
            Ok(secret(answers.pop().unwrap()))
        })
        .unwrap();
        assert_eq!(calls, 2);
        assert_eq!(store.entries().len(), 1);
    }

    #[test]
    fn open_store_gives_up_after_last_attempt() {
        let dir = tempfile::tempdir().unwrap();
        seed_vault(dir.path());

        let mut calls = 0;
        let err = open_store(&options(dir.path()), 3, || {
            calls += 1;
            Ok(secret("wrong"))
        })
        .unwrap_err();
        assert!(err.is_invalid_master_secret());
        assert_eq!(calls, 3);
    }

    #[test]
    fn open_store_retries_wrong_secret_with_derived_index() {
        let dir = tempfile::tempdir().unwrap();
        seed_vault(dir.path());
        let derived = options(dir.path()).with_index(passdb_config::IndexMode::Derived);

        let mut answers = vec!["right", "wrong"];
        let (store, _) = open_store(&derived, 3, || Ok(secret(answers.pop().unwrap()))).unwrap();
        assert!(answers.is_empty());
        assert_eq!(store.entries().len(), 1);
    }

    #[test]
    fn open_store_does_not_retry_other_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut calls = 0;
        let err = open_store(&options(dir.path()), 3, || {
            calls += 1;
            Err(PassdbError::SecretUnavailable("no secret".into()))
        })
        .unwrap_err();
        assert!(matches!(err, PassdbError::SecretUnavailable(_)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn find_output_has_headers_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let master = secret("right");
        let mut store = VaultStore::open(&options(dir.path()), &master).unwrap();
        store
            .add("gitlab", &master, Credential::new("bob", "p2", ""), false)
            .unwrap();
        store
            .add("github", &master, Credential::new("alice", "p1", ""), false)
            .unwrap();

        let mut out = Vec::new();
        print_matches(&store, "git", &master, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\ngithub\n=======================\nuser=alice\npass=p1\nmeta=\nurl=\n\
             \ngitlab\n=======================\nuser=bob\npass=p2\nmeta=\nurl=\n"
        );
    }

    #[test]
    fn verify_output_lists_issues() {
        let dir = tempfile::tempdir().unwrap();
        let master = secret("right");
        let store = VaultStore::open(&options(dir.path()), &master).unwrap();

        let mut out = Vec::new();
        verify(&store, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "vault is consistent\n");

        let orphan = "0".repeat(64);
        std::fs::write(dir.path().join(format!("{orphan}.json.enc")), b"x").unwrap();
        let mut out = Vec::new();
        verify(&store, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("orphan: {orphan} (not in index)\n")
        );
    }

    #[test]
    fn replaced_credentials_are_reported_without_passwords() {
        let mut out = Vec::new();
        report_replaced(&[Credential::new("alice", "p1", "work")], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Deleted user=alice meta=work url=\n");
        assert!(!text.contains("p1"));
    }
}
