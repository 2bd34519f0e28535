// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text rendering of credentials.

use std::io::{self, Write};

use passdb_core::{Credential, CredentialCollection};

/// Section header printed before each named collection.
pub fn write_header<W: Write>(out: &mut W, name: &str) -> io::Result<()> {
    write!(out, "\n{name}\n=======================\n")
}

pub fn write_credential<W: Write>(out: &mut W, cred: &Credential) -> io::Result<()> {
    writeln!(out, "user={}", cred.user)?;
    writeln!(out, "pass={}", cred.pass)?;
    writeln!(out, "meta={}", cred.meta)?;
    if !cred.kind.is_empty() {
        writeln!(out, "type={}", cred.kind)?;
    }
    writeln!(out, "url={}", cred.url)
}

/// Credentials separated by a blank line.
pub fn write_collection<W: Write>(out: &mut W, collection: &CredentialCollection) -> io::Result<()> {
    for (i, cred) in collection.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        write_credential(out, cred)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(collection: &CredentialCollection) -> String {
        let mut out = Vec::new();
        write_collection(&mut out, collection).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn single_credential() {
        let collection = CredentialCollection::single(Credential::new("alice", "p1", "work"));
        assert_eq!(render(&collection), "user=alice\npass=p1\nmeta=work\nurl=\n");
    }

    #[test]
    fn credentials_are_separated_by_blank_line() {
        let mut collection = CredentialCollection::single(Credential::new("a", "1", ""));
        collection.push(Credential {
            user: "b".into(),
            pass: "2".into(),
            meta: "".into(),
            kind: "Login".into(),
            url: "https://example.com".into(),
        });
        assert_eq!(
            render(&collection),
            "user=a\npass=1\nmeta=\nurl=\n\nuser=b\npass=2\nmeta=\ntype=Login\nurl=https://example.com\n"
        );
    }

    #[test]
    fn header_format() {
        let mut out = Vec::new();
        write_header(&mut out, "github").unwrap();
        assert_eq!(out, b"\ngithub\n=======================\n");
    }

    #[test]
    fn empty_collection_prints_nothing() {
        assert_eq!(render(&CredentialCollection::default()), "");
    }
}
