//! `passwd` subcommand: manage htpasswd-style credential files.
//!
//! # Usage
//!
//! ```bash
//! # Add a user with a bcrypt hash
//! twinproxy passwd add -f creds.txt -u alice -p wonderland
//!
//! # Add a user with an Apache MD5 hash
//! twinproxy passwd add -f creds.txt -u bob -p builder --scheme apr1
//!
//! # Check a password
//! twinproxy passwd verify -f creds.txt -u alice -p wonderland
//!
//! # List users
//! twinproxy passwd list -f creds.txt --format json
//!
//! # Remove a user
//! twinproxy passwd remove -f creds.txt -u bob
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tabled::{Table, Tabled};

use twinproxy_core::DEFAULT_BCRYPT_COST;

use crate::entry::CredentialEntry;
use crate::hash::{Scheme, hash_password};
use crate::store::CredentialStore;
use crate::traits::CredentialVerifier;

/// Credential file management arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "passwd", about = "Manage proxy credential files")]
pub struct PasswdArgs {
    #[command(subcommand)]
    pub command: PasswdCommands,
}

/// `passwd` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum PasswdCommands {
    /// Add a user.
    Add {
        /// Credential file (created if missing).
        #[arg(short, long)]
        file: PathBuf,

        /// Username.
        #[arg(short, long)]
        user: String,

        /// Password.
        #[arg(short, long)]
        password: String,

        /// Hash scheme.
        #[arg(short, long, value_enum, default_value_t = SchemeArg::Bcrypt)]
        scheme: SchemeArg,

        /// bcrypt cost factor.
        #[arg(long, default_value_t = DEFAULT_BCRYPT_COST)]
        cost: u32,
    },

    /// Remove every entry for a user.
    Remove {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long)]
        user: String,
    },

    /// Check a password against the file.
    Verify {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        password: String,
    },

    /// List users.
    List {
        #[arg(short, long)]
        file: PathBuf,

        /// Output format.
        #[arg(long, value_enum, default_value_t = ListFormat::Table)]
        format: ListFormat,
    },
}

/// Hash scheme selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemeArg {
    Bcrypt,
    Apr1,
    Sha1,
    Plain,
}

impl From<SchemeArg> for Scheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Bcrypt => Scheme::Bcrypt,
            SchemeArg::Apr1 => Scheme::Apr1,
            SchemeArg::Sha1 => Scheme::Sha1,
            SchemeArg::Plain => Scheme::Plain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    Table,
    Json,
}

/// User row for display.
#[derive(Tabled, Serialize)]
struct UserDisplay {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Scheme")]
    scheme: String,
}

impl UserDisplay {
    fn rows(entries: &[CredentialEntry]) -> Vec<Self> {
        entries
            .iter()
            .enumerate()
            .map(|(i, e)| Self {
                index: i + 1,
                username: e.username.clone(),
                scheme: e.scheme().to_string(),
            })
            .collect()
    }
}

/// Run the `passwd` CLI.
pub async fn run(args: PasswdArgs) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        PasswdCommands::Add {
            file,
            user,
            password,
            scheme,
            cost,
        } => {
            let store = CredentialStore::new(file);
            if store.path().exists() && store.find(&user).await?.is_some() {
                return Err(format!("user {user} already exists").into());
            }
            let scheme = Scheme::from(scheme);
            let hash = tokio::task::spawn_blocking(move || hash_password(&password, scheme, cost))
                .await??;
            store
                .append_entry(&CredentialEntry::new(user.clone(), hash))
                .await?;
            println!("Added {user} ({scheme}) to {}", store.path().display());
            Ok(())
        }
        PasswdCommands::Remove { file, user } => {
            let store = CredentialStore::new(file);
            match store.remove_user(&user).await? {
                0 => Err(format!("user {user} not found").into()),
                n => {
                    println!("Removed {n} entr{} for {user}", if n == 1 { "y" } else { "ies" });
                    Ok(())
                }
            }
        }
        PasswdCommands::Verify {
            file,
            user,
            password,
        } => {
            let store = CredentialStore::new(file);
            store.verify(&user, &password).await?;
            println!("Password for {user} is valid");
            Ok(())
        }
        PasswdCommands::List { file, format } => {
            let store = CredentialStore::new(file);
            let rows = UserDisplay::rows(&store.entries().await?);
            match format {
                ListFormat::Table if rows.is_empty() => println!("No users."),
                ListFormat::Table => println!("{}", Table::new(rows)),
                ListFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> PasswdArgs {
        PasswdArgs::try_parse_from(std::iter::once("passwd").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn parse_add_defaults_to_bcrypt() {
        let args = parse(&["add", "-f", "c.txt", "-u", "alice", "-p", "pw"]);
        match args.command {
            PasswdCommands::Add { scheme, cost, .. } => {
                assert_eq!(scheme, SchemeArg::Bcrypt);
                assert_eq!(cost, DEFAULT_BCRYPT_COST);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn add_verify_remove_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("creds.txt");
        let f = file.to_str().unwrap();

        run(parse(&["add", "-f", f, "-u", "alice", "-p", "pw", "-s", "apr1"]))
            .await
            .unwrap();
        assert!(
            run(parse(&["add", "-f", f, "-u", "alice", "-p", "other"]))
                .await
                .is_err()
        );
        run(parse(&["verify", "-f", f, "-u", "alice", "-p", "pw"]))
            .await
            .unwrap();
        assert!(
            run(parse(&["verify", "-f", f, "-u", "alice", "-p", "nope"]))
                .await
                .is_err()
        );
        run(parse(&["list", "-f", f, "--format", "json"]))
            .await
            .unwrap();
        run(parse(&["remove", "-f", f, "-u", "alice"])).await.unwrap();
        assert!(
            run(parse(&["remove", "-f", f, "-u", "alice"]))
                .await
                .is_err()
        );
    }

    #[test]
    fn table_numbers_users_in_order() {
        let entries = [
            CredentialEntry::new("alice", "wonderland"),
            CredentialEntry::new("bob", "{SHA}VBPuJHI7uixaa6LQGWx4s+5GKNE="),
        ];
        let table = Table::new(UserDisplay::rows(&entries)).to_string();
        let header = table.lines().nth(1).unwrap();
        assert!(header.contains('#'));
        assert!(!header.contains("Line"));

        let rows = UserDisplay::rows(&entries);
        assert_eq!(rows[1].index, 2);
        assert_eq!(rows[1].scheme, "sha1");
    }
}
