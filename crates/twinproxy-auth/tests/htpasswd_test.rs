//! Gate behaviour against real htpasswd files.

use std::io::Write;

use twinproxy_auth::{
    AuthGate, CredentialStore, EnsureOutcome, Scheme, encode_basic, hash_password,
};

fn write_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn mixed_scheme_file() {
    let bcrypt = hash_password("b-pass", Scheme::Bcrypt, 4).unwrap();
    let file = write_file(&format!(
        "# generated by htpasswd\n\
         apache:$apr1$r31.....$HqJZimcKQFAMYayBlzkrA/\n\
         sha:{{SHA}}VBPuJHI7uixaa6LQGWx4s+5GKNE=\n\
         broken line without separator\n\
         crypt:{bcrypt}\n\
         plain:wonderland\n"
    ));
    let gate = AuthGate::from_path(Some(file.path().to_path_buf()));

    assert!(gate.evaluate("apache", "myPassword").await.allowed);
    assert!(gate.evaluate("sha", "myPassword").await.allowed);
    assert!(gate.evaluate("crypt", "b-pass").await.allowed);
    assert!(gate.evaluate("plain", "wonderland").await.allowed);

    assert!(!gate.evaluate("apache", "wonderland").await.allowed);
    assert!(!gate.evaluate("broken line without separator", "").await.allowed);
}

#[tokio::test]
async fn basic_header_against_file() {
    let file = write_file("alice:wonderland\n");
    let gate = AuthGate::from_path(Some(file.path().to_path_buf()));

    let ok = gate
        .evaluate_basic(Some(&encode_basic("alice", "wonderland")))
        .await;
    assert!(ok.allowed);
    assert_eq!(ok.identity.as_deref(), Some("alice"));

    let bad = gate.evaluate_basic(Some(&encode_basic("bob", "bad"))).await;
    assert!(!bad.allowed);
    assert_eq!(bad.identity.as_deref(), Some("bob"));
}

#[tokio::test]
async fn separate_gates_on_same_file_see_same_edits() {
    let file = write_file("alice:one\n");
    let socks = AuthGate::from_path(Some(file.path().to_path_buf()));
    let http = AuthGate::from_path(Some(file.path().to_path_buf()));

    assert!(socks.evaluate("alice", "one").await.allowed);
    std::fs::write(file.path(), "alice:two\n").unwrap();
    assert!(!http.evaluate("alice", "one").await.allowed);
    assert!(socks.evaluate("alice", "two").await.allowed);
}

#[tokio::test]
async fn created_file_denies_until_users_added() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("creds.txt");
    assert_eq!(
        CredentialStore::ensure_exists(Some(&path)).await.unwrap(),
        EnsureOutcome::Created
    );

    let gate = AuthGate::from_path(Some(path.clone()));
    assert!(!gate.evaluate("alice", "wonderland").await.allowed);

    std::fs::write(&path, "alice:wonderland\n").unwrap();
    assert!(gate.evaluate("alice", "wonderland").await.allowed);
}
