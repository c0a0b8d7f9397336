//! Password hash schemes understood in htpasswd files.
//!
//! The scheme is chosen by the stored hash's prefix:
//!
//! | prefix | scheme |
//! |---|---|
//! | `$2a$`, `$2b$`, `$2x$`, `$2y$` | bcrypt |
//! | `$apr1$` | Apache MD5-crypt |
//! | `{SHA}` | base64 SHA-1 |
//! | anything else | plaintext |
//!
//! A plaintext entry that fails to match and looks like a traditional DES
//! crypt(3) hash (13 characters from the crypt alphabet) is then checked
//! as crypt. Such hashes are only ever verified, never generated.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use md5::{Digest, Md5};
use rand::Rng;
use sha1::Sha1;

use crate::error::AuthError;

const APR1_MAGIC: &str = "$apr1$";
const SHA_PREFIX: &str = "{SHA}";
const BCRYPT_PREFIXES: [&str; 4] = ["$2a$", "$2b$", "$2x$", "$2y$"];
const DES_CRYPT_LEN: usize = 13;

/// crypt(3) base64 alphabet.
const ITOA64: &[u8; 64] = b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Hash scheme of a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Bcrypt,
    Apr1,
    Sha1,
    Plain,
}

impl Scheme {
    /// Detect the scheme from a stored hash.
    pub fn detect(hash: &str) -> Self {
        if BCRYPT_PREFIXES.iter().any(|p| hash.starts_with(p)) {
            Self::Bcrypt
        } else if hash.starts_with(APR1_MAGIC) {
            Self::Apr1
        } else if hash.starts_with(SHA_PREFIX) {
            Self::Sha1
        } else {
            Self::Plain
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bcrypt => "bcrypt",
            Self::Apr1 => "apr1",
            Self::Sha1 => "sha1",
            Self::Plain => "plain",
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check `password` against a stored hash of any supported scheme.
///
/// A corrupt hash never matches. bcrypt is CPU bound; call this from a
/// blocking context when serving connections.
pub fn verify_hash(password: &str, stored: &str) -> bool {
    match Scheme::detect(stored) {
        Scheme::Bcrypt => bcrypt::verify(password, stored).unwrap_or(false),
        Scheme::Apr1 => match split_apr1_salt(stored) {
            Some(salt) => constant_time_eq(apr1_crypt(password, salt).as_bytes(), stored.as_bytes()),
            None => false,
        },
        Scheme::Sha1 => constant_time_eq(sha1_hash(password).as_bytes(), stored.as_bytes()),
        Scheme::Plain => {
            constant_time_eq(password.as_bytes(), stored.as_bytes())
                || (is_des_crypt(stored) && pwhash::unix_crypt::verify(password, stored))
        }
    }
}

/// Shape of a traditional crypt(3) hash: two salt characters and eleven
/// digest characters, all from the crypt alphabet.
fn is_des_crypt(stored: &str) -> bool {
    stored.len() == DES_CRYPT_LEN && stored.bytes().all(|b| ITOA64.contains(&b))
}

/// Hash `password` with `scheme`.
///
/// `cost` only applies to bcrypt.
pub fn hash_password(password: &str, scheme: Scheme, cost: u32) -> Result<String, AuthError> {
    match scheme {
        Scheme::Bcrypt => bcrypt::hash(password, cost).map_err(AuthError::backend),
        Scheme::Apr1 => Ok(apr1_crypt(password, &random_salt())),
        Scheme::Sha1 => Ok(sha1_hash(password)),
        Scheme::Plain => Ok(password.to_string()),
    }
}

/// `{SHA}` + base64(SHA-1(password)).
pub fn sha1_hash(password: &str) -> String {
    let digest = Sha1::digest(password.as_bytes());
    format!("{SHA_PREFIX}{}", STANDARD.encode(digest))
}

/// Apache MD5-crypt of `password` with `salt` (at most 8 characters used).
pub fn apr1_crypt(password: &str, salt: &str) -> String {
    let pw = password.as_bytes();
    let salt = truncate_salt(salt);
    let salt_bytes = salt.as_bytes();

    let mut ctx = Md5::new();
    ctx.update(pw);
    ctx.update(APR1_MAGIC.as_bytes());
    ctx.update(salt_bytes);

    let alt = {
        let mut alt = Md5::new();
        alt.update(pw);
        alt.update(salt_bytes);
        alt.update(pw);
        alt.finalize()
    };

    let mut remaining = pw.len();
    while remaining > 0 {
        let n = remaining.min(16);
        ctx.update(&alt[..n]);
        remaining -= n;
    }

    let mut i = pw.len();
    while i > 0 {
        if i & 1 == 1 {
            ctx.update([0u8]);
        } else {
            ctx.update(&pw[..1]);
        }
        i >>= 1;
    }

    let mut digest = ctx.finalize();

    for round in 0..1000 {
        let mut step = Md5::new();
        if round & 1 == 1 {
            step.update(pw);
        } else {
            step.update(digest.as_slice());
        }
        if round % 3 != 0 {
            step.update(salt_bytes);
        }
        if round % 7 != 0 {
            step.update(pw);
        }
        if round & 1 == 1 {
            step.update(digest.as_slice());
        } else {
            step.update(pw);
        }
        digest = step.finalize();
    }

    let d = digest.as_slice();
    let mut out = String::with_capacity(APR1_MAGIC.len() + salt.len() + 1 + 22);
    out.push_str(APR1_MAGIC);
    out.push_str(salt);
    out.push('$');
    for (a, b, c) in [(0, 6, 12), (1, 7, 13), (2, 8, 14), (3, 9, 15), (4, 10, 5)] {
        let v = (u32::from(d[a]) << 16) | (u32::from(d[b]) << 8) | u32::from(d[c]);
        push_itoa64(&mut out, v, 4);
    }
    push_itoa64(&mut out, u32::from(d[11]), 2);
    out
}

fn push_itoa64(out: &mut String, mut v: u32, n: usize) {
    for _ in 0..n {
        out.push(char::from(ITOA64[(v & 0x3f) as usize]));
        v >>= 6;
    }
}

fn truncate_salt(salt: &str) -> &str {
    let salt = salt.split('$').next().unwrap_or_default();
    match salt.char_indices().nth(8) {
        Some((idx, _)) => &salt[..idx],
        None => salt,
    }
}

/// Salt portion of a `$apr1$salt$digest` string.
fn split_apr1_salt(stored: &str) -> Option<&str> {
    let rest = stored.strip_prefix(APR1_MAGIC)?;
    let (salt, digest) = rest.split_once('$')?;
    (!digest.is_empty()).then_some(salt)
}

fn random_salt() -> String {
    let mut rng = rand::thread_rng();
    (0..8)
        .map(|_| char::from(ITOA64[rng.gen_range(0..ITOA64.len())]))
        .collect()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    // Vectors from the Apache httpd password format documentation.
    const APR1_VECTOR: &str = "$apr1$r31.....$HqJZimcKQFAMYayBlzkrA/";
    const SHA_VECTOR: &str = "{SHA}VBPuJHI7uixaa6LQGWx4s+5GKNE=";
    // crypt(3) of "wonderland" with salt "ab".
    const DES_VECTOR: &str = "abbIw0V4oaGvc";

    #[test]
    fn detect_schemes() {
        assert_eq!(Scheme::detect("$2y$10$abc"), Scheme::Bcrypt);
        assert_eq!(Scheme::detect("$2b$04$abc"), Scheme::Bcrypt);
        assert_eq!(Scheme::detect(APR1_VECTOR), Scheme::Apr1);
        assert_eq!(Scheme::detect(SHA_VECTOR), Scheme::Sha1);
        assert_eq!(Scheme::detect("wonderland"), Scheme::Plain);
    }

    #[test]
    fn apr1_matches_apache_vector() {
        assert_eq!(apr1_crypt("myPassword", "r31....."), APR1_VECTOR);
        assert!(verify_hash("myPassword", APR1_VECTOR));
        assert!(!verify_hash("mypassword", APR1_VECTOR));
    }

    #[test]
    fn sha_matches_apache_vector() {
        assert_eq!(sha1_hash("myPassword"), SHA_VECTOR);
        assert!(verify_hash("myPassword", SHA_VECTOR));
        assert!(!verify_hash("other", SHA_VECTOR));
    }

    #[test]
    fn bcrypt_round_trip() {
        let hash = hash_password("wonderland", Scheme::Bcrypt, 4).unwrap();
        assert_eq!(Scheme::detect(&hash), Scheme::Bcrypt);
        assert!(verify_hash("wonderland", &hash));
        assert!(!verify_hash("bad", &hash));
    }

    #[test]
    fn generated_apr1_verifies() {
        let hash = hash_password("s3cret", Scheme::Apr1, 0).unwrap();
        assert!(hash.starts_with(APR1_MAGIC));
        assert!(verify_hash("s3cret", &hash));
    }

    #[test]
    fn plaintext_compares_exactly() {
        assert!(verify_hash("wonderland", "wonderland"));
        assert!(!verify_hash("wonderlan", "wonderland"));
        assert!(!verify_hash("", "wonderland"));
    }

    #[test]
    fn des_crypt_is_tried_after_plaintext() {
        assert_eq!(Scheme::detect(DES_VECTOR), Scheme::Plain);
        assert!(verify_hash("wonderland", DES_VECTOR));
        assert!(!verify_hash("alice", DES_VECTOR));
        // The literal text still matches as plaintext.
        assert!(verify_hash(DES_VECTOR, DES_VECTOR));

        let hash = pwhash::unix_crypt::hash_with("ab", "wonderland").unwrap();
        assert_eq!(hash, DES_VECTOR);
    }

    #[test]
    fn crypt_shape_requires_length_and_alphabet() {
        assert!(is_des_crypt("abJnggxhB/yWI"));
        assert!(!is_des_crypt("abJnggxhB/yW"));
        assert!(!is_des_crypt("abJnggxhB/yW!"));
        assert!(!verify_hash("x", "wonderland123"));
    }

    #[test]
    fn corrupt_hashes_never_match() {
        assert!(!verify_hash("x", "$2y$10$not-a-real-bcrypt-hash"));
        assert!(!verify_hash("x", "$apr1$nodigest"));
        assert!(!verify_hash("x", "{SHA}%%%"));
    }
}
