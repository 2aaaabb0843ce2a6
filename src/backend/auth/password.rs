/**
 * Password Hashing
 *
 * bcrypt with a configurable cost; the salt is embedded in the digest.
 * A mismatch is `false`, never an error. A malformed stored digest is
 * logged and treated as a mismatch.
 */

pub fn hash_password(plaintext: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plaintext, cost)
}

pub fn verify_password(plaintext: &str, digest: &str) -> bool {
    match bcrypt::verify(plaintext, digest) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!("Stored password digest could not be verified: {:?}", e);
            false
        }
    }
}
