use sha2::Digest;
use sha2::Sha256;

/* this salt string is appended to the normalized email before hashing so the
 * generated user id is unique to timeshift and cannot be reverse-engineered
 * from the email alone. The identity service derives user ids with the same
 * salt, so every deployment of this pipeline must keep it byte-identical. */
const TIMESHIFT_SALT: &str = "timeshiftMEDIA@@@@@@@@@@@@@@@@@@@@@@@@@";

/// Derive the canonical timeshift user id for an email address.
///
/// The email is trimmed and lowercased, hashed together with the salt, and
/// the first 32 hex characters of the digest are grouped 8-4-4-4-12. The
/// same email always yields the same id, across deployments and stages.
pub fn generate_user_id(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let digest = Sha256::digest(format!("{normalized}{TIMESHIFT_SALT}"));
    let hash = hex::encode(digest);
    format!(
        "{}-{}-{}-{}-{}",
        &hash[0..8],
        &hash[8..12],
        &hash[12..16],
        &hash[16..20],
        &hash[20..32]
    )
}
