use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

/// Generate a random alphanumeric token of the given length.
///
/// Characters are drawn uniformly from `[0-9A-Za-z]` using the operating
/// system's CSPRNG. Suitable for one-time reset tokens and generated
/// initial passwords; callers hash the value before persisting it.
pub fn alphanumeric_token(length: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
