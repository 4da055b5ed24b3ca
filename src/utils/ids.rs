use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of ids minted for users, sessions, agents and meetings.
pub const NANOID_LEN: usize = 21;

/// URL-safe random id in the same shape the session library issues.
pub fn nanoid() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(NANOID_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nanoid_is_alphanumeric_and_fixed_length() {
        let id = nanoid();
        assert_eq!(id.len(), NANOID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(id, nanoid());
    }
}
