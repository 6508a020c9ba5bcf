/// Canonical form of a user prompt: trimmed and lower-cased
pub fn normalize_prompt(prompt: &str) -> String {
    prompt.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prompt() {
        assert_eq!(
            normalize_prompt("  Siapa Nasabah dengan SALDO terbanyak?\n"),
            "siapa nasabah dengan saldo terbanyak?"
        );
        assert_eq!(normalize_prompt(" \t "), "");
    }
}
