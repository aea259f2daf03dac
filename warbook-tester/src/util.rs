/// Split a comma-separated CLI value into trimmed, non-empty tokens.
pub fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_blank_tokens() {
        assert_eq!(split_csv(" smoke, ,full-campaign,  "), vec!["smoke", "full-campaign"]);
        assert!(split_csv("").is_empty());
    }
}
