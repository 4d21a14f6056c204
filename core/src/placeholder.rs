/// Positional placeholders (`%1`..`%99`, `%L1`) and the count marker `%n`
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::BTreeSet;

static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%(L?)(n|\d{1,2})").expect("valid placeholder regex"));

/// Placeholders found in one text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderSet {
    /// Numbers of the positional tokens, `%L2` counts as 2
    pub numbered: BTreeSet<u8>,
    /// `%n` or `%Ln` present
    pub has_count: bool,
}

impl PlaceholderSet {
    pub fn from_text(text: &str) -> Self {
        let mut set = Self::default();
        for caps in PLACEHOLDER_REGEX.captures_iter(text) {
            match &caps[2] {
                "n" => set.has_count = true,
                digits => {
                    if let Ok(number) = digits.parse::<u8>() {
                        if number > 0 {
                            set.numbered.insert(number);
                        }
                    }
                }
            }
        }
        set
    }

    /// Same positional tokens, order ignored
    pub fn same_numbered(&self, other: &PlaceholderSet) -> bool {
        self.numbered == other.numbered
    }

    /// Tokens of `self` absent from `other`
    pub fn missing_from(&self, other: &PlaceholderSet) -> Vec<u8> {
        self.numbered.difference(&other.numbered).copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.numbered.is_empty() && !self.has_count
    }
}

/// Render tokens as `%1, %3` for messages
pub fn describe(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("%{n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Substitute `%1`..`%N` with `args` in one pass.
/// Tokens without a matching argument stay in place.
pub fn arg(text: &str, args: &[&str]) -> String {
    PLACEHOLDER_REGEX
        .replace_all(text, |caps: &Captures| {
            let replacement = caps[2]
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .and_then(|n| args.get(n - 1));
            match replacement {
                Some(value) => (*value).to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Replace `%n` and `%Ln` with the quantity
pub fn replace_count(text: &str, n: i64) -> String {
    PLACEHOLDER_REGEX
        .replace_all(text, |caps: &Captures| {
            if &caps[2] == "n" {
                n.to_string()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_numbered_and_count_tokens() {
        let set = PlaceholderSet::from_text("%1 of %n result(s)");
        assert_eq!(set.numbered.iter().copied().collect::<Vec<_>>(), vec![1]);
        assert!(set.has_count);

        let volume = PlaceholderSet::from_text("%1%");
        assert_eq!(volume.numbered.len(), 1);
        assert!(!volume.has_count);

        assert!(PlaceholderSet::from_text("100% done").is_empty());
    }

    #[test]
    fn localized_tokens_count_as_numbered() {
        let set = PlaceholderSet::from_text("%L1 MB of %L2 MB");
        assert_eq!(set.numbered.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn reordering_is_allowed() {
        let source = PlaceholderSet::from_text("%1 is the profile username, %2 is the UUID");
        let translated = PlaceholderSet::from_text("%2 é o UUID de %1");
        assert!(source.same_numbered(&translated));
    }

    #[test]
    fn reports_missing_tokens() {
        let source = PlaceholderSet::from_text("Installing file \"%1\" (%2)...");
        let translated = PlaceholderSet::from_text("A instalar \"%1\"...");
        assert!(!source.same_numbered(&translated));
        assert_eq!(source.missing_from(&translated), vec![2]);
        assert_eq!(describe(&source.missing_from(&translated)), "%2");
    }

    #[test]
    fn substitutes_positional_arguments() {
        assert_eq!(arg("%2 (%1)", &["yuzu", "1.0"]), "1.0 (yuzu)");
        assert_eq!(arg("%1 of %n result(s), %3", &["5"]), "5 of %n result(s), %3");
        assert_eq!(arg("%1%", &["50"]), "50%");
    }

    #[test]
    fn substitutes_count() {
        assert_eq!(replace_count("%n file(s) remaining", 3), "3 file(s) remaining");
        assert_eq!(replace_count("%1 of %Ln result(s)", 12), "%1 of 12 result(s)");
    }
}
