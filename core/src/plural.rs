/// Plural rules for numerus messages
/// Families and form order follow the numerus table Qt Linguist uses when it
/// creates `<numerusform>` slots, so indices line up with lupdate's files
use serde::Serialize;

/// A plural rule family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PluralRule {
    /// A single form for every quantity (Japanese, Chinese, Korean, ...).
    OneForm,
    /// Singular for exactly one.
    English,
    /// Singular for zero and one.
    French,
    /// Singular for 1, 21, 31... but not 11 (Icelandic).
    Icelandic,
    /// Singular (ends in 1, not 11) / plural / nullar.
    Latvian,
    /// One / two / other.
    Irish,
    /// One / 2-4 / other, modulo 100.
    Czech,
    /// One / ends in 2-4 outside the teens / other.
    Polish,
    /// One / zero or 2-19 modulo 100 / other.
    Romanian,
    /// Ends in 1 (not 11) / ends in 2-9 outside the teens / other.
    Lithuanian,
    /// Ends in 1 (not 11) / ends in 2-4 outside the teens / other.
    Russian,
    /// Ends in 01 / 02 / 03-04 / other, modulo 100.
    Slovenian,
    /// Ends in 1 / ends in 2 / other.
    Macedonian,
    /// One / zero or 2-10 / 11-19 / other, modulo 100.
    Maltese,
    /// Zero / one / 2-5 / six / other.
    Welsh,
    /// Zero / one / two / 3-10 / 11-99 / other, modulo 100.
    Arabic,
}

impl PluralRule {
    /// Rule for a language tag such as `pt_PT`, `pt-BR` or `zh_TW`.
    ///
    /// Unknown languages get the English rule.
    pub fn for_language(tag: &str) -> Self {
        let normalized = tag.replace('-', "_").to_lowercase();
        let mut parts = normalized.split('_');
        let language = parts.next().unwrap_or("");
        let territory = parts.next().unwrap_or("");

        match language {
            "ja" | "zh" | "ko" | "vi" | "th" | "id" | "ms" | "tr" | "hu" | "fa" | "my" | "bo"
            | "dz" | "jv" | "su" | "tt" | "yo" | "za" | "om" | "fj" | "gn" | "na" | "bi" => {
                Self::OneForm
            }
            "fr" | "br" | "oc" | "tl" | "fil" | "ti" | "ln" | "mg" | "wa" => Self::French,
            "pt" if territory == "br" => Self::French,
            "is" => Self::Icelandic,
            "lv" => Self::Latvian,
            "ga" => Self::Irish,
            "cs" | "sk" => Self::Czech,
            "pl" => Self::Polish,
            "ro" | "mo" => Self::Romanian,
            "lt" => Self::Lithuanian,
            "ru" | "uk" | "be" | "sr" | "hr" | "bs" => Self::Russian,
            "sl" => Self::Slovenian,
            "mk" => Self::Macedonian,
            "mt" => Self::Maltese,
            "cy" => Self::Welsh,
            "ar" => Self::Arabic,
            _ => Self::English,
        }
    }

    /// Number of `<numerusform>` slots a translation needs.
    pub fn form_count(self) -> usize {
        match self {
            Self::OneForm => 1,
            Self::English | Self::French | Self::Icelandic => 2,
            Self::Latvian
            | Self::Macedonian
            | Self::Irish
            | Self::Czech
            | Self::Polish
            | Self::Romanian
            | Self::Lithuanian
            | Self::Russian => 3,
            Self::Slovenian | Self::Maltese => 4,
            Self::Welsh => 5,
            Self::Arabic => 6,
        }
    }

    /// Index of the form used for quantity `n`.
    pub fn form_index(self, n: i64) -> usize {
        let n = n.unsigned_abs();
        let n10 = n % 10;
        let n100 = n % 100;
        let outside_teens = !(10..20).contains(&n100);

        match self {
            Self::OneForm => 0,
            Self::English => usize::from(n != 1),
            Self::French => usize::from(n > 1),
            Self::Icelandic => usize::from(n10 != 1 || n100 == 11),
            Self::Latvian => {
                if n10 == 1 && n100 != 11 {
                    0
                } else if n != 0 {
                    1
                } else {
                    2
                }
            }
            Self::Irish => match n {
                1 => 0,
                2 => 1,
                _ => 2,
            },
            Self::Czech => match n100 {
                1 => 0,
                2..=4 => 1,
                _ => 2,
            },
            Self::Polish => {
                if n == 1 {
                    0
                } else if (2..=4).contains(&n10) && outside_teens {
                    1
                } else {
                    2
                }
            }
            Self::Romanian => {
                if n == 1 {
                    0
                } else if n == 0 || (1..20).contains(&n100) {
                    1
                } else {
                    2
                }
            }
            Self::Lithuanian => {
                if n10 == 1 && n100 != 11 {
                    0
                } else if n10 >= 2 && outside_teens {
                    1
                } else {
                    2
                }
            }
            Self::Russian => {
                if n10 == 1 && n100 != 11 {
                    0
                } else if (2..=4).contains(&n10) && outside_teens {
                    1
                } else {
                    2
                }
            }
            Self::Slovenian => match n100 {
                1 => 0,
                2 => 1,
                3 | 4 => 2,
                _ => 3,
            },
            Self::Macedonian => match n10 {
                1 => 0,
                2 => 1,
                _ => 2,
            },
            Self::Maltese => {
                if n == 1 {
                    0
                } else if n == 0 || (1..=10).contains(&n100) {
                    1
                } else if (11..=19).contains(&n100) {
                    2
                } else {
                    3
                }
            }
            Self::Welsh => match n {
                0 => 0,
                1 => 1,
                2..=5 => 2,
                6 => 3,
                _ => 4,
            },
            Self::Arabic => match n {
                0 => 0,
                1 => 1,
                2 => 2,
                _ => match n100 {
                    3..=10 => 3,
                    11..=99 => 4,
                    _ => 5,
                },
            },
        }
    }
}
