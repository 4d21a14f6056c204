/// Runtime lookup of translations
///
/// Mirrors what the host application's translator does with a released
/// catalogue: exact match on context and source text, optional comment
/// disambiguation, and the source text as fallback.
use crate::catalog::{Catalogue, Translation, TranslationStatus};
use crate::placeholder::replace_count;
use crate::plural::PluralRule;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LookupOptions {
    /// Use non-empty translations still marked unfinished
    #[serde(default = "default_true")]
    pub include_unfinished: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            include_unfinished: true,
        }
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Single(String),
    Numerus(Vec<String>),
}

/// source text -> (comment, entry) candidates
type SourceTable = HashMap<String, Vec<(String, Entry)>>;

/// Immutable lookup table built from a catalogue
#[derive(Debug, Clone)]
pub struct Translator {
    language: Option<String>,
    rule: PluralRule,
    contexts: HashMap<String, SourceTable>,
    len: usize,
}

impl Translator {
    pub fn from_catalogue(catalogue: &Catalogue, options: &LookupOptions) -> Self {
        let rule = catalogue
            .language
            .as_deref()
            .map(PluralRule::for_language)
            .unwrap_or(PluralRule::English);

        let mut contexts: HashMap<String, SourceTable> = HashMap::new();
        let mut len = 0;
        for (context, message) in catalogue.messages() {
            if !message.is_live() {
                continue;
            }
            if message.status == TranslationStatus::Unfinished && !options.include_unfinished {
                continue;
            }
            let entry = match &message.translation {
                translation if translation.is_empty() => continue,
                Translation::Single(text) => Entry::Single(text.as_str().to_string()),
                Translation::Numerus(forms) => {
                    Entry::Numerus(forms.iter().map(|f| f.as_str().to_string()).collect())
                }
            };
            contexts
                .entry(context.to_string())
                .or_default()
                .entry(message.source.as_str().to_string())
                .or_default()
                .push((message.comment_str().to_string(), entry));
            len += 1;
        }

        log::debug!(
            "translator for {} holds {len} translations",
            catalogue.language.as_deref().unwrap_or("unknown language")
        );
        Self {
            language: catalogue.language.clone(),
            rule,
            contexts,
            len,
        }
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn plural_rule(&self) -> PluralRule {
        self.rule
    }

    /// Number of usable translations
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn find(&self, context: &str, source: &str, comment: Option<&str>) -> Option<&Entry> {
        let candidates = self.contexts.get(context)?.get(source)?;
        let comment = comment.unwrap_or("");
        candidates
            .iter()
            .find(|(c, _)| c == comment)
            .or_else(|| {
                // A disambiguated lookup may still hit the plain entry
                if comment.is_empty() {
                    None
                } else {
                    candidates.iter().find(|(c, _)| c.is_empty())
                }
            })
            .map(|(_, entry)| entry)
    }

    pub fn contains(&self, context: &str, source: &str, comment: Option<&str>) -> bool {
        self.find(context, source, comment).is_some()
    }

    /// Translation of `source`, or `source` itself when none is usable.
    /// Positional placeholders are returned untouched.
    pub fn translate<'s>(&'s self, context: &str, source: &'s str, comment: Option<&str>) -> &'s str {
        match self.find(context, source, comment) {
            Some(Entry::Single(text)) => text,
            Some(Entry::Numerus(forms)) => forms
                .first()
                .map(String::as_str)
                .filter(|form| !form.is_empty())
                .unwrap_or(source),
            None => source,
        }
    }

    /// Plural-aware lookup; `%n` is replaced with `n` in the result
    pub fn translate_plural(
        &self,
        context: &str,
        source: &str,
        comment: Option<&str>,
        n: i64,
    ) -> String {
        let text = match self.find(context, source, comment) {
            Some(Entry::Numerus(forms)) => forms
                .get(self.rule.form_index(n))
                .map(String::as_str)
                .filter(|form| !form.is_empty())
                .unwrap_or(source),
            Some(Entry::Single(text)) => text,
            None => source,
        };
        replace_count(text, n)
    }
}
