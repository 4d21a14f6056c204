/// Merging a fresh extraction into an existing catalogue
///
/// Translations move forward by (context, source, comment). Messages that
/// disappeared upstream are kept as vanished so translator work survives
/// until the string comes back or the catalogue is pruned.
use crate::catalog::{Catalogue, Context, Message, MessageKey, Translation, TranslationStatus};
use crate::plural::PluralRule;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MergeOptions {
    /// Remove messages that no longer exist upstream instead of keeping them
    pub drop_obsolete: bool,
    /// Reuse finished translations of identical source text from other contexts
    pub same_text: bool,
    /// Reuse translations of slightly changed source text in the same context
    pub similar_text: bool,
    /// Minimum bigram similarity for the similar-text heuristic, 0.0..=1.0
    pub similarity_threshold: f64,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            drop_obsolete: false,
            same_text: true,
            similar_text: true,
            similarity_threshold: 0.8,
        }
    }
}

/// What a merge did
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// Messages in the extraction
    pub found: usize,
    pub new: usize,
    pub existing: usize,
    pub same_text: usize,
    pub similar_text: usize,
    /// Live messages that became vanished in this pass
    pub vanished: usize,
    /// Obsolete or vanished messages carried over unchanged
    pub kept_obsolete: usize,
    pub dropped: usize,
    /// Obsolete messages whose source text came back
    pub reinstated: usize,
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Found {} source text(s) ({} new and {} already existing)",
            self.found, self.new, self.existing
        )?;
        if self.dropped > 0 {
            write!(f, "\n    Removed {} obsolete entries", self.dropped)?;
        }
        let kept = self.vanished + self.kept_obsolete;
        if kept > 0 {
            write!(f, "\n    Kept {kept} obsolete entries")?;
        }
        if self.reinstated > 0 {
            write!(f, "\n    Reinstated {} obsolete entries", self.reinstated)?;
        }
        if self.same_text > 0 {
            write!(f, "\n    Same-text heuristic provided {} translation(s)", self.same_text)?;
        }
        if self.similar_text > 0 {
            write!(
                f,
                "\n    Similar-text heuristic provided {} translation(s)",
                self.similar_text
            )?;
        }
        Ok(())
    }
}

/// Dice coefficient over lowercase character bigrams
pub fn similarity(a: &str, b: &str) -> f64 {
    fn bigrams(text: &str) -> Vec<(char, char)> {
        let chars: Vec<char> = text.to_lowercase().chars().collect();
        chars.windows(2).map(|w| (w[0], w[1])).collect()
    }

    if a == b {
        return 1.0;
    }
    let left = bigrams(a);
    let mut right = bigrams(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let total = left.len() + right.len();
    let mut shared = 0;
    for pair in &left {
        if let Some(pos) = right.iter().position(|p| p == pair) {
            right.swap_remove(pos);
            shared += 1;
        }
    }
    (2 * shared) as f64 / total as f64
}

fn empty_translation(numerus: bool, rule: PluralRule) -> Translation {
    if numerus {
        Translation::empty_numerus(rule.form_count())
    } else {
        Translation::default()
    }
}

struct Merger<'a> {
    existing: &'a Catalogue,
    options: &'a MergeOptions,
    rule: PluralRule,
    /// Finished translations by (source, numerus), first occurrence wins
    same_text: HashMap<(&'a str, bool), &'a Message>,
    report: MergeReport,
}

impl<'a> Merger<'a> {
    fn new(existing: &'a Catalogue, extracted: &Catalogue, options: &'a MergeOptions) -> Self {
        let rule = existing
            .language
            .as_deref()
            .or(extracted.language.as_deref())
            .map(PluralRule::for_language)
            .unwrap_or(PluralRule::English);

        let mut same_text = HashMap::new();
        for (_, message) in existing.messages() {
            if message.is_translated() {
                same_text
                    .entry((message.source.as_str(), message.numerus))
                    .or_insert(message);
            }
        }

        Self {
            existing,
            options,
            rule,
            same_text,
            report: MergeReport::default(),
        }
    }

    fn merge_context(&mut self, extracted: &Context) -> Context {
        let old = self.existing.context(extracted.name.as_str());
        let mut merged = Context {
            name: old.map_or_else(|| extracted.name.clone(), |c| c.name.clone()),
            comment: old
                .and_then(|c| c.comment.clone())
                .or_else(|| extracted.comment.clone()),
            messages: Vec::with_capacity(extracted.messages.len()),
        };

        let old_messages: &[Message] = old.map_or(&[], |c| c.messages.as_slice());
        let mut used = vec![false; old_messages.len()];
        let extracted_keys: HashSet<_> = extracted.messages.iter().map(Message::key).collect();

        for incoming in &extracted.messages {
            self.report.found += 1;
            let matched = old_messages
                .iter()
                .position(|m| m.matches(incoming.source.as_str(), incoming.comment_str()));

            let message = match matched {
                Some(index) => {
                    used[index] = true;
                    self.report.existing += 1;
                    self.refresh(&old_messages[index], incoming)
                }
                None => {
                    self.report.new += 1;
                    self.introduce(incoming, old_messages, &extracted_keys, &mut used)
                }
            };
            merged.push(message);
        }

        for (index, message) in old_messages.iter().enumerate() {
            if !used[index] {
                if let Some(message) = self.retire(message) {
                    merged.push(message);
                }
            }
        }
        merged
    }

    /// Existing message whose key is still extracted
    fn refresh(&mut self, old: &Message, incoming: &Message) -> Message {
        let mut message = old.clone();
        message.locations = incoming.locations.clone();
        message.extra_comment = incoming.extra_comment.clone();
        if incoming.id.is_some() {
            message.id = incoming.id.clone();
        }
        if !old.is_live() {
            message.status = TranslationStatus::Unfinished;
            self.report.reinstated += 1;
        }
        if old.numerus != incoming.numerus || !old.has_consistent_shape() {
            message.translation = empty_translation(incoming.numerus, self.rule);
            message.status = TranslationStatus::Unfinished;
        }
        message.numerus = incoming.numerus;
        message
    }

    /// Message not present before; try the heuristics
    fn introduce(
        &mut self,
        incoming: &Message,
        old_messages: &[Message],
        extracted_keys: &HashSet<MessageKey>,
        used: &mut [bool],
    ) -> Message {
        let mut message = incoming.clone();
        message.status = TranslationStatus::Unfinished;
        message.old_source = None;
        message.old_comment = None;
        message.translation = empty_translation(incoming.numerus, self.rule);

        if self.options.similar_text {
            let mut best: Option<(usize, f64)> = None;
            for (index, candidate) in old_messages.iter().enumerate() {
                if used[index]
                    || candidate.numerus != incoming.numerus
                    || candidate.comment_str() != incoming.comment_str()
                    || candidate.translation.is_empty()
                    || extracted_keys.contains(&candidate.key())
                {
                    continue;
                }
                let score = similarity(candidate.source.as_str(), incoming.source.as_str());
                if score >= self.options.similarity_threshold
                    && best.map_or(true, |(_, top)| score > top)
                {
                    best = Some((index, score));
                }
            }
            if let Some((index, score)) = best {
                let candidate = &old_messages[index];
                log::debug!(
                    "similar text {:.2}: \"{}\" -> \"{}\"",
                    score,
                    candidate.source,
                    incoming.source
                );
                used[index] = true;
                message.translation = candidate.translation.clone();
                message.translator_comment = candidate.translator_comment.clone();
                message.old_source = Some(candidate.source.clone());
                self.report.similar_text += 1;
                return message;
            }
        }

        if self.options.same_text {
            if let Some(donor) = self
                .same_text
                .get(&(incoming.source.as_str(), incoming.numerus))
            {
                message.translation = donor.translation.clone();
                self.report.same_text += 1;
            }
        }
        message
    }

    /// Existing message no longer extracted
    fn retire(&mut self, old: &Message) -> Option<Message> {
        if old.is_live() && old.translation.is_empty() {
            self.report.dropped += 1;
            return None;
        }
        if self.options.drop_obsolete {
            self.report.dropped += 1;
            return None;
        }
        let mut message = old.clone();
        if old.is_live() {
            message.status = TranslationStatus::Vanished;
            message.locations.clear();
            self.report.vanished += 1;
        } else {
            self.report.kept_obsolete += 1;
        }
        Some(message)
    }
}

/// Merge `extracted` into `existing`.
///
/// The result follows the extraction's order. Messages that are no longer
/// extracted trail their context, and contexts that only hold such
/// messages trail the catalogue.
pub fn merge(
    existing: &Catalogue,
    extracted: &Catalogue,
    options: &MergeOptions,
) -> (Catalogue, MergeReport) {
    let mut merger = Merger::new(existing, extracted, options);

    let mut contexts = Vec::with_capacity(extracted.contexts.len());
    for context in &extracted.contexts {
        contexts.push(merger.merge_context(context));
    }

    for old in &existing.contexts {
        if extracted.context(old.name.as_str()).is_some() {
            continue;
        }
        let mut retired = Context {
            name: old.name.clone(),
            comment: old.comment.clone(),
            messages: Vec::new(),
        };
        for message in &old.messages {
            if let Some(message) = merger.retire(message) {
                retired.push(message);
            }
        }
        if !retired.messages.is_empty() {
            contexts.push(retired);
        }
    }

    let report = merger.report;
    log::info!("{report}");
    if report.dropped > 0 {
        log::warn!("dropped {} message(s) no longer in the source tree", report.dropped);
    }

    let merged = Catalogue {
        version: existing.version.clone().or_else(|| extracted.version.clone()),
        language: existing.language.clone().or_else(|| extracted.language.clone()),
        source_language: existing
            .source_language
            .clone()
            .or_else(|| extracted.source_language.clone()),
        contexts,
        layout: existing.layout.clone(),
    };
    (merged, report)
}

/// Extraction-shaped copy of the live messages, without translations
pub fn extraction_of(catalogue: &Catalogue) -> Catalogue {
    let mut extraction = Catalogue::new(
        catalogue.language.clone(),
        catalogue.source_language.clone(),
    );
    for context in &catalogue.contexts {
        let live: Vec<Message> = context
            .messages
            .iter()
            .filter(|m| m.is_live())
            .map(|m| Message {
                id: m.id.clone(),
                numerus: m.numerus,
                locations: m.locations.clone(),
                source: m.source.clone(),
                comment: m.comment.clone(),
                extra_comment: m.extra_comment.clone(),
                ..Message::new("")
            })
            .collect();
        if !live.is_empty() {
            extraction.contexts.push(Context {
                name: context.name.clone(),
                comment: context.comment.clone(),
                messages: live,
            });
        }
    }
    extraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Location, XmlText};

    fn existing() -> Catalogue {
        let mut catalogue = Catalogue::new(Some("pt_PT".into()), Some("en_US".into()));
        let context = catalogue.context_or_insert("ConfigureCpu");

        let mut accuracy = Message::new("Accuracy:").with_location(Location::new("configure_cpu.ui", 20));
        accuracy.set_translation("Precisão:");
        context.push(accuracy);

        context.push(Message::new("CPU").with_location(Location::new("configure_cpu.ui", 14)));

        let mut unsafe_opts = Message::new("Unsafe CPU Optimization Settings")
            .with_location(Location::new("configure_cpu.ui", 60));
        unsafe_opts.set_translation("Definições de otimização de CPU inseguras");
        context.push(unsafe_opts);

        let mut old = Message::new("Paranoid");
        old.set_translation("Paranóico");
        old.status = TranslationStatus::Vanished;
        context.push(old);

        let dialog = catalogue.context_or_insert("AboutDialog");
        let mut about = Message::new("About yuzu");
        about.set_translation("Sobre o yuzu");
        dialog.push(about);

        catalogue
    }

    fn extraction(sources: &[(&str, &str)]) -> Catalogue {
        let mut catalogue = Catalogue::new(None, Some("en_US".into()));
        for (context, source) in sources {
            catalogue
                .context_or_insert(context)
                .push(Message::new(*source).with_location(Location::new("src.cpp", 1)));
        }
        catalogue
    }

    #[test]
    fn same_extraction_is_idempotent() {
        let existing = existing();
        let (merged, report) = merge(&existing, &extraction_of(&existing), &MergeOptions::default());

        for (context, message) in existing.messages() {
            let after = merged
                .find_message(context, message.source.as_str(), message.comment_str())
                .unwrap();
            assert_eq!(after.translation, message.translation);
            assert_eq!(after.status, message.status);
        }
        assert_eq!(merged, existing);
        assert_eq!(report.new, 0);
        assert_eq!(report.existing, 4);
        assert_eq!(report.kept_obsolete, 1);
    }

    #[test]
    fn refreshes_locations_from_extraction() {
        let existing = existing();
        let mut extracted = extraction_of(&existing);
        extracted.contexts[0].messages[0].locations = vec![Location::new("configure_cpu.ui", 33)];

        let (merged, _) = merge(&existing, &extracted, &MergeOptions::default());
        let accuracy = merged.find_message("ConfigureCpu", "Accuracy:", "").unwrap();
        assert_eq!(accuracy.locations, vec![Location::new("configure_cpu.ui", 33)]);
        assert_eq!(accuracy.translation_text(), Some("Precisão:"));
    }

    #[test]
    fn missing_messages_vanish_or_drop() {
        let extracted = extraction(&[("ConfigureCpu", "Accuracy:")]);
        let (merged, report) = merge(&existing(), &extracted, &MergeOptions::default());

        let context = merged.context("ConfigureCpu").unwrap();
        // untranslated "CPU" is dropped, translated ones are kept as vanished
        assert!(context.find("CPU", "").is_none());
        let unsafe_opts = context.find("Unsafe CPU Optimization Settings", "").unwrap();
        assert_eq!(unsafe_opts.status, TranslationStatus::Vanished);
        assert!(unsafe_opts.locations.is_empty());

        let about = merged.find_message("AboutDialog", "About yuzu", "").unwrap();
        assert_eq!(about.status, TranslationStatus::Vanished);
        assert_eq!(merged.contexts.last().unwrap().name.as_str(), "AboutDialog");

        assert_eq!(report.vanished, 2);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.kept_obsolete, 1);
    }

    #[test]
    fn drop_obsolete_removes_everything_gone() {
        let options = MergeOptions {
            drop_obsolete: true,
            ..MergeOptions::default()
        };
        let extracted = extraction(&[("ConfigureCpu", "Accuracy:")]);
        let (merged, report) = merge(&existing(), &extracted, &options);
        assert_eq!(merged.message_count(), 1);
        assert!(merged.context("AboutDialog").is_none());
        assert_eq!(report.dropped, 4);
    }

    #[test]
    fn reappearing_message_is_reinstated_as_unfinished() {
        let extracted = extraction(&[("ConfigureCpu", "Paranoid")]);
        let (merged, report) = merge(&existing(), &extracted, &MergeOptions::default());
        let paranoid = merged.find_message("ConfigureCpu", "Paranoid", "").unwrap();
        assert_eq!(paranoid.status, TranslationStatus::Unfinished);
        assert_eq!(paranoid.translation_text(), Some("Paranóico"));
        assert_eq!(report.reinstated, 1);
    }

    #[test]
    fn similar_text_reuses_translation() {
        let extracted = extraction(&[
            ("ConfigureCpu", "Accuracy:"),
            ("ConfigureCpu", "Unsafe CPU Optimisation Settings"),
        ]);
        let (merged, report) = merge(&existing(), &extracted, &MergeOptions::default());

        let message = merged
            .find_message("ConfigureCpu", "Unsafe CPU Optimisation Settings", "")
            .unwrap();
        assert_eq!(message.status, TranslationStatus::Unfinished);
        assert_eq!(
            message.translation_text(),
            Some("Definições de otimização de CPU inseguras")
        );
        assert_eq!(
            message.old_source.as_ref().map(XmlText::as_str),
            Some("Unsafe CPU Optimization Settings")
        );
        assert!(merged
            .find_message("ConfigureCpu", "Unsafe CPU Optimization Settings", "")
            .is_none());
        assert_eq!(report.similar_text, 1);
    }

    #[test]
    fn same_text_copies_across_contexts() {
        let extracted = extraction(&[("ConfigureCpu", "Accuracy:"), ("ConfigureGraphics", "Accuracy:")]);
        let (merged, report) = merge(&existing(), &extracted, &MergeOptions::default());

        let copy = merged.find_message("ConfigureGraphics", "Accuracy:", "").unwrap();
        assert_eq!(copy.translation_text(), Some("Precisão:"));
        assert_eq!(copy.status, TranslationStatus::Unfinished);
        assert_eq!(report.same_text, 1);

        let off = MergeOptions {
            same_text: false,
            ..MergeOptions::default()
        };
        let (merged, _) = merge(&existing(), &extracted, &off);
        let copy = merged.find_message("ConfigureGraphics", "Accuracy:", "").unwrap();
        assert_eq!(copy.translation_text(), Some(""));
    }

    #[test]
    fn new_numerus_message_gets_one_slot_per_form() {
        let mut extracted = extraction(&[]);
        let mut remaining = Message::new("%n file(s) remaining");
        remaining.numerus = true;
        extracted.context_or_insert("GMainWindow").push(remaining);

        let mut russian = Catalogue::new(Some("ru".into()), None);
        russian.context_or_insert("GMainWindow");
        let (merged, _) = merge(&russian, &extracted, &MergeOptions::default());
        let message = merged.find_message("GMainWindow", "%n file(s) remaining", "").unwrap();
        assert_eq!(message.numerus_forms().len(), 3);
        assert_eq!(message.status, TranslationStatus::Unfinished);
    }

    #[test]
    fn report_reads_like_lupdate() {
        let report = MergeReport {
            found: 40,
            new: 2,
            existing: 38,
            vanished: 3,
            same_text: 1,
            ..MergeReport::default()
        };
        assert_eq!(
            report.to_string(),
            "Found 40 source text(s) (2 new and 38 already existing)\n    Kept 3 obsolete entries\n    Same-text heuristic provided 1 translation(s)"
        );
    }

    #[test]
    fn similarity_bounds() {
        assert_eq!(similarity("Cancel", "Cancel"), 1.0);
        assert_eq!(similarity("a", "b"), 0.0);
        assert!(similarity("Optimization", "Optimisation") > 0.7);
        assert!(similarity("Pause", "Fullscreen") < 0.3);
    }
}
