/// Translation progress counters
use crate::catalog::{Catalogue, Context, Message, TranslationStatus};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Counts {
    pub messages: usize,
    pub finished: usize,
    /// Unfinished with some text already entered
    pub unfinished_with_text: usize,
    pub untranslated: usize,
    pub obsolete: usize,
    pub vanished: usize,
    pub numerus: usize,
}

impl Counts {
    fn add(&mut self, message: &Message) {
        self.messages += 1;
        if message.numerus {
            self.numerus += 1;
        }
        match message.status {
            TranslationStatus::Finished => self.finished += 1,
            TranslationStatus::Unfinished if message.translation.is_empty() => self.untranslated += 1,
            TranslationStatus::Unfinished => self.unfinished_with_text += 1,
            TranslationStatus::Obsolete => self.obsolete += 1,
            TranslationStatus::Vanished => self.vanished += 1,
        }
    }

    fn absorb(&mut self, other: &Counts) {
        self.messages += other.messages;
        self.finished += other.finished;
        self.unfinished_with_text += other.unfinished_with_text;
        self.untranslated += other.untranslated;
        self.obsolete += other.obsolete;
        self.vanished += other.vanished;
        self.numerus += other.numerus;
    }

    /// Finished, unfinished and untranslated
    pub fn live(&self) -> usize {
        self.finished + self.unfinished_with_text + self.untranslated
    }

    pub fn unfinished(&self) -> usize {
        self.unfinished_with_text + self.untranslated
    }

    /// Finished share of live messages, 1.0 for an empty set
    pub fn completion(&self) -> f64 {
        match self.live() {
            0 => 1.0,
            live => self.finished as f64 / live as f64,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContextStats {
    pub name: String,
    #[serde(flatten)]
    pub counts: Counts,
    pub completion: f64,
}

impl ContextStats {
    fn from_context(context: &Context) -> Self {
        let mut counts = Counts::default();
        for message in &context.messages {
            counts.add(message);
        }
        Self {
            name: context.name.as_str().to_string(),
            completion: counts.completion(),
            counts,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(flatten)]
    pub totals: Counts,
    pub completion: f64,
    pub contexts: Vec<ContextStats>,
}

impl CatalogueStats {
    pub fn from_catalogue(catalogue: &Catalogue) -> Self {
        let contexts: Vec<ContextStats> = catalogue
            .contexts
            .iter()
            .map(ContextStats::from_context)
            .collect();
        let mut totals = Counts::default();
        for context in &contexts {
            totals.absorb(&context.counts);
        }
        Self {
            language: catalogue.language.clone(),
            completion: totals.completion(),
            totals,
            contexts,
        }
    }

    /// Messages a release would contain, lrelease counting
    pub fn generated(&self) -> usize {
        self.totals.finished + self.totals.unfinished_with_text
    }

    /// lrelease style summary
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Generated {} translation(s) ({} finished and {} unfinished)",
            self.generated(),
            self.totals.finished,
            self.totals.unfinished_with_text
        );
        if self.totals.untranslated > 0 {
            out.push_str(&format!(
                "\nIgnored {} untranslated source text(s)",
                self.totals.untranslated
            ));
        }
        out
    }
}

impl fmt::Display for CatalogueStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {}/{} finished ({:.1}%)",
            self.language.as_deref().unwrap_or("catalogue"),
            self.totals.finished,
            self.totals.live(),
            self.completion * 100.0
        )?;
        for context in &self.contexts {
            writeln!(
                f,
                "  {:<40} {:>4}/{:<4} {:>5.1}%",
                context.name,
                context.counts.finished,
                context.counts.live(),
                context.completion * 100.0
            )?;
        }
        if self.totals.obsolete + self.totals.vanished > 0 {
            writeln!(
                f,
                "{} obsolete message(s) kept",
                self.totals.obsolete + self.totals.vanished
            )?;
        }
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Translation, XmlText};

    fn catalogue() -> Catalogue {
        let mut catalogue = Catalogue::new(Some("pt_PT".into()), Some("en_US".into()));
        let cpu = catalogue.context_or_insert("ConfigureCpu");
        let mut accuracy = Message::new("Accuracy:");
        accuracy.set_translation("Precisão:");
        cpu.push(accuracy);
        cpu.push(Message::new("CPU"));
        let mut draft = Message::new("Auto");
        draft.translation = Translation::Single(XmlText::new("Automático"));
        cpu.push(draft);

        let main = catalogue.context_or_insert("GMainWindow");
        let mut remaining = Message::new("%n file(s) remaining");
        remaining.numerus = true;
        remaining.set_numerus_forms(["%n ficheiro", "%n ficheiros"]);
        main.push(remaining);
        let mut gone = Message::new("Exit");
        gone.set_translation("Sair");
        gone.status = TranslationStatus::Vanished;
        main.push(gone);
        catalogue
    }

    #[test]
    fn counts_per_status() {
        let stats = CatalogueStats::from_catalogue(&catalogue());
        assert_eq!(stats.totals.messages, 5);
        assert_eq!(stats.totals.finished, 2);
        assert_eq!(stats.totals.unfinished_with_text, 1);
        assert_eq!(stats.totals.untranslated, 1);
        assert_eq!(stats.totals.vanished, 1);
        assert_eq!(stats.totals.numerus, 1);
        assert_eq!(stats.totals.live(), 4);
        assert!((stats.completion - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn per_context_completion() {
        let stats = CatalogueStats::from_catalogue(&catalogue());
        assert_eq!(stats.contexts.len(), 2);
        assert_eq!(stats.contexts[0].name, "ConfigureCpu");
        assert!((stats.contexts[0].completion - 1.0 / 3.0).abs() < 1e-9);
        assert!((stats.contexts[1].completion - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_matches_lrelease() {
        let stats = CatalogueStats::from_catalogue(&catalogue());
        assert_eq!(
            stats.summary(),
            "Generated 3 translation(s) (2 finished and 1 unfinished)\nIgnored 1 untranslated source text(s)"
        );
    }

    #[test]
    fn empty_catalogue_is_complete() {
        let stats = CatalogueStats::from_catalogue(&Catalogue::default());
        assert_eq!(stats.completion, 1.0);
        assert_eq!(stats.summary(), "Generated 0 translation(s) (0 finished and 0 unfinished)");
    }

    #[test]
    fn serializes_flat_counts() {
        let stats = CatalogueStats::from_catalogue(&catalogue());
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["language"], "pt_PT");
        assert_eq!(value["finished"], 2);
        assert_eq!(value["contexts"][1]["name"], "GMainWindow");
        assert_eq!(value["contexts"][1]["vanished"], 1);
    }
}
