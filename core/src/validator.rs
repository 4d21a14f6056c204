/// Consistency checks between source text and translation
///
/// Same family of checks Qt Linguist runs in its phrase/validation panel:
/// placeholders, plural forms, accelerators and ending punctuation.
use crate::catalog::{Catalogue, Message, Translation, TranslationStatus};
use crate::placeholder::{describe, PlaceholderSet};
use crate::plural::PluralRule;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of finding
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    /// Same (source, comment) pair twice in a context
    DuplicateMessage,
    /// `numerus="yes"` without plural forms, or plural forms on a plain message
    NumerusShapeMismatch,
    /// Numbered `%N` tokens differ from the source
    PlaceholderMismatch,
    /// A plural form lacks `%n` although the source has it
    NumerusPlaceholderMissing,
    /// Plural form count differs from the target language
    NumerusFormCount,
    /// Marked finished but nothing translated
    EmptyFinished,
    /// `&X` keyboard accelerator present on one side only
    AcceleratorMismatch,
    /// Ending punctuation differs
    PunctuationMismatch,
}

impl IssueCode {
    pub fn default_severity(self) -> Severity {
        match self {
            Self::DuplicateMessage
            | Self::NumerusShapeMismatch
            | Self::PlaceholderMismatch
            | Self::NumerusFormCount => Severity::Error,
            Self::NumerusPlaceholderMissing
            | Self::EmptyFinished
            | Self::AcceleratorMismatch
            | Self::PunctuationMismatch => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatorOptions {
    pub check_placeholders: bool,
    pub check_numerus: bool,
    pub check_empty: bool,
    pub check_accelerators: bool,
    pub check_punctuation: bool,
    /// Report every warning as an error
    pub warnings_as_errors: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            check_placeholders: true,
            check_numerus: true,
            check_empty: true,
            check_accelerators: true,
            check_punctuation: true,
            warnings_as_errors: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub context: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub code: IssueCode,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{level}: {}: \"{}\"", self.context, self.source)?;
        if let Some(comment) = &self.comment {
            write!(f, " ({comment})")?;
        }
        write!(f, ": {}", self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Live messages inspected
    pub checked: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Warning).count()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn with_code(&self, code: IssueCode) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.code == code)
    }
}

/// `&X` marks an accelerator, `&&` is a literal ampersand
fn has_accelerator(text: &str) -> bool {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '&' {
            match chars.peek() {
                Some('&') => {
                    chars.next();
                }
                Some(next) if next.is_alphanumeric() => return true,
                _ => {}
            }
        }
    }
    false
}

fn ending_punctuation(text: &str) -> Option<char> {
    let last = text.trim_end().chars().last()?;
    match last {
        '.' | '。' | '．' => Some('.'),
        ':' | '：' => Some(':'),
        '?' | '？' => Some('?'),
        '!' | '！' => Some('!'),
        '…' => Some('…'),
        _ => None,
    }
}

/// Equivalent endings: "..." and "…" are both an ellipsis
fn normalized_ending(text: &str) -> Option<char> {
    if text.trim_end().ends_with("...") {
        return Some('…');
    }
    ending_punctuation(text)
}

struct Checker<'a> {
    options: &'a ValidatorOptions,
    rule: PluralRule,
    report: ValidationReport,
}

impl Checker<'_> {
    fn push(&mut self, context: &str, message: &Message, code: IssueCode, text: String) {
        let mut severity = code.default_severity();
        if self.options.warnings_as_errors {
            severity = Severity::Error;
        }
        let comment = message.comment_str();
        self.report.issues.push(ValidationIssue {
            context: context.to_string(),
            source: message.source.as_str().to_string(),
            comment: (!comment.is_empty()).then(|| comment.to_string()),
            code,
            severity,
            message: text,
        });
    }

    fn check_message(&mut self, context: &str, message: &Message) {
        self.report.checked += 1;

        if !message.has_consistent_shape() {
            let text = if message.numerus {
                "numerus message without plural forms"
            } else {
                "plural forms on a message without numerus"
            };
            self.push(context, message, IssueCode::NumerusShapeMismatch, text.to_string());
            return;
        }

        if message.status == TranslationStatus::Finished && message.translation.is_empty() {
            if self.options.check_empty {
                self.push(
                    context,
                    message,
                    IssueCode::EmptyFinished,
                    "marked finished but has no translation".to_string(),
                );
            }
            return;
        }
        if message.translation.is_empty() {
            return;
        }

        let source = message.source.as_str();
        let forms: Vec<(usize, &str)> = match &message.translation {
            Translation::Single(text) => vec![(0, text.as_str())],
            Translation::Numerus(forms) => forms
                .iter()
                .map(|f| f.as_str())
                .enumerate()
                .filter(|(_, f)| !f.is_empty())
                .collect(),
        };

        if let Translation::Numerus(all) = &message.translation {
            if self.options.check_numerus && all.len() != self.rule.form_count() {
                self.push(
                    context,
                    message,
                    IssueCode::NumerusFormCount,
                    format!(
                        "{} plural form(s), the target language uses {}",
                        all.len(),
                        self.rule.form_count()
                    ),
                );
            }
        }

        let expected = PlaceholderSet::from_text(source);
        for (index, form) in forms {
            let found = PlaceholderSet::from_text(form);
            if self.options.check_placeholders && !expected.same_numbered(&found) {
                let missing = expected.missing_from(&found);
                let extra = found.missing_from(&expected);
                let mut detail = Vec::new();
                if !missing.is_empty() {
                    detail.push(format!("missing {}", describe(&missing)));
                }
                if !extra.is_empty() {
                    detail.push(format!("unexpected {}", describe(&extra)));
                }
                self.push(
                    context,
                    message,
                    IssueCode::PlaceholderMismatch,
                    label(message, index, &detail.join(", ")),
                );
            }
            if self.options.check_numerus
                && message.numerus
                && expected.has_count
                && !found.has_count
                && self.rule.form_count() > 1
            {
                self.push(
                    context,
                    message,
                    IssueCode::NumerusPlaceholderMissing,
                    label(message, index, "missing %n"),
                );
            }
            if self.options.check_accelerators && has_accelerator(source) != has_accelerator(form) {
                let text = if has_accelerator(source) {
                    "accelerator missing"
                } else {
                    "unexpected accelerator"
                };
                self.push(context, message, IssueCode::AcceleratorMismatch, label(message, index, text));
            }
            if self.options.check_punctuation
                && normalized_ending(source) != normalized_ending(form)
            {
                self.push(
                    context,
                    message,
                    IssueCode::PunctuationMismatch,
                    label(message, index, "ending punctuation differs"),
                );
            }
        }
    }
}

fn label(message: &Message, index: usize, text: &str) -> String {
    if message.numerus {
        format!("form {}: {text}", index + 1)
    } else {
        text.to_string()
    }
}

/// Run every enabled check over the live messages
pub fn validate_catalogue(catalogue: &Catalogue, options: &ValidatorOptions) -> ValidationReport {
    let rule = catalogue
        .language
        .as_deref()
        .map(PluralRule::for_language)
        .unwrap_or(PluralRule::English);
    let mut checker = Checker {
        options,
        rule,
        report: ValidationReport::default(),
    };

    for (context, key) in catalogue.duplicate_keys() {
        let message = Message::new(key.source).with_comment(key.comment);
        checker.push(
            &context,
            &message,
            IssueCode::DuplicateMessage,
            "duplicate source text and comment".to_string(),
        );
    }

    for (context, message) in catalogue.messages() {
        if message.is_live() {
            checker.check_message(context, message);
        }
    }

    let report = checker.report;
    for issue in &report.issues {
        log::debug!("{issue}");
    }
    if !report.is_clean() {
        log::warn!(
            "{} error(s), {} warning(s) in {} message(s)",
            report.error_count(),
            report.warning_count(),
            report.checked
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Context, XmlText};

    fn catalogue_with(messages: Vec<Message>) -> Catalogue {
        let mut catalogue = Catalogue::new(Some("pt_PT".into()), Some("en_US".into()));
        let mut context = Context::new("GMainWindow");
        for message in messages {
            context.push(message);
        }
        catalogue.contexts.push(context);
        catalogue
    }

    fn translated(source: &str, translation: &str) -> Message {
        let mut message = Message::new(source);
        message.set_translation(translation);
        message
    }

    fn codes(report: &ValidationReport) -> Vec<IssueCode> {
        report.issues.iter().map(|i| i.code).collect()
    }

    #[test]
    fn clean_translations_pass() {
        let catalogue = catalogue_with(vec![
            translated("Scale: %1x", "Escala: %1x"),
            translated("%1 is the profile username, %2 is the UUID", "%2 é o UUID, %1 é o nome"),
            translated("&Pause", "&Pausa"),
            translated("Load...", "Carregar…"),
            Message::new("CPU"),
        ]);
        let report = validate_catalogue(&catalogue, &ValidatorOptions::default());
        assert!(report.is_clean(), "{:?}", report.issues);
        assert_eq!(report.checked, 5);
    }

    #[test]
    fn missing_placeholder_is_an_error() {
        let catalogue = catalogue_with(vec![translated(
            "Installing file \"%1\" (%2)",
            "A instalar \"%1\"",
        )]);
        let report = validate_catalogue(&catalogue, &ValidatorOptions::default());
        assert!(report.has_errors());
        assert_eq!(codes(&report), vec![IssueCode::PlaceholderMismatch]);
        assert!(report.issues[0].message.contains("missing %2"));
    }

    #[test]
    fn unfinished_text_is_still_checked() {
        let mut message = Message::new("Volume: %1%");
        message.translation = Translation::Single(XmlText::new("Volume: %"));
        let report = validate_catalogue(&catalogue_with(vec![message]), &ValidatorOptions::default());
        assert_eq!(codes(&report), vec![IssueCode::PlaceholderMismatch]);
    }

    #[test]
    fn numerus_forms_are_checked() {
        let mut remaining = Message::new("%n file(s) remaining");
        remaining.numerus = true;
        remaining.set_numerus_forms(["um ficheiro restante", "%n ficheiros restantes", "x"]);
        let report = validate_catalogue(&catalogue_with(vec![remaining]), &ValidatorOptions::default());

        let found = codes(&report);
        assert!(found.contains(&IssueCode::NumerusFormCount));
        assert!(found.contains(&IssueCode::NumerusPlaceholderMissing));
        assert!(report.has_errors());
        assert!(report
            .with_code(IssueCode::NumerusPlaceholderMissing)
            .any(|i| i.message.starts_with("form 1")));
    }

    #[test]
    fn numerus_message_with_plain_text_is_an_error() {
        let mut results = Message::new("%n result(s)");
        results.numerus = true;
        results.translation = Translation::Single(XmlText::new("%n resultados"));
        results.status = TranslationStatus::Finished;
        let mut plain = Message::new("Filter:");
        plain.translation = Translation::Numerus(vec![XmlText::new("Filtro:")]);

        let report = validate_catalogue(&catalogue_with(vec![results, plain]), &ValidatorOptions::default());
        assert_eq!(
            codes(&report),
            vec![IssueCode::NumerusShapeMismatch, IssueCode::NumerusShapeMismatch]
        );
        assert!(report.has_errors());
        assert!(report.issues[0].message.contains("without plural forms"));
    }

    #[test]
    fn one_form_languages_skip_count_marker() {
        let mut catalogue = catalogue_with(Vec::new());
        catalogue.language = Some("ja_JP".into());
        let mut remaining = Message::new("%n file(s) remaining");
        remaining.numerus = true;
        remaining.set_numerus_forms(["残りファイル数"]);
        catalogue.contexts[0].push(remaining);

        let report = validate_catalogue(&catalogue, &ValidatorOptions::default());
        assert!(report.is_clean(), "{:?}", report.issues);
    }

    #[test]
    fn warnings_for_empty_accelerator_and_punctuation() {
        let mut empty = Message::new("OK");
        empty.status = TranslationStatus::Finished;
        let catalogue = catalogue_with(vec![
            empty,
            translated("&Stop", "Parar"),
            translated("Select Directory:", "Selecionar pasta"),
            translated("Are you sure?", "Tem a certeza?"),
        ]);
        let report = validate_catalogue(&catalogue, &ValidatorOptions::default());
        assert_eq!(
            codes(&report),
            vec![
                IssueCode::EmptyFinished,
                IssueCode::AcceleratorMismatch,
                IssueCode::PunctuationMismatch
            ]
        );
        assert!(!report.has_errors());
        assert_eq!(report.warning_count(), 3);

        let strict = ValidatorOptions {
            warnings_as_errors: true,
            ..ValidatorOptions::default()
        };
        assert!(validate_catalogue(&catalogue, &strict).has_errors());
    }

    #[test]
    fn checks_can_be_disabled() {
        let catalogue = catalogue_with(vec![translated("&Stop:", "Parar")]);
        let options = ValidatorOptions {
            check_accelerators: false,
            check_punctuation: false,
            ..ValidatorOptions::default()
        };
        assert!(validate_catalogue(&catalogue, &options).is_clean());
    }

    #[test]
    fn reports_duplicates_and_skips_vanished() {
        let mut gone = translated("Exit %1", "Sair");
        gone.status = TranslationStatus::Vanished;
        let catalogue = catalogue_with(vec![
            translated("X", "X"),
            translated("X", "X"),
            gone,
        ]);
        let report = validate_catalogue(&catalogue, &ValidatorOptions::default());
        assert_eq!(codes(&report), vec![IssueCode::DuplicateMessage]);
        assert_eq!(report.checked, 2);
    }

    #[test]
    fn accelerator_detection() {
        assert!(has_accelerator("&Pause"));
        assert!(has_accelerator("Pau&se"));
        assert!(!has_accelerator("Load && Save"));
        assert!(!has_accelerator("Load & Save"));
    }

    #[test]
    fn issue_display() {
        let issue = ValidationIssue {
            context: "ConfigureInputPlayer".into(),
            source: "X".into(),
            comment: Some("X axis".into()),
            code: IssueCode::PunctuationMismatch,
            severity: Severity::Warning,
            message: "ending punctuation differs".into(),
        };
        assert_eq!(
            issue.to_string(),
            "warning: ConfigureInputPlayer: \"X\" (X axis): ending punctuation differs"
        );
    }
}
