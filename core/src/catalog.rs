/// In-memory model of a Qt Linguist translation catalogue
///
/// A catalogue groups messages by UI context. Inside a context a message is
/// identified by its source text plus the optional disambiguation comment.
use crate::encoding::Newline;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Text content of an element.
///
/// Keeps the escaped form the value was read from so unedited text is written
/// back exactly as it appeared on disk.
#[derive(Debug, Clone, Default)]
pub struct XmlText {
    value: String,
    raw: Option<String>,
}

impl XmlText {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            raw: None,
        }
    }

    pub(crate) fn with_raw(value: String, raw: String) -> Self {
        Self {
            value,
            raw: Some(raw),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Escaped text as read from the document, if unchanged since.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn set(&mut self, value: impl Into<String>) {
        let value = value.into();
        if value != self.value {
            self.value = value;
            self.raw = None;
        }
    }
}

impl PartialEq for XmlText {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for XmlText {}

impl fmt::Display for XmlText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl From<&str> for XmlText {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for XmlText {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Serialize for XmlText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de> Deserialize<'de> for XmlText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Translation state, stored in the `type` attribute of `<translation>`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStatus {
    /// No `type` attribute
    #[default]
    Finished,
    Unfinished,
    /// Source text gone upstream (older lupdate spelling)
    Obsolete,
    /// Source text gone upstream
    Vanished,
}

impl TranslationStatus {
    pub fn as_attribute(self) -> Option<&'static str> {
        match self {
            Self::Finished => None,
            Self::Unfinished => Some("unfinished"),
            Self::Obsolete => Some("obsolete"),
            Self::Vanished => Some("vanished"),
        }
    }

    pub fn from_attribute(value: &str) -> Option<Self> {
        match value {
            "unfinished" => Some(Self::Unfinished),
            "obsolete" => Some(Self::Obsolete),
            "vanished" => Some(Self::Vanished),
            _ => None,
        }
    }

    /// Obsolete and vanished messages are kept for translators only.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Finished | Self::Unfinished)
    }
}

/// Line reference of a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineRef {
    Absolute(u32),
    /// Offset from the previous location in the same file
    Relative(i32),
}

impl fmt::Display for LineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(line) => write!(f, "{line}"),
            Self::Relative(offset) if *offset >= 0 => write!(f, "+{offset}"),
            Self::Relative(offset) => write!(f, "{offset}"),
        }
    }
}

impl FromStr for LineRef {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with('+') || s.starts_with('-') {
            s.parse::<i32>().map(Self::Relative)
        } else {
            s.parse::<u32>().map(Self::Absolute)
        }
    }
}

impl Serialize for LineRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absolute(line) => serializer.serialize_u32(*line),
            Self::Relative(_) => serializer.collect_str(self),
        }
    }
}

impl<'de> Deserialize<'de> for LineRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u32),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(line) => Ok(Self::Absolute(line)),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Where a message was found in the upstream source tree
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<LineRef>,
}

impl Location {
    pub fn new(filename: impl Into<String>, line: u32) -> Self {
        Self {
            filename: Some(filename.into()),
            line: Some(LineRef::Absolute(line)),
        }
    }
}

/// Translation body: plain text, or one form per plural category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Translation {
    Single(XmlText),
    Numerus(Vec<XmlText>),
}

impl Default for Translation {
    fn default() -> Self {
        Self::Single(XmlText::default())
    }
}

impl Translation {
    /// Empty numerus translation with `forms` slots
    pub fn empty_numerus(forms: usize) -> Self {
        Self::Numerus(vec![XmlText::default(); forms])
    }

    /// True when no text has been supplied at all
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(text) => text.is_empty(),
            Self::Numerus(forms) => forms.iter().all(XmlText::is_empty),
        }
    }
}

/// Lookup key of a message within its context
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MessageKey {
    pub source: String,
    pub comment: String,
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.comment.is_empty() {
            write!(f, "\"{}\"", self.source)
        } else {
            write!(f, "\"{}\" ({})", self.source, self.comment)
        }
    }
}

/// One translatable unit
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub numerus: bool,
    #[serde(default)]
    pub locations: Vec<Location>,
    pub source: XmlText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_source: Option<XmlText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<XmlText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_comment: Option<XmlText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_comment: Option<XmlText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translator_comment: Option<XmlText>,
    #[serde(default)]
    pub translation: Translation,
    #[serde(default)]
    pub status: TranslationStatus,
    /// `userdata` and `extra-*` elements, kept verbatim
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<(String, XmlText)>,
}

impl Message {
    /// New untranslated message
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: XmlText::new(source),
            status: TranslationStatus::Unfinished,
            ..Self::default()
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(XmlText::new(comment));
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    pub fn key(&self) -> MessageKey {
        MessageKey {
            source: self.source.as_str().to_string(),
            comment: self.comment_str().to_string(),
        }
    }

    pub fn comment_str(&self) -> &str {
        self.comment.as_ref().map(XmlText::as_str).unwrap_or("")
    }

    pub fn matches(&self, source: &str, comment: &str) -> bool {
        self.source.as_str() == source && self.comment_str() == comment
    }

    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }

    /// Finished with a non-empty translation
    pub fn is_translated(&self) -> bool {
        self.status == TranslationStatus::Finished && !self.translation.is_empty()
    }

    /// Text of a single translation, `None` for numerus messages
    pub fn translation_text(&self) -> Option<&str> {
        match &self.translation {
            Translation::Single(text) => Some(text.as_str()),
            Translation::Numerus(_) => None,
        }
    }

    pub fn numerus_forms(&self) -> &[XmlText] {
        match &self.translation {
            Translation::Single(_) => &[],
            Translation::Numerus(forms) => forms,
        }
    }

    /// Replace the translation text and mark the message finished
    ///
    /// A numerus message keeps its plural shape: every form gets `text`.
    pub fn set_translation(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.numerus {
            let count = self.numerus_forms().len().max(1);
            self.translation = Translation::Numerus(vec![XmlText::new(text); count]);
        } else {
            match &mut self.translation {
                Translation::Single(current) => current.set(text),
                Translation::Numerus(_) => self.translation = Translation::Single(XmlText::new(text)),
            }
        }
        self.status = TranslationStatus::Finished;
    }

    /// Numerus messages hold forms, all others a single text
    pub fn has_consistent_shape(&self) -> bool {
        matches!(
            (&self.translation, self.numerus),
            (Translation::Numerus(_), true) | (Translation::Single(_), false)
        )
    }

    pub fn set_numerus_forms<I, S>(&mut self, forms: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.translation = Translation::Numerus(forms.into_iter().map(XmlText::new).collect());
        self.status = TranslationStatus::Finished;
    }
}

/// Messages originating from one UI unit
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub name: XmlText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<XmlText>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Context {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: XmlText::new(name),
            comment: None,
            messages: Vec::new(),
        }
    }

    pub fn find(&self, source: &str, comment: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.matches(source, comment))
    }

    pub fn find_mut(&mut self, source: &str, comment: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.matches(source, comment))
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Keys that occur more than once
    pub fn duplicate_keys(&self) -> Vec<MessageKey> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for message in &self.messages {
            let key = message.key();
            if !seen.insert(key.clone()) && !duplicates.contains(&key) {
                duplicates.push(key);
            }
        }
        duplicates
    }
}

/// How the document looked on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLayout {
    /// Everything before `<TS`
    pub prolog: String,
    pub root_attributes: Vec<String>,
    /// Everything after `</TS>`
    pub trailing: String,
    pub newline: Newline,
    /// `<numerusform>` elements written on one line with `<translation>`
    pub inline_numerus: bool,
}

impl Default for DocumentLayout {
    fn default() -> Self {
        Self {
            prolog: "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n".to_string(),
            root_attributes: vec![
                "version".to_string(),
                "language".to_string(),
                "sourcelanguage".to_string(),
            ],
            trailing: "\n".to_string(),
            newline: Newline::Lf,
            inline_numerus: false,
        }
    }
}

/// A whole translation file for one target locale
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Catalogue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_language: Option<String>,
    #[serde(default)]
    pub contexts: Vec<Context>,
    #[serde(skip)]
    pub layout: DocumentLayout,
}

impl Catalogue {
    pub fn new(language: Option<String>, source_language: Option<String>) -> Self {
        Self {
            version: Some("2.1".to_string()),
            language,
            source_language,
            contexts: Vec::new(),
            layout: DocumentLayout::default(),
        }
    }

    pub fn context(&self, name: &str) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name.as_str() == name)
    }

    pub fn context_mut(&mut self, name: &str) -> Option<&mut Context> {
        self.contexts.iter_mut().find(|c| c.name.as_str() == name)
    }

    pub fn context_or_insert(&mut self, name: &str) -> &mut Context {
        let index = match self.contexts.iter().position(|c| c.name.as_str() == name) {
            Some(index) => index,
            None => {
                self.contexts.push(Context::new(name));
                self.contexts.len() - 1
            }
        };
        &mut self.contexts[index]
    }

    pub fn find_message(&self, context: &str, source: &str, comment: &str) -> Option<&Message> {
        self.context(context)?.find(source, comment)
    }

    /// All messages with their context name, in document order
    pub fn messages(&self) -> impl Iterator<Item = (&str, &Message)> {
        self.contexts
            .iter()
            .flat_map(|c| c.messages.iter().map(move |m| (c.name.as_str(), m)))
    }

    pub fn message_count(&self) -> usize {
        self.contexts.iter().map(|c| c.messages.len()).sum()
    }

    /// `(context, key)` pairs that occur more than once
    pub fn duplicate_keys(&self) -> Vec<(String, MessageKey)> {
        self.contexts
            .iter()
            .flat_map(|c| {
                c.duplicate_keys()
                    .into_iter()
                    .map(move |key| (c.name.as_str().to_string(), key))
            })
            .collect()
    }
}
