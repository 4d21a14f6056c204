/// Streaming TS reader built on quick-xml
use crate::catalog::{
    Catalogue, Context, LineRef, Location, Message, Translation, TranslationStatus, XmlText,
};
use crate::encoding::Newline;
use crate::formats::escape::decode_byte_value;
use crate::formats::{ensure_unique_keys, FormatError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt::Display;

pub(crate) fn read(input: &str) -> Result<Catalogue, FormatError> {
    TsReader::new(input).read_document()
}

struct TsReader<'a> {
    input: &'a str,
    reader: Reader<&'a [u8]>,
    inline_numerus: Option<bool>,
}

fn offset(position: u64) -> usize {
    usize::try_from(position).unwrap_or(usize::MAX)
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

/// Byte offset of the `<TS` start tag
fn root_start(input: &str) -> Option<usize> {
    input.match_indices("<TS").map(|(idx, _)| idx).find(|&idx| {
        matches!(
            input.as_bytes().get(idx + 3),
            Some(b' ' | b'\t' | b'\r' | b'\n' | b'>' | b'/')
        )
    })
}

/// Byte offset just past `</TS>`
fn root_end(input: &str) -> Option<usize> {
    let idx = input.rfind("</TS")?;
    let close = input[idx..].find('>')?;
    Some(idx + close + 1)
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

impl<'a> TsReader<'a> {
    fn new(input: &'a str) -> Self {
        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(false);
        Self {
            input,
            reader,
            inline_numerus: None,
        }
    }

    /// Only called when building an error
    fn line_at(&self, position: u64) -> usize {
        let end = offset(position).min(self.input.len());
        self.input.as_bytes()[..end]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1
    }

    fn line(&self) -> usize {
        self.line_at(self.reader.buffer_position())
    }

    fn xml_error(&self, err: impl Display) -> FormatError {
        FormatError::Xml {
            line: self.line(),
            message: err.to_string(),
        }
    }

    fn next_event(&mut self) -> Result<Event<'a>, FormatError> {
        match self.reader.read_event() {
            Ok(event) => Ok(event),
            Err(err) => Err(FormatError::Xml {
                line: self.line_at(self.reader.error_position()),
                message: err.to_string(),
            }),
        }
    }

    fn utf8<'b>(&self, bytes: &'b [u8]) -> Result<&'b str, FormatError> {
        std::str::from_utf8(bytes).map_err(|e| self.xml_error(e))
    }

    fn attributes(&self, start: &BytesStart<'_>) -> Result<Vec<(String, String)>, FormatError> {
        let mut out = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.xml_error(e))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| self.xml_error(e))?
                .into_owned();
            out.push((key, value));
        }
        Ok(out)
    }

    fn unexpected(&self, start: &BytesStart<'_>, parent: &str) -> FormatError {
        FormatError::UnexpectedElement {
            line: self.line(),
            element: element_name(start),
            parent: parent.to_string(),
        }
    }

    fn unsupported(&self, construct: impl Into<String>) -> FormatError {
        FormatError::Unsupported {
            line: self.line(),
            construct: construct.into(),
        }
    }

    fn read_document(mut self) -> Result<Catalogue, FormatError> {
        loop {
            match self.next_event()? {
                Event::Start(start) if start.name().as_ref() == b"TS" => {
                    let mut catalogue = self.open_catalogue(&start)?;
                    self.read_contexts(&mut catalogue)?;
                    return self.finish(catalogue);
                }
                Event::Empty(start) if start.name().as_ref() == b"TS" => {
                    let catalogue = self.open_catalogue(&start)?;
                    return self.finish(catalogue);
                }
                Event::Decl(_) | Event::DocType(_) | Event::Comment(_) | Event::PI(_) => {}
                Event::Text(text) if is_blank(&text) => {}
                Event::Start(start) | Event::Empty(start) => {
                    return Err(self.unexpected(&start, "document"))
                }
                Event::Eof => return Err(FormatError::MissingRoot),
                _ => {
                    return Err(FormatError::UnexpectedText {
                        line: self.line(),
                        parent: "document".into(),
                    })
                }
            }
        }
    }

    fn open_catalogue(&self, start: &BytesStart<'_>) -> Result<Catalogue, FormatError> {
        let mut catalogue = Catalogue::default();
        let root_offset = root_start(self.input).unwrap_or(0);
        catalogue.layout.prolog = self.input[..root_offset].to_string();
        catalogue.layout.newline = Newline::detect(self.input);
        catalogue.layout.root_attributes.clear();

        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "version" => catalogue.version = Some(value),
                "language" => catalogue.language = Some(value),
                "sourcelanguage" => catalogue.source_language = Some(value),
                other => return Err(self.unsupported(format!("attribute `{other}` on <TS>"))),
            }
            catalogue.layout.root_attributes.push(key);
        }
        Ok(catalogue)
    }

    fn finish(mut self, mut catalogue: Catalogue) -> Result<Catalogue, FormatError> {
        let after = root_end(self.input)
            .unwrap_or_else(|| offset(self.reader.buffer_position()))
            .min(self.input.len());
        catalogue.layout.trailing = self.input[after..].to_string();
        loop {
            match self.next_event()? {
                Event::Eof => break,
                Event::Comment(_) | Event::PI(_) => {}
                Event::Text(text) if is_blank(&text) => {}
                Event::Start(start) | Event::Empty(start) => {
                    return Err(self.unexpected(&start, "document"))
                }
                _ => {
                    return Err(FormatError::UnexpectedText {
                        line: self.line(),
                        parent: "document".into(),
                    })
                }
            }
        }

        catalogue.layout.inline_numerus = self.inline_numerus.unwrap_or(false);
        ensure_unique_keys(&catalogue)?;
        log::debug!(
            "read TS catalogue: {} contexts, {} messages",
            catalogue.contexts.len(),
            catalogue.message_count()
        );
        Ok(catalogue)
    }

    fn read_contexts(&mut self, catalogue: &mut Catalogue) -> Result<(), FormatError> {
        loop {
            match self.next_event()? {
                Event::Start(start) if start.name().as_ref() == b"context" => {
                    let context = self.read_context()?;
                    catalogue.contexts.push(context);
                }
                Event::Start(start) | Event::Empty(start)
                    if matches!(start.name().as_ref(), b"defaultcodec" | b"dependencies") =>
                {
                    return Err(self.unsupported(format!("<{}>", element_name(&start))));
                }
                Event::Empty(start) if start.name().as_ref() == b"context" => {
                    return Err(FormatError::MissingElement {
                        line: self.line(),
                        element: "context".into(),
                        child: "name".into(),
                    });
                }
                Event::End(end) if end.name().as_ref() == b"TS" => return Ok(()),
                Event::Text(text) if is_blank(&text) => {}
                Event::Comment(_) => {}
                Event::Start(start) | Event::Empty(start) => {
                    return Err(self.unexpected(&start, "TS"))
                }
                Event::Eof => {
                    return Err(FormatError::UnexpectedEof {
                        element: "TS".into(),
                    })
                }
                _ => {
                    return Err(FormatError::UnexpectedText {
                        line: self.line(),
                        parent: "TS".into(),
                    })
                }
            }
        }
    }

    fn read_context(&mut self) -> Result<Context, FormatError> {
        let opened_at = self.reader.buffer_position();
        let mut name = None;
        let mut comment = None;
        let mut messages = Vec::new();

        loop {
            match self.next_event()? {
                Event::Start(start) => match start.name().as_ref() {
                    b"name" => name = Some(self.read_text("name")?),
                    b"comment" => comment = Some(self.read_text("comment")?),
                    b"message" => messages.push(self.read_message(&start, false)?),
                    _ => return Err(self.unexpected(&start, "context")),
                },
                Event::Empty(start) => match start.name().as_ref() {
                    b"name" => name = Some(XmlText::default()),
                    b"comment" => comment = Some(XmlText::default()),
                    b"message" => messages.push(self.read_message(&start, true)?),
                    _ => return Err(self.unexpected(&start, "context")),
                },
                Event::End(end) if end.name().as_ref() == b"context" => break,
                Event::Text(text) if is_blank(&text) => {}
                Event::Comment(_) => {}
                Event::Eof => {
                    return Err(FormatError::UnexpectedEof {
                        element: "context".into(),
                    })
                }
                _ => {
                    return Err(FormatError::UnexpectedText {
                        line: self.line(),
                        parent: "context".into(),
                    })
                }
            }
        }

        let name = name.ok_or_else(|| FormatError::MissingElement {
            line: self.line_at(opened_at),
            element: "context".into(),
            child: "name".into(),
        })?;
        Ok(Context {
            name,
            comment,
            messages,
        })
    }

    fn read_message(&mut self, start: &BytesStart<'_>, empty: bool) -> Result<Message, FormatError> {
        let opened_at = self.reader.buffer_position();
        let mut message = Message {
            status: TranslationStatus::Unfinished,
            ..Message::default()
        };

        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "id" => message.id = Some(value),
                "numerus" => message.numerus = value == "yes",
                other => return Err(self.unsupported(format!("attribute `{other}` on <message>"))),
            }
        }

        let mut source = None;
        let mut translation = None;

        while !empty {
            match self.next_event()? {
                Event::Start(child) => {
                    let tag = element_name(&child);
                    match tag.as_str() {
                        "location" => {
                            message.locations.push(self.location(&child)?);
                            self.read_text("location")?;
                        }
                        "translation" => {
                            translation = Some(self.read_translation(&child, message.numerus)?)
                        }
                        _ => {
                            let text = self.read_text(&tag)?;
                            self.assign_text(&mut message, &mut source, &child, &tag, text)?;
                        }
                    }
                }
                Event::Empty(child) => {
                    let tag = element_name(&child);
                    match tag.as_str() {
                        "location" => message.locations.push(self.location(&child)?),
                        "translation" => {
                            let status = self.status(&child)?;
                            let body = if message.numerus {
                                Translation::Numerus(Vec::new())
                            } else {
                                Translation::Single(XmlText::default())
                            };
                            translation = Some((body, status));
                        }
                        _ => {
                            self.assign_text(&mut message, &mut source, &child, &tag, XmlText::default())?
                        }
                    }
                }
                Event::End(end) if end.name().as_ref() == b"message" => break,
                Event::Text(text) if is_blank(&text) => {}
                Event::Comment(_) => {}
                Event::Eof => {
                    return Err(FormatError::UnexpectedEof {
                        element: "message".into(),
                    })
                }
                _ => {
                    return Err(FormatError::UnexpectedText {
                        line: self.line(),
                        parent: "message".into(),
                    })
                }
            }
        }

        message.source = source.ok_or_else(|| FormatError::MissingElement {
            line: self.line_at(opened_at),
            element: "message".into(),
            child: "source".into(),
        })?;
        if let Some((body, status)) = translation {
            message.translation = body;
            message.status = status;
        } else if message.numerus {
            message.translation = Translation::Numerus(Vec::new());
        }
        Ok(message)
    }

    fn assign_text(
        &self,
        message: &mut Message,
        source: &mut Option<XmlText>,
        start: &BytesStart<'_>,
        tag: &str,
        text: XmlText,
    ) -> Result<(), FormatError> {
        match tag {
            "source" => *source = Some(text),
            "oldsource" => message.old_source = Some(text),
            "comment" => message.comment = Some(text),
            "oldcomment" => message.old_comment = Some(text),
            "extracomment" => message.extra_comment = Some(text),
            "translatorcomment" => message.translator_comment = Some(text),
            _ if tag == "userdata" || tag.starts_with("extra-") => message.extras.push((tag.to_string(), text)),
            _ => return Err(self.unexpected(start, "message")),
        }
        Ok(())
    }

    fn location(&self, start: &BytesStart<'_>) -> Result<Location, FormatError> {
        let mut location = Location::default();
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "filename" => location.filename = Some(value),
                "line" => {
                    let line = value.parse::<LineRef>().map_err(|_| FormatError::InvalidAttribute {
                        line: self.line(),
                        attribute: "line".into(),
                        value: value.clone(),
                    })?;
                    location.line = Some(line);
                }
                other => return Err(self.unsupported(format!("attribute `{other}` on <location>"))),
            }
        }
        Ok(location)
    }

    fn status(&self, start: &BytesStart<'_>) -> Result<TranslationStatus, FormatError> {
        let mut status = TranslationStatus::Finished;
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "type" => {
                    status = TranslationStatus::from_attribute(&value).ok_or_else(|| {
                        FormatError::InvalidAttribute {
                            line: self.line(),
                            attribute: "type".into(),
                            value: value.clone(),
                        }
                    })?;
                }
                "variants" if value == "yes" => return Err(self.unsupported("length variants")),
                "variants" => {}
                other => {
                    return Err(self.unsupported(format!("attribute `{other}` on <translation>")))
                }
            }
        }
        Ok(status)
    }

    fn read_translation(
        &mut self,
        start: &BytesStart<'_>,
        numerus: bool,
    ) -> Result<(Translation, TranslationStatus), FormatError> {
        let status = self.status(start)?;
        if !numerus {
            let text = self.read_text("translation")?;
            return Ok((Translation::Single(text), status));
        }

        let mut forms = Vec::new();
        let mut indented = false;
        loop {
            match self.next_event()? {
                Event::Start(child) if child.name().as_ref() == b"numerusform" => {
                    self.reject_variants(&child)?;
                    forms.push(self.read_text("numerusform")?);
                }
                Event::Empty(child) if child.name().as_ref() == b"numerusform" => {
                    self.reject_variants(&child)?;
                    forms.push(XmlText::default());
                }
                Event::Text(text) if is_blank(&text) => indented = true,
                Event::End(end) if end.name().as_ref() == b"translation" => break,
                Event::Start(child) | Event::Empty(child) => {
                    return Err(self.unexpected(&child, "translation"))
                }
                Event::Eof => {
                    return Err(FormatError::UnexpectedEof {
                        element: "translation".into(),
                    })
                }
                _ => {
                    return Err(FormatError::UnexpectedText {
                        line: self.line(),
                        parent: "translation".into(),
                    })
                }
            }
        }

        if !forms.is_empty() && self.inline_numerus.is_none() {
            self.inline_numerus = Some(!indented);
        }
        Ok((Translation::Numerus(forms), status))
    }

    fn reject_variants(&self, start: &BytesStart<'_>) -> Result<(), FormatError> {
        let variants = self
            .attributes(start)?
            .into_iter()
            .any(|(key, value)| key == "variants" && value == "yes");
        if variants {
            return Err(self.unsupported("length variants"));
        }
        Ok(())
    }

    /// Collect character data up to `</tag>`, keeping the escaped form
    fn read_text(&mut self, tag: &str) -> Result<XmlText, FormatError> {
        let mut value = String::new();
        let mut raw = String::new();

        loop {
            match self.next_event()? {
                Event::Text(text) => {
                    raw.push_str(self.utf8(&text)?);
                    let unescaped = text.unescape().map_err(|e| self.xml_error(e))?;
                    value.push_str(&unescaped);
                }
                Event::CData(data) => {
                    let content = self.utf8(&data)?;
                    raw.push_str("<![CDATA[");
                    raw.push_str(content);
                    raw.push_str("]]>");
                    value.push_str(content);
                }
                Event::Empty(child) if child.name().as_ref() == b"byte" => {
                    let byte = self
                        .attributes(&child)?
                        .into_iter()
                        .find(|(key, _)| key == "value")
                        .map(|(_, value)| value)
                        .unwrap_or_default();
                    let ch = decode_byte_value(&byte).ok_or_else(|| FormatError::InvalidAttribute {
                        line: self.line(),
                        attribute: "value".into(),
                        value: byte.clone(),
                    })?;
                    raw.push('<');
                    raw.push_str(self.utf8(&child)?);
                    raw.push_str("/>");
                    value.push(ch);
                }
                Event::Comment(comment) => {
                    raw.push_str("<!--");
                    raw.push_str(self.utf8(&comment)?);
                    raw.push_str("-->");
                }
                Event::End(end) if end.name().as_ref() == tag.as_bytes() => break,
                Event::Start(child) | Event::Empty(child) => return Err(self.unexpected(&child, tag)),
                Event::Eof => {
                    return Err(FormatError::UnexpectedEof {
                        element: tag.to_string(),
                    })
                }
                _ => {
                    return Err(FormatError::UnexpectedText {
                        line: self.line(),
                        parent: tag.to_string(),
                    })
                }
            }
        }

        if value.contains('\r') {
            value = value.replace("\r\n", "\n");
        }
        Ok(XmlText::with_raw(value, raw))
    }
}
