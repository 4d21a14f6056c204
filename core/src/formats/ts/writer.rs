/// TS writer producing lupdate's layout
use crate::catalog::{Catalogue, Context, Location, Message, Translation, XmlText};
use crate::encoding::Newline;
use crate::formats::escape::{escape_attribute, escape_text};

const ROOT_ATTRIBUTES: [&str; 3] = ["version", "language", "sourcelanguage"];

pub(crate) fn write(catalogue: &Catalogue) -> String {
    let mut writer = TsWriter {
        out: String::with_capacity(catalogue.message_count() * 192 + 256),
        newline: catalogue.layout.newline,
        inline_numerus: catalogue.layout.inline_numerus,
    };
    writer.document(catalogue);
    writer.out
}

struct TsWriter {
    out: String,
    newline: Newline,
    inline_numerus: bool,
}

impl TsWriter {
    fn nl(&mut self) {
        self.out.push_str(self.newline.as_str());
    }

    fn text(&mut self, text: &XmlText) {
        match text.raw() {
            Some(raw) => self.out.push_str(raw),
            None => self.out.push_str(&escape_text(text.as_str(), self.newline)),
        }
    }

    fn attribute(&mut self, name: &str, value: &str) {
        self.out.push(' ');
        self.out.push_str(name);
        self.out.push_str("=\"");
        self.out.push_str(&escape_attribute(value));
        self.out.push('"');
    }

    /// `<tag>text</tag>` on its own line
    fn element(&mut self, indent: &str, tag: &str, text: &XmlText) {
        self.out.push_str(indent);
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push('>');
        self.text(text);
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
        self.nl();
    }

    fn optional_element(&mut self, indent: &str, tag: &str, text: Option<&XmlText>) {
        if let Some(text) = text {
            self.element(indent, tag, text);
        }
    }

    fn document(&mut self, catalogue: &Catalogue) {
        self.out.push_str(&catalogue.layout.prolog);
        self.out.push_str("<TS");

        let recorded = catalogue
            .layout
            .root_attributes
            .iter()
            .map(String::as_str)
            .filter(|name| ROOT_ATTRIBUTES.contains(name));
        let missing = ROOT_ATTRIBUTES
            .iter()
            .copied()
            .filter(|name| !catalogue.layout.root_attributes.iter().any(|r| r == name));
        let order: Vec<&str> = recorded.chain(missing).collect();

        for name in order {
            let value = match name {
                "version" => catalogue.version.as_deref(),
                "language" => catalogue.language.as_deref(),
                _ => catalogue.source_language.as_deref(),
            };
            if let Some(value) = value {
                self.attribute(name, value);
            }
        }
        self.out.push('>');
        self.nl();

        for context in &catalogue.contexts {
            self.context(context);
        }

        self.out.push_str("</TS>");
        self.out.push_str(&catalogue.layout.trailing);
    }

    fn context(&mut self, context: &Context) {
        self.out.push_str("<context>");
        self.nl();
        self.element("    ", "name", &context.name);
        self.optional_element("    ", "comment", context.comment.as_ref());
        for message in &context.messages {
            self.message(message);
        }
        self.out.push_str("</context>");
        self.nl();
    }

    fn message(&mut self, message: &Message) {
        self.out.push_str("    <message");
        if let Some(id) = &message.id {
            self.attribute("id", id);
        }
        if message.numerus {
            self.attribute("numerus", "yes");
        }
        self.out.push('>');
        self.nl();

        for location in &message.locations {
            self.location(location);
        }
        self.element("        ", "source", &message.source);
        self.optional_element("        ", "oldsource", message.old_source.as_ref());
        self.optional_element("        ", "comment", message.comment.as_ref());
        self.optional_element("        ", "oldcomment", message.old_comment.as_ref());
        self.optional_element("        ", "extracomment", message.extra_comment.as_ref());
        self.optional_element(
            "        ",
            "translatorcomment",
            message.translator_comment.as_ref(),
        );
        self.translation(message);
        for (tag, text) in &message.extras {
            self.element("        ", tag, text);
        }

        self.out.push_str("    </message>");
        self.nl();
    }

    fn location(&mut self, location: &Location) {
        self.out.push_str("        <location");
        if let Some(filename) = &location.filename {
            self.attribute("filename", filename);
        }
        if let Some(line) = location.line {
            self.attribute("line", &line.to_string());
        }
        self.out.push_str("/>");
        self.nl();
    }

    fn translation(&mut self, message: &Message) {
        self.out.push_str("        <translation");
        if let Some(status) = message.status.as_attribute() {
            self.attribute("type", status);
        }

        match &message.translation {
            Translation::Single(text) if text.is_empty() => self.out.push_str("/>"),
            Translation::Numerus(forms) if forms.is_empty() => self.out.push_str("/>"),
            Translation::Single(text) => {
                self.out.push('>');
                self.text(text);
                self.out.push_str("</translation>");
            }
            Translation::Numerus(forms) if self.inline_numerus => {
                self.out.push('>');
                for form in forms {
                    self.out.push_str("<numerusform>");
                    self.text(form);
                    self.out.push_str("</numerusform>");
                }
                self.out.push_str("</translation>");
            }
            Translation::Numerus(forms) => {
                self.out.push('>');
                self.nl();
                for form in forms {
                    self.element("            ", "numerusform", form);
                }
                self.out.push_str("        </translation>");
            }
        }
        self.nl();
    }
}
