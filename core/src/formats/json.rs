/// JSON interchange format
/// Same model as TS, for scripts and review tools; layout details are dropped
use super::{ensure_consistent_shapes, ensure_unique_keys, FileFormat, FormatError, FormatHandler};
use crate::catalog::Catalogue;

pub struct JsonHandler;

impl JsonHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatHandler for JsonHandler {
    fn parse(&self, content: &str) -> Result<Catalogue, FormatError> {
        let catalogue: Catalogue = serde_json::from_str(content)?;
        ensure_unique_keys(&catalogue)?;
        ensure_consistent_shapes(&catalogue)?;
        Ok(catalogue)
    }

    fn serialize(&self, catalogue: &Catalogue) -> Result<String, FormatError> {
        ensure_consistent_shapes(catalogue)?;
        Ok(serde_json::to_string_pretty(catalogue)?)
    }

    fn format(&self) -> FileFormat {
        FileFormat::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Location, Message, Translation, TranslationStatus};
    use serde_json::Value;

    fn sample() -> Catalogue {
        let mut catalogue = Catalogue::new(Some("pt_PT".into()), Some("en_US".into()));
        let context = catalogue.context_or_insert("CalibrationConfigurationDialog");
        let mut cancel = Message::new("Cancel")
            .with_location(Location::new("../../src/yuzu/configuration/configure_motion_touch.cpp", 52));
        cancel.set_translation("Cancelar");
        context.push(cancel);
        catalogue
    }

    #[test]
    fn exports_readable_structure() {
        let handler = JsonHandler::new();
        let json = handler.serialize(&sample()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["language"], "pt_PT");
        assert_eq!(value["sourceLanguage"], "en_US");
        let message = &value["contexts"][0]["messages"][0];
        assert_eq!(value["contexts"][0]["name"], "CalibrationConfigurationDialog");
        assert_eq!(message["source"], "Cancel");
        assert_eq!(message["translation"]["single"], "Cancelar");
        assert_eq!(message["status"], "finished");
        assert_eq!(message["locations"][0]["line"], 52);
    }

    #[test]
    fn imports_what_it_exports() {
        let handler = JsonHandler::new();
        let original = sample();
        let parsed = handler.parse(&handler.serialize(&original).unwrap()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn minimal_messages_get_defaults() {
        let json = r#"{
            "language": "fr",
            "contexts": [{ "name": "ConfigureCpu", "messages": [{ "source": "CPU" }] }]
        }"#;
        let catalogue = JsonHandler::new().parse(json).unwrap();
        let message = catalogue.find_message("ConfigureCpu", "CPU", "").unwrap();
        assert_eq!(message.status, TranslationStatus::Finished);
        assert_eq!(message.translation_text(), Some(""));
    }

    #[test]
    fn rejects_duplicate_keys() {
        let json = r#"{"contexts": [{ "name": "A", "messages": [{ "source": "X" }, { "source": "X" }] }]}"#;
        assert!(matches!(
            JsonHandler::new().parse(json).unwrap_err(),
            FormatError::DuplicateMessage { .. }
        ));
    }

    #[test]
    fn rejects_numerus_message_with_single_text() {
        let json = r#"{"language": "pt_PT", "contexts": [{ "name": "GameList", "messages": [
            { "source": "%n result(s)", "numerus": true, "translation": { "single": "%n resultados" } }
        ] }]}"#;
        let err = JsonHandler::new().parse(json).unwrap_err();
        assert!(matches!(err, FormatError::NumerusMismatch { numerus: "yes", .. }));
        assert!(err.to_string().contains("%n result(s)"));
    }

    #[test]
    fn refuses_to_export_mismatched_shape() {
        let mut catalogue = sample();
        catalogue.contexts[0].messages[0].translation = Translation::Numerus(Vec::new());
        assert!(matches!(
            JsonHandler::new().serialize(&catalogue).unwrap_err(),
            FormatError::NumerusMismatch { numerus: "no", .. }
        ));
    }
}
