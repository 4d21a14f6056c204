/// Integration tests across the catalogue modules
/// Parse, edit, check, merge and look up the same document

#[cfg(test)]
mod tests {
    use crate::catalog::{Message, TranslationStatus};
    use crate::formats::ts;
    use crate::formats::{get_handler, FileFormat};
    use crate::lookup::{LookupOptions, Translator};
    use crate::merge::{extraction_of, merge, MergeOptions};
    use crate::stats::CatalogueStats;
    use crate::validator::{validate_catalogue, IssueCode, ValidatorOptions};

    // Transifex-style header, inline numerus forms, no final newline
    const DOC: &str = r#"<?xml version="1.0" ?><!DOCTYPE TS><TS language="nl" sourcelanguage="en_US" version="2.1">
<context>
    <name>ConfigureInputPlayer</name>
    <message>
        <location filename="../../src/yuzu/configuration/configure_input_player.ui" line="316"/>
        <source>Left Stick</source>
        <translation>Linker Stick</translation>
    </message>
    <message>
        <location filename="../../src/yuzu/configuration/configure_input_player.ui" line="410"/>
        <source>Deadzone: 0%</source>
        <translation>Deadzone: 0%</translation>
    </message>
    <message>
        <location filename="../../src/yuzu/configuration/configure_input_player.cpp" line="470"/>
        <source>Deadzone: %1%</source>
        <translation type="unfinished"/>
    </message>
    <message>
        <location filename="../../src/yuzu/configuration/configure_input_player.cpp" line="980"/>
        <source>Map Analog Stick</source>
        <translation>Analoge Stick Toewijzen</translation>
    </message>
</context>
<context>
    <name>GameList</name>
    <message numerus="yes">
        <location filename="../../src/yuzu/game_list.cpp" line="348"/>
        <source>%n result(s)</source>
        <translation><numerusform>%n resultaat</numerusform><numerusform>%n resultaten</numerusform></translation>
    </message>
    <message>
        <location filename="../../src/yuzu/game_list.cpp" line="480"/>
        <source>Open Save Data Location</source>
        <translation>Open Locatie van Save Data</translation>
    </message>
</context>
</TS>"#;

    #[test]
    fn test_handlers_agree_on_model() {
        let catalogue = ts::parse(DOC).unwrap();
        let json = get_handler(FileFormat::Json).unwrap();
        let exported = json.serialize(&catalogue).unwrap();
        let imported = json.parse(&exported).unwrap();
        assert_eq!(imported.contexts, catalogue.contexts);

        // JSON carries no layout, so TS output uses the lupdate defaults
        let rewritten = ts::to_string(&imported);
        assert!(rewritten.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n"));
        assert_eq!(ts::parse(&rewritten).unwrap().contexts, catalogue.contexts);
    }

    #[test]
    fn test_unedited_document_round_trips() {
        let catalogue = ts::parse(DOC).unwrap();
        assert!(catalogue.layout.inline_numerus);
        assert_eq!(ts::to_string(&catalogue), DOC);
    }

    #[test]
    fn test_translate_then_lookup() {
        let mut catalogue = ts::parse(DOC).unwrap();
        let context = catalogue.context_mut("ConfigureInputPlayer").unwrap();
        context
            .find_mut("Deadzone: %1%", "")
            .unwrap()
            .set_translation("Deadzone: %1%");

        let report = validate_catalogue(&catalogue, &ValidatorOptions::default());
        assert!(!report.has_errors(), "{:?}", report.issues);

        let translator = Translator::from_catalogue(&catalogue, &LookupOptions::default());
        assert_eq!(
            translator.translate("ConfigureInputPlayer", "Deadzone: %1%", None),
            "Deadzone: %1%"
        );
        assert_eq!(translator.translate_plural("GameList", "%n result(s)", None, 1), "1 resultaat");
        assert_eq!(translator.translate_plural("GameList", "%n result(s)", None, 7), "7 resultaten");

        // only the edited message changes on disk
        let output = ts::to_string(&catalogue);
        let expected = DOC.replacen(
            "<source>Deadzone: %1%</source>\n        <translation type=\"unfinished\"/>",
            "<source>Deadzone: %1%</source>\n        <translation>Deadzone: %1%</translation>",
            1,
        );
        assert_eq!(output, expected);
    }

    #[test]
    fn test_broken_translation_is_reported() {
        let mut catalogue = ts::parse(DOC).unwrap();
        catalogue
            .context_mut("ConfigureInputPlayer")
            .unwrap()
            .find_mut("Deadzone: %1%", "")
            .unwrap()
            .set_translation("Deadzone");

        let report = validate_catalogue(&catalogue, &ValidatorOptions::default());
        assert!(report.has_errors());
        assert_eq!(report.with_code(IssueCode::PlaceholderMismatch).count(), 1);
    }

    #[test]
    fn test_merge_new_extraction_updates_stats() {
        let existing = ts::parse(DOC).unwrap();
        let mut extracted = extraction_of(&existing);
        extracted
            .context_mut("GameList")
            .unwrap()
            .messages
            .retain(|m| m.source.as_str() != "Open Save Data Location");
        extracted
            .context_or_insert("GameList")
            .push(Message::new("Open Save Data Folder"));

        let (merged, report) = merge(&existing, &extracted, &MergeOptions::default());
        assert_eq!(report.new, 1);
        assert_eq!(report.vanished, 1);

        let folder = merged
            .find_message("GameList", "Open Save Data Folder", "")
            .unwrap();
        assert_eq!(folder.status, TranslationStatus::Unfinished);

        let stats = CatalogueStats::from_catalogue(&merged);
        assert_eq!(stats.totals.vanished, 1);
        assert_eq!(stats.totals.untranslated, 2);
        assert_eq!(stats.totals.finished, 4);

        // the header survives the merge
        let output = ts::to_string(&merged);
        assert!(output.starts_with("<?xml version=\"1.0\" ?><!DOCTYPE TS><TS language=\"nl\""));
        assert!(output.ends_with("</TS>"));
    }
}
