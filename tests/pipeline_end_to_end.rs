use std::sync::Mutex;

use readalong_align::alignment::export::write_json;
use readalong_align::config::DnaConfig;
use readalong_align::text::convert::PRONUNCIATION_ATTR;
use readalong_align::{
    AlignConfig, AlignmentEngine, AlignmentError, AlignmentInput, Dictionary, DnaMethod,
    DnaSegment, Document, EngineSegment, Grammar, PreparedDocument, ReadAligner,
    ReadAlignerBuilder,
};

const RATE: u32 = 16_000;
const FRAME_RATE: f64 = 100.0;

/// Splits whatever audio it receives into equal windows, one per dictionary
/// entry, leaving two frames of silence on each side of every word.
struct EvenEngine {
    drop_last: bool,
    received: Mutex<Vec<Vec<f32>>>,
}

impl EvenEngine {
    fn new() -> Self {
        Self {
            drop_last: false,
            received: Mutex::new(Vec::new()),
        }
    }
}

impl AlignmentEngine for EvenEngine {
    fn align(
        &self,
        dictionary: &Dictionary,
        grammar: &Grammar,
        samples: &[f32],
        sample_rate_hz: u32,
    ) -> Result<Vec<EngineSegment>, AlignmentError> {
        assert_eq!(grammar.transitions().len(), dictionary.len());
        self.received
            .lock()
            .map_err(AlignmentError::engine)?
            .push(samples.to_vec());

        let frames = (samples.len() as f64 * FRAME_RATE / f64::from(sample_rate_hz)) as u64;
        let window = frames / dictionary.len() as u64;
        let mut segments = vec![EngineSegment::new("<sil>", 0, 2)];
        for (i, entry) in dictionary.entries().iter().enumerate() {
            let i = i as u64;
            segments.push(EngineSegment::new(
                entry.id.clone(),
                i * window + 2,
                (i + 1) * window - 2,
            ));
        }
        if self.drop_last {
            segments.pop();
        }
        Ok(segments)
    }
}

fn aligner(config: AlignConfig, engine: EvenEngine) -> ReadAligner {
    ReadAlignerBuilder::new(config)
        .with_engine(Box::new(engine))
        .build()
        .expect("build should succeed")
}

fn one_second() -> AlignmentInput {
    AlignmentInput {
        sample_rate_hz: RATE,
        samples: vec![0.5; RATE as usize],
    }
}

fn prepare(aligner: &ReadAligner, markup: &str) -> PreparedDocument {
    let doc = Document::parse(markup).expect("valid markup");
    aligner.prepare("story", &doc).expect("prepare should succeed")
}

fn bounds(output: &readalong_align::AlignmentOutput) -> Vec<(String, u64, u64)> {
    output
        .units
        .iter()
        .map(|unit| (unit.id.clone(), unit.start_ms, unit.end_ms))
        .collect()
}

fn span(id: &str, start: u64, end: u64) -> (String, u64, u64) {
    (id.to_string(), start, end)
}

fn dna_config(method: DnaMethod) -> AlignConfig {
    AlignConfig {
        do_not_align: Some(DnaConfig {
            segments: vec![DnaSegment::new(250, 500)],
            method,
        }),
        ..AlignConfig::default()
    }
}

#[test]
fn french_sentence_end_to_end() {
    let aligner = aligner(AlignConfig::default(), EvenEngine::new());
    let prepared = prepare(&aligner, r#"<s lang="fra">Bonjour! Comment ça va?</s>"#);
    assert!(prepared.report.all_valid);

    let doc = &prepared.document;
    let ids: Vec<&str> = doc
        .elements_with_tag("w")
        .filter_map(|id| doc.node(id).attribute("id"))
        .collect();
    assert_eq!(ids, ["s0w0", "s0w1", "s0w2", "s0w3"]);
    for id in doc.elements_with_tag("w") {
        assert!(doc.node(id).attribute(PRONUNCIATION_ATTR).is_some());
    }

    let output = aligner.align(&prepared, &one_second()).expect("alignment");
    assert_eq!(
        bounds(&output),
        [
            span("s0w0", 10, 250),
            span("s0w1", 250, 500),
            span("s0w2", 500, 750),
            span("s0w3", 750, 990)
        ]
    );
    assert_eq!(output.duration_ms, 1_000);

    let sentence = &output.tiers[1];
    assert_eq!(sentence.name, "Sentence");
    assert_eq!(sentence.intervals.len(), 1);
    assert_eq!(sentence.intervals[0].text, "Bonjour Comment ça va");
    assert_eq!(
        (sentence.intervals[0].start_ms, sentence.intervals[0].end_ms),
        (10, 990)
    );
}

#[test]
fn bare_mode_keeps_engine_boundaries() {
    let config = AlignConfig {
        bare: true,
        ..AlignConfig::default()
    };
    let aligner = aligner(config, EvenEngine::new());
    let prepared = prepare(&aligner, r#"<s lang="fra">Bonjour ça</s>"#);
    let output = aligner.align(&prepared, &one_second()).expect("alignment");
    assert_eq!(
        bounds(&output),
        [span("s0w0", 20, 480), span("s0w1", 520, 980)]
    );
}

#[test]
fn removed_dna_is_skipped_and_shifted_back() {
    let engine = EvenEngine::new();
    let aligner = ReadAlignerBuilder::new(dna_config(DnaMethod::Remove))
        .with_engine(Box::new(engine))
        .build()
        .expect("build should succeed");
    let prepared = prepare(&aligner, r#"<s lang="fra">Bonjour ça</s>"#);
    let output = aligner.align(&prepared, &one_second()).expect("alignment");
    // The first word is snapped out of the removed range and the gap across
    // it is not absorbed by either neighbour.
    assert_eq!(
        bounds(&output),
        [span("s0w0", 10, 250), span("s0w1", 500, 985)]
    );
}

#[test]
fn muted_dna_keeps_the_timeline() {
    let engine = EvenEngine::new();
    let config = dna_config(DnaMethod::Mute);
    let aligner = ReadAlignerBuilder::new(config)
        .with_engine(Box::new(engine))
        .build()
        .expect("build should succeed");
    let prepared = prepare(&aligner, r#"<s lang="fra">Bonjour ça</s>"#);
    let output = aligner.align(&prepared, &one_second()).expect("alignment");
    assert_eq!(output.units.len(), 2);
    assert_eq!(output.units[0].start_ms, 10);
    assert_eq!(output.units[1].end_ms, 990);
}

#[test]
fn muted_dna_audio_reaches_the_engine_zeroed() {
    let engine = std::sync::Arc::new(EvenEngine::new());

    struct Shared(std::sync::Arc<EvenEngine>);
    impl AlignmentEngine for Shared {
        fn align(
            &self,
            dictionary: &Dictionary,
            grammar: &Grammar,
            samples: &[f32],
            sample_rate_hz: u32,
        ) -> Result<Vec<EngineSegment>, AlignmentError> {
            self.0.align(dictionary, grammar, samples, sample_rate_hz)
        }
    }

    let aligner = ReadAlignerBuilder::new(dna_config(DnaMethod::Mute))
        .with_engine(Box::new(Shared(engine.clone())))
        .build()
        .expect("build should succeed");
    let prepared = prepare(&aligner, r#"<s lang="fra">Bonjour ça</s>"#);
    aligner.align(&prepared, &one_second()).expect("alignment");

    let received = engine.received.lock().expect("lock");
    assert_eq!(received.len(), 1);
    let audio = &received[0];
    assert_eq!(audio.len(), RATE as usize);
    assert!(audio[4_000..8_000].iter().all(|&s| s == 0.0));
    assert_eq!(audio[3_999], 0.5);
    assert_eq!(audio[8_000], 0.5);
}

#[test]
fn anchors_restrict_the_audio_of_each_sequence() {
    let aligner = aligner(AlignConfig::default(), EvenEngine::new());
    let prepared = prepare(
        &aligner,
        r#"<s lang="fra"><anchor time="0.5s"/>Bonjour ça</s>"#,
    );
    let output = aligner.align(&prepared, &one_second()).expect("alignment");
    // The anchor is a hard boundary: the first word does not reach back
    // before it.
    assert_eq!(
        bounds(&output),
        [span("s0w0", 500, 750), span("s0w1", 750, 990)]
    );
}

#[test]
fn missing_segment_is_an_alignment_mismatch() {
    let engine = EvenEngine {
        drop_last: true,
        received: Mutex::new(Vec::new()),
    };
    let aligner = aligner(AlignConfig::default(), engine);
    let prepared = prepare(&aligner, r#"<s lang="fra">Bonjour ça</s>"#);
    let err = aligner.align(&prepared, &one_second()).unwrap_err();
    assert!(
        matches!(err, AlignmentError::AlignmentMismatch { .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn invalid_conversion_aborts_by_default() {
    let aligner = aligner(AlignConfig::default(), EvenEngine::new());
    let doc = Document::parse(r#"<s lang="zzz">hello</s>"#).expect("valid markup");
    let err = aligner.prepare("story", &doc).unwrap_err();
    match err {
        AlignmentError::ConversionFailed { unit_ids } => assert_eq!(unit_ids, ["s0w0"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invalid_conversion_can_be_tolerated() {
    let config = AlignConfig {
        abort_on_invalid_g2p: false,
        ..AlignConfig::default()
    };
    let aligner = aligner(config, EvenEngine::new());
    let doc = Document::parse(r#"<s lang="zzz">hello</s>"#).expect("valid markup");
    let prepared = aligner.prepare("story", &doc).expect("prepare");
    assert!(!prepared.report.all_valid);
    assert_eq!(prepared.report.invalid_units, ["s0w0"]);
}

#[test]
fn unit_inside_do_not_align_markup_is_structural() {
    let aligner = aligner(AlignConfig::default(), EvenEngine::new());
    let doc = Document::parse(
        r#"<s lang="fra">Bonjour <p do-not-align="true"><w>ça</w></p></s>"#,
    )
    .expect("valid markup");
    let err = aligner.prepare("story", &doc).unwrap_err();
    assert!(matches!(err, AlignmentError::Structural { .. }), "{err}");
}

#[test]
fn aligning_without_an_engine_is_rejected() {
    let aligner = ReadAlignerBuilder::new(AlignConfig::default())
        .build()
        .expect("build should succeed");
    let prepared = prepare(&aligner, r#"<s lang="fra">Bonjour</s>"#);
    let err = aligner.align(&prepared, &one_second()).unwrap_err();
    assert!(matches!(err, AlignmentError::InvalidInput { .. }));
}

#[test]
fn align_document_annotates_units_and_exports() {
    let aligner = aligner(AlignConfig::default(), EvenEngine::new());
    let prepared = prepare(&aligner, r#"<s lang="fra">Bonjour ça</s>"#);
    let (annotated, output) = aligner
        .align_document(&prepared, &one_second())
        .expect("alignment");

    let first = annotated.find_by_id("s0w0").expect("unit present");
    assert_eq!(annotated.node(first).attribute("time"), Some("0.010"));
    assert_eq!(annotated.node(first).attribute("dur"), Some("0.490"));

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("story.json");
    write_json(&path, &output).expect("export");
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(json["meta"]["unit_count"], 2);
    assert_eq!(json["tiers"][0]["name"], "Word");
}

#[test]
fn dictionary_and_grammar_files_for_a_prepared_document() {
    let aligner = aligner(AlignConfig::default(), EvenEngine::new());
    let prepared = prepare(&aligner, r#"<s lang="fra">Bonjour ça</s>"#);
    let dictionary = aligner.dictionary(&prepared).expect("dictionary");
    assert_eq!(
        dictionary.to_dict_string(),
        "s0w0\tB AO N ZH UW R\ns0w1\tS AA\n"
    );
    let grammar = aligner.grammar(&prepared).expect("grammar");
    assert!(grammar.to_fsg_string().starts_with("FSG_BEGIN story\n"));
}

#[test]
fn decomposed_and_precomposed_text_convert_alike() {
    let aligner = aligner(AlignConfig::default(), EvenEngine::new());
    let composed = prepare(&aligner, "<s lang=\"fra\">\u{e7}a</s>");
    let decomposed = prepare(&aligner, "<s lang=\"fra\">c\u{327}a</s>");
    assert!(composed.report.all_valid);
    assert!(decomposed.report.all_valid);

    let pronunciation = |prepared: &PreparedDocument| {
        let doc = &prepared.document;
        let unit = doc.elements_with_tag("w").next().expect("one unit");
        doc.node(unit).attribute(PRONUNCIATION_ATTR).map(str::to_string)
    };
    assert_eq!(pronunciation(&composed), Some("S AA".to_string()));
    assert_eq!(pronunciation(&decomposed), pronunciation(&composed));
}

#[test]
fn lexicon_misses_fall_back_to_the_next_language() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join("lex.dict"), "HELLO\tHH AH0 L OW1\n").expect("write lexicon");
    std::fs::write(
        dir.path().join("lex.json"),
        r#"{"lang": "lex", "lexicon": "lex.dict"}"#,
    )
    .expect("write language file");

    let config = AlignConfig {
        g2p_fallbacks: vec!["fra".to_string()],
        ..AlignConfig::default()
    };
    let aligner = ReadAlignerBuilder::new(config)
        .with_language_dir(dir.path())
        .build()
        .expect("build should succeed");
    let prepared = prepare(&aligner, r#"<s lang="lex">Hello ça</s>"#);
    assert!(prepared.report.all_valid);
    assert_eq!(prepared.report.fallback_units, 1);

    let dictionary = aligner.dictionary(&prepared).expect("dictionary");
    assert_eq!(
        dictionary.to_dict_string(),
        "s0w0\tHH AH0 L OW1\ns0w1\tS AA\n"
    );
}
