use super::*;

fn extractor() -> Extractor {
    Extractor::new().expect("extractor compiles")
}

fn source(raw: &[&str]) -> Vec<SourceLine> {
    raw.iter().map(|text| SourceLine::plain(*text)).collect()
}

fn classify(text: &str) -> Line {
    LineClassifier::new()
        .expect("classifier compiles")
        .classify(&SourceLine::plain(text))
}

fn ids(items: &[Item]) -> Vec<String> {
    items.iter().map(|item| item.identifier.to_string()).collect()
}

#[test]
fn classify_drops_known_noise_markers() {
    for text in [
        "F 023",
        "Tip",
        "Tip 3 使い方",
        "Words to Use",
        "基本",
        "発展",
        "Chapter 2",
        "○ water 水",
        "14 15",
    ] {
        assert_eq!(classify(text).category, Category::Noise, "{text}");
    }
    assert_eq!(classify("   ").category, Category::Empty);
}

#[test]
fn classify_reads_identifier_lines() {
    let header = classify("17");
    assert_eq!(header.category, Category::IdHeader);
    assert_eq!(
        header.identifier,
        Some(RawIdentifier::Full(Identifier::new(17, None)))
    );

    let native_header = classify("017   駅に着いた。");
    assert_eq!(native_header.category, Category::IdHeader);
    assert_eq!(native_header.text, "駅に着いた。");
    assert_eq!(
        native_header.identifier,
        Some(RawIdentifier::Full(Identifier::new(17, None)))
    );

    let answer = classify("5-2 The cat sat.");
    assert_eq!(answer.category, Category::IdAnswer);
    assert_eq!(answer.text, "The cat sat.");
    assert_eq!(
        answer.identifier,
        Some(RawIdentifier::Full(Identifier::new(5, Some(2))))
    );

    let decorated = classify("1064＝");
    assert_eq!(decorated.category, Category::IdHeader);
    assert!(decorated.text.is_empty());

    let continuation = classify("-1");
    assert_eq!(continuation.category, Category::IdHeader);
    assert_eq!(continuation.identifier, Some(RawIdentifier::Continuation(1)));
}

#[test]
fn classify_rejects_long_numeric_prefix_as_identifier() {
    let line = classify("1234567 is a big number.");
    assert_eq!(line.category, Category::LatinText);
    assert!(line.identifier.is_none());
}

#[test]
fn classify_detects_blank_markers() {
    assert_eq!(classify("Flowers need ( ) ( ) every day.").category, Category::Question);
    assert_eq!(classify("I ___ tennis on Sundays.").category, Category::Question);
    assert_eq!(classify("彼は（　）来た。").category, Category::Question);
    assert_eq!(classify("花は（植物）です。").category, Category::NativeText);
    assert_eq!(classify("The woman some flowers.").category, Category::LatinText);
}

#[test]
fn classify_strips_checkboxes_and_footnote_prefix() {
    let line = classify("□□ F 023 it is raining");
    assert_eq!(line.category, Category::LatinText);
    assert_eq!(line.text, "it is raining");
}

#[test]
fn classify_ignores_decorative_emphasis() {
    let line = LineClassifier::new()
        .expect("classifier compiles")
        .classify(&SourceLine {
            text: "➡ went".to_string(),
            spans: vec![
                SourceSpan {
                    text: "➡ ".to_string(),
                    emphasized: true,
                },
                SourceSpan {
                    text: "went".to_string(),
                    emphasized: true,
                },
            ],
        });
    assert_eq!(line.highlights, vec!["went".to_string()]);
}

#[test]
fn identifiers_order_numerically_with_sub_index_after_base() {
    let mut identifiers = ["10", "2-1", "2"]
        .iter()
        .filter_map(|token| RawIdentifier::parse(token))
        .filter_map(|raw| raw.resolve(None))
        .collect::<Vec<Identifier>>();
    identifiers.sort();

    let rendered = identifiers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<String>>();
    assert_eq!(rendered, vec!["2", "2-1", "10"]);
}

#[test]
fn continuation_identifier_needs_a_previous_block() {
    let raw = RawIdentifier::parse("-1").expect("continuation parses");
    assert_eq!(raw.resolve(None), None);
    assert_eq!(
        raw.resolve(Some(Identifier::new(1064, None))),
        Some(Identifier::new(1064, Some(1)))
    );
    assert_eq!(RawIdentifier::parse("0"), None);
}

#[test]
fn segment_state_transition_table() {
    let cases = [
        (
            SegmentState::SeekHeader,
            Category::LatinText,
            false,
            (SegmentState::SeekHeader, Route::LookBack),
        ),
        (
            SegmentState::GatherNative,
            Category::NativeText,
            false,
            (SegmentState::GatherNative, Route::Prompt),
        ),
        (
            SegmentState::GatherNative,
            Category::Question,
            false,
            (SegmentState::GatherQuestion, Route::Prompt),
        ),
        (
            SegmentState::GatherQuestion,
            Category::NativeText,
            false,
            (SegmentState::GatherQuestion, Route::Prompt),
        ),
        (
            SegmentState::SeekAnswer,
            Category::NativeText,
            false,
            (SegmentState::SeekAnswer, Route::Prompt),
        ),
        (
            SegmentState::SeekAnswer,
            Category::LatinText,
            false,
            (SegmentState::GatherExplanation, Route::Answer),
        ),
        (
            SegmentState::GatherExplanation,
            Category::NativeText,
            false,
            (SegmentState::GatherExplanation, Route::LookBack),
        ),
        (
            SegmentState::GatherExplanation,
            Category::NativeText,
            true,
            (SegmentState::GatherExplanation, Route::Answer),
        ),
        (
            SegmentState::GatherExplanation,
            Category::Question,
            false,
            (SegmentState::GatherExplanation, Route::Answer),
        ),
    ];

    for (state, category, marker_seen, expected) in cases {
        assert_eq!(
            state.on_content(category, marker_seen),
            expected,
            "{state:?} + {category:?} (marker_seen={marker_seen})"
        );
    }
    assert!(SegmentState::SeekAnswer.in_answer_phase());
    assert!(!SegmentState::GatherQuestion.in_answer_phase());
}

#[test]
fn segmenter_enters_seek_answer_on_repeated_bare_header() {
    let classifier = LineClassifier::new().expect("classifier compiles");
    let mut segmenter = Segmenter::new();
    for text in ["15", "Flowers need ( ) ( ) every day.", "15"] {
        segmenter.push(classifier.classify(&SourceLine::plain(text)));
    }
    assert_eq!(segmenter.state(), SegmentState::SeekAnswer);

    let blocks = segmenter.finish();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].sequence, 0);
    assert!(blocks[0].lines.iter().all(|line| line.phase == Phase::Prompt));
}

#[test]
fn look_back_context_attaches_to_next_header() {
    let extraction = extractor().extract(&source(&[
        "花は毎日水をやる必要がある。",
        "15",
        "Flowers need ( ) ( ) every day.",
        "15",
        "Flowers need to be watered every day.",
    ]));

    assert_eq!(extraction.items.len(), 1);
    let item = &extraction.items[0];
    assert_eq!(item.identifier.to_string(), "15");
    assert_eq!(item.native, "花は毎日水をやる必要がある。");
    assert_eq!(item.filled_sentence, "Flowers need to be watered every day.");
    assert_eq!(item.answer.text(), Some("to be watered"));
    assert_eq!(
        item.rendered_sentence(),
        "Flowers need {to be watered} every day."
    );
}

#[test]
fn blocks_without_filled_sentence_are_dropped() {
    let extraction = extractor().extract(&source(&[
        "77",
        "花が咲いている。",
        "78",
        "The cat ( ) on the mat.",
        "78",
        "The cat sat on the mat.",
    ]));

    assert_eq!(ids(&extraction.items), vec!["78"]);
    assert_eq!(extraction.items[0].answer.text(), Some("sat"));
    assert_eq!(extraction.stats.blocks_sealed, 2);
    assert_eq!(extraction.stats.blocks_dropped, 1);
    assert_eq!(extraction.stats.items_kept, 1);
}

#[test]
fn blank_marker_answer_uses_prefix_and_last_suffix() {
    let answer = extract_answer(
        "The train ( ) ( ) ( ) 20 minutes late.",
        "The train arrived at Tokyo Station 20 minutes late.",
        &[],
    );
    assert_eq!(answer.text(), Some("arrived at Tokyo Station"));
    assert!(matches!(
        answer,
        AnswerOutcome::Resolved {
            strategy: AnswerStrategy::BlankMarker,
            ..
        }
    ));
}

#[test]
fn underscore_blank_is_a_marker() {
    let answer = extract_answer("I ____ tennis every Sunday.", "I play tennis every Sunday.", &[]);
    assert_eq!(answer.text(), Some("play"));
}

#[test]
fn common_affix_answer_when_question_has_no_markers() {
    let answer = extract_answer(
        "The woman some flowers.",
        "The woman is watering some flowers.",
        &[],
    );
    assert_eq!(answer.text(), Some("is watering"));
    assert!(matches!(
        answer,
        AnswerOutcome::Resolved {
            strategy: AnswerStrategy::CommonAffix,
            ..
        }
    ));
}

#[test]
fn unresolvable_answer_is_flagged_not_dropped() {
    let answer = extract_answer("", "Hello there.", &[]);
    assert_eq!(answer, AnswerOutcome::Unresolved);
    assert_eq!(answer.display_text(), UNRESOLVED_MARKER);
    assert_eq!(answer.render("Hello there."), "Hello there.");

    let collapsed = extract_answer("He ( ) tired.", "He tired.", &[]);
    assert_eq!(collapsed, AnswerOutcome::Unresolved);
}

#[test]
fn highlighted_spans_win_over_heuristics() {
    let lines = vec![
        SourceLine::plain("12"),
        SourceLine::plain("She ( ) here for ( )."),
        SourceLine {
            text: "12 She has lived here for ten years.".to_string(),
            spans: vec![
                SourceSpan {
                    text: "12 She ".to_string(),
                    emphasized: false,
                },
                SourceSpan {
                    text: "has lived".to_string(),
                    emphasized: true,
                },
                SourceSpan {
                    text: " here for ".to_string(),
                    emphasized: false,
                },
                SourceSpan {
                    text: "ten years".to_string(),
                    emphasized: true,
                },
                SourceSpan {
                    text: ".".to_string(),
                    emphasized: false,
                },
            ],
        },
    ];

    let extraction = extractor().extract(&lines);
    let item = &extraction.items[0];
    assert_eq!(item.answer.text(), Some("has lived, ten years"));
    assert_eq!(
        item.rendered_sentence(),
        "She {has lived} here for {ten years}."
    );
    assert_eq!(extraction.stats.highlight_answers, 1);
}

#[test]
fn continuation_marker_composes_with_previous_base() {
    let extraction = extractor().extract(&source(&[
        "1064 私は疲れていた。",
        "I was ( ) tired.",
        "1064 I was very tired.",
        "-1",
        "彼も疲れていた。",
        "He was ( ) tired.",
        "-1 He was also tired.",
    ]));

    assert_eq!(ids(&extraction.items), vec!["1064", "1064-1"]);
    assert_eq!(extraction.items[0].answer.text(), Some("very"));
    assert_eq!(extraction.items[1].native, "彼も疲れていた。");
    assert_eq!(extraction.items[1].answer.text(), Some("also"));
}

#[test]
fn continuation_marker_without_previous_block_is_ignored() {
    let extraction = extractor().extract(&source(&[
        "-1",
        "Orphan ( ) line.",
        "5",
        "She ( ) happy.",
        "5",
        "She is happy.",
    ]));

    assert_eq!(ids(&extraction.items), vec!["5"]);
    assert_eq!(extraction.items[0].question, "She ( ) happy.");
    assert_eq!(extraction.items[0].answer.text(), Some("is"));
}

#[test]
fn identifier_seen_after_its_answer_opens_duplicate_item() {
    let extraction = extractor().extract(&source(&[
        "3",
        "It ( ) cold.",
        "3 It was cold.",
        "3 It is cold.",
    ]));

    assert_eq!(ids(&extraction.items), vec!["3", "3"]);
    assert_eq!(extraction.items[0].answer.text(), Some("was"));
    assert_eq!(extraction.items[1].filled_sentence, "It is cold.");
    assert_eq!(extraction.items[1].answer, AnswerOutcome::Unresolved);
    assert_eq!(extraction.stats.unresolved_answers, 1);
}

#[test]
fn explanation_marker_splits_answer_from_notes() {
    let extraction = extractor().extract(&source(&[
        "8",
        "I'm looking ( ) ( ) seeing you.",
        "8",
        "I'm looking forward to seeing you.",
        "▶ look forward to ~ing で「～を楽しみにする」",
        "The to here is a preposition.",
    ]));

    let item = &extraction.items[0];
    assert_eq!(item.filled_sentence, "I'm looking forward to seeing you.");
    assert_eq!(item.answer.text(), Some("forward to"));
    assert_eq!(
        item.explanation,
        "▶ look forward to ~ing で「～を楽しみにする」\nThe to here is a preposition."
    );
}

#[test]
fn wrapped_filled_sentence_is_joined_before_explanation() {
    let extraction = extractor().extract(&source(&[
        "9",
        "It ( ) ( ) ( ) for three days.",
        "9",
        "It has been raining",
        "for three days.",
        "Present perfect progressive.",
    ]));

    let item = &extraction.items[0];
    assert_eq!(item.filled_sentence, "It has been raining for three days.");
    assert_eq!(item.answer.text(), Some("has been raining"));
    assert_eq!(item.explanation, "Present perfect progressive.");
}

#[test]
fn native_text_keeps_only_first_sentence() {
    let extraction = extractor().extract(&source(&[
        "20 彼は駅に着いた。時間通りだった。",
        "He ( ) at the station.",
        "20 He arrived at the station.",
    ]));

    let item = &extraction.items[0];
    assert_eq!(item.native, "彼は駅に着いた。");
    assert_eq!(item.answer.text(), Some("arrived"));
}

#[test]
fn native_lines_after_answer_belong_to_next_item() {
    let extraction = extractor().extract(&source(&[
        "30",
        "It ( ) cold.",
        "30 It was cold.",
        "寒くなるだろう。",
        "31",
        "It will ( ) cold.",
        "31 It will be cold.",
    ]));

    assert_eq!(ids(&extraction.items), vec!["30", "31"]);
    assert_eq!(extraction.items[0].native, "");
    assert_eq!(extraction.items[0].explanation, "");
    assert_eq!(extraction.items[1].native, "寒くなるだろう。");
    assert_eq!(extraction.items[1].answer.text(), Some("be"));
}

#[test]
fn noise_between_header_and_body_is_skipped() {
    let extraction = extractor().extract(&source(&[
        "40",
        "F 12",
        "Tip",
        "Words to Use",
        "She ( ) tea.",
        "Chapter 3",
        "40",
        "She drinks tea.",
    ]));

    assert_eq!(extraction.items[0].answer.text(), Some("drinks"));
    assert_eq!(extraction.stats.noise_lines, 4);
    assert_eq!(extraction.stats.lines_seen, 8);
}

#[test]
fn markerless_question_falls_back_to_common_affix() {
    let extraction = extractor().extract(&source(&[
        "50 女性が花に水をやっている。",
        "The woman some flowers.",
        "50 The woman is watering some flowers.",
    ]));

    let item = &extraction.items[0];
    assert_eq!(item.question, "The woman some flowers.");
    assert_eq!(item.answer.text(), Some("is watering"));
    assert_eq!(extraction.stats.common_affix_answers, 1);
}

#[test]
fn native_lines_while_seeking_answer_stay_with_their_item() {
    let extraction = extractor().extract(&source(&[
        "60",
        "It ( ) hot.",
        "60",
        "暑かった。",
        "It was hot.",
        "61 彼は学生だ。",
        "He ( ) a student.",
        "61 He is a student.",
    ]));

    assert_eq!(ids(&extraction.items), vec!["60", "61"]);
    let first = &extraction.items[0];
    assert_eq!(first.native, "暑かった。");
    assert_eq!(first.filled_sentence, "It was hot.");
    assert_eq!(first.answer.text(), Some("was"));

    let second = &extraction.items[1];
    assert_eq!(second.native, "彼は学生だ。");
    assert_eq!(second.answer.text(), Some("is"));
}

#[test]
fn items_are_sorted_by_base_then_sub_index() {
    let extraction = extractor().extract(&source(&[
        "10",
        "Ten ( ) a number.",
        "10 Ten is a number.",
        "2-1",
        "Two ( ) small.",
        "2-1 Two looks small.",
        "2",
        "Two ( ) even.",
        "2 Two is even.",
    ]));

    assert_eq!(ids(&extraction.items), vec!["2", "2-1", "10"]);
}

#[test]
fn extraction_is_idempotent_and_round_trips() {
    let input = source(&[
        "花は毎日水をやる必要がある。",
        "15",
        "Flowers need ( ) ( ) every day.",
        "15",
        "Flowers need to be watered every day.",
        "16 私は駅に着いた。",
        "I ( ) at the station.",
        "16 I arrived at the station.",
        "17",
        "It ( ) cold.",
        "17 It is cold. It is cold.",
    ]);
    let extractor = extractor();
    let first = extractor.extract(&input);
    let second = extractor.extract(&input);
    assert_eq!(first.items, second.items);
    assert_eq!(first.stats, second.stats);

    for item in &first.items {
        assert_eq!(
            item.restored_sentence().as_deref(),
            Some(item.filled_sentence.as_str())
        );
        if let Some(answer) = item.answer.text() {
            let replaced = item
                .rendered_sentence()
                .replacen(&format!("{{{answer}}}"), answer, 1);
            assert_eq!(replaced, item.filled_sentence);
        }
    }
}

#[test]
fn multi_span_highlight_round_trips_span_by_span() {
    let spans = [
        ("He ", false),
        ("got", true),
        (" up ", false),
        ("very", true),
        (" early.", false),
    ];
    let lines = vec![
        SourceLine::plain("20"),
        SourceLine::plain("He ( ) up ( ) early."),
        SourceLine::plain("20"),
        SourceLine {
            text: "He got up very early.".to_string(),
            spans: spans
                .iter()
                .map(|(text, emphasized)| SourceSpan {
                    text: text.to_string(),
                    emphasized: *emphasized,
                })
                .collect(),
        },
    ];

    let extraction = extractor().extract(&lines);
    let item = &extraction.items[0];
    assert_eq!(item.answer.text(), Some("got, very"));
    assert_eq!(item.rendered_sentence(), "He {got} up {very} early.");
    assert_eq!(item.restored_sentence().as_deref(), Some("He got up very early."));

    assert_eq!(item.answer.restore("He got up very early."), None);
    assert_eq!(
        AnswerOutcome::Unresolved.restore("No braces here."),
        Some("No braces here.".to_string())
    );
}

#[test]
fn item_record_carries_sentinel_for_unresolved_answer() {
    let extraction = extractor().extract(&source(&["70", "70", "Nothing to compare here."]));
    let record = extraction.items[0].to_record();
    assert_eq!(record.id, "70");
    assert_eq!(record.answer, UNRESOLVED_MARKER);
    assert!(!record.answer_resolved);
    assert_eq!(record.en, "Nothing to compare here.");
}
