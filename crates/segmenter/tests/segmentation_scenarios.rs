use avsrt_model::{BlockConfig, GateConfig, Segment};
use avsrt_segmenter::text::{needs_split, visible_char_count};
use avsrt_segmenter::{wrap_text, BlockBuilder, BuildWarning, SegmentGate};
use proptest::prelude::*;

fn tight_config() -> BlockConfig {
    BlockConfig {
        merge_gap_ms: 150,
        max_block_ms: 6000,
        max_lines: 2,
        chars_per_line: 5,
        target_chars_per_sec: 10.0,
        ..Default::default()
    }
}

#[test]
fn gate_then_build_produces_three_blocks() {
    let segments = vec![
        Segment::new(0, 0, 500, "ああああ"),
        Segment::new(1, 600, 1100, "いいい"),
        Segment::new(2, 2000, 2100, "!!!"),
        Segment::new(3, 3000, 9000, "かかかかか。きききききき"),
    ];

    // The fixture text is deliberately repetitive; only the punctuation
    // rule should fire here.
    let gate_config = GateConfig {
        max_repeated_char_ratio: 1.0,
        ..Default::default()
    };
    let gated = SegmentGate::new(gate_config, "ja").apply(&segments);
    assert_eq!(gated.kept.len(), 3);

    let outcome = BlockBuilder::new(tight_config(), "ja").build(&gated.kept);
    let records = outcome.records();
    assert_eq!(records.len(), 3);
    assert_eq!((records[0].start_ms, records[0].end_ms), (0, 1100));
    assert_eq!(records[0].text, "ああああいいい");
    assert_eq!((records[1].start_ms, records[1].end_ms), (3000, 6000));
    assert_eq!(records[1].text, "かかかかか。");
    assert_eq!((records[2].start_ms, records[2].end_ms), (6000, 9000));
    assert_eq!(records[2].text, "きききききき");
}

#[test]
fn unsplittable_block_renders_as_two_forced_lines() {
    let config = BlockConfig {
        max_lines: 2,
        chars_per_line: 10,
        ..Default::default()
    };
    let text = "あ".repeat(100);
    let outcome = BlockBuilder::new(config.clone(), "ja").build(&[Segment::new(0, 0, 1, &text)]);

    assert_eq!(outcome.blocks.len(), 1);
    assert_eq!((outcome.blocks[0].start_ms, outcome.blocks[0].end_ms), (0, 1));
    assert!(matches!(
        outcome.warnings.as_slice(),
        [BuildWarning::Unsplittable { chars: 100, .. }]
    ));

    let wrapped = wrap_text(&outcome.blocks[0].text, config.chars_per_line, config.max_lines);
    assert_eq!(wrapped.lines.len(), 2);
    assert!(wrapped.overflowed);
    assert_eq!(wrapped.lines.concat(), text);
}

#[test]
fn long_text_wraps_into_two_lines() {
    let text: String = "字".repeat(55);
    let wrapped = wrap_text(&text, 30, 2);
    assert_eq!(wrapped.lines.len(), 2);
    assert!(wrapped.lines.iter().all(|line| line.chars().count() <= 30));
}

#[test]
fn spaced_language_blocks_join_with_spaces() {
    let segments = vec![
        Segment::new(0, 0, 1500, "good morning"),
        Segment::new(1, 1600, 3000, "everyone"),
    ];
    let config = BlockConfig {
        chars_per_line: 42,
        ..Default::default()
    };
    let outcome = BlockBuilder::new(config, "en").build(&segments);
    assert_eq!(outcome.blocks.len(), 1);
    assert_eq!(outcome.blocks[0].text, "good morning everyone");
}

fn segments_strategy() -> impl Strategy<Value = Vec<Segment>> {
    prop::collection::vec((0u64..600, 1u64..5000, "[あ-ん。、]{1,40}"), 0..24).prop_map(
        |specs| {
            let mut cursor = 0u64;
            specs
                .into_iter()
                .enumerate()
                .map(|(idx, (gap, duration, text))| {
                    let start = cursor + gap;
                    cursor = start + duration;
                    Segment::new(idx as u64, start, cursor, text)
                })
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn blocks_are_ordered_and_within_limits(segments in segments_strategy()) {
        let config = BlockConfig::default();
        let outcome = BlockBuilder::new(config.clone(), "ja").build(&segments);

        for pair in outcome.blocks.windows(2) {
            prop_assert!(pair[0].end_ms <= pair[1].start_ms);
        }

        for block in &outcome.blocks {
            prop_assert!(block.end_ms > block.start_ms);
            let flagged = outcome.warnings.iter().any(|w| matches!(
                w,
                BuildWarning::Unsplittable { start_ms, end_ms, .. }
                    if *start_ms == block.start_ms && *end_ms == block.end_ms
            ));
            prop_assert!(flagged || !needs_split(block, &config));
        }

        let chars_in: usize = segments.iter().map(|s| visible_char_count(&s.text)).sum();
        let chars_out: usize = outcome.blocks.iter().map(|b| visible_char_count(&b.text)).sum();
        prop_assert_eq!(chars_in, chars_out);
    }

    #[test]
    fn build_is_deterministic(segments in segments_strategy()) {
        let builder = BlockBuilder::with_defaults("ja");
        let first = builder.build(&segments);
        let second = builder.build(&segments);
        prop_assert_eq!(first.blocks, second.blocks);
        prop_assert_eq!(first.warnings, second.warnings);
    }
}
