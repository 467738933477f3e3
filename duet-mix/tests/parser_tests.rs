//! Script parser behavior over whole scripts

use duet_mix::script::{parse_script, serialize_script, Segment, SpeakerId, TimingTag};

const EPISODE: &str = r#"
[INTRO - Host 1] Welcome back to the show.
Today we are talking about tide pools.

[Host 2] I have been looking forward to this one.
[Sound of waves]
Honestly, for weeks.

[OVERLAP - Host 1] Same here!
[MAIN DISCUSSION - Host 1] So what lives in a tide pool?
[Host 2] Anemones, crabs, the occasional octopus.
[SIMULTANEOUS - Both laugh]
[OVERLAP - Host 2] And then—
[Host 1] Right, the octopus escapes.
[OUTRO - Host 2] Thanks for listening.
"#;

#[test]
fn test_episode_segments() {
    let segments = parse_script(EPISODE);

    let expected = vec![
        Segment::normal(
            "Welcome back to the show. Today we are talking about tide pools.",
            SpeakerId::A,
        ),
        Segment::normal(
            "I have been looking forward to this one. Honestly, for weeks.",
            SpeakerId::B,
        ),
        Segment::new("Same here!", SpeakerId::A, TimingTag::Overlap),
        Segment::normal("So what lives in a tide pool?", SpeakerId::A),
        Segment::normal("Anemones, crabs, the occasional octopus.", SpeakerId::B),
        Segment::new("And then—", SpeakerId::B, TimingTag::Overlap),
        Segment::normal("Right, the octopus escapes.", SpeakerId::A),
        Segment::normal("Thanks for listening.", SpeakerId::B),
    ];
    assert_eq!(segments, expected);
}

#[test]
fn test_no_segment_is_empty() {
    let script = "[Host 1]\n\n[Host 2]   \n[OVERLAP - Host 1]\n[Pause]\n[Host 1] done";
    let segments = parse_script(script);
    assert_eq!(segments, vec![Segment::normal("done", SpeakerId::A)]);
    assert!(segments.iter().all(|s| !s.text.trim().is_empty()));
}

#[test]
fn test_no_segment_contains_a_marker() {
    for segment in parse_script(EPISODE) {
        for marker in ["[Host 1]", "[Host 2]", "[OVERLAP", "[SIMULTANEOUS", "[INTRO", "[OUTRO"] {
            assert!(
                !segment.text.contains(marker),
                "{:?} contains {}",
                segment.text,
                marker
            );
        }
    }
}

#[test]
fn test_stage_direction_does_not_split_a_turn() {
    let script = "[Host 2] First half.\n[Long pause]\nSecond half.";
    assert_eq!(
        parse_script(script),
        vec![Segment::normal("First half. Second half.", SpeakerId::B)]
    );
}

#[test]
fn test_inline_brackets_are_literal() {
    let script = "[Host 1] The [redacted] file was\n[not] found";
    assert_eq!(
        parse_script(script),
        vec![Segment::normal("The [redacted] file was [not] found", SpeakerId::A)]
    );
}

#[test]
fn test_overlap_changes_following_speaker() {
    // Text after an overlap line belongs to the overlapping speaker
    let script = "[Host 1] Hello.\n[OVERLAP - Host 2] Hi!\nAnyway, as I said.";
    assert_eq!(
        parse_script(script),
        vec![
            Segment::normal("Hello.", SpeakerId::A),
            Segment::new("Hi!", SpeakerId::B, TimingTag::Overlap),
            Segment::normal("Anyway, as I said.", SpeakerId::B),
        ]
    );
}

#[test]
fn test_simultaneous_lines_never_reach_output() {
    let script = "[Host 1] One.\n[Both - laughing] ha ha\n[SIMULTANEOUS] yes!\n[Host 2] Two.";
    let segments = parse_script(script);
    assert_eq!(segments.len(), 2);
    assert!(segments.iter().all(|s| s.timing != TimingTag::Simultaneous));
}

#[test]
fn test_serialized_script_parses_back_identically() {
    let segments = parse_script(EPISODE);
    let text = serialize_script(&segments);
    assert_eq!(parse_script(&text), segments);

    // And serializing is stable from then on
    assert_eq!(serialize_script(&parse_script(&text)), text);
}

#[test]
fn test_plain_prose_is_one_host_1_segment() {
    let segments = parse_script("Just a paragraph\nwith no markers at all.");
    assert_eq!(
        segments,
        vec![Segment::normal("Just a paragraph with no markers at all.", SpeakerId::A)]
    );
}
