//! Script marker parser
//!
//! Line-oriented finite state machine. State is the current speaker plus a
//! text accumulation; each trimmed line is classified by [`classify_line`]
//! and the matching transition is applied. Classification precedence:
//!
//! 1. blank line: skipped
//! 2. overlap marker `[OVERLAP - Host N]`: flush, switch speaker, emit an Overlap segment
//! 3. simultaneous marker `[SIMULTANEOUS` / `[Both -`: discarded
//! 4. host marker (`[Host N]`, `[INTRO - Host N]`, ...): flush, switch speaker, start accumulating
//! 5. whole-line stage direction `[...]`: dropped without flushing
//! 6. anything else: appended to the accumulation
//!
//! Markers are case- and spacing-sensitive substrings. Bracketed text that is
//! not a whole-line stage direction is kept verbatim.

use super::{Segment, SpeakerId, TimingTag};

const OVERLAP_MARKER: &str = "[OVERLAP - Host";
const SIMULTANEOUS_MARKERS: [&str; 2] = ["[SIMULTANEOUS", "[Both -"];

const HOST_1_MARKERS: [&str; 4] = [
    "[Host 1]",
    "[INTRO - Host 1]",
    "[MAIN DISCUSSION - Host 1]",
    "[OUTRO - Host 1]",
];

const HOST_2_MARKERS: [&str; 4] = [
    "[Host 2]",
    "[INTRO - Host 2]",
    "[MAIN DISCUSSION - Host 2]",
    "[OUTRO - Host 2]",
];

/// Classification of one script line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    /// Overlap marker; `text` follows the marker's closing bracket and may be empty
    Overlap { speaker: SpeakerId, text: &'a str },
    Simultaneous,
    /// Host marker; `text` is the line with every host marker removed
    Host { speaker: SpeakerId, text: String },
    StageDirection,
    Text(&'a str),
}

/// Classify a single line (surrounding whitespace is ignored)
pub fn classify_line(line: &str) -> LineKind<'_> {
    let line = line.trim();

    if line.is_empty() {
        return LineKind::Blank;
    }

    if let Some(start) = line.find(OVERLAP_MARKER) {
        let speaker = if line.contains("Host 1") {
            SpeakerId::A
        } else {
            SpeakerId::B
        };
        let text = line[start..]
            .find(']')
            .map(|close| line[start + close + 1..].trim())
            .unwrap_or("");
        return LineKind::Overlap { speaker, text };
    }

    if SIMULTANEOUS_MARKERS.iter().any(|m| line.contains(m)) {
        return LineKind::Simultaneous;
    }

    let speaker = if HOST_1_MARKERS.iter().any(|m| line.contains(m)) {
        Some(SpeakerId::A)
    } else if HOST_2_MARKERS.iter().any(|m| line.contains(m)) {
        Some(SpeakerId::B)
    } else {
        None
    };
    if let Some(speaker) = speaker {
        return LineKind::Host {
            speaker,
            text: strip_host_markers(line),
        };
    }

    if line.starts_with('[') && line.ends_with(']') {
        return LineKind::StageDirection;
    }

    LineKind::Text(line)
}

fn strip_host_markers(line: &str) -> String {
    let mut text = line.to_string();
    for marker in HOST_1_MARKERS.iter().chain(HOST_2_MARKERS.iter()) {
        if text.contains(marker) {
            text = text.replace(marker, "");
        }
    }
    text.trim().to_string()
}

/// Parser state: current speaker and pending text
struct ParserState {
    speaker: SpeakerId,
    accumulation: String,
    segments: Vec<Segment>,
}

impl ParserState {
    fn new() -> Self {
        Self {
            speaker: SpeakerId::A,
            accumulation: String::new(),
            segments: Vec::new(),
        }
    }

    /// Emit the accumulation as a Normal segment for the current speaker
    fn flush(&mut self) {
        let text = std::mem::take(&mut self.accumulation);
        self.emit(&text, TimingTag::Normal);
    }

    fn emit(&mut self, text: &str, timing: TimingTag) {
        let text = text.trim();
        if !text.is_empty() {
            self.segments.push(Segment::new(text, self.speaker, timing));
        }
    }

    fn apply(&mut self, kind: LineKind<'_>) {
        match kind {
            LineKind::Blank | LineKind::Simultaneous | LineKind::StageDirection => {}
            LineKind::Overlap { speaker, text } => {
                self.flush();
                self.speaker = speaker;
                self.emit(text, TimingTag::Overlap);
            }
            LineKind::Host { speaker, text } => {
                self.flush();
                self.speaker = speaker;
                self.accumulation = text;
            }
            LineKind::Text(text) => {
                self.accumulation.push(' ');
                self.accumulation.push_str(text);
            }
        }
    }

    fn finish(mut self) -> Vec<Segment> {
        self.flush();
        self.segments
    }
}

/// Parse a full script into ordered segments
///
/// Never fails: unknown markup is treated as literal text.
pub fn parse_script(script: &str) -> Vec<Segment> {
    let mut state = ParserState::new();
    for line in script.lines() {
        state.apply(classify_line(line));
    }
    state.finish()
}

/// Render segments back into script text, one line per segment
///
/// Simultaneous segments are written with a plain host marker since the
/// parser discards simultaneous markers.
pub fn serialize_script(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        let marker = match segment.timing {
            TimingTag::Overlap => format!("[OVERLAP - {}]", segment.speaker.label()),
            TimingTag::Normal | TimingTag::Simultaneous => {
                format!("[{}]", segment.speaker.label())
            }
        };
        out.push_str(&marker);
        out.push(' ');
        out.push_str(&segment.text);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concrete_three_line_script() {
        let script = "[INTRO - Host 1] Welcome back.\n\
                      [Host 2] Glad to be here.\n\
                      [OVERLAP - Host 1] Oh totally—\n";

        let segments = parse_script(script);
        assert_eq!(
            segments,
            vec![
                Segment::normal("Welcome back.", SpeakerId::A),
                Segment::normal("Glad to be here.", SpeakerId::B),
                Segment::new("Oh totally—", SpeakerId::A, TimingTag::Overlap),
            ]
        );
    }

    #[test]
    fn test_classification_precedence() {
        assert_eq!(classify_line("   "), LineKind::Blank);
        // Overlap wins over host markers on the same line
        assert!(matches!(
            classify_line("[OVERLAP - Host 2] [Host 1] hi"),
            LineKind::Overlap { speaker: SpeakerId::A, .. }
        ));
        assert_eq!(classify_line("[SIMULTANEOUS - Both] ha"), LineKind::Simultaneous);
        assert_eq!(classify_line("[Both - laughing]"), LineKind::Simultaneous);
        assert_eq!(classify_line("[Host 2] [SIMULTANEOUS]"), LineKind::Simultaneous);
        assert_eq!(classify_line("[laughing]"), LineKind::StageDirection);
        assert_eq!(classify_line("[sic] as written"), LineKind::Text("[sic] as written"));
    }

    #[test]
    fn test_host_1_checked_before_host_2() {
        assert_eq!(
            classify_line("[Host 2] then [Host 1] again"),
            LineKind::Host {
                speaker: SpeakerId::A,
                text: "then  again".to_string()
            }
        );
    }

    #[test]
    fn test_overlap_text_after_marker_bracket() {
        assert_eq!(
            classify_line("[OVERLAP - Host 2] And then—"),
            LineKind::Overlap {
                speaker: SpeakerId::B,
                text: "And then—"
            }
        );
        assert_eq!(
            classify_line("[OVERLAP - Host 2"),
            LineKind::Overlap {
                speaker: SpeakerId::B,
                text: ""
            }
        );
    }

    #[test]
    fn test_empty_overlap_switches_speaker_without_segment() {
        let segments = parse_script("[Host 1] One.\n[OVERLAP - Host 2]\nstill two\n");
        assert_eq!(
            segments,
            vec![
                Segment::normal("One.", SpeakerId::A),
                Segment::normal("still two", SpeakerId::B),
            ]
        );
    }

    #[test]
    fn test_host_marker_without_text_collects_following_lines() {
        let segments = parse_script("[MAIN DISCUSSION - Host 2]\nfirst line\n\nsecond line\n");
        assert_eq!(
            segments,
            vec![Segment::normal("first line second line", SpeakerId::B)]
        );
    }

    #[test]
    fn test_text_before_any_marker_belongs_to_host_1() {
        let segments = parse_script("Cold open.\n[Host 2] Hi.");
        assert_eq!(segments[0], Segment::normal("Cold open.", SpeakerId::A));
        assert_eq!(segments[1], Segment::normal("Hi.", SpeakerId::B));
    }

    #[test]
    fn test_empty_script() {
        assert!(parse_script("").is_empty());
        assert!(parse_script("\n  \n[music]\n").is_empty());
    }

    #[test]
    fn test_serialize_uses_timing_markers() {
        let segments = vec![
            Segment::normal("a", SpeakerId::A),
            Segment::new("b", SpeakerId::B, TimingTag::Overlap),
            Segment::new("c", SpeakerId::A, TimingTag::Simultaneous),
        ];
        assert_eq!(
            serialize_script(&segments),
            "[Host 1] a\n[OVERLAP - Host 2] b\n[Host 1] c\n"
        );
    }
}
