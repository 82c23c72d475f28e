//! Analytics pipeline: speaker talk-time, turn-taking, interruptions,
//! and questions, computed from a file's persisted segments per spec
//! §4.7. Pure function of its input segments, no model runners needed.

use serde::{Deserialize, Serialize};

/// Minimal view of a transcript segment this pipeline needs, decoupled
/// from `mpo_db::models::TranscriptSegment` so this crate doesn't
/// depend on `mpo-db`.
#[derive(Debug, Clone)]
pub struct AnalyticsSegment {
    pub speaker_label: String,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TalkTime {
    pub speaker_label: String,
    pub seconds: f64,
}

/// One speaker-to-speaker handoff, i.e. a segment whose speaker differs
/// from the immediately preceding segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub from_speaker: String,
    pub to_speaker: String,
    pub at_time: f64,
}

/// A turn where the incoming segment started before the outgoing one
/// ended, i.e. overlapping speech.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interruption {
    pub interrupter: String,
    pub interrupted: String,
    pub at_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionMention {
    pub speaker_label: String,
    pub at_time: f64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AnalyticsReport {
    pub talk_time: Vec<TalkTime>,
    pub turns: Vec<Turn>,
    pub interruptions: Vec<Interruption>,
    pub questions: Vec<QuestionMention>,
}

/// Segments are assumed sorted by `start_time` (the invariant the
/// segment repository's primary order guarantees); this never
/// re-sorts, since an out-of-order feed is a caller bug, not something
/// to recover from silently.
pub fn analyze(segments: &[AnalyticsSegment]) -> AnalyticsReport {
    let mut report = AnalyticsReport::default();
    if segments.is_empty() {
        return report;
    }

    let mut talk_time: std::collections::BTreeMap<String, f64> = std::collections::BTreeMap::new();

    for (idx, seg) in segments.iter().enumerate() {
        *talk_time.entry(seg.speaker_label.clone()).or_default() +=
            (seg.end_time - seg.start_time).max(0.0);

        if seg.text.trim_end().ends_with('?') {
            report.questions.push(QuestionMention {
                speaker_label: seg.speaker_label.clone(),
                at_time: seg.start_time,
                text: seg.text.clone(),
            });
        }

        if idx == 0 {
            continue;
        }
        let prev = &segments[idx - 1];
        if prev.speaker_label == seg.speaker_label {
            continue;
        }

        report.turns.push(Turn {
            from_speaker: prev.speaker_label.clone(),
            to_speaker: seg.speaker_label.clone(),
            at_time: seg.start_time,
        });

        if seg.start_time < prev.end_time {
            report.interruptions.push(Interruption {
                interrupter: seg.speaker_label.clone(),
                interrupted: prev.speaker_label.clone(),
                at_time: seg.start_time,
            });
        }
    }

    report.talk_time = talk_time
        .into_iter()
        .map(|(speaker_label, seconds)| TalkTime {
            speaker_label,
            seconds,
        })
        .collect();

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(speaker: &str, start: f64, end: f64, text: &str) -> AnalyticsSegment {
        AnalyticsSegment {
            speaker_label: speaker.to_string(),
            start_time: start,
            end_time: end,
            text: text.to_string(),
        }
    }

    #[test]
    fn empty_input_produces_empty_report() {
        let report = analyze(&[]);
        assert_eq!(report, AnalyticsReport::default());
    }

    #[test]
    fn talk_time_sums_per_speaker_across_non_adjacent_segments() {
        let segments = vec![
            seg("SPEAKER_00", 0.0, 1.0, "hi"),
            seg("SPEAKER_01", 1.0, 2.0, "hello"),
            seg("SPEAKER_00", 2.0, 4.0, "more"),
        ];
        let report = analyze(&segments);
        let t0 = report
            .talk_time
            .iter()
            .find(|t| t.speaker_label == "SPEAKER_00")
            .unwrap();
        assert_eq!(t0.seconds, 3.0);
    }

    #[test]
    fn same_speaker_adjacent_segments_produce_no_turn() {
        let segments = vec![
            seg("SPEAKER_00", 0.0, 1.0, "hi"),
            seg("SPEAKER_00", 1.0, 2.0, "there"),
        ];
        let report = analyze(&segments);
        assert!(report.turns.is_empty());
    }

    #[test]
    fn overlapping_next_segment_is_flagged_as_interruption() {
        let segments = vec![
            seg("SPEAKER_00", 0.0, 2.0, "go on"),
            seg("SPEAKER_01", 1.5, 3.0, "wait"),
        ];
        let report = analyze(&segments);
        assert_eq!(report.turns.len(), 1);
        assert_eq!(report.interruptions.len(), 1);
        assert_eq!(report.interruptions[0].interrupter, "SPEAKER_01");
        assert_eq!(report.interruptions[0].interrupted, "SPEAKER_00");
    }

    #[test]
    fn question_mark_endings_are_collected() {
        let segments = vec![
            seg("SPEAKER_00", 0.0, 1.0, "how are you?"),
            seg("SPEAKER_01", 1.0, 2.0, "fine."),
        ];
        let report = analyze(&segments);
        assert_eq!(report.questions.len(), 1);
        assert_eq!(report.questions[0].speaker_label, "SPEAKER_00");
    }
}
