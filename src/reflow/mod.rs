/*!
 * Caption reflow engine.
 *
 * Turns recognized segments of arbitrary length into caption cues that obey
 * the per-line character limit and the per-cue line limit:
 *
 * - Words are never split and never reordered
 * - A segment that does not fit one cue is cut at the earliest sentence end,
 *   else the earliest clause end, else at the capacity boundary
 * - The segment's time span is shared between its cues by character count
 * - Cue timings are clamped so they never go backwards or overlap
 */

pub mod timing;
pub mod wrap;

use log::{debug, warn};

use crate::app_config::Config;
use crate::errors::ReflowError;
use crate::subtitle_processor::CaptionCue;
use crate::transcription::TranscriptSegment;

/// Characters that close a sentence
const SENTENCE_ENDINGS: &[char] = &['.', '!', '?', '…', '。', '！', '？'];

/// Characters that close a clause
const CLAUSE_ENDINGS: &[char] = &[',', ';', ':', '–', '—', '、', '，', '；', '：'];

/// Closing quotes and brackets ignored when looking for punctuation
const TRAILING_CLOSERS: &[char] = &['"', '\'', '”', '’', '»', ')', ']', '}', '」', '』', '）'];

/// Layout limits for caption cues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReflowOptions {
    max_line_length: usize,
    max_lines: usize,
}

impl ReflowOptions {
    pub fn new(max_line_length: usize, max_lines: usize) -> Result<Self, ReflowError> {
        if max_line_length == 0 {
            return Err(ReflowError::InvalidOptions(
                "max_line_length must be greater than 0".to_string(),
            ));
        }
        if max_lines == 0 {
            return Err(ReflowError::InvalidOptions(
                "max_lines must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            max_line_length,
            max_lines,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ReflowError> {
        Self::new(config.max_line_length, config.max_lines)
    }
}

/// Result of reflowing one transcript
#[derive(Debug, Clone, Default)]
pub struct ReflowOutcome {
    /// Cues numbered from 1, in time order
    pub cues: Vec<CaptionCue>,

    /// Segments that were dropped, with the reason
    pub skipped: Vec<ReflowError>,
}

/// Kind of punctuation a word ends with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakKind {
    Sentence,
    Clause,
}

fn break_kind(word: &str) -> Option<BreakKind> {
    let last = word.trim_end_matches(TRAILING_CLOSERS).chars().last()?;
    if SENTENCE_ENDINGS.contains(&last) {
        Some(BreakKind::Sentence)
    } else if CLAUSE_ENDINGS.contains(&last) {
        Some(BreakKind::Clause)
    } else {
        None
    }
}

/// Number of words to put in the next cue, given the words still pending
fn next_group_len(words: &[&str], options: &ReflowOptions) -> usize {
    let capacity = wrap::fitting_prefix(words, options.max_line_length, options.max_lines).max(1);
    if capacity >= words.len() {
        return words.len();
    }

    let candidates = &words[..capacity];
    let earliest = |kind: BreakKind| candidates.iter().position(|w| break_kind(w) == Some(kind));

    earliest(BreakKind::Sentence)
        .or_else(|| earliest(BreakKind::Clause))
        .map(|i| i + 1)
        .unwrap_or(capacity)
}

/// Split one segment's words into cue-sized groups
fn group_words<'a>(words: &[&'a str], options: &ReflowOptions) -> Vec<Vec<&'a str>> {
    let mut groups = Vec::new();
    let mut rest = words;

    while !rest.is_empty() {
        let take = next_group_len(rest, options);
        groups.push(rest[..take].to_vec());
        rest = &rest[take..];
    }

    groups
}

/// Reflow recognized segments into caption cues.
///
/// Segments with no text or with non-finite timestamps are skipped and
/// reported in [`ReflowOutcome::skipped`]; they never abort the reflow.
pub fn reflow(segments: &[TranscriptSegment], options: &ReflowOptions) -> ReflowOutcome {
    let mut outcome = ReflowOutcome::default();
    let mut previous_end_ms = 0u64;

    for (i, segment) in segments.iter().enumerate() {
        let number = i + 1;

        if !segment.start.is_finite() || !segment.end.is_finite() {
            let err = ReflowError::InvalidTiming { segment: number };
            warn!("{}", err);
            outcome.skipped.push(err);
            continue;
        }

        let words: Vec<&str> = segment.text.split_whitespace().collect();
        if words.is_empty() {
            let err = ReflowError::EmptySegment { segment: number };
            warn!("{}", err);
            outcome.skipped.push(err);
            continue;
        }

        let start_ms = timing::seconds_to_ms(segment.start).max(previous_end_ms);
        let end_ms = timing::seconds_to_ms(segment.end).max(start_ms);

        let groups = group_words(&words, options);
        let weights: Vec<usize> = groups.iter().map(|g| wrap::joined_len(g)).collect();
        let spans = timing::partition(start_ms, end_ms, &weights);

        if groups.len() > 1 {
            debug!("Segment {} split into {} cues", number, groups.len());
        }

        for (group, (cue_start, cue_end)) in groups.iter().zip(spans) {
            let lines = wrap::wrap_words(group, options.max_line_length);
            outcome.cues.push(CaptionCue::new(0, cue_start, cue_end, lines));
        }

        previous_end_ms = end_ms;
    }

    outcome.cues.retain(|cue| !cue.is_blank());
    for (i, cue) in outcome.cues.iter_mut().enumerate() {
        cue.index = i + 1;
    }

    outcome
}
