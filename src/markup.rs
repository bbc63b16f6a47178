//! Text carrying positional markup annotations.
//!
//! An [`AnnotatedText`] pairs a string with labeled, half-open spans measured in
//! characters (Unicode scalar values, not bytes). The label `""` stands for an
//! anonymous group (`{...}` in LaTeX), any other label for a macro such as
//! `emph` or `textbf`.
//!
//! All operations produce new values; spans never alias between instances.
//!
//! # Nesting order
//!
//! Among spans that share a start offset, the one listed first is the outer
//! one. [`AnnotatedText::add_markup`] keeps this contract by inserting a new
//! span after every span whose start is not greater than its own, so markup
//! added later ends up nested inside markup added earlier.
//!
//! # Crossing spans
//!
//! [`AnnotatedText::to_markup_list`] closes spans with a stack and only ever
//! inspects the top. If a span ends while a span opened after it is still
//! open, its end marker is deferred until the later span closes. Well-nested
//! markup is rendered faithfully; crossing markup is not resolved.

use std::fmt;
use std::ops::Add;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{AlignError, AlignResult};

/// A labeled half-open range `[start, end)`.
///
/// The same type is used for character offsets inside an [`AnnotatedText`] and
/// for word indices produced by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub label: String,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(label: impl Into<String>, start: usize, end: usize) -> Self {
        Span {
            label: label.into(),
            start,
            end,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Anonymous grouping without a visible macro
    pub fn is_group(&self) -> bool {
        self.label.is_empty()
    }
}

/// One element of a flattened markup stream over characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MarkupNode {
    Start(String),
    End(String),
    Text(String),
}

/// One element of a flattened markup stream over arbitrary items (characters,
/// words, tagged words)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interleaved<T> {
    Start(String),
    End(String),
    Item(T),
}

fn close_ended<T>(stack: &mut Vec<&Span>, pos: usize, out: &mut Vec<Interleaved<T>>) {
    while let Some(top) = stack.last() {
        if top.end > pos {
            break;
        }
        out.push(Interleaved::End(top.label.clone()));
        stack.pop();
    }
}

/// Merge items and spans over item indices into a single stream in reading
/// order.
///
/// Positions `0..=len` are visited in turn: spans ending at the position are
/// closed, spans starting there are opened in list order, freshly opened
/// empty spans are closed again, and finally the item at the position (if
/// any) is emitted. Only the top of the open-span stack is checked, see the
/// module docs on crossing spans.
pub fn interleave<T>(items: impl IntoIterator<Item = T>, spans: &[Span]) -> Vec<Interleaved<T>> {
    let mut out = Vec::with_capacity(spans.len() * 2);
    let mut stack: Vec<&Span> = Vec::new();
    let mut items = items.into_iter();
    let mut pos = 0;

    loop {
        close_ended(&mut stack, pos, &mut out);
        for span in spans.iter().filter(|span| span.start == pos) {
            out.push(Interleaved::Start(span.label.clone()));
            stack.push(span);
        }
        close_ended(&mut stack, pos, &mut out);

        match items.next() {
            Some(item) => {
                out.push(Interleaved::Item(item));
                pos += 1;
            }
            None => break,
        }
    }

    // spans reaching past the last item
    while let Some(span) = stack.pop() {
        out.push(Interleaved::End(span.label.clone()));
    }

    out
}

/// Replay an interleaved stream into items plus spans over item indices.
///
/// Spans are listed in the order of their start markers, which keeps outer
/// spans ahead of the spans nested inside them.
pub fn collect_interleaved<T>(
    stream: impl IntoIterator<Item = Interleaved<T>>,
) -> AlignResult<(Vec<T>, Vec<Span>)> {
    let mut items = Vec::new();
    let mut spans: Vec<Span> = Vec::new();
    let mut open: Vec<usize> = Vec::new();

    for element in stream {
        match element {
            Interleaved::Start(label) => {
                open.push(spans.len());
                spans.push(Span::new(label, items.len(), items.len()));
            }
            Interleaved::End(label) => {
                let idx = open.pop().ok_or_else(|| {
                    AlignError::malformed(format!("end marker '{}' without start marker", label))
                })?;
                if spans[idx].label != label {
                    return Err(AlignError::malformed(format!(
                        "end marker '{}' closes '{}'",
                        label, spans[idx].label
                    )));
                }
                spans[idx].end = items.len();
            }
            Interleaved::Item(item) => items.push(item),
        }
    }

    if let Some(&idx) = open.last() {
        return Err(AlignError::malformed(format!(
            "start marker '{}' is never closed",
            spans[idx].label
        )));
    }

    Ok((items, spans))
}

/// Result of [`AnnotatedText::strip`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stripped {
    pub text: AnnotatedText,
    pub leading: String,
    pub trailing: String,
}

#[derive(Deserialize)]
struct RawAnnotatedText {
    content: String,
    #[serde(default)]
    spans: Vec<Span>,
}

impl TryFrom<RawAnnotatedText> for AnnotatedText {
    type Error = AlignError;

    fn try_from(raw: RawAnnotatedText) -> AlignResult<Self> {
        AnnotatedText::new(raw.content, raw.spans)
    }
}

/// A byte range of the content to replace, used by the substitution family
struct Edit {
    start: usize,
    end: usize,
    replacement: String,
}

/// Text plus an ordered list of labeled character spans
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAnnotatedText")]
pub struct AnnotatedText {
    content: String,
    spans: Vec<Span>,
}

impl AnnotatedText {
    /// Create a text with the given spans, rejecting spans outside the text
    pub fn new(content: impl Into<String>, spans: Vec<Span>) -> AlignResult<Self> {
        let content = content.into();
        let len = content.chars().count();
        for span in &spans {
            check_span(span, len)?;
        }
        Ok(AnnotatedText { content, spans })
    }

    /// Create a text without markup
    pub fn plain(content: impl Into<String>) -> Self {
        AnnotatedText {
            content: content.into(),
            spans: Vec::new(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn to_plain_text(&self) -> String {
        self.content.clone()
    }

    /// Character offset of the first occurrence of `pattern`
    pub fn find(&self, pattern: &str) -> Option<usize> {
        self.content
            .find(pattern)
            .map(|byte| self.content[..byte].chars().count())
    }

    /// The window `[start, stop)` with spans clipped to it and rebased.
    ///
    /// Spans entirely outside the window are dropped. Empty spans are kept
    /// when they sit inside the window or on one of its edges.
    pub fn slice(&self, start: usize, stop: usize) -> AlignResult<Self> {
        let len = self.len();
        if start > stop || stop > len {
            return Err(AlignError::malformed(format!(
                "slice {}..{} out of bounds for text of length {}",
                start, stop, len
            )));
        }
        Ok(self.window(start, stop))
    }

    fn window(&self, start: usize, stop: usize) -> Self {
        let content = self
            .content
            .chars()
            .skip(start)
            .take(stop - start)
            .collect();

        let spans = self
            .spans
            .iter()
            .filter_map(|span| {
                let keep = if span.is_empty() {
                    start <= span.start && span.start <= stop
                } else {
                    span.start < stop && span.end > start
                };
                keep.then(|| {
                    Span::new(
                        span.label.clone(),
                        span.start.max(start) - start,
                        span.end.min(stop) - start,
                    )
                })
            })
            .collect();

        AnnotatedText { content, spans }
    }

    /// `self` followed by `other`; `other`'s spans are rebased past `self`
    pub fn concat(&self, other: &AnnotatedText) -> Self {
        let offset = self.len();
        let mut spans = self.spans.clone();
        spans.extend(
            other
                .spans
                .iter()
                .map(|span| Span::new(span.label.clone(), span.start + offset, span.end + offset)),
        );

        AnnotatedText {
            content: format!("{}{}", self.content, other.content),
            spans,
        }
    }

    /// Add a span. Among spans sharing a start, earlier ones stay outer.
    pub fn add_markup(&mut self, label: impl Into<String>, start: usize, end: usize) -> AlignResult<()> {
        let span = Span::new(label, start, end);
        check_span(&span, self.len())?;
        let index = self
            .spans
            .iter()
            .position(|existing| existing.start > span.start)
            .unwrap_or(self.spans.len());
        self.spans.insert(index, span);
        Ok(())
    }

    /// Builder form of [`AnnotatedText::add_markup`]
    pub fn with_markup(mut self, label: impl Into<String>, start: usize, end: usize) -> AlignResult<Self> {
        self.add_markup(label, start, end)?;
        Ok(self)
    }

    /// Replace up to `max_count` literal occurrences of `pattern` (all of them
    /// when `max_count` is 0).
    ///
    /// Spans starting after a match start, and spans ending at or after a
    /// match end, move by the length difference. Boundaries that fall inside
    /// a replaced region move along with the text but are not re-derived, so
    /// only substitutions that do not cut through a span keep its boundaries
    /// meaningful.
    ///
    /// An end sitting exactly on a match end counts as past it, so a span
    /// wrapping exactly the replaced text (`emph` over "cat" replaced by
    /// "Katze") grows with the replacement.
    pub fn substitute(&self, pattern: &str, replacement: &str, max_count: usize) -> Self {
        if pattern.is_empty() {
            return self.clone();
        }
        let edits = self
            .content
            .match_indices(pattern)
            .take(limit(max_count))
            .map(|(start, matched)| Edit {
                start,
                end: start + matched.len(),
                replacement: replacement.to_string(),
            })
            .collect();
        self.apply_edits(edits)
    }

    /// Regex form of [`AnnotatedText::substitute`]; `template` may refer to
    /// capture groups (`$1`, `${name}`)
    pub fn substitute_regex(&self, re: &Regex, template: &str, max_count: usize) -> Self {
        self.substitute_with(re, max_count, |caps| {
            let mut out = String::new();
            caps.expand(template, &mut out);
            out
        })
    }

    /// Regex substitution computing every replacement from its captures
    pub fn substitute_with<F>(&self, re: &Regex, max_count: usize, mut replacer: F) -> Self
    where
        F: FnMut(&Captures) -> String,
    {
        let edits = re
            .captures_iter(&self.content)
            .take(limit(max_count))
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some(Edit {
                    start: whole.start(),
                    end: whole.end(),
                    replacement: replacer(&caps),
                })
            })
            .collect();
        self.apply_edits(edits)
    }

    /// Regex substitution that only rewrites capture group `group` of every
    /// match; the rest of the match is left in place.
    ///
    /// Searching resumes right after the rewritten group, so trailing context
    /// consumed by one match can serve as leading context of the next.
    pub fn substitute_group<F>(&self, re: &Regex, group: usize, max_count: usize, mut replacer: F) -> Self
    where
        F: FnMut(&Captures) -> String,
    {
        let mut edits = Vec::new();
        let mut pos = 0;

        while pos <= self.content.len() && edits.len() < limit(max_count) {
            let Some(caps) = re.captures_at(&self.content, pos) else {
                break;
            };
            let Some(whole) = caps.get(0) else {
                break;
            };
            let next = match caps.get(group) {
                Some(target) => {
                    edits.push(Edit {
                        start: target.start(),
                        end: target.end(),
                        replacement: replacer(&caps),
                    });
                    target.end()
                }
                None => whole.end(),
            };

            pos = if next > pos {
                next
            } else {
                // empty match; step over one character
                match self.content[pos..].chars().next() {
                    Some(c) => pos + c.len_utf8(),
                    None => break,
                }
            };
        }

        self.apply_edits(edits)
    }

    fn apply_edits(&self, edits: Vec<Edit>) -> Self {
        if edits.is_empty() {
            return self.clone();
        }

        let mut content = String::with_capacity(self.content.len());
        // (match start, match end, length delta), all in characters
        let mut shifts: Vec<(usize, usize, isize)> = Vec::with_capacity(edits.len());
        let mut last_byte = 0;
        let mut last_char = 0;

        for edit in &edits {
            let unchanged = &self.content[last_byte..edit.start];
            let matched = &self.content[edit.start..edit.end];
            let start_char = last_char + unchanged.chars().count();
            let matched_chars = matched.chars().count();

            content.push_str(unchanged);
            content.push_str(&edit.replacement);

            let delta = edit.replacement.chars().count() as isize - matched_chars as isize;
            shifts.push((start_char, start_char + matched_chars, delta));

            last_byte = edit.end;
            last_char = start_char + matched_chars;
        }
        content.push_str(&self.content[last_byte..]);

        let new_len = content.chars().count() as isize;
        let spans = self
            .spans
            .iter()
            .map(|span| {
                let mut start = span.start as isize;
                let mut end = span.end as isize;
                for &(m_start, m_end, delta) in &shifts {
                    if span.start > m_start {
                        start += delta;
                    }
                    if span.end >= m_end && span.end > m_start {
                        end += delta;
                    }
                }
                let start = start.clamp(0, new_len);
                let end = end.clamp(start, new_len);
                Span::new(span.label.clone(), start as usize, end as usize)
            })
            .collect();

        AnnotatedText { content, spans }
    }

    /// Remove leading whitespace
    pub fn lstrip(&self) -> Self {
        let skip = self.content.chars().take_while(|c| c.is_whitespace()).count();
        self.window(skip, self.len())
    }

    /// Remove trailing whitespace
    pub fn rstrip(&self) -> Self {
        let len = self.len();
        let skip = self.content.chars().rev().take_while(|c| c.is_whitespace()).count();
        self.window(0, len - skip)
    }

    /// Remove surrounding whitespace, returning the removed runs as well
    pub fn strip(&self) -> Stripped {
        let len = self.len();
        let lead = self.content.chars().take_while(|c| c.is_whitespace()).count();
        let trail = if lead == len {
            0
        } else {
            self.content.chars().rev().take_while(|c| c.is_whitespace()).count()
        };

        Stripped {
            text: self.window(lead, len - trail),
            leading: self.content.chars().take(lead).collect(),
            trailing: self.content.chars().skip(len - trail).collect(),
        }
    }

    /// Flatten into start/end markers and character runs in reading order
    pub fn to_markup_list(&self) -> Vec<MarkupNode> {
        let mut nodes: Vec<MarkupNode> = Vec::new();
        for element in interleave(self.content.chars(), &self.spans) {
            match element {
                Interleaved::Start(label) => nodes.push(MarkupNode::Start(label)),
                Interleaved::End(label) => nodes.push(MarkupNode::End(label)),
                Interleaved::Item(c) => match nodes.last_mut() {
                    Some(MarkupNode::Text(run)) => run.push(c),
                    _ => nodes.push(MarkupNode::Text(c.to_string())),
                },
            }
        }
        nodes
    }

    /// Rebuild a text from a flattened markup list
    pub fn from_markup_list(nodes: &[MarkupNode]) -> AlignResult<Self> {
        let stream = nodes.iter().flat_map(|node| match node {
            MarkupNode::Start(label) => vec![Interleaved::Start(label.clone())],
            MarkupNode::End(label) => vec![Interleaved::End(label.clone())],
            MarkupNode::Text(text) => text.chars().map(Interleaved::Item).collect(),
        });
        let (chars, spans) = collect_interleaved(stream)?;
        Ok(AnnotatedText {
            content: chars.into_iter().collect(),
            spans,
        })
    }
}

fn limit(max_count: usize) -> usize {
    if max_count == 0 { usize::MAX } else { max_count }
}

fn check_span(span: &Span, len: usize) -> AlignResult<()> {
    if span.start > span.end || span.end > len {
        return Err(AlignError::malformed(format!(
            "span '{}' {}..{} out of bounds for text of length {}",
            span.label, span.start, span.end, len
        )));
    }
    Ok(())
}

impl fmt::Display for AnnotatedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl From<&str> for AnnotatedText {
    fn from(content: &str) -> Self {
        AnnotatedText::plain(content)
    }
}

impl From<String> for AnnotatedText {
    fn from(content: String) -> Self {
        AnnotatedText::plain(content)
    }
}

impl Add for AnnotatedText {
    type Output = AnnotatedText;

    fn add(self, other: AnnotatedText) -> AnnotatedText {
        self.concat(&other)
    }
}

impl Add<&str> for AnnotatedText {
    type Output = AnnotatedText;

    fn add(mut self, other: &str) -> AnnotatedText {
        self.content.push_str(other);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emph_cat() -> AnnotatedText {
        // "The \emph{cat} sat"
        AnnotatedText::new("The cat sat", vec![Span::new("emph", 4, 7)]).unwrap()
    }

    #[test]
    fn test_new_rejects_out_of_bounds() {
        assert!(AnnotatedText::new("abc", vec![Span::new("x", 1, 4)]).is_err());
        assert!(AnnotatedText::new("abc", vec![Span::new("x", 2, 1)]).is_err());
        assert!(AnnotatedText::new("abc", vec![Span::new("x", 3, 3)]).is_ok());
    }

    #[test]
    fn test_len_counts_characters() {
        let text = AnnotatedText::plain("Straße");
        assert_eq!(text.len(), 6);
        assert_eq!(text.find("e"), Some(5));
    }

    #[test]
    fn test_slice_clips_and_rebases() {
        let text = AnnotatedText::new(
            "abcdefgh",
            vec![
                Span::new("a", 0, 2),
                Span::new("b", 1, 5),
                Span::new("c", 3, 4),
                Span::new("d", 6, 8),
            ],
        )
        .unwrap();

        let sliced = text.slice(2, 6).unwrap();
        assert_eq!(sliced.content(), "cdef");
        assert_eq!(
            sliced.spans(),
            &[Span::new("b", 0, 3), Span::new("c", 1, 2)]
        );
    }

    #[test]
    fn test_slice_out_of_bounds() {
        let text = AnnotatedText::plain("abc");
        assert!(text.slice(2, 5).is_err());
        assert!(text.slice(2, 1).is_err());
        assert_eq!(text.slice(3, 3).unwrap().content(), "");
    }

    #[test]
    fn test_concat_rebases_right_hand_spans() {
        let left = AnnotatedText::new("Hallo ", vec![Span::new("textbf", 0, 5)]).unwrap();
        let right = AnnotatedText::new("Welt", vec![Span::new("emph", 0, 4)]).unwrap();
        let joined = left + right;
        assert_eq!(joined.content(), "Hallo Welt");
        assert_eq!(
            joined.spans(),
            &[Span::new("textbf", 0, 5), Span::new("emph", 6, 10)]
        );
    }

    #[test]
    fn test_add_markup_earlier_is_outer() {
        let mut text = AnnotatedText::plain("abc");
        text.add_markup("outer", 0, 3).unwrap();
        text.add_markup("inner", 0, 3).unwrap();
        text.add_markup("first", 0, 1).unwrap();

        assert_eq!(
            text.to_markup_list(),
            vec![
                MarkupNode::Start("outer".into()),
                MarkupNode::Start("inner".into()),
                MarkupNode::Start("first".into()),
                MarkupNode::Text("a".into()),
                MarkupNode::End("first".into()),
                MarkupNode::Text("bc".into()),
                MarkupNode::End("inner".into()),
                MarkupNode::End("outer".into()),
            ]
        );
    }

    #[test]
    fn test_add_markup_orders_by_start() {
        let text = AnnotatedText::plain("abcdef")
            .with_markup("late", 4, 6)
            .unwrap()
            .with_markup("early", 1, 2)
            .unwrap();
        assert_eq!(text.spans()[0].label, "early");
        assert_eq!(text.spans()[1].label, "late");
        assert!(text.clone().with_markup("bad", 5, 7).is_err());
    }

    #[test]
    fn test_substitute_shifts_following_spans() {
        let replaced = emph_cat().substitute("The", "Die alte", 0);
        assert_eq!(replaced.content(), "Die alte cat sat");
        assert_eq!(replaced.spans(), &[Span::new("emph", 9, 12)]);
    }

    #[test]
    fn test_substitute_whole_span() {
        let replaced = emph_cat().substitute("cat", "Katze", 0);
        assert_eq!(replaced.content(), "The Katze sat");
        assert_eq!(replaced.spans(), &[Span::new("emph", 4, 9)]);
    }

    #[test]
    fn test_substitute_max_count() {
        let text = AnnotatedText::new("a-a-a", vec![Span::new("x", 4, 5)]).unwrap();
        let replaced = text.substitute("a", "bb", 2);
        assert_eq!(replaced.content(), "bb-bb-a");
        assert_eq!(replaced.spans(), &[Span::new("x", 6, 7)]);

        let all = text.substitute("a", "bb", 0);
        assert_eq!(all.content(), "bb-bb-bb");
        assert_eq!(all.spans(), &[Span::new("x", 6, 8)]);
    }

    #[test]
    fn test_substitute_inside_span_moves_boundary_only() {
        // a span starting inside the replaced region shifts with the text
        let text = AnnotatedText::new("abcdef", vec![Span::new("x", 2, 4)]).unwrap();
        let replaced = text.substitute("bcd", "", 0);
        assert_eq!(replaced.content(), "aef");
        let span = &replaced.spans()[0];
        assert!(span.start <= span.end && span.end <= replaced.len());
    }

    #[test]
    fn test_substitute_regex_with_groups() {
        let re = Regex::new(r"(\w+) (\w+)").unwrap();
        let text = AnnotatedText::new("ab cd!", vec![Span::new("x", 5, 6)]).unwrap();
        let replaced = text.substitute_regex(&re, "$2-$1", 0);
        assert_eq!(replaced.content(), "cd-ab!");
        assert_eq!(replaced.spans(), &[Span::new("x", 5, 6)]);
    }

    #[test]
    fn test_substitute_group_shares_context() {
        let re = Regex::new(r"(\s|^)(a)(\s|$)").unwrap();
        let text = AnnotatedText::new("a a a", vec![Span::new("x", 4, 5)]).unwrap();
        let replaced = text.substitute_group(&re, 2, 0, |_| "bb".to_string());
        assert_eq!(replaced.content(), "bb bb bb");
        assert_eq!(replaced.spans(), &[Span::new("x", 6, 8)]);
    }

    #[test]
    fn test_substitute_group_max_count() {
        let re = Regex::new(r"(-)(a)").unwrap();
        let text = AnnotatedText::plain("-a-a-a");
        let replaced = text.substitute_group(&re, 2, 1, |caps| caps[2].to_uppercase());
        assert_eq!(replaced.content(), "-A-a-a");
    }

    #[test]
    fn test_strip_returns_removed_whitespace() {
        let text = AnnotatedText::new("  Die Katze \n", vec![Span::new("emph", 6, 11)]).unwrap();
        let stripped = text.strip();
        assert_eq!(stripped.text.content(), "Die Katze");
        assert_eq!(stripped.leading, "  ");
        assert_eq!(stripped.trailing, " \n");
        assert_eq!(stripped.text.spans(), &[Span::new("emph", 4, 9)]);
    }

    #[test]
    fn test_strip_all_whitespace() {
        let stripped = AnnotatedText::plain("   ").strip();
        assert_eq!(stripped.text.content(), "");
        assert_eq!(stripped.leading, "   ");
        assert_eq!(stripped.trailing, "");
    }

    #[test]
    fn test_lstrip_rstrip() {
        let text = AnnotatedText::plain(" x ");
        assert_eq!(text.lstrip().content(), "x ");
        assert_eq!(text.rstrip().content(), " x");
    }

    #[test]
    fn test_to_markup_list_nested() {
        let text = AnnotatedText::new(
            "a bold move",
            vec![Span::new("textbf", 2, 11), Span::new("", 7, 11)],
        )
        .unwrap();
        assert_eq!(
            text.to_markup_list(),
            vec![
                MarkupNode::Text("a ".into()),
                MarkupNode::Start("textbf".into()),
                MarkupNode::Text("bold ".into()),
                MarkupNode::Start("".into()),
                MarkupNode::Text("move".into()),
                MarkupNode::End("".into()),
                MarkupNode::End("textbf".into()),
            ]
        );
    }

    #[test]
    fn test_to_markup_list_defers_crossing_close() {
        let text = AnnotatedText::new(
            "abcdef",
            vec![Span::new("A", 0, 3), Span::new("B", 2, 5)],
        )
        .unwrap();
        assert_eq!(
            text.to_markup_list(),
            vec![
                MarkupNode::Start("A".into()),
                MarkupNode::Text("ab".into()),
                MarkupNode::Start("B".into()),
                MarkupNode::Text("cde".into()),
                MarkupNode::End("B".into()),
                MarkupNode::End("A".into()),
                MarkupNode::Text("f".into()),
            ]
        );
    }

    #[test]
    fn test_to_markup_list_empty_spans() {
        let text = AnnotatedText::new(
            "ab",
            vec![Span::new("label", 1, 1), Span::new("ref", 2, 2)],
        )
        .unwrap();
        assert_eq!(
            text.to_markup_list(),
            vec![
                MarkupNode::Text("a".into()),
                MarkupNode::Start("label".into()),
                MarkupNode::End("label".into()),
                MarkupNode::Text("b".into()),
                MarkupNode::Start("ref".into()),
                MarkupNode::End("ref".into()),
            ]
        );
    }

    #[test]
    fn test_markup_list_roundtrip() {
        let text = AnnotatedText::plain("Die schnelle Katze")
            .with_markup("emph", 4, 18)
            .unwrap()
            .with_markup("", 4, 12)
            .unwrap()
            .with_markup("textbf", 13, 18)
            .unwrap();
        let rebuilt = AnnotatedText::from_markup_list(&text.to_markup_list()).unwrap();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_from_markup_list_rejects_unbalanced() {
        let dangling = vec![MarkupNode::Start("emph".into()), MarkupNode::Text("x".into())];
        assert!(AnnotatedText::from_markup_list(&dangling).is_err());

        let stray = vec![MarkupNode::Text("x".into()), MarkupNode::End("emph".into())];
        assert!(AnnotatedText::from_markup_list(&stray).is_err());

        let mismatched = vec![
            MarkupNode::Start("emph".into()),
            MarkupNode::End("textbf".into()),
        ];
        assert!(AnnotatedText::from_markup_list(&mismatched).is_err());
    }

    #[test]
    fn test_serde_validates_spans() {
        let json = r#"{"content":"abc","spans":[{"label":"emph","start":0,"end":2}]}"#;
        let text: AnnotatedText = serde_json::from_str(json).unwrap();
        assert_eq!(text.spans(), &[Span::new("emph", 0, 2)]);

        let bad = r#"{"content":"abc","spans":[{"label":"emph","start":0,"end":9}]}"#;
        assert!(serde_json::from_str::<AnnotatedText>(bad).is_err());

        let bare: AnnotatedText = serde_json::from_str(r#"{"content":"abc"}"#).unwrap();
        assert!(bare.spans().is_empty());
    }

    #[test]
    fn test_collect_interleaved_words() {
        let stream = vec![
            Interleaved::Item("Die"),
            Interleaved::Start("emph".to_string()),
            Interleaved::Item("Katze"),
            Interleaved::End("emph".to_string()),
        ];
        let (items, spans) = collect_interleaved(stream).unwrap();
        assert_eq!(items, vec!["Die", "Katze"]);
        assert_eq!(spans, vec![Span::new("emph", 1, 2)]);
    }
}
