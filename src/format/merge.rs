//! Regeneration that keeps hand-edited regions.
//!
//! A region is every line between a line containing `BEGIN-PRESERVED <id>`
//! and the next line containing `END-PRESERVED <id>`. The generated text
//! decides which regions exist and where; the previous file only supplies
//! the bodies of regions whose id the generator still emits.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::ops::Range;

use crate::constants::sentinel;
use crate::error::{Error, Result};
use crate::format::Transform;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeFormatter;

impl Transform for MergeFormatter {
    fn transform(&self, generated: &str, previous: Option<&str>) -> Result<String> {
        let segments = parse_regions(generated)?;
        let Some(previous) = previous else {
            return Ok(generated.to_string());
        };

        let mut preserved: IndexMap<&str, &str> = parse_regions(previous)?
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Region { id, body, .. } => Some((id, body)),
                Segment::Text(_) => None,
            })
            .collect();

        let mut merged = String::with_capacity(generated.len().max(previous.len()));
        for segment in segments {
            match segment {
                Segment::Text(text) => merged.push_str(text),
                Segment::Region { id, begin, body, end } => {
                    merged.push_str(begin);
                    merged.push_str(preserved.shift_remove(id).unwrap_or(body));
                    merged.push_str(end);
                }
            }
        }

        for id in preserved.keys() {
            log::debug!("Dropping preserved region '{id}': the generator no longer emits it.");
        }
        Ok(merged)
    }
}

/// A slice of a document: plain text, or a preserved region split into its
/// begin marker line, body and end marker line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Region { id: &'a str, begin: &'a str, body: &'a str, end: &'a str },
}

struct OpenRegion<'a> {
    id: &'a str,
    line: usize,
    begin: Range<usize>,
}

/// Splits `text` into plain and preserved segments. Concatenating the
/// segments in order reproduces `text` exactly.
pub fn parse_regions(text: &str) -> Result<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut seen = HashSet::new();
    let mut open: Option<OpenRegion<'_>> = None;
    let mut text_start = 0;
    let mut offset = 0;

    for (index, line) in text.split_inclusive('\n').enumerate() {
        let number = index + 1;
        let line_start = offset;
        offset += line.len();

        if let Some(id) = marker(line, sentinel::BEGIN) {
            let id = id.ok_or_else(|| missing_id(number, sentinel::BEGIN))?;
            if let Some(outer) = &open {
                return Err(Error::MalformedRegion {
                    line: number,
                    reason: format!("region '{id}' starts inside region '{}'", outer.id),
                });
            }
            if text_start < line_start {
                segments.push(Segment::Text(&text[text_start..line_start]));
            }
            open = Some(OpenRegion { id, line: number, begin: line_start..offset });
        } else if let Some(id) = marker(line, sentinel::END) {
            let id = id.ok_or_else(|| missing_id(number, sentinel::END))?;
            let Some(region) = open.take() else {
                return Err(Error::MalformedRegion {
                    line: number,
                    reason: format!("region '{id}' ends without a matching {}", sentinel::BEGIN),
                });
            };
            if region.id != id {
                return Err(Error::MalformedRegion {
                    line: number,
                    reason: format!("region '{}' is closed by '{id}'", region.id),
                });
            }
            if !seen.insert(id) {
                return Err(Error::DuplicateRegion { id: id.to_string() });
            }
            segments.push(Segment::Region {
                id,
                begin: &text[region.begin.clone()],
                body: &text[region.begin.end..line_start],
                end: line,
            });
            text_start = offset;
        }
    }

    if let Some(region) = open {
        return Err(Error::MalformedRegion {
            line: region.line,
            reason: format!("region '{}' is never closed", region.id),
        });
    }
    if text_start < text.len() {
        segments.push(Segment::Text(&text[text_start..]));
    }
    Ok(segments)
}

/// Finds `keyword` in `line` and returns the identifier that follows it.
///
/// `None` means the line is not a marker, `Some(None)` a marker without id.
fn marker<'a>(line: &'a str, keyword: &str) -> Option<Option<&'a str>> {
    let start = line.find(keyword)?;
    let preceded_by_word =
        line[..start].chars().next_back().is_some_and(|c| c.is_alphanumeric() || c == '_');
    let rest = &line[start + keyword.len()..];
    let followed_by_word = rest.chars().next().is_some_and(|c| !c.is_whitespace());
    if preceded_by_word || followed_by_word {
        return None;
    }
    let id = rest
        .split_whitespace()
        .next()
        .map(|token| {
            token.trim_end_matches(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')))
        })
        .filter(|id| !id.is_empty());
    Some(id)
}

fn missing_id(line: usize, keyword: &str) -> Error {
    Error::MalformedRegion { line, reason: format!("{keyword} marker has no identifier") }
}
