//! Merging of per-page results into whole hymns.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::domain::{Hymn, PageData, PageType, Repetitions, count_nonblank_lines};

/// Combines page results into hymns, in page order.
///
/// Cover and blank pages are skipped. A new-hymn page starts a hymn, and
/// continuation pages append their lyrics after a blank line. Line numbers
/// of a continuation's repetitions are shifted past the lines already
/// collected. Hymns that fail validation are dropped with a warning.
pub fn merge_multipage_hymns(pages: &[PageData]) -> Vec<Hymn> {
    let mut hymns = Vec::new();
    let mut current: Option<Hymn> = None;

    for page in pages {
        match page.page_type {
            PageType::Cover | PageType::Blank => continue,
            PageType::NewHymn => {
                if let Some(done) = current.take() {
                    push_valid(&mut hymns, done);
                }
                current = Some(start_hymn(page));
            }
            PageType::Continuation => {
                let Some(hymn) = current.as_mut() else {
                    debug!(
                        page = page.page_number,
                        "Continuation page before any hymn, skipping"
                    );
                    continue;
                };
                append_continuation(hymn, page);
            }
        }
    }
    if let Some(done) = current {
        push_valid(&mut hymns, done);
    }
    hymns
}

fn start_hymn(page: &PageData) -> Hymn {
    Hymn {
        number: page.hymn_number.unwrap_or(0),
        title: page
            .hymn_title
            .clone()
            .unwrap_or_else(|| "Untitled".to_string()),
        text: page.body_text.clone().unwrap_or_default(),
        original_number: page.original_number,
        style: page.style.clone(),
        offered_to: page.offered_to.clone(),
        extra_instructions: page.extra_instructions.clone(),
        repetitions: page.repetitions.clone(),
        received_at: page.received_at.clone(),
    }
}

fn append_continuation(hymn: &mut Hymn, page: &PageData) {
    let offset = count_nonblank_lines(&hymn.text);
    if let Some(body) = page.body_text.as_deref().filter(|body| !body.is_empty()) {
        if hymn.text.is_empty() {
            hymn.text = body.to_string();
        } else {
            hymn.text.push_str("\n\n");
            hymn.text.push_str(body);
        }
    }
    if page.received_at.is_some() {
        hymn.received_at = page.received_at.clone();
    }
    hymn.repetitions = adjust_repetitions(
        hymn.repetitions.as_ref(),
        page.repetitions.as_ref(),
        offset,
    );
}

fn push_valid(hymns: &mut Vec<Hymn>, hymn: Hymn) {
    let number = hymn.number;
    match hymn.validate() {
        Ok(hymn) => hymns.push(hymn),
        Err(err) => warn!(hymn = number, error = %err, "Dropping invalid hymn"),
    }
}

/// Appends a continuation page's ranges, shifted by `offset` lines.
///
/// Unparseable parts are carried over verbatim.
pub fn adjust_repetitions(
    previous: Option<&Repetitions>,
    new: Option<&Repetitions>,
    offset: usize,
) -> Option<Repetitions> {
    let new = match new {
        Some(new) if !new.is_empty() => new.offset_by(offset),
        _ => return previous.cloned(),
    };
    match previous {
        Some(previous) if !previous.is_empty() => Some(previous.concat(&new)),
        _ => Some(new),
    }
}

/// Number of pages of each type, for diagnostics.
pub fn count_pages_by_type(pages: &[PageData]) -> HashMap<PageType, usize> {
    let mut counts: HashMap<PageType, usize> = [
        PageType::Cover,
        PageType::NewHymn,
        PageType::Continuation,
        PageType::Blank,
    ]
    .into_iter()
    .map(|page_type| (page_type, 0))
    .collect();
    for page in pages {
        *counts.entry(page.page_type).or_default() += 1;
    }
    counts
}
