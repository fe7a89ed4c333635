//! Locating where parsing can resume after a malformed entry.

/// Prefixes that can start an entry. Their first characters are what the
/// boundary scan stops on.
const ENTRY_STARTS: [&str; 3] = ["<", "/*", "import("];

/// Find the next possible entry start for a failed entry.
///
/// The entry began at `start` and failed at `failed_at`. Scanning starts at
/// whichever is later, the failure or the character after `start`, so the
/// result is always past `start`. Returns the source length when no entry
/// start follows.
pub(super) fn next_entry_boundary(source: &str, start: usize, failed_at: usize) -> usize {
    let after_start = start
        + source[start..]
            .chars()
            .next()
            .map_or(1, |c| c.len_utf8());
    let mut from = failed_at.max(after_start).min(source.len());
    while !source.is_char_boundary(from) {
        from += 1;
    }

    let rest = &source[from..];
    rest.match_indices(['<', '/', 'i'])
        .map(|(offset, _)| offset)
        .find(|&offset| {
            ENTRY_STARTS
                .iter()
                .any(|prefix| rest[offset..].starts_with(prefix))
        })
        .map_or(source.len(), |offset| from + offset)
}
