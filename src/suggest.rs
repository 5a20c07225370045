// ==============================================================================
// String Similarity Utilities
// ==============================================================================
//
// Edit-distance helpers behind the "did you mean?" hints attached to
// unresolved schema references.

/// Compute the Levenshtein edit distance between two strings.
///
/// Uses the standard dynamic programming algorithm with a two-row buffer.
/// Schema names are short, so this is plenty.
pub(crate) fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev_row: Vec<usize> = (0..=b_len).collect();
    let mut curr_row = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr_row[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = if ca == *cb { 0 } else { 1 };
            curr_row[j + 1] = (prev_row[j] + cost) // substitution
                .min(prev_row[j + 1] + 1) // deletion
                .min(curr_row[j] + 1); // insertion
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }
    prev_row[b_len]
}

/// Maximum edit distance for a suggestion to be considered "close enough."
///
/// For short names (length <= 4), we require distance <= 1 to avoid noisy
/// suggestions. For longer names, we allow distance <= 2.
pub(crate) fn max_edit_distance(name_len: usize) -> usize {
    if name_len <= 4 { 1 } else { 2 }
}

/// The schema name of a canonical path: everything after the last `/`.
fn schema_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Find the registered path closest to an unresolved one.
///
/// Schema names are compared, not whole paths, so a typo in the name is found
/// regardless of which file declares the intended schema. Candidates in the
/// same file win ties; otherwise the first closest candidate wins.
pub(crate) fn suggest_similar_path<'a>(
    target: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
    let name = schema_name(target);
    let file = target.split_once('#').map(|(file, _)| file);
    let threshold = max_edit_distance(name.chars().count());

    let mut best: Option<(usize, bool, &'a str)> = None;
    for candidate in candidates {
        if candidate == target {
            continue;
        }
        let distance = levenshtein(name, schema_name(candidate));
        if distance > threshold {
            continue;
        }
        let same_file = candidate.split_once('#').map(|(f, _)| f) == file;
        let better = match best {
            None => true,
            Some((d, s, _)) => distance < d || (distance == d && same_file && !s),
        };
        if better {
            best = Some((distance, same_file, candidate));
        }
    }
    best.map(|(_, _, candidate)| candidate)
}
