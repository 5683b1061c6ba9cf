/// Case-insensitive similarity of two strings as a percentage in `[0, 100]`,
/// derived from their Levenshtein distance over Unicode scalar values.
///
/// Two empty strings are identical (100); an empty and a non-empty string have
/// nothing in common (0).
pub fn string_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 100.0;
    }

    let distance = levenshtein(&a, &b);
    (1.0 - distance as f64 / max_len as f64) * 100.0
}

/// Classic dynamic programming edit distance, keeping only two rows.
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            let deletion = previous[j + 1] + 1;
            let insertion = current[j] + 1;
            current[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
