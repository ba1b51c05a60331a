use std::num::NonZeroUsize;

/// Splits `items` into consecutive chunks of at most `size` elements.
///
/// An empty slice yields no chunks at all. Concatenating the chunks always
/// gives back `items` in the same order.
pub fn chunk<T>(items: &[T], size: NonZeroUsize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.get())
}

/// Flattens call groups, returning the flat sequence and the length of every group.
pub fn flatten<T>(groups: &[Vec<T>]) -> (Vec<&T>, Vec<usize>) {
    let lengths = groups.iter().map(Vec::len).collect();
    let flat = groups.iter().flatten().collect();
    (flat, lengths)
}

/// Splits a flat sequence back into groups of the given lengths.
///
/// Group `i` takes the elements in `[sum(lengths[..i]), sum(lengths[..=i]))`.
///
/// # Panics
///
/// Panics if `lengths` does not sum to `flat.len()`.
pub fn regroup<T>(flat: Vec<T>, lengths: &[usize]) -> Vec<Vec<T>> {
    let total: usize = lengths.iter().sum();
    assert_eq!(total, flat.len(), "group lengths do not cover the flat results");

    let mut iter = flat.into_iter();
    lengths
        .iter()
        .map(|&len| iter.by_ref().take(len).collect())
        .collect()
}
