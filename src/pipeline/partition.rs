/// Splits `items` into exactly `n` contiguous partitions whose sizes differ by at most one.
/// The first `len % n` partitions get the extra element; trailing partitions may be empty
/// when there are fewer items than partitions.
pub fn partition<T: Clone>(items: &[T], n: usize) -> Vec<Vec<T>> {
    let n = n.max(1);
    let base = items.len() / n;
    let extra = items.len() % n;

    let mut parts = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        let len = base + usize::from(i < extra);
        parts.push(items[start..start + len].to_vec());
        start += len;
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes<T>(parts: &[Vec<T>]) -> Vec<usize> {
        parts.iter().map(Vec::len).collect()
    }

    #[test]
    fn eleven_coins_over_three_workers() {
        let coins: Vec<u32> = (0..11).collect();
        let parts = partition(&coins, 3);
        assert_eq!(sizes(&parts), vec![4, 4, 3]);
        assert_eq!(parts.concat(), coins);
    }

    #[test]
    fn more_workers_than_coins_leaves_empty_tail() {
        let parts = partition(&["a", "b"], 4);
        assert_eq!(sizes(&parts), vec![1, 1, 0, 0]);
    }

    #[test]
    fn zero_workers_is_treated_as_one() {
        let parts = partition(&[1, 2, 3], 0);
        assert_eq!(parts, vec![vec![1, 2, 3]]);
    }

    #[test]
    fn partitions_are_balanced_disjoint_and_exhaustive() {
        for m in 0..40usize {
            let items: Vec<usize> = (0..m).collect();
            for n in 1..=10 {
                let parts = partition(&items, n);
                assert_eq!(parts.len(), n);

                let s = sizes(&parts);
                let (min, max) = (s.iter().min().unwrap(), s.iter().max().unwrap());
                assert!(max - min <= 1, "m={} n={} sizes={:?}", m, n, s);

                // Contiguous, in order, each item exactly once.
                assert_eq!(parts.concat(), items, "m={} n={}", m, n);
            }
        }
    }
}
