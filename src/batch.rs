use std::num::NonZeroUsize;

/// Contiguous run of accounts sent together in one classification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a> {
    /// Index of the first item within the full account list.
    pub offset: usize,
    pub items: &'a [String],
}

/// Splits `accounts` into `ceil(n / batch_size)` batches. Batch `i` covers
/// `[i * batch_size, min((i + 1) * batch_size, n))`.
pub fn partition(accounts: &[String], batch_size: NonZeroUsize) -> Vec<Batch<'_>> {
    accounts
        .chunks(batch_size.get())
        .enumerate()
        .map(|(i, items)| Batch {
            offset: i * batch_size.get(),
            items,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("account-{i}")).collect()
    }

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn empty_input_has_no_batches() {
        assert!(partition(&[], size(15)).is_empty());
    }

    #[test]
    fn batches_cover_input_exactly() {
        for n in 0..40 {
            let accounts = names(n);
            for b in 1..8 {
                let batches = partition(&accounts, size(b));

                assert_eq!(batches.len(), n.div_ceil(b), "n={n} b={b}");

                let rebuilt: Vec<String> = batches
                    .iter()
                    .flat_map(|batch| batch.items.iter().cloned())
                    .collect();
                assert_eq!(rebuilt, accounts, "n={n} b={b}");

                let mut expected_offset = 0;
                for (i, batch) in batches.iter().enumerate() {
                    assert_eq!(batch.offset, expected_offset);
                    assert!(!batch.items.is_empty());
                    if i + 1 < batches.len() {
                        assert_eq!(batch.items.len(), b);
                    } else {
                        assert!(batch.items.len() <= b);
                    }
                    expected_offset += batch.items.len();
                }
            }
        }
    }

    #[test]
    fn last_batch_carries_the_remainder() {
        let accounts = names(5);
        let batches = partition(&accounts, size(2));

        let shape: Vec<(usize, usize)> = batches.iter().map(|b| (b.offset, b.items.len())).collect();
        assert_eq!(shape, vec![(0, 2), (2, 2), (4, 1)]);
        assert_eq!(batches[2].items, &accounts[4..]);
    }
}
