//! Splits the input dataset into fixed-size batches.

/// Split `records` into `ceil(len / batch_size)` ordered batches.
///
/// The last batch may be shorter. Callers clamp `batch_size` to at least 1; a zero
/// is still treated as 1 here.
pub fn into_batches<T>(records: Vec<T>, batch_size: usize) -> Vec<Vec<T>> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::with_capacity(records.len().div_ceil(batch_size));
    let mut current = Vec::with_capacity(batch_size.min(records.len()));

    for record in records {
        current.push(record);
        if current.len() == batch_size {
            batches.push(std::mem::replace(
                &mut current,
                Vec::with_capacity(batch_size),
            ));
        }
    }

    if !current.is_empty() {
        batches.push(current);
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_input_in_order() {
        for len in 0..25usize {
            for batch_size in 1..8usize {
                let input: Vec<usize> = (0..len).collect();
                let batches = into_batches(input.clone(), batch_size);

                assert_eq!(batches.len(), len.div_ceil(batch_size));
                assert!(batches.iter().all(|batch| !batch.is_empty()));
                assert!(batches.iter().all(|batch| batch.len() <= batch_size));
                assert_eq!(batches.concat(), input);
            }
        }
    }

    #[test]
    fn last_batch_holds_the_remainder() {
        let batches = into_batches(vec!['a', 'b', 'c', 'd', 'e'], 2);
        assert_eq!(batches, vec![vec!['a', 'b'], vec!['c', 'd'], vec!['e']]);
    }

    #[test]
    fn zero_batch_size_behaves_like_one() {
        let batches = into_batches(vec![1, 2, 3], 0);
        assert_eq!(batches, vec![vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn empty_input_yields_no_batches() {
        assert!(into_batches(Vec::<u8>::new(), 100).is_empty());
    }
}
