/// split a batch of iterations across workers with no
/// remainder lost: the first `batch % workers` assignments
/// get one extra iteration.
pub fn partition(batch: usize, workers: usize) -> Vec<usize> {
    assert!(workers >= 1);
    let quotient = batch / workers;
    let remainder = batch % workers;
    (0..workers)
        .map(|w| quotient + if w < remainder { 1 } else { 0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_exactly() {
        for batch in [0, 1, 7, 103, 1000] {
            for workers in 1..=16 {
                let parts = partition(batch, workers);
                assert!(parts.len() == workers);
                assert!(parts.iter().sum::<usize>() == batch);
                assert!(parts
                    .iter()
                    .all(|&p| p == batch / workers || p == batch / workers + 1));
            }
        }
    }

    #[test]
    fn the_103_over_8_case() {
        let parts = partition(103, 8);
        let thirteens = parts.iter().filter(|&&p| p == 13).count();
        let twelves = parts.iter().filter(|&&p| p == 12).count();
        assert!(thirteens == 7 && twelves == 1);
    }
}
