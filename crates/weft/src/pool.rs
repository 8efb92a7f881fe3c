use std::collections::BTreeMap;
use std::thread;

/// Runs `work` on every item using `jobs` threads and hands the results to
/// `report` in the order of `items`.
pub(crate) fn for_each_ordered<T, R>(
    items: Vec<T>,
    jobs: usize,
    work: impl Fn(T) -> R + Sync,
    mut report: impl FnMut(R),
) where
    T: Send,
    R: Send,
{
    let workers = jobs.clamp(1, items.len().max(1));
    let (item_sender, item_receiver) = crossbeam_channel::unbounded();
    for item in items.into_iter().enumerate() {
        // The receiver is alive, so this cannot fail.
        item_sender.send(item).ok();
    }
    drop(item_sender);

    let (result_sender, result_receiver) = crossbeam_channel::unbounded();
    thread::scope(|scope| {
        for _ in 0..workers {
            let items = item_receiver.clone();
            let results = result_sender.clone();
            let work = &work;
            scope.spawn(move || {
                for (index, item) in items {
                    if results.send((index, work(item))).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_sender);

        let mut pending = BTreeMap::new();
        let mut next = 0;
        for (index, result) in result_receiver {
            pending.insert(index, result);
            while let Some(result) = pending.remove(&next) {
                report(result);
                next += 1;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn results_arrive_in_input_order() {
        let items: Vec<u64> = (0..32).collect();
        let mut seen = Vec::new();
        for_each_ordered(
            items,
            4,
            |item| {
                // Early items finish last.
                thread::sleep(Duration::from_millis(32 - item));
                item * 10
            },
            |result| seen.push(result),
        );
        assert_eq!(seen, (0..32).map(|item| item * 10).collect::<Vec<_>>());
    }

    #[test]
    fn no_items_no_results() {
        let mut called = false;
        for_each_ordered(Vec::<u8>::new(), 8, |item| item, |_| called = true);
        assert!(!called);
    }
}
