use std::sync::Arc;

use super::*;

fn tagged(hz: u32) -> Payload {
    let mut p = Payload::default();
    p.properties.hz = hz;
    p
}

#[test]
fn dequeue_is_fifo() {
    let q = PayloadQueue::new();
    assert!(q.dequeue().is_none());

    q.enqueue(tagged(1));
    q.enqueue(tagged(2));
    q.enqueue(tagged(3));
    assert_eq!(q.len(), 3);

    let order: Vec<u32> = std::iter::from_fn(|| q.dequeue())
        .map(|p| p.properties.hz)
        .collect();
    assert_eq!(order, vec![1, 2, 3]);
    assert!(q.is_empty());
}

#[test]
fn clear_reports_dropped_count() {
    let q = PayloadQueue::new();
    q.enqueue(tagged(1));
    q.enqueue(tagged(2));
    assert_eq!(q.clear(), 2);
    assert!(q.is_empty());
}

#[test]
fn concurrent_producers_keep_per_thread_order() {
    let q = Arc::new(PayloadQueue::new());
    let producers: Vec<_> = (0..4u32)
        .map(|t| {
            let q = Arc::clone(&q);
            std::thread::spawn(move || {
                for i in 0..100u32 {
                    q.enqueue(tagged(t * 1000 + i));
                }
            })
        })
        .collect();
    for p in producers {
        p.join().unwrap();
    }

    assert_eq!(q.len(), 400);
    let mut last = [None::<u32>; 4];
    while let Some(p) = q.dequeue() {
        let t = (p.properties.hz / 1000) as usize;
        let i = p.properties.hz % 1000;
        if let Some(prev) = last[t] {
            assert!(i > prev);
        }
        last[t] = Some(i);
    }
}
