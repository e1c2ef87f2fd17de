use extsort_core::RingBuffer;
use proptest::prelude::*;

/// Drives a ring through arbitrary interleavings of `write`/`advance_lo`,
/// checking that `peek` always returns a linear view of the live bytes.
#[derive(Debug, Clone)]
enum Op {
    Write(Vec<u8>),
    Drain(usize),
}

fn arbitrary_ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            prop::collection::vec(any::<u8>(), 0..40).prop_map(Op::Write),
            (0usize..40).prop_map(Op::Drain),
        ],
        0..60,
    )
}

proptest! {
    #[test]
    fn peek_always_matches_a_shadow_vecdeque(ops in arbitrary_ops()) {
        let mut ring = RingBuffer::new(64).unwrap();
        let cap = ring.capacity();
        let mut shadow: std::collections::VecDeque<u8> = std::collections::VecDeque::new();

        for op in ops {
            match op {
                Op::Write(data) => {
                    let data: Vec<u8> = data.into_iter().take(ring.free()).collect();
                    if !data.is_empty() {
                        ring.write(&data).unwrap();
                        shadow.extend(data);
                    }
                }
                Op::Drain(n) => {
                    let n = n.min(ring.fill());
                    if n > 0 {
                        let got = ring.peek(n).to_vec();
                        let expected: Vec<u8> = shadow.iter().take(n).copied().collect();
                        prop_assert_eq!(got, expected);
                        ring.advance_lo(n);
                        shadow.drain(..n);
                    }
                }
            }
            prop_assert_eq!(ring.fill(), shadow.len());
            prop_assert!(ring.fill() <= cap);
        }

        let remaining = ring.fill();
        let got = ring.peek(remaining).to_vec();
        let expected: Vec<u8> = shadow.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn any_subrange_of_a_full_ring_is_linear(fill_byte in any::<u8>(), drain in 0usize..64, refill in 0usize..64) {
        let mut ring = RingBuffer::new(64).unwrap();
        let cap = ring.capacity();
        ring.write(&vec![fill_byte; cap]).unwrap();

        let drain = drain.min(cap);
        ring.advance_lo(drain);
        let refill = refill.min(ring.free());
        if refill > 0 {
            ring.write(&vec![fill_byte.wrapping_add(1); refill]).unwrap();
        }

        let view = ring.peek(ring.fill());
        prop_assert_eq!(view.len(), ring.fill());
    }
}
