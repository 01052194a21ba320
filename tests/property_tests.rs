//! Property-based tests over a single producer/consumer pair, exercised
//! with randomized interleavings of claim/commit/read/commit_read.

use proptest::prelude::*;
use ringspsc_rs::RingBuffer;

fn new_ring(capacity_records: usize, payload_bytes: usize) -> RingBuffer<'static> {
    RingBuffer::new(capacity_records, payload_bytes).unwrap()
}

proptest! {
    /// The ring never reports occupied bytes beyond its own data region,
    /// no matter how many claims are attempted.
    #[test]
    fn size_never_exceeds_capacity(claims in 0usize..200) {
        let ring = new_ring(16, 8);
        let capacity = ring.layout().data_region_bytes as u64;
        let (producer, consumer) = ring.split();

        for i in 0..claims {
            if let Some(mut claim) = producer.try_claim() {
                claim.payload_mut()[..8].copy_from_slice(&(i as u64).to_le_bytes());
                prop_assert!(claim.commit(1, 8));
            }
        }

        prop_assert!(consumer.size() <= capacity);
    }

    /// Every record read back carries exactly the payload it was committed
    /// with, in commit order -- regardless of how claims and reads are
    /// interleaved.
    #[test]
    fn read_order_matches_commit_order(
        ops in prop::collection::vec(prop::bool::ANY, 1..200),
    ) {
        let ring = new_ring(8, 8);
        let (producer, consumer) = ring.split();

        let mut next_to_send = 0u64;
        let mut next_expected = 0u64;

        for do_claim in ops {
            if do_claim {
                if let Some(mut claim) = producer.try_claim() {
                    claim.payload_mut()[..8].copy_from_slice(&next_to_send.to_le_bytes());
                    prop_assert!(claim.commit(1, 8));
                    next_to_send += 1;
                }
            } else if let Some(guard) = consumer.try_read() {
                let value = u64::from_le_bytes(guard.payload()[..8].try_into().unwrap());
                prop_assert_eq!(value, next_expected);
                guard.commit_read();
                next_expected += 1;
            }
        }

        prop_assert!(next_expected <= next_to_send);
    }

    /// A claim that fails to find room never corrupts the ring: the next
    /// claim after the consumer frees space still succeeds and returns the
    /// expected next record.
    #[test]
    fn full_ring_recovers_after_consumption(extra_claims in 0usize..20) {
        let ring = new_ring(4, 8);
        let (producer, consumer) = ring.split();

        let capacity_records = 4;
        for i in 0..capacity_records {
            let mut claim = producer.try_claim().expect("empty ring has room");
            claim.payload_mut()[..8].copy_from_slice(&(i as u64).to_le_bytes());
            prop_assert!(claim.commit(1, 8));
        }

        for _ in 0..extra_claims {
            prop_assert!(producer.try_claim().is_none(), "full ring must reject further claims");
        }

        let guard = consumer.try_read().expect("first record is readable");
        let value = u64::from_le_bytes(guard.payload()[..8].try_into().unwrap());
        prop_assert_eq!(value, 0);
        guard.commit_read();

        let claim = producer.try_claim().expect("one slot should have been freed");
        prop_assert!(claim.commit(1, 8));
    }

    /// batch_read never delivers more records than its max_count, and never
    /// more than were actually committed.
    #[test]
    fn batch_read_respects_bounds(committed in 0usize..50, max_count in 1u32..50) {
        let ring = new_ring(64, 8);
        let (producer, consumer) = ring.split();

        let mut actually_committed = 0usize;
        for i in 0..committed {
            if let Some(mut claim) = producer.try_claim() {
                claim.payload_mut()[..8].copy_from_slice(&(i as u64).to_le_bytes());
                prop_assert!(claim.commit(1, 8));
                actually_committed += 1;
            }
        }

        let mut delivered_count = 0u32;
        let delivered = consumer.batch_read(
            |_type_id, _payload| {
                delivered_count += 1;
                true
            },
            max_count,
        );

        prop_assert_eq!(delivered, delivered_count);
        prop_assert!(delivered <= max_count);
        prop_assert!(delivered as usize <= actually_committed);
    }
}
