//! End-to-end narrowing scenarios over buffer-backed memory.

use memsift_core::{
    AddressRange, CancelToken, ComparisonPredicate, DecodedValue, Error, MemoryAccessor,
    NumeralBase, ScanEngine, ScanOp, SharedMemory, Signedness, TypeSpec, Width,
};

fn u8_spec() -> TypeSpec {
    TypeSpec::numeric(Width::Byte, Signedness::Unsigned, NumeralBase::Decimal)
}

fn predicate(op: ScanOp, operand: Option<DecodedValue>, spec: &TypeSpec) -> ComparisonPredicate {
    ComparisonPredicate::new(op, operand, spec).unwrap()
}

#[test]
fn test_new_search_yields_one_candidate_per_mapped_address() {
    let mem = SharedMemory::builder().region(0x1000, 16, true).build();
    let mut engine = ScanEngine::new(mem, u8_spec());

    let count = engine
        .new_search(&[AddressRange::new(0x1000, 16).unwrap()], false)
        .unwrap();

    assert_eq!(count, 16);
    assert!(
        engine
            .list()
            .all(|c| c.current == DecodedValue::Unsigned(0) && c.previous.is_none())
    );
}

#[test]
fn test_unmapped_gap_inside_range_is_skipped_silently() {
    let mem = SharedMemory::builder()
        .region(0x1000, 8, true)
        .region(0x1018, 8, true)
        .build();
    let mut engine = ScanEngine::new(mem, u8_spec());

    // One range spanning both regions and the hole between them.
    let count = engine
        .new_search(&[AddressRange::new(0x1000, 0x20).unwrap()], false)
        .unwrap();

    assert_eq!(count, 16);
    assert!(engine.list().all(|c| c.address < 0x1008 || c.address >= 0x1018));
}

#[test]
fn test_equal_after_new_search_keeps_exact_matches() {
    let mem = SharedMemory::builder()
        .region(0x1000, 6, true)
        .write_bytes(0, &[5, 0, 5, 9, 5, 1])
        .build();
    let mut engine = ScanEngine::new(mem, u8_spec());
    engine
        .new_search(&[AddressRange::new(0x1000, 6).unwrap()], false)
        .unwrap();

    let survivors = engine
        .search_within(&predicate(
            ScanOp::Equal,
            Some(DecodedValue::Unsigned(5)),
            &u8_spec(),
        ))
        .unwrap();

    assert_eq!(survivors, 3);
    let addresses: Vec<u64> = engine.list().map(|c| c.address).collect();
    assert_eq!(addresses, vec![0x1000, 0x1002, 0x1004]);
}

#[test]
fn test_increased_without_baseline_drops_everything() {
    let mem = SharedMemory::builder().region(0x1000, 8, true).build();
    let mut engine = ScanEngine::new(mem, u8_spec());
    engine
        .new_search(&[AddressRange::new(0x1000, 8).unwrap()], false)
        .unwrap();

    // New Search seeds previous = None, so the delta predicate is
    // vacuously false for every candidate.
    let result = engine.search_within(&predicate(ScanOp::Increased, None, &u8_spec()));
    assert!(matches!(result, Err(Error::EmptyCandidateSet)));
    assert!(engine.candidates().is_empty());
}

#[test]
fn test_external_write_then_refresh_then_increased() {
    let mem = SharedMemory::builder().region(0x1000, 16, true).build();
    let mut engine = ScanEngine::new(mem.clone(), u8_spec());

    let count = engine
        .new_search(&[AddressRange::new(0x1000, 16).unwrap()], false)
        .unwrap();
    assert_eq!(count, 16);

    // The running system bumps one address between passes.
    mem.write(0x1005, &[5]).unwrap();
    assert_eq!(engine.refresh().unwrap(), 16);

    let bumped = engine.candidates().get(0x1005).unwrap();
    assert_eq!(bumped.previous, Some(DecodedValue::Unsigned(0)));
    assert_eq!(bumped.current, DecodedValue::Unsigned(5));

    let survivors = engine
        .search_within(&predicate(ScanOp::Increased, None, &u8_spec()))
        .unwrap();
    assert_eq!(survivors, 1);
    assert_eq!(engine.list().next().unwrap().address, 0x1005);
}

#[test]
fn test_greater_than_respects_signedness() {
    // 0x1000 holds -1 as a signed halfword, 0x1002 holds 1.
    let mem = SharedMemory::builder()
        .region(0x1000, 4, true)
        .write_bytes(0, &[0xFF, 0xFF, 0x01, 0x00])
        .build();
    let spec = TypeSpec::numeric(Width::Half, Signedness::Signed, NumeralBase::Decimal);
    let mut engine = ScanEngine::new(mem, spec.clone());
    engine
        .new_search(
            &[
                AddressRange::new(0x1000, 1).unwrap(),
                AddressRange::new(0x1002, 1).unwrap(),
            ],
            false,
        )
        .unwrap();
    assert_eq!(engine.candidates().len(), 2);

    let survivors = engine
        .search_within(&predicate(
            ScanOp::Greater,
            Some(DecodedValue::Signed(0)),
            &spec,
        ))
        .unwrap();

    assert_eq!(survivors, 1);
    assert_eq!(engine.list().next().unwrap().address, 0x1002);
}

#[test]
fn test_changed_by_sees_unsigned_wraparound() {
    let mem = SharedMemory::builder()
        .region(0x1000, 2, true)
        .write_bytes(0, &[255, 7])
        .build();
    let mut engine = ScanEngine::new(mem.clone(), u8_spec());
    engine
        .new_search(&[AddressRange::new(0x1000, 2).unwrap()], false)
        .unwrap();

    // Establish the baseline, then let the counter wrap 255 -> 0.
    engine.refresh().unwrap();
    mem.write(0x1000, &[0]).unwrap();

    let survivors = engine
        .search_within(&predicate(
            ScanOp::ChangedBy,
            Some(DecodedValue::Unsigned(1)),
            &u8_spec(),
        ))
        .unwrap();

    // Naive 64-bit subtraction would see -255 and drop the wrapped
    // counter; the width-modulo delta keeps it.
    assert_eq!(survivors, 1);
    assert_eq!(engine.list().next().unwrap().address, 0x1000);
}

#[test]
fn test_refresh_twice_is_idempotent_without_writes() {
    let mem = SharedMemory::builder()
        .region(0x1000, 8, true)
        .write_bytes(0, &[1, 2, 3, 4, 5, 6, 7, 8])
        .build();
    let mut engine = ScanEngine::new(mem, u8_spec());
    engine
        .new_search(&[AddressRange::new(0x1000, 8).unwrap()], false)
        .unwrap();

    let before: Vec<DecodedValue> = engine.list().map(|c| c.current.clone()).collect();
    engine.refresh().unwrap();
    engine.refresh().unwrap();

    for (candidate, original) in engine.list().zip(&before) {
        assert_eq!(&candidate.current, original);
        assert_eq!(candidate.previous.as_ref(), Some(original));
    }
}

#[test]
fn test_read_only_exclusion_and_opt_in() {
    let mem = SharedMemory::builder()
        .region(0x2000000, 8, true)
        .region(0x8000000, 8, false)
        .build();
    let ranges = [
        AddressRange::new(0x2000000, 8).unwrap(),
        AddressRange::new(0x8000000, 8).unwrap(),
    ];

    let mut engine = ScanEngine::new(mem.clone(), u8_spec());
    engine.new_search(&ranges, false).unwrap();
    assert!(engine.list().all(|c| c.address < 0x8000000));

    let mut engine = ScanEngine::new(mem, u8_spec());
    engine.new_search(&ranges, true).unwrap();
    assert_eq!(engine.candidates().len(), 16);
}

#[test]
fn test_fully_unmapped_range_fails_the_search() {
    let mem = SharedMemory::builder().region(0x1000, 8, true).build();
    let mut engine = ScanEngine::new(mem, u8_spec());

    let result = engine.new_search(
        &[
            AddressRange::new(0x1000, 8).unwrap(),
            AddressRange::new(0x9000, 8).unwrap(),
        ],
        false,
    );
    assert!(matches!(
        result,
        Err(Error::RangeUnmapped { start: 0x9000, .. })
    ));
}

#[test]
fn test_values_spanning_chunk_seams_decode_intact() {
    let payload: Vec<u8> = (0u8..32).collect();
    let build = || {
        SharedMemory::builder()
            .region(0x1000, 32, true)
            .write_bytes(0, &payload)
            .build()
    };
    let spec = TypeSpec::numeric(Width::Word, Signedness::Unsigned, NumeralBase::Decimal);
    let range = [AddressRange::new(0x1000, 32).unwrap()];

    let mut tiny_chunks = ScanEngine::new(build(), spec.clone()).with_chunk_size(4);
    let mut one_chunk = ScanEngine::new(build(), spec);
    tiny_chunks.new_search(&range, false).unwrap();
    one_chunk.new_search(&range, false).unwrap();

    let tiny: Vec<_> = tiny_chunks.list().cloned().collect();
    let full: Vec<_> = one_chunk.list().cloned().collect();
    assert_eq!(tiny, full);
}

#[test]
fn test_cancelled_pass_retains_candidate_set() {
    let mem = SharedMemory::builder()
        .region(0x1000, 8, true)
        .write_bytes(0, &[1, 2, 3, 4, 5, 6, 7, 8])
        .build();
    let mut engine = ScanEngine::new(mem, u8_spec());
    engine
        .new_search(&[AddressRange::new(0x1000, 8).unwrap()], false)
        .unwrap();

    let token = CancelToken::new();
    engine.set_cancel_token(token.clone());
    token.cancel();

    let result = engine.search_within(&predicate(
        ScanOp::Equal,
        Some(DecodedValue::Unsigned(1)),
        &u8_spec(),
    ));
    assert!(matches!(result, Err(Error::Cancelled)));

    // Nothing was narrowed; the set is intact and the session usable.
    assert_eq!(engine.candidates().len(), 8);
    assert!(engine.list().all(|c| c.previous.is_none()));
}

#[test]
fn test_text_run_equality_and_change() {
    let mem = SharedMemory::builder()
        .region(0x1000, 12, true)
        .write_bytes(0, b"GOLDxyzGOLD?")
        .build();
    let spec = TypeSpec::text(4).unwrap();
    let mut engine = ScanEngine::new(mem.clone(), spec.clone());
    engine
        .new_search(&[AddressRange::new(0x1000, 12).unwrap()], false)
        .unwrap();

    let survivors = engine
        .search_within(&predicate(
            ScanOp::Equal,
            Some(DecodedValue::Bytes(b"GOLD".to_vec())),
            &spec,
        ))
        .unwrap();
    assert_eq!(survivors, 2);
    let addresses: Vec<u64> = engine.list().map(|c| c.address).collect();
    assert_eq!(addresses, vec![0x1000, 0x1007]);

    // Overwrite the second run and narrow to what changed.
    mem.write(0x1007, b"DIRT").unwrap();
    let survivors = engine
        .search_within(&predicate(ScanOp::Changed, None, &spec))
        .unwrap();
    assert_eq!(survivors, 1);
    assert_eq!(engine.list().next().unwrap().address, 0x1007);
}

#[test]
fn test_write_value_round_trips_through_accessor() {
    let mem = SharedMemory::builder().region(0x1000, 4, true).build();
    let mut engine = ScanEngine::new(mem.clone(), u8_spec());
    engine
        .new_search(&[AddressRange::new(0x1000, 4).unwrap()], false)
        .unwrap();

    engine
        .write_value(0x1002, &DecodedValue::Unsigned(42))
        .unwrap();
    assert_eq!(mem.read(0x1002, 1).unwrap(), vec![42]);

    // The poke shows up in the candidate window on the next pass.
    engine.refresh().unwrap();
    assert_eq!(
        engine.candidates().get(0x1002).unwrap().current,
        DecodedValue::Unsigned(42)
    );
}

#[test]
fn test_snapshot_is_tagged_and_ordered() {
    let mem = SharedMemory::builder()
        .region(0x1000, 4, true)
        .write_bytes(0, &[4, 3, 2, 1])
        .build();
    let mut engine = ScanEngine::new(mem, u8_spec());
    engine
        .new_search(&[AddressRange::new(0x1000, 4).unwrap()], false)
        .unwrap();
    engine.refresh().unwrap();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.generation(), 1);
    assert_eq!(snapshot.spec(), &u8_spec());
    assert_eq!(snapshot.len(), 4);

    let addresses: Vec<u64> = snapshot.iter().map(|(addr, _)| addr).collect();
    assert_eq!(addresses, vec![0x1000, 0x1001, 0x1002, 0x1003]);
    assert_eq!(snapshot.get(0x1003), Some(&DecodedValue::Unsigned(1)));
}

#[test]
fn test_write_value_rejects_unrepresentable_literal() {
    let mem = SharedMemory::builder().region(0x1000, 4, true).build();
    let engine = ScanEngine::new(mem, u8_spec());

    let result = engine.write_value(0x1000, &DecodedValue::Unsigned(300));
    assert!(matches!(result, Err(Error::ValueOutOfRange { .. })));
}
