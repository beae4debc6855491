use crate::trace::{AccessRecord, Operation, TraceError, TraceReader};

#[test]
fn parses_every_operation() {
    let cases = [
        ("I  0400d7d4,8", Operation::Instruction, 0x0400d7d4, 8),
        (" L 7ff0005c8,8", Operation::Load, 0x7ff0005c8, 8),
        (" S 7ff0005c8,8", Operation::Store, 0x7ff0005c8, 8),
        (" M 0421c7f0,4", Operation::Modify, 0x0421c7f0, 4),
        ("L 10,1", Operation::Load, 0x10, 1),
        ("\tS\tFFFFFFFFFFFFFFFF , 16 \n", Operation::Store, u64::MAX, 16),
    ];
    for (line, operation, address, size) in cases {
        let record: AccessRecord = line.parse().unwrap();
        assert_eq!(record, AccessRecord::new(operation, address, size), "parsing {line:?}");
    }
}

#[test]
fn rejects_malformed_records() {
    for line in ["", " L", " L 10", " L 10,", " L zz,1", " L 10,-1", "L10,1", " L 10000000000000000,1"] {
        assert!(
            matches!(line.parse::<AccessRecord>(), Err(TraceError::Malformed { .. })),
            "{line:?} should be malformed"
        );
    }
}

#[test]
fn rejects_unknown_operations() {
    assert!(matches!(
        " X 10,1".parse::<AccessRecord>(),
        Err(TraceError::UnknownOperation { operation: 'X', .. })
    ));
    assert!(matches!(Operation::try_from('l'), Err(TraceError::UnknownOperation { operation: 'l', .. })));
}

#[test]
fn operation_access_counts() {
    assert_eq!(Operation::Instruction.accesses(), 0);
    assert_eq!(Operation::Load.accesses(), 1);
    assert_eq!(Operation::Store.accesses(), 1);
    assert_eq!(Operation::Modify.accesses(), 2);
}

#[test]
fn reader_skips_blank_lines_and_numbers_errors() {
    let trace = " L 10,1\n\n   \n M 20,1\n L 30\n";
    let mut reader = TraceReader::new(trace.as_bytes());
    assert_eq!(reader.next().unwrap().unwrap(), AccessRecord::new(Operation::Load, 0x10, 1));
    assert_eq!(reader.next().unwrap().unwrap(), AccessRecord::new(Operation::Modify, 0x20, 1));
    assert_eq!(reader.lines_read(), 4);
    match reader.next() {
        Some(Err(TraceError::Malformed { line, content })) => {
            assert_eq!(line, 5);
            assert_eq!(content, " L 30");
        }
        other => panic!("expected a malformed record, got {other:?}"),
    }
    assert!(reader.next().is_none());
    assert_eq!(reader.lines_read(), 5);
}

#[test]
fn reader_handles_a_missing_final_newline() {
    let records: Result<Vec<_>, _> = TraceReader::new(" S 18,4\n L 20,4".as_bytes()).collect();
    assert_eq!(
        records.unwrap(),
        vec![
            AccessRecord::new(Operation::Store, 0x18, 4),
            AccessRecord::new(Operation::Load, 0x20, 4),
        ]
    );
}

#[test]
fn records_display_in_trace_format() {
    assert_eq!(AccessRecord::new(Operation::Modify, 0x7ff000398, 8).to_string(), "M 7ff000398,8");
}
