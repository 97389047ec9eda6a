use rowbatch_core::errors::{BatchError, Coordinate, ExError, ExErrorKind};
use rowbatch_core::{EditKind, IndexPath};

#[test]
fn test_transaction_open_carries_op_and_depth() {
    let err = BatchError::TransactionOpen {
        op: "reload_data".to_string(),
        depth: 2,
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::TransactionOpen);
    assert_eq!(ex_err.code(), "ERR_TRANSACTION_OPEN");
    assert_eq!(ex_err.op(), Some("reload_data"));
    assert_eq!(ex_err.depth(), Some(2));
}

#[test]
fn test_conflicting_item_edit_carries_position() {
    let err = BatchError::ConflictingItemEdit {
        path: IndexPath::new(1, 4),
        kind: EditKind::Reload,
        existing: EditKind::Delete,
    };
    assert_eq!(
        err.to_string(),
        "Cannot reload item 1.4: already scheduled for delete"
    );

    let ex_err: ExError = err.into();
    assert_eq!(ex_err.kind(), ExErrorKind::ConflictingEdit);
    assert_eq!(ex_err.section(), Some(1));
    assert_eq!(ex_err.item(), Some(4));
}

#[test]
fn test_out_of_range_section_and_item_share_kind() {
    let section: ExError = BatchError::SectionOutOfRange {
        coordinate: Coordinate::New,
        section: 5,
        count: 2,
    }
    .into();
    let item: ExError = BatchError::ItemOutOfRange {
        coordinate: Coordinate::Old,
        path: IndexPath::new(0, 9),
        count: 3,
    }
    .into();

    assert_eq!(section.kind(), ExErrorKind::IndexOutOfRange);
    assert_eq!(item.kind(), ExErrorKind::IndexOutOfRange);
    assert!(section.message().contains("new section count 2"));
    assert!(item.message().contains("old item count 3"));
}

#[test]
fn test_error_kind_code_mapping() {
    let kinds = vec![
        (ExErrorKind::UnbalancedTransaction, "ERR_UNBALANCED_TRANSACTION"),
        (ExErrorKind::TransactionOpen, "ERR_TRANSACTION_OPEN"),
        (ExErrorKind::ReentrantDestruction, "ERR_REENTRANT_DESTRUCTION"),
        (ExErrorKind::ConflictingEdit, "ERR_CONFLICTING_EDIT"),
        (ExErrorKind::IndexOutOfRange, "ERR_INDEX_OUT_OF_RANGE"),
        (ExErrorKind::InconsistentUpdate, "ERR_INCONSISTENT_UPDATE"),
        (ExErrorKind::InvalidInput, "ERR_INVALID_INPUT"),
        (ExErrorKind::Io, "ERR_IO"),
        (ExErrorKind::Serialization, "ERR_SERIALIZATION"),
        (ExErrorKind::Internal, "ERR_INTERNAL"),
    ];

    for (kind, code) in &kinds {
        assert_eq!(kind.code(), *code);
    }

    let mut codes: Vec<_> = kinds.iter().map(|(_, c)| *c).collect();
    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), kinds.len(), "codes must be unique");
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.json");
    let err: BatchError = io.into();
    let ex_err: ExError = err.into();
    assert_eq!(ex_err.kind(), ExErrorKind::Io);
    assert!(ex_err.message().contains("missing.json"));
}
