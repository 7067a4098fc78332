//! Test the two-level limit: a leaf split under a full root is rejected.

use crate::config::EngineConfig;
use crate::e2e_tests::helpers::*;
use crate::storage::btree::{INTERNAL_NODE_MAX_KEYS, internal};
use crate::{BTreeError, Unsupported};

#[test]
fn test_full_root_rejects_leaf_split() {
    let config = EngineConfig {
        max_pages: 1000,
        ..EngineConfig::default()
    };
    let mut test = TestTable::with_config(&config);

    let mut id = 0;
    let err = loop {
        id += 1;
        if let Err(e) = test.table.insert(&sample_row(id)) {
            break e;
        }
    };

    assert!(matches!(
        err,
        BTreeError::NotImplemented(Unsupported::MaxDepthExceeded)
    ));
    assert!(err.is_fatal());
    assert!(err.to_string().starts_with("not implemented"));

    let root = test.table.pager_mut().get_page(0).expect("root");
    assert_eq!(
        internal::num_keys(root).expect("num keys") as usize,
        INTERNAL_NODE_MAX_KEYS
    );

    let before = snapshot(&mut test.table);
    assert!(matches!(
        test.table.insert(&sample_row(id)),
        Err(BTreeError::NotImplemented(_))
    ));
    assert_eq!(snapshot(&mut test.table), before);

    assert_eq!(check_tree(&mut test.table), (1..id).collect::<Vec<_>>());

    // Rows that fit an existing leaf are still accepted.
    insert_ids(&mut test.table, [0]);
    assert_eq!(test.table.get(0).expect("get"), Some(sample_row(0)));
}
