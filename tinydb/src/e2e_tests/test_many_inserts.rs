//! Test many inserts spanning dozens of leaves.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::e2e_tests::helpers::*;

#[test]
fn test_many_sequential_inserts() {
    let mut test = TestTable::new();

    insert_ids(&mut test.table, 1..=500);

    let expected: Vec<u32> = (1..=500).collect();
    assert_eq!(check_tree(&mut test.table), expected);
    assert_eq!(scan_ids(&mut test.table), expected);
    for id in [1, 13, 14, 250, 499, 500] {
        assert_eq!(test.table.get(id).expect("get"), Some(sample_row(id)));
    }
    assert_eq!(test.table.get(501).expect("get"), None);
}

#[test]
fn test_many_reverse_inserts() {
    let mut test = TestTable::new();

    insert_ids(&mut test.table, (1..=300).rev());

    assert_eq!(check_tree(&mut test.table), (1..=300).collect::<Vec<_>>());
}

#[test]
fn test_many_shuffled_inserts() {
    for seed in [1, 2, 3] {
        let mut test = TestTable::new();
        let mut ids: Vec<u32> = (1..=400).map(|i| i * 3).collect();
        ids.shuffle(&mut StdRng::seed_from_u64(seed));

        insert_ids(&mut test.table, ids.iter().copied());

        let mut expected = ids.clone();
        expected.sort_unstable();
        assert_eq!(check_tree(&mut test.table), expected, "seed {seed}");
        assert_eq!(scan_ids(&mut test.table), expected, "seed {seed}");

        for &id in ids.iter().take(50) {
            assert_eq!(test.table.get(id).expect("get"), Some(sample_row(id)));
            assert_eq!(test.table.get(id + 1).expect("get"), None);
        }
    }
}
