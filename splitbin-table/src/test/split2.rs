use crate::{max_shift_for_len, SplitOptions, TwoLevel};
use splitbin_base::Result;
use test_log::test;

fn check_all(split: &TwoLevel<u32>, t: &[u32]) {
    for (i, v) in t.iter().enumerate() {
        assert_eq!(split.get(i), Some(*v), "index {}", i);
    }
    assert_eq!(split.get(t.len()), None);
}

#[test]
fn test_maximum_shift() {
    assert_eq!(max_shift_for_len(0), 0);
    assert_eq!(max_shift_for_len(1), 0);
    assert_eq!(max_shift_for_len(2), 0);
    assert_eq!(max_shift_for_len(3), 1);
    assert_eq!(max_shift_for_len(4), 1);
    assert_eq!(max_shift_for_len(5), 2);
    assert_eq!(max_shift_for_len(8), 2);
    assert_eq!(max_shift_for_len(9), 3);
    assert_eq!(max_shift_for_len(0x110000), 20);
}

#[test]
fn test_two_runs() -> Result<()> {
    let t = [5u32, 5, 5, 5, 7, 7, 7, 7];
    // shift 0: 8 + 2 bytes, shift 1: 4 + 4, shift 2: 2 + 8.
    let sizes = (0..=2)
        .map(|shift| TwoLevel::build(&t, shift)?.byte_size())
        .collect::<Result<Vec<usize>>>()?;
    assert_eq!(sizes, vec![10, 8, 10]);

    let split = TwoLevel::compile(&t, &SplitOptions::default())?;
    assert_eq!(split.shift, 1);
    assert_eq!(split.t1, vec![0, 0, 1, 1]);
    assert_eq!(split.t2, vec![5, 5, 7, 7]);
    assert_eq!(split.byte_size()?, 8);
    check_all(&split, &t);

    let quarters = TwoLevel::build(&t, 2)?;
    assert_eq!(quarters.t1, vec![0, 1]);
    assert_eq!(quarters.t2, t.to_vec());
    Ok(())
}

#[test]
fn test_all_identical() -> Result<()> {
    for len in [2, 4, 8, 64, 1024] {
        let t = vec![0u32; len];
        for shift in 0..=max_shift_for_len(len) {
            let split = TwoLevel::build(&t, shift)?;
            assert_eq!(split.t2.len(), 1 << shift, "one unique block");
            assert!(split.t1.iter().all(|&b| b == 0));
        }
        let split = TwoLevel::compile(&t, &SplitOptions::default())?;
        assert!(!split.t1.is_empty());
        check_all(&split, &t);
    }
    // 8 zeroes: shift 0 is 8 + 1, shift 1 is 4 + 2, shift 2 is 2 + 4; the
    // tie goes to the first shift tried.
    let split = TwoLevel::compile(&[0u32; 8], &SplitOptions::default())?;
    assert_eq!(split.shift, 1);
    assert_eq!(split.byte_size()?, 6);
    Ok(())
}

#[test]
fn test_single_entry() -> Result<()> {
    let split = TwoLevel::compile(&[42u32], &SplitOptions::default())?;
    assert_eq!(split.shift, 0);
    assert_eq!(split.t1, vec![0]);
    assert_eq!(split.t2, vec![42]);
    assert_eq!(split.get(0), Some(42));
    assert_eq!(split.get(1), None);
    Ok(())
}

#[test]
fn test_empty_is_rejected() {
    let empty: [u32; 0] = [];
    assert!(TwoLevel::compile(&empty, &SplitOptions::default()).is_err());
}

#[test]
fn test_chosen_shift_is_minimal() -> Result<()> {
    for (len, seed) in [(3000, 1), (4096, 2), (70001, 3), (0x30000 + 17, 4)] {
        let t = super::runs_table(len, seed);
        let split = TwoLevel::compile(&t, &SplitOptions::default())?;
        let chosen = split.byte_size()?;
        for shift in 0..=max_shift_for_len(len) {
            let other = TwoLevel::build(&t, shift)?.byte_size()?;
            assert!(chosen <= other, "shift {} beats chosen {}", shift, split.shift);
            if shift < split.shift {
                assert!(chosen < other, "earlier shift {} ties chosen", shift);
            }
        }
        check_all(&split, &t);
        assert!(chosen < t.len() * 2);
    }
    Ok(())
}

#[test]
fn test_narrow_and_wide_element_types() -> Result<()> {
    let bytes: Vec<u8> = super::runs_table(5000, 7).iter().map(|&v| v as u8).collect();
    let split = TwoLevel::compile(&bytes, &SplitOptions::default())?;
    for (i, v) in bytes.iter().enumerate() {
        assert_eq!(split.get(i), Some(*v));
    }

    let wide: Vec<u64> = (0..1000u64).map(|i| (i / 100) * 70_000).collect();
    let split = TwoLevel::compile(&wide, &SplitOptions::default())?;
    assert_eq!(split.get(999), Some(9 * 70_000));

    let too_wide = vec![1u64 << 40; 16];
    assert!(TwoLevel::compile(&too_wide, &SplitOptions::default()).is_err());
    Ok(())
}

#[test]
fn test_max_shift_cap() -> Result<()> {
    let t = super::runs_table(20000, 11);
    let split = TwoLevel::compile(&t, &SplitOptions::default().with_max_shift(2))?;
    assert!(split.shift <= 2);
    check_all(&split, &t);
    let flat = TwoLevel::compile(&t, &SplitOptions::default().with_max_shift(0))?;
    assert_eq!(flat.shift, 0);
    check_all(&flat, &t);
    Ok(())
}

#[test]
fn test_corruption_is_detected() -> Result<()> {
    let t = super::runs_table(10000, 5);
    let mut split = TwoLevel::compile(&t, &SplitOptions::default())?;
    assert!(split.first_mismatch(&t).is_none());

    // Corrupt one t2 entry and find the first source index that reads it.
    let victim = split.t2.len() / 2;
    split.t2[victim] += 1000;
    let mask = (1usize << split.shift) - 1;
    let expected_index = (0..t.len())
        .find(|&i| ((split.t1[i >> split.shift] as usize) << split.shift) + (i & mask) == victim);

    match expected_index {
        Some(index) => {
            let mismatch = split.first_mismatch(&t).expect("corruption went unnoticed");
            assert_eq!(mismatch.index, index);
            assert_eq!(mismatch.shift, split.shift);
            assert_eq!(mismatch.expected, t[index]);
            assert_eq!(mismatch.found, Some(t[index] + 1000));
            let e = split.verify(&t).unwrap_err();
            assert!(e.message().contains(&format!("index {}", index)));
        }
        None => assert!(split.first_mismatch(&t).is_none()),
    }
    Ok(())
}

#[test]
fn test_length_mismatch_is_detected() -> Result<()> {
    let t = super::runs_table(1000, 8);
    let split = TwoLevel::compile(&t, &SplitOptions::default())?;
    let mismatch = split.first_mismatch(&t[..999]).expect("short source accepted");
    assert_eq!(mismatch.index, 999);
    assert_eq!(mismatch.found, None);
    Ok(())
}

#[test]
fn test_packed_lookup() -> Result<()> {
    let t = super::runs_table(0x11000 + 3, 21);
    let split = TwoLevel::compile(&t, &SplitOptions::default())?;
    let packed = split.pack()?;
    assert_eq!(packed.byte_size(), split.byte_size()?);
    assert_eq!(packed.len(), t.len());
    for (i, v) in t.iter().enumerate() {
        assert_eq!(packed.get(i), Some(*v));
    }
    assert_eq!(packed.get(t.len()), None);
    Ok(())
}

#[test]
fn test_persisted_table_still_answers() -> Result<()> {
    let t = super::runs_table(4000, 31);
    let packed = TwoLevel::compile(&t, &SplitOptions::default())?.pack()?;
    let bytes = rmp_serde::to_vec(&packed)?;
    let restored: crate::PackedTwoLevel = rmp_serde::from_slice(&bytes)?;
    assert_eq!(restored, packed);
    assert_eq!(restored.get(3999), Some(t[3999]));
    Ok(())
}

#[test]
fn test_restored_shift_wider_than_index_misses() -> Result<()> {
    let t = super::runs_table(300, 5);
    let mut split = TwoLevel::compile(&t, &SplitOptions::default())?;
    split.shift = usize::BITS;
    let mut packed = split.pack()?;
    packed.shift = u32::MAX;

    let bytes = rmp_serde::to_vec(&split)?;
    let restored: TwoLevel<u32> = rmp_serde::from_slice(&bytes)?;
    assert_eq!(restored.shift, usize::BITS);
    assert_eq!(restored.get(0), None);
    assert_eq!(restored.get(299), None);
    assert!(restored.verify(&t).is_err());

    let bytes = rmp_serde::to_vec(&packed)?;
    let restored: crate::PackedTwoLevel = rmp_serde::from_slice(&bytes)?;
    assert_eq!(restored.get(0), None);
    assert_eq!(restored.get(299), None);
    Ok(())
}
