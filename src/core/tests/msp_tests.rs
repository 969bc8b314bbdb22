use crate::{
    core::{msp::MonotoneSpanProgram, policy::LeafId},
    error::FormatErr,
};

#[test]
fn parsing() -> Result<(), FormatErr> {
    let a_and_b = MonotoneSpanProgram::parse("A and B")?;
    assert_eq!(MonotoneSpanProgram::parse("(A) and (B)")?, a_and_b);
    assert_eq!(MonotoneSpanProgram::parse("((A)) and B")?, a_and_b);
    assert_ne!(MonotoneSpanProgram::parse("A or B")?, a_and_b);
    Ok(())
}

#[test]
fn and_or_rows() -> Result<(), FormatErr> {
    let msp = MonotoneSpanProgram::parse("A or B")?;
    assert_eq!(msp.cols(), 1);
    assert_eq!(msp.matrix(), &vec![vec![1], vec![1]]);

    let msp = MonotoneSpanProgram::parse("A and B")?;
    assert_eq!(msp.cols(), 2);
    assert_eq!(msp.matrix(), &vec![vec![1, 2], vec![1, 3]]);

    let msp = MonotoneSpanProgram::parse("A and (B or C)")?;
    println!("msp: {msp}");
    assert_eq!(msp.rows(), 3);
    assert_eq!(msp.get_row(0), &vec![1, 2]);
    assert_eq!(msp.get_row(1), &vec![1, 3]);
    assert_eq!(msp.get_row(2), &vec![1, 3]);
    assert_eq!(msp.get_leaf_from_row(2), &LeafId::new("C", 0));
    Ok(())
}

#[test]
fn threshold_rows() -> Result<(), FormatErr> {
    let msp = MonotoneSpanProgram::parse("2 of (A, B, C)")?;
    assert_eq!(msp.matrix(), &vec![vec![1, 2], vec![1, 3], vec![1, 4]]);

    // k > n gets more columns than rows can cancel
    let msp = MonotoneSpanProgram::parse("3 of (A, B)")?;
    assert_eq!(msp.cols(), 3);
    assert_eq!(msp.matrix(), &vec![vec![1, 2, 2], vec![1, 3, 5]]);
    Ok(())
}

#[test]
fn one_row_per_occurrence() -> Result<(), FormatErr> {
    let msp = MonotoneSpanProgram::parse("A and (A or B)")?;
    assert_eq!(msp.rows(), 3);
    let leaves = msp.iter().map(|(leaf, _)| leaf.clone()).collect::<Vec<_>>();
    assert!(leaves.contains(&LeafId::new("A", 0)));
    assert!(leaves.contains(&LeafId::new("A", 1)));
    assert!(leaves.contains(&LeafId::new("B", 0)));
    Ok(())
}
