use std::{collections::VecDeque, convert::TryFrom, fmt::Display};

use crate::{
    core::policy::{AccessPolicy, LabelledNode, LeafId},
    error::FormatErr,
};

/// Monotone span program: one row per policy leaf occurrence.
///
/// A set of rows can reconstruct the secret iff the vector `(1, ⋯, 1)`
/// belongs to their span.
#[derive(Clone, PartialEq, Debug)]
pub struct MonotoneSpanProgram<I> {
    pub(crate) nb_row: usize,
    pub(crate) nb_col: usize,
    pub(crate) matrix: Vec<Vec<I>>,
    pub(crate) row_to_leaf: Vec<LeafId>,
}

impl<I: std::fmt::Debug> Display for MonotoneSpanProgram<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        for (leaf, row) in self.row_to_leaf.iter().zip(self.matrix.iter()) {
            writeln!(f, "leaf {:>8}: {:?}", leaf.to_string(), *row)?;
        }
        Ok(())
    }
}

impl<I> MonotoneSpanProgram<I> {
    #[must_use]
    pub fn cols(&self) -> usize {
        self.nb_col
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.nb_row
    }

    #[must_use]
    pub fn matrix(&self) -> &Vec<Vec<I>> {
        &self.matrix
    }

    #[must_use]
    pub fn get_row(&self, row: usize) -> &Vec<I> {
        &self.matrix[row]
    }

    #[must_use]
    pub fn get_leaf_from_row(&self, i: usize) -> &LeafId {
        &self.row_to_leaf[i]
    }

    /// Iterate over `(leaf, row)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&LeafId, &Vec<I>)> {
        self.row_to_leaf.iter().zip(self.matrix.iter())
    }
}

impl MonotoneSpanProgram<i32> {
    pub fn parse(s: &str) -> Result<Self, FormatErr> {
        Self::from_policy(&AccessPolicy::parse(s)?)
    }

    pub fn from_policy(policy: &AccessPolicy) -> Result<Self, FormatErr> {
        Self::from_labelled(&policy.labelled())
    }

    // Generalisation of https://eprint.iacr.org/2010/351.pdf annex G to
    // threshold gates: a k-of-n gate with vector v hands to its i-th child
    // (1-based) the vector (v, i, i^2, ⋯, i^(k-1)) on k-1 fresh columns.
    // Any k children cancel the fresh columns with their Lagrange coefficients
    // at 0, fewer cannot. AND is n-of-n, OR is 1-of-n (no fresh column).
    pub(crate) fn from_labelled(root: &LabelledNode) -> Result<Self, FormatErr> {
        let mut counter = 1;
        let mut queue = VecDeque::new();
        let mut rows = Vec::new();
        // compute the msp matrix
        queue.push_back((root, vec![1_i32]));
        while let Some((node, vector)) = queue.pop_front() {
            match node {
                LabelledNode::Gate {
                    threshold,
                    children,
                } => {
                    if *threshold == 0 {
                        return Err(FormatErr::InvalidAccessPolicy(
                            "gate with a threshold of 0".to_string(),
                        ));
                    }
                    let fresh_cols = threshold - 1;
                    for (i, child) in children.iter().enumerate() {
                        let x = i32::try_from(i + 1)?;
                        let mut vec = vector.clone();
                        vec.resize(counter, 0);
                        for j in 1..=fresh_cols {
                            let power = x.checked_pow(u32::try_from(j)?).ok_or_else(|| {
                                FormatErr::InvalidAccessPolicy(format!(
                                    "threshold gate {threshold} of {} is too large",
                                    children.len()
                                ))
                            })?;
                            vec.push(power);
                        }
                        queue.push_back((child, vec));
                    }
                    counter += fresh_cols;
                }
                LabelledNode::Leaf(id) => {
                    rows.push((id.clone(), vector));
                }
            };
        }
        // The resulting matrix spans the vector 1,0,⋯,0
        // For our scheme we need the msp to span the vector 1,⋯,1
        // Thus we have to change the basis such that 1,0,⋯,0 becomes 1,1,⋯1.
        // It is equivalent to add the first column to the others
        let mut matrix = Vec::with_capacity(rows.len());
        let mut row_to_leaf = Vec::with_capacity(rows.len());
        for (leaf, mut vec) in rows {
            vec.resize(counter, 0);
            for i in 1..vec.len() {
                vec[i] = vec[i].checked_add(vec[0]).ok_or(FormatErr::ConversionFailed)?;
            }
            matrix.push(vec);
            row_to_leaf.push(leaf);
        }
        Ok(MonotoneSpanProgram {
            nb_row: matrix.len(),
            nb_col: counter,
            matrix,
            row_to_leaf,
        })
    }
}

impl<I1: From<i32>> From<&MonotoneSpanProgram<i32>> for MonotoneSpanProgram<I1> {
    fn from(msp: &MonotoneSpanProgram<i32>) -> Self {
        Self {
            nb_row: msp.nb_row,
            nb_col: msp.nb_col,
            row_to_leaf: msp.row_to_leaf.clone(),
            matrix: msp
                .matrix()
                .iter()
                .map(|v| v.iter().map(|i| (*i).into()).collect())
                .collect(),
        }
    }
}
