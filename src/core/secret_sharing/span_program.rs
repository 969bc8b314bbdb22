use std::collections::BTreeSet;

use rand::{CryptoRng, RngCore};
use tracing::debug;

use super::{SecretSharing, Shares};
use crate::{
    core::{bilinear_map::BilinearMap, msp::MonotoneSpanProgram, policy::AccessPolicy},
    error::FormatErr,
};

/// Linear secret sharing through a monotone span program.
///
/// The secret is `s = Σ v_j` for a random vector `v` and the share of row
/// `M_i` is `<M_i, v>`. Rows whose combination equals `(1, ⋯, 1)` recover
/// `s` with the same coefficients.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SpanProgram;

impl<G: BilinearMap> SecretSharing<G> for SpanProgram {
    fn description(&self) -> String {
        format!("monotone span program over {}", G::description())
    }

    fn share<R: CryptoRng + RngCore>(
        &self,
        group: &G,
        policy: &AccessPolicy,
        secret: &G::Scalar,
        rng: &mut R,
    ) -> Result<Shares<G::Scalar>, FormatErr> {
        let msp = MonotoneSpanProgram::<i32>::from_policy(policy)?;
        let v = match msp.cols() {
            0 => return Err(FormatErr::InternalOperation("empty MSP".to_string())),
            1 => vec![secret.clone()],
            x => {
                let mut v = group.gen_random_scalar_vector(x - 1, rng)?;
                let v_l = v.iter().fold(G::ZERO, std::ops::Add::add);
                // v such that Σ v_i = s
                v.push(secret.clone() - &v_l);
                v
            }
        };
        let shares = msp
            .iter()
            .map(|(leaf, row)| (leaf.clone(), prod_scal::<G>(row, &v)))
            .collect::<Shares<_>>();
        debug!(
            "span program: {} leaf shares over {} columns",
            shares.len(),
            msp.cols()
        );
        Ok(shares)
    }

    fn coefficients(
        &self,
        group: &G,
        policy: &AccessPolicy,
        attributes: &BTreeSet<String>,
    ) -> Result<Option<Shares<G::Scalar>>, FormatErr> {
        let msp = MonotoneSpanProgram::<G::Scalar>::from(&MonotoneSpanProgram::<i32>::from_policy(
            policy,
        )?);
        // extract the submatrix of the rows held
        let (leaves, rows): (Vec<_>, Vec<_>) = msp
            .iter()
            .filter(|(leaf, _)| attributes.contains(leaf.attribute()))
            .unzip();
        // find the α_i coefficients if any
        let coefs = span_coefs(group, &rows, msp.cols())?;
        match &coefs {
            Some(_) => debug!("span program: policy satisfied by {} rows", rows.len()),
            None => debug!("span program: policy not satisfied"),
        }
        // keep the α_i != 0
        Ok(coefs.map(|coefs| {
            leaves
                .into_iter()
                .cloned()
                .zip(coefs)
                .filter(|(_, a_i)| *a_i != G::ZERO)
                .collect()
        }))
    }
}

// assume v1.len() = v2.len()
fn prod_scal<G: BilinearMap>(v1: &[i32], v2: &[G::Scalar]) -> G::Scalar {
    v1.iter()
        .zip(v2.iter())
        .map(|(u1, u2)| G::Scalar::from(*u1) * u2)
        .fold(G::ZERO, |a, b| a + &b)
}

// Compute a linear combination of the rows which spans the 1,⋯,1 vector.
// It is equivalent to solve the linear system: rows^T⋅x = 1,⋯,1
// We use a Gauss-Jordan elimination on the augmented transpose.
fn span_coefs<G: BilinearMap>(
    group: &G,
    rows: &[&Vec<G::Scalar>],
    nb_col: usize,
) -> Result<Option<Vec<G::Scalar>>, FormatErr> {
    if rows.is_empty() || nb_col == 0 {
        return Ok(None);
    }
    let nb_unknown = rows.len();
    // one equation per column of the MSP, the last entry is the target
    let mut system = (0..nb_col)
        .map(|col| {
            let mut eq = rows.iter().map(|row| row[col].clone()).collect::<Vec<_>>();
            eq.push(G::ONE);
            eq
        })
        .collect::<Vec<_>>();

    let mut pivot_cols = Vec::with_capacity(nb_unknown);
    let mut curr_row = 0;
    for col in 0..nb_unknown {
        if curr_row == nb_col {
            break;
        }
        // search for the first non-zero in the current column
        let pivot = match (curr_row..nb_col).find(|r| system[*r][col] != G::ZERO) {
            Some(pivot) => pivot,
            None => continue,
        };
        system.swap(curr_row, pivot);
        // normalize the pivot row
        let inv = group.scalar_invert(&system[curr_row][col])?;
        for entry in system[curr_row].iter_mut().skip(col) {
            *entry = entry.clone() * &inv;
        }
        // eliminate the column from every other row
        let pivot_row = system[curr_row].clone();
        for (r, eq) in system.iter_mut().enumerate() {
            if r == curr_row || eq[col] == G::ZERO {
                continue;
            }
            let factor = eq[col].clone();
            for (entry, p) in eq.iter_mut().zip(pivot_row.iter()).skip(col) {
                *entry = entry.clone() - &(factor.clone() * p);
            }
        }
        pivot_cols.push(col);
        curr_row += 1;
    }

    // an equation 0 = 1 left: the target is out of the span
    if system[curr_row..]
        .iter()
        .any(|eq| eq[nb_unknown] != G::ZERO)
    {
        return Ok(None);
    }
    let mut sol = vec![G::ZERO; nb_unknown];
    for (r, col) in pivot_cols.into_iter().enumerate() {
        sol[col] = system[r][nb_unknown].clone();
    }
    Ok(Some(sol))
}

#[cfg(test)]
mod tests {
    use super::span_coefs;
    use crate::{
        core::bilinear_map::{
            bls12_381::{Bls12_381, Scalar},
            BilinearMap,
        },
        error::FormatErr,
    };

    fn row(v: &[i32]) -> Vec<Scalar> {
        v.iter().map(|i| Scalar::from(*i)).collect()
    }

    #[test]
    fn span_coefs_solves_or_and_and() -> Result<(), FormatErr> {
        let grp = Bls12_381;
        // A or B: both rows are (1)
        let a = row(&[1]);
        let b = row(&[1]);
        let sol = span_coefs(&grp, &[&a, &b], 1)?.expect("A or B is spanned");
        assert_eq!(sol[0].clone() + &sol[1], Bls12_381::ONE);

        // A and B: rows (1, 2) and (1, 0) after the change of basis
        let a = row(&[1, 2]);
        let b = row(&[1, 0]);
        let sol = span_coefs(&grp, &[&a, &b], 2)?.expect("A and B is spanned");
        assert_eq!(sol, vec![Scalar::from(1) * &grp.scalar_invert(&Scalar::from(2))?; 2]);
        assert!(span_coefs(&grp, &[&a], 2)?.is_none());
        assert!(span_coefs(&grp, &[&b], 2)?.is_none());
        assert!(span_coefs(&grp, &[], 2)?.is_none());
        Ok(())
    }
}
