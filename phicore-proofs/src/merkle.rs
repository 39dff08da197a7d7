//! Merkle accumulator over proof hashes.
//!
//! Leaves are hex digests. An empty tree has the empty root, a single leaf is
//! its own root, and every other level pairs neighbours left to right as
//! `sha256(left ++ right)` over the hex text, pairing an odd trailing node with
//! itself. The root is rebuilt from all leaves on every append.

use serde::{Deserialize, Serialize};

use crate::canonical::sha256_hex;

pub fn hash_pair(left: &str, right: &str) -> String {
    let mut joined = String::with_capacity(left.len() + right.len());
    joined.push_str(left);
    joined.push_str(right);
    sha256_hex(joined)
}

pub fn merkle_root<S: AsRef<str>>(leaves: &[S]) -> String {
    match leaves {
        [] => String::new(),
        [single] => single.as_ref().to_owned(),
        _ => {
            let mut level: Vec<String> = leaves.iter().map(|l| l.as_ref().to_owned()).collect();
            while level.len() > 1 {
                level = next_level(&level);
            }
            level.pop().unwrap_or_default()
        }
    }
}

fn next_level(level: &[String]) -> Vec<String> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            hash_pair(left, right)
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiblingSide {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleStep {
    pub sibling: String,
    pub side: SiblingSide,
}

/// Audit path from one leaf to the root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleProof {
    pub leaf_index: usize,
    pub leaf_count: usize,
    pub path: Vec<MerkleStep>,
}

impl MerkleProof {
    pub fn verify(&self, leaf: &str, root: &str) -> bool {
        let computed = self
            .path
            .iter()
            .fold(leaf.to_owned(), |acc, step| match step.side {
                SiblingSide::Left => hash_pair(&step.sibling, &acc),
                SiblingSide::Right => hash_pair(&acc, &step.sibling),
            });
        computed == root
    }
}

/// Ordered leaf list plus the root over all of it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MerkleAccumulator {
    leaves: Vec<String>,
    root: String,
}

impl MerkleAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_leaves<I>(leaves: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let leaves: Vec<String> = leaves.into_iter().map(Into::into).collect();
        let root = merkle_root(&leaves);
        Self { leaves, root }
    }

    /// Append a leaf and rebuild the root from the full leaf list.
    pub fn append(&mut self, leaf: impl Into<String>) -> &str {
        self.leaves.push(leaf.into());
        self.root = merkle_root(&self.leaves);
        &self.root
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn leaves(&self) -> &[String] {
        &self.leaves
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn inclusion_proof(&self, leaf_index: usize) -> Option<MerkleProof> {
        if leaf_index >= self.leaves.len() {
            return None;
        }
        let mut path = Vec::new();
        let mut level = self.leaves.clone();
        let mut index = leaf_index;
        while level.len() > 1 {
            let (sibling_index, side) = if index % 2 == 0 {
                ((index + 1).min(level.len() - 1), SiblingSide::Right)
            } else {
                (index - 1, SiblingSide::Left)
            };
            path.push(MerkleStep {
                sibling: level[sibling_index].clone(),
                side,
            });
            level = next_level(&level);
            index /= 2;
        }
        Some(MerkleProof {
            leaf_index,
            leaf_count: self.leaves.len(),
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: usize) -> Vec<String> {
        (0..n).map(|i| sha256_hex(format!("leaf-{i}"))).collect()
    }

    #[test]
    fn empty_and_single_leaf_roots() {
        assert_eq!(merkle_root::<String>(&[]), "");
        let leaf = leaves(1);
        assert_eq!(merkle_root(&leaf), leaf[0]);
    }

    #[test]
    fn odd_level_duplicates_last_leaf() {
        let l = leaves(3);
        let expected = hash_pair(&hash_pair(&l[0], &l[1]), &hash_pair(&l[2], &l[2]));
        assert_eq!(merkle_root(&l), expected);
    }

    #[test]
    fn swapping_leaves_changes_root() {
        let l = leaves(4);
        let mut swapped = l.clone();
        swapped.swap(1, 2);
        assert_ne!(merkle_root(&l), merkle_root(&swapped));
    }

    #[test]
    fn accumulator_matches_batch_root() {
        let l = leaves(7);
        let mut acc = MerkleAccumulator::new();
        for (i, leaf) in l.iter().enumerate() {
            let root = acc.append(leaf.clone()).to_owned();
            assert_eq!(root, merkle_root(&l[..=i]));
        }
        assert_eq!(acc, MerkleAccumulator::from_leaves(l.clone()));
    }

    #[test]
    fn inclusion_proofs_verify_for_every_leaf() {
        for n in 1..=9 {
            let acc = MerkleAccumulator::from_leaves(leaves(n));
            for (i, leaf) in acc.leaves().iter().enumerate() {
                let proof = acc.inclusion_proof(i).unwrap();
                assert!(proof.verify(leaf, acc.root()), "n={n} i={i}");
                assert!(!proof.verify(&sha256_hex("forged"), acc.root()));
            }
            assert!(acc.inclusion_proof(n).is_none());
        }
    }
}
