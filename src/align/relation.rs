//! Word alignment relation between a translated unit's target and source words.
//!
//! The relation is a boolean matrix with one row per target word and one
//! column per source word, supplied wholesale by an alignment backend. It is
//! read-only once built.

use std::collections::{BTreeSet, HashMap};
use std::ops::{Range, RangeInclusive};

use serde::{Deserialize, Serialize};

use crate::error::{AlignError, AlignResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<bool>>", into = "Vec<Vec<bool>>")]
pub struct AlignmentRelation {
    target_len: usize,
    source_len: usize,
    cells: Vec<bool>,
}

impl AlignmentRelation {
    /// A relation without any aligned pair
    pub fn new(target_len: usize, source_len: usize) -> Self {
        AlignmentRelation {
            target_len,
            source_len,
            cells: vec![false; target_len * source_len],
        }
    }

    /// Target word `i` aligned to source word `i`
    pub fn identity(len: usize) -> Self {
        let mut relation = Self::new(len, len);
        for i in 0..len {
            relation.cells[i * len + i] = true;
        }
        relation
    }

    /// Build from rows indexed `[target][source]`; rows must have equal length
    pub fn from_matrix(rows: Vec<Vec<bool>>) -> AlignResult<Self> {
        let target_len = rows.len();
        let source_len = rows.first().map_or(0, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != source_len) {
            return Err(AlignError::malformed(format!(
                "alignment row {} has {} columns, expected {}",
                i,
                row.len(),
                source_len
            )));
        }
        Ok(AlignmentRelation {
            target_len,
            source_len,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Threshold a weight matrix (attention, similarity); a pair is aligned
    /// when its weight is at least `threshold`
    pub fn from_weights(rows: &[Vec<f32>], threshold: f32) -> AlignResult<Self> {
        Self::from_matrix(
            rows.iter()
                .map(|row| row.iter().map(|&weight| weight >= threshold).collect())
                .collect(),
        )
    }

    /// Build from `(target, source)` word index pairs
    pub fn from_pairs(
        target_len: usize,
        source_len: usize,
        pairs: impl IntoIterator<Item = (usize, usize)>,
    ) -> AlignResult<Self> {
        let mut relation = Self::new(target_len, source_len);
        for (target, source) in pairs {
            relation.align(target, source)?;
        }
        Ok(relation)
    }

    /// Lift `(target token, source token)` alignments to words.
    ///
    /// Pairs whose token has no word on either side are skipped.
    pub fn from_token_pairs(
        target_len: usize,
        source_len: usize,
        pairs: impl IntoIterator<Item = (usize, usize)>,
        target_token_to_word: &HashMap<usize, usize>,
        source_token_to_word: &HashMap<usize, usize>,
    ) -> AlignResult<Self> {
        let mut relation = Self::new(target_len, source_len);
        for (target_token, source_token) in pairs {
            let (Some(&target), Some(&source)) = (
                target_token_to_word.get(&target_token),
                source_token_to_word.get(&source_token),
            ) else {
                continue;
            };
            relation.align(target, source)?;
        }
        Ok(relation)
    }

    /// Mark target word `target` as aligned to source word `source`
    pub fn align(&mut self, target: usize, source: usize) -> AlignResult<()> {
        if target >= self.target_len || source >= self.source_len {
            return Err(AlignError::malformed(format!(
                "alignment pair ({}, {}) outside {}x{} relation",
                target, source, self.target_len, self.source_len
            )));
        }
        self.cells[target * self.source_len + source] = true;
        Ok(())
    }

    pub fn target_len(&self) -> usize {
        self.target_len
    }

    pub fn source_len(&self) -> usize {
        self.source_len
    }

    pub fn is_aligned(&self, target: usize, source: usize) -> bool {
        target < self.target_len
            && source < self.source_len
            && self.cells[target * self.source_len + source]
    }

    /// Union of the target words aligned to any source word in `sources`
    pub fn aligned_targets(&self, sources: Range<usize>) -> BTreeSet<usize> {
        let sources = sources.start.min(self.source_len)..sources.end.min(self.source_len);
        let mut targets = BTreeSet::new();
        for source in sources {
            for target in 0..self.target_len {
                if self.cells[target * self.source_len + source] {
                    targets.insert(target);
                }
            }
        }
        targets
    }

    /// Number of aligned pairs
    pub fn pair_count(&self) -> usize {
        self.cells.iter().filter(|&&aligned| aligned).count()
    }

    /// Fail unless the relation spans exactly these word counts.
    ///
    /// A relation without target rows carries no source width and is accepted
    /// for any source length.
    pub fn check_dims(&self, target_words: usize, source_words: usize) -> AlignResult<()> {
        if self.target_len != target_words {
            return Err(AlignError::malformed(format!(
                "alignment has {} target rows but there are {} target words",
                self.target_len, target_words
            )));
        }
        self.check_source_dim(source_words)
    }

    pub fn check_source_dim(&self, source_words: usize) -> AlignResult<()> {
        if self.target_len > 0 && self.source_len != source_words {
            return Err(AlignError::malformed(format!(
                "alignment has {} source columns but there are {} source words",
                self.source_len, source_words
            )));
        }
        Ok(())
    }

    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        if self.source_len == 0 {
            return vec![Vec::new(); self.target_len];
        }
        self.cells
            .chunks(self.source_len)
            .map(<[bool]>::to_vec)
            .collect()
    }
}

impl TryFrom<Vec<Vec<bool>>> for AlignmentRelation {
    type Error = AlignError;

    fn try_from(rows: Vec<Vec<bool>>) -> AlignResult<Self> {
        Self::from_matrix(rows)
    }
}

impl From<AlignmentRelation> for Vec<Vec<bool>> {
    fn from(relation: AlignmentRelation) -> Self {
        relation.to_rows()
    }
}

/// Split a sorted index set into maximal runs of consecutive integers
pub fn contiguous_runs(indices: &BTreeSet<usize>) -> Vec<RangeInclusive<usize>> {
    let mut runs = Vec::new();
    let mut iter = indices.iter().copied();
    let Some(first) = iter.next() else {
        return runs;
    };

    let (mut lo, mut hi) = (first, first);
    for index in iter {
        if index == hi + 1 {
            hi = index;
        } else {
            runs.push(lo..=hi);
            lo = index;
            hi = index;
        }
    }
    runs.push(lo..=hi);
    runs
}
