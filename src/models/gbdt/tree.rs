use serde::{Deserialize, Serialize};

use super::{super::featurizer::SparseVector, binning::BinMapper, Config};

/// A node of a regression tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Rows with `value <= threshold` go left
    Split {
        /// Feature index
        feature: u32,
        /// Split point
        threshold: f64,
        /// Index of the left child
        left: u32,
        /// Index of the right child
        right: u32,
    },

    /// A terminal node contributing `value` to the score
    Leaf {
        /// Additive output
        value: f64,
    },
}

/// A binary regression tree stored as a flat node list, root first
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// The output for one feature vector
    pub fn predict(&self, row: &SparseVector) -> f64 {
        let mut index = 0;

        loop {
            match self.nodes.get(index) {
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    index = if f64::from(row.get(*feature)) <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
                Some(Node::Leaf { value }) => return *value,
                None => return 0.0,
            }
        }
    }

    /// Number of leaves
    pub fn num_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }

    /// Check that child links point forward and stay in bounds
    pub(super) fn is_well_formed(&self) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(i, node)| match node {
                Node::Split { left, right, .. } => {
                    let (left, right) = (*left as usize, *right as usize);
                    left > i && right > i && left < self.nodes.len() && right < self.nodes.len()
                }
                Node::Leaf { .. } => true,
            })
    }
}

/// A chosen split for a leaf
#[derive(Clone, Copy, Debug)]
struct SplitInfo {
    feature: usize,
    bin: usize,
    gain: f64,
}

/// A leaf that may still be split
struct Candidate {
    node: usize,
    rows: Vec<usize>,
    split: Option<SplitInfo>,
}

#[derive(Clone, Copy, Default)]
struct Bin {
    grad: f64,
    hess: f64,
    count: usize,
}

/// A freshly grown tree plus the training rows that landed in each leaf
pub(super) struct Grown {
    pub tree: Tree,
    pub leaves: Vec<(f64, Vec<usize>)>,
    pub gains: Vec<(u32, f64)>,
}

/// Grows leaf-wise trees over histogram-binned rows
pub(super) struct TreeBuilder<'a> {
    config: &'a Config,
    bins: &'a BinMapper,
    rows: &'a [Vec<(u32, u16)>],
    histogram: Vec<Bin>,
    touched: Vec<bool>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(
        config: &'a Config,
        bins: &'a BinMapper,
        rows: &'a [Vec<(u32, u16)>],
        dimension: usize,
    ) -> Self {
        Self {
            config,
            bins,
            rows,
            histogram: vec![Bin::default(); dimension * config.max_bins],
            touched: vec![false; dimension],
        }
    }

    /// Grow one tree fitting the negative gradient
    pub fn grow(&mut self, gradients: &[f64], hessians: &[f64]) -> Grown {
        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut gains = Vec::new();

        let all_rows: Vec<usize> = (0..self.rows.len()).collect();
        let root_split = self.find_split(&all_rows, gradients, hessians);
        let mut leaves = vec![Candidate {
            node: 0,
            rows: all_rows,
            split: root_split,
        }];

        while leaves.len() < self.config.num_leaves {
            let best = leaves
                .iter()
                .enumerate()
                .filter_map(|(i, leaf)| leaf.split.map(|split| (i, split)))
                .fold(None::<(usize, SplitInfo)>, |best, (i, split)| match best {
                    Some((_, current)) if current.gain >= split.gain => best,
                    _ => Some((i, split)),
                });

            let Some((index, split)) = best else {
                break;
            };

            let leaf = leaves.remove(index);
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = leaf
                .rows
                .iter()
                .copied()
                .partition(|&row| row_bin(&self.rows[row], split.feature) <= split.bin);

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { value: 0.0 });
            nodes.push(Node::Leaf { value: 0.0 });
            nodes[leaf.node] = Node::Split {
                feature: split.feature as u32,
                threshold: self.bins.upper_bound(split.feature, split.bin),
                left: left as u32,
                right: right as u32,
            };
            gains.push((split.feature as u32, split.gain));

            let left_split = self.find_split(&left_rows, gradients, hessians);
            let right_split = self.find_split(&right_rows, gradients, hessians);

            leaves.push(Candidate {
                node: left,
                rows: left_rows,
                split: left_split,
            });
            leaves.push(Candidate {
                node: right,
                rows: right_rows,
                split: right_split,
            });
        }

        let leaves = leaves
            .into_iter()
            .map(|leaf| {
                let value = self.leaf_value(&leaf.rows, gradients, hessians);
                nodes[leaf.node] = Node::Leaf { value };

                (value, leaf.rows)
            })
            .collect();

        Grown {
            tree: Tree { nodes },
            leaves,
            gains,
        }
    }

    fn leaf_value(&self, rows: &[usize], gradients: &[f64], hessians: &[f64]) -> f64 {
        let (grad, hess) = sums(rows, gradients, hessians);

        -self.config.learning_rate * grad / (hess + self.config.l2_regularization)
    }

    fn find_split(&mut self, rows: &[usize], gradients: &[f64], hessians: &[f64]) -> Option<SplitInfo> {
        let min_data = self.config.min_data_in_leaf;
        if rows.len() < 2 * min_data {
            return None;
        }

        let max_bins = self.config.max_bins;
        let lambda = self.config.l2_regularization;
        let (total_grad, total_hess) = sums(rows, gradients, hessians);
        let total_count = rows.len();

        let mut features = Vec::new();
        for &row in rows {
            for &(feature, bin) in &self.rows[row] {
                let feature = feature as usize;
                if !self.touched[feature] {
                    self.touched[feature] = true;
                    features.push(feature);
                }

                let slot = &mut self.histogram[feature * max_bins + bin as usize];
                slot.grad += gradients[row];
                slot.hess += hessians[row];
                slot.count += 1;
            }
        }
        features.sort_unstable();

        let parent = score(total_grad, total_hess, lambda);
        let mut best: Option<SplitInfo> = None;

        for &feature in &features {
            let num_bins = self.bins.num_bins(feature);
            let offset = feature * max_bins;

            // Rows where the feature is absent were never visited; they belong in bin 0
            let (mut seen_grad, mut seen_hess, mut seen_count) = (0.0, 0.0, 0);
            for slot in &self.histogram[offset..offset + num_bins] {
                seen_grad += slot.grad;
                seen_hess += slot.hess;
                seen_count += slot.count;
            }
            let zero = &mut self.histogram[offset];
            zero.grad += total_grad - seen_grad;
            zero.hess += total_hess - seen_hess;
            zero.count += total_count - seen_count;

            let mut left = Bin::default();
            for bin in 0..num_bins - 1 {
                let slot = self.histogram[offset + bin];
                left.grad += slot.grad;
                left.hess += slot.hess;
                left.count += slot.count;

                let right = Bin {
                    grad: total_grad - left.grad,
                    hess: total_hess - left.hess,
                    count: total_count - left.count,
                };

                if left.count < min_data || right.count < min_data {
                    continue;
                }
                if left.hess < self.config.min_child_weight || right.hess < self.config.min_child_weight {
                    continue;
                }

                let gain = score(left.grad, left.hess, lambda) + score(right.grad, right.hess, lambda) - parent;
                if gain > self.config.min_split_gain && best.map_or(true, |b| gain > b.gain) {
                    best = Some(SplitInfo { feature, bin, gain });
                }
            }

            self.histogram[offset..offset + num_bins].fill(Bin::default());
            self.touched[feature] = false;
        }

        best
    }
}

fn sums(rows: &[usize], gradients: &[f64], hessians: &[f64]) -> (f64, f64) {
    rows.iter()
        .fold((0.0, 0.0), |(g, h), &row| (g + gradients[row], h + hessians[row]))
}

fn score(grad: f64, hess: f64, lambda: f64) -> f64 {
    grad * grad / (hess + lambda)
}

/// The bin of a feature in a binned row; absent features are in bin 0
fn row_bin(row: &[(u32, u16)], feature: usize) -> usize {
    row.binary_search_by_key(&(feature as u32), |(f, _)| *f)
        .map(|pos| row[pos].1 as usize)
        .unwrap_or(0)
}
