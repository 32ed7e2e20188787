//! Reference classifier oracle: information-gain decision trees.
//!
//! [`DecisionTreeOracle`] induces a [`DecisionTree`] top-down:
//!
//! 1. **Stop** when the node is pure, the depth limit is reached, or the node
//!    is too light to be split into two branches of `min_leaf_weight`
//! 2. **Choose a test** for every non-target attribute and keep the one with
//!    the highest gain:
//!    - nominal attributes split into one branch per value
//!    - numeric attributes split in two at the best midpoint threshold
//! 3. **Partition** instances; an instance whose test value is missing goes
//!    down every branch with its weight scaled by the branch's share of the
//!    known weight
//! 4. **Recurse** into each branch; empty branches become leaves with the
//!    parent's class counts
//!
//! Gain is the information gain over instances with a known value, scaled by
//! the known fraction of the node's weight, so attributes that are mostly
//! missing are not favoured.
//!
//! At prediction time a missing test value mixes the children's
//! distributions by the same branch shares. Leaves estimate probabilities
//! from their weighted class counts, with Laplace smoothing by default.
//!
//! Induction is deterministic: attributes are scanned in index order and the
//! first of equally good tests wins.

use afa_data::{AttributeKind, Dataset};
use afa_stats::entropy::split_gain;
use serde::{Deserialize, Serialize};

use crate::{Classifier, ClassifierOracle, InductionError};

const MIN_GAIN: f64 = 1e-10;

/// Tree induction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    /// Minimum weight each of at least two branches must receive for a test
    /// to be considered.
    pub min_leaf_weight: f64,
    /// Maximum depth of the tree (root is depth 0).
    pub max_depth: usize,
    /// Whether leaf distributions use Laplace (add-one) smoothing.
    pub laplace: bool,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            min_leaf_weight: 2.0,
            max_depth: 24,
            laplace: true,
        }
    }
}

/// Classifier oracle producing [`DecisionTree`] models.
#[derive(Debug, Clone, Default)]
pub struct DecisionTreeOracle {
    params: TreeParams,
}

impl DecisionTreeOracle {
    #[must_use]
    pub fn new(params: TreeParams) -> Self {
        Self { params }
    }

    #[must_use]
    pub fn params(&self) -> &TreeParams {
        &self.params
    }
}

impl ClassifierOracle for DecisionTreeOracle {
    type Model = DecisionTree;

    fn train(&self, dataset: &Dataset) -> Result<DecisionTree, InductionError> {
        let target = dataset.class_index();
        let num_classes = dataset
            .class_attribute()
            .num_values()
            .ok_or(InductionError::NonNominalTarget { attribute: target })?;

        let items = (0..dataset.num_instances())
            .filter_map(|i| {
                dataset.class_value(i).map(|class| Item {
                    row: i,
                    class,
                    weight: 1.0,
                })
            })
            .collect::<Vec<_>>();
        if items.is_empty() {
            return Err(InductionError::NoLabelledInstances);
        }

        let builder = Builder {
            dataset,
            params: &self.params,
            num_classes,
            features: dataset.feature_indices().collect(),
        };
        Ok(DecisionTree {
            root: builder.grow(items, 0),
            num_classes,
            laplace: self.params.laplace,
        })
    }
}

/// A trained decision tree.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    root: Node,
    num_classes: usize,
    laplace: bool,
}

impl DecisionTree {
    /// Depth of the deepest leaf (a single leaf has depth 0).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    #[must_use]
    pub fn num_leaves(&self) -> usize {
        self.root.num_leaves()
    }
}

impl Classifier for DecisionTree {
    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn distribution(&self, row: &[Option<f64>]) -> Vec<f64> {
        self.root.distribution(row, self.laplace)
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        counts: Vec<f64>,
    },
    Split {
        attribute: usize,
        test: SplitTest,
        children: Vec<Node>,
        shares: Vec<f64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SplitTest {
    Nominal,
    Threshold(f64),
}

impl SplitTest {
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn branch(self, value: f64, arity: usize) -> Option<usize> {
        match self {
            SplitTest::Nominal => {
                let b = value as usize;
                (value >= 0.0 && b < arity).then_some(b)
            }
            SplitTest::Threshold(t) => Some(usize::from(value > t)),
        }
    }
}

impl Node {
    #[expect(clippy::cast_precision_loss)]
    fn distribution(&self, row: &[Option<f64>], laplace: bool) -> Vec<f64> {
        match self {
            Node::Leaf { counts } => {
                let total = counts.iter().sum::<f64>();
                let k = counts.len() as f64;
                if laplace {
                    counts.iter().map(|c| (c + 1.0) / (total + k)).collect()
                } else if total > 0.0 {
                    counts.iter().map(|c| c / total).collect()
                } else {
                    vec![1.0 / k; counts.len()]
                }
            }
            Node::Split {
                attribute,
                test,
                children,
                shares,
            } => {
                let known = row
                    .get(*attribute)
                    .copied()
                    .flatten()
                    .and_then(|v| test.branch(v, children.len()));
                if let Some(b) = known {
                    return children[b].distribution(row, laplace);
                }
                let mut mixed = Vec::new();
                for (child, share) in children.iter().zip(shares) {
                    let probs = child.distribution(row, laplace);
                    mixed.resize(probs.len(), 0.0);
                    for (m, p) in mixed.iter_mut().zip(probs) {
                        *m += share * p;
                    }
                }
                mixed
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Split { children, .. } => {
                1 + children.iter().map(Node::depth).max().unwrap_or(0)
            }
        }
    }

    fn num_leaves(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Split { children, .. } => children.iter().map(Node::num_leaves).sum(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Item {
    row: usize,
    class: usize,
    weight: f64,
}

#[derive(Debug)]
struct Candidate {
    attribute: usize,
    test: SplitTest,
    gain: f64,
}

struct Builder<'a> {
    dataset: &'a Dataset,
    params: &'a TreeParams,
    num_classes: usize,
    features: Vec<usize>,
}

impl Builder<'_> {
    fn class_counts(&self, items: &[Item]) -> Vec<f64> {
        let mut counts = vec![0.0; self.num_classes];
        for item in items {
            counts[item.class] += item.weight;
        }
        counts
    }

    fn value(&self, item: &Item, attribute: usize) -> Option<f64> {
        self.dataset.row(item.row)[attribute]
    }

    fn grow(&self, items: Vec<Item>, depth: usize) -> Node {
        let counts = self.class_counts(&items);
        let total = counts.iter().sum::<f64>();
        let classes_present = counts.iter().filter(|c| **c > 0.0).count();
        if classes_present <= 1
            || depth >= self.params.max_depth
            || total < 2.0 * self.params.min_leaf_weight
        {
            return Node::Leaf { counts };
        }

        let best = self
            .features
            .iter()
            .filter_map(|j| self.best_test(&items, total, *j))
            .fold(None, |best: Option<Candidate>, c| match best {
                Some(b) if c.gain <= b.gain => Some(b),
                _ => Some(c),
            });
        let Some(best) = best.filter(|c| c.gain > MIN_GAIN) else {
            return Node::Leaf { counts };
        };

        let arity = match best.test {
            SplitTest::Nominal => self
                .dataset
                .attribute(best.attribute)
                .num_values()
                .unwrap_or(0),
            SplitTest::Threshold(_) => 2,
        };
        let mut known_weights = vec![0.0; arity];
        for item in &items {
            if let Some(b) = self
                .value(item, best.attribute)
                .and_then(|v| best.test.branch(v, arity))
            {
                known_weights[b] += item.weight;
            }
        }
        let known_total = known_weights.iter().sum::<f64>();
        let shares = known_weights
            .iter()
            .map(|w| w / known_total)
            .collect::<Vec<_>>();

        let mut partitions = vec![Vec::new(); arity];
        for item in items {
            match self
                .value(&item, best.attribute)
                .and_then(|v| best.test.branch(v, arity))
            {
                Some(b) => partitions[b].push(item),
                None => {
                    for (b, share) in shares.iter().enumerate() {
                        if *share > 0.0 {
                            partitions[b].push(Item {
                                weight: item.weight * share,
                                ..item
                            });
                        }
                    }
                }
            }
        }

        let children = partitions
            .into_iter()
            .zip(&known_weights)
            .map(|(part, known)| {
                if *known > 0.0 {
                    self.grow(part, depth + 1)
                } else {
                    Node::Leaf {
                        counts: counts.clone(),
                    }
                }
            })
            .collect();

        Node::Split {
            attribute: best.attribute,
            test: best.test,
            children,
            shares,
        }
    }

    fn best_test(&self, items: &[Item], total: f64, attribute: usize) -> Option<Candidate> {
        let known = items
            .iter()
            .filter_map(|item| self.value(item, attribute).map(|v| (v, *item)))
            .collect::<Vec<_>>();
        let known_total = known.iter().map(|(_, item)| item.weight).sum::<f64>();
        if known_total <= 0.0 {
            return None;
        }
        let known_fraction = known_total / total;
        let parent = self.class_counts(
            &known.iter().map(|(_, item)| *item).collect::<Vec<_>>(),
        );

        match self.dataset.attribute(attribute).kind() {
            AttributeKind::Nominal { values } => {
                let mut branches = vec![vec![0.0; self.num_classes]; values.len()];
                for (v, item) in &known {
                    if let Some(b) = SplitTest::Nominal.branch(*v, values.len()) {
                        branches[b][item.class] += item.weight;
                    }
                }
                let heavy = branches
                    .iter()
                    .filter(|b| b.iter().sum::<f64>() >= self.params.min_leaf_weight)
                    .count();
                if heavy < 2 {
                    return None;
                }
                Some(Candidate {
                    attribute,
                    test: SplitTest::Nominal,
                    gain: known_fraction * split_gain(&parent, &branches),
                })
            }
            AttributeKind::Numeric => {
                let mut sorted = known;
                sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
                let mut left = vec![0.0; self.num_classes];
                let mut left_weight = 0.0;
                let mut best: Option<(f64, f64)> = None;
                for pair in sorted.windows(2) {
                    let (v, item) = pair[0];
                    let next = pair[1].0;
                    left[item.class] += item.weight;
                    left_weight += item.weight;
                    if v >= next
                        || left_weight < self.params.min_leaf_weight
                        || known_total - left_weight < self.params.min_leaf_weight
                    {
                        continue;
                    }
                    let right = parent
                        .iter()
                        .zip(&left)
                        .map(|(p, l)| p - l)
                        .collect::<Vec<_>>();
                    let gain = split_gain(&parent, &[left.as_slice(), right.as_slice()]);
                    if best.is_none_or(|(g, _)| gain > g) {
                        best = Some((gain, v + (next - v) / 2.0));
                    }
                }
                best.map(|(gain, threshold)| Candidate {
                    attribute,
                    test: SplitTest::Threshold(threshold),
                    gain: known_fraction * gain,
                })
            }
        }
    }
}
