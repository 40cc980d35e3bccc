//! Micro → macro mappings.
//!
//! A [`Mapping`] assigns every micro node to exactly one supernode. Supernode
//! identifiers are [`MacroId`]s: a node that kept its own identity stays
//! `MacroId::Node(key)`, a freshly created supernode is `MacroId::Group(k)`.
//! The two variants never compare equal, so contracting a network several
//! times in a row cannot produce id collisions.

use crate::error::{Error, Result};
use crate::network::{Network, NodeKey};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Identifier of a macro (super)node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MacroId<N> {
    /// A micro node that keeps its own identifier.
    Node(N),
    /// A freshly numbered supernode.
    Group(usize),
}

impl<N> MacroId<N> {
    /// True for freshly numbered supernodes.
    pub fn is_group(&self) -> bool {
        matches!(self, MacroId::Group(_))
    }
}

impl<N: fmt::Display> fmt::Display for MacroId<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroId::Node(n) => write!(f, "{n}"),
            MacroId::Group(k) => write!(f, "#{k}"),
        }
    }
}

/// Total function from micro node keys to macro ids.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mapping<N: Ord> {
    assignment: BTreeMap<N, MacroId<N>>,
}

impl<N: NodeKey> Mapping<N> {
    /// Build a mapping from `(micro, macro)` pairs. Later pairs win on duplicate keys.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, MacroId<N>)>,
    {
        Self {
            assignment: pairs.into_iter().collect(),
        }
    }

    /// Every node is its own supernode.
    pub fn identity(network: &Network<N>) -> Self {
        Self::from_pairs(network.keys().map(|k| (k.clone(), MacroId::Node(k.clone()))))
    }

    /// Mapping from a label vector indexed by node position (`labels[i]` → `Group(labels[i])`).
    pub fn from_labels(network: &Network<N>, labels: &[usize]) -> Result<Self> {
        if labels.len() != network.node_count() {
            return Err(Error::DimensionMismatch {
                expected: network.node_count(),
                found: labels.len(),
            });
        }
        Ok(Self::from_pairs(
            network
                .keys()
                .zip(labels)
                .map(|(k, &l)| (k.clone(), MacroId::Group(l))),
        ))
    }

    /// Macro id of a micro node.
    pub fn get(&self, micro: &N) -> Option<&MacroId<N>> {
        self.assignment.get(micro)
    }

    /// Number of mapped micro nodes.
    pub fn len(&self) -> usize {
        self.assignment.len()
    }

    /// True if nothing is mapped.
    pub fn is_empty(&self) -> bool {
        self.assignment.is_empty()
    }

    /// `(micro, macro)` pairs in micro-key order.
    pub fn iter(&self) -> impl Iterator<Item = (&N, &MacroId<N>)> + '_ {
        self.assignment.iter()
    }

    /// Inverse mapping: macro id → micro members (in micro-key order).
    pub fn groups(&self) -> BTreeMap<MacroId<N>, Vec<N>> {
        let mut groups: BTreeMap<MacroId<N>, Vec<N>> = BTreeMap::new();
        for (micro, macro_id) in &self.assignment {
            groups.entry(macro_id.clone()).or_default().push(micro.clone());
        }
        groups
    }

    /// Number of distinct macro ids.
    pub fn group_count(&self) -> usize {
        self.groups().len()
    }

    /// Check that the mapping covers exactly the nodes of `network`.
    pub fn validate(&self, network: &Network<N>) -> Result<()> {
        if let Some(missing) = network.keys().find(|k| !self.assignment.contains_key(*k)) {
            return Err(Error::UnmappedNode {
                node: format!("{missing:?}"),
            });
        }
        if let Some(extra) = self.assignment.keys().find(|k| !network.contains(k)) {
            return Err(Error::UnknownNode {
                node: format!("{extra:?}"),
            });
        }
        Ok(())
    }

    /// Partition vector indexed by node position.
    ///
    /// Labels are contiguous `0..k`, numbered in first-seen order along node positions.
    pub fn labels(&self, network: &Network<N>) -> Result<Vec<usize>> {
        self.validate(network)?;
        let mut seen: HashMap<&MacroId<N>, usize> = HashMap::new();
        let mut labels = Vec::with_capacity(network.node_count());
        for key in network.keys() {
            let macro_id = &self.assignment[key];
            let next = seen.len();
            labels.push(*seen.entry(macro_id).or_insert(next));
        }
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> Network<u32> {
        Network::from_edges([(0, 1), (1, 2), (2, 3)])
    }

    #[test]
    fn test_groups_invert_mapping() {
        let mapping = Mapping::from_pairs([
            (0, MacroId::Group(7)),
            (1, MacroId::Group(7)),
            (2, MacroId::Node(2)),
            (3, MacroId::Group(7)),
        ]);
        let groups = mapping.groups();
        assert_eq!(groups[&MacroId::Group(7)], vec![0, 1, 3]);
        assert_eq!(groups[&MacroId::Node(2)], vec![2]);
        assert_eq!(mapping.group_count(), 2);
    }

    #[test]
    fn test_validate_coverage() {
        let network = path();
        let partial = Mapping::from_pairs([(0, MacroId::Group(0)), (1, MacroId::Group(0))]);
        assert!(matches!(
            partial.validate(&network),
            Err(Error::UnmappedNode { .. })
        ));

        let mut pairs: Vec<_> = network.keys().map(|&k| (k, MacroId::Node(k))).collect();
        pairs.push((99, MacroId::Group(0)));
        assert!(matches!(
            Mapping::from_pairs(pairs).validate(&network),
            Err(Error::UnknownNode { .. })
        ));

        assert!(Mapping::identity(&network).validate(&network).is_ok());
    }

    #[test]
    fn test_labels_first_seen_order() {
        let network = path();
        let mapping = Mapping::from_labels(&network, &[5, 5, 2, 9]).unwrap();
        assert_eq!(mapping.labels(&network).unwrap(), vec![0, 0, 1, 2]);
        assert!(Mapping::from_labels(&network, &[0, 1]).is_err());
    }

    #[test]
    fn test_node_and_group_ids_are_disjoint() {
        assert_ne!(MacroId::Node(3usize), MacroId::Group(3));
        assert_eq!(format!("{}", MacroId::<u32>::Group(3)), "#3");
        assert_eq!(format!("{}", MacroId::Node(3u32)), "3");
    }
}
