//! Working set of discovered-but-unexpanded pages, ranked by similarity to the target.

use crate::error::{Result, WikipathError};

/// A page scheduled for expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub url: String,
    /// Every URL from the start page up to and including `url`
    pub path: Vec<String>,
    pub embedding: Vec<f32>,
}

impl Node {
    /// The start node: its path is just itself.
    pub fn root(url: impl Into<String>, embedding: Vec<f32>) -> Self {
        let url = url.into();
        Self {
            path: vec![url.clone()],
            url,
            embedding,
        }
    }

    /// A node reached by following a link out of `self`.
    pub fn child(&self, url: impl Into<String>, embedding: Vec<f32>) -> Self {
        let url = url.into();
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend(self.path.iter().cloned());
        path.push(url.clone());
        Self {
            url,
            path,
            embedding,
        }
    }

    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }
}

/// Frontier ranked on every pop against a fixed target embedding.
///
/// Nodes keep insertion order internally. `pop_best` picks the node with the
/// highest similarity, and on equal scores the one pushed first, which is the
/// same element a stable descending sort would put at the head.
#[derive(Debug, Default)]
pub struct Frontier {
    nodes: Vec<Node>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove and return the node most similar to `target`.
    ///
    /// Every node is re-scored on each call. Scores are compared with
    /// `f32::total_cmp`, so a misbehaving similarity function still yields a
    /// deterministic order. `-0.0` is folded into `0.0` first so the two tie.
    pub fn pop_best<F>(&mut self, target: &[f32], similarity: F) -> Result<Node>
    where
        F: Fn(&[f32], &[f32]) -> f32,
    {
        let mut best: Option<(usize, f32)> = None;
        for (idx, node) in self.nodes.iter().enumerate() {
            let score = similarity(&node.embedding, target) + 0.0;
            match best {
                Some((_, best_score)) if score.total_cmp(&best_score).is_le() => {}
                _ => best = Some((idx, score)),
            }
        }

        let (idx, _) = best.ok_or(WikipathError::EmptyFrontier)?;
        Ok(self.nodes.remove(idx))
    }
}
