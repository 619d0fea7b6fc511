//! Multi-key group-by producing an explicit tree.
//!
//! Nodes live in an arena (`Vec<GroupNode>`) and refer to each other by index; node `0`
//! is the root. Children keep first-seen key order. Leaves reference rows by their index
//! in the input slice, so the input is never copied or reordered.

use ahash::AHashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNode {
    pub key: String,
    pub depth: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Row indices; only populated on leaves (depth == number of keys).
    pub rows: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTree {
    nodes: Vec<GroupNode>,
    levels: usize,
}

impl GroupTree {
    pub const ROOT: usize = 0;

    /// Group `data` by successive keys. Rows for which any key yields `None` are left out.
    pub fn build<T, F>(data: &[T], keys: &[F]) -> Self
    where
        F: Fn(&T) -> Option<String>,
    {
        let mut nodes = vec![GroupNode {
            key: String::new(),
            depth: 0,
            parent: None,
            children: Vec::new(),
            rows: Vec::new(),
        }];
        let mut lookup: AHashMap<(usize, String), usize> = AHashMap::new();

        'rows: for (row, item) in data.iter().enumerate() {
            let mut path = Vec::with_capacity(keys.len());
            for key in keys {
                match key(item) {
                    Some(k) => path.push(k),
                    None => continue 'rows,
                }
            }
            let mut cur = Self::ROOT;
            for (depth, k) in path.into_iter().enumerate() {
                cur = match lookup.get(&(cur, k.clone())) {
                    Some(&i) => i,
                    None => {
                        let i = nodes.len();
                        nodes.push(GroupNode {
                            key: k.clone(),
                            depth: depth + 1,
                            parent: Some(cur),
                            children: Vec::new(),
                            rows: Vec::new(),
                        });
                        nodes[cur].children.push(i);
                        lookup.insert((cur, k), i);
                        i
                    }
                };
            }
            nodes[cur].rows.push(row);
        }

        Self {
            nodes,
            levels: keys.len(),
        }
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    pub fn node(&self, index: usize) -> &GroupNode {
        &self.nodes[index]
    }

    pub fn root(&self) -> &GroupNode {
        &self.nodes[Self::ROOT]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root().children.is_empty()
    }

    /// `(index, node)` pairs of the children of `index`, in first-seen order.
    pub fn children(&self, index: usize) -> impl Iterator<Item = (usize, &GroupNode)> {
        self.nodes[index]
            .children
            .iter()
            .map(move |&i| (i, &self.nodes[i]))
    }

    /// Leaves in depth-first, first-seen order.
    pub fn leaves(&self) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![Self::ROOT];
        while let Some(i) = stack.pop() {
            let node = &self.nodes[i];
            if node.depth == self.levels {
                if i != Self::ROOT || self.levels == 0 {
                    out.push(i);
                }
                continue;
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Keys from the first level down to `index`.
    pub fn path(&self, index: usize) -> Vec<&str> {
        let mut keys = Vec::new();
        let mut cur = Some(index);
        while let Some(i) = cur {
            let node = &self.nodes[i];
            if node.parent.is_some() {
                keys.push(node.key.as_str());
            }
            cur = node.parent;
        }
        keys.reverse();
        keys
    }
}

/// Single-level group-by preserving first-seen key order.
pub fn group_by<'a, T, F>(items: &'a [T], key: F) -> Vec<(String, Vec<&'a T>)>
where
    F: Fn(&T) -> String,
{
    let mut index: AHashMap<String, usize> = AHashMap::new();
    let mut out: Vec<(String, Vec<&'a T>)> = Vec::new();
    for item in items {
        let k = key(item);
        match index.get(&k) {
            Some(&i) => out[i].1.push(item),
            None => {
                index.insert(k.clone(), out.len());
                out.push((k, vec![item]));
            }
        }
    }
    out
}
