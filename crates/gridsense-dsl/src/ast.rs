//! Arena AST for the pattern DSL.
//!
//! Nodes live in one `Vec` and refer to each other by [`NodeId`]. Heads,
//! bridges and assigns are interned into a [`SymbolTable`] owned by the
//! arena, so the tree carries no borrowed source text.
//!
//! A node's children are always exactly one tier below it:
//! Alpha holds Betas, Beta holds Gammas, Gamma holds Deltas, and Deltas are
//! leaves carrying literal values.

use std::collections::HashMap;
use std::fmt;

use crate::span::Span;

/// Bracket tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// `<` `>` top-level command block
    Alpha,
    /// `[` `]` section
    Beta,
    /// `{` `}` parameter entry
    Gamma,
    /// `(` `)` value list
    Delta,
}

impl Tier {
    /// Opening bracket character.
    pub const fn open_char(self) -> char {
        match self {
            Tier::Alpha => '<',
            Tier::Beta => '[',
            Tier::Gamma => '{',
            Tier::Delta => '(',
        }
    }

    /// Closing bracket character.
    pub const fn close_char(self) -> char {
        match self {
            Tier::Alpha => '>',
            Tier::Beta => ']',
            Tier::Gamma => '}',
            Tier::Delta => ')',
        }
    }

    /// Tier nested directly inside this one.
    pub const fn child(self) -> Option<Tier> {
        match self {
            Tier::Alpha => Some(Tier::Beta),
            Tier::Beta => Some(Tier::Gamma),
            Tier::Gamma => Some(Tier::Delta),
            Tier::Delta => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Alpha => f.write_str("alpha"),
            Tier::Beta => f.write_str("beta"),
            Tier::Gamma => f.write_str("gamma"),
            Tier::Delta => f.write_str("delta"),
        }
    }
}

/// Index of a node in its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Position in the arena.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of an interned name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

/// Interned names.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    names: Vec<String>,
    ids: HashMap<String, SymbolId>,
}

impl SymbolTable {
    /// Intern a name, returning the existing id when already present.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = SymbolId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    /// Name of an interned symbol.
    pub fn resolve(&self, id: SymbolId) -> &str {
        self.names.get(id.0 as usize).map(String::as_str).unwrap_or("")
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no name has been interned.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Value inside a Delta.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `"text"`
    Str(String),
    /// `name`
    Ident(String),
    /// `0.75`
    Number(f64),
    /// `key:(value)`
    Pair {
        /// Pair key
        key: String,
        /// Parenthesized value
        value: Box<Literal>,
    },
}

impl Literal {
    /// Text of a string or identifier.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Literal::Str(s) | Literal::Ident(s) => Some(s),
            _ => None,
        }
    }

    /// Value of a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Literal::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Key and value of a pair.
    pub fn as_pair(&self) -> Option<(&str, &Literal)> {
        match self {
            Literal::Pair { key, value } => Some((key, value)),
            _ => None,
        }
    }

    /// Whether this is a string, identifier or number.
    pub fn is_plain(&self) -> bool {
        !matches!(self, Literal::Pair { .. })
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => write!(f, "{s:?}"),
            Literal::Ident(s) => f.write_str(s),
            Literal::Number(n) => write!(f, "{n}"),
            Literal::Pair { key, value } => write!(f, "{key}:({value})"),
        }
    }
}

/// One bracketed construct.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Bracket tier
    pub tier: Tier,
    /// Head word; absent on Deltas
    pub head: Option<SymbolId>,
    /// Word after `:`
    pub bridge: Option<SymbolId>,
    /// Word after `=` (Beta only)
    pub assign: Option<SymbolId>,
    /// Children, one tier below
    pub children: Vec<NodeId>,
    /// Enclosing node; `None` for Alpha roots
    pub parent: Option<NodeId>,
    /// Literal values (Delta only)
    pub values: Vec<Literal>,
    /// Source location of the whole construct
    pub span: Span,
}

impl Node {
    /// Creates a childless node.
    pub fn new(tier: Tier, span: Span) -> Self {
        Self {
            tier,
            head: None,
            bridge: None,
            assign: None,
            children: Vec::new(),
            parent: None,
            values: Vec::new(),
            span,
        }
    }
}

/// Parsed compilation unit.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    symbols: SymbolTable,
}

impl Ast {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; a node with a parent is appended to the parent's children.
    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let parent = node.parent;
        self.nodes.push(node);
        match parent {
            Some(parent) => self.nodes[parent.index()].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Mutable node by id.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Top-level Alpha nodes in source order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Children of a node in source order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &Node)> {
        self.node(id)
            .children
            .iter()
            .map(move |child| (*child, self.node(*child)))
    }

    /// Enclosing node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Intern a name.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        self.symbols.intern(name)
    }

    /// Name of a symbol.
    pub fn symbol(&self, id: SymbolId) -> &str {
        self.symbols.resolve(id)
    }

    /// Head word of a node.
    pub fn head(&self, id: NodeId) -> Option<&str> {
        self.node(id).head.map(|s| self.symbol(s))
    }

    /// Bridge word of a node.
    pub fn bridge(&self, id: NodeId) -> Option<&str> {
        self.node(id).bridge.map(|s| self.symbol(s))
    }

    /// Assign word of a node.
    pub fn assign(&self, id: NodeId) -> Option<&str> {
        self.node(id).assign.map(|s| self.symbol(s))
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
