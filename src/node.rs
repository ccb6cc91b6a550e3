//! Node tree and dialect vocabulary
//!
//! A `Node` is one editable block: a type tag from a closed per-dialect
//! vocabulary, a map of literal fields, single-child value slots, and
//! ordered statement slots. Trees only — every child is owned exclusively by
//! its parent slot, and sibling order is recorded solely by the statement
//! slot vectors (`<next>` chaining is reconstructed at serialization time).
//!
//! The statement and expression vocabulary (`if`, `let`, `expression`, ...)
//! is owned by the general dialect; the extension dialects embed those nodes
//! inside their bodies while keeping their own declaration vocabularies
//! exclusive, so every individual node remains dialect-pure.

use serde::Serialize;

/// The supported source-text dialects, in specificity-descending priority
/// order. `General` is the fallback when no fingerprint matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Sim,
    Ecs,
    Shader,
    General,
}

impl Dialect {
    /// All dialects in merge priority order (most specific first).
    pub const PRIORITY: [Dialect; 4] =
        [Dialect::Sim, Dialect::Ecs, Dialect::Shader, Dialect::General];

    pub fn tag(self) -> &'static str {
        match self {
            Dialect::Sim => "sim",
            Dialect::Ecs => "ecs",
            Dialect::Shader => "shader",
            Dialect::General => "general",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Dialect> {
        match tag {
            "sim" => Some(Dialect::Sim),
            "ecs" => Some(Dialect::Ecs),
            "shader" => Some(Dialect::Shader),
            "general" => Some(Dialect::General),
            _ => None,
        }
    }

    /// Rank within [`Dialect::PRIORITY`]; lower wins during merging.
    pub fn priority(self) -> usize {
        Dialect::PRIORITY
            .iter()
            .position(|d| *d == self)
            .unwrap_or(Dialect::PRIORITY.len())
    }
}

/// Broad structural category of a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    Declaration,
    Statement,
    Expression,
    Opaque,
}

/// Closed vocabulary of node types across all dialects.
///
/// The wire tags produced by [`NodeType::tag`] are a hard contract surface:
/// the external code generator consumes the same vocabulary to emit dialect
/// text, and the interchange reader maps tags back through
/// [`NodeType::from_tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    // General declarations
    Use,
    Function,
    Struct,
    Const,
    Impl,
    // General statements
    If,
    While,
    For,
    Loop,
    Let,
    Return,
    ImplicitReturn,
    ExpressionStatement,
    // General expressions and captures
    Expression,
    ParameterList,
    ReturnType,
    FieldList,
    // Fallback for unrecognized content
    Opaque,
    // Shader dialect
    ShaderEntry,
    ShaderFunction,
    ShaderBinding,
    ShaderStruct,
    // Entity-component extension
    EcsSystem,
    EcsComponent,
    EcsResource,
    // Domain-simulation extension
    SimGenome,
    SimRule,
}

impl NodeType {
    pub fn tag(self) -> &'static str {
        match self {
            NodeType::Use => "use",
            NodeType::Function => "function",
            NodeType::Struct => "struct",
            NodeType::Const => "const",
            NodeType::Impl => "impl",
            NodeType::If => "if",
            NodeType::While => "while",
            NodeType::For => "for",
            NodeType::Loop => "loop",
            NodeType::Let => "let",
            NodeType::Return => "return",
            NodeType::ImplicitReturn => "implicit_return",
            NodeType::ExpressionStatement => "expression_statement",
            NodeType::Expression => "expression",
            NodeType::ParameterList => "parameter_list",
            NodeType::ReturnType => "return_type",
            NodeType::FieldList => "field_list",
            NodeType::Opaque => "opaque",
            NodeType::ShaderEntry => "shader_entry",
            NodeType::ShaderFunction => "shader_function",
            NodeType::ShaderBinding => "shader_binding",
            NodeType::ShaderStruct => "shader_struct",
            NodeType::EcsSystem => "ecs_system",
            NodeType::EcsComponent => "ecs_component",
            NodeType::EcsResource => "ecs_resource",
            NodeType::SimGenome => "sim_genome",
            NodeType::SimRule => "sim_rule",
        }
    }

    pub fn from_tag(tag: &str) -> Option<NodeType> {
        let ty = match tag {
            "use" => NodeType::Use,
            "function" => NodeType::Function,
            "struct" => NodeType::Struct,
            "const" => NodeType::Const,
            "impl" => NodeType::Impl,
            "if" => NodeType::If,
            "while" => NodeType::While,
            "for" => NodeType::For,
            "loop" => NodeType::Loop,
            "let" => NodeType::Let,
            "return" => NodeType::Return,
            "implicit_return" => NodeType::ImplicitReturn,
            "expression_statement" => NodeType::ExpressionStatement,
            "expression" => NodeType::Expression,
            "parameter_list" => NodeType::ParameterList,
            "return_type" => NodeType::ReturnType,
            "field_list" => NodeType::FieldList,
            "opaque" => NodeType::Opaque,
            "shader_entry" => NodeType::ShaderEntry,
            "shader_function" => NodeType::ShaderFunction,
            "shader_binding" => NodeType::ShaderBinding,
            "shader_struct" => NodeType::ShaderStruct,
            "ecs_system" => NodeType::EcsSystem,
            "ecs_component" => NodeType::EcsComponent,
            "ecs_resource" => NodeType::EcsResource,
            "sim_genome" => NodeType::SimGenome,
            "sim_rule" => NodeType::SimRule,
            _ => return None,
        };
        Some(ty)
    }

    /// The dialect that owns this node type. Statement and expression types
    /// belong to the general dialect even when embedded in extension bodies.
    pub fn dialect(self) -> Dialect {
        match self {
            NodeType::ShaderEntry
            | NodeType::ShaderFunction
            | NodeType::ShaderBinding
            | NodeType::ShaderStruct => Dialect::Shader,
            NodeType::EcsSystem | NodeType::EcsComponent | NodeType::EcsResource => Dialect::Ecs,
            NodeType::SimGenome | NodeType::SimRule => Dialect::Sim,
            _ => Dialect::General,
        }
    }

    pub fn category(self) -> NodeCategory {
        match self {
            NodeType::Use
            | NodeType::Function
            | NodeType::Struct
            | NodeType::Const
            | NodeType::Impl
            | NodeType::ShaderEntry
            | NodeType::ShaderFunction
            | NodeType::ShaderBinding
            | NodeType::ShaderStruct
            | NodeType::EcsSystem
            | NodeType::EcsComponent
            | NodeType::EcsResource
            | NodeType::SimGenome
            | NodeType::SimRule => NodeCategory::Declaration,
            NodeType::If
            | NodeType::While
            | NodeType::For
            | NodeType::Loop
            | NodeType::Let
            | NodeType::Return
            | NodeType::ImplicitReturn
            | NodeType::ExpressionStatement => NodeCategory::Statement,
            NodeType::Expression
            | NodeType::ParameterList
            | NodeType::ReturnType
            | NodeType::FieldList => NodeCategory::Expression,
            NodeType::Opaque => NodeCategory::Opaque,
        }
    }

    /// Class used by the mixed-mode merger to fold cross-dialect equivalents
    /// of the same construct. `None` means the node never deduplicates.
    pub fn merge_class(self) -> Option<&'static str> {
        match self {
            NodeType::Function
            | NodeType::ShaderEntry
            | NodeType::ShaderFunction
            | NodeType::EcsSystem
            | NodeType::SimRule => Some("callable"),
            NodeType::Struct
            | NodeType::ShaderStruct
            | NodeType::EcsComponent
            | NodeType::EcsResource => Some("record"),
            NodeType::Use => Some("import"),
            NodeType::Const => Some("const"),
            NodeType::Impl => Some("impl"),
            NodeType::ShaderBinding => Some("binding"),
            NodeType::SimGenome => Some("genome"),
            _ => None,
        }
    }
}

/// One parsed structural unit, exchanged with the visual editor as a block.
///
/// Immutable after construction within this subsystem; the builder methods
/// consume and return `self`.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub ty: NodeType,
    /// Literal field values, in insertion order.
    pub fields: Vec<(String, String)>,
    /// Single-child attachment points, in insertion order.
    pub value_slots: Vec<(String, Node)>,
    /// Ordered sibling sequences, in insertion order.
    pub statement_slots: Vec<(String, Vec<Node>)>,
}

impl Node {
    pub fn new(id: String, ty: NodeType) -> Self {
        Self {
            id,
            ty,
            fields: Vec::new(),
            value_slots: Vec::new(),
            statement_slots: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn with_value(mut self, slot: impl Into<String>, child: Node) -> Self {
        self.value_slots.push((slot.into(), child));
        self
    }

    /// Attach a statement slot. Empty sequences are dropped so that a missing
    /// slot and an empty one serialize identically.
    pub fn with_statements(mut self, slot: impl Into<String>, children: Vec<Node>) -> Self {
        if !children.is_empty() {
            self.statement_slots.push((slot.into(), children));
        }
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn value(&self, slot: &str) -> Option<&Node> {
        self.value_slots
            .iter()
            .find(|(n, _)| n == slot)
            .map(|(_, v)| v)
    }

    pub fn statements(&self, slot: &str) -> Option<&[Node]> {
        self.statement_slots
            .iter()
            .find(|(n, _)| n == slot)
            .map(|(_, v)| v.as_slice())
    }

    /// The primary identifying field used in merge signatures.
    pub fn primary_name(&self) -> Option<&str> {
        self.field("NAME")
            .or_else(|| self.field("PATH"))
            .or_else(|| self.field("TARGET"))
    }

    /// Structural equality ignoring node ids: same type, same fields, same
    /// slots, recursively. Used to compare trees across sessions, where ids
    /// are expected to differ.
    pub fn same_shape(&self, other: &Node) -> bool {
        if self.ty != other.ty || self.fields != other.fields {
            return false;
        }
        if self.value_slots.len() != other.value_slots.len()
            || self.statement_slots.len() != other.statement_slots.len()
        {
            return false;
        }
        for ((name_a, child_a), (name_b, child_b)) in
            self.value_slots.iter().zip(other.value_slots.iter())
        {
            if name_a != name_b || !child_a.same_shape(child_b) {
                return false;
            }
        }
        for ((name_a, seq_a), (name_b, seq_b)) in self
            .statement_slots
            .iter()
            .zip(other.statement_slots.iter())
        {
            if name_a != name_b || seq_a.len() != seq_b.len() {
                return false;
            }
            if !seq_a.iter().zip(seq_b.iter()).all(|(a, b)| a.same_shape(b)) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str, text: &str) -> Node {
        Node::new(id.to_string(), NodeType::Expression).with_field("TEXT", text)
    }

    #[test]
    fn tags_round_trip() {
        for ty in [
            NodeType::Function,
            NodeType::ImplicitReturn,
            NodeType::ShaderEntry,
            NodeType::EcsComponent,
            NodeType::SimGenome,
        ] {
            assert_eq!(NodeType::from_tag(ty.tag()), Some(ty));
        }
        assert_eq!(NodeType::from_tag("nonsense"), None);
    }

    #[test]
    fn statement_vocabulary_is_general_owned() {
        assert_eq!(NodeType::If.dialect(), Dialect::General);
        assert_eq!(NodeType::ShaderEntry.dialect(), Dialect::Shader);
        assert_eq!(NodeType::SimRule.dialect(), Dialect::Sim);
    }

    #[test]
    fn same_shape_ignores_ids() {
        let a = Node::new("n1".into(), NodeType::Return).with_value("VALUE", leaf("n2", "a + b"));
        let b = Node::new("n9".into(), NodeType::Return).with_value("VALUE", leaf("n8", "a + b"));
        assert!(a.same_shape(&b));
        let c = Node::new("n9".into(), NodeType::Return).with_value("VALUE", leaf("n8", "a - b"));
        assert!(!a.same_shape(&c));
    }

    #[test]
    fn empty_statement_slots_are_dropped() {
        let node = Node::new("n1".into(), NodeType::If).with_statements("THEN", vec![]);
        assert!(node.statement_slots.is_empty());
    }
}
