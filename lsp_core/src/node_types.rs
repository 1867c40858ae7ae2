use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Class,
    Interface,
    Trait,
    Enum,
    Annotation,
    Method,
    Constructor,
    Field,
    Property,
    Closure,
}

impl Display for NodeType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            NodeType::Class => write!(f, "Class"),
            NodeType::Interface => write!(f, "Interface"),
            NodeType::Trait => write!(f, "Trait"),
            NodeType::Enum => write!(f, "Enum"),
            NodeType::Annotation => write!(f, "Annotation"),
            NodeType::Method => write!(f, "Method"),
            NodeType::Constructor => write!(f, "Constructor"),
            NodeType::Field => write!(f, "Field"),
            NodeType::Property => write!(f, "Property"),
            NodeType::Closure => write!(f, "Closure"),
        }
    }
}

impl NodeType {
    pub fn from_string(name: &str) -> Option<Self> {
        match name {
            "Class" => Some(NodeType::Class),
            "Interface" => Some(NodeType::Interface),
            "Trait" => Some(NodeType::Trait),
            "Enum" => Some(NodeType::Enum),
            "Annotation" => Some(NodeType::Annotation),
            "Method" => Some(NodeType::Method),
            "Constructor" => Some(NodeType::Constructor),
            "Field" => Some(NodeType::Field),
            "Property" => Some(NodeType::Property),
            "Closure" => Some(NodeType::Closure),
            _ => None,
        }
    }

    /// Declaration keyword for the node's kind, for hover/signature rendering.
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            NodeType::Class => Some("class"),
            NodeType::Interface => Some("interface"),
            NodeType::Trait => Some("trait"),
            NodeType::Enum => Some("enum"),
            NodeType::Annotation => Some("@interface"),
            NodeType::Constructor
            | NodeType::Field
            | NodeType::Property
            | NodeType::Method
            | NodeType::Closure => None,
        }
    }

    pub fn is_type_scope(&self) -> bool {
        matches!(
            self,
            NodeType::Class | NodeType::Interface | NodeType::Trait | NodeType::Enum
        )
    }
}
