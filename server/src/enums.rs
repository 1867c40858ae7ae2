use tower_lsp::lsp_types::{Hover, Location, Position, Url};

use crate::{
    lsp_convert::{AsLspHover, AsLspLocation},
    models::{
        external_symbol::ExternalSymbol,
        symbol::{Symbol, SymbolMetadata},
    },
};

/// The outcome of resolving an identifier at a cursor position: a symbol
/// indexed from project sources, one decompiled from a dependency jar, or a
/// purely local binding (method parameter, closure variable) that never
/// made it into the symbol index.
#[derive(Clone)]
pub enum ResolvedSymbol {
    Project(Symbol),
    External(ExternalSymbol),
    Local {
        name: String,
        var_type: String,
        uri: Url,
        position: Position,
    },
}

impl ResolvedSymbol {
    pub fn package_name(&self) -> Option<&str> {
        match self {
            ResolvedSymbol::Project(s) => Some(&s.package_name),
            ResolvedSymbol::External(s) => Some(&s.package_name),
            ResolvedSymbol::Local { .. } => None,
        }
    }

    pub fn metadata(&self) -> Option<&SymbolMetadata> {
        match self {
            ResolvedSymbol::Project(s) => Some(&s.metadata),
            ResolvedSymbol::External(s) => Some(&s.metadata),
            ResolvedSymbol::Local { .. } => None,
        }
    }

    pub fn fully_qualified_name(&self) -> Option<&str> {
        match self {
            ResolvedSymbol::Project(s) => Some(&s.fully_qualified_name),
            ResolvedSymbol::External(s) => Some(&s.fully_qualified_name),
            ResolvedSymbol::Local { .. } => None,
        }
    }
}

impl AsLspLocation for ResolvedSymbol {
    fn as_lsp_location(&self) -> Option<Location> {
        match self {
            ResolvedSymbol::Project(s) => s.as_lsp_location(),
            ResolvedSymbol::External(s) => s.as_lsp_location(),
            ResolvedSymbol::Local { uri, position, .. } => Some(Location {
                uri: uri.clone(),
                range: tower_lsp::lsp_types::Range {
                    start: *position,
                    end: *position,
                },
            }),
        }
    }
}

impl AsLspHover for ResolvedSymbol {
    fn as_lsp_hover(&self) -> Option<Hover> {
        match self {
            ResolvedSymbol::Project(s) => s.as_lsp_hover(),
            ResolvedSymbol::External(s) => s.as_lsp_hover(),
            ResolvedSymbol::Local { name, var_type, .. } => Some(Hover {
                contents: tower_lsp::lsp_types::HoverContents::Scalar(
                    tower_lsp::lsp_types::MarkedString::String(format!(
                        "{var_type} {name}"
                    )),
                ),
                range: None,
            }),
        }
    }
}
