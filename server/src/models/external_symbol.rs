use lsp_core::{node_types::NodeType, util::strip_comment_signifiers};
use sqlx::{FromRow, types::Json};
use tower_lsp::lsp_types::{
    Hover, HoverContents, Location, MarkupContent, MarkupKind, Position, Range, Url,
};

use crate::{
    lsp_convert::{AsLspHover, AsLspLocation},
    models::symbol::SymbolMetadata,
};

#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct ExternalSymbol {
    pub id: Option<i64>,
    pub jar_path: String,
    pub source_file_path: String,
    pub short_name: String,
    pub fully_qualified_name: String,
    pub package_name: String,
    pub parent_name: Option<String>,
    pub symbol_type: String,
    #[sqlx(json)]
    pub modifiers: Json<Vec<String>>,
    pub line_start: i64,
    pub line_end: i64,
    pub char_start: i64,
    pub char_end: i64,
    pub ident_line_start: i64,
    pub ident_line_end: i64,
    pub ident_char_start: i64,
    pub ident_char_end: i64,
    pub needs_decompilation: bool,
    #[sqlx(json)]
    pub metadata: Json<SymbolMetadata>,
    pub last_modified: i64,
}

impl AsLspLocation for ExternalSymbol {
    fn as_lsp_location(&self) -> Option<Location> {
        let uri = Url::from_file_path(&self.source_file_path).ok()?;
        Some(Location {
            uri,
            range: Range {
                start: Position {
                    line: self.ident_line_start as u32,
                    character: self.ident_char_start as u32,
                },
                end: Position {
                    line: self.ident_line_end as u32,
                    character: self.ident_char_end as u32,
                },
            },
        })
    }
}

impl AsLspHover for ExternalSymbol {
    fn as_lsp_hover(&self) -> Option<Hover> {
        let node_type = NodeType::from_string(&self.symbol_type);
        let modifiers = self.modifiers.iter().cloned().collect::<Vec<_>>().join(" ");

        let mut signature_line = String::new();
        if !modifiers.is_empty() {
            signature_line.push_str(&modifiers);
            signature_line.push(' ');
        }
        if let Some(nt) = &node_type {
            if let Some(kw) = nt.keyword() {
                signature_line.push_str(kw);
                signature_line.push(' ');
            }
        }
        if let Some(ret) = &self.metadata.return_type {
            signature_line.push_str(ret);
            signature_line.push(' ');
        }
        signature_line.push_str(&self.short_name);

        let mut parts = vec!["```java".to_string()];
        if !self.package_name.is_empty() {
            parts.push(format!("package {}", self.package_name));
            parts.push(String::new());
        }
        if self.needs_decompilation {
            parts.push("// decompiled".to_string());
        }
        parts.push(signature_line);
        parts.push("```".to_string());
        if let Some(doc) = &self.metadata.documentation {
            if !doc.is_empty() {
                parts.push(strip_comment_signifiers(doc));
            }
        }

        Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: parts.join("\n"),
            }),
            range: None,
        })
    }
}
