use pretty_assertions::assert_eq;
use tower_lsp::LanguageServer;
use tower_lsp::lsp_types::{
    Hover, HoverContents, HoverParams, MarkupContent, MarkupKind, Position,
    TextDocumentIdentifier, TextDocumentPositionParams, WorkDoneProgressParams,
};

use crate::util::get_test_server;

mod util;

const WIDGET_GROOVY: &str = "package com.example\n\nclass Widget {\n    String name\n}\n";

#[tokio::test(flavor = "multi_thread")]
async fn hover_on_class_declaration() {
    let server = get_test_server(&[("Widget.groovy", WIDGET_GROOVY)]).await;

    let params = HoverParams {
        text_document_position_params: TextDocumentPositionParams {
            text_document: TextDocumentIdentifier {
                uri: server.uri("Widget.groovy"),
            },
            // "class Widget {" -- inside the "Widget" identifier.
            position: Position::new(2, 8),
        },
        work_done_progress_params: WorkDoneProgressParams::default(),
    };

    let result = server
        .backend()
        .hover(params)
        .await
        .unwrap()
        .expect("expected a hover result");

    let expected = Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: "```Groovy\npackage com.example\n\nclass Widget\n```".to_string(),
        }),
        range: None,
    };

    assert_eq!(result, expected);
}
