use tower_lsp::lsp_types::{
    GotoDefinitionParams, GotoDefinitionResponse, PartialResultParams, Position,
    TextDocumentIdentifier, TextDocumentPositionParams, WorkDoneProgressParams,
};
use tower_lsp::LanguageServer;

use crate::util::get_test_server;

mod util;

const USER_GROOVY: &str = "package com.example\n\nclass User {\n    String name\n}\n";
const SERVICE_GROOVY: &str = "package com.example\n\nclass Service {\n    User getUser() {\n        return new User()\n    }\n}\n";

#[tokio::test(flavor = "multi_thread")]
async fn goto_definition_type_reference() {
    let server = get_test_server(&[
        ("User.groovy", USER_GROOVY),
        ("Service.groovy", SERVICE_GROOVY),
    ])
    .await;

    let params = GotoDefinitionParams {
        text_document_position_params: TextDocumentPositionParams {
            text_document: TextDocumentIdentifier {
                uri: server.uri("Service.groovy"),
            },
            // "    User getUser() {" -- inside the "User" return-type token.
            position: Position::new(3, 6),
        },
        work_done_progress_params: WorkDoneProgressParams::default(),
        partial_result_params: PartialResultParams::default(),
    };

    let result = server
        .backend()
        .goto_definition(params)
        .await
        .unwrap()
        .expect("expected a definition location");

    match result {
        GotoDefinitionResponse::Scalar(location) => {
            assert!(location.uri.path().ends_with("User.groovy"));
        }
        GotoDefinitionResponse::Array(locations) => {
            assert_eq!(locations.len(), 1);
            assert!(locations[0].uri.path().ends_with("User.groovy"));
        }
        GotoDefinitionResponse::Link(_) => panic!("unexpected link response"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn goto_definition_missing_symbol_returns_none() {
    let server = get_test_server(&[("User.groovy", USER_GROOVY)]).await;

    let params = GotoDefinitionParams {
        text_document_position_params: TextDocumentPositionParams {
            text_document: TextDocumentIdentifier {
                uri: server.uri("User.groovy"),
            },
            position: Position::new(0, 0),
        },
        work_done_progress_params: WorkDoneProgressParams::default(),
        partial_result_params: PartialResultParams::default(),
    };

    let result = server.backend().goto_definition(params).await.unwrap();
    assert!(result.is_none());
}
