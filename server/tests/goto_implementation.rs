use tower_lsp::LanguageServer;
use tower_lsp::lsp_types::{
    PartialResultParams, Position, TextDocumentIdentifier, TextDocumentPositionParams,
    WorkDoneProgressParams, request::GotoImplementationParams,
    request::GotoImplementationResponse,
};

use crate::util::get_test_server;

mod util;

const GREETER_GROOVY: &str = "package com.example\n\ninterface Greeter {\n    String greet()\n}\n";
const ENGLISH_GREETER_GROOVY: &str = "package com.example\n\nclass EnglishGreeter implements Greeter {\n    String greet() {\n        return \"hello\"\n    }\n}\n";

#[tokio::test(flavor = "multi_thread")]
async fn goto_implementation_interface() {
    let server = get_test_server(&[
        ("Greeter.groovy", GREETER_GROOVY),
        ("EnglishGreeter.groovy", ENGLISH_GREETER_GROOVY),
    ])
    .await;

    let params = GotoImplementationParams {
        text_document_position_params: TextDocumentPositionParams {
            text_document: TextDocumentIdentifier {
                uri: server.uri("Greeter.groovy"),
            },
            // "interface Greeter {" -- inside the "Greeter" identifier.
            position: Position::new(2, 12),
        },
        work_done_progress_params: WorkDoneProgressParams::default(),
        partial_result_params: PartialResultParams::default(),
    };

    let result = server
        .backend()
        .goto_implementation(params)
        .await
        .unwrap()
        .expect("expected at least one implementation");

    match result {
        GotoImplementationResponse::Scalar(location) => {
            assert!(location.uri.path().ends_with("EnglishGreeter.groovy"));
        }
        GotoImplementationResponse::Array(locations) => {
            assert!(
                locations
                    .iter()
                    .any(|l| l.uri.path().ends_with("EnglishGreeter.groovy"))
            );
        }
        GotoImplementationResponse::Link(_) => panic!("unexpected link response"),
    }
}
