use tower_lsp::LanguageServer;
use tower_lsp::lsp_types::{
    CompletionParams, CompletionResponse, PartialResultParams, Position, TextDocumentIdentifier,
    TextDocumentPositionParams, WorkDoneProgressParams,
};

use crate::util::get_test_server;

mod util;

const FOO_GROOVY: &str = "class Foo {\n    def bar() {}\n}\n";
const USAGE_GROOVY: &str = "class Usage {\n    Fo x\n}\n";

#[tokio::test(flavor = "multi_thread")]
async fn completion_by_prefix() {
    let server = get_test_server(&[
        ("Foo.groovy", FOO_GROOVY),
        ("Usage.groovy", USAGE_GROOVY),
    ])
    .await;

    let params = CompletionParams {
        text_document_position: TextDocumentPositionParams {
            text_document: TextDocumentIdentifier {
                uri: server.uri("Usage.groovy"),
            },
            // "    Fo x" -- inside the partial "Fo" identifier.
            position: Position::new(1, 5),
        },
        context: None,
        work_done_progress_params: WorkDoneProgressParams::default(),
        partial_result_params: PartialResultParams::default(),
    };

    let result = server
        .backend()
        .completion(params)
        .await
        .unwrap()
        .expect("expected completion results");

    match result {
        CompletionResponse::Array(items) => {
            assert!(items.iter().any(|i| i.label == "Foo"));
        }
        CompletionResponse::List(_) => panic!("unexpected completion list response"),
    }
}
