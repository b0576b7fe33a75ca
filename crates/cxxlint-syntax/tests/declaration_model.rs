//! Integration test: tokenizer and extractor on realistic headers.

use cxxlint_syntax::{extract, tokenize, DeclarationModel, EntityKind, Token};

fn model_of(src: &str) -> (Vec<Token>, DeclarationModel) {
    let tokens: Vec<Token> = tokenize(src).collect();
    let model = extract(&tokens);
    (tokens, model)
}

fn listing(model: &DeclarationModel) -> String {
    model
        .entities()
        .iter()
        .map(|e| {
            format!(
                "{}:{} {} {}",
                e.span.start_pos.line, e.span.start_pos.column, e.kind, e.name
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn entities_are_listed_in_source_order() {
    let src = "namespace net {\nclass TcpClient {\n public:\n  bool Connect(const char* host, int port);\n private:\n  int retry_count_ = 0;\n};\nenum Status { kOk, kFailed };\n}  // namespace net\n";
    let (_, model) = model_of(src);
    insta::assert_snapshot!(listing(&model), @r"
    1:11 namespace net
    2:7 class TcpClient
    4:8 method Connect
    4:28 parameter host
    4:38 parameter port
    6:7 variable retry_count_
    8:6 enum Status
    8:15 enumerator kOk
    8:20 enumerator kFailed
    ");
}

#[test]
fn entity_spans_slice_back_to_their_names() {
    let src = "#define BUFFER_SIZE 64\nstruct Frame { unsigned char data[BUFFER_SIZE]; };\nstatic int frame_count = 0;\n";
    let (_, model) = model_of(src);
    for entity in model.entities() {
        assert_eq!(&src[entity.span.start..entity.span.end], entity.name);
    }
}

#[test]
fn entity_token_indexes_point_at_the_name_token() {
    let src = "int compute(int lhs, int rhs) { return lhs + rhs; }\n";
    let (tokens, model) = model_of(src);
    for entity in model.entities() {
        assert_eq!(tokens[entity.token].text, entity.name);
    }
}

#[test]
fn identifiers_in_comments_and_strings_are_not_entities() {
    let src = "// int hidden_one = 1;\nconst char* text = \"int hidden_two = 2;\";\n/* class Hidden {}; */\n";
    let (_, model) = model_of(src);
    let names: Vec<&str> = model.entities().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["text"]);
}

#[test]
fn unparseable_input_still_yields_a_model() {
    let src = "class { int ok_before = 1; @@@ ) ) ) namespace {";
    let (_, model) = model_of(src);
    assert!(model
        .entities()
        .iter()
        .any(|e| e.kind == EntityKind::Variable && e.name == "ok_before"));
    assert!(!model.notes().is_empty());
}
