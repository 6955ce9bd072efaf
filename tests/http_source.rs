// HTTP sound source against a local mock server

use std::time::Duration;

use soundtag::{
    Error, HttpSource, InfoSource, KnownMetadata, LookupConfig, SoundBoard, SoundNumber,
    SoundSource,
};

fn number(n: &str) -> SoundNumber {
    SoundNumber::parse(n).unwrap()
}

fn tagged_mp3(title: &str) -> Vec<u8> {
    let mut frame = b"TIT2".to_vec();
    frame.extend((title.len() as u32 + 1).to_be_bytes());
    frame.extend([0, 0, 3]);
    frame.extend(title.as_bytes());

    let mut buffer = b"ID3\x03\x00\x00\x00\x00\x00".to_vec();
    buffer.push(frame.len() as u8);
    buffer.extend(frame);
    buffer.extend([0u8; 256]);
    buffer
}

#[test]
fn fetches_padded_path() {
    let mut server = mockito::Server::new();
    let body = tagged_mp3("Gong");
    let mock = server
        .mock("GET", "/sounds/007.mp3")
        .with_status(200)
        .with_body(body.clone())
        .create();

    let source = HttpSource::new(server.url(), Duration::from_secs(5));
    let bytes = source.fetch(number("7")).unwrap();

    mock.assert();
    assert_eq!(bytes, body);
}

#[test]
fn missing_sound_is_not_found() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/sounds/404.mp3")
        .with_status(404)
        .create();

    let source = HttpSource::new(server.url(), Duration::from_secs(5));
    let err = source.fetch(number("404")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "{:?}", err);
    assert!(err.is_transport());
}

#[test]
fn server_error_keeps_status() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/sounds/500.mp3")
        .with_status(500)
        .create();

    let source = HttpSource::new(server.url(), Duration::from_secs(5));
    match source.fetch(number("500")) {
        Err(Error::Status { code, url }) => {
            assert_eq!(code, 500);
            assert!(url.ends_with("/sounds/500.mp3"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[test]
fn lookup_prefers_tag_over_table() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/sounds/001.mp3")
        .with_status(200)
        .with_body(tagged_mp3("Aus dem Tag"))
        .create();

    let source = HttpSource::new(server.url(), Duration::from_secs(5));
    let board = SoundBoard::new(source, LookupConfig::default(), KnownMetadata::builtin());
    let info = board.lookup(number("1")).unwrap();

    assert_eq!(info.file_name, "001.mp3");
    assert_eq!(info.title, "Aus dem Tag");
    assert_eq!(info.source, InfoSource::Tag);
    assert_eq!(info.comment, "BRUCHLAST Sound Effect 001");
    assert_eq!(info.category.as_deref(), Some("Standard"));
}

#[test]
fn lookup_untagged_uses_placeholders() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/sounds/123.mp3")
        .with_status(200)
        .with_body(vec![0u8; 512])
        .create();

    let source = HttpSource::new(server.url(), Duration::from_secs(5));
    let board = SoundBoard::new(source, LookupConfig::default(), KnownMetadata::new());
    let info = board.lookup(number("123")).unwrap();

    assert_eq!(info.title, "Unbekannt");
    assert_eq!(info.comment, "Kein Kommentar");
    assert_eq!(info.source, InfoSource::Placeholder);
    assert!(info.tags.is_empty());
}

#[test]
fn unreachable_server_is_transport_error() {
    let source = HttpSource::new("http://127.0.0.1:9", Duration::from_secs(1));
    let err = source.fetch(number("1")).unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "{:?}", err);
    assert!(err.is_transport());
}
