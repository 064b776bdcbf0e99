use super::*;

#[test]
fn missing_source_is_an_input_error() {
    let result = ImageSource::from_parts(None, None);
    assert_eq!(result, Err(ExtractionError::MissingSource));
    assert!(ExtractionError::MissingSource.is_input_error());

    let result = ImageSource::from_parts(None, Some("   "));
    assert_eq!(result, Err(ExtractionError::MissingSource));
}

#[test]
fn both_sources_are_rejected() {
    let result = ImageSource::from_parts(Some(vec![1, 2, 3]), Some("https://example.com/a.png"));
    assert_eq!(result, Err(ExtractionError::AmbiguousSource));
}

#[test]
fn empty_upload_is_rejected() {
    let result = ImageSource::from_parts(Some(Vec::new()), None);
    assert_eq!(result, Err(ExtractionError::EmptyImage));
}

#[test]
fn upload_bytes_are_kept() {
    let source = ImageSource::from_parts(Some(vec![9, 8, 7]), None).expect("should accept bytes");
    assert_eq!(source, ImageSource::Bytes(vec![9, 8, 7]));
    assert_eq!(source.describe(), "<3 bytes>");
}

#[test]
fn remote_url_is_parsed() {
    let source = ImageSource::from_parts(None, Some("https://cdn.example.com/p/1.jpg"))
        .expect("should accept url");
    match source {
        ImageSource::Url(url) => assert_eq!(url.host_str(), Some("cdn.example.com")),
        ImageSource::Bytes(_) => panic!("expected a URL source"),
    }
}

#[test]
fn non_http_urls_are_rejected() {
    let result = ImageSource::from_url_or_data_uri("ftp://example.com/a.png");
    assert!(matches!(result, Err(ExtractionError::InvalidUrl(_))));

    let result = ImageSource::from_url_or_data_uri("not a url");
    assert!(matches!(result, Err(ExtractionError::InvalidUrl(_))));
}

#[test]
fn data_uri_is_decoded_to_bytes() {
    // "hello" in base64
    let source = ImageSource::from_url_or_data_uri("data:image/png;base64,aGVsbG8=")
        .expect("should decode data uri");
    assert_eq!(source, ImageSource::Bytes(b"hello".to_vec()));
}

#[test]
fn data_uri_tolerates_case_and_whitespace() {
    let bytes = decode_data_uri("DATA:Image/JPEG;BASE64,aGVs\nbG8=").expect("should decode");
    assert_eq!(bytes, b"hello");
}

#[test]
fn malformed_data_uris_are_rejected() {
    for uri in [
        "data:image/png;base64",
        "data:text/plain;base64,aGVsbG8=",
        "data:image/png,rawdata",
        "data:image/png;base64,@@@not-base64@@@",
    ] {
        let result = decode_data_uri(uri);
        assert!(
            matches!(result, Err(ExtractionError::InvalidDataUri(_))),
            "{uri} should be rejected, got {result:?}"
        );
    }

    assert_eq!(
        decode_data_uri("data:image/png;base64,"),
        Err(ExtractionError::EmptyImage)
    );
}
