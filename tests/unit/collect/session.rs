use super::*;

const CAPTURED: &str = r#"curl 'https://previews.dropbox.com/p/pdf_img/ABC/p.png?page=0' \
  -H 'accept: image/avif,image/webp,*/*' \
  -H 'accept-encoding: gzip, deflate, br' \
  -H 'Referer: https://www.dropbox.com/' \
  -H 'cookie: t=tok123; locale=en; __Host-js_csrf=abc=def; lonely' \
  -H 'user-agent: Mozilla/5.0 (Macintosh)' \
  --compressed"#;

#[test]
fn extracts_lowercased_headers_and_cookies() {
    let creds = parse_curl(CAPTURED).unwrap();
    assert_eq!(creds.headers["accept"], "image/avif,image/webp,*/*");
    assert_eq!(creds.headers["referer"], "https://www.dropbox.com/");
    assert_eq!(creds.headers["user-agent"], "Mozilla/5.0 (Macintosh)");
    assert!(!creds.headers.contains_key("cookie"));

    assert_eq!(creds.cookies["t"], "tok123");
    assert_eq!(creds.cookies["locale"], "en");
    // Only the first '=' separates name and value.
    assert_eq!(creds.cookies["__Host-js_csrf"], "abc=def");
    assert!(!creds.cookies.contains_key("lonely"));
}

#[test]
fn replay_headers_drop_connection_level_entries() {
    let creds = parse_curl(CAPTURED).unwrap();
    let names: Vec<_> = creds.replay_headers().map(|(k, _)| k).collect();
    assert_eq!(names, ["accept", "referer", "user-agent"]);
}

#[test]
fn cookie_header_round_trips_pairs() {
    let creds = parse_curl("curl x -b 'a=1; b=2'").unwrap();
    assert_eq!(creds.cookie_header().as_deref(), Some("a=1; b=2"));
    assert_eq!(SessionCredentials::default().cookie_header(), None);
}

#[test]
fn header_values_may_contain_colons() {
    let creds = parse_curl(r#"curl x -H "x-origin: https://example.com:8443""#).unwrap();
    assert_eq!(creds.headers["x-origin"], "https://example.com:8443");
}

#[test]
fn shell_words_handles_quotes_and_continuations() {
    let words = shell_words("curl 'a b' \"c \\\"d\\\"\" g\\ h \\\n i \\\r\n j").unwrap();
    assert_eq!(words, ["curl", "a b", "c \"d\"", "g h", "i", "j"]);
}

#[test]
fn unterminated_quote_is_an_error() {
    assert!(parse_curl("curl -H 'accept: x").is_err());
    assert!(parse_curl("curl -H").is_err());
    assert!(parse_curl("curl -H \"accept: x").is_err());
}
