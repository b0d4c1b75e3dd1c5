/// Decodes a percent-encoded string (`%XX`) and converts `+` to space.
/// Invalid UTF-8 after decoding is replaced lossily.
pub fn url_decode(s: &str) -> String {
    decode(s, true)
}

/// Decodes `%XX` escapes in a URL path. `+` is kept as a literal plus.
pub fn percent_decode_path(s: &str) -> String {
    decode(s, false)
}

fn decode(s: &str, plus_as_space: bool) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' if plus_as_space => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                let hi = (bytes[i + 1] as char).to_digit(16);
                let lo = (bytes[i + 2] as char).to_digit(16);
                match (hi, lo) {
                    (Some(h), Some(l)) => {
                        out.push(((h << 4) | l) as u8);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parses `key=value&key2=value2` into a `Vec` of `(key, value)` pairs.
pub fn parse_form(body: &str) -> Vec<(String, String)> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut it = pair.splitn(2, '=');
            let k = it.next()?.to_owned();
            let v = it.next().unwrap_or("").to_owned();
            Some((url_decode(&k), url_decode(&v)))
        })
        .collect()
}

/// Looks up a key in parsed form pairs, returning the value if found.
pub fn form_get<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_pairs_are_decoded() {
        let pairs = parse_form("blur_parameter=0.5&center_parameter=none&name=sea+lion%21");
        assert_eq!(form_get(&pairs, "blur_parameter"), Some("0.5"));
        assert_eq!(form_get(&pairs, "center_parameter"), Some("none"));
        assert_eq!(form_get(&pairs, "name"), Some("sea lion!"));
        assert_eq!(form_get(&pairs, "missing"), None);
    }

    #[test]
    fn percent_escapes_at_the_end_and_utf8() {
        assert_eq!(url_decode("a%21"), "a!");
        assert_eq!(url_decode("%E2%9C%93"), "\u{2713}");
        assert_eq!(url_decode("100%"), "100%");
        assert_eq!(url_decode("%zz"), "%zz");
    }

    #[test]
    fn path_decoding_keeps_plus_signs() {
        assert_eq!(percent_decode_path("downloads/a+b.zip"), "downloads/a+b.zip");
        assert_eq!(percent_decode_path("samples/sea%20lion.jpg"), "samples/sea lion.jpg");
        assert_eq!(url_decode("a+b"), "a b");
    }

    #[test]
    fn empty_query_has_no_pairs() {
        assert!(parse_form("").is_empty());
    }
}
