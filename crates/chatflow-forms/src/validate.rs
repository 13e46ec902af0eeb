//! Shape checks layered on top of plain text collection.

/// Loose email shape check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    has_dotted_host(domain)
}

/// An absolute `http`/`https` link with a host.
pub fn is_valid_link(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some(rest) = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
    else {
        return false;
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    // Drop an explicit port.
    let host = host.rsplit_once(':').map_or(host, |(h, port)| {
        if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) {
            h
        } else {
            host
        }
    });
    host == "localhost" || has_dotted_host(host)
}

/// A phone number: an optional leading `+`, then digits, spaces and dashes,
/// with at least one digit.
pub fn is_valid_phone(s: &str) -> bool {
    let digits = s.strip_prefix('+').unwrap_or(s);
    digits.chars().any(|c| c.is_ascii_digit())
        && digits
            .chars()
            .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
}

fn has_dotted_host(host: &str) -> bool {
    let labels: Vec<&str> = host.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|l| {
            !l.is_empty() && l.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}
