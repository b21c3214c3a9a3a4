//! Website and email-domain normalization
//!
//! Turns URL-like strings from contact sheets ("HTTPS://www.Acme.com/about?ref=x")
//! into bare domains ("acme.com").

/// Canonicalize a URL-like string into a bare domain.
///
/// Returns `None` when the input is absent, empty, or does not look like a
/// domain once scheme, `www.`, path, query, fragment and port are removed.
pub fn normalize_website(url: Option<&str>) -> Option<String> {
    let url = url?;
    if url.is_empty() {
        return None;
    }

    let lowered = url.to_lowercase();

    // Peel leading noise until nothing more comes off, so "www.www." and
    // ".www." prefixes end up where a clean "www." prefix would
    let mut domain = lowered.as_str();
    loop {
        let peeled = trim_edges(domain);
        let peeled = peeled
            .strip_prefix("https://")
            .or_else(|| peeled.strip_prefix("http://"))
            .or_else(|| peeled.strip_prefix("www."))
            .unwrap_or(peeled);
        if peeled == domain {
            break;
        }
        domain = peeled;
    }

    // Path, query, fragment and port are all discarded
    if let Some(end) = domain.find(['/', '?', '#', ':']) {
        domain = &domain[..end];
    }

    let domain = trim_edges(domain);

    if domain.contains('.') && domain.len() > 3 {
        Some(domain.to_string())
    } else {
        None
    }
}

fn trim_edges(value: &str) -> &str {
    value.trim_matches(|c: char| c == '.' || c.is_whitespace())
}

/// Mail domain of an address: the text after the first `@`, trimmed and lowercased
pub fn email_domain(email: &str) -> Option<String> {
    let domain = email.split('@').nth(1)?.trim().to_lowercase();
    if domain.is_empty() {
        None
    } else {
        Some(domain)
    }
}
