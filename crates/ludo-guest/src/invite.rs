//! Invite links.
//!
//! A host's address travels as a single query parameter in a shareable
//! link. A process started with the parameter present acts as guest and
//! dials the embedded address; without it, the process hosts.

const HOST_PARAM: &str = "hostId";

/// Builds a shareable link carrying the host's address.
pub fn invite_link(base: &str, host_addr: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{HOST_PARAM}={host_addr}")
}

/// Extracts the host address from a link, if present.
pub fn host_addr(url: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    let query = query.split('#').next().unwrap_or(query);
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == HOST_PARAM && !value.is_empty()).then(|| value.to_owned())
    })
}
