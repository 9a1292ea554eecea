use crate::platform::Platform;

/// One hop line, before ownership enrichment.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedHop {
    Reached {
        hop_index: i32,
        hostname: String,
        ip: String,
        latency_ms: f64,
    },
    TimedOut {
        hop_index: i32,
    },
}

impl ParsedHop {
    pub fn hop_index(&self) -> i32 {
        match self {
            ParsedHop::Reached { hop_index, .. } | ParsedHop::TimedOut { hop_index } => *hop_index,
        }
    }
}

pub fn parse_hop_line(platform: Platform, line: &str) -> Option<ParsedHop> {
    platform.parse_hop_line(line)
}

/// Lines that are neither a hop nor an all-timeout hop are skipped, so headers and
/// multi-path continuation lines never count as hops. Order is kept as printed.
pub fn parse_trace_output(platform: Platform, text: &str) -> Vec<ParsedHop> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| platform.parse_hop_line(line))
        .collect()
}

/// `traceroute` on Linux and macOS:
/// ` 3  edge1.example.net (203.0.113.9)  11.204 ms  10.980 ms *`
pub(crate) fn parse_unix_hop_line(line: &str) -> Option<ParsedHop> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (hop_index, rest) = split_hop_index(&tokens)?;

    if !rest.is_empty() && rest.iter().all(|tok| *tok == "*") {
        return Some(ParsedHop::TimedOut { hop_index });
    }

    let mut i = 0;
    while i < rest.len() && (rest[i] == "*" || rest[i].starts_with('!')) {
        i += 1;
    }
    let host = *rest.get(i)?;
    if parse_rtt(host, rest.get(i + 1).copied()).is_some() {
        return None;
    }

    let wrapped_ip = rest.get(i + 1).and_then(|tok| strip_wrapped(tok, '(', ')'));
    let (hostname, ip, consumed) = match wrapped_ip {
        Some(ip) => (host, ip, 2),
        None if is_ip_token(host) => (host, host, 1),
        None => return None,
    };
    if !is_ip_token(ip) {
        return None;
    }

    let latency_ms = first_rtt(&rest[i + consumed..])?;
    Some(ParsedHop::Reached {
        hop_index,
        hostname: hostname.to_string(),
        ip: ip.to_string(),
        latency_ms,
    })
}

/// `tracert` on Windows:
/// `  2    <1 ms     7 ms     *     edge1.example.net [203.0.113.9]`
/// or a bare address in place of `host [ip]` when reverse lookup fails.
pub(crate) fn parse_windows_hop_line(line: &str) -> Option<ParsedHop> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (hop_index, rest) = split_hop_index(&tokens)?;

    let mut latencies: Vec<Option<f64>> = Vec::new();
    let mut i = 0;
    while i < rest.len() {
        let tok = rest[i];
        if tok == "*" {
            latencies.push(None);
            i += 1;
            continue;
        }
        match parse_rtt(tok, rest.get(i + 1).copied()) {
            Some((value, consumed_next)) => {
                latencies.push(Some(value));
                i += if consumed_next { 2 } else { 1 };
            }
            None => break,
        }
    }

    if latencies.is_empty() {
        return None;
    }

    let latency_ms = latencies.iter().copied().flatten().next();
    let target = &rest[i..];

    let (hostname, ip) = match target {
        [host, bracketed, ..] if strip_wrapped(bracketed, '[', ']').is_some() => {
            (*host, strip_wrapped(bracketed, '[', ']')?)
        }
        [ip, ..] if is_ip_token(ip.trim_end_matches('.')) => {
            let ip = ip.trim_end_matches('.');
            (ip, ip)
        }
        _ => {
            return if latency_ms.is_none() {
                Some(ParsedHop::TimedOut { hop_index })
            } else {
                None
            };
        }
    };

    match latency_ms {
        Some(latency_ms) if is_ip_token(ip) => Some(ParsedHop::Reached {
            hop_index,
            hostname: hostname.to_string(),
            ip: ip.to_string(),
            latency_ms,
        }),
        Some(_) => None,
        None => Some(ParsedHop::TimedOut { hop_index }),
    }
}

fn split_hop_index<'a, 'b>(tokens: &'b [&'a str]) -> Option<(i32, &'b [&'a str])> {
    let (first, rest) = tokens.split_first()?;
    if !first.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hop_index = first.parse::<i32>().ok()?;
    Some((hop_index, rest))
}

fn strip_wrapped(token: &str, open: char, close: char) -> Option<&str> {
    let inner = token.strip_prefix(open)?.strip_suffix(close)?;
    if inner.is_empty() {
        None
    } else {
        Some(inner)
    }
}

fn first_rtt(tokens: &[&str]) -> Option<f64> {
    tokens
        .iter()
        .enumerate()
        .find_map(|(i, tok)| parse_rtt(tok, tokens.get(i + 1).copied()).map(|(value, _)| value))
}

fn is_ip_token(token: &str) -> bool {
    if token.ends_with("ms") {
        return false;
    }

    is_ipv4(token) || is_ipv6(token)
}

fn is_ipv4(token: &str) -> bool {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 4 {
        return false;
    }

    parts.iter().all(|part| {
        !part.is_empty()
            && part.len() <= 3
            && part.chars().all(|c| c.is_ascii_digit())
            && part.parse::<u8>().is_ok()
    })
}

fn is_ipv6(token: &str) -> bool {
    if !token.contains(':') {
        return false;
    }

    token.chars().all(|c| c.is_ascii_hexdigit() || c == ':')
}

/// Accepts `1.234 ms`, `1.234ms`, and the Windows `<1 ms` (read as 1).
fn parse_rtt(token: &str, next: Option<&str>) -> Option<(f64, bool)> {
    let token = token.strip_prefix('<').unwrap_or(token);

    if let Some(num) = token.strip_suffix("ms") {
        if let Ok(val) = num.parse::<f64>() {
            return Some((val, false));
        }
    }

    if let Ok(val) = token.parse::<f64>() {
        if matches!(next, Some(next_tok) if next_tok.starts_with("ms")) {
            return Some((val, true));
        }
    }

    None
}
