const MISSING_PORT: &str = "missing port in address";
const TOO_MANY_COLONS: &str = "too many colons in address";

/// Splits `host:port`, `[host]:port` or `[host%zone]:port` into host and port.
/// IPv6 hosts must be enclosed in square brackets.
pub fn split_host_port(hostport: &str) -> Result<(&str, &str), &'static str> {
    let Some(i) = hostport.rfind(':') else {
        return Err(MISSING_PORT);
    };

    let (host, j, k) = if hostport.starts_with('[') {
        let Some(end) = hostport.find(']') else {
            return Err("missing ']' in address");
        };

        if end + 1 == hostport.len() {
            // there can't be a ':' behind the ']' now
            return Err(MISSING_PORT);
        }
        if end + 1 != i {
            if hostport.as_bytes()[end + 1] == b':' {
                return Err(TOO_MANY_COLONS);
            }
            return Err(MISSING_PORT);
        }

        (&hostport[1..end], 1, end + 1)
    } else {
        let host = &hostport[..i];
        if host.contains(':') {
            return Err(TOO_MANY_COLONS);
        }

        (host, 0, 0)
    };

    if hostport[j..].contains('[') {
        return Err("unexpected '[' in address");
    }
    if hostport[k..].contains(']') {
        return Err("unexpected ']' in address");
    }

    Ok((host, &hostport[i + 1..]))
}

/// Returns true if the address has no port, and appending one makes it a
/// valid `host:port`.
pub fn should_add_port(address: &str) -> bool {
    if split_host_port(address).is_ok() {
        return false;
    }

    split_host_port(&format!("{address}:1234")).is_ok()
}

/// Check the address is a `host:port` a scraper could connect to.
pub fn check_target_address(address: &str) -> Result<(), &'static str> {
    // URLs are the most common mistake
    if address.contains('/') {
        return Err("is not a valid hostname");
    }

    let (host, port) = split_host_port(address)?;
    if host.is_empty() {
        return Err("missing host in address");
    }

    match port.parse::<u16>() {
        Ok(port) if port != 0 => Ok(()),
        _ => Err("invalid port in address"),
    }
}
