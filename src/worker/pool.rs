use std::fmt;

/// Pool endpoint split into host and optional port.
///
/// The split happens once, when parameters are built; nothing re-parses the
/// pool string afterwards. Only the first `:` separates host from port, any
/// further segments are ignored (same as the worker configs expect).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolAddress {
    raw: String,
    host: String,
    port: Option<String>,
    segments: usize,
}

impl PoolAddress {
    /// Splits `host[:port]`.
    pub fn parse(pool: &str) -> Self {
        let mut parts = pool.split(':');
        let host = parts.next().unwrap_or_default().to_string();
        let port = parts.next().map(str::to_string);
        let segments = pool.split(':').count();
        Self {
            raw: pool.to_string(),
            host,
            port,
            segments,
        }
    }

    /// The pool string exactly as given.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    /// Port or empty string, as substituted into templates.
    pub fn port_or_empty(&self) -> &str {
        self.port.as_deref().unwrap_or("")
    }

    /// True when the address is a plain `host` or `host:port` and may be DNS-resolved.
    pub fn is_resolvable(&self) -> bool {
        self.segments <= 2 && !self.host.is_empty()
    }
}

impl fmt::Display for PoolAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
