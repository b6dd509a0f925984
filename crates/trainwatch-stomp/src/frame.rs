use std::fmt;

/// A decoded STOMP frame: a command, an ordered header list, and a body.
///
/// Headers are kept as an ordered `Vec` rather than a map because STOMP
/// allows repeated header names (the first occurrence wins on lookup, per
/// the STOMP 1.2 protocol), and because outgoing frames need to control
/// header order for some brokers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompFrame {
    /// The frame command, e.g. `"CONNECT"`, `"MESSAGE"`, `"ERROR"`.
    pub command: String,
    /// Header name/value pairs, in wire order.
    pub headers: Vec<(String, String)>,
    /// Frame body (empty for most control frames).
    pub body: Vec<u8>,
}

impl StompFrame {
    /// Build a frame with no body.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Add a header, preserving insertion order.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of a header, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for StompFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{} headers]", self.command, self.headers.len())
    }
}

/// Either a decoded frame or a heartbeat (a lone newline between frames).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StompEvent {
    /// A complete frame.
    Frame(StompFrame),
    /// A heartbeat byte, carrying no data.
    Heartbeat,
}
