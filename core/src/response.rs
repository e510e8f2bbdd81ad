/// What the dispatcher wants the host to do with one inbound line.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Send these lines back, in order. Each line is chunked separately.
    Reply { lines: Vec<String> },
    /// Not addressed to the bot.
    Ignored,
    /// Reload settings and rebuild the dispatcher.
    Reload,
}

impl Response {
    pub fn line(text: impl Into<String>) -> Response {
        Response::Reply { lines: vec![text.into()] }
    }

    pub fn lines(&self) -> &[String] {
        match self {
            Response::Reply { lines } => lines,
            _ => &[],
        }
    }
}
