//! Incremental server-sent-events decoder.

/// Turns raw body chunks into complete `data:` payloads.
///
/// Chunks may split lines or UTF-8 sequences anywhere; only complete lines are
/// decoded. Multi-line `data:` fields are joined with `\n`, comments and other
/// fields are dropped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed bytes and drain every payload completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.extend_from_slice(bytes);
        let mut payloads = Vec::new();

        let mut start = 0;
        while let Some(len) = buffer[start..].iter().position(|&b| b == b'\n') {
            self.take_line(&buffer[start..start + len], &mut payloads);
            start += len + 1;
        }

        // Keep only the unterminated tail.
        buffer.drain(..start);
        self.buffer = buffer;
        payloads
    }

    /// Flush whatever the body ended with.
    pub fn finish(&mut self) -> Vec<String> {
        let mut payloads = Vec::new();
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.take_line(&line, &mut payloads);
        }
        self.dispatch(&mut payloads);
        payloads
    }

    fn take_line(&mut self, line: &[u8], payloads: &mut Vec<String>) {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            self.dispatch(payloads);
            return;
        }

        let line = String::from_utf8_lossy(line);
        if let Some(value) = line.strip_prefix("data:") {
            self.data
                .push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
    }

    fn dispatch(&mut self, payloads: &mut Vec<String>) {
        if !self.data.is_empty() {
            payloads.push(self.data.join("\n"));
            self.data.clear();
        }
    }
}
