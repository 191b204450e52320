//! Control-channel replies.
//!
//! Every recognized command produces exactly one terminal reply; transfer
//! commands additionally emit a `150` preliminary one. Codes follow the
//! RFC 959 families: 1xx preliminary, 2xx success, 3xx more input needed,
//! 4xx transient failure, 5xx permanent failure.

/// A single reply line: three-digit code plus human-readable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub text: String,
}

impl Reply {
    pub fn new(code: u16, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
        }
    }

    /// Wire form, CRLF terminated.
    pub fn to_wire(&self) -> String {
        format!("{} {}\r\n", self.code, self.text)
    }

    pub fn not_logged_in() -> Self {
        Self::new(530, "Not logged in")
    }

    pub fn no_data_connection() -> Self {
        Self::new(425, "Can't open data connection")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_is_code_space_text_crlf() {
        assert_eq!(Reply::new(220, "rsftpd ready").to_wire(), "220 rsftpd ready\r\n");
        assert_eq!(Reply::not_logged_in().to_wire(), "530 Not logged in\r\n");
    }
}
