//! Command parsing for the control channel.
//!
//! One newline-terminated line holds a case-insensitive verb and at most one
//! argument (the untrimmed remainder of the line). Verbs outside the
//! supported set parse to `UNKNOWN` and draw a 502 from the dispatcher.

/// An FTP command parsed from client input.
///
/// Commands that take an argument carry it as-is; handlers decide whether an
/// empty argument is acceptable. `XMKD`/`XRMD` fold into their modern
/// spellings at parse time.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    USER(String),
    PASS(String),
    QUIT,
    SYST,
    FEAT,
    OPTS(String),
    PWD,
    CWD(String),
    TYPE(String),
    PORT(String),
    EPRT(String),
    PASV,
    LIST,
    RETR(String),
    STOR(String),
    DELE(String),
    MKD(String),
    RMD(String),
    RNFR(String),
    RNTO(String),
    SIZE(String),
    UNKNOWN(String),
}

impl Command {
    /// Verbs that may only run after a successful login.
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Command::PWD
                | Command::CWD(_)
                | Command::PORT(_)
                | Command::EPRT(_)
                | Command::PASV
                | Command::LIST
                | Command::RETR(_)
                | Command::STOR(_)
                | Command::DELE(_)
                | Command::MKD(_)
                | Command::RMD(_)
                | Command::RNFR(_)
                | Command::RNTO(_)
                | Command::SIZE(_)
        )
    }
}

/// Parses a raw command line received from a client.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or("").to_ascii_uppercase();
    let arg = parts.next().unwrap_or("").trim().to_string();

    match verb.as_str() {
        "USER" => Command::USER(arg),
        "PASS" => Command::PASS(arg),
        "QUIT" => Command::QUIT,
        "SYST" => Command::SYST,
        "FEAT" => Command::FEAT,
        "OPTS" => Command::OPTS(arg),
        "PWD" => Command::PWD,
        "CWD" => Command::CWD(arg),
        "TYPE" => Command::TYPE(arg),
        "PORT" => Command::PORT(arg),
        "EPRT" => Command::EPRT(arg),
        "PASV" => Command::PASV,
        "LIST" => Command::LIST,
        "RETR" => Command::RETR(arg),
        "STOR" => Command::STOR(arg),
        "DELE" => Command::DELE(arg),
        "MKD" | "XMKD" => Command::MKD(arg),
        "RMD" | "XRMD" => Command::RMD(arg),
        "RNFR" => Command::RNFR(arg),
        "RNTO" => Command::RNTO(arg),
        "SIZE" => Command::SIZE(arg),
        _ => Command::UNKNOWN(verb),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_is_case_insensitive() {
        assert_eq!(parse_command("user alice\r\n"), Command::USER("alice".into()));
        assert_eq!(parse_command("QuIt\r\n"), Command::QUIT);
        assert_eq!(parse_command("pasv"), Command::PASV);
    }

    #[test]
    fn argument_is_remainder_of_line() {
        assert_eq!(
            parse_command("STOR some file.txt\r\n"),
            Command::STOR("some file.txt".into())
        );
        assert_eq!(parse_command("CWD   sub/dir \r\n"), Command::CWD("sub/dir".into()));
    }

    #[test]
    fn missing_argument_parses_to_empty() {
        assert_eq!(parse_command("RETR\r\n"), Command::RETR(String::new()));
    }

    #[test]
    fn extended_spellings_fold() {
        assert_eq!(parse_command("XMKD dir"), Command::MKD("dir".into()));
        assert_eq!(parse_command("XRMD dir"), Command::RMD("dir".into()));
    }

    #[test]
    fn unsupported_verb_is_unknown() {
        assert_eq!(parse_command("ABOR\r\n"), Command::UNKNOWN("ABOR".into()));
        assert_eq!(parse_command("NOOP"), Command::UNKNOWN("NOOP".into()));
    }

    #[test]
    fn auth_gating_covers_filesystem_and_data_verbs() {
        assert!(parse_command("PWD").requires_auth());
        assert!(parse_command("EPRT |1|127.0.0.1|2000|").requires_auth());
        assert!(parse_command("SIZE f").requires_auth());
        assert!(!parse_command("USER alice").requires_auth());
        assert!(!parse_command("TYPE I").requires_auth());
        assert!(!parse_command("FEAT").requires_auth());
    }
}
