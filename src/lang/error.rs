use super::Column;

#[derive(Clone, PartialEq)]
pub struct Error {
    code: u16,
    line: Option<usize>,
    column: Column,
    address: Option<usize>,
    message: String,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
    ($err:ident, @$addr:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).at_address($addr)
    };
    ($err:ident, @$addr:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .at_address($addr)
            .message($msg)
    };
    ($err:ident, $line:expr, ..$col:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line($line)
            .in_column($col)
    };
    ($err:ident, $line:expr, ..$col:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line($line)
            .in_column($col)
            .message($msg)
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code: code as u16,
            line: None,
            column: 0..0,
            address: None,
            message: String::new(),
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code as u16
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn column(&self) -> Column {
        self.column.clone()
    }

    pub fn address(&self) -> Option<usize> {
        self.address
    }

    /// Process status reported for any fatal error.
    pub fn status(&self) -> i32 {
        -1
    }

    pub fn in_line(&self, line: usize) -> Error {
        debug_assert!(self.line.is_none());
        Error {
            line: Some(line),
            ..self.clone()
        }
    }

    pub fn in_column(&self, column: &Column) -> Error {
        debug_assert_eq!(self.column, 0..0);
        Error {
            column: column.clone(),
            ..self.clone()
        }
    }

    pub fn at_address(&self, address: usize) -> Error {
        Error {
            address: Some(address),
            ..self.clone()
        }
    }

    pub fn message(&self, message: &str) -> Error {
        debug_assert_eq!(self.message.len(), 0);
        Error {
            message: message.to_string(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    OutOfMemory = 7,
    DivisionByZero = 11,
    InternalError = 51,
    FileNotFound = 53,
    IoError = 57,
    UnterminatedLiteral = 70,
    UnrecognizedCharacter = 71,
    UnknownInstruction = 80,
    SegmentationFault = 81,
    StackOverflow = 82,
    StackUnderflow = 83,
    Interrupted = 84,
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self.to_string())
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let code_str = match self.code {
            7 => "OUT OF MEMORY",
            11 => "DIVISION BY ZERO",
            51 => "INTERNAL ERROR",
            53 => "FILE NOT FOUND",
            57 => "I/O ERROR",
            70 => "UNTERMINATED LITERAL",
            71 => "UNRECOGNIZED CHARACTER",
            80 => "UNKNOWN INSTRUCTION",
            81 => "SEGMENTATION FAULT",
            82 => "STACK OVERFLOW",
            83 => "STACK UNDERFLOW",
            84 => "BREAK",
            _ => "",
        };
        let mut suffix = String::new();
        if let Some(line) = self.line {
            suffix.push_str(&format!(" IN LINE {}", line));
        }
        if (0..0) != self.column {
            suffix.push_str(&format!(" ({}..{})", self.column.start, self.column.end));
        }
        if let Some(address) = self.address {
            suffix.push_str(&format!(" AT {}", address));
        }
        if !self.message.is_empty() {
            suffix.push_str(&format!("; {}", self.message));
        }
        if code_str.is_empty() {
            write!(f, "PROGRAM ERROR {}{}", self.code, suffix)
        } else {
            write!(f, "{}{}", code_str, suffix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = error!(UnknownInstruction, @7; "unknown instruction:99");
        assert_eq!(e.to_string(), "UNKNOWN INSTRUCTION AT 7; unknown instruction:99");
        let e = error!(UnterminatedLiteral, 3, ..&(4..9));
        assert_eq!(e.to_string(), "UNTERMINATED LITERAL IN LINE 3 (4..9)");
        assert!(e.is(ErrorCode::UnterminatedLiteral));
        assert!(e.status() < 0);
    }
}
