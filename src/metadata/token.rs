use std::fmt;

/// Identity of a registered type or method.
///
/// Tokens consist of a 32-bit value where:
/// - The high byte (bits 24-31) indicates the table
/// - The low 24 bits (bits 0-23) indicate the row index within that table
///
/// | Table | Contents |
/// |-------|----------|
/// | [`Token::TYPE_DEF`] | Interfaces, classes and value types defined through the builders |
/// | [`Token::METHOD_DEF`] | Methods and property/indexer accessors |
/// | [`Token::ARTIFICIAL`] | Synthesized lazy proxy types |
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u32);

impl Token {
    /// Table of defined types
    pub const TYPE_DEF: u8 = 0x02;
    /// Table of defined methods
    pub const METHOD_DEF: u8 = 0x06;
    /// Table of types generated at run time
    pub const ARTIFICIAL: u8 = 0xF0;

    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a token from a table id and a row index
    #[must_use]
    pub fn from_parts(table: u8, row: u32) -> Self {
        Token((u32::from(table) << 24) | (row & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}
