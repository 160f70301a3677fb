#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Floating-point number
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// 0.5
    /// ```
    Float(f64),

    /// Unsigned integer; the parser applies a leading `-`
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 0
    /// ```
    Integer(u64),

    /// String literal enclosed in double or single quotes
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// 'item #1'
    /// ```
    String(String),

    /// Boolean values
    Boolean(bool),

    /// Null value
    Null,

    // Identifiers
    /// Variable, function, member or parameter name
    ///
    /// Must start with letter or underscore, followed by letters, digits, or underscores.
    ///
    /// # Examples
    /// ```text
    /// page
    /// min_age
    /// _internal
    /// ```
    Identifier(String),

    // Postfix
    /// Member access (`.`)
    Dot,

    /// Null-safe member access (`?.`)
    QuestionDot,

    /// Left bracket for subscripts and array literals
    LBracket,

    /// Right bracket
    RBracket,

    /// Left parenthesis for grouping, calls and closure parameters
    LParen,

    /// Right parenthesis
    RParen,

    /// Comma separating arguments, array items and closure parameters
    Comma,

    // Conditionals
    /// Ternary condition marker (`?`)
    Question,

    /// Ternary branch separator (`:`)
    Colon,

    /// Elvis operator (`?:`)
    ///
    /// # Examples
    /// ```text
    /// page.subtitle ?: page.title
    /// ```
    Elvis,

    /// Null-coalescing operator (`??`)
    Coalesce,

    /// Closure arrow (`=>`)
    Arrow,

    // Comparison
    /// Loose equality (`==`)
    EqEq,

    /// Strict equality (`===`)
    EqEqEq,

    /// Loose inequality (`!=`)
    NotEq,

    /// Strict inequality (`!==`)
    NotEqEq,

    /// Less than
    Lt,

    /// Less than or equal
    LtEq,

    /// Greater than
    Gt,

    /// Greater than or equal
    GtEq,

    // Arithmetic
    /// Addition
    Plus,

    /// Subtraction or negation
    Minus,

    /// Multiplication
    Star,

    /// Division
    Slash,

    /// Modulo
    Percent,

    // Logical
    /// Logical AND (`&&` or the word `and`)
    ///
    /// # Examples
    /// ```text
    /// user.age > 18 && user.verified
    /// user.age > 18 and user.verified
    /// ```
    AndAnd,

    /// Logical OR (`||` or the word `or`)
    OrOr,

    /// Logical NOT (`!`)
    Bang,

    /// End of input
    Eof,
}

/// A token together with the character offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}
