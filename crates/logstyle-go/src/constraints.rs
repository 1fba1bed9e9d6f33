//! Build constraints: file-name `_GOOS`/`_GOARCH` suffixes, `//go:build`
//! expressions and legacy `// +build` lines.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::env::GoEnv;

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

/// A malformed `//go:build` line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parsing //go:build line: {message}")]
pub struct ConstraintError {
    /// What went wrong.
    pub message: String,
}

impl ConstraintError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parsed build constraint expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildExpr {
    /// A single tag.
    Tag(String),
    /// `!x`
    Not(Box<BuildExpr>),
    /// `x && y`
    And(Box<BuildExpr>, Box<BuildExpr>),
    /// `x || y`
    Or(Box<BuildExpr>, Box<BuildExpr>),
}

impl BuildExpr {
    /// Evaluates the expression, asking `tag` whether each tag is satisfied.
    pub fn eval(&self, tag: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Self::Tag(name) => tag(name),
            Self::Not(x) => !x.eval(tag),
            Self::And(x, y) => x.eval(tag) && y.eval(tag),
            Self::Or(x, y) => x.eval(tag) || y.eval(tag),
        }
    }

    /// Parses the text after `//go:build`.
    ///
    /// # Errors
    ///
    /// Returns an error for empty or malformed expressions.
    pub fn parse(text: &str) -> Result<Self, ConstraintError> {
        let mut parser = ExprParser {
            chars: text.char_indices().peekable(),
            text,
        };
        let expr = parser.or()?;
        parser.skip_space();
        match parser.chars.peek() {
            None => Ok(expr),
            Some(&(_, c)) => Err(ConstraintError::new(format!("unexpected {c:?}"))),
        }
    }

    /// Parses the text after one `// +build` line.
    ///
    /// Space-separated options are alternatives; comma-separated terms must
    /// all hold. Returns `None` for a line with no options.
    #[must_use]
    pub fn parse_plus_build(text: &str) -> Option<Self> {
        text.split_whitespace()
            .filter_map(|option| {
                option
                    .split(',')
                    .map(|term| match term.strip_prefix('!') {
                        Some(tag) if valid_tag(tag) => Some(Self::Not(Box::new(Self::Tag(tag.into())))),
                        Some(_) => None,
                        None if valid_tag(term) => Some(Self::Tag(term.into())),
                        None => None,
                    })
                    .collect::<Option<Vec<_>>>()?
                    .into_iter()
                    .reduce(|x, y| Self::And(Box::new(x), Box::new(y)))
            })
            .reduce(|x, y| Self::Or(Box::new(x), Box::new(y)))
    }
}

fn valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

struct ExprParser<'a> {
    chars: Peekable<CharIndices<'a>>,
    text: &'a str,
}

impl ExprParser<'_> {
    fn skip_space(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_space();
        let Some(&(start, _)) = self.chars.peek() else {
            return false;
        };
        if !self.text[start..].starts_with(token) {
            return false;
        }
        for _ in token.chars() {
            self.chars.next();
        }
        true
    }

    fn or(&mut self) -> Result<BuildExpr, ConstraintError> {
        let mut expr = self.and()?;
        while self.eat("||") {
            expr = BuildExpr::Or(Box::new(expr), Box::new(self.and()?));
        }
        Ok(expr)
    }

    fn and(&mut self) -> Result<BuildExpr, ConstraintError> {
        let mut expr = self.not()?;
        while self.eat("&&") {
            expr = BuildExpr::And(Box::new(expr), Box::new(self.not()?));
        }
        Ok(expr)
    }

    fn not(&mut self) -> Result<BuildExpr, ConstraintError> {
        if self.eat("!") {
            return Ok(BuildExpr::Not(Box::new(self.not()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<BuildExpr, ConstraintError> {
        if self.eat("(") {
            let expr = self.or()?;
            if !self.eat(")") {
                return Err(ConstraintError::new("missing )"));
            }
            return Ok(expr);
        }
        self.skip_space();
        let mut tag = String::new();
        while let Some((_, c)) = self
            .chars
            .next_if(|&(_, c)| c.is_alphanumeric() || c == '_' || c == '.')
        {
            tag.push(c);
        }
        if tag.is_empty() {
            return Err(match self.chars.peek() {
                Some(&(_, c)) => ConstraintError::new(format!("unexpected {c:?}")),
                None => ConstraintError::new("unexpected end of expression"),
            });
        }
        Ok(BuildExpr::Tag(tag))
    }
}

/// Constraints found in a file header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileConstraints {
    /// The `//go:build` expression.
    pub go_build: Option<BuildExpr>,
    /// `// +build` lines, each one required.
    pub plus_build: Vec<BuildExpr>,
}

impl FileConstraints {
    /// Scans the comments preceding the package clause.
    ///
    /// `// +build` lines only count inside a comment group that is followed
    /// by a blank line; they are ignored when a `//go:build` line exists.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed `//go:build` expression.
    pub fn scan(source: &str) -> Result<Self, ConstraintError> {
        let mut constraints = Self::default();
        let mut pending: Vec<BuildExpr> = Vec::new();
        let mut in_block = false;

        for line in source.lines() {
            let line = line.trim();
            if in_block {
                if let Some(end) = line.find("*/") {
                    in_block = false;
                    if !line[end + 2..].trim().is_empty() {
                        break;
                    }
                }
                continue;
            }
            if line.is_empty() {
                constraints.plus_build.append(&mut pending);
                continue;
            }
            if let Some(comment) = line.strip_prefix("//") {
                if let Some(expr) = comment.strip_prefix("go:build") {
                    if expr.starts_with(char::is_whitespace) && constraints.go_build.is_none() {
                        constraints.go_build = Some(BuildExpr::parse(expr)?);
                    }
                } else if let Some(rest) = comment.trim_start().strip_prefix("+build") {
                    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                        pending.extend(BuildExpr::parse_plus_build(rest));
                    }
                }
                continue;
            }
            if let Some(rest) = line.strip_prefix("/*") {
                pending.clear();
                match rest.find("*/") {
                    Some(end) if rest[end + 2..].trim().is_empty() => {}
                    Some(_) => break,
                    None => in_block = true,
                }
                continue;
            }
            break;
        }
        Ok(constraints)
    }

    /// Evaluates the constraints against `ctx`.
    #[must_use]
    pub fn matches(&self, ctx: &BuildContext) -> bool {
        let tag = |name: &str| ctx.tag_satisfied(name);
        match &self.go_build {
            Some(expr) => expr.eval(&tag),
            None => self.plus_build.iter().all(|expr| expr.eval(&tag)),
        }
    }
}

/// The tags a build satisfies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    goos: String,
    goarch: String,
    go_minor: u32,
    extra_tags: Vec<String>,
}

impl BuildContext {
    /// Creates a context for the target platform of `env`.
    #[must_use]
    pub fn new(env: &GoEnv, extra_tags: &[String]) -> Self {
        Self {
            goos: env.goos.clone(),
            goarch: env.goarch.clone(),
            go_minor: env.go_minor,
            extra_tags: extra_tags.to_vec(),
        }
    }

    /// Returns true if `tag` holds for this build.
    #[must_use]
    pub fn tag_satisfied(&self, tag: &str) -> bool {
        if tag == self.goos || tag == self.goarch || tag == "gc" {
            return true;
        }
        if self.extra_tags.iter().any(|t| t == tag) {
            return true;
        }
        match tag {
            "unix" => UNIX_OS.contains(&self.goos.as_str()),
            "linux" => self.goos == "android",
            "darwin" => self.goos == "ios",
            "solaris" => self.goos == "illumos",
            _ => tag
                .strip_prefix("go1.")
                .and_then(|minor| minor.parse::<u32>().ok())
                .is_some_and(|minor| minor <= self.go_minor),
        }
    }

    /// Applies the `name_GOOS_GOARCH.go` naming convention.
    ///
    /// `unix` is not recognized as a file-name suffix.
    #[must_use]
    pub fn file_name_matches(&self, file_name: &str) -> bool {
        let stem = file_name.strip_suffix(".go").unwrap_or(file_name);
        let stem = stem.strip_suffix("_test").unwrap_or(stem);
        let Some(first) = stem.find('_') else {
            return true;
        };
        let parts: Vec<&str> = stem[first..].split('_').collect();
        let n = parts.len();
        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.tag_satisfied(parts[n - 2]) && self.tag_satisfied(parts[n - 1]);
        }
        let last = parts[n - 1];
        if KNOWN_OS.contains(&last) || KNOWN_ARCH.contains(&last) {
            return self.tag_satisfied(last);
        }
        true
    }

    /// Returns true if a file with this name and content is part of the build.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed `//go:build` line.
    pub fn includes(&self, file_name: &str, source: &str) -> Result<bool, ConstraintError> {
        if !self.file_name_matches(file_name) {
            return Ok(false);
        }
        Ok(FileConstraints::scan(source)?.matches(self))
    }
}
