//! Minimal `go.mod` reader: module path, requirements and replacements.

use std::path::{Path, PathBuf};

/// A parsed `go.mod` file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GoMod {
    /// Directory containing the `go.mod` file.
    pub root: PathBuf,
    /// `module` path.
    pub module: String,
    /// `require` entries as `(module, version)`.
    pub requires: Vec<(String, String)>,
    /// `replace` entries.
    pub replaces: Vec<Replace>,
}

/// One `replace` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    /// Replaced module path.
    pub old: String,
    /// Replaced version, if restricted to one.
    pub old_version: Option<String>,
    /// Replacement.
    pub new: Replacement,
}

/// Right-hand side of a `replace` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// A directory, resolved against the `go.mod` directory.
    Dir(PathBuf),
    /// Another module version.
    Module {
        /// Module path.
        path: String,
        /// Version.
        version: String,
    },
}

impl GoMod {
    /// Parses `go.mod` content; unknown directives are ignored.
    #[must_use]
    pub fn parse(root: impl Into<PathBuf>, content: &str) -> Self {
        let mut gomod = Self {
            root: root.into(),
            ..Self::default()
        };
        let mut block: Option<String> = None;

        for raw in content.lines() {
            let line = raw.find("//").map_or(raw, |i| &raw[..i]).trim();
            if line.is_empty() {
                continue;
            }
            if let Some(verb) = &block {
                if line == ")" {
                    block = None;
                } else {
                    gomod.directive(verb, line);
                }
                continue;
            }
            let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let rest = rest.trim();
            if rest == "(" {
                block = Some(verb.to_string());
            } else {
                gomod.directive(verb, rest);
            }
        }
        gomod
    }

    /// Reads `<root>/go.mod`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read(root: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(root.join("go.mod"))?;
        Ok(Self::parse(root, &content))
    }

    fn directive(&mut self, verb: &str, args: &str) {
        let words: Vec<String> = args.split_whitespace().map(unquote).collect();
        match (verb, words.as_slice()) {
            ("module", [path, ..]) => self.module.clone_from(path),
            ("require", [path, version, ..]) => {
                self.requires.push((path.clone(), version.clone()));
            }
            ("replace", _) => {
                if let Some(replace) = self.parse_replace(&words) {
                    self.replaces.push(replace);
                }
            }
            _ => {}
        }
    }

    fn parse_replace(&self, words: &[String]) -> Option<Replace> {
        let arrow = words.iter().position(|w| w == "=>")?;
        let (lhs, rhs) = (&words[..arrow], &words[arrow + 1..]);
        let old = lhs.first()?.clone();
        let old_version = lhs.get(1).cloned();
        let new = match rhs {
            [path] if is_local_path(path) => Replacement::Dir(self.root.join(path)),
            [path, version] => Replacement::Module {
                path: path.clone(),
                version: version.clone(),
            },
            _ => return None,
        };
        Some(Replace {
            old,
            old_version,
            new,
        })
    }

    /// The version of `module` this file requires.
    #[must_use]
    pub fn required_version(&self, module: &str) -> Option<&str> {
        self.requires
            .iter()
            .find(|(path, _)| path == module)
            .map(|(_, version)| version.as_str())
    }

    /// The replacement for `module`, if any.
    #[must_use]
    pub fn replacement(&self, module: &str) -> Option<&Replacement> {
        let version = self.required_version(module);
        self.replaces
            .iter()
            .find(|r| {
                r.old == module
                    && r.old_version
                        .as_deref()
                        .map_or(true, |v| Some(v) == version)
            })
            .map(|r| &r.new)
    }

    /// Splits `import_path` into the directory under this module, if the
    /// path belongs to it.
    #[must_use]
    pub fn dir_of(&self, import_path: &str) -> Option<PathBuf> {
        if self.module.is_empty() {
            return None;
        }
        if import_path == self.module {
            return Some(self.root.clone());
        }
        let rel = import_path
            .strip_prefix(self.module.as_str())?
            .strip_prefix('/')?;
        Some(self.root.join(rel))
    }
}

fn unquote(word: &str) -> String {
    word.strip_prefix('"')
        .and_then(|w| w.strip_suffix('"'))
        .or_else(|| word.strip_prefix('`').and_then(|w| w.strip_suffix('`')))
        .unwrap_or(word)
        .to_string()
}

fn is_local_path(path: &str) -> bool {
    path.starts_with("./") || path.starts_with("../") || Path::new(path).is_absolute()
}

/// Finds the directory of the nearest `go.mod` at or above `dir`.
#[must_use]
pub fn find_module_root(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .find(|d| d.join("go.mod").is_file())
        .map(Path::to_path_buf)
}

/// Applies the module cache's case escaping: every upper-case letter
/// becomes `!` followed by its lower-case form.
#[must_use]
pub fn escape_module_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            out.push('!');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Orders module versions (`v1.2.3`, `v1.2.3-pre`, `v2.0.0+incompatible`).
///
/// Releases sort after their pre-releases; pre-release suffixes compare
/// lexically.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    fn split(version: &str) -> (Vec<u64>, Option<&str>) {
        let version = version.strip_prefix('v').unwrap_or(version);
        let version = version.split('+').next().unwrap_or(version);
        let (core, pre) = match version.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (version, None),
        };
        let numbers = core.split('.').map(|n| n.parse().unwrap_or(0)).collect();
        (numbers, pre)
    }
    let (a_core, a_pre) = split(a);
    let (b_core, b_pre) = split(b);
    a_core.cmp(&b_core).then_with(|| match (a_pre, b_pre) {
        (None, None) => std::cmp::Ordering::Equal,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (Some(_), None) => std::cmp::Ordering::Less,
        (Some(x), Some(y)) => x.cmp(y),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    const GO_MOD: &str = r#"
module example.com/app // main module

go 1.22

require go.uber.org/zap v1.27.0

require (
	go.uber.org/multierr v1.11.0 // indirect
	"github.com/BurntSushi/toml" v1.3.2
)

replace (
	example.com/lib => ../lib
	go.uber.org/multierr v1.11.0 => go.uber.org/multierr v1.10.0
)
"#;

    #[test]
    fn parses_directives() {
        let gomod = GoMod::parse("/src/app", GO_MOD);
        assert_eq!(gomod.module, "example.com/app");
        assert_eq!(gomod.required_version("go.uber.org/zap"), Some("v1.27.0"));
        assert_eq!(
            gomod.required_version("github.com/BurntSushi/toml"),
            Some("v1.3.2")
        );
        assert_eq!(gomod.replaces.len(), 2);
    }

    #[test]
    fn replacements() {
        let gomod = GoMod::parse("/src/app", GO_MOD);
        assert_eq!(
            gomod.replacement("example.com/lib"),
            Some(&Replacement::Dir(PathBuf::from("/src/app/../lib")))
        );
        assert_eq!(
            gomod.replacement("go.uber.org/multierr"),
            Some(&Replacement::Module {
                path: "go.uber.org/multierr".into(),
                version: "v1.10.0".into(),
            })
        );
        assert_eq!(gomod.replacement("go.uber.org/zap"), None);
    }

    #[test]
    fn module_relative_dirs() {
        let gomod = GoMod::parse("/src/app", GO_MOD);
        assert_eq!(
            gomod.dir_of("example.com/app/internal/log"),
            Some(PathBuf::from("/src/app/internal/log"))
        );
        assert_eq!(
            gomod.dir_of("example.com/app"),
            Some(PathBuf::from("/src/app"))
        );
        assert_eq!(gomod.dir_of("example.com/application"), None);
    }

    #[test]
    fn escapes_upper_case() {
        assert_eq!(
            escape_module_path("github.com/BurntSushi/toml"),
            "github.com/!burnt!sushi/toml"
        );
    }

    #[test]
    fn version_order() {
        assert_eq!(compare_versions("v1.27.0", "v1.9.0"), Ordering::Greater);
        assert_eq!(compare_versions("v1.0.0-rc1", "v1.0.0"), Ordering::Less);
        assert_eq!(
            compare_versions("v2.0.0+incompatible", "v2.0.0"),
            Ordering::Equal
        );
    }
}
