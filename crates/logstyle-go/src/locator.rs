//! Import path resolution: vendor directories, the enclosing module,
//! `GOROOT`, `GOPATH` and the module cache.
//!
//! The cgo pseudo-package `C` and `unsafe` never reach the locator; the
//! checker handles them itself.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::debug;

use crate::env::GoEnv;
use crate::gomod::{self, GoMod, Replacement};

/// A located package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    /// Import path the package is known by, including any vendor prefix.
    pub path: String,
    /// Directory holding its files.
    pub dir: PathBuf,
}

/// Resolves import paths against the file system.
#[derive(Debug)]
pub struct Locator {
    env: GoEnv,
    main: Option<Rc<GoMod>>,
    modules: HashMap<PathBuf, Option<Rc<GoMod>>>,
}

impl Locator {
    /// Creates a locator whose main module is the one enclosing `main_dir`.
    #[must_use]
    pub fn new(env: GoEnv, main_dir: &Path) -> Self {
        let mut locator = Self {
            env,
            main: None,
            modules: HashMap::new(),
        };
        locator.main = locator.module_of(main_dir);
        if let Some(main) = &locator.main {
            debug!("main module {} at {}", main.module, main.root.display());
        }
        locator
    }

    /// The toolchain environment.
    #[must_use]
    pub fn env(&self) -> &GoEnv {
        &self.env
    }

    fn module_of(&mut self, dir: &Path) -> Option<Rc<GoMod>> {
        if let Some(cached) = self.modules.get(dir) {
            return cached.clone();
        }
        let found = gomod::find_module_root(dir)
            .and_then(|root| GoMod::read(&root).ok())
            .map(Rc::new);
        self.modules.insert(dir.to_path_buf(), found.clone());
        found
    }

    /// Computes the import path of the package in `dir`.
    ///
    /// Standard library directories map to their path below `$GOROOT/src`,
    /// module directories to the module path plus the relative directory,
    /// `GOPATH` directories to their path below `src`; anything else gets
    /// the `_/abs/dir` form.
    pub fn import_path_of(&mut self, dir: &Path) -> String {
        if let Some(rel) = self
            .env
            .goroot_src()
            .and_then(|src| dir.strip_prefix(src).ok().map(slash_path))
        {
            return rel;
        }
        if let Some(module) = self.module_of(dir) {
            if let Ok(rel) = dir.strip_prefix(&module.root) {
                let rel = slash_path(rel);
                return if rel.is_empty() {
                    module.module.clone()
                } else {
                    format!("{}/{rel}", module.module)
                };
            }
        }
        for gopath in &self.env.gopath {
            if let Ok(rel) = dir.strip_prefix(gopath.join("src")) {
                return slash_path(rel);
            }
        }
        format!("_{}", slash_path(dir))
    }

    /// Resolves `import_path` as imported from a package in `from_dir`.
    pub fn locate(&mut self, import_path: &str, from_dir: &Path) -> Option<Located> {
        let found = self
            .vendored(import_path, from_dir)
            .or_else(|| self.in_module(import_path, from_dir))
            .or_else(|| self.in_goroot(import_path))
            .or_else(|| self.in_gopath(import_path))
            .or_else(|| self.in_module_cache(import_path, from_dir));
        match &found {
            Some(located) => debug!(
                "import {import_path} -> {} ({})",
                located.path,
                located.dir.display()
            ),
            None => debug!("import {import_path} not found from {}", from_dir.display()),
        }
        found
    }

    fn vendored(&mut self, import_path: &str, from_dir: &Path) -> Option<Located> {
        let module_root = self.module_of(from_dir).map(|m| m.root.clone());
        let goroot_src = self.env.goroot_src();
        let candidates: Vec<PathBuf> = match &module_root {
            Some(root) => vec![root.clone()],
            None => from_dir.ancestors().map(Path::to_path_buf).collect(),
        };
        for parent in candidates {
            let dir = parent.join("vendor").join(import_path);
            if !has_go_files(&dir) {
                continue;
            }
            let plain = module_root.as_ref() == Some(&parent) && goroot_src.as_ref() != Some(&parent);
            let path = if plain {
                import_path.to_string()
            } else {
                match self.import_path_of(&parent) {
                    base if base.is_empty() => format!("vendor/{import_path}"),
                    base => format!("{base}/vendor/{import_path}"),
                }
            };
            return Some(Located { path, dir });
        }
        None
    }

    fn in_module(&mut self, import_path: &str, from_dir: &Path) -> Option<Located> {
        if let Some(dir) = self
            .module_of(from_dir)
            .and_then(|module| module.dir_of(import_path))
            .filter(|dir| dir.is_dir())
        {
            return Some(Located {
                path: import_path.to_string(),
                dir,
            });
        }
        let main = self.main.clone()?;
        module_prefixes(import_path).find_map(|(module, rel)| match main.replacement(module)? {
            Replacement::Dir(root) => Some(root.join(rel)).filter(|dir| dir.is_dir()).map(|dir| {
                Located {
                    path: import_path.to_string(),
                    dir,
                }
            }),
            Replacement::Module { .. } => None,
        })
    }

    fn in_goroot(&self, import_path: &str) -> Option<Located> {
        let dir = self.env.goroot_src()?.join(import_path);
        dir.is_dir().then(|| Located {
            path: import_path.to_string(),
            dir,
        })
    }

    fn in_gopath(&self, import_path: &str) -> Option<Located> {
        self.env.gopath.iter().find_map(|gopath| {
            let dir = gopath.join("src").join(import_path);
            dir.is_dir().then(|| Located {
                path: import_path.to_string(),
                dir,
            })
        })
    }

    fn in_module_cache(&mut self, import_path: &str, from_dir: &Path) -> Option<Located> {
        let cache = self.env.gomodcache.clone()?;
        let local = self.module_of(from_dir);
        for (module, rel) in module_prefixes(import_path) {
            let pinned = match self.main.as_ref().and_then(|m| m.replacement(module)) {
                Some(Replacement::Module { path, version }) => Some((path.clone(), version.clone())),
                Some(Replacement::Dir(_)) => continue,
                None => self
                    .main
                    .as_ref()
                    .and_then(|m| m.required_version(module))
                    .or_else(|| local.as_ref().and_then(|m| m.required_version(module)))
                    .map(|version| (module.to_string(), version.to_string())),
            };
            let root = match pinned {
                Some((path, version)) => {
                    cache.join(format!("{}@{version}", gomod::escape_module_path(&path)))
                }
                None => match highest_cached(&cache, module) {
                    Some(root) => root,
                    None => continue,
                },
            };
            let dir = if rel.is_empty() { root } else { root.join(rel) };
            if dir.is_dir() {
                return Some(Located {
                    path: import_path.to_string(),
                    dir,
                });
            }
        }
        None
    }
}

/// Yields `(module, rest)` splits of `path`, longest module first.
fn module_prefixes(path: &str) -> impl Iterator<Item = (&str, &str)> {
    let cuts = std::iter::once(path.len()).chain(path.match_indices('/').map(|(i, _)| i).rev());
    cuts.map(move |i| {
        let rest = path.get(i + 1..).unwrap_or("");
        (&path[..i], rest)
    })
}

fn highest_cached(cache: &Path, module: &str) -> Option<PathBuf> {
    let base = cache.join(gomod::escape_module_path(module));
    let pattern = format!("{}@*", glob::Pattern::escape(base.to_str()?));
    glob::glob(&pattern)
        .ok()?
        .filter_map(Result::ok)
        .filter(|p| p.is_dir())
        .filter_map(|p| {
            let version = p.file_name()?.to_str()?.rsplit_once('@')?.1.to_string();
            Some((version, p))
        })
        .max_by(|(a, _), (b, _)| gomod::compare_versions(a, b))
        .map(|(_, p)| p)
}

/// Returns true if `dir` contains at least one `.go` file.
#[must_use]
pub fn has_go_files(dir: &Path) -> bool {
    std::fs::read_dir(dir).is_ok_and(|entries| {
        entries.filter_map(Result::ok).any(|entry| {
            entry.path().extension().is_some_and(|ext| ext == "go")
                && entry.file_type().is_ok_and(|t| t.is_file())
        })
    })
}

fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            std::path::Component::RootDir | std::path::Component::Prefix(_) => Some(String::new()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, content).expect("write");
    }

    #[test]
    fn prefixes_longest_first() {
        let got: Vec<_> = module_prefixes("go.uber.org/zap/zapcore").collect();
        assert_eq!(
            got,
            vec![
                ("go.uber.org/zap/zapcore", ""),
                ("go.uber.org/zap", "zapcore"),
                ("go.uber.org", "zap/zapcore"),
            ]
        );
    }

    #[test]
    fn vendored_without_module_uses_gopath_style_path() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let app = tmp.path().join("app");
        write(&app.join("main.go"), "package main\n");
        write(
            &app.join("vendor/go.uber.org/zap/logger.go"),
            "package zap\n",
        );

        let mut locator = Locator::new(GoEnv::default(), &app);
        let located = locator.locate("go.uber.org/zap", &app).expect("located");
        assert_eq!(located.dir, app.join("vendor/go.uber.org/zap"));
        assert!(located.path.starts_with('_'));
        assert!(located.path.ends_with("/app/vendor/go.uber.org/zap"));
    }

    #[test]
    fn module_root_vendor_uses_plain_path() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path();
        write(&root.join("go.mod"), "module example.com/app\n");
        write(&root.join("cmd/app/main.go"), "package main\n");
        write(&root.join("vendor/go.uber.org/zap/logger.go"), "package zap\n");

        let mut locator = Locator::new(GoEnv::default(), &root.join("cmd/app"));
        let located = locator
            .locate("go.uber.org/zap", &root.join("cmd/app"))
            .expect("located");
        assert_eq!(located.path, "go.uber.org/zap");
        assert_eq!(
            locator.import_path_of(&root.join("cmd/app")),
            "example.com/app/cmd/app"
        );
    }

    #[test]
    fn module_local_and_goroot_packages() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let goroot = tmp.path().join("goroot");
        write(&goroot.join("src/fmt/print.go"), "package fmt\n");
        let root = tmp.path().join("app");
        write(&root.join("go.mod"), "module example.com/app\n");
        write(&root.join("internal/log/log.go"), "package log\n");

        let env = GoEnv::default().with_goroot(&goroot);
        let mut locator = Locator::new(env, &root);
        let local = locator
            .locate("example.com/app/internal/log", &root)
            .expect("module package");
        assert_eq!(local.dir, root.join("internal/log"));

        let fmt = locator.locate("fmt", &root).expect("std package");
        assert_eq!(fmt.path, "fmt");
        assert_eq!(locator.import_path_of(&goroot.join("src/fmt")), "fmt");
        assert!(locator.locate("nope/missing", &root).is_none());
    }

    #[test]
    fn gopath_packages() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let gopath = tmp.path().join("gopath");
        write(&gopath.join("src/go.uber.org/zap/logger.go"), "package zap\n");
        let app = gopath.join("src/example.com/app");
        write(&app.join("main.go"), "package main\n");

        let env = GoEnv::default().with_gopath(&gopath);
        let mut locator = Locator::new(env, &app);
        assert_eq!(locator.import_path_of(&app), "example.com/app");
        let zap = locator.locate("go.uber.org/zap", &app).expect("located");
        assert_eq!(zap.dir, gopath.join("src/go.uber.org/zap"));
    }

    #[test]
    fn module_cache_prefers_required_version() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cache = tmp.path().join("modcache");
        for version in ["v1.26.0", "v1.27.0"] {
            write(
                &cache.join(format!("go.uber.org/zap@{version}/zapcore/core.go")),
                "package zapcore\n",
            );
        }
        write(
            &cache.join("github.com/!burnt!sushi/toml@v1.3.2/decode.go"),
            "package toml\n",
        );
        let app = tmp.path().join("app");
        write(
            &app.join("go.mod"),
            "module example.com/app\n\nrequire go.uber.org/zap v1.26.0\n",
        );

        let env = GoEnv::default().with_gomodcache(&cache);
        let mut locator = Locator::new(env, &app);
        let core = locator
            .locate("go.uber.org/zap/zapcore", &app)
            .expect("located");
        assert_eq!(core.dir, cache.join("go.uber.org/zap@v1.26.0/zapcore"));

        let toml = locator
            .locate("github.com/BurntSushi/toml", &app)
            .expect("highest cached");
        assert_eq!(toml.dir, cache.join("github.com/!burnt!sushi/toml@v1.3.2"));
    }
}
