//! Type checker for the analyzed package.
//!
//! The analyzed package is checked completely: every package-level
//! declaration is resolved and every function body is walked, binding each
//! identifier to its object and recording expression types. Dependencies
//! are loaded on demand without function bodies and only the declarations
//! actually reached are resolved. Errors in dependencies are tolerated;
//! the first error in the analyzed package aborts the load.

mod decls;
mod exprs;
mod lookup;
mod scope;
mod stmts;
mod types;
mod universe;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use logstyle_core::ast::{File, ImportSpec};
use logstyle_core::symbols::{
    BasicKind, Object, ObjectKind, Package, PackageId, SymbolTable, Type, TypeId,
};
use logstyle_core::{FileSet, LoadError, ObjectId, Pos};
use tracing::{debug, warn};

use crate::constraints::BuildContext;
use crate::loader::{self, PackageSources, SourceText};
use crate::locator::Locator;
use crate::lower::NodeIds;
use crate::parser::GoParser;

use self::scope::Scopes;

/// Loading state of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    /// Located; files not parsed yet.
    Unloaded,
    /// Parsed and collected.
    Loaded,
    /// Located but unusable; member lookups fail silently.
    Missing,
    /// The cgo pseudo-package; nothing is known about its members.
    Opaque,
}

#[derive(Debug)]
struct FileState {
    ast: Rc<File>,
    imports: HashMap<String, ObjectId>,
    dot_imports: Vec<PackageId>,
}

#[derive(Debug)]
struct PkgState {
    dir: Option<PathBuf>,
    status: Status,
    sources: Option<PackageSources>,
    /// Some files failed to parse.
    partial: bool,
    members: HashMap<String, ObjectId>,
    files: Vec<FileState>,
    /// Package-level objects, methods included, in declaration order.
    objects: Vec<ObjectId>,
}

impl PkgState {
    fn new(dir: Option<PathBuf>, status: Status) -> Self {
        Self {
            dir,
            status,
            sources: None,
            partial: false,
            members: HashMap::new(),
            files: Vec::new(),
            objects: Vec::new(),
        }
    }
}

/// Where a package-level object is declared.
#[derive(Debug, Clone, Copy)]
struct DeclRef {
    pkg: PackageId,
    file: usize,
    decl: usize,
    spec: usize,
    /// Position of the name within its spec.
    index: usize,
    /// Spec supplying type and values; differs from `spec` for constants
    /// that repeat the previous expression list.
    values_from: usize,
}

/// Package and file whose scope is current.
#[derive(Debug, Clone, Copy)]
struct Ctx {
    pkg: PackageId,
    file: usize,
}

/// Result of checking an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    /// A call without results.
    NoValue,
    /// A value, with its type when known.
    Value(Option<TypeId>),
    /// A type expression.
    Type(TypeId),
    /// An imported package name used without a selector.
    Package,
    /// A built-in function.
    Builtin(logstyle_core::symbols::Builtin),
}

impl Operand {
    fn ty(self) -> Option<TypeId> {
        match self {
            Self::Value(ty) => ty,
            _ => None,
        }
    }
}

pub(crate) struct Checker {
    parser: GoParser,
    locator: Locator,
    build: BuildContext,
    symbols: SymbolTable,
    fset: FileSet,
    ids: NodeIds,
    packages: Vec<PkgState>,
    by_path: HashMap<String, PackageId>,
    universe: HashMap<String, ObjectId>,
    unsafe_pkg: PackageId,
    decls: HashMap<ObjectId, DeclRef>,
    resolving: HashSet<ObjectId>,
    basics: HashMap<BasicKind, TypeId>,
    pointers: HashMap<TypeId, TypeId>,
    slices: HashMap<TypeId, TypeId>,
    invalid: TypeId,
    empty_interface: TypeId,
    scopes: Scopes,
    cur: Ctx,
    target: Option<PackageId>,
    error: Option<LoadError>,
    /// Result types of the enclosing function literals and declarations.
    results: Vec<Vec<TypeId>>,
    /// Named type an interface literal being resolved belongs to.
    iface_recv: Option<TypeId>,
}

impl Checker {
    pub(crate) fn new(locator: Locator, build: BuildContext) -> Result<Self, LoadError> {
        let mut symbols = SymbolTable::new();
        let invalid = symbols.add_type(Type::Invalid);
        let mut checker = Self {
            parser: GoParser::new()?,
            locator,
            build,
            symbols,
            fset: FileSet::new(),
            ids: NodeIds::default(),
            packages: Vec::new(),
            by_path: HashMap::new(),
            universe: HashMap::new(),
            unsafe_pkg: PackageId(0),
            decls: HashMap::new(),
            resolving: HashSet::new(),
            basics: HashMap::new(),
            pointers: HashMap::new(),
            slices: HashMap::new(),
            invalid,
            empty_interface: invalid,
            scopes: Scopes::default(),
            cur: Ctx {
                pkg: PackageId(0),
                file: 0,
            },
            target: None,
            error: None,
            results: Vec::new(),
            iface_recv: None,
        };
        checker.install_universe();
        checker.unsafe_pkg = checker.install_unsafe();
        Ok(checker)
    }

    /// Parses the analyzed package's files and collects its declarations.
    ///
    /// # Errors
    ///
    /// Returns the first syntax error, an unlocatable import, or a
    /// redeclaration.
    pub(crate) fn add_target(
        &mut self,
        path: &str,
        name: &str,
        dir: &Path,
        files: Vec<SourceText>,
    ) -> Result<PackageId, LoadError> {
        let pkg = self.new_package(path, name, Some(dir.to_path_buf()), Status::Loaded);
        self.target = Some(pkg);
        self.cur = Ctx { pkg, file: 0 };

        for source in files {
            let ast = self.parser.parse_file(
                &mut self.fset,
                &mut self.ids,
                &source.display_name,
                source.content,
                false,
            )?;
            self.pkg_mut(pkg).files.push(FileState {
                ast: Rc::new(ast),
                imports: HashMap::new(),
                dot_imports: Vec::new(),
            });
        }

        for file in 0..self.pkg(pkg).files.len() {
            let ast = Rc::clone(&self.pkg(pkg).files[file].ast);
            for spec in &ast.imports {
                self.bind_import(pkg, file, spec)?;
            }
        }
        self.collect(pkg);
        self.take_error()?;
        Ok(pkg)
    }

    /// Resolves every declaration of the analyzed package and checks all
    /// function bodies.
    ///
    /// # Errors
    ///
    /// Returns the first type error found in the analyzed package.
    pub(crate) fn check(&mut self) -> Result<(), LoadError> {
        let Some(target) = self.target else {
            return Ok(());
        };

        let objects = self.pkg(target).objects.clone();
        for obj in objects {
            self.resolve_declared(obj);
            self.take_error()?;
        }

        for file in 0..self.pkg(target).files.len() {
            let ast = Rc::clone(&self.pkg(target).files[file].ast);
            self.with_ctx(target, file, |c| c.check_bodies(&ast));
            self.take_error()?;
        }
        debug!(
            "checked {} ({} objects, {} types)",
            self.symbols.package(target).path,
            self.symbols.object_count(),
            self.symbols.type_count()
        );
        Ok(())
    }

    /// Hands over the position table, the bindings and the analyzed files.
    pub(crate) fn finish(mut self) -> (FileSet, SymbolTable, Vec<File>) {
        let files = match self.target {
            Some(target) => std::mem::take(&mut self.pkg_mut(target).files)
                .into_iter()
                .map(|f| Rc::try_unwrap(f.ast).unwrap_or_else(|rc| (*rc).clone()))
                .collect(),
            None => Vec::new(),
        };
        (self.fset, self.symbols, files)
    }

    fn take_error(&mut self) -> Result<(), LoadError> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn in_target(&self) -> bool {
        self.target == Some(self.cur.pkg)
    }

    /// Records a type error; only the first one in the analyzed package
    /// is kept.
    fn error_at(&mut self, pos: Pos, message: impl Into<String>) {
        if !self.in_target() || self.error.is_some() {
            return;
        }
        self.error = Some(LoadError::TypeCheck {
            position: self.fset.position(pos),
            message: message.into(),
        });
    }

    fn pkg(&self, id: PackageId) -> &PkgState {
        &self.packages[id.0 as usize]
    }

    fn pkg_mut(&mut self, id: PackageId) -> &mut PkgState {
        &mut self.packages[id.0 as usize]
    }

    fn new_package(
        &mut self,
        path: &str,
        name: &str,
        dir: Option<PathBuf>,
        status: Status,
    ) -> PackageId {
        let id = self.symbols.add_package(Package {
            path: path.to_string(),
            name: name.to_string(),
        });
        self.packages.push(PkgState::new(dir, status));
        self.by_path.insert(path.to_string(), id);
        id
    }

    /// Runs `f` with the scope of `file` in `pkg`, restoring the current
    /// scope afterwards.
    fn with_ctx<R>(&mut self, pkg: PackageId, file: usize, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved_ctx = std::mem::replace(&mut self.cur, Ctx { pkg, file });
        let saved_scopes = std::mem::take(&mut self.scopes);
        let saved_results = std::mem::take(&mut self.results);
        let saved_recv = self.iface_recv.take();
        let out = f(self);
        self.cur = saved_ctx;
        self.scopes = saved_scopes;
        self.results = saved_results;
        self.iface_recv = saved_recv;
        out
    }

    fn add_object(&mut self, name: &str, kind: ObjectKind, ty: Option<TypeId>, pos: Pos) -> ObjectId {
        self.symbols.add_object(Object {
            name: name.to_string(),
            kind,
            pkg: Some(self.cur.pkg),
            ty,
            pos,
        })
    }

    /// Binds one import spec in `file` of `pkg`.
    fn bind_import(&mut self, pkg: PackageId, file: usize, spec: &ImportSpec) -> Result<(), LoadError> {
        let imported = match spec.path.as_str() {
            "unsafe" => Some(self.unsafe_pkg),
            "C" => Some(self.cgo_package()),
            path => {
                let from = self.pkg(pkg).dir.clone().unwrap_or_default();
                self.locator
                    .locate(path, &from)
                    .map(|located| self.register(&located.path, located.dir))
            }
        };
        let Some(imported) = imported else {
            if self.target == Some(pkg) {
                return Err(LoadError::Import {
                    position: self.fset.position(spec.pos),
                    path: spec.path.clone(),
                });
            }
            debug!("unresolved import {} in {}", spec.path, self.symbols.package(pkg).path);
            return Ok(());
        };

        let local = match &spec.name {
            Some(ident) if ident.name == "_" => return Ok(()),
            Some(ident) if ident.name == "." => {
                self.pkg_mut(pkg).files[file].dot_imports.push(imported);
                return Ok(());
            }
            Some(ident) => ident.name.clone(),
            None => self.symbols.package(imported).name.clone(),
        };
        let obj = self.symbols.add_object(Object {
            name: local.clone(),
            kind: ObjectKind::PkgName(imported),
            pkg: Some(pkg),
            ty: None,
            pos: spec.pos,
        });
        if let Some(ident) = &spec.name {
            self.symbols.record_def(ident, obj);
        }
        self.pkg_mut(pkg).files[file].imports.insert(local, obj);
        Ok(())
    }

    fn cgo_package(&mut self) -> PackageId {
        match self.by_path.get("C") {
            Some(id) => *id,
            None => self.new_package("C", "C", None, Status::Opaque),
        }
    }

    /// Returns the package located at `dir` under `path`, registering it
    /// on first sight. The package name comes from its package clauses.
    fn register(&mut self, path: &str, dir: PathBuf) -> PackageId {
        if let Some(id) = self.by_path.get(path) {
            return *id;
        }
        match loader::read_package(&dir, &self.build, false) {
            Ok(sources) => {
                let name = sources.package.clone();
                let id = self.new_package(path, &name, Some(dir), Status::Unloaded);
                self.pkg_mut(id).sources = Some(sources);
                id
            }
            Err(err) => {
                debug!("cannot read {path}: {err}");
                let name = path.rsplit('/').next().unwrap_or(path).to_string();
                self.new_package(path, &name, Some(dir), Status::Missing)
            }
        }
    }

    /// Parses and collects a dependency on first use.
    fn ensure_loaded(&mut self, pkg: PackageId) {
        if self.pkg(pkg).status != Status::Unloaded {
            return;
        }
        self.pkg_mut(pkg).status = Status::Loaded;
        let Some(sources) = self.pkg_mut(pkg).sources.take() else {
            return;
        };
        debug!(
            "loading dependency {} ({} files)",
            self.symbols.package(pkg).path,
            sources.files.len()
        );

        for source in sources.files {
            match self.parser.parse_file(
                &mut self.fset,
                &mut self.ids,
                &source.display_name,
                source.content,
                true,
            ) {
                Ok(ast) => self.pkg_mut(pkg).files.push(FileState {
                    ast: Rc::new(ast),
                    imports: HashMap::new(),
                    dot_imports: Vec::new(),
                }),
                Err(err) => {
                    warn!("skipping dependency file {}: {err}", source.display_name);
                    self.pkg_mut(pkg).partial = true;
                }
            }
        }
        for file in 0..self.pkg(pkg).files.len() {
            let ast = Rc::clone(&self.pkg(pkg).files[file].ast);
            for spec in &ast.imports {
                // Unresolvable imports of dependencies are not errors.
                let _ = self.bind_import(pkg, file, spec);
            }
        }
        self.collect(pkg);
    }

    fn basic(&self, kind: BasicKind) -> TypeId {
        self.basics.get(&kind).copied().unwrap_or(self.invalid)
    }

    fn pointer(&mut self, elem: TypeId) -> TypeId {
        if let Some(ty) = self.pointers.get(&elem) {
            return *ty;
        }
        let ty = self.symbols.add_type(Type::Pointer(elem));
        self.pointers.insert(elem, ty);
        ty
    }

    fn slice(&mut self, elem: TypeId) -> TypeId {
        if let Some(ty) = self.slices.get(&elem) {
            return *ty;
        }
        let ty = self.symbols.add_type(Type::Slice(elem));
        self.slices.insert(elem, ty);
        ty
    }
}
