//! Predeclared identifiers and package `unsafe`.

use logstyle_core::symbols::{
    BasicKind, Builtin, Named, Object, ObjectKind, PackageId, Signature, Type, TypeId,
};
use logstyle_core::{ObjectId, Pos};

use super::{Checker, Status};

const BASIC_NAMES: &[(&str, BasicKind)] = &[
    ("bool", BasicKind::Bool),
    ("int", BasicKind::Int),
    ("int8", BasicKind::Int8),
    ("int16", BasicKind::Int16),
    ("int32", BasicKind::Int32),
    ("int64", BasicKind::Int64),
    ("uint", BasicKind::Uint),
    ("uint8", BasicKind::Uint8),
    ("uint16", BasicKind::Uint16),
    ("uint32", BasicKind::Uint32),
    ("uint64", BasicKind::Uint64),
    ("uintptr", BasicKind::Uintptr),
    ("float32", BasicKind::Float32),
    ("float64", BasicKind::Float64),
    ("complex64", BasicKind::Complex64),
    ("complex128", BasicKind::Complex128),
    ("string", BasicKind::String),
    ("byte", BasicKind::Uint8),
    ("rune", BasicKind::Int32),
];

const ALL_KINDS: &[BasicKind] = &[
    BasicKind::Bool,
    BasicKind::Int,
    BasicKind::Int8,
    BasicKind::Int16,
    BasicKind::Int32,
    BasicKind::Int64,
    BasicKind::Uint,
    BasicKind::Uint8,
    BasicKind::Uint16,
    BasicKind::Uint32,
    BasicKind::Uint64,
    BasicKind::Uintptr,
    BasicKind::Float32,
    BasicKind::Float64,
    BasicKind::Complex64,
    BasicKind::Complex128,
    BasicKind::String,
    BasicKind::UnsafePointer,
    BasicKind::UntypedBool,
    BasicKind::UntypedInt,
    BasicKind::UntypedRune,
    BasicKind::UntypedFloat,
    BasicKind::UntypedComplex,
    BasicKind::UntypedString,
    BasicKind::UntypedNil,
];

const BUILTINS: &[(&str, Builtin)] = &[
    ("append", Builtin::Append),
    ("cap", Builtin::Cap),
    ("clear", Builtin::Clear),
    ("close", Builtin::Close),
    ("complex", Builtin::Complex),
    ("copy", Builtin::Copy),
    ("delete", Builtin::Delete),
    ("imag", Builtin::Imag),
    ("len", Builtin::Len),
    ("make", Builtin::Make),
    ("max", Builtin::Max),
    ("min", Builtin::Min),
    ("new", Builtin::New),
    ("panic", Builtin::Panic),
    ("print", Builtin::Print),
    ("println", Builtin::Println),
    ("real", Builtin::Real),
    ("recover", Builtin::Recover),
];

const UNSAFE_BUILTINS: &[(&str, Builtin)] = &[
    ("Add", Builtin::Add),
    ("Alignof", Builtin::Alignof),
    ("Offsetof", Builtin::Offsetof),
    ("Sizeof", Builtin::Sizeof),
    ("Slice", Builtin::Slice),
    ("SliceData", Builtin::SliceData),
    ("String", Builtin::String),
    ("StringData", Builtin::StringData),
];

impl Checker {
    fn universe_object(&mut self, name: &str, kind: ObjectKind, ty: Option<TypeId>) -> ObjectId {
        let obj = self.symbols.add_object(Object {
            name: name.to_string(),
            kind,
            pkg: None,
            ty,
            pos: Pos::NONE,
        });
        self.universe.insert(name.to_string(), obj);
        obj
    }

    pub(super) fn install_universe(&mut self) {
        for kind in ALL_KINDS {
            let ty = self.symbols.add_type(Type::Basic(*kind));
            self.basics.insert(*kind, ty);
        }
        for (name, kind) in BASIC_NAMES {
            let ty = self.basic(*kind);
            self.universe_object(name, ObjectKind::TypeName, Some(ty));
        }

        // error is a named interface with a single method.
        let error_obj = self.universe_object("error", ObjectKind::TypeName, None);
        let error = self.symbols.add_type(Type::Named(Named {
            obj: error_obj,
            underlying: None,
            methods: Vec::new(),
        }));
        let string = self.basic(BasicKind::String);
        let sig = self.symbols.add_type(Type::Signature(Signature {
            recv: Some(error),
            params: Vec::new(),
            results: vec![string],
            variadic: false,
        }));
        let method = self.symbols.add_object(Object {
            name: "Error".into(),
            kind: ObjectKind::Func,
            pkg: None,
            ty: Some(sig),
            pos: Pos::NONE,
        });
        let iface = self.symbols.add_type(Type::Interface {
            methods: vec![method],
            embedded: Vec::new(),
        });
        if let Type::Named(named) = self.symbols.ty_mut(error) {
            named.underlying = Some(iface);
        }
        self.symbols.object_mut(error_obj).ty = Some(error);

        self.empty_interface = self.symbols.add_type(Type::Interface {
            methods: Vec::new(),
            embedded: Vec::new(),
        });
        self.universe_object("any", ObjectKind::TypeName, Some(self.empty_interface));

        let comparable_obj = self.universe_object("comparable", ObjectKind::TypeName, None);
        let comparable = self.symbols.add_type(Type::Named(Named {
            obj: comparable_obj,
            underlying: Some(self.empty_interface),
            methods: Vec::new(),
        }));
        self.symbols.object_mut(comparable_obj).ty = Some(comparable);

        let untyped_bool = self.basic(BasicKind::UntypedBool);
        self.universe_object("true", ObjectKind::Const, Some(untyped_bool));
        self.universe_object("false", ObjectKind::Const, Some(untyped_bool));
        let untyped_int = self.basic(BasicKind::UntypedInt);
        self.universe_object("iota", ObjectKind::Const, Some(untyped_int));
        let untyped_nil = self.basic(BasicKind::UntypedNil);
        self.universe_object("nil", ObjectKind::Nil, Some(untyped_nil));

        for (name, builtin) in BUILTINS {
            self.universe_object(name, ObjectKind::Builtin(*builtin), None);
        }
    }

    pub(super) fn install_unsafe(&mut self) -> PackageId {
        let pkg = self.new_package("unsafe", "unsafe", None, Status::Loaded);
        let pointer = self.basic(BasicKind::UnsafePointer);
        let mut members = vec![("Pointer", ObjectKind::TypeName, Some(pointer))];
        members.extend(
            UNSAFE_BUILTINS
                .iter()
                .map(|(name, builtin)| (*name, ObjectKind::Builtin(*builtin), None)),
        );
        for (name, kind, ty) in members {
            let obj = self.symbols.add_object(Object {
                name: name.to_string(),
                kind,
                pkg: Some(pkg),
                ty,
                pos: Pos::NONE,
            });
            self.pkg_mut(pkg).members.insert(name.to_string(), obj);
        }
        pkg
    }
}
