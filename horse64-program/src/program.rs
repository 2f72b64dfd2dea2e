//! The `Program` table itself.
//!
//! Every registration method is append-only and, on failure, leaves
//! the table exactly as it was before the call: each method validates everything it needs before
//! pushing anything, so there is nothing to roll back.

use std::collections::HashMap;

use crate::bytecode::{FuncBody, InstrBuf, NativeFn};
use crate::debug::DebugSymbols;
use crate::error::ProgramError;
use crate::ids::{ClassId, FileUriId, FuncId, NameId, VarId};
use crate::value::Value;

/// A fixed power-of-two bucket count for class member-lookup tables.
pub const HASH_SIZE: usize = 64;

/// Bucket payloads below this are method indices; at or above it,
/// `payload - MAX_METHODS` is a member-variable index.
pub const MAX_METHODS: u32 = 1 << 16;

/// Special method names pre-interned at program creation.
pub const SPECIAL_METHOD_NAMES: [&str; 7] =
["to_str", "length", "init", "destroy", "clone", "equals", "hash"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModuleSymbol {
    Var(VarId),
    Func(FuncId),
    Class(ClassId),
}

#[derive(Debug, Clone, Default)]
struct ModuleTable {
    library: Option<String>,
    /// Symbol names in registration order: each registration appends
    /// to the module's symbol list rather than replacing it.
    symbols: Vec<String>,
    name_to_symbol: HashMap<String, ModuleSymbol>,
}

#[derive(Debug, Clone)]
pub struct GlobalEntry {
    pub value: Value,
    pub is_const: bool,
    pub name: String,
    pub file_uri: FileUriId,
    pub module_path: String,
}

#[derive(Debug, Clone)]
pub struct FuncEntry {
    pub body: FuncBody,
    pub arg_count: u32,
    pub kwarg_names: Vec<NameId>,
    pub multi_arg_last: bool,
    pub input_stack_size: u32,
    pub associated_class_id: Option<ClassId>,
    pub name: String,
    pub file_uri: FileUriId,
    pub module_path: String,
}

impl FuncEntry {
    pub fn is_c_func(&self) -> bool {
        self.body.is_c_func()
    }
}

#[derive(Debug, Clone, Copy)]
enum BucketPayload {
    Method(u32),
    Variable(u32),
}

impl BucketPayload {
    fn encode(self) -> u32 {
        match self {
            BucketPayload::Method(idx) => idx,
            BucketPayload::Variable(idx) => MAX_METHODS + idx,
        }
    }

    fn decode(raw: u32) -> Self {
        if raw < MAX_METHODS {
            BucketPayload::Method(raw)
        } else {
            BucketPayload::Variable(raw - MAX_METHODS)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassEntry {
    pub base_class_id: Option<ClassId>,
    pub methods: Vec<(NameId, FuncId)>,
    pub member_vars: Vec<NameId>,
    pub name: String,
    pub file_uri: FileUriId,
    pub module_path: String,
    buckets: [Vec<(NameId, u32)>; HASH_SIZE],
}

impl ClassEntry {
    fn new(name: String, file_uri: FileUriId, module_path: String) -> Self {
        ClassEntry {
            base_class_id: None,
            methods: Vec::new(),
            member_vars: Vec::new(),
            name,
            file_uri,
            module_path,
            buckets: std::array::from_fn(|_| Vec::new()),
        }
    }
}

/// The result of [`Program::lookup_class_member`]: at most one side is
/// ever populated, since a name id is only ever registered as a
/// method or a variable within one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassMemberLookup {
    pub method_func_id: Option<FuncId>,
    pub member_var_ordinal: Option<u32>,
}

impl ClassMemberLookup {
    pub fn is_found(&self) -> bool {
        self.method_func_id.is_some() || self.member_var_ordinal.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub globals: Vec<GlobalEntry>,
    pub funcs: Vec<FuncEntry>,
    pub classes: Vec<ClassEntry>,
    file_uris: Vec<String>,
    file_uri_index: HashMap<String, FileUriId>,
    member_names: Vec<String>,
    member_name_index: HashMap<String, NameId>,
    modules: HashMap<String, ModuleTable>,
    pub main_func_index: Option<FuncId>,
    pub globalinit_func_index: Option<FuncId>,
    pub debug: DebugSymbols,
    pub special_method_names: HashMap<&'static str, NameId>,
}

impl Program {
    pub fn new() -> Self {
        let mut program = Program::default();
        for name in SPECIAL_METHOD_NAMES {
            let id = program.intern_member_name(name);
            program.special_method_names.insert(name, id);
        }
        program
    }

    /// Normalizes and interns `uri`, returning a stable index; calling
    /// this twice with the same URI returns the same id.
    pub fn intern_file_uri(&mut self, uri: &str) -> FileUriId {
        let normalized = horse64_ast::pathnorm::normalize(uri);
        if let Some(&id) = self.file_uri_index.get(&normalized) {
            return id;
        }
        let id = FileUriId(self.file_uris.len() as u32);
        self.file_uris.push(normalized.clone());
        self.file_uri_index.insert(normalized, id);
        id
    }

    pub fn file_uri(&self, id: FileUriId) -> &str {
        &self.file_uris[id.to_usize()]
    }

    /// Interns a class-member (or kwarg) name, stable across the whole
    /// program.
    pub fn intern_member_name(&mut self, name: &str) -> NameId {
        if let Some(&id) = self.member_name_index.get(name) {
            return id;
        }
        let id = NameId(self.member_names.len() as u32);
        self.member_names.push(name.to_string());
        self.member_name_index.insert(name.to_string(), id);
        id
    }

    pub fn member_name(&self, id: NameId) -> &str {
        &self.member_names[id.to_usize()]
    }

    fn module_mut(&mut self, module_path: &str, library: Option<&str>) -> &mut ModuleTable {
        self.modules
        .entry(module_path.to_string())
        .or_insert_with(|| ModuleTable {
                library: library.map(str::to_string),
                symbols: Vec::new(),
                name_to_symbol: HashMap::new(),
        })
    }

    fn check_module_free(&self, module_path: &str, name: &str) -> Result<(), ProgramError> {
        if let Some(module) = self.modules.get(module_path) {
            if module.name_to_symbol.contains_key(name) {
                return Err(ProgramError::DuplicateSymbol {
                        name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn add_global_var(
        &mut self,
        name: &str,
        is_const: bool,
        file_uri: FileUriId,
        module_path: &str,
        library: Option<&str>,
    ) -> Result<VarId, ProgramError> {
        self.check_module_free(module_path, name)?;

        let id = VarId(self.globals.len() as u32);
        self.globals.push(GlobalEntry {
                value: Value::None,
                is_const,
                name: name.to_string(),
                file_uri,
                module_path: module_path.to_string(),
        });
        self.debug.record_var(id, name);

        let module = self.module_mut(module_path, library);
        module.symbols.push(name.to_string());
        module.name_to_symbol.insert(name.to_string(), ModuleSymbol::Var(id));

        Ok(id)
    }

    pub fn add_class(
        &mut self,
        name: &str,
        file_uri: FileUriId,
        module_path: &str,
        library: Option<&str>,
    ) -> Result<ClassId, ProgramError> {
        self.check_module_free(module_path, name)?;

        let id = ClassId(self.classes.len() as u32);
        self.classes
        .push(ClassEntry::new(name.to_string(), file_uri, module_path.to_string()));
        self.debug.record_class(id, name);

        let module = self.module_mut(module_path, library);
        module.symbols.push(name.to_string());
        module
        .name_to_symbol
        .insert(name.to_string(), ModuleSymbol::Class(id));

        Ok(id)
    }

    /// Registers a class member. `func_id` present means a method;
    /// absent means a member variable. Rejects duplicate member names
    /// on the same class before mutating anything.
    pub fn register_class_member(
        &mut self,
        class_id: ClassId,
        name: &str,
        func_id: Option<FuncId>,
    ) -> Result<(), ProgramError> {
        let name_id = self.intern_member_name(name);
        let bucket_idx = name_id.to_usize() % HASH_SIZE;

        {
            let class = &self.classes[class_id.to_usize()];
            if class.buckets[bucket_idx].iter().any(|(n, _)| *n == name_id) {
                return Err(ProgramError::DuplicateClassMember {
                        class_id,
                        name: name.to_string(),
                });
            }
            if func_id.is_some() && class.methods.len() as u32 >= MAX_METHODS {
                return Err(ProgramError::TooManyMethods { class_id });
            }
        }

        let class = &mut self.classes[class_id.to_usize()];
        let payload = match func_id {
            Some(fid) => {
                let idx = class.methods.len() as u32;
                class.methods.push((name_id, fid));
                BucketPayload::Method(idx)
            }
            None => {
                let idx = class.member_vars.len() as u32;
                class.member_vars.push(name_id);
                BucketPayload::Variable(idx)
            }
        };
        class.buckets[bucket_idx].push((name_id, payload.encode()));

        Ok(())
    }

    /// Probes the bucket `name_id mod HASH_SIZE` linearly. Equivalent by construction to a linear scan over every
    /// registered member, since every member is inserted into exactly
    /// one bucket and every bucket is scanned in full.
    pub fn lookup_class_member(&self, class_id: ClassId, name_id: NameId) -> ClassMemberLookup {
        let class = &self.classes[class_id.to_usize()];
        let bucket = &class.buckets[name_id.to_usize() % HASH_SIZE];
        match bucket.iter().find(|(n, _)| *n == name_id) {
            Some((_, raw)) => match BucketPayload::decode(*raw) {
                BucketPayload::Method(idx) => ClassMemberLookup {
                    method_func_id: Some(class.methods[idx as usize].1),
                    member_var_ordinal: None,
                },
                BucketPayload::Variable(idx) => ClassMemberLookup {
                    method_func_id: None,
                    member_var_ordinal: Some(idx),
                },
            },
            None => ClassMemberLookup::default(),
        }
    }

    /// The flat field offset at which `class_id`'s own member
    /// variables begin within an `Instance` of that class, i.e. the
    /// sum of every ancestor's own field count. Needed because
    /// [`Program::lookup_class_member`] returns ordinals local to the
    /// class a member was declared on, but `Instance` storage
    /// (`horse64-program::heap::InstanceObj`) is a single flat `Vec`
    /// spanning the whole inheritance chain, base fields first.
    pub fn class_field_base_offset(&self, class_id: ClassId) -> u32 {
        match self.classes[class_id.to_usize()].base_class_id {
            Some(base) => {
                self.class_field_base_offset(base) + self.classes[base.to_usize()].member_vars.len() as u32
            }
            None => 0,
        }
    }

    /// Total field count across `class_id` and every ancestor, the
    /// size an `Instance` of this class must allocate.
    pub fn class_total_field_count(&self, class_id: ClassId) -> u32 {
        self.class_field_base_offset(class_id) + self.classes[class_id.to_usize()].member_vars.len() as u32
    }

    pub fn set_class_base(&mut self, class_id: ClassId, base_class_id: ClassId) {
        self.classes[class_id.to_usize()].base_class_id = Some(base_class_id);
    }

    /// Walks `class_id`'s `base_class_id` chain, `class_id` first

    pub fn class_ancestors(&self, class_id: ClassId) -> Vec<ClassId> {
        let mut chain = vec![class_id];
        let mut cur = self.classes[class_id.to_usize()].base_class_id;
        while let Some(id) = cur {
            chain.push(id);
            cur = self.classes[id.to_usize()].base_class_id;
        }
        chain
    }

    /// Registers a function. If `associated_class_id` is `Some`, it is
    /// also registered as that class's method via
    /// [`Program::register_class_member`]. Free functions additionally
    /// get a module name-mapping entry; a flat per-module namespace
    /// cannot hold more than one class's `init`/`to_str`/etc. under the
    /// same key, so methods are method-table members only and never
    /// take a module symbol slot.
    #[allow(clippy::too_many_arguments)]
    pub fn register_function(
        &mut self,
        name: &str,
        file_uri: FileUriId,
        arg_count: u32,
        kwarg_names: &[&str],
        multi_arg_last: bool,
        module_path: &str,
        library: Option<&str>,
        associated_class_id: Option<ClassId>,
        native: Option<NativeFn>,
    ) -> Result<FuncId, ProgramError> {
        if associated_class_id.is_none() {
            self.check_module_free(module_path, name)?;
        }

        let kwarg_ids: Vec<NameId> = kwarg_names.iter().map(|n| self.intern_member_name(n)).collect();
        let body = match native {
            Some(f) => FuncBody::Native(f),
            None => FuncBody::Bytecode(InstrBuf::new()),
        };

        let id = FuncId(self.funcs.len() as u32);
        self.funcs.push(FuncEntry {
                body,
                arg_count,
                kwarg_names: kwarg_ids,
                multi_arg_last,
                input_stack_size: arg_count,
                associated_class_id,
                name: name.to_string(),
                file_uri,
                module_path: module_path.to_string(),
        });
        self.debug.record_func(id, name);

        match associated_class_id {
            Some(class_id) => {
                self.register_class_member(class_id, name, Some(id))?;
            }
            None => {
                let module = self.module_mut(module_path, library);
                module.symbols.push(name.to_string());
                module
                .name_to_symbol
                .insert(name.to_string(), ModuleSymbol::Func(id));
            }
        }

        Ok(id)
    }

    pub fn set_func_body(&mut self, func_id: FuncId, body: InstrBuf) {
        self.funcs[func_id.to_usize()].body = FuncBody::Bytecode(body);
    }

    pub fn set_func_input_stack_size(&mut self, func_id: FuncId, size: u32) {
        self.funcs[func_id.to_usize()].input_stack_size = size;
    }

    pub fn resolve_module_var(&self, module_path: &str, name: &str) -> Option<VarId> {
        match self.modules.get(module_path)?.name_to_symbol.get(name)? {
            ModuleSymbol::Var(id) => Some(*id),
            _ => None,
        }
    }

    pub fn resolve_module_func(&self, module_path: &str, name: &str) -> Option<FuncId> {
        match self.modules.get(module_path)?.name_to_symbol.get(name)? {
            ModuleSymbol::Func(id) => Some(*id),
            _ => None,
        }
    }

    pub fn resolve_module_class(&self, module_path: &str, name: &str) -> Option<ClassId> {
        match self.modules.get(module_path)?.name_to_symbol.get(name)? {
            ModuleSymbol::Class(id) => Some(*id),
            _ => None,
        }
    }
}
