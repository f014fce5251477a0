//! Hashed, multi-scope symbol table.
//!
//! One fixed-size `Vec<Vec<Entry>>` of buckets shared by every scope, with
//! each entry tagged by the scope number that owns it so a scope close can
//! remove exactly its own entries in O(entries owned) without walking the
//! whole table.

use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::ast::{ArrayShape, PassingMode, PrimitiveType};

/// Bucket count for the hash table: a fixed prime, at least 1001 buckets;
/// 1009 is the next prime above that floor.
const BUCKET_COUNT: usize = 1009;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamSig {
    pub element_type: PrimitiveType,
    pub shape: ArrayShape,
    pub passing: PassingMode,
}

#[derive(Debug, Clone)]
pub enum EntryKind {
    Variable {
        element_type: PrimitiveType,
        shape: ArrayShape,
    },
    Parameter {
        element_type: PrimitiveType,
        shape: ArrayShape,
        passing: PassingMode,
    },
    Function {
        return_type: PrimitiveType,
        params: Vec<ParamSig>,
        /// `true` between a forward declaration and its matching
        /// definition; a lookup of a function for a *call* must never see
        /// this set.
        declared_only: bool,
    },
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub scope_number: u32,
    pub line: u32,
    pub kind: EntryKind,
}

/// One open scope: the function header information needed to validate
/// `return` statements against the enclosing function, plus the list of
/// entries this scope owns (for bulk removal on close).
struct ScopeFrame {
    number: u32,
    return_type: PrimitiveType,
    return_exists: bool,
    owned: Vec<Rc<RefCell<Entry>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    AlreadyDeclaredInScope { name: String },
    NotDeclared { name: String },
    NoOpenScope,
    InvalidArraySize { name: String },
    /// A function declared but never defined, still undefined when its
    /// declaring scope closes.
    FunctionStillUndefined { name: String, line: u32 },
    /// A function's definition disagrees with its prior forward
    /// declaration in the same scope (return type, arity, or a
    /// parameter's type/passing-mode/shape/open-leading).
    DefinitionMismatch { name: String },
}

impl Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolError::AlreadyDeclaredInScope { name } => {
                write!(f, "'{name}' is already declared in this scope")
            }
            SymbolError::NotDeclared { name } => write!(f, "'{name}' is not declared"),
            SymbolError::NoOpenScope => write!(f, "no scope is currently open"),
            SymbolError::InvalidArraySize { name } => {
                write!(f, "'{name}' has a non-positive array dimension")
            }
            SymbolError::FunctionStillUndefined { name, line } => write!(
                f,
                "function '{name}' is declared at line {line} but never defined"
            ),
            SymbolError::DefinitionMismatch { name } => write!(
                f,
                "definition of '{name}' does not match its prior declaration"
            ),
        }
    }
}

impl std::error::Error for SymbolError {}

fn bucket_of(name: &str) -> usize {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    (hasher.finish() % BUCKET_COUNT as u64) as usize
}

/// The symbol table proper: a shared bucketed hash table plus a stack of
/// open scopes. Entries are prepended to their bucket on insert, so a
/// lookup that walks a bucket front-to-back naturally finds the innermost
/// declaration of a shadowed name first: innermost scope wins.
pub struct SymbolTable {
    buckets: Vec<Vec<Rc<RefCell<Entry>>>>,
    scopes: Vec<ScopeFrame>,
    next_scope_number: u32,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = SymbolTable {
            buckets: (0..BUCKET_COUNT).map(|_| Vec::new()).collect(),
            scopes: Vec::new(),
            // Scope number 0 is reserved for the library entries seeded
            // below, which live outside the scope stack and are never
            // closed; user scopes (starting with the outermost function)
            // start numbering at 1 so a `was_declared_in_current_scope`
            // check can never collide with a library name.
            next_scope_number: 1,
        };
        table.init_library_functions();
        table
    }

    /// Seed the runtime library's signatures so calls to them resolve
    /// without a user-visible forward declaration.
    fn init_library_functions(&mut self) {
        use PrimitiveType::*;
        let library: &[(&str, PrimitiveType, &[ParamSig])] = &[
            ("writeInteger", Nothing, &[param(Int)]),
            ("writeChar", Nothing, &[param(Char)]),
            ("writeString", Nothing, &[param_ref_open_array(Char)]),
            ("readInteger", Int, &[]),
            ("readChar", Char, &[]),
            ("readString", Nothing, &[param(Int), param_ref_open_array(Char)]),
            ("ord", Int, &[param(Char)]),
            ("chr", Char, &[param(Int)]),
            ("strlen", Int, &[param_ref_open_array(Char)]),
            ("strcmp", Int, &[param_ref_open_array(Char), param_ref_open_array(Char)]),
            ("strcpy", Nothing, &[param_ref_open_array(Char), param_ref_open_array(Char)]),
            ("strcat", Nothing, &[param_ref_open_array(Char), param_ref_open_array(Char)]),
        ];
        for (name, return_type, params) in library {
            let entry = Entry {
                name: (*name).to_string(),
                scope_number: 0,
                line: 0,
                kind: EntryKind::Function {
                    return_type: *return_type,
                    params: params.to_vec(),
                    declared_only: false,
                },
            };
            self.buckets[bucket_of(name)].push(Rc::new(RefCell::new(entry)));
        }

        // `ascii` is a compatibility alias for `ord`.
        let ascii = Entry {
            name: "ascii".to_string(),
            scope_number: 0,
            line: 0,
            kind: EntryKind::Function {
                return_type: Int,
                params: vec![param(Char)],
                declared_only: false,
            },
        };
        self.buckets[bucket_of("ascii")].push(Rc::new(RefCell::new(ascii)));
    }

    pub fn open_scope(&mut self, return_type: PrimitiveType) -> u32 {
        let number = self.next_scope_number;
        self.next_scope_number += 1;
        self.scopes.push(ScopeFrame {
            number,
            return_type,
            return_exists: false,
            owned: Vec::new(),
        });
        number
    }

    /// Remove every entry owned by the innermost scope. O(entries owned
    /// by that scope), not O(table size) -- the point of scope-tagging
    /// entries rather than snapshotting/restoring whole buckets.
    ///
    /// Before popping, runs the undefined-function check: a scope cannot
    /// close while it still owns a function entry that was
    /// declared but never defined. The first such entry found is reported;
    /// the scope is popped and its entries removed regardless, so callers
    /// that collect diagnostics rather than aborting immediately can keep
    /// walking the rest of the program.
    pub fn close_scope(&mut self) -> Result<(), SymbolError> {
        let frame = self.scopes.last().ok_or(SymbolError::NoOpenScope)?;
        let undefined = frame.owned.iter().find_map(|entry| {
            let e = entry.borrow();
            match &e.kind {
                EntryKind::Function { declared_only: true, .. } => {
                    Some(SymbolError::FunctionStillUndefined {
                        name: e.name.clone(),
                        line: e.line,
                    })
                }
                _ => None,
            }
        });

        let frame = self.scopes.pop().expect("checked above");
        for entry in &frame.owned {
            let bucket = &mut self.buckets[bucket_of(&entry.borrow().name)];
            if let Some(pos) = bucket.iter().position(|e| Rc::ptr_eq(e, entry)) {
                bucket.remove(pos);
            }
        }

        match undefined {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn current_scope_number(&self) -> Result<u32, SymbolError> {
        self.scopes
            .last()
            .map(|s| s.number)
            .ok_or(SymbolError::NoOpenScope)
    }

    /// True iff `name` itself has an entry owned by the current scope --
    /// used for the "was this name already used in the enclosing
    /// function" redeclaration check. A bucket holds every name that
    /// hashes to the same slot, so this must compare the name, not just
    /// the scope number, or an unrelated same-scope collider would
    /// falsely trip it.
    pub fn was_declared_in_current_scope(&self, name: &str) -> bool {
        let Some(scope) = self.scopes.last() else {
            return false;
        };
        self.buckets[bucket_of(name)].iter().any(|e| {
            let e = e.borrow();
            e.name == name && e.scope_number == scope.number
        })
    }

    /// Innermost-first lookup: since inserts prepend, the first entry in
    /// bucket order whose name actually matches is the nearest enclosing
    /// declaration. A bucket is shared by every name that hashes to the
    /// same slot, so the name comparison is load-bearing, not a
    /// redundant check.
    pub fn lookup(&self, name: &str) -> Option<Entry> {
        self.buckets[bucket_of(name)]
            .iter()
            .find(|e| e.borrow().name == name)
            .map(|e| e.borrow().clone())
    }

    fn insert(&mut self, name: &str, line: u32, kind: EntryKind) -> Result<(), SymbolError> {
        if self.was_declared_in_current_scope(name) {
            return Err(SymbolError::AlreadyDeclaredInScope {
                name: name.to_string(),
            });
        }
        let scope_number = self.current_scope_number()?;
        let entry = Rc::new(RefCell::new(Entry {
            name: name.to_string(),
            scope_number,
            line,
            kind,
        }));
        self.buckets[bucket_of(name)].insert(0, entry.clone());
        self.scopes.last_mut().unwrap().owned.push(entry);
        Ok(())
    }

    pub fn insert_variable(
        &mut self,
        name: &str,
        line: u32,
        element_type: PrimitiveType,
        shape: ArrayShape,
    ) -> Result<(), SymbolError> {
        let has_non_positive = shape
            .dims
            .iter()
            .enumerate()
            .any(|(i, &d)| !(shape.leading_open && i == 0) && d == 0);
        if has_non_positive {
            return Err(SymbolError::InvalidArraySize {
                name: name.to_string(),
            });
        }
        self.insert(name, line, EntryKind::Variable { element_type, shape })
    }

    pub fn insert_parameter(
        &mut self,
        name: &str,
        line: u32,
        element_type: PrimitiveType,
        shape: ArrayShape,
        passing: PassingMode,
    ) -> Result<(), SymbolError> {
        self.insert(
            name,
            line,
            EntryKind::Parameter {
                element_type,
                shape,
                passing,
            },
        )
    }

    pub fn insert_function_declaration(
        &mut self,
        name: &str,
        line: u32,
        return_type: PrimitiveType,
        params: Vec<ParamSig>,
    ) -> Result<(), SymbolError> {
        self.insert(
            name,
            line,
            EntryKind::Function {
                return_type,
                params,
                declared_only: true,
            },
        )
    }

    /// Promote a forward declaration to a full definition in place, or
    /// insert a fresh one if there was no prior declaration. When a prior
    /// declaration exists, its return type, parameter count, and each
    /// parameter's type/passing-mode/shape/open-leading must exactly
    /// match the definition's -- a declaration/definition disagreement is
    /// a `DefinitionMismatch`, not a silent overwrite. Either way clears
    /// `declared_only` so subsequent calls resolve.
    pub fn insert_function_definition(
        &mut self,
        name: &str,
        line: u32,
        return_type: PrimitiveType,
        params: Vec<ParamSig>,
    ) -> Result<(), SymbolError> {
        let scope_number = self.current_scope_number()?;
        if let Some(existing) = self.buckets[bucket_of(name)]
            .iter()
            .find(|e| e.borrow().name == name && e.borrow().scope_number == scope_number)
            .cloned()
        {
            let prior_signature = match &existing.borrow().kind {
                EntryKind::Function {
                    return_type: prior_return_type,
                    params: prior_params,
                    ..
                } => Some((*prior_return_type, prior_params.clone())),
                _ => None,
            };
            if let Some((prior_return_type, prior_params)) = prior_signature {
                if prior_return_type != return_type || prior_params != params {
                    return Err(SymbolError::DefinitionMismatch {
                        name: name.to_string(),
                    });
                }
            }
            let mut existing_mut = existing.borrow_mut();
            existing_mut.line = line;
            existing_mut.kind = EntryKind::Function {
                return_type,
                params,
                declared_only: false,
            };
            return Ok(());
        }
        self.insert(
            name,
            line,
            EntryKind::Function {
                return_type,
                params,
                declared_only: false,
            },
        )
    }

    pub fn set_return_exists(&mut self) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.return_exists = true;
        }
    }

    pub fn current_return_type(&self) -> Result<PrimitiveType, SymbolError> {
        self.scopes
            .last()
            .map(|s| s.return_type)
            .ok_or(SymbolError::NoOpenScope)
    }

    /// `true` once the current scope has seen at least one `return`;
    /// non-`nothing` functions must reach at least one before their
    /// scope closes.
    pub fn return_exists(&self) -> bool {
        self.scopes.last().map(|s| s.return_exists).unwrap_or(false)
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

fn param(element_type: PrimitiveType) -> ParamSig {
    ParamSig {
        element_type,
        shape: ArrayShape::scalar(),
        passing: PassingMode::ByValue,
    }
}

fn param_ref_open_array(element_type: PrimitiveType) -> ParamSig {
    ParamSig {
        element_type,
        shape: ArrayShape::open_leading(vec![]),
        passing: PassingMode::ByReference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_seeds_library_functions() {
        let table = SymbolTable::new();
        let entry = table.lookup("writeInteger").expect("library function");
        assert!(matches!(entry.kind, EntryKind::Function { .. }));
    }

    #[test]
    fn test_ascii_alias_present() {
        let table = SymbolTable::new();
        assert!(table.lookup("ascii").is_some());
    }

    #[test]
    fn test_insert_and_lookup_variable() {
        let mut table = SymbolTable::new();
        table.open_scope(PrimitiveType::Nothing);
        table
            .insert_variable("x", 1, PrimitiveType::Int, ArrayShape::scalar())
            .unwrap();
        let entry = table.lookup("x").unwrap();
        assert_eq!(entry.name, "x");
        assert!(matches!(entry.kind, EntryKind::Variable { .. }));
    }

    #[test]
    fn test_duplicate_in_same_scope_errors() {
        let mut table = SymbolTable::new();
        table.open_scope(PrimitiveType::Nothing);
        table
            .insert_variable("x", 1, PrimitiveType::Int, ArrayShape::scalar())
            .unwrap();
        let err = table
            .insert_variable("x", 2, PrimitiveType::Int, ArrayShape::scalar())
            .unwrap_err();
        assert_eq!(
            err,
            SymbolError::AlreadyDeclaredInScope { name: "x".into() }
        );
    }

    #[test]
    fn test_shadowing_across_scopes() {
        let mut table = SymbolTable::new();
        table.open_scope(PrimitiveType::Nothing);
        table
            .insert_variable("x", 1, PrimitiveType::Int, ArrayShape::scalar())
            .unwrap();
        table.open_scope(PrimitiveType::Nothing);
        table
            .insert_variable("x", 2, PrimitiveType::Char, ArrayShape::scalar())
            .unwrap();
        let inner = table.lookup("x").unwrap();
        assert!(matches!(
            inner.kind,
            EntryKind::Variable {
                element_type: PrimitiveType::Char,
                ..
            }
        ));
        table.close_scope().unwrap();
        let outer = table.lookup("x").unwrap();
        assert!(matches!(
            outer.kind,
            EntryKind::Variable {
                element_type: PrimitiveType::Int,
                ..
            }
        ));
    }

    #[test]
    fn test_close_scope_removes_entries() {
        let mut table = SymbolTable::new();
        table.open_scope(PrimitiveType::Nothing);
        table
            .insert_variable("y", 1, PrimitiveType::Int, ArrayShape::scalar())
            .unwrap();
        table.close_scope().unwrap();
        assert!(table.lookup("y").is_none());
    }

    #[test]
    fn test_close_scope_without_open_errors() {
        let mut table = SymbolTable::new();
        assert_eq!(table.close_scope().unwrap_err(), SymbolError::NoOpenScope);
    }

    #[test]
    fn test_forward_declaration_then_definition() {
        let mut table = SymbolTable::new();
        table.open_scope(PrimitiveType::Nothing);
        table
            .insert_function_declaration("f", 1, PrimitiveType::Int, vec![])
            .unwrap();
        let forward = table.lookup("f").unwrap();
        assert!(matches!(
            forward.kind,
            EntryKind::Function {
                declared_only: true,
                ..
            }
        ));
        table
            .insert_function_definition("f", 5, PrimitiveType::Int, vec![])
            .unwrap();
        let defined = table.lookup("f").unwrap();
        assert!(matches!(
            defined.kind,
            EntryKind::Function {
                declared_only: false,
                ..
            }
        ));
    }

    #[test]
    fn test_definition_mismatched_against_declaration_errors() {
        let mut table = SymbolTable::new();
        table.open_scope(PrimitiveType::Nothing);
        table
            .insert_function_declaration(
                "f",
                1,
                PrimitiveType::Int,
                vec![ParamSig {
                    element_type: PrimitiveType::Int,
                    shape: ArrayShape::scalar(),
                    passing: PassingMode::ByValue,
                }],
            )
            .unwrap();
        let err = table
            .insert_function_definition(
                "f",
                5,
                PrimitiveType::Nothing,
                vec![ParamSig {
                    element_type: PrimitiveType::Char,
                    shape: ArrayShape::scalar(),
                    passing: PassingMode::ByValue,
                }],
            )
            .unwrap_err();
        assert_eq!(err, SymbolError::DefinitionMismatch { name: "f".into() });
        // the stale forward declaration is left untouched, not overwritten.
        let still_declared = table.lookup("f").unwrap();
        assert!(matches!(
            still_declared.kind,
            EntryKind::Function {
                declared_only: true,
                ..
            }
        ));
    }

    #[test]
    fn test_lookup_does_not_cross_bucket_collisions() {
        // Two names chosen to land in the same bucket: proof that lookup
        // must name-match within a bucket, not just return its first
        // entry. Generating one more candidate name than there are
        // buckets guarantees a collision by the pigeonhole principle,
        // regardless of the hash function's actual distribution.
        let names: Vec<String> = (0..=BUCKET_COUNT).map(|i| format!("v{i}")).collect();
        let mut by_bucket: std::collections::HashMap<usize, Vec<&str>> =
            std::collections::HashMap::new();
        for n in &names {
            by_bucket.entry(bucket_of(n)).or_default().push(n.as_str());
        }
        let (a, b) = by_bucket
            .values()
            .find(|v| v.len() >= 2)
            .map(|v| (v[0], v[1]))
            .expect("pigeonhole guarantees a collision among BUCKET_COUNT+1 names");

        let mut table = SymbolTable::new();
        table.open_scope(PrimitiveType::Nothing);
        table
            .insert_variable(a, 1, PrimitiveType::Int, ArrayShape::scalar())
            .unwrap();
        table
            .insert_variable(b, 2, PrimitiveType::Char, ArrayShape::scalar())
            .unwrap();

        let entry_a = table.lookup(a).unwrap();
        assert_eq!(entry_a.name, a);
        assert!(matches!(
            entry_a.kind,
            EntryKind::Variable {
                element_type: PrimitiveType::Int,
                ..
            }
        ));
        let entry_b = table.lookup(b).unwrap();
        assert_eq!(entry_b.name, b);
        assert!(matches!(
            entry_b.kind,
            EntryKind::Variable {
                element_type: PrimitiveType::Char,
                ..
            }
        ));
    }

    #[test]
    fn test_close_scope_with_undefined_function_errors() {
        let mut table = SymbolTable::new();
        table.open_scope(PrimitiveType::Nothing);
        table
            .insert_function_declaration("f", 3, PrimitiveType::Int, vec![])
            .unwrap();
        let err = table.close_scope().unwrap_err();
        assert_eq!(
            err,
            SymbolError::FunctionStillUndefined {
                name: "f".into(),
                line: 3,
            }
        );
        // the scope still closes: its entries are gone either way.
        assert!(table.lookup("f").is_none());
    }

    #[test]
    fn test_insert_variable_rejects_non_positive_dimension() {
        let mut table = SymbolTable::new();
        table.open_scope(PrimitiveType::Nothing);
        let err = table
            .insert_variable("a", 1, PrimitiveType::Int, ArrayShape::fixed(vec![0]))
            .unwrap_err();
        assert_eq!(err, SymbolError::InvalidArraySize { name: "a".into() });
    }

    #[test]
    fn test_insert_variable_allows_open_leading_dimension() {
        let mut table = SymbolTable::new();
        table.open_scope(PrimitiveType::Nothing);
        table
            .insert_variable("a", 1, PrimitiveType::Int, ArrayShape::open_leading(vec![4]))
            .unwrap();
        assert!(table.lookup("a").is_some());
    }

    #[test]
    fn test_return_tracking() {
        let mut table = SymbolTable::new();
        table.open_scope(PrimitiveType::Int);
        assert!(!table.return_exists());
        table.set_return_exists();
        assert!(table.return_exists());
    }
}
