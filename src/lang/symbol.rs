use super::token::Keyword;
use crate::mach::{Opcode, Word};
use std::collections::HashMap;

/// ## Identifier table
///
/// Records are append-only: a name, once interned, keeps its `SymbolId`
/// for the life of the table. Names are borrowed from the source buffer,
/// which must outlive the table.
///
/// Each record has an optional global binding and a stack of local
/// bindings that shadow it. The innermost binding wins.

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct SymbolId(usize);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token class a record lexes as.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Kind {
    Keyword(Keyword),
    Ident,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Class {
    Constant,
    Function,
    System,
    Global,
    Local,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BaseType {
    Char,
    Int,
}

/// `char`, `int`, or any depth of pointer to either.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Type {
    pub base: BaseType,
    pub depth: u8,
}

impl Type {
    pub const CHAR: Type = Type {
        base: BaseType::Char,
        depth: 0,
    };
    pub const INT: Type = Type {
        base: BaseType::Int,
        depth: 0,
    };

    pub fn pointer_to(self) -> Type {
        Type {
            depth: self.depth + 1,
            ..self
        }
    }

    pub fn pointee(self) -> Option<Type> {
        match self.depth {
            0 => None,
            d => Some(Type { depth: d - 1, ..self }),
        }
    }

    pub fn is_pointer(self) -> bool {
        self.depth > 0
    }

    /// Bytes occupied by a value of this type.
    pub fn size(self) -> usize {
        match (self.base, self.depth) {
            (BaseType::Char, 0) => 1,
            _ => crate::mach::WORD_SIZE,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.base {
            BaseType::Char => write!(f, "char")?,
            BaseType::Int => write!(f, "int")?,
        }
        for _ in 0..self.depth {
            write!(f, "*")?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Binding {
    pub class: Class,
    pub ty: Type,
    pub value: Word,
}

impl Binding {
    pub fn new(class: Class, ty: Type, value: Word) -> Binding {
        Binding { class, ty, value }
    }
}

#[derive(Debug, Clone)]
pub struct Symbol<'a> {
    kind: Kind,
    hash: Word,
    name: &'a str,
    global: Option<Binding>,
    locals: Vec<Binding>,
}

impl<'a> Symbol<'a> {
    pub fn kind(&self) -> Kind {
        self.kind
    }
    pub fn hash(&self) -> Word {
        self.hash
    }
    pub fn name(&self) -> &'a str {
        self.name
    }
    pub fn global(&self) -> Option<&Binding> {
        self.global.as_ref()
    }
    /// The innermost binding in scope.
    pub fn binding(&self) -> Option<&Binding> {
        self.locals.last().or_else(|| self.global.as_ref())
    }
    pub fn is_shadowed(&self) -> bool {
        !self.locals.is_empty()
    }
}

/// Rolling hash used to bucket identifier names.
pub fn hash(name: &[u8]) -> Word {
    let mut bytes = name.iter();
    let mut hash = match bytes.next() {
        Some(b) => *b as Word,
        None => return 0,
    };
    for b in bytes {
        hash = hash.wrapping_mul(147).wrapping_add(*b as Word);
    }
    hash
}

#[derive(Debug, Default, Clone)]
pub struct SymbolTable<'a> {
    records: Vec<Symbol<'a>>,
    buckets: HashMap<Word, Vec<SymbolId>>,
}

impl<'a> SymbolTable<'a> {
    pub fn new() -> SymbolTable<'a> {
        SymbolTable::default()
    }

    /// Table seeded with the keywords and the system calls.
    pub fn with_builtins() -> SymbolTable<'a> {
        let mut table = SymbolTable::new();
        for keyword in Keyword::ALL.iter() {
            let name = match keyword {
                Keyword::Char => "char",
                Keyword::Else => "else",
                Keyword::Enum => "enum",
                Keyword::If => "if",
                Keyword::Int => "int",
                Keyword::Return => "return",
                Keyword::Sizeof => "sizeof",
                Keyword::While => "while",
            };
            let id = table.intern(name);
            table.records[id.0].kind = Kind::Keyword(*keyword);
        }
        let syscalls = [
            ("open", Opcode::Open),
            ("read", Opcode::Read),
            ("close", Opcode::Clos),
            ("printf", Opcode::Prtf),
            ("malloc", Opcode::Malc),
            ("memset", Opcode::Mset),
            ("memcmp", Opcode::Mcmp),
            ("exit", Opcode::Exit),
        ];
        for (name, opcode) in syscalls.iter() {
            let id = table.intern(*name);
            table.declare(id, Binding::new(Class::System, Type::INT, *opcode as Word));
        }
        table
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol<'a>> {
        self.records.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol<'a>)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, s)| (SymbolId(i), s))
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.find(hash(name.as_bytes()), name)
    }

    /// Returns the existing record for `name` or appends a new identifier.
    pub fn intern(&mut self, name: &'a str) -> SymbolId {
        self.intern_hashed(hash(name.as_bytes()), name)
    }

    fn find(&self, hash: Word, name: &str) -> Option<SymbolId> {
        let bucket = self.buckets.get(&hash)?;
        bucket
            .iter()
            .find(|id| self.records[id.0].name.as_bytes() == name.as_bytes())
            .copied()
    }

    fn intern_hashed(&mut self, hash: Word, name: &'a str) -> SymbolId {
        if let Some(id) = self.find(hash, name) {
            return id;
        }
        let id = SymbolId(self.records.len());
        self.records.push(Symbol {
            kind: Kind::Ident,
            hash,
            name,
            global: None,
            locals: vec![],
        });
        self.buckets.entry(hash).or_insert_with(Vec::new).push(id);
        id
    }

    pub fn declare(&mut self, id: SymbolId, binding: Binding) {
        if let Some(sym) = self.records.get_mut(id.0) {
            sym.global = Some(binding);
        }
    }

    /// Hides the current binding behind a local one.
    pub fn shadow(&mut self, id: SymbolId, binding: Binding) {
        if let Some(sym) = self.records.get_mut(id.0) {
            sym.locals.push(binding);
        }
    }

    /// Drops the innermost local binding, restoring what it hid.
    pub fn unshadow(&mut self, id: SymbolId) -> Option<Binding> {
        self.records.get_mut(id.0)?.locals.pop()
    }

    /// Ends one local scope across the whole table.
    pub fn leave_scope(&mut self) -> usize {
        let mut restored = 0;
        for sym in self.records.iter_mut() {
            if sym.locals.pop().is_some() {
                restored += 1;
            }
        }
        restored
    }
}
