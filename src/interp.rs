/// Interpreter context
///
/// All shared state lives here rather than in process globals, so several
/// interpreters can coexist and tests can build and tear down instances
/// deterministically: the heap, the pinned nil singleton, the operand and
/// continuation stacks, and the two binding tables (`forms` for operators
/// applied to unevaluated arguments, `env` for ordinary variables).
///
/// The operand and continuation stacks are ordinary cons chains held in
/// permanent root cells; pushing is one allocation, popping is a pointer
/// move. That makes the pending program state itself a garbage-collected
/// object graph the collector walks like anything else.

use std::io::{self, Write};

use crate::errors::{InterpError, RuntimeError};
use crate::heap::{Heap, RootId, DEFAULT_OBJECT_LIMIT};
use crate::object::{ApplyFn, AtomCell, ConsCell, FunctionCell, ObjRef, Payload};
use crate::parser::Parser;

#[derive(Debug, Clone)]
pub struct InterpConfig {
    /// Live-object count that triggers a collection inside `allocate`.
    pub heap_limit: usize,
    /// Trace collection phases to stderr.
    pub gc_debug: bool,
}

impl Default for InterpConfig {
    fn default() -> Self {
        InterpConfig {
            heap_limit: DEFAULT_OBJECT_LIMIT,
            gc_debug: false,
        }
    }
}

pub struct Interp {
    pub heap: Heap,
    nil: ObjRef,
    operands: RootId,
    continuations: RootId,
    forms: RootId,
    env: RootId,
    pub(crate) out: Box<dyn Write>,
}

impl std::fmt::Debug for Interp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interp")
            .field("heap", &self.heap)
            .field("nil", &self.nil)
            .field("operands", &self.operands)
            .field("continuations", &self.continuations)
            .field("forms", &self.forms)
            .field("env", &self.env)
            .finish()
    }
}

impl Interp {
    pub fn new() -> Self {
        Self::with_config(InterpConfig::default())
    }

    pub fn with_config(config: InterpConfig) -> Self {
        assert!(
            config.heap_limit >= 32,
            "heap limit too small for the builtin environment"
        );
        let mut heap = Heap::with_debug(config.heap_limit, config.gc_debug);
        let nil = heap
            .allocate(Payload::Nil)
            .expect("an empty heap accepts the nil singleton");
        // Pin the singleton, then set up the four global cells.
        heap.push_root(nil);
        let operands = heap.push_root(nil);
        let continuations = heap.push_root(nil);
        let forms = heap.push_root(nil);
        let env = heap.push_root(nil);
        let mut interp = Interp {
            heap,
            nil,
            operands,
            continuations,
            forms,
            env,
            out: Box::new(io::stdout()),
        };
        interp
            .install_builtins()
            .expect("the builtin environment fits under any accepted limit");
        interp
    }

    /// Redirect `print_atom` output, e.g. into a buffer under test.
    pub fn with_output(mut self, out: Box<dyn Write>) -> Self {
        self.out = out;
        self
    }

    fn install_builtins(&mut self) -> Result<(), RuntimeError> {
        let nil = self.nil;
        let quote = self.function("quote", crate::eval::quote_form, nil)?;
        self.prepend_binding(self.forms, "quote", quote)?;
        let fun = self.function("fun", crate::eval::fun_form, nil)?;
        self.prepend_binding(self.forms, "fun", fun)?;
        let print = self.function("print_atom", crate::eval::print_atom, nil)?;
        self.prepend_binding(self.env, "print_atom", print)?;
        Ok(())
    }

    /// Prepend `name -> value` onto one of the binding tables.
    fn prepend_binding(
        &mut self,
        table: RootId,
        name: &'static str,
        value: ObjRef,
    ) -> Result<(), RuntimeError> {
        self.heap.push_root(value);
        let key = match self.atom(name.as_bytes()) {
            Ok(key) => key,
            Err(e) => {
                self.heap.pop_root();
                return Err(e);
            }
        };
        self.heap.push_root(key);
        let result = self.prepend_entry(table, key, value);
        self.heap.pop_root();
        self.heap.pop_root();
        result
    }

    /// `key` and `value` are rooted by the caller.
    fn prepend_entry(
        &mut self,
        table: RootId,
        key: ObjRef,
        value: ObjRef,
    ) -> Result<(), RuntimeError> {
        let binding = self.cons(key, value)?;
        let current = self.heap.root_value(table);
        let list = self.cons(binding, current)?;
        self.heap.set_root(table, list);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Global cells
    // -----------------------------------------------------------------------

    pub fn nil(&self) -> ObjRef {
        self.nil
    }

    pub fn forms_list(&self) -> ObjRef {
        self.heap.root_value(self.forms)
    }

    pub fn env_list(&self) -> ObjRef {
        self.heap.root_value(self.env)
    }

    // -----------------------------------------------------------------------
    // Allocation helpers
    //
    // Each helper roots the object references it receives for the duration
    // of the allocation, so a collection triggered by the soft limit cannot
    // reclaim them out from under the new node.
    // -----------------------------------------------------------------------

    pub fn atom(&mut self, bytes: &[u8]) -> Result<ObjRef, RuntimeError> {
        self.heap
            .allocate(Payload::Atom(AtomCell { bytes: bytes.into() }))
    }

    pub fn cons(&mut self, head: ObjRef, tail: ObjRef) -> Result<ObjRef, RuntimeError> {
        self.heap.push_root(head);
        self.heap.push_root(tail);
        let cell = self
            .heap
            .allocate(Payload::Cons(ConsCell::new(head, tail)));
        self.heap.pop_root();
        self.heap.pop_root();
        cell
    }

    pub fn function(
        &mut self,
        name: &'static str,
        apply: ApplyFn,
        data: ObjRef,
    ) -> Result<ObjRef, RuntimeError> {
        self.heap.push_root(data);
        let cell = self
            .heap
            .allocate(Payload::Function(FunctionCell { name, apply, data }));
        self.heap.pop_root();
        cell
    }

    // -----------------------------------------------------------------------
    // Operand and continuation stacks
    // -----------------------------------------------------------------------

    pub fn push_operand(&mut self, value: ObjRef) -> Result<(), RuntimeError> {
        let stack = self.heap.root_value(self.operands);
        let cell = self.cons(value, stack)?;
        self.heap.set_root(self.operands, cell);
        Ok(())
    }

    /// Pop the top operand. The returned reference is no longer rooted:
    /// the caller must push it as a root before the next allocation if it
    /// keeps it.
    pub fn pop_operand(&mut self) -> Result<ObjRef, RuntimeError> {
        let stack = self.heap.root_value(self.operands);
        match self.heap.cons_parts(stack) {
            Some((head, tail)) => {
                self.heap.set_root(self.operands, tail);
                Ok(head)
            }
            None => Err(RuntimeError::StackUnderflow { stack: "operand" }),
        }
    }

    pub fn push_continuation(&mut self, k: ObjRef) -> Result<(), RuntimeError> {
        let stack = self.heap.root_value(self.continuations);
        let cell = self.cons(k, stack)?;
        self.heap.set_root(self.continuations, cell);
        Ok(())
    }

    /// Pop the next continuation to run, or `None` when the program is
    /// finished. Same rooting caveat as `pop_operand`.
    pub fn pop_continuation(&mut self) -> Option<ObjRef> {
        let stack = self.heap.root_value(self.continuations);
        match self.heap.cons_parts(stack) {
            Some((head, tail)) => {
                self.heap.set_root(self.continuations, tail);
                Some(head)
            }
            None => None,
        }
    }

    fn chain_len(&self, mut cur: ObjRef) -> usize {
        let mut n = 0;
        while let Some((_, tail)) = self.heap.cons_parts(cur) {
            n += 1;
            cur = tail;
        }
        n
    }

    pub fn pending_operands(&self) -> usize {
        self.chain_len(self.heap.root_value(self.operands))
    }

    pub fn pending_continuations(&self) -> usize {
        self.chain_len(self.heap.root_value(self.continuations))
    }

    // -----------------------------------------------------------------------
    // Shape checks and lookup
    // -----------------------------------------------------------------------

    pub fn expect_cons(&self, obj: ObjRef) -> Result<(ObjRef, ObjRef), RuntimeError> {
        self.heap.cons_parts(obj).ok_or_else(|| RuntimeError::ConsExpected {
            found: self.heap.kind(obj).name(),
        })
    }

    pub fn atom_text(&self, obj: ObjRef) -> String {
        match self.heap.atom_bytes(obj) {
            Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            None => format!("<{}>", self.heap.kind(obj).name()),
        }
    }

    pub fn atoms_equal(&self, a: ObjRef, b: ObjRef) -> Result<bool, RuntimeError> {
        match (self.heap.atom_bytes(a), self.heap.atom_bytes(b)) {
            (Some(left), Some(right)) => Ok(left == right),
            (None, _) => Err(RuntimeError::AtomsExpected {
                found: self.heap.kind(a).name(),
            }),
            (_, None) => Err(RuntimeError::AtomsExpected {
                found: self.heap.kind(b).name(),
            }),
        }
    }

    /// Walk an association list of `(key . value)` pairs, comparing keys
    /// to `key` by atom contents.
    pub fn assoc(&self, list: ObjRef, key: ObjRef) -> Result<Option<ObjRef>, RuntimeError> {
        let mut cur = list;
        while cur != self.nil {
            let (binding, rest) = self.expect_cons(cur)?;
            let (entry_key, value) = self.expect_cons(binding)?;
            if self.atoms_equal(entry_key, key)? {
                return Ok(Some(value));
            }
            cur = rest;
        }
        Ok(None)
    }

    // -----------------------------------------------------------------------
    // Program entry point
    // -----------------------------------------------------------------------

    /// Parse and evaluate every top-level expression in `source`. The
    /// value of each expression is popped and dropped.
    pub fn run_program(&mut self, source: &str) -> Result<(), InterpError> {
        let mut parser = Parser::new(source, 0);
        while let Some(expr) = parser.parse_next(self)? {
            self.eval_expr(expr)?;
        }
        self.out.flush().map_err(RuntimeError::from)?;
        Ok(())
    }
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}
