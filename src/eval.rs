/// Continuation-loop evaluator
///
/// Zero recursion: all pending work lives on the heap as two cons chains,
/// the operand stack (values) and the continuation stack (function objects
/// waiting to run). The driver pops one continuation per step and invokes
/// its native routine; routines push operands and further continuations
/// but never re-enter the evaluator, so the host stack stays flat no
/// matter how deep the program nests.
///
/// Evaluation rules for `eval` with data `(envs . expr)`:
///   • atom           — look the atom up in `env`, push the value
///   • (f a), f a form atom — push `(envs . a)` and run the form in tail
///     position, no apply continuation
///   • (f a) otherwise — push `pop_apply`, `eval (envs . f)`,
///     `eval (envs . a)`; popped LIFO that evaluates a, then f, then
///     applies
///   • anything else  — fatal
///
/// Because form invocation pushes no apply continuation, iterative
/// self-application runs in constant continuation-stack space: tail calls
/// are free by construction.

use std::io::Write;

use crate::errors::RuntimeError;
use crate::interp::Interp;
use crate::object::{ObjKind, ObjRef};

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

impl Interp {
    /// Queue an `eval` continuation for `expr` under the current global
    /// binding tables.
    pub fn schedule(&mut self, expr: ObjRef) -> Result<(), RuntimeError> {
        self.heap.push_root(expr);
        let result = self.schedule_rooted(expr);
        self.heap.pop_root();
        result
    }

    fn schedule_rooted(&mut self, expr: ObjRef) -> Result<(), RuntimeError> {
        let forms = self.forms_list();
        let env = self.env_list();
        let envs = self.cons(forms, env)?;
        let data = self.cons(envs, expr)?;
        let k = self.function("eval", eval, data)?;
        self.push_continuation(k)
    }

    /// Run one continuation. Returns `false` when the continuation stack
    /// is empty and the program is finished.
    pub fn step(&mut self) -> Result<bool, RuntimeError> {
        let k = match self.pop_continuation() {
            Some(k) => k,
            None => return Ok(false),
        };
        // The popped continuation left the stack's protection; root it for
        // the duration of its apply routine so its data stays live.
        self.heap.push_root(k);
        let result = match self.heap.function_parts(k) {
            Some((apply, data)) => apply(self, data),
            None => Err(RuntimeError::NotAFunction {
                found: self.heap.kind(k).name(),
            }),
        };
        self.heap.pop_root();
        result.map(|_| true)
    }

    /// Drive the continuation loop to completion.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        while self.step()? {}
        Ok(())
    }

    /// Evaluate one expression to its value.
    pub fn eval_expr(&mut self, expr: ObjRef) -> Result<ObjRef, RuntimeError> {
        self.schedule(expr)?;
        self.run()?;
        self.pop_operand()
    }
}

// ---------------------------------------------------------------------------
// Apply routines
// ---------------------------------------------------------------------------

/// The `eval` continuation: data is `(envs . expr)`.
pub(crate) fn eval(interp: &mut Interp, data: ObjRef) -> Result<(), RuntimeError> {
    let (envs, expr) = interp.expect_cons(data)?;
    match interp.heap.kind(expr) {
        ObjKind::Atom => {
            let (_forms, env) = interp.expect_cons(envs)?;
            match interp.assoc(env, expr)? {
                Some(value) => interp.push_operand(value),
                None => Err(RuntimeError::UnboundAtom {
                    name: interp.atom_text(expr),
                }),
            }
        }
        ObjKind::Cons => {
            let (fexpr, arg) = interp.expect_cons(expr)?;
            if interp.heap.kind(fexpr) == ObjKind::Atom {
                let (forms, _env) = interp.expect_cons(envs)?;
                if let Some(form) = interp.assoc(forms, fexpr)? {
                    // Forms receive their argument unevaluated and run in
                    // tail position: no apply continuation is pushed.
                    let operand = interp.cons(envs, arg)?;
                    interp.push_operand(operand)?;
                    let (apply, form_data) =
                        interp.heap.function_parts(form).ok_or(RuntimeError::NotAFunction {
                            found: interp.heap.kind(form).name(),
                        })?;
                    return apply(interp, form_data);
                }
            }
            // (f a): evaluate a, then f, then apply. Pushed in reverse so
            // the LIFO pop order runs them forwards.
            let nil = interp.nil();
            let k_apply = interp.function("pop_apply", pop_apply, nil)?;
            interp.push_continuation(k_apply)?;
            let f_data = interp.cons(envs, fexpr)?;
            let k_f = interp.function("eval", eval, f_data)?;
            interp.push_continuation(k_f)?;
            let a_data = interp.cons(envs, arg)?;
            let k_a = interp.function("eval", eval, a_data)?;
            interp.push_continuation(k_a)
        }
        other => Err(RuntimeError::CannotEvaluate { found: other.name() }),
    }
}

/// Pop the evaluated function from the operand stack and apply it.
pub(crate) fn pop_apply(interp: &mut Interp, _data: ObjRef) -> Result<(), RuntimeError> {
    let f = interp.pop_operand()?;
    interp.heap.push_root(f);
    let result = match interp.heap.function_parts(f) {
        Some((apply, data)) => apply(interp, data),
        None => Err(RuntimeError::NotAFunction {
            found: interp.heap.kind(f).name(),
        }),
    };
    interp.heap.pop_root();
    result
}

/// The `quote` form: data on the operand stack is `(envs . body)`; the
/// body is pushed back untouched, sharing the original tree.
pub(crate) fn quote_form(interp: &mut Interp, _data: ObjRef) -> Result<(), RuntimeError> {
    let operand = interp.pop_operand()?;
    let (_envs, body) = interp.expect_cons(operand)?;
    interp.push_operand(body)
}

/// The `fun` form: wraps the unevaluated `(param . body)` clause together
/// with the captured environments into a closure.
pub(crate) fn fun_form(interp: &mut Interp, _data: ObjRef) -> Result<(), RuntimeError> {
    let operand = interp.pop_operand()?;
    interp.heap.push_root(operand);
    let result = make_closure(interp, operand);
    interp.heap.pop_root();
    result
}

fn make_closure(interp: &mut Interp, operand: ObjRef) -> Result<(), RuntimeError> {
    let (_envs, clause) = interp.expect_cons(operand)?;
    let (param, _body) = interp.expect_cons(clause)?;
    if interp.heap.kind(param) != ObjKind::Atom {
        return Err(RuntimeError::FunParamNotAtom {
            found: interp.heap.kind(param).name(),
        });
    }
    let closure = interp.function("fun_apply", fun_apply, operand)?;
    interp.push_operand(closure)
}

/// Apply a closure: data is `(envs . (param . body))`, the evaluated
/// argument sits on the operand stack.
pub(crate) fn fun_apply(interp: &mut Interp, data: ObjRef) -> Result<(), RuntimeError> {
    let arg = interp.pop_operand()?;
    interp.heap.push_root(arg);
    let result = enter_closure(interp, data, arg);
    interp.heap.pop_root();
    result
}

fn enter_closure(interp: &mut Interp, data: ObjRef, arg: ObjRef) -> Result<(), RuntimeError> {
    let (envs, clause) = interp.expect_cons(data)?;
    let (param, body) = interp.expect_cons(clause)?;
    if interp.heap.kind(param) != ObjKind::Atom {
        return Err(RuntimeError::FunParamNotAtom {
            found: interp.heap.kind(param).name(),
        });
    }
    let (forms, env) = interp.expect_cons(envs)?;
    let binding = interp.cons(param, arg)?;
    let extended = interp.cons(binding, env)?;
    let new_envs = interp.cons(forms, extended)?;
    let k_data = interp.cons(new_envs, body)?;
    let k = interp.function("eval", eval, k_data)?;
    interp.push_continuation(k)
}

/// Native `print_atom`: writes the atom's raw bytes, no separator, and
/// yields nil.
pub(crate) fn print_atom(interp: &mut Interp, _data: ObjRef) -> Result<(), RuntimeError> {
    let arg = interp.pop_operand()?;
    match interp.heap.atom_bytes(arg) {
        Some(bytes) => interp.out.write_all(bytes)?,
        None => {
            return Err(RuntimeError::PrintAtomExpected {
                found: interp.heap.kind(arg).name(),
            })
        }
    }
    let nil = interp.nil();
    interp.push_operand(nil)
}
