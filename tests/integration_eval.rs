/// Integration tests for Revl evaluation and collection behaviour.
///
/// These tests verify:
///   • End-to-end programs: quoting, closures, printing
///   • Multiple top-level expressions per source
///   • Prompt reclamation: the heap returns to its baseline after a run
///   • Near-limit allocation: rooted data refuses to be reclaimed,
///     unrooted data is collected the moment the limit bites
///   • Parse and runtime failures surface as fatal errors
use revl::{Interp, InterpConfig, InterpError, ObjKind, ParserError, RuntimeError};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

// ─── Helpers ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
struct SharedOut(Rc<RefCell<Vec<u8>>>);

impl SharedOut {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedOut {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn run_script(src: &str) -> Result<(Interp, SharedOut), InterpError> {
    let out = SharedOut::default();
    let mut interp = Interp::new().with_output(Box::new(out.clone()));
    interp.run_program(src)?;
    Ok((interp, out))
}

// ─── End-to-end programs ──────────────────────────────────────────────────────

#[test]
fn test_print_quoted_atom() {
    let (interp, out) = run_script("(print_atom (quote Hello))").expect("should succeed");
    assert_eq!(out.contents(), "Hello");
    assert_eq!(interp.pending_continuations(), 0, "the continuation stack drains");
    assert_eq!(interp.pending_operands(), 0, "top-level values are dropped");
}

#[test]
fn test_closure_application_prints_argument() {
    let (_interp, out) =
        run_script("((fun (x (print_atom x))) (quote World))").expect("should succeed");
    assert_eq!(out.contents(), "World");
}

#[test]
fn test_multiple_top_level_expressions_run_in_order() {
    let (_interp, out) = run_script("(print_atom (quote A)) (print_atom (quote B))")
        .expect("should succeed");
    assert_eq!(out.contents(), "AB");
}

#[test]
fn test_curried_application() {
    // (fun (x (fun (y x)))) applied twice returns the first argument.
    let src = "(print_atom (((fun (x (fun (y x)))) (quote first)) (quote second)))";
    let (_interp, out) = run_script(src).expect("should succeed");
    assert_eq!(out.contents(), "first");
}

// ─── Reclamation behaviour ────────────────────────────────────────────────────

#[test]
fn test_heap_returns_to_baseline_after_a_run() {
    let out = SharedOut::default();
    let mut interp = Interp::new().with_output(Box::new(out.clone()));
    interp.heap.collect();
    let baseline = interp.heap.len();

    interp
        .run_program("((fun (x (print_atom x))) (quote World))")
        .expect("should succeed");
    interp.heap.collect();
    assert_eq!(
        interp.heap.len(),
        baseline,
        "everything a finished program allocated is unreachable"
    );
}

#[test]
fn test_rooted_chain_fills_the_heap_and_unrooting_frees_it() {
    let limit = 256;
    let mut interp = Interp::with_config(InterpConfig { heap_limit: limit, gc_debug: false });
    let baseline = interp.heap.len();
    let nil = interp.nil();

    let mut chain = nil;
    let root = interp.heap.push_root(nil);
    while interp.heap.len() < limit {
        chain = interp.cons(nil, chain).expect("below the limit, allocation succeeds");
        interp.heap.set_root(root, chain);
    }

    // Saturated and fully rooted: the triggered collection reclaims
    // nothing and the allocation fails.
    let err = interp.cons(nil, nil).expect_err("a saturated rooted heap must refuse");
    assert!(matches!(err, RuntimeError::ObjectLimit { .. }));

    // Drop the chain from its root: the same allocation now succeeds and
    // the heap shrinks back to the baseline.
    interp.heap.set_root(root, nil);
    let fresh = interp.cons(nil, nil).expect("the collection reclaims the chain");
    assert_eq!(interp.heap.kind(fresh), ObjKind::Cons);
    assert_eq!(interp.heap.len(), baseline + 1);
    assert!(interp.heap.stats.collections >= 2);
    interp.heap.pop_root();
}

#[test]
fn test_looping_program_is_collected_while_running() {
    let program = "((fun (iter (iter iter))) \
                   (fun (iter ((fun (v (iter iter))) (print_atom (quote Hi))))))";
    let out = SharedOut::default();
    let mut interp = Interp::with_config(InterpConfig { heap_limit: 512, gc_debug: false })
        .with_output(Box::new(out.clone()));

    let mut parser = revl::Parser::new(program, 0);
    let expr = parser
        .parse_next(&mut interp)
        .expect("parse should succeed")
        .expect("program is one expression");
    interp.schedule(expr).expect("scheduling fits in the heap");

    for i in 0..30_000 {
        if i % 1000 == 0 {
            // Collections injected mid-loop must leave the pending
            // continuation and operand chains intact.
            interp.heap.collect();
        }
        assert!(interp.step().expect("the loop must not fault"), "the loop never finishes");
        assert!(interp.heap.len() <= 512, "per-iteration garbage must be reclaimed");
    }
    assert!(interp.heap.stats.collections > 0, "the limit forces collections mid-run");
    assert!(out.contents().contains("HiHi"), "the loop keeps printing");
}

// ─── Failure semantics ────────────────────────────────────────────────────────

#[test]
fn test_unterminated_pair_is_a_parse_error() {
    let err = run_script("(print_atom (quote Hello)").unwrap_err();
    assert!(matches!(
        err,
        InterpError::Parser(ParserError::UnexpectedEof { .. })
    ));
}

#[test]
fn test_extra_close_paren_is_a_parse_error() {
    let err = run_script("(quote a))").unwrap_err();
    assert!(matches!(
        err,
        InterpError::Parser(ParserError::UnexpectedToken { .. })
    ));
}

#[test]
fn test_unbound_variable_is_a_runtime_error() {
    let err = run_script("(print_atom missing)").unwrap_err();
    assert!(matches!(
        err,
        InterpError::Runtime(RuntimeError::UnboundAtom { .. })
    ));
}

#[test]
fn test_applying_an_atom_is_a_runtime_error() {
    let err = run_script("((quote x) (quote y))").unwrap_err();
    assert!(matches!(
        err,
        InterpError::Runtime(RuntimeError::NotAFunction { found: "atom" })
    ));
}

#[test]
fn test_printing_a_pair_is_a_runtime_error() {
    let err = run_script("(print_atom (quote (a b)))").unwrap_err();
    assert!(matches!(
        err,
        InterpError::Runtime(RuntimeError::PrintAtomExpected { found: "cons" })
    ));
}
