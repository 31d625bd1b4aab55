/// S-expression renderer for parse output, tests, and debugging.

use crate::heap::Heap;
use crate::object::{ObjRef, Payload};

pub fn render(heap: &Heap, expr: ObjRef) -> String {
    let mut out = String::new();
    write_expr(heap, expr, &mut out);
    out
}

fn write_expr(heap: &Heap, expr: ObjRef, out: &mut String) {
    match heap.get(expr).payload() {
        Payload::Nil => out.push_str("()"),
        Payload::Atom(cell) => out.push_str(&String::from_utf8_lossy(&cell.bytes)),
        Payload::Function(cell) => {
            out.push_str("#<fun ");
            out.push_str(cell.name);
            out.push('>');
        }
        Payload::Cons(cell) => {
            out.push('(');
            write_expr(heap, cell.head, out);
            out.push(' ');
            write_expr(heap, cell.tail, out);
            out.push(')');
        }
    }
}
