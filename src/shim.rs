// src/shim.rs

//! Interpreter shim for the compile-only syntax check.
//!
//! The Rust side does NOT parse Python itself. It spawns the interpreter
//! with this script (`python3 -c <shim>`) and pipes the submitted source on
//! STDIN.
//!
//! Responsibilities of the shim:
//! - Read the whole source from STDIN as UTF-8
//! - `compile()` it without executing anything
//! - Emit ONE JSON object to STDOUT describing the outcome
//!
//! Output shape:
//! {"ok": true}
//! {"ok": false, "kind": "SyntaxError", "message": "...", "line": 1, "column": 7}

/// Python compile-check shim.
///
/// Usage (internal):
/// python3 -c <shim> < source.py
pub fn compile_check_shim() -> &'static str {
    r#"
import json
import sys


def emit(payload):
    sys.stdout.write(json.dumps(payload))
    sys.stdout.flush()


def main():
    try:
        source = sys.stdin.buffer.read().decode("utf-8")
        compile(source, "<string>", "exec", dont_inherit=True)
    except SyntaxError as e:
        # IndentationError and TabError are reported under the parent name.
        emit({
            "ok": False,
            "kind": "SyntaxError",
            "message": str(e),
            "line": e.lineno,
            "column": e.offset,
        })
        return
    except Exception as e:
        emit({
            "ok": False,
            "kind": type(e).__name__,
            "message": str(e),
            "line": None,
            "column": None,
        })
        return

    emit({"ok": True})


main()
"#
}
