//! Test utilities for WASM module testing

pub mod test_modules {
    use std::sync::OnceLock;

    /// Imports every module compiled against the c0deine ABI declares
    const C0DEINE_IMPORTS: &str = r#"
      (import "c0deine" "memory" (memory 1))
      (import "c0deine" "result" (func $result (param i32)))
      (import "c0deine" "abort" (func $abort (param i32)))
      (import "c0deine" "error" (func $error (param i32)))
    "#;

    /// Wrap a start function body in a c0deine module.
    ///
    /// `data` is placed at offset 16 of the imported memory.
    pub fn c0deine_module(data: &str, body: &str) -> Vec<u8> {
        c0deine_module_with_exports(data, body, "(start $main)")
    }

    /// Same as [`c0deine_module`] but `main` is exported instead of being
    /// the start function.
    pub fn c0deine_entry_module(data: &str, body: &str) -> Vec<u8> {
        c0deine_module_with_exports(data, body, r#"(export "main" (func $main))"#)
    }

    fn c0deine_module_with_exports(data: &str, body: &str, wiring: &str) -> Vec<u8> {
        let source = format!(
            r#"(module
              {C0DEINE_IMPORTS}
              (data (i32.const 16) "{data}")
              (func $main {body})
              {wiring})"#
        );
        wat::parse_str(source).unwrap()
    }

    /// Calls `result(code)`
    pub fn result_wasm(code: i32) -> Vec<u8> {
        c0deine_module("", &format!("(call $result (i32.const {code}))"))
    }

    /// Calls `abort(signal)` then returns normally
    pub fn abort_wasm(signal: i32) -> Vec<u8> {
        c0deine_module("", &format!("(call $abort (i32.const {signal}))"))
    }

    /// Calls `abort(signal)` then halts with `unreachable`
    pub fn abort_then_trap_wasm(signal: i32) -> Vec<u8> {
        c0deine_module("", &format!("(call $abort (i32.const {signal})) unreachable"))
    }

    /// Logs "Hi" through `error` then calls `result(0)`
    pub fn error_hi_wasm() -> Vec<u8> {
        c0deine_module(
            "\\48\\69\\00",
            "(call $error (i32.const 16)) (call $result (i32.const 0))",
        )
    }

    /// Returns without reporting anything
    pub fn silent_wasm() -> Vec<u8> {
        c0deine_module("", "nop")
    }

    /// Calls `result` twice
    pub fn double_result_wasm() -> Vec<u8> {
        c0deine_module(
            "",
            "(call $result (i32.const 1)) (call $result (i32.const 2))",
        )
    }

    /// Logs a line then traps without reporting an outcome
    pub fn trap_wasm() -> Vec<u8> {
        c0deine_module(
            "before trap\\00",
            "(call $error (i32.const 16)) unreachable",
        )
    }

    /// Imports `result` with the wrong signature
    pub fn mismatched_import_wasm() -> Vec<u8> {
        wat::parse_str(
            r#"(module
              (import "c0deine" "result" (func $result (param i64))))"#,
        )
        .unwrap()
    }

    fn generate_empty_module_wasm() -> Vec<u8> {
        wat::parse_str("(module)").unwrap()
    }

    static EMPTY_MODULE_WASM: OnceLock<Vec<u8>> = OnceLock::new();

    /// A minimal valid WASM module that does nothing
    pub fn empty_module_wasm() -> &'static [u8] {
        EMPTY_MODULE_WASM.get_or_init(generate_empty_module_wasm)
    }

    /// Invalid WASM with wrong magic number
    pub const INVALID_MAGIC_WASM: &[u8] = &[
        0xFF, 0xFF, 0xFF, 0xFF, // wrong magic
        0x01, 0x00, 0x00, 0x00, // version
    ];

    /// Valid header followed by a section that runs past the end
    pub const TRUNCATED_WASM: &[u8] = &[
        0x00, 0x61, 0x73, 0x6d, // magic
        0x01, 0x00, 0x00, 0x00, // version
        0x01, 0x05, 0x01,       // type section claiming 5 bytes
    ];
}
