use std::collections::HashMap;

/// Name of the module builtin classes live in.  Builtins are displayed without
/// it.
pub const BUILTINS_MODULE: &str = "builtins";
/// The universal object type every chain ends at.
pub const OBJECT: &str = "object";
/// The root of every rendered tree.
pub const BASE_ERROR: &str = "Exception";

/// CPython 3.12's builtin classes that can appear in an error's lineage, listed
/// so that every class follows its bases.
static BUILTIN_CLASSES: &[(&str, &[&str])] = &[
    ("object", &[]),
    // A handful of non-exception builtins that show up as mixins.
    ("type", &["object"]),
    ("int", &["object"]),
    ("float", &["object"]),
    ("complex", &["object"]),
    ("str", &["object"]),
    ("bytes", &["object"]),
    ("bytearray", &["object"]),
    ("tuple", &["object"]),
    ("list", &["object"]),
    ("dict", &["object"]),
    ("set", &["object"]),
    ("frozenset", &["object"]),
    ("BaseException", &["object"]),
    ("BaseExceptionGroup", &["BaseException"]),
    ("GeneratorExit", &["BaseException"]),
    ("KeyboardInterrupt", &["BaseException"]),
    ("SystemExit", &["BaseException"]),
    ("Exception", &["BaseException"]),
    ("ArithmeticError", &["Exception"]),
    ("FloatingPointError", &["ArithmeticError"]),
    ("OverflowError", &["ArithmeticError"]),
    ("ZeroDivisionError", &["ArithmeticError"]),
    ("AssertionError", &["Exception"]),
    ("AttributeError", &["Exception"]),
    ("BufferError", &["Exception"]),
    ("EOFError", &["Exception"]),
    ("ExceptionGroup", &["BaseExceptionGroup", "Exception"]),
    ("ImportError", &["Exception"]),
    ("ModuleNotFoundError", &["ImportError"]),
    ("LookupError", &["Exception"]),
    ("IndexError", &["LookupError"]),
    ("KeyError", &["LookupError"]),
    ("MemoryError", &["Exception"]),
    ("NameError", &["Exception"]),
    ("UnboundLocalError", &["NameError"]),
    ("OSError", &["Exception"]),
    ("BlockingIOError", &["OSError"]),
    ("ChildProcessError", &["OSError"]),
    ("ConnectionError", &["OSError"]),
    ("BrokenPipeError", &["ConnectionError"]),
    ("ConnectionAbortedError", &["ConnectionError"]),
    ("ConnectionRefusedError", &["ConnectionError"]),
    ("ConnectionResetError", &["ConnectionError"]),
    ("FileExistsError", &["OSError"]),
    ("FileNotFoundError", &["OSError"]),
    ("InterruptedError", &["OSError"]),
    ("IsADirectoryError", &["OSError"]),
    ("NotADirectoryError", &["OSError"]),
    ("PermissionError", &["OSError"]),
    ("ProcessLookupError", &["OSError"]),
    ("TimeoutError", &["OSError"]),
    ("ReferenceError", &["Exception"]),
    ("RuntimeError", &["Exception"]),
    ("NotImplementedError", &["RuntimeError"]),
    ("RecursionError", &["RuntimeError"]),
    ("StopAsyncIteration", &["Exception"]),
    ("StopIteration", &["Exception"]),
    ("SyntaxError", &["Exception"]),
    ("IndentationError", &["SyntaxError"]),
    ("TabError", &["IndentationError"]),
    ("SystemError", &["Exception"]),
    ("TypeError", &["Exception"]),
    ("ValueError", &["Exception"]),
    ("UnicodeError", &["ValueError"]),
    ("UnicodeDecodeError", &["UnicodeError"]),
    ("UnicodeEncodeError", &["UnicodeError"]),
    ("UnicodeTranslateError", &["UnicodeError"]),
    ("Warning", &["Exception"]),
    ("BytesWarning", &["Warning"]),
    ("DeprecationWarning", &["Warning"]),
    ("EncodingWarning", &["Warning"]),
    ("FutureWarning", &["Warning"]),
    ("ImportWarning", &["Warning"]),
    ("PendingDeprecationWarning", &["Warning"]),
    ("ResourceWarning", &["Warning"]),
    ("RuntimeWarning", &["Warning"]),
    ("SyntaxWarning", &["Warning"]),
    ("UnicodeWarning", &["Warning"]),
    ("UserWarning", &["Warning"]),
];

/// Builtin names bound to another builtin class object.
static BUILTIN_ALIASES: &[(&str, &str)] = &[("EnvironmentError", "OSError"), ("IOError", "OSError")];

lazy_static! {
    static ref BUILTIN_BASES: HashMap<&'static str, &'static [&'static str]> =
        BUILTIN_CLASSES.iter().copied().collect();
}

/// Map a builtin name (or alias) to the name of the class it denotes.
pub fn canonical_builtin(name: &str) -> Option<&'static str> {
    if let Some((canonical, _)) = BUILTIN_BASES.get_key_value(name) {
        return Some(*canonical);
    }
    BUILTIN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, target)| *target)
}

pub fn builtin_bases(name: &str) -> Option<&'static [&'static str]> {
    BUILTIN_BASES.get(name).copied()
}

/// All builtin class names, every class after its bases.
pub fn builtin_class_names() -> impl Iterator<Item = &'static str> {
    BUILTIN_CLASSES.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bases_precede_subclasses() {
        let mut seen = vec![];
        for name in builtin_class_names() {
            for base in builtin_bases(name).unwrap() {
                assert!(seen.contains(base), "{} listed before its base {}", name, base);
            }
            seen.push(name);
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!(canonical_builtin("IOError"), Some("OSError"));
        assert_eq!(canonical_builtin("KeyError"), Some("KeyError"));
        assert_eq!(canonical_builtin("Exceptional"), None);
    }
}
