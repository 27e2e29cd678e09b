//! Identifier synthesis from curated word lists.
//!
//! Names are built by picking one pattern row for the category of the type,
//! drawing one word per slot and joining the words in camel case, e.g.
//! `stackDepth`, `isLoaded`, `rotationMatrix`. The tables are small, so
//! [`unique_name`] redraws a bounded number of times and then appends a
//! numeric suffix, e.g. `packetNode2`.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::types::Type;

/// One naming pattern: a word list per camel-case slot.
type Pattern = &'static [&'static [&'static str]];

const INT_NAMES: &[Pattern] = &[
    &[&["i", "j", "k", "l", "m", "n", "res", "value", "arg"]],
    &[
        &["stack", "system", "process", "event", "queue", "list"],
        &["count", "counter", "amount", "depth"],
    ],
];

const FLOAT_NAMES: &[Pattern] = &[
    &[&["w", "x", "y", "z", "res", "arg", "value"]],
    &[
        &["calculated", "random", "data", "precise", "sin", "cos", "pow"],
        &["amount", "frac", "flt", "value"],
    ],
];

const BOOL_NAMES: &[Pattern] = &[
    &[
        &["is", "can", "will"],
        &["load", "save", "read", "write", "exec"],
    ],
    &[
        &[
            "config", "system", "send", "read", "write", "exec", "restore", "ready", "pause",
            "state", "process", "storage",
        ],
        &["toggle", "flag", "enabled", "override"],
    ],
    &[&["is", "has"], &["loaded", "saved", "done", "ready"]],
];

const STRING_NAMES: &[Pattern] = &[
    &[
        &["customer", "object", "target", "uri", "service", "storage"],
        &["name", "data", "value", "location", "address", "properties"],
    ],
    &[
        &["match", "regex", "search", "query"],
        &["type", "pattern", "name", "term"],
    ],
];

const VECTOR_NAMES: &[Pattern] = &[&[
    &["shift", "scale", "bit", "data"],
    &["vector", "list", "array"],
]];

const MATRIX_NAMES: &[Pattern] = &[&[
    &["rotation", "transformation", "affine", "data", "bit", "translation"],
    &["matrix", "field", "array"],
]];

const RECORD_NAMES: &[Pattern] = &[
    &[
        &["data", "client", "server", "packet", "io"],
        &["object", "representation", "struct", "unit", "node"],
    ],
    &[&["packet", "person", "message", "tree", "node"]],
];

const VOID_FUNCTION_NAMES: &[Pattern] = &[
    &[
        &["apply", "trigger", "flush", "reset"],
        &["changes", "updates", "reload", "state"],
    ],
    &[
        &["call", "visit", "trigger"],
        &["listener", "external", "visitor", "modifier"],
    ],
];

/// Verbs prefixed onto a value name to name a non-void function.
const FUNCTION_VERBS: &[&str] = &[
    "read",
    "get",
    "calculate",
    "fetch",
    "retrieve",
    "update",
    "refresh",
    "construct",
    "build",
];

/// Name for a variable, value or record of type `ty`.
pub fn variable_name<R: Rng + ?Sized>(ty: &Type, rng: &mut R) -> String {
    let table = match ty {
        Type::Vector(..) => VECTOR_NAMES,
        Type::Matrix(..) => MATRIX_NAMES,
        Type::Bool => BOOL_NAMES,
        Type::Int => INT_NAMES,
        Type::Float => FLOAT_NAMES,
        Type::Record(_) => RECORD_NAMES,
        Type::String | Type::Void => STRING_NAMES,
    };
    pick_from(table, rng)
}

/// Name for a function returning `ty`.
///
/// Void functions draw from their own table; every other function is a verb
/// followed by a value name, e.g. `fetchStackDepth`.
pub fn function_name<R: Rng + ?Sized>(ty: &Type, rng: &mut R) -> String {
    if ty.is_void() {
        return pick_from(VOID_FUNCTION_NAMES, rng);
    }
    let verb = FUNCTION_VERBS.choose(rng).copied().unwrap_or("get");
    format!("{verb}{}", capitalize(&variable_name(ty, rng)))
}

fn pick_from<R: Rng + ?Sized>(table: &[Pattern], rng: &mut R) -> String {
    let Some(pattern) = table.choose(rng) else {
        return String::new();
    };
    pattern
        .iter()
        .enumerate()
        .map(|(i, words)| {
            let word = words.choose(rng).copied().unwrap_or_default();
            if i == 0 {
                word.to_string()
            } else {
                capitalize(word)
            }
        })
        .collect()
}

/// Redraws before a taken name is disambiguated with a suffix.
const MAX_REDRAWS: usize = 32;

/// Draw names with `draw` until one is not `taken`.
///
/// After [`MAX_REDRAWS`] collisions the last draw gets the smallest numeric
/// suffix, starting at 2, that is not taken.
pub fn unique_name<R, D, T>(rng: &mut R, mut draw: D, taken: T) -> String
where
    R: Rng + ?Sized,
    D: FnMut(&mut R) -> String,
    T: Fn(&str) -> bool,
{
    let mut name = draw(rng);
    let mut redraws = 0;
    while taken(&name) {
        if redraws == MAX_REDRAWS {
            let mut suffix = 2;
            loop {
                let candidate = format!("{name}{suffix}");
                if !taken(&candidate) {
                    return candidate;
                }
                suffix += 1;
            }
        }
        name = draw(rng);
        redraws += 1;
    }
    name
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
