//! GNU `as` directive writers.
//!
//! Small append-only helpers over the output `String`; the emitter strings
//! them together into the final assembly buffer.

use std::fmt::Write;

/// Symbol classification for `.type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolType {
    Function,
    Object,
}

/// `.file "<path>"` - names the logical source file.
pub fn file(buffer: &mut String, path: &str) {
    let _ = writeln!(buffer, "\t.file\t\"{path}\"");
}

/// `.text` - following statements assemble into the text section.
pub fn text(buffer: &mut String) {
    buffer.push_str("\t.text\n");
}

/// `.data` - following statements assemble into the data section.
pub fn data(buffer: &mut String) {
    buffer.push_str("\t.data\n");
}

/// `.bss` - following statements assemble into the bss section.
pub fn bss(buffer: &mut String) {
    buffer.push_str("\t.bss\n");
}

/// `.globl <name>` - the symbol is visible to the linker.
pub fn globl(buffer: &mut String, name: &str) {
    let _ = writeln!(buffer, "\t.globl\t{name}");
}

/// `.balign <bytes>` - pad the location counter to a storage boundary.
pub fn balign(buffer: &mut String, bytes: u64) {
    let _ = writeln!(buffer, "\t.balign\t{bytes}");
}

/// `.type <name>, @function|@object`.
pub fn symbol_type(buffer: &mut String, name: &str, kind: SymbolType) {
    let kind = match kind {
        SymbolType::Function => "@function",
        SymbolType::Object => "@object",
    };
    let _ = writeln!(buffer, "\t.type\t{name}, {kind}");
}

/// `.size <name>, <bytes>`.
pub fn size(buffer: &mut String, name: &str, bytes: u64) {
    let _ = writeln!(buffer, "\t.size\t{name}, {bytes}");
}

/// `.size <name>, .-<name>` - size measured back to the label. The label
/// must already be emitted, immediately before the symbol's content.
pub fn size_label_relative(buffer: &mut String, name: &str) {
    let _ = writeln!(buffer, "\t.size\t{name}, .-{name}");
}

/// `<name>:`.
pub fn label(buffer: &mut String, name: &str) {
    let _ = writeln!(buffer, "{name}:");
}

pub fn byte(buffer: &mut String, value: i64) {
    let _ = writeln!(buffer, "\t.byte\t{value}");
}

pub fn short(buffer: &mut String, value: i64) {
    let _ = writeln!(buffer, "\t.short\t{value}");
}

pub fn long(buffer: &mut String, value: i64) {
    let _ = writeln!(buffer, "\t.long\t{value}");
}

pub fn quad(buffer: &mut String, value: i64) {
    let _ = writeln!(buffer, "\t.quad\t{value}");
}

/// `.zero <bytes>` - that many zero bytes; covers padding and bss data.
pub fn zero(buffer: &mut String, bytes: u64) {
    let _ = writeln!(buffer, "\t.zero\t{bytes}");
}

/// `.ident "<comment>"` - records the producing compiler (ELF only).
pub fn ident(buffer: &mut String, comment: &str) {
    let _ = writeln!(buffer, "\t.ident\t\"{comment}\"");
}

/// Marks the stack non-executable on GNU systems.
pub fn noexecstack(buffer: &mut String) {
    buffer.push_str("\t.section\t.note.GNU-stack,\"\",@progbits\n");
}
