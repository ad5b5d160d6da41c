//! Drives a command-line GDB: a prioritized command queue, a prompt-delimited
//! reply reader and parsers that turn console output into breakpoints,
//! frames, registers, disassembly and watch values.

pub mod gdb;
