//! Tests for Chunk

use bytecode_system::{Chunk, LineRun, OpCode, MAX_SHORT_CONSTANT};
use core_types::Value;

#[test]
fn test_chunk_creation() {
    let chunk = Chunk::new();
    assert!(chunk.is_empty());
    assert_eq!(chunk.constants().len(), 0);
    assert!(chunk.lines().is_empty());
}

#[test]
fn test_chunk_write_records_line_per_byte() {
    let mut chunk = Chunk::new();
    chunk.write_op(OpCode::Nil, 1);
    chunk.write_op(OpCode::Pop, 1);
    chunk.write_op(OpCode::True, 3);
    chunk.write_op(OpCode::Return, 4);
    assert_eq!(chunk.line_for(0), 1);
    assert_eq!(chunk.line_for(1), 1);
    assert_eq!(chunk.line_for(2), 3);
    assert_eq!(chunk.line_for(3), 4);
}

#[test]
fn test_chunk_line_table_is_run_length_encoded() {
    let mut chunk = Chunk::new();
    for _ in 0..50 {
        chunk.write_op(OpCode::Nil, 7);
    }
    assert_eq!(chunk.lines(), &[LineRun { line: 7, count: 50 }]);
}

#[test]
fn test_chunk_add_constant_returns_sequential_indices() {
    let mut chunk = Chunk::new();
    assert_eq!(chunk.add_constant(Value::number(1.0)), 0);
    assert_eq!(chunk.add_constant(Value::number(1.0)), 1);
    assert_eq!(chunk.constant(1), Some(Value::number(1.0)));
    assert_eq!(chunk.constant(2), None);
}

#[test]
fn test_write_constant_short_form_at_boundary() {
    let mut chunk = Chunk::new();
    for i in 0..MAX_SHORT_CONSTANT {
        chunk.add_constant(Value::number(i as f64));
    }
    assert_eq!(chunk.write_constant(Value::nil(), 1), Some(255));
    assert_eq!(chunk.code(), &[u8::from(OpCode::Constant), 255]);
}

#[test]
fn test_write_constant_switches_to_long_form() {
    let mut chunk = Chunk::new();
    for i in 0..=MAX_SHORT_CONSTANT {
        chunk.add_constant(Value::number(i as f64));
    }
    // 256 constants occupy indices 0..=255
    assert_eq!(chunk.write_constant(Value::boolean(true), 2), Some(256));
    assert_eq!(chunk.code()[0], u8::from(OpCode::ConstantLong));
    assert_eq!(chunk.read_u24(1), 256);
    assert_eq!(chunk.len(), 4);
}

#[test]
fn test_write_indexed_global_long_form() {
    let mut chunk = Chunk::new();
    assert!(chunk.write_indexed(OpCode::GetGlobal, OpCode::GetGlobalLong, 70_000, 1));
    assert_eq!(chunk.code()[0], u8::from(OpCode::GetGlobalLong));
    assert_eq!(chunk.read_u24(1), 70_000);
    assert!(!chunk.write_indexed(OpCode::GetGlobal, OpCode::GetGlobalLong, 1 << 24, 1));
}

#[test]
fn test_patch_and_read_u16() {
    let mut chunk = Chunk::new();
    chunk.write_op(OpCode::Jump, 1);
    chunk.write(0xff, 1);
    chunk.write(0xff, 1);
    chunk.patch(1, 0x01);
    chunk.patch(2, 0x02);
    assert_eq!(chunk.read_u16(1), 0x0102);
}
