//! The straight-line instruction subset generated method bodies are made of.

use crate::descriptor::{BaseType, FieldType, MethodDescriptor, ReturnType};
use crate::error::{Error, Result};
use crate::writer::ConstantPoolBuilder;

/// Computational category of a value as seen by load/store/return opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Long,
    Float,
    Double,
    Reference,
}

impl ValueKind {
    pub fn of(ty: &FieldType) -> Self {
        match ty {
            FieldType::Base(BaseType::Long) => ValueKind::Long,
            FieldType::Base(BaseType::Float) => ValueKind::Float,
            FieldType::Base(BaseType::Double) => ValueKind::Double,
            FieldType::Base(_) => ValueKind::Int,
            FieldType::Object(_) | FieldType::Array(_) => ValueKind::Reference,
        }
    }

    pub fn slots(self) -> u16 {
        match self {
            ValueKind::Long | ValueKind::Double => 2,
            _ => 1,
        }
    }

    fn offset(self) -> u8 {
        match self {
            ValueKind::Int => 0,
            ValueKind::Long => 1,
            ValueKind::Float => 2,
            ValueKind::Double => 3,
            ValueKind::Reference => 4,
        }
    }
}

/// Primitive widening/narrowing conversions (`i2l`, `d2f`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    I2L,
    I2F,
    I2D,
    L2I,
    L2F,
    L2D,
    F2I,
    F2L,
    F2D,
    D2I,
    D2L,
    D2F,
    I2B,
    I2C,
    I2S,
}

impl Conversion {
    fn opcode(self) -> u8 {
        match self {
            Conversion::I2L => 0x85,
            Conversion::I2F => 0x86,
            Conversion::I2D => 0x87,
            Conversion::L2I => 0x88,
            Conversion::L2F => 0x89,
            Conversion::L2D => 0x8a,
            Conversion::F2I => 0x8b,
            Conversion::F2L => 0x8c,
            Conversion::F2D => 0x8d,
            Conversion::D2I => 0x8e,
            Conversion::D2L => 0x8f,
            Conversion::D2F => 0x90,
            Conversion::I2B => 0x91,
            Conversion::I2C => 0x92,
            Conversion::I2S => 0x93,
        }
    }

    fn stack_effect(self) -> (u16, u16) {
        use Conversion::*;
        let from = match self {
            I2L | I2F | I2D | I2B | I2C | I2S => 1,
            L2I | L2F | L2D | D2I | D2L | D2F => 2,
            F2I | F2L | F2D => 1,
        };
        let to = match self {
            I2L | I2D | L2D | F2L | F2D | D2L => 2,
            _ => 1,
        };
        (from, to)
    }

    /// The conversions a Java primitive cast from `from` to `to` compiles to.
    /// `None` when no such cast exists (anything involving `boolean`).
    pub fn path(from: BaseType, to: BaseType) -> Option<Vec<Conversion>> {
        use BaseType::*;
        if from == to {
            return Some(Vec::new());
        }
        if from == Boolean || to == Boolean {
            return None;
        }

        let widen = |kind| match kind {
            Long => ValueKind::Long,
            Float => ValueKind::Float,
            Double => ValueKind::Double,
            _ => ValueKind::Int,
        };
        let mut path = Vec::new();
        let from_kind = widen(from);
        let to_kind = widen(to);
        if from_kind != to_kind {
            path.push(match (from_kind, to_kind) {
                (ValueKind::Int, ValueKind::Long) => Conversion::I2L,
                (ValueKind::Int, ValueKind::Float) => Conversion::I2F,
                (ValueKind::Int, ValueKind::Double) => Conversion::I2D,
                (ValueKind::Long, ValueKind::Int) => Conversion::L2I,
                (ValueKind::Long, ValueKind::Float) => Conversion::L2F,
                (ValueKind::Long, ValueKind::Double) => Conversion::L2D,
                (ValueKind::Float, ValueKind::Int) => Conversion::F2I,
                (ValueKind::Float, ValueKind::Long) => Conversion::F2L,
                (ValueKind::Float, ValueKind::Double) => Conversion::F2D,
                (ValueKind::Double, ValueKind::Int) => Conversion::D2I,
                (ValueKind::Double, ValueKind::Long) => Conversion::D2L,
                _ => Conversion::D2F,
            });
        }
        // Narrowing to a sub-int type needs an explicit truncation, except
        // for the lossless byte → short widening.
        match (from, to) {
            (Byte, Short) => {}
            (_, Byte) => path.push(Conversion::I2B),
            (_, Char) => path.push(Conversion::I2C),
            (_, Short) if from != Byte => path.push(Conversion::I2S),
            _ => {}
        }
        Some(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub owner: String,
    pub name: String,
    pub field_type: FieldType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRef {
    pub owner: String,
    pub name: String,
    pub descriptor: MethodDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Load { kind: ValueKind, index: u16 },
    Store { kind: ValueKind, index: u16 },
    Return(Option<ValueKind>),
    Pop,
    Pop2,
    Dup,
    Convert(Conversion),
    /// `new` with the internal name of the class.
    New(String),
    /// Operand is a class-constant name (internal name or array descriptor).
    CheckCast(String),
    ANewArray(String),
    GetField(FieldRef),
    PutField(FieldRef),
    GetStatic(FieldRef),
    PutStatic(FieldRef),
    InvokeVirtual(MethodRef),
    InvokeSpecial { method: MethodRef, interface: bool },
    InvokeStatic { method: MethodRef, interface: bool },
    InvokeInterface(MethodRef),
}

impl Instruction {
    pub fn return_for(ty: &ReturnType) -> Self {
        match ty {
            ReturnType::Void => Instruction::Return(None),
            ReturnType::Type(ty) => Instruction::Return(Some(ValueKind::of(ty))),
        }
    }

    /// Slots popped and pushed.
    pub fn stack_effect(&self) -> (u16, u16) {
        let invoke = |method: &MethodRef, receiver: u16| {
            (
                method.descriptor.parameter_slots() + receiver,
                method.descriptor.return_type.slot_size(),
            )
        };
        match self {
            Instruction::Load { kind, .. } => (0, kind.slots()),
            Instruction::Store { kind, .. } => (kind.slots(), 0),
            Instruction::Return(kind) => (kind.map_or(0, ValueKind::slots), 0),
            Instruction::Pop => (1, 0),
            Instruction::Pop2 => (2, 0),
            Instruction::Dup => (1, 2),
            Instruction::Convert(conversion) => conversion.stack_effect(),
            Instruction::New(_) => (0, 1),
            Instruction::CheckCast(_) => (1, 1),
            Instruction::ANewArray(_) => (1, 1),
            Instruction::GetField(field) => (1, field.field_type.slot_size()),
            Instruction::PutField(field) => (1 + field.field_type.slot_size(), 0),
            Instruction::GetStatic(field) => (0, field.field_type.slot_size()),
            Instruction::PutStatic(field) => (field.field_type.slot_size(), 0),
            Instruction::InvokeVirtual(method) | Instruction::InvokeInterface(method) => {
                invoke(method, 1)
            }
            Instruction::InvokeSpecial { method, .. } => invoke(method, 1),
            Instruction::InvokeStatic { method, .. } => invoke(method, 0),
        }
    }

    pub(crate) fn encode(&self, cp: &mut ConstantPoolBuilder, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Instruction::Load { kind, index } => encode_local(out, 0x15, 0x1a, *kind, *index),
            Instruction::Store { kind, index } => encode_local(out, 0x36, 0x3b, *kind, *index),
            Instruction::Return(None) => out.push(0xb1),
            Instruction::Return(Some(kind)) => out.push(0xac + kind.offset()),
            Instruction::Pop => out.push(0x57),
            Instruction::Pop2 => out.push(0x58),
            Instruction::Dup => out.push(0x59),
            Instruction::Convert(conversion) => out.push(conversion.opcode()),
            Instruction::New(class) => encode_u2_operand(out, 0xbb, cp.class(class)?),
            Instruction::CheckCast(class) => encode_u2_operand(out, 0xc0, cp.class(class)?),
            Instruction::ANewArray(class) => encode_u2_operand(out, 0xbd, cp.class(class)?),
            Instruction::GetStatic(field) => encode_u2_operand(out, 0xb2, cp.field_ref(field)?),
            Instruction::PutStatic(field) => encode_u2_operand(out, 0xb3, cp.field_ref(field)?),
            Instruction::GetField(field) => encode_u2_operand(out, 0xb4, cp.field_ref(field)?),
            Instruction::PutField(field) => encode_u2_operand(out, 0xb5, cp.field_ref(field)?),
            Instruction::InvokeVirtual(method) => {
                encode_u2_operand(out, 0xb6, cp.method_ref(method, false)?)
            }
            Instruction::InvokeSpecial { method, interface } => {
                encode_u2_operand(out, 0xb7, cp.method_ref(method, *interface)?)
            }
            Instruction::InvokeStatic { method, interface } => {
                encode_u2_operand(out, 0xb8, cp.method_ref(method, *interface)?)
            }
            Instruction::InvokeInterface(method) => {
                encode_u2_operand(out, 0xb9, cp.method_ref(method, true)?);
                let count = u8::try_from(method.descriptor.parameter_slots() + 1)
                    .map_err(|_| Error::TableOverflow("invokeinterface argument slot"))?;
                out.push(count);
                out.push(0);
            }
        }
        Ok(())
    }
}

fn encode_u2_operand(out: &mut Vec<u8>, opcode: u8, operand: u16) {
    out.push(opcode);
    out.extend_from_slice(&operand.to_be_bytes());
}

fn encode_local(out: &mut Vec<u8>, opcode: u8, short_base: u8, kind: ValueKind, index: u16) {
    match index {
        0..=3 => out.push(short_base + kind.offset() * 4 + index as u8),
        4..=255 => {
            out.push(opcode + kind.offset());
            out.push(index as u8);
        }
        _ => {
            out.push(0xc4);
            out.push(opcode + kind.offset());
            out.extend_from_slice(&index.to_be_bytes());
        }
    }
}

/// Deepest operand stack reached by a straight-line instruction sequence.
pub fn max_stack(instructions: &[Instruction]) -> u16 {
    let mut depth: u16 = 0;
    let mut max: u16 = 0;
    for instruction in instructions {
        let (pops, pushes) = instruction.stack_effect();
        depth = depth.saturating_sub(pops) + pushes;
        max = max.max(depth);
    }
    max
}
