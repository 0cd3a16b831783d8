use crate::cursor::Cursor;
use crate::registers::Registers;
use crate::threads::ThreadState;
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const OP_MOV_IMM: u8 = 0x00;
pub const OP_MOV_REG: u8 = 0x01;
pub const OP_ADD_REG: u8 = 0x02;
pub const OP_ADD_IMM: u8 = 0x03;
pub const OP_CALL: u8 = 0x04;
pub const OP_RET: u8 = 0x05;
pub const OP_YIELD: u8 = 0x06;
pub const OP_JUMP: u8 = 0x07;
pub const OP_INIT: u8 = 0x08;
pub const OP_DJNZ: u8 = 0x09;
pub const OP_COND_JUMP: u8 = 0x0A;
pub const OP_PALETTE: u8 = 0x0B;
pub const OP_RESET: u8 = 0x0C;
pub const OP_PAGE: u8 = 0x0D;
pub const OP_FILL: u8 = 0x0E;
pub const OP_COPY: u8 = 0x0F;
pub const OP_BLIT: u8 = 0x10;
pub const OP_KILL: u8 = 0x11;
pub const OP_PRINT: u8 = 0x12;
pub const OP_SUB_REG: u8 = 0x13;
pub const OP_AND_IMM: u8 = 0x14;
pub const OP_OR_IMM: u8 = 0x15;
pub const OP_SHL_IMM: u8 = 0x16;
pub const OP_SHR_IMM: u8 = 0x17;
pub const OP_SOUND: u8 = 0x18;
pub const OP_LOAD_RES: u8 = 0x19;
pub const OP_MUSIC: u8 = 0x1A;

/// Bottom edge used when clamping the short polygon form.
const SCREEN_BOTTOM: u16 = 199;
const DEFAULT_ZOOM: u16 = 0x40;

/// Which of the part's two shape banks a draw reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolygonBank {
    Primary,
    Secondary,
}

/// Operand resolved at execution time from either the stream or a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Imm(u16),
    Reg(u8),
}

impl Operand {
    pub fn resolve(self, regs: &Registers) -> u16 {
        match self {
            Self::Imm(value) => value,
            Self::Reg(index) => regs.get(index),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Imm(value) => write!(f, "#{value}"),
            Self::Reg(index) => write!(f, "${index:02x}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Condition {
    pub fn from_variant(variant: u8) -> Option<Self> {
        Some(match variant & 7 {
            0 => Self::Eq,
            1 => Self::Ne,
            2 => Self::Gt,
            3 => Self::Ge,
            4 => Self::Lt,
            5 => Self::Le,
            _ => return None,
        })
    }

    /// Both sides compare as signed 16-bit values.
    pub fn holds(self, lhs: u16, rhs: u16) -> bool {
        let (a, b) = (lhs as i16, rhs as i16);
        match self {
            Self::Eq => a == b,
            Self::Ne => a != b,
            Self::Gt => a > b,
            Self::Ge => a >= b,
            Self::Lt => a < b,
            Self::Le => a <= b,
        }
    }

    fn mnemonic(self) -> &'static str {
        match self {
            Self::Eq => "jeq",
            Self::Ne => "jne",
            Self::Gt => "jgt",
            Self::Ge => "jge",
            Self::Lt => "jlt",
            Self::Le => "jle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetAction {
    State(ThreadState),
    Kill,
}

/// Operands of the two polygon super-opcode ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolygonDraw {
    pub bank: PolygonBank,
    /// Byte offset of the shape descriptor inside the bank.
    pub offset: u16,
    pub x: Operand,
    pub y: Operand,
    pub zoom: Operand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    MovImm { dst: u8, value: u16 },
    MovReg { dst: u8, src: u8 },
    AddReg { dst: u8, src: u8 },
    AddImm { dst: u8, value: u16 },
    Call { target: u16 },
    Ret,
    Yield,
    Jump { target: u16 },
    Init { thread: u8, pc: u16 },
    Djnz { reg: u8, target: u16 },
    CondJump {
        condition: Condition,
        lhs: u8,
        rhs: Operand,
        target: u16,
    },
    Palette { value: u16 },
    ResetThreads { first: u8, last: u8, action: ResetAction },
    SelectPage { page: u8 },
    FillPage { page: u8, color: u8 },
    CopyPage { src: u8, dst: u8 },
    BlitPage { page: u8 },
    Kill,
    DrawString { id: u16, x: u8, y: u8, color: u8 },
    SubReg { dst: u8, src: u8 },
    AndImm { dst: u8, value: u16 },
    OrImm { dst: u8, value: u16 },
    ShlImm { dst: u8, value: u16 },
    ShrImm { dst: u8, value: u16 },
    PlaySound { id: u16, frequency: u8, volume: u8, channel: u8 },
    LoadResource { id: u16 },
    PlayMusic { id: u16, delay: u16, position: u8 },
    DrawPolygon(PolygonDraw),
}

impl Instruction {
    /// Decode the operands of `opcode`, which has already been fetched at `pc`.
    pub fn decode(opcode: u8, cursor: &mut Cursor, pc: u16) -> Result<Self> {
        if opcode & 0x80 != 0 {
            return decode_short_polygon(opcode, cursor);
        }
        if opcode & 0x40 != 0 {
            return decode_long_polygon(opcode, cursor);
        }
        Ok(match opcode {
            OP_MOV_IMM => Self::MovImm {
                dst: cursor.fetch_byte()?,
                value: cursor.fetch_word()?,
            },
            OP_MOV_REG => Self::MovReg {
                dst: cursor.fetch_byte()?,
                src: cursor.fetch_byte()?,
            },
            OP_ADD_REG => Self::AddReg {
                dst: cursor.fetch_byte()?,
                src: cursor.fetch_byte()?,
            },
            OP_ADD_IMM => Self::AddImm {
                dst: cursor.fetch_byte()?,
                value: cursor.fetch_word()?,
            },
            OP_CALL => Self::Call {
                target: cursor.fetch_word()?,
            },
            OP_RET => Self::Ret,
            OP_YIELD => Self::Yield,
            OP_JUMP => Self::Jump {
                target: cursor.fetch_word()?,
            },
            OP_INIT => Self::Init {
                thread: cursor.fetch_byte()?,
                pc: cursor.fetch_word()?,
            },
            OP_DJNZ => Self::Djnz {
                reg: cursor.fetch_byte()?,
                target: cursor.fetch_word()?,
            },
            OP_COND_JUMP => {
                let variant = cursor.fetch_byte()?;
                let condition = Condition::from_variant(variant)
                    .ok_or(CoreError::InvalidCondition { variant, pc })?;
                let lhs = cursor.fetch_byte()?;
                let rhs = if variant & 0x80 != 0 {
                    Operand::Reg(cursor.fetch_byte()?)
                } else if variant & 0x40 != 0 {
                    Operand::Imm(cursor.fetch_word()?)
                } else {
                    Operand::Imm(cursor.fetch_byte()? as u16)
                };
                Self::CondJump {
                    condition,
                    lhs,
                    rhs,
                    target: cursor.fetch_word()?,
                }
            }
            OP_PALETTE => Self::Palette {
                value: cursor.fetch_word()?,
            },
            OP_RESET => {
                let first = cursor.fetch_byte()?;
                let last = cursor.fetch_byte()?;
                let state = cursor.fetch_byte()?;
                let action = match state {
                    2 => ResetAction::Kill,
                    other => ThreadState::from_code(other)
                        .map(ResetAction::State)
                        .ok_or(CoreError::InvalidResetState { state, pc })?,
                };
                Self::ResetThreads {
                    first,
                    last,
                    action,
                }
            }
            OP_PAGE => Self::SelectPage {
                page: cursor.fetch_byte()?,
            },
            OP_FILL => Self::FillPage {
                page: cursor.fetch_byte()?,
                color: cursor.fetch_byte()?,
            },
            OP_COPY => Self::CopyPage {
                src: cursor.fetch_byte()?,
                dst: cursor.fetch_byte()?,
            },
            OP_BLIT => Self::BlitPage {
                page: cursor.fetch_byte()?,
            },
            OP_KILL => Self::Kill,
            OP_PRINT => Self::DrawString {
                id: cursor.fetch_word()?,
                x: cursor.fetch_byte()?,
                y: cursor.fetch_byte()?,
                color: cursor.fetch_byte()?,
            },
            OP_SUB_REG => Self::SubReg {
                dst: cursor.fetch_byte()?,
                src: cursor.fetch_byte()?,
            },
            OP_AND_IMM => Self::AndImm {
                dst: cursor.fetch_byte()?,
                value: cursor.fetch_word()?,
            },
            OP_OR_IMM => Self::OrImm {
                dst: cursor.fetch_byte()?,
                value: cursor.fetch_word()?,
            },
            OP_SHL_IMM => Self::ShlImm {
                dst: cursor.fetch_byte()?,
                value: cursor.fetch_word()?,
            },
            OP_SHR_IMM => Self::ShrImm {
                dst: cursor.fetch_byte()?,
                value: cursor.fetch_word()?,
            },
            OP_SOUND => Self::PlaySound {
                id: cursor.fetch_word()?,
                frequency: cursor.fetch_byte()?,
                volume: cursor.fetch_byte()?,
                channel: cursor.fetch_byte()?,
            },
            OP_LOAD_RES => Self::LoadResource {
                id: cursor.fetch_word()?,
            },
            OP_MUSIC => Self::PlayMusic {
                id: cursor.fetch_word()?,
                delay: cursor.fetch_word()?,
                position: cursor.fetch_byte()?,
            },
            _ => return Err(CoreError::InvalidOpcode { opcode, pc }),
        })
    }
}

fn decode_short_polygon(opcode: u8, cursor: &mut Cursor) -> Result<Instruction> {
    let low = cursor.fetch_byte()?;
    let offset = ((((opcode as u16) << 8) | low as u16) as u32 * 2) as u16;
    let mut x = cursor.fetch_byte()? as u16;
    let mut y = cursor.fetch_byte()? as u16;
    if y > SCREEN_BOTTOM {
        x += y - SCREEN_BOTTOM;
        y = SCREEN_BOTTOM;
    }
    Ok(Instruction::DrawPolygon(PolygonDraw {
        bank: PolygonBank::Primary,
        offset,
        x: Operand::Imm(x),
        y: Operand::Imm(y),
        zoom: Operand::Imm(DEFAULT_ZOOM),
    }))
}

fn decode_long_polygon(opcode: u8, cursor: &mut Cursor) -> Result<Instruction> {
    let offset = (cursor.fetch_word()? as u32 * 2) as u16;

    let first = cursor.fetch_byte()?;
    let x = match (opcode & 0x20 != 0, opcode & 0x10 != 0) {
        (true, true) => Operand::Imm(first as u16 + 0x100),
        (true, false) => Operand::Imm(first as u16),
        (false, true) => Operand::Reg(first),
        (false, false) => Operand::Imm(((first as u16) << 8) | cursor.fetch_byte()? as u16),
    };

    let first = cursor.fetch_byte()?;
    let y = if opcode & 0x08 != 0 {
        Operand::Imm(first as u16)
    } else if opcode & 0x04 != 0 {
        Operand::Reg(first)
    } else {
        Operand::Imm(((first as u16) << 8) | cursor.fetch_byte()? as u16)
    };

    let mut bank = PolygonBank::Primary;
    let zoom = match (opcode & 0x02 != 0, opcode & 0x01 != 0) {
        (true, true) => {
            bank = PolygonBank::Secondary;
            Operand::Imm(DEFAULT_ZOOM)
        }
        (true, false) => Operand::Imm(cursor.fetch_byte()? as u16),
        (false, true) => Operand::Reg(cursor.fetch_byte()?),
        (false, false) => Operand::Imm(DEFAULT_ZOOM),
    };

    Ok(Instruction::DrawPolygon(PolygonDraw {
        bank,
        offset,
        x,
        y,
        zoom,
    }))
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::MovImm { dst, value } => write!(f, "movi ${dst:02x}, #{value}"),
            Self::MovReg { dst, src } => write!(f, "movr ${dst:02x}, ${src:02x}"),
            Self::AddReg { dst, src } => write!(f, "addr ${dst:02x}, ${src:02x}"),
            Self::AddImm { dst, value } => write!(f, "addi ${dst:02x}, #{value}"),
            Self::Call { target } => write!(f, "call @{target:04x}"),
            Self::Ret => f.write_str("ret"),
            Self::Yield => f.write_str("yield"),
            Self::Jump { target } => write!(f, "jmp @{target:04x}"),
            Self::Init { thread, pc } => write!(f, "init {thread}, @{pc:04x}"),
            Self::Djnz { reg, target } => write!(f, "djnz ${reg:02x}, @{target:04x}"),
            Self::CondJump {
                condition,
                lhs,
                rhs,
                target,
            } => write!(
                f,
                "{} ${lhs:02x}, {rhs}, @{target:04x}",
                condition.mnemonic()
            ),
            Self::Palette { value } => write!(f, "palette {}", value >> 8),
            Self::ResetThreads {
                first,
                last,
                action,
            } => {
                let action = match action {
                    ResetAction::State(ThreadState::Running) => "resume",
                    ResetAction::State(ThreadState::Paused) => "pause",
                    ResetAction::Kill => "kill",
                };
                write!(f, "reset {first}..={last}, {action}")
            }
            Self::SelectPage { page } => write!(f, "page {page:#04x}"),
            Self::FillPage { page, color } => write!(f, "fill {page:#04x}, {color}"),
            Self::CopyPage { src, dst } => write!(f, "copy {src:#04x} -> {dst:#04x}"),
            Self::BlitPage { page } => write!(f, "blit {page:#04x}"),
            Self::Kill => f.write_str("kill"),
            Self::DrawString { id, x, y, color } => {
                write!(f, "print {id:#06x}, {x}, {y}, {color}")
            }
            Self::SubReg { dst, src } => write!(f, "subr ${dst:02x}, ${src:02x}"),
            Self::AndImm { dst, value } => write!(f, "andi ${dst:02x}, #{value:#06x}"),
            Self::OrImm { dst, value } => write!(f, "iori ${dst:02x}, #{value:#06x}"),
            Self::ShlImm { dst, value } => write!(f, "shli ${dst:02x}, #{value}"),
            Self::ShrImm { dst, value } => write!(f, "shri ${dst:02x}, #{value}"),
            Self::PlaySound {
                id,
                frequency,
                volume,
                channel,
            } => write!(f, "sound {id:#06x}, {frequency}, {volume}, {channel}"),
            Self::LoadResource { id } => write!(f, "loadres {id:#06x}"),
            Self::PlayMusic {
                id,
                delay,
                position,
            } => write!(f, "music {id:#06x}, {delay}, {position}"),
            Self::DrawPolygon(draw) => {
                let bank = match draw.bank {
                    PolygonBank::Primary => 1,
                    PolygonBank::Secondary => 2,
                };
                write!(
                    f,
                    "poly{bank} @{:04x}, {}, {}, zoom {}",
                    draw.offset, draw.x, draw.y, draw.zoom
                )
            }
        }
    }
}
